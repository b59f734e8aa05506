//! Typed GraphQL query construction
//!
//! Queries are assembled from structured values and rendered in one place.
//! String literals are escaped and every class/property name is checked
//! against the GraphQL name grammar, so caller-supplied text can never change
//! the shape of the query.

use super::filter::WhereFilter;
use crate::error::{Result, VectoryError};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Write as _};

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").unwrap();
}

/// Check that `name` is a valid GraphQL name
pub fn validate_name(name: &str) -> Result<&str> {
    if NAME_RE.is_match(name) {
        Ok(name)
    } else {
        Err(VectoryError::InvalidInput(format!(
            "'{}' is not a valid collection or property name",
            name
        )))
    }
}

/// Escape a string as a GraphQL string literal (quotes included)
pub fn quote(s: &str) -> String {
    // JSON string escapes are a subset of GraphQL's
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// GraphQL input value
#[derive(Debug, Clone, PartialEq)]
pub enum GqlValue {
    Null,
    Bool(bool),
    /// Pre-rendered numeric literal
    Number(String),
    String(String),
    /// Bare enum literal such as `Equal` or `rankedFusion`
    Enum(String),
    List(Vec<GqlValue>),
    Object(Vec<(String, GqlValue)>),
}

impl GqlValue {
    pub fn int(n: i64) -> Self {
        Self::Number(n.to_string())
    }

    /// Non-finite floats render as `null`; callers reject them first
    pub fn float(f: f64) -> Self {
        Self::Number(serde_json::Value::from(f).to_string())
    }

    pub fn float32(f: f32) -> Self {
        Self::Number(serde_json::to_string(&f).unwrap_or_else(|_| "null".to_string()))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    pub fn vector(values: &[f32]) -> Self {
        Self::List(values.iter().map(|v| Self::float32(*v)).collect())
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, GqlValue)>,
        K: Into<String>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for GqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => f.write_str(n),
            Self::String(s) => f.write_str(&quote(s)),
            Self::Enum(e) => f.write_str(e),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Object(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Fusion algorithm for hybrid search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionType {
    RankedFusion,
    RelativeScoreFusion,
}

impl FusionType {
    pub const ACCEPTED: [&'static str; 2] = ["rankedFusion", "relativeScoreFusion"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankedFusion => "rankedFusion",
            Self::RelativeScoreFusion => "relativeScoreFusion",
        }
    }
}

impl Default for FusionType {
    fn default() -> Self {
        Self::RankedFusion
    }
}

impl fmt::Display for FusionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FusionType {
    type Err = VectoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rankedFusion" => Ok(Self::RankedFusion),
            "relativeScoreFusion" => Ok(Self::RelativeScoreFusion),
            other => Err(VectoryError::InvalidInput(format!(
                "fusion type must be one of {} (got '{}')",
                Self::ACCEPTED.join(", "),
                other
            ))),
        }
    }
}

/// Search operator attached to a `Get` query
#[derive(Debug, Clone, PartialEq)]
pub enum SearchClause {
    NearText {
        concepts: Vec<String>,
    },
    NearVector {
        vector: Vec<f32>,
    },
    Hybrid {
        query: String,
        alpha: f64,
        fusion: FusionType,
        vector: Option<Vec<f32>>,
        properties: Vec<String>,
    },
}

impl SearchClause {
    fn to_argument(&self) -> Result<(&'static str, GqlValue)> {
        Ok(match self {
            Self::NearText { concepts } => (
                "nearText",
                GqlValue::object([("concepts", GqlValue::strings(concepts.iter().cloned()))]),
            ),
            Self::NearVector { vector } => (
                "nearVector",
                GqlValue::object([("vector", GqlValue::vector(vector))]),
            ),
            Self::Hybrid {
                query,
                alpha,
                fusion,
                vector,
                properties,
            } => {
                let mut fields = vec![
                    ("query".to_string(), GqlValue::string(query.clone())),
                    ("alpha".to_string(), GqlValue::float(*alpha)),
                    ("fusionType".to_string(), GqlValue::Enum(fusion.as_str().to_string())),
                ];
                if let Some(vector) = vector {
                    fields.push(("vector".to_string(), GqlValue::vector(vector)));
                }
                if !properties.is_empty() {
                    for p in properties {
                        validate_name(p)?;
                    }
                    fields.push((
                        "properties".to_string(),
                        GqlValue::strings(properties.iter().cloned()),
                    ));
                }
                ("hybrid", GqlValue::Object(fields))
            }
        })
    }
}

/// `Get` query over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct GetQuery {
    pub class: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub filter: Option<WhereFilter>,
    pub search: Option<SearchClause>,
    pub fields: Vec<String>,
    pub additional: Vec<String>,
}

impl GetQuery {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            limit: None,
            offset: None,
            filter: None,
            search: None,
            fields: Vec::new(),
            additional: vec!["id".to_string()],
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filter(mut self, filter: Option<WhereFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn search(mut self, clause: SearchClause) -> Self {
        self.search = Some(clause);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn additional<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments in render order
    pub fn arguments(&self) -> Result<Vec<(String, GqlValue)>> {
        let mut args = Vec::new();
        if let Some(limit) = self.limit {
            args.push(("limit".to_string(), GqlValue::int(limit as i64)));
        }
        if let Some(offset) = self.offset {
            args.push(("offset".to_string(), GqlValue::int(offset as i64)));
        }
        if let Some(ref filter) = self.filter {
            args.push(("where".to_string(), filter.to_gql()?));
        }
        if let Some(ref clause) = self.search {
            let (name, value) = clause.to_argument()?;
            args.push((name.to_string(), value));
        }
        Ok(args)
    }

    /// Render the query document
    pub fn render(&self) -> Result<String> {
        validate_name(&self.class)?;
        for field in self.fields.iter().chain(self.additional.iter()) {
            validate_name(field)?;
        }

        let args = self.arguments()?;
        let mut out = String::new();
        out.push_str("{\n  Get {\n    ");
        out.push_str(&self.class);
        if !args.is_empty() {
            out.push_str("(\n");
            for (name, value) in &args {
                let _ = writeln!(out, "      {}: {}", name, value);
            }
            out.push_str("    )");
        }
        out.push_str(" {\n");
        for field in &self.fields {
            let _ = writeln!(out, "      {}", field);
        }
        if !self.additional.is_empty() {
            out.push_str("      _additional {\n");
            for field in &self.additional {
                let _ = writeln!(out, "        {}", field);
            }
            out.push_str("      }\n");
        }
        out.push_str("    }\n  }\n}\n");
        Ok(out)
    }
}

/// `Aggregate` count query
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub class: String,
    pub tenant: Option<String>,
}

impl AggregateQuery {
    pub fn count(class: impl Into<String>, tenant: Option<&str>) -> Self {
        Self {
            class: class.into(),
            tenant: tenant.map(str::to_string),
        }
    }

    pub fn render(&self) -> Result<String> {
        validate_name(&self.class)?;
        let mut out = String::from("{\n  Aggregate {\n    ");
        out.push_str(&self.class);
        if let Some(ref tenant) = self.tenant {
            let _ = write!(out, "(tenant: {})", quote(tenant));
        }
        out.push_str(" {\n      meta {\n        count\n      }\n    }\n  }\n}\n");
        Ok(out)
    }
}
