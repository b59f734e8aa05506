//! `where` filter trees
//!
//! Filters are accepted in the server's JSON shape and rendered back out as
//! GraphQL input values. The same tree drives local evaluation when a
//! collection has no vectorizer.

use super::query::{validate_name, GqlValue};
use crate::error::{Result, VectoryError};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    And,
    Or,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Like,
    ContainsAny,
    ContainsAll,
    IsNull,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanEqual => "GreaterThanEqual",
            Self::LessThan => "LessThan",
            Self::LessThanEqual => "LessThanEqual",
            Self::Like => "Like",
            Self::ContainsAny => "ContainsAny",
            Self::ContainsAll => "ContainsAll",
            Self::IsNull => "IsNull",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = VectoryError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "And" => Self::And,
            "Or" => Self::Or,
            "Equal" => Self::Equal,
            "NotEqual" => Self::NotEqual,
            "GreaterThan" => Self::GreaterThan,
            "GreaterThanEqual" => Self::GreaterThanEqual,
            "LessThan" => Self::LessThan,
            "LessThanEqual" => Self::LessThanEqual,
            "Like" => Self::Like,
            "ContainsAny" => Self::ContainsAny,
            "ContainsAll" => Self::ContainsAll,
            "IsNull" => Self::IsNull,
            other => {
                return Err(VectoryError::InvalidInput(format!(
                    "unknown filter operator '{}'",
                    other
                )))
            }
        })
    }
}

/// Typed comparison value, keyed on the wire as `valueText`, `valueInt`, ...
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    String(String),
    Int(i64),
    Number(f64),
    Boolean(bool),
    Date(String),
    TextArray(Vec<String>),
    StringArray(Vec<String>),
    IntArray(Vec<i64>),
    NumberArray(Vec<f64>),
    BooleanArray(Vec<bool>),
    DateArray(Vec<String>),
}

const VALUE_KEYS: [&str; 12] = [
    "valueText",
    "valueString",
    "valueInt",
    "valueNumber",
    "valueBoolean",
    "valueDate",
    "valueTextArray",
    "valueStringArray",
    "valueIntArray",
    "valueNumberArray",
    "valueBooleanArray",
    "valueDateArray",
];

fn type_error(key: &str) -> VectoryError {
    VectoryError::InvalidInput(format!("filter value '{}' has the wrong type", key))
}

fn as_string(key: &str, value: &Value) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| type_error(key))
}

fn as_array<'a>(key: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| type_error(key))
}

impl FilterValue {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Text(_) => "valueText",
            Self::String(_) => "valueString",
            Self::Int(_) => "valueInt",
            Self::Number(_) => "valueNumber",
            Self::Boolean(_) => "valueBoolean",
            Self::Date(_) => "valueDate",
            Self::TextArray(_) => "valueTextArray",
            Self::StringArray(_) => "valueStringArray",
            Self::IntArray(_) => "valueIntArray",
            Self::NumberArray(_) => "valueNumberArray",
            Self::BooleanArray(_) => "valueBooleanArray",
            Self::DateArray(_) => "valueDateArray",
        }
    }

    fn from_json(key: &str, value: &Value) -> Result<Self> {
        let strings = |v: &Value| -> Result<Vec<String>> {
            as_array(key, v)?.iter().map(|item| as_string(key, item)).collect()
        };

        Ok(match key {
            "valueText" => Self::Text(as_string(key, value)?),
            "valueString" => Self::String(as_string(key, value)?),
            "valueDate" => Self::Date(as_string(key, value)?),
            "valueInt" => Self::Int(value.as_i64().ok_or_else(|| type_error(key))?),
            "valueNumber" => Self::Number(value.as_f64().ok_or_else(|| type_error(key))?),
            "valueBoolean" => Self::Boolean(value.as_bool().ok_or_else(|| type_error(key))?),
            "valueTextArray" => Self::TextArray(strings(value)?),
            "valueStringArray" => Self::StringArray(strings(value)?),
            "valueDateArray" => Self::DateArray(strings(value)?),
            "valueIntArray" => Self::IntArray(
                as_array(key, value)?
                    .iter()
                    .map(|v| v.as_i64().ok_or_else(|| type_error(key)))
                    .collect::<Result<_>>()?,
            ),
            "valueNumberArray" => Self::NumberArray(
                as_array(key, value)?
                    .iter()
                    .map(|v| v.as_f64().ok_or_else(|| type_error(key)))
                    .collect::<Result<_>>()?,
            ),
            "valueBooleanArray" => Self::BooleanArray(
                as_array(key, value)?
                    .iter()
                    .map(|v| v.as_bool().ok_or_else(|| type_error(key)))
                    .collect::<Result<_>>()?,
            ),
            other => {
                return Err(VectoryError::InvalidInput(format!(
                    "unknown filter value key '{}'",
                    other
                )))
            }
        })
    }

    pub fn to_gql(&self) -> GqlValue {
        match self {
            Self::Text(s) | Self::String(s) | Self::Date(s) => GqlValue::string(s.clone()),
            Self::Int(n) => GqlValue::int(*n),
            Self::Number(n) => GqlValue::float(*n),
            Self::Boolean(b) => GqlValue::Bool(*b),
            Self::TextArray(items) | Self::StringArray(items) | Self::DateArray(items) => {
                GqlValue::strings(items.iter().cloned())
            }
            Self::IntArray(items) => GqlValue::List(items.iter().map(|n| GqlValue::int(*n)).collect()),
            Self::NumberArray(items) => {
                GqlValue::List(items.iter().map(|n| GqlValue::float(*n)).collect())
            }
            Self::BooleanArray(items) => {
                GqlValue::List(items.iter().map(|b| GqlValue::Bool(*b)).collect())
            }
        }
    }

    /// The value as plain JSON, for local comparison
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) | Self::String(s) | Self::Date(s) => Value::from(s.as_str()),
            Self::Int(n) => Value::from(*n),
            Self::Number(n) => Value::from(*n),
            Self::Boolean(b) => Value::from(*b),
            Self::TextArray(items) | Self::StringArray(items) | Self::DateArray(items) => {
                Value::from(items.clone())
            }
            Self::IntArray(items) => Value::from(items.clone()),
            Self::NumberArray(items) => Value::from(items.clone()),
            Self::BooleanArray(items) => Value::from(items.clone()),
        }
    }
}

/// One node of a filter tree
#[derive(Debug, Clone, PartialEq)]
pub struct WhereFilter {
    pub operator: FilterOperator,
    pub path: Vec<String>,
    pub value: Option<FilterValue>,
    pub operands: Vec<WhereFilter>,
}

impl WhereFilter {
    /// Leaf comparison on a single property
    pub fn leaf(operator: FilterOperator, property: impl Into<String>, value: FilterValue) -> Self {
        Self {
            operator,
            path: vec![property.into()],
            value: Some(value),
            operands: Vec::new(),
        }
    }

    pub fn and(operands: Vec<WhereFilter>) -> Self {
        Self {
            operator: FilterOperator::And,
            path: Vec::new(),
            value: None,
            operands,
        }
    }

    pub fn or(operands: Vec<WhereFilter>) -> Self {
        Self {
            operator: FilterOperator::Or,
            path: Vec::new(),
            value: None,
            operands,
        }
    }

    /// Parse a filter from its JSON text
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            VectoryError::InvalidInput(format!("filter is not valid JSON: {}", e))
        })?;
        Self::from_json(&value)
    }

    /// Build from the server's JSON filter shape
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            VectoryError::InvalidInput("filter must be a JSON object".to_string())
        })?;

        let operator: FilterOperator = obj
            .get("operator")
            .and_then(Value::as_str)
            .ok_or_else(|| VectoryError::InvalidInput("filter is missing 'operator'".to_string()))?
            .parse()?;

        if operator.is_logical() {
            let operands = obj
                .get("operands")
                .and_then(Value::as_array)
                .filter(|ops| !ops.is_empty())
                .ok_or_else(|| {
                    VectoryError::InvalidInput(format!(
                        "{} filter needs a non-empty 'operands' list",
                        operator
                    ))
                })?
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>>>()?;

            return Ok(Self {
                operator,
                path: Vec::new(),
                value: None,
                operands,
            });
        }

        let path = parse_path(obj)?;
        let value = parse_value(obj)?.ok_or_else(|| {
            VectoryError::InvalidInput(format!(
                "{} filter needs one of {}",
                operator,
                VALUE_KEYS.join(", ")
            ))
        })?;

        Ok(Self {
            operator,
            path,
            value: Some(value),
            operands: Vec::new(),
        })
    }

    /// Render as a GraphQL input object
    pub fn to_gql(&self) -> Result<GqlValue> {
        let mut fields = vec![(
            "operator".to_string(),
            GqlValue::Enum(self.operator.as_str().to_string()),
        )];

        if self.operator.is_logical() {
            let operands = self
                .operands
                .iter()
                .map(Self::to_gql)
                .collect::<Result<Vec<_>>>()?;
            fields.push(("operands".to_string(), GqlValue::List(operands)));
            return Ok(GqlValue::Object(fields));
        }

        for segment in &self.path {
            validate_name(segment)?;
        }
        fields.push((
            "path".to_string(),
            GqlValue::strings(self.path.iter().cloned()),
        ));
        if let Some(ref value) = self.value {
            fields.push((value.key().to_string(), value.to_gql()));
        }
        Ok(GqlValue::Object(fields))
    }
}

fn parse_path(obj: &Map<String, Value>) -> Result<Vec<String>> {
    let path = match obj.get("path") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    VectoryError::InvalidInput("filter path entries must be strings".to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    if path.is_empty() {
        return Err(VectoryError::InvalidInput(
            "filter is missing 'path'".to_string(),
        ));
    }
    for segment in &path {
        validate_name(segment)?;
    }
    Ok(path)
}

fn parse_value(obj: &Map<String, Value>) -> Result<Option<FilterValue>> {
    let mut found = VALUE_KEYS
        .iter()
        .filter_map(|key| obj.get(*key).map(|v| (*key, v)));

    let first = match found.next() {
        Some((key, value)) => FilterValue::from_json(key, value)?,
        None => return Ok(None),
    };
    if found.next().is_some() {
        return Err(VectoryError::InvalidInput(
            "filter has more than one value field".to_string(),
        ));
    }
    Ok(Some(first))
}
