//! GraphQL endpoint types and execution

pub mod filter;
pub mod query;

pub use filter::{FilterOperator, FilterValue, WhereFilter};
pub use query::{quote, validate_name, AggregateQuery, FusionType, GetQuery, GqlValue, SearchClause};

use crate::error::Result;
use crate::transport::Transport;
use crate::wire::value_as_u64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body posted to the `graphql` endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tenant: None,
        }
    }

    pub fn with_tenant(mut self, tenant: Option<&str>) -> Self {
        self.tenant = tenant.map(str::to_string);
        self
    }
}

/// Position of a GraphQL error; either coordinate may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorLocation {
    pub line: Option<u64>,
    pub column: Option<u64>,
}

impl ErrorLocation {
    fn from_value(value: &Value) -> Self {
        Self {
            line: value.get("line").and_then(value_as_u64),
            column: value.get("column").and_then(value_as_u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlError {
    pub message: String,
    pub locations: Vec<ErrorLocation>,
}

const UNKNOWN_ERROR: &str = "Unknown error";

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
        }
    }

    /// Decode one `errors` entry, whatever its shape
    fn from_value(value: &Value) -> Self {
        let Value::Object(entry) = value else {
            return match value {
                Value::String(s) => Self::new(s.as_str()),
                Value::Null => Self::new(UNKNOWN_ERROR),
                other => Self::new(other.to_string()),
            };
        };

        let message = match entry.get("message") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => UNKNOWN_ERROR.to_string(),
            Some(other) => other.to_string(),
        };
        let locations = match entry.get("locations") {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .map(ErrorLocation::from_value)
                .collect(),
            _ => Vec::new(),
        };

        Self { message, locations }
    }
}

fn coordinate(value: Option<u64>) -> String {
    value.map_or_else(|| "?".to_string(), |n| n.to_string())
}

impl std::fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.locations.is_empty() {
            return write!(f, "GraphQL error: {}", self.message);
        }
        let at: Vec<String> = self
            .locations
            .iter()
            .map(|l| format!("line {}, column {}", coordinate(l.line), coordinate(l.column)))
            .collect();
        write!(f, "GraphQL error at {}: {}", at.join(", "), self.message)
    }
}

/// Raw `{data?, errors?}` response
///
/// Decoding never fails: `errors` may be a list, a single entry or a bare
/// string, and a body that is not an object reads as empty.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(from = "Value")]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    pub errors: Vec<GraphQlError>,
}

impl From<Value> for GraphQlResponse {
    fn from(raw: Value) -> Self {
        let Value::Object(mut body) = raw else {
            tracing::warn!("GraphQL response is not an object");
            return Self::default();
        };

        let errors = match body.remove("errors") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(GraphQlError::from_value).collect(),
            Some(single) => vec![GraphQlError::from_value(&single)],
        };

        Self {
            data: body.remove("data").filter(|d| !d.is_null()),
            errors,
        }
    }
}

impl GraphQlResponse {
    /// Joined error text, if the response carries any errors
    pub fn error_text(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(format_graphql_errors(&self.errors))
        }
    }
}

/// One line per error
pub fn format_graphql_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// POST a request to the `graphql` endpoint
///
/// Transport failures are errors; GraphQL-level errors come back inside the
/// response for the caller to inspect.
pub async fn execute(transport: &dyn Transport, request: &GraphQlRequest) -> Result<GraphQlResponse> {
    tracing::debug!("graphql query: {}", request.query.trim());
    let raw = transport
        .post("graphql", serde_json::to_value(request)?)
        .await?;
    Ok(GraphQlResponse::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let plain = serde_json::to_value(GraphQlRequest::new("{ Get { Docs { text } } }")).unwrap();
        assert_eq!(plain, json!({"query": "{ Get { Docs { text } } }"}));

        let scoped =
            serde_json::to_value(GraphQlRequest::new("q").with_tenant(Some("tenantA"))).unwrap();
        assert_eq!(scoped, json!({"query": "q", "tenant": "tenantA"}));
    }

    #[test]
    fn test_format_errors() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "errors": [
                {"message": "Cannot query field \"nope\"", "locations": [{"line": 4, "column": 7}]},
                {"message": "two places", "locations": [{"line": 1, "column": 2}, {"line": 3, "column": 4}]},
                {"message": "no location"}
            ]
        }))
        .unwrap();

        assert!(response.data.is_none());
        assert_eq!(
            response.error_text().unwrap(),
            "GraphQL error at line 4, column 7: Cannot query field \"nope\"\n\
             GraphQL error at line 1, column 2, line 3, column 4: two places\n\
             GraphQL error: no location"
        );
    }

    #[test]
    fn test_null_errors_are_empty() {
        let response: GraphQlResponse =
            serde_json::from_value(json!({"data": {"Get": {}}, "errors": null})).unwrap();
        assert!(response.error_text().is_none());
    }

    #[test]
    fn test_partial_error_entries_still_render() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "errors": [
                {"message": "bad field", "locations": [{"line": 3}]},
                {"message": null},
                {"locations": [{"column": "12"}, null]}
            ]
        }))
        .unwrap();

        assert_eq!(
            response.error_text().unwrap(),
            "GraphQL error at line 3, column ?: bad field\n\
             GraphQL error: Unknown error\n\
             GraphQL error at line ?, column 12: Unknown error"
        );
    }

    #[test]
    fn test_odd_error_shapes() {
        let single = GraphQlResponse::from(json!({"errors": {"message": "one"}}));
        assert_eq!(single.error_text().as_deref(), Some("GraphQL error: one"));

        let bare = GraphQlResponse::from(json!({"errors": "schema mismatch"}));
        assert_eq!(bare.error_text().as_deref(), Some("GraphQL error: schema mismatch"));

        let not_an_object = GraphQlResponse::from(json!([1, 2]));
        assert!(not_an_object.data.is_none());
        assert!(not_an_object.error_text().is_none());

        let null_data = GraphQlResponse::from(json!({"data": null, "errors": []}));
        assert!(null_data.data.is_none());
    }

    #[tokio::test]
    async fn test_execute_tolerates_partial_errors() {
        let mock = MockTransport::new();
        mock.respond(
            Method::POST,
            "graphql",
            json!({"errors": [{"message": "bad field", "locations": [{"line": 3}]}]}),
        );

        let response = execute(&mock, &GraphQlRequest::new("{ Get { Docs { nope } } }"))
            .await
            .unwrap();
        assert!(response.error_text().unwrap().contains("column ?"));
    }

    #[tokio::test]
    async fn test_execute_posts_tenant_at_top_level() {
        let mock = MockTransport::new();
        mock.respond(Method::POST, "graphql", json!({"data": {"Get": {"Docs": []}}}));

        let request = GraphQlRequest::new("{ Get { Docs { text } } }").with_tenant(Some("t1"));
        let response = execute(&mock, &request).await.unwrap();

        assert_eq!(response.data.unwrap()["Get"]["Docs"], json!([]));
        let sent = mock.requests();
        assert_eq!(sent[0].body.as_ref().unwrap()["tenant"], "t1");
    }
}
