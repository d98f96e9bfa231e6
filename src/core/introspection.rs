//! Fetching the schema of an endpoint through introspection

use serde_json::{Map, Value};
use tracing::info;

use crate::core::client::{GraphQLRequest, GraphQLTransport};
use crate::core::errors::SchemaFetchError;
use crate::core::schema::SchemaModel;

pub const INTROSPECTION_OPERATION_NAME: &str = "IntrospectionQuery";

pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type {
    ...TypeRef
  }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// A schema as parsed, alongside the raw `__schema` object it came from
#[derive(Debug, Clone)]
pub struct FetchedSchema {
    pub model: SchemaModel,
    pub raw: Value,
}

/// Run the introspection query against `transport`.
///
/// A transport failure, a top-level `errors` member or a missing or
/// malformed `data.__schema` all fail the fetch.
pub async fn fetch_schema<T>(transport: &T) -> Result<FetchedSchema, SchemaFetchError>
where
    T: GraphQLTransport,
{
    let request = GraphQLRequest::new(INTROSPECTION_QUERY, Map::new())
        .with_operation_name(INTROSPECTION_OPERATION_NAME);

    let body = transport.execute(&request).await?;
    parse_introspection_response(body)
}

pub fn parse_introspection_response(mut body: Value) -> Result<FetchedSchema, SchemaFetchError> {
    if let Some(errors) = body.get("errors").filter(|errors| !errors.is_null()) {
        return Err(SchemaFetchError::GraphQL(errors.clone()));
    }

    let raw = body
        .pointer_mut("/data/__schema")
        .map(Value::take)
        .filter(Value::is_object)
        .ok_or_else(|| SchemaFetchError::Malformed("missing data.__schema".to_string()))?;

    let model = SchemaModel::from_introspection(&raw)
        .map_err(|e| SchemaFetchError::Malformed(e.to_string()))?;

    info!(types = model.len(), "Schema fetched successfully");

    Ok(FetchedSchema { model, raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_schema() -> Value {
        json!({
            "queryType": { "name": "Query" },
            "mutationType": null,
            "subscriptionType": null,
            "types": [
                {
                    "kind": "OBJECT",
                    "name": "Query",
                    "fields": [
                        {
                            "name": "hello",
                            "args": [],
                            "type": { "kind": "SCALAR", "name": "String", "ofType": null },
                            "isDeprecated": false,
                            "deprecationReason": null
                        }
                    ]
                }
            ],
            "directives": []
        })
    }

    #[test]
    fn test_query_requests_deep_type_refs() {
        assert!(INTROSPECTION_QUERY.contains("fields(includeDeprecated: true)"));
        assert_eq!(INTROSPECTION_QUERY.matches("ofType {").count(), 7);
    }

    #[test]
    fn test_parse_valid_response() {
        let fetched =
            parse_introspection_response(json!({ "data": { "__schema": minimal_schema() } }))
                .unwrap();
        assert_eq!(fetched.model.query_type_name.as_deref(), Some("Query"));
        assert_eq!(fetched.raw, minimal_schema());
    }

    #[test]
    fn test_errors_are_fatal() {
        let result = parse_introspection_response(json!({
            "errors": [{ "message": "introspection disabled" }],
            "data": null
        }));
        assert!(matches!(result, Err(SchemaFetchError::GraphQL(_))));
    }

    #[test]
    fn test_null_errors_are_ignored() {
        let result = parse_introspection_response(json!({
            "errors": null,
            "data": { "__schema": minimal_schema() }
        }));
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_schema_is_malformed() {
        for body in [json!({}), json!({ "data": null }), json!({ "data": { "__schema": null } })] {
            let result = parse_introspection_response(body);
            assert!(matches!(result, Err(SchemaFetchError::Malformed(_))));
        }
    }

    #[test]
    fn test_invalid_schema_shape_is_malformed() {
        let result = parse_introspection_response(json!({
            "data": { "__schema": { "types": [{ "kind": "NOPE", "name": "X" }] } }
        }));
        assert!(matches!(result, Err(SchemaFetchError::Malformed(_))));
    }
}
