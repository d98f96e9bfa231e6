//! Placeholder argument values and their GraphQL literal form

use serde_json::{Value, json};

use crate::core::type_ref::{TypeKind, TypeRef};

pub const DEFAULT_STRING: &str = "default";
pub const DEFAULT_ID: &str = "1";

/// Produce one representative value for an argument of the given type.
///
/// Lists are synthesized as empty rather than by recursing into the element
/// type, and enums and input objects get the generic string placeholder.
pub fn synthesize(type_ref: &TypeRef) -> Value {
    match type_ref.kind {
        TypeKind::NonNull => type_ref
            .of_type
            .as_deref()
            .map(synthesize)
            .unwrap_or_else(|| json!(DEFAULT_STRING)),
        TypeKind::List => json!([]),
        TypeKind::Scalar => match type_ref.name.as_deref() {
            Some("Int") => json!(0),
            Some("Float") => json!(0.0),
            Some("Boolean") => json!(true),
            Some("ID") => json!(DEFAULT_ID),
            _ => json!(DEFAULT_STRING),
        },
        TypeKind::Object
        | TypeKind::Interface
        | TypeKind::Union
        | TypeKind::Enum
        | TypeKind::InputObject => json!(DEFAULT_STRING),
    }
}

/// Render a JSON value as an inline GraphQL literal
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}: {}", format_literal(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
