//! Runtime values harvested from responses, for reuse as query arguments

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{Value, json};

use crate::core::type_ref::{TypeKind, TypeRef};

/// Category a response leaf falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Harvested<'a> {
    Id(&'a str),
    Username(&'a str),
    Text(&'a str),
    Int(i64),
    Bool(bool),
}

impl<'a> Harvested<'a> {
    /// Classify a scalar leaf found under the mapping key `key`.
    ///
    /// Floats, nulls and integers outside the `i64` range are not kept.
    pub fn classify(key: &str, value: &'a Value) -> Option<Self> {
        match (key, value) {
            ("id", Value::String(s)) => Some(Harvested::Id(s)),
            ("username", Value::String(s)) => Some(Harvested::Username(s)),
            (_, Value::String(s)) => Some(Harvested::Text(s)),
            (_, Value::Number(n)) => n.as_i64().map(Harvested::Int),
            (_, Value::Bool(b)) => Some(Harvested::Bool(*b)),
            _ => None,
        }
    }
}

/// Ordered, deduplicated buckets of values seen during the first pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterPool {
    pub ids: IndexSet<String>,
    pub usernames: IndexSet<String>,
    pub strings: IndexSet<String>,
    pub ints: IndexSet<i64>,
    pub bools: IndexSet<bool>,
}

impl ParameterPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, harvested: Harvested<'_>) {
        match harvested {
            Harvested::Id(s) => {
                self.ids.insert(s.to_string());
            }
            Harvested::Username(s) => {
                self.usernames.insert(s.to_string());
            }
            Harvested::Text(s) => {
                self.strings.insert(s.to_string());
            }
            Harvested::Int(n) => {
                self.ints.insert(n);
            }
            Harvested::Bool(b) => {
                self.bools.insert(b);
            }
        }
    }

    /// Walk `data` depth-first and bucket every scalar leaf.
    ///
    /// Array elements are attributed to the key holding the array.
    pub fn extract(&mut self, data: &Value) {
        self.walk(None, data);
    }

    fn walk(&mut self, key: Option<&str>, value: &Value) {
        match value {
            Value::Object(map) => {
                for (child_key, child) in map {
                    self.walk(Some(child_key.as_str()), child);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(key, item);
                }
            }
            leaf => {
                if let Some(harvested) = key.and_then(|key| Harvested::classify(key, leaf)) {
                    self.insert(harvested);
                }
            }
        }
    }

    /// Harvested value for a variable called `variable_name` of the nullable
    /// leaf type `type_ref`.
    ///
    /// `Int`, `Float` and `Boolean` variables draw only from the bucket of
    /// their own type. Other variables whose name contains `id` (any case)
    /// draw only from ids, and those containing `username` only from
    /// usernames. `String` and `ID` variables then take the first string;
    /// custom scalars and enums take the first value of strings, ints and
    /// bools, in that order.
    pub fn candidate_for(&self, variable_name: &str, type_ref: &TypeRef) -> Option<Value> {
        let scalar = match type_ref.kind {
            TypeKind::Scalar => type_ref.name.as_deref(),
            _ => None,
        };

        match scalar {
            Some("Int" | "Float") => return self.ints.first().map(|n| json!(n)),
            Some("Boolean") => return self.bools.first().map(|b| json!(b)),
            _ => {}
        }

        let name = variable_name.to_lowercase();

        if name.contains("id") {
            return self.ids.first().map(|id| json!(id));
        }

        if name.contains("username") {
            return self.usernames.first().map(|username| json!(username));
        }

        let first_string = self.strings.first().map(|s| json!(s));
        match scalar {
            Some("String" | "ID") => first_string,
            _ => first_string
                .or_else(|| self.ints.first().map(|n| json!(n)))
                .or_else(|| self.bools.first().map(|b| json!(b))),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
            + self.usernames.len()
            + self.strings.len()
            + self.ints.len()
            + self.bools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bucket the leaves of `data` into `pool`
pub fn extract(data: &Value, pool: &mut ParameterPool) {
    pool.extract(data);
}
