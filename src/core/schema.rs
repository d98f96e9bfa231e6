//! In-memory registry of the types returned by one introspection call

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::core::planner::OperationKind;
use crate::core::type_ref::{TypeKind, TypeRef};

/// Introspection returns `null` rather than `[]` for lists that do not apply
/// to a kind (e.g. `fields` on a scalar).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<ArgDef>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

impl FieldDef {
    /// Introspection-reserved fields such as `__typename`
    pub fn is_reserved(&self) -> bool {
        self.name.starts_with("__")
    }

    pub fn required_args(&self) -> impl Iterator<Item = &ArgDef> {
        self.args.iter().filter(|arg| arg.type_ref.is_required())
    }

    pub fn has_required_args(&self) -> bool {
        self.required_args().next().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueDef {
    pub name: String,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldDef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_fields: Vec<ArgDef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interfaces: Vec<TypeRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enum_values: Vec<EnumValueDef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub possible_types: Vec<TypeRef>,
}

impl TypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields in declaration order, without the reserved `__` ones
    pub fn selectable_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|field| !field.is_reserved())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RootTypeName {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionSchema {
    #[serde(default)]
    query_type: Option<RootTypeName>,
    #[serde(default)]
    mutation_type: Option<RootTypeName>,
    #[serde(default)]
    subscription_type: Option<RootTypeName>,
    #[serde(default, deserialize_with = "null_as_default")]
    types: Vec<TypeDefinition>,
}

/// Read-only snapshot of a schema, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    pub query_type_name: Option<String>,
    pub mutation_type_name: Option<String>,
    pub subscription_type_name: Option<String>,
    types: HashMap<String, TypeDefinition>,
}

impl SchemaModel {
    /// Build the model from the `data.__schema` object of an introspection response
    pub fn from_introspection(schema: &Value) -> Result<Self, serde_json::Error> {
        let raw = IntrospectionSchema::deserialize(schema)?;
        let root_name = |root: Option<RootTypeName>| root.and_then(|r| r.name);

        Ok(Self {
            query_type_name: root_name(raw.query_type),
            mutation_type_name: root_name(raw.mutation_type),
            subscription_type_name: root_name(raw.subscription_type),
            types: raw
                .types
                .into_iter()
                .map(|type_def| (type_def.name.clone(), type_def))
                .collect(),
        })
    }

    pub fn new(
        query_type_name: Option<&str>,
        mutation_type_name: Option<&str>,
        types: impl IntoIterator<Item = TypeDefinition>,
    ) -> Self {
        Self {
            query_type_name: query_type_name.map(String::from),
            mutation_type_name: mutation_type_name.map(String::from),
            subscription_type_name: None,
            types: types
                .into_iter()
                .map(|type_def| (type_def.name.clone(), type_def))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Definition of the named type at the bottom of a reference chain
    pub fn resolve(&self, type_ref: &TypeRef) -> Option<&TypeDefinition> {
        type_ref.base_name().and_then(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn root_type_name(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Query => self.query_type_name.as_deref(),
            OperationKind::Mutation => self.mutation_type_name.as_deref(),
            OperationKind::Subscription => self.subscription_type_name.as_deref(),
        }
    }
}
