//! GraphQL type references and the wrapper chains around named types

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use thiserror::Error;

/// Scalars every GraphQL server provides
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    /// Leaf kinds never take a selection set
    pub fn is_leaf(self) -> bool {
        matches!(self, TypeKind::Scalar | TypeKind::Enum)
    }

    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TypeKind::Object | TypeKind::Interface | TypeKind::Union
        )
    }
}

/// A node of an introspection `__Type` reference chain.
///
/// Named types are the leaves of the chain: they carry a `name` and no
/// `ofType`, while `LIST` and `NON_NULL` wrappers always carry `ofType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRefError {
    #[error("Parse error: {0}")]
    Parse(String),
}

impl TypeRef {
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::named(TypeKind::Scalar, name)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::named(TypeKind::Object, name)
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn list(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// Strip every `NON_NULL` and `LIST` wrapper down to the named type
    pub fn base_type(&self) -> &TypeRef {
        let mut current = self;
        while let Some(inner) = current.of_type.as_deref() {
            current = inner;
        }
        current
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_type().name.as_deref()
    }

    pub fn base_kind(&self) -> TypeKind {
        self.base_type().kind
    }

    /// A reference is required when its outermost wrapper is `NON_NULL`
    pub fn is_required(&self) -> bool {
        self.kind == TypeKind::NonNull
    }

    pub fn is_leaf(&self) -> bool {
        self.base_kind().is_leaf()
    }

    /// Render the chain in GraphQL type syntax, e.g. `[ID!]!`
    pub fn type_string(&self) -> String {
        let inner = || {
            self.of_type
                .as_deref()
                .map(TypeRef::type_string)
                .unwrap_or_default()
        };

        match self.kind {
            TypeKind::NonNull => format!("{}!", inner()),
            TypeKind::List => format!("[{}]", inner()),
            _ => self.name.clone().unwrap_or_default(),
        }
    }

    /// Parse GraphQL type syntax, resolving the kind of the named base type
    /// through `resolve_kind`.
    pub fn parse_with<F>(s: &str, resolve_kind: F) -> Result<Self, TypeRefError>
    where
        F: Fn(&str) -> TypeKind + Copy,
    {
        let s = s.trim();

        if let Some(inner) = s.strip_suffix('!') {
            let inner = Self::parse_with(inner, resolve_kind)?;
            if inner.is_required() {
                return Err(TypeRefError::Parse(format!("Doubled non-null marker: {s}")));
            }
            return Ok(Self::non_null(inner));
        }

        if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            return Ok(Self::list(Self::parse_with(inner, resolve_kind)?));
        }

        let valid_name = !s.is_empty()
            && !s.starts_with(|c: char| c.is_ascii_digit())
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        match valid_name {
            true => Ok(Self::named(resolve_kind(s), s)),
            false => Err(TypeRefError::Parse(format!("Invalid type name: {s:?}"))),
        }
    }
}

fn default_kind(name: &str) -> TypeKind {
    match BUILTIN_SCALARS.contains(&name) {
        true => TypeKind::Scalar,
        false => TypeKind::Object,
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.type_string())
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s, default_kind)
    }
}
