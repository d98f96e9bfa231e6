//! Turns root fields into complete GraphQL operations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::debug;

use crate::core::arguments::{format_literal, synthesize};
use crate::core::schema::{FieldDef, SchemaModel};
use crate::core::selection::{SelectionSetBuilder, TYPENAME_FIELD, render_selection};
use crate::core::type_ref::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Query,
        OperationKind::Mutation,
        OperationKind::Subscription,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }

    /// Only queries are ever sent to the endpoint
    pub fn is_executable(self) -> bool {
        self == OperationKind::Query
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.keyword())
    }
}

/// A required argument, bound to a variable of the same name
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentBinding {
    pub name: String,
    pub type_ref: TypeRef,
    pub synthesized: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    pub field_name: String,
    pub kind: OperationKind,
    pub text: String,
    /// Synthesized variable values, keyed by argument name
    pub variables: Map<String, Value>,
    #[serde(skip)]
    pub arguments: Vec<ArgumentBinding>,
    #[serde(skip)]
    selection: Option<String>,
}

impl Operation {
    fn new(
        field_name: &str,
        kind: OperationKind,
        arguments: Vec<ArgumentBinding>,
        selection: Option<String>,
    ) -> Self {
        let definitions: Vec<String> = arguments
            .iter()
            .map(|arg| format!("${}: {}", arg.name, arg.type_ref))
            .collect();
        let call_args: Vec<String> = arguments
            .iter()
            .map(|arg| format!("{}: ${}", arg.name, arg.name))
            .collect();
        let variables = arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.synthesized.clone()))
            .collect();

        let text = render_operation(
            kind,
            &parenthesize(&definitions),
            field_name,
            &parenthesize(&call_args),
            selection.as_deref(),
        );

        Self {
            field_name: field_name.to_string(),
            kind,
            text,
            variables,
            arguments,
            selection,
        }
    }

    pub fn requires_arguments(&self) -> bool {
        !self.arguments.is_empty()
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The same operation with `variables` written inline as literals.
    ///
    /// Arguments missing from `variables` use their synthesized value.
    pub fn inline_text(&self, variables: &Map<String, Value>) -> String {
        let call_args: Vec<String> = self
            .arguments
            .iter()
            .map(|arg| {
                let value = variables.get(&arg.name).unwrap_or(&arg.synthesized);
                format!("{}: {}", arg.name, format_literal(value))
            })
            .collect();

        render_operation(
            self.kind,
            "",
            &self.field_name,
            &parenthesize(&call_args),
            self.selection.as_deref(),
        )
    }
}

fn parenthesize(parts: &[String]) -> String {
    match parts.is_empty() {
        true => String::new(),
        false => format!("({})", parts.join(", ")),
    }
}

fn render_operation(
    kind: OperationKind,
    definitions: &str,
    field_name: &str,
    call_args: &str,
    selection: Option<&str>,
) -> String {
    let selection = selection
        .map(|block| format!(" {block}"))
        .unwrap_or_default();
    format!("{kind}{definitions} {{ {field_name}{call_args}{selection} }}")
}

pub struct QueryPlanner<'a> {
    schema: &'a SchemaModel,
    selections: SelectionSetBuilder<'a>,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self {
            schema,
            selections: SelectionSetBuilder::new(schema),
        }
    }

    /// Which operation a root type name stands for in this schema
    pub fn classify(&self, root_type_name: &str) -> Option<OperationKind> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| self.schema.root_type_name(*kind) == Some(root_type_name))
    }

    /// Plan `field` drawn from the root type `root_type_name`.
    ///
    /// Returns `None` when the type is not one of the schema's roots.
    pub fn plan_field(&self, root_type_name: &str, field: &FieldDef) -> Option<Operation> {
        self.classify(root_type_name)
            .map(|kind| self.plan(kind, field))
    }

    pub fn plan(&self, kind: OperationKind, field: &FieldDef) -> Operation {
        let arguments = field
            .required_args()
            .map(|arg| ArgumentBinding {
                name: arg.name.clone(),
                type_ref: arg.type_ref.clone(),
                synthesized: synthesize(&arg.type_ref),
            })
            .collect();

        let selection = match field.type_ref.is_leaf() {
            true => None,
            false => {
                let mut selections = self.selections.build(&field.type_ref, 0);
                if selections.is_empty() {
                    let fallback = self
                        .selections
                        .first_leaf_field(&field.type_ref)
                        .unwrap_or_else(|| TYPENAME_FIELD.to_string());
                    selections.push(fallback);
                }
                render_selection(&selections)
            }
        };

        let operation = Operation::new(&field.name, kind, arguments, selection);
        debug!(field = %field.name, %kind, text = %operation.text, "planned operation");
        operation
    }

    /// Every selectable field of one root type, in declaration order
    pub fn plan_root(&self, kind: OperationKind) -> Vec<Operation> {
        self.schema
            .root_type_name(kind)
            .and_then(|name| self.schema.get(name))
            .map(|root| {
                root.selectable_fields()
                    .map(|field| self.plan(kind, field))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Operations for the query, mutation and subscription roots, in that order
    pub fn plan_all(&self) -> Vec<Operation> {
        OperationKind::ALL
            .into_iter()
            .flat_map(|kind| self.plan_root(kind))
            .collect()
    }
}
