//! Bounded-depth selection sets for composite field types

use crate::core::schema::SchemaModel;
use crate::core::type_ref::TypeRef;

/// Schemas are generally cyclic, so recursion stops at this depth
pub const MAX_SELECTION_DEPTH: usize = 3;

pub const TYPENAME_FIELD: &str = "__typename";

pub struct SelectionSetBuilder<'a> {
    schema: &'a SchemaModel,
    max_depth: usize,
}

impl<'a> SelectionSetBuilder<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self {
            schema,
            max_depth: MAX_SELECTION_DEPTH,
        }
    }

    /// Field selections for the type behind `type_ref`, starting at `depth`.
    ///
    /// Returns nothing for leaf types, for types missing from the schema and
    /// once the depth bound is reached. Composite sub-fields whose own
    /// selection comes back empty fall back to a single leaf field of the
    /// sub-type, or are left out; an empty `{ }` is never produced. Fields
    /// that require arguments are skipped since nothing can be passed to them.
    pub fn build(&self, type_ref: &TypeRef, depth: usize) -> Vec<String> {
        if depth >= self.max_depth || type_ref.is_leaf() {
            return Vec::new();
        }

        let Some(type_def) = self.schema.resolve(type_ref) else {
            return Vec::new();
        };

        let mut selections = Vec::new();

        for field in type_def.selectable_fields() {
            if field.has_required_args() {
                continue;
            }

            if field.type_ref.is_leaf() {
                selections.push(field.name.clone());
                continue;
            }

            let mut sub_selection = self.build(&field.type_ref, depth + 1);
            if sub_selection.is_empty() {
                sub_selection.extend(self.first_leaf_field(&field.type_ref));
            }

            if let Some(block) = render_selection(&sub_selection) {
                selections.push(format!("{} {block}", field.name));
            }
        }

        if selections.is_empty() && type_def.kind.is_composite() {
            selections.push(TYPENAME_FIELD.to_string());
        }

        selections
    }

    /// First argument-free scalar or enum field of the type behind `type_ref`
    pub fn first_leaf_field(&self, type_ref: &TypeRef) -> Option<String> {
        self.schema
            .resolve(type_ref)?
            .selectable_fields()
            .find(|field| field.type_ref.is_leaf() && !field.has_required_args())
            .map(|field| field.name.clone())
    }
}

/// Wrap selections in braces, or `None` when there is nothing to select
pub fn render_selection(selections: &[String]) -> Option<String> {
    match selections.is_empty() {
        true => None,
        false => Some(format!("{{ {} }}", selections.join(" "))),
    }
}
