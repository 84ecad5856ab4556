//! Selection model for per-subgraph fetches.
//!
//! During query planning the gateway collects, per planned subgraph fetch,
//! the set of fields that fetch must resolve. Each collected [`Field`] is
//! tagged with the [`Scope`] it was requested against; [`build_selection_set`]
//! folds a whole [`FieldSet`] into one deduplicated selection tree, ready to
//! be serialized into the outbound request document.
//!
//! The tree itself reuses `apollo-compiler`'s `executable` nodes, so callers
//! hand the result straight to the document printer.

use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable;

mod merging;
#[cfg(test)]
mod tests;

pub use merging::build_selection_set;
pub use merging::merge_subselections;

/// The type context a field was requested in: the declaring composite type,
/// the concrete object types a value in that context can resolve to, and an
/// optional link to the scope the field was reached through.
///
/// Scopes form a chain, not a cycle. The enclosing link is a read-only
/// backward reference for callers walking up the request; it is never
/// traversed to reach the current scope's own selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    parent_type: Name,
    possible_types: IndexSet<Name>,
    enclosing: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new(parent_type: Name, possible_types: impl IntoIterator<Item = Name>) -> Arc<Self> {
        Arc::new(Self {
            parent_type,
            possible_types: possible_types.into_iter().collect(),
            enclosing: None,
        })
    }

    /// A scope for a field reached through `self`.
    pub fn child(
        self: &Arc<Self>,
        parent_type: Name,
        possible_types: impl IntoIterator<Item = Name>,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent_type,
            possible_types: possible_types.into_iter().collect(),
            enclosing: Some(Arc::clone(self)),
        })
    }

    /// The declaring composite type selections in this scope are made on.
    pub fn parent_type(&self) -> &Name {
        &self.parent_type
    }

    /// The concrete object types a value in this scope can resolve to.
    pub fn possible_types(&self) -> &IndexSet<Name> {
        &self.possible_types
    }

    pub fn enclosing(&self) -> Option<&Arc<Scope>> {
        self.enclosing.as_ref()
    }
}

/// A single selected field: the scope it was requested in and the requested
/// field node, which carries the alias, arguments, nested selection, and the
/// resolved field definition.
///
/// Fields are immutable value records; merging builds new nodes and never
/// rewrites an input in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    scope: Arc<Scope>,
    node: Node<executable::Field>,
}

impl Field {
    pub fn new(scope: Arc<Scope>, node: Node<executable::Field>) -> Self {
        Self { scope, node }
    }

    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    pub fn node(&self) -> &Node<executable::Field> {
        &self.node
    }

    /// The key this field's result appears under in a response: the alias if
    /// one was given, the field name otherwise.
    pub fn response_name(&self) -> &Name {
        self.node.alias.as_ref().unwrap_or(&self.node.name)
    }

    /// The declaring type this field was selected on.
    pub fn parent_type(&self) -> &Name {
        self.scope.parent_type()
    }

    /// The resolved definition of the selected field.
    pub fn definition(&self) -> &Node<ast::FieldDefinition> {
        &self.node.definition
    }
}

/// An ordered collection of fields, in request order.
pub type FieldSet = Vec<Field>;

/// Identifies a selection for merging: two selections merge iff their keys
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SelectionKey {
    Field { response_name: Name },
    FragmentSpread { fragment_name: Name },
    InlineFragment { type_condition: Option<Name> },
}

pub(crate) trait HasSelectionKey {
    fn key(&self) -> SelectionKey;
}

impl HasSelectionKey for executable::Selection {
    fn key(&self) -> SelectionKey {
        match self {
            executable::Selection::Field(field) => SelectionKey::Field {
                response_name: field.alias.clone().unwrap_or_else(|| field.name.clone()),
            },
            executable::Selection::FragmentSpread(spread) => SelectionKey::FragmentSpread {
                fragment_name: spread.fragment_name.clone(),
            },
            executable::Selection::InlineFragment(fragment) => SelectionKey::InlineFragment {
                type_condition: fragment.type_condition.clone(),
            },
        }
    }
}

/// Wraps merged selections into a selection set on the given type, ready for
/// the outbound document printer.
pub fn selection_set(ty: Name, selections: Vec<executable::Selection>) -> executable::SelectionSet {
    executable::SelectionSet { ty, selections }
}
