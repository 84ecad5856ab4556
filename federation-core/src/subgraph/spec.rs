//! Names defined by the federation subgraph specification.

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::name;

/// Marks a field whose authoritative data lives in another subgraph.
pub const EXTERNAL_DIRECTIVE_NAME: Name = name!("external");
/// Designates the fields that identify an entity across subgraphs.
pub const KEY_DIRECTIVE_NAME: Name = name!("key");
/// Declares fields a resolver needs fetched from another subgraph first.
pub const REQUIRES_DIRECTIVE_NAME: Name = name!("requires");
/// Declares externally-owned fields a subgraph can resolve on behalf of another.
pub const PROVIDES_DIRECTIVE_NAME: Name = name!("provides");

pub const QUERY_TYPE_NAME: Name = name!("Query");
pub const MUTATION_TYPE_NAME: Name = name!("Mutation");
pub const SUBSCRIPTION_TYPE_NAME: Name = name!("Subscription");

/// The default root type names, in operation-kind order.
pub const DEFAULT_ROOT_TYPE_NAMES: [Name; 3] =
    [QUERY_TYPE_NAME, MUTATION_TYPE_NAME, SUBSCRIPTION_TYPE_NAME];

/// The canonical type name a root operation of the given kind uses once a
/// document is normalized.
pub fn default_root_type_name(kind: ast::OperationType) -> Name {
    match kind {
        ast::OperationType::Query => QUERY_TYPE_NAME,
        ast::OperationType::Mutation => MUTATION_TYPE_NAME,
        ast::OperationType::Subscription => SUBSCRIPTION_TYPE_NAME,
    }
}

pub(crate) fn root_kind_name(kind: &ast::OperationType) -> &'static str {
    match kind {
        ast::OperationType::Query => "query",
        ast::OperationType::Mutation => "mutation",
        ast::OperationType::Subscription => "subscription",
    }
}
