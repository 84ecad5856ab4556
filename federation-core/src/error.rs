use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::validation::DiagnosticList;

use crate::subgraph::spec::root_kind_name;

/// Errors surfaced while composing a subgraph document.
///
/// These are always scoped to the single document being normalized; nothing in
/// this crate aborts the process or retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// The schema declaration binds a root operation to a type that is not
    /// defined anywhere in the document.
    #[error(
        r#"schema declaration names unknown type "{type_name}" as its {} root operation type"#,
        root_kind_name(.operation_kind)
    )]
    UnknownRootBinding {
        operation_kind: ast::OperationType,
        type_name: Name,
    },
    /// The document is malformed in a way that prevents normalization, e.g.
    /// it fails to parse or carries more than one schema declaration.
    #[error("invalid subgraph document: {message}")]
    InvalidDocument { message: String },
}

impl CompositionError {
    pub(crate) fn from_diagnostics(errors: &DiagnosticList) -> Self {
        Self::InvalidDocument {
            message: errors.to_string(),
        }
    }
}
