//! Subgraph document normalization.
//!
//! Composition runs two passes over each subgraph's type-definition document
//! before anything is merged into the composed graph:
//!
//! 1. [`normalize_root_types`] rewrites root operation types into extensions
//!    of the default root type names (`Query`, `Mutation`, `Subscription`), so
//!    every subgraph contributes its root fields under the same names.
//! 2. [`strip_external_fields`] removes fields marked `@external` (fields the
//!    subgraph references but does not own) and records what was removed so
//!    composition can reconcile ownership across services.
//!
//! Both passes return new documents. The input document is never mutated and
//! stays safe to snapshot for diagnostics.

use std::fmt::Formatter;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use itertools::Itertools;
use serde::Serialize;

use crate::error::CompositionError;
use crate::subgraph::spec::DEFAULT_ROOT_TYPE_NAMES;
use crate::subgraph::spec::EXTERNAL_DIRECTIVE_NAME;
use crate::subgraph::spec::default_root_type_name;

pub mod spec;

/// A subgraph's raw type-definition document, as registered with the gateway.
#[derive(Clone)]
pub struct Subgraph {
    pub name: String,
    pub url: String,
    pub document: ast::Document,
}

impl Subgraph {
    pub fn new(name: &str, url: &str, document: ast::Document) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            document,
        }
    }

    pub fn parse(name: &str, url: &str, document_str: &str) -> Result<Self, CompositionError> {
        let document = ast::Document::parse(document_str, name)
            .map_err(|invalid| CompositionError::from_diagnostics(&invalid.errors))?;
        Ok(Self::new(name, url, document))
    }

    /// Runs both normalization passes, yielding the canonical document this
    /// subgraph contributes to composition along with the ownership records
    /// for every field that was stripped.
    pub fn normalize(&self) -> Result<NormalizedSubgraph, CompositionError> {
        let canonical = normalize_root_types(&self.document)?;
        let (document, stripped_fields) = strip_external_fields(&canonical, &self.name);
        Ok(NormalizedSubgraph {
            name: self.name.clone(),
            url: self.url.clone(),
            document,
            stripped_fields,
        })
    }
}

impl std::fmt::Debug for Subgraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, r#"name: {}, url: {}"#, self.name, self.url)
    }
}

/// The output of [`Subgraph::normalize`]: a canonical document plus the
/// records composition folds into the cross-service ownership map.
#[derive(Clone)]
pub struct NormalizedSubgraph {
    pub name: String,
    pub url: String,
    pub document: ast::Document,
    pub stripped_fields: Vec<StrippedField>,
}

impl std::fmt::Debug for NormalizedSubgraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            r#"name: {}, url: {}, stripped: {}"#,
            self.name,
            self.url,
            self.stripped_fields.len()
        )
    }
}

/// A field removed by [`strip_external_fields`], with enough context for the
/// composition step to reconcile ownership across subgraphs.
#[derive(Debug, Clone, Serialize)]
pub struct StrippedField {
    #[serde(serialize_with = "crate::display_helpers::serialize_as_string")]
    pub field: Node<ast::FieldDefinition>,
    pub parent_type_name: Name,
    pub service_name: String,
}

/// Cross-service field ownership, keyed by declaring type and field name.
///
/// Composition folds every subgraph's [`StrippedField`] records into one of
/// these; the first service to record a field keeps it, and later claims are
/// logged rather than overwriting (conflict resolution is a composition-level
/// concern, not a bookkeeping one).
#[derive(Debug, Clone, Default)]
pub struct FieldOwnership {
    owners: IndexMap<Name, IndexMap<Name, String>>,
}

impl FieldOwnership {
    pub fn record(&mut self, record: &StrippedField) {
        let fields = self
            .owners
            .entry(record.parent_type_name.clone())
            .or_default();
        match fields.entry(record.field.name.clone()) {
            indexmap::map::Entry::Occupied(entry) => {
                tracing::debug!(
                    type_name = %record.parent_type_name,
                    field = %record.field.name,
                    owner = %entry.get(),
                    claimant = %record.service_name,
                    "field ownership already recorded"
                );
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(record.service_name.clone());
            }
        }
    }

    pub fn owner_of(&self, type_name: &Name, field_name: &Name) -> Option<&str> {
        self.owners
            .get(type_name)?
            .get(field_name)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.values().all(IndexMap::is_empty)
    }
}

impl<'a> FromIterator<&'a StrippedField> for FieldOwnership {
    fn from_iter<T: IntoIterator<Item = &'a StrippedField>>(iter: T) -> Self {
        let mut ownership = Self::default();
        for record in iter {
            ownership.record(record);
        }
        ownership
    }
}

/// Rewrites a document's root operation types into extensions of the default
/// root type names.
///
/// With a schema declaration present, every bound root type definition (or
/// extension) becomes an extension of the corresponding default root type
/// name, carrying its fields over; the original definition and the schema
/// declaration are removed. A sibling type using one of the default root type
/// names without being designated by the declaration is dropped entirely, and
/// a field on a kept type whose declared return type names a dropped type is
/// dropped with it. The return-type check is deliberately a one-hop name
/// comparison, not a reachability analysis.
///
/// Without a schema declaration the document is already canonical and passes
/// through unchanged.
///
/// # Errors
/// Returns an error if the declaration binds a root operation to a type the
/// document does not define, or if the document carries more than one schema
/// declaration.
pub fn normalize_root_types(document: &ast::Document) -> Result<ast::Document, CompositionError> {
    let schema_declaration = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::Definition::SchemaDefinition(node) => Some(node),
            _ => None,
        })
        .at_most_one()
        .map_err(|_| CompositionError::InvalidDocument {
            message: "a document may carry at most one schema declaration".to_owned(),
        })?;
    let Some(schema_declaration) = schema_declaration else {
        return Ok(document.clone());
    };

    let mut bound_roots: IndexMap<Name, ast::OperationType> = IndexMap::default();
    for root_operation in &schema_declaration.root_operations {
        let (operation_kind, type_name) = &**root_operation;
        bound_roots.insert(type_name.clone(), *operation_kind);
    }
    for (type_name, operation_kind) in &bound_roots {
        if !defines_object_type(document, type_name) {
            return Err(CompositionError::UnknownRootBinding {
                operation_kind: *operation_kind,
                type_name: type_name.clone(),
            });
        }
    }

    // Types that would collide with a canonical root name after the rewrite.
    let mut dropped_types: IndexSet<Name> = IndexSet::default();
    for definition in &document.definitions {
        if let Some(name) = object_type_name(definition) {
            if DEFAULT_ROOT_TYPE_NAMES.contains(name) && !bound_roots.contains_key(name) {
                dropped_types.insert(name.clone());
            }
        }
    }

    let mut normalized = ast::Document::new();
    for definition in &document.definitions {
        match definition {
            ast::Definition::SchemaDefinition(_) => {}
            ast::Definition::ObjectTypeDefinition(object) => {
                if let Some(operation_kind) = bound_roots.get(&object.name) {
                    normalized.definitions.push(ast::Definition::ObjectTypeExtension(Node::new(
                        ast::ObjectTypeExtension {
                            name: default_root_type_name(*operation_kind),
                            implements_interfaces: object.implements_interfaces.clone(),
                            directives: object.directives.clone(),
                            fields: retained_fields(&object.fields, &dropped_types),
                        },
                    )));
                } else if dropped_types.contains(&object.name) {
                    tracing::debug!(type_name = %object.name, "dropping type colliding with a canonical root type name");
                } else {
                    let mut object = object.clone();
                    let inner = object.make_mut();
                    inner.fields = retained_fields(&inner.fields, &dropped_types);
                    normalized
                        .definitions
                        .push(ast::Definition::ObjectTypeDefinition(object));
                }
            }
            ast::Definition::ObjectTypeExtension(extension) => {
                if let Some(operation_kind) = bound_roots.get(&extension.name) {
                    normalized.definitions.push(ast::Definition::ObjectTypeExtension(Node::new(
                        ast::ObjectTypeExtension {
                            name: default_root_type_name(*operation_kind),
                            implements_interfaces: extension.implements_interfaces.clone(),
                            directives: extension.directives.clone(),
                            fields: retained_fields(&extension.fields, &dropped_types),
                        },
                    )));
                } else if dropped_types.contains(&extension.name) {
                    tracing::debug!(type_name = %extension.name, "dropping extension colliding with a canonical root type name");
                } else {
                    let mut extension = extension.clone();
                    let inner = extension.make_mut();
                    inner.fields = retained_fields(&inner.fields, &dropped_types);
                    normalized
                        .definitions
                        .push(ast::Definition::ObjectTypeExtension(extension));
                }
            }
            ast::Definition::InterfaceTypeDefinition(interface) => {
                let mut interface = interface.clone();
                let inner = interface.make_mut();
                inner.fields = retained_fields(&inner.fields, &dropped_types);
                normalized
                    .definitions
                    .push(ast::Definition::InterfaceTypeDefinition(interface));
            }
            ast::Definition::InterfaceTypeExtension(extension) => {
                let mut extension = extension.clone();
                let inner = extension.make_mut();
                inner.fields = retained_fields(&inner.fields, &dropped_types);
                normalized
                    .definitions
                    .push(ast::Definition::InterfaceTypeExtension(extension));
            }
            other => normalized.definitions.push(other.clone()),
        }
    }
    Ok(normalized)
}

fn defines_object_type(document: &ast::Document, type_name: &Name) -> bool {
    document
        .definitions
        .iter()
        .any(|definition| object_type_name(definition) == Some(type_name))
}

fn object_type_name(definition: &ast::Definition) -> Option<&Name> {
    match definition {
        ast::Definition::ObjectTypeDefinition(object) => Some(&object.name),
        ast::Definition::ObjectTypeExtension(extension) => Some(&extension.name),
        _ => None,
    }
}

fn retained_fields(
    fields: &[Node<ast::FieldDefinition>],
    dropped_types: &IndexSet<Name>,
) -> Vec<Node<ast::FieldDefinition>> {
    fields
        .iter()
        .filter(|field| {
            let keep = !dropped_types.contains(field.ty.inner_named_type());
            if !keep {
                tracing::debug!(field = %field.name, "dropping field whose return type no longer resolves");
            }
            keep
        })
        .cloned()
        .collect()
}

/// Removes every field annotated `@external` from the document's object and
/// interface definitions and extensions, returning the new document together
/// with a record per removed field, in document order.
///
/// Type and extension nodes are retained even when all their fields are
/// stripped: their remaining annotations (an entity `@key`, notably) still
/// participate in composition. The input document is not mutated.
pub fn strip_external_fields(
    document: &ast::Document,
    service_name: &str,
) -> (ast::Document, Vec<StrippedField>) {
    let mut stripped = Vec::new();
    let mut output = ast::Document::new();
    for definition in &document.definitions {
        let definition = match definition {
            ast::Definition::ObjectTypeDefinition(object) => {
                let mut object = object.clone();
                let inner = object.make_mut();
                let parent_type_name = inner.name.clone();
                take_external_fields(
                    &mut inner.fields,
                    &parent_type_name,
                    service_name,
                    &mut stripped,
                );
                ast::Definition::ObjectTypeDefinition(object)
            }
            ast::Definition::ObjectTypeExtension(extension) => {
                let mut extension = extension.clone();
                let inner = extension.make_mut();
                let parent_type_name = inner.name.clone();
                take_external_fields(
                    &mut inner.fields,
                    &parent_type_name,
                    service_name,
                    &mut stripped,
                );
                ast::Definition::ObjectTypeExtension(extension)
            }
            ast::Definition::InterfaceTypeDefinition(interface) => {
                let mut interface = interface.clone();
                let inner = interface.make_mut();
                let parent_type_name = inner.name.clone();
                take_external_fields(
                    &mut inner.fields,
                    &parent_type_name,
                    service_name,
                    &mut stripped,
                );
                ast::Definition::InterfaceTypeDefinition(interface)
            }
            ast::Definition::InterfaceTypeExtension(extension) => {
                let mut extension = extension.clone();
                let inner = extension.make_mut();
                let parent_type_name = inner.name.clone();
                take_external_fields(
                    &mut inner.fields,
                    &parent_type_name,
                    service_name,
                    &mut stripped,
                );
                ast::Definition::InterfaceTypeExtension(extension)
            }
            other => other.clone(),
        };
        output.definitions.push(definition);
    }
    (output, stripped)
}

fn take_external_fields(
    fields: &mut Vec<Node<ast::FieldDefinition>>,
    parent_type_name: &Name,
    service_name: &str,
    stripped: &mut Vec<StrippedField>,
) {
    fields.retain(|field| {
        if field
            .directives
            .get(EXTERNAL_DIRECTIVE_NAME.as_str())
            .is_none()
        {
            return true;
        }
        stripped.push(StrippedField {
            field: field.clone(),
            parent_type_name: parent_type_name.clone(),
            service_name: service_name.to_owned(),
        });
        false
    });
}
