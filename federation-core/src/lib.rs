//! Schema composition and selection merging for the federated graph gateway.
//!
//! This crate holds the two pure transformations the rest of the gateway is
//! built around:
//!
//! - [`subgraph`] canonicalizes a subgraph's type-definition document at
//!   composition time: root operation types become extensions of the default
//!   root type names, and externally owned fields are stripped out with a
//!   record of what was removed.
//! - [`operation`] merges the fields collected for a single subgraph fetch
//!   into one deduplicated selection tree, grouped by declaring type and
//!   response name.
//!
//! Both transformations are synchronous and side-effect free: they read their
//! inputs and allocate new output structures, so concurrent planning tasks
//! can call into them without coordination. Serialization of the results is
//! left to `apollo-compiler`'s document printer.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    while_true,
    unconditional_panic,
    clippy::all
)]

mod display_helpers;
pub mod error;
pub mod operation;
pub mod subgraph;

pub use crate::error::CompositionError;
pub use crate::operation::Field;
pub use crate::operation::FieldSet;
pub use crate::operation::Scope;
pub use crate::operation::build_selection_set;
pub use crate::operation::merge_subselections;
pub use crate::operation::selection_set;
pub use crate::subgraph::FieldOwnership;
pub use crate::subgraph::NormalizedSubgraph;
pub use crate::subgraph::StrippedField;
pub use crate::subgraph::Subgraph;
pub use crate::subgraph::normalize_root_types;
pub use crate::subgraph::strip_external_fields;

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<Subgraph>();
    assert_thread_safe::<operation::Field>();
    assert_thread_safe::<operation::Scope>();
};
