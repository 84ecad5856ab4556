//! Merges the fields collected for one subgraph fetch into a single
//! deduplicated selection tree.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::executable;

use super::Field;
use super::HasSelectionKey as _;
use super::Scope;
use super::SelectionKey;

/// Builds the selection tree for a set of fields collected against a single
/// subgraph.
///
/// Fields are grouped by declaring type, then by response name within each
/// declaring type, both in first-appearance order. A response-name group is
/// combined into one field: the first occurrence is the structural template,
/// and a field selecting into a composite type has its nested selection
/// replaced by [`merge_subselections`] over every group member. Within a
/// declaring-type group, fields without sub-selections are emitted before
/// fields with them, the same two-phase ordering the nested merge uses.
/// A group declared on a type other than the parent scope's is wrapped in a
/// type-conditioned inline fragment, so the selection stays valid when sent
/// against a supertype; the per-group outputs are concatenated in
/// group-first-appearance order.
///
/// An empty field set yields an empty selection list.
///
/// # Preconditions
/// Fields sharing a response name within one declaring type must be requests
/// for the same field with structurally identical arguments; the merger does
/// not reconcile or validate conflicting arguments. Whether a field is
/// composite is read off its node: a field carrying a nested selection is
/// merged as composite, anything else is a leaf taken from its first
/// occurrence.
pub fn build_selection_set(
    fields: &[Field],
    parent_scope: Option<&Scope>,
) -> Vec<executable::Selection> {
    tracing::trace!(fields = fields.len(), "building selection set");
    let mut by_declaring_type: IndexMap<&Name, Vec<&Field>> = IndexMap::default();
    for field in fields {
        by_declaring_type
            .entry(field.parent_type())
            .or_default()
            .push(field);
    }

    let mut selections = Vec::new();
    for (declaring_type, group) in by_declaring_type {
        let mut by_response_name: IndexMap<&Name, Vec<&Field>> = IndexMap::default();
        for field in group {
            by_response_name
                .entry(field.response_name())
                .or_default()
                .push(field);
        }

        let mut leaf_fields = Vec::new();
        let mut branching_fields = Vec::new();
        for group in by_response_name.into_values() {
            let Some((first, _)) = group.split_first() else {
                continue;
            };
            let combined = combine_field_group(first, &group);
            if is_branching(&combined) {
                branching_fields.push(combined);
            } else {
                leaf_fields.push(combined);
            }
        }
        let combined: Vec<executable::Selection> =
            leaf_fields.into_iter().chain(branching_fields).collect();

        let matches_parent =
            parent_scope.map_or(true, |scope| scope.parent_type() == declaring_type);
        if matches_parent {
            selections.extend(combined);
        } else {
            selections.push(executable::Selection::InlineFragment(Node::new(
                executable::InlineFragment {
                    type_condition: Some(declaring_type.clone()),
                    directives: Default::default(),
                    selection_set: executable::SelectionSet {
                        ty: declaring_type.clone(),
                        selections: combined,
                    },
                },
            )));
        }
    }
    selections
}

/// Recursively merges the child selections of the given selection sets into
/// one deduplicated list.
///
/// Leaf items (fields without sub-selections, and fragment spreads) are
/// deduplicated by key and emitted first, in first-appearance order.
/// Branching items (fields with sub-selections, and type-conditioned inline
/// fragments) are grouped by key; the first item of a group is the
/// structural template and its nested selection is replaced by the recursive
/// merge of every member's children. All leaves precede all branching groups:
/// the two-phase ordering is an observable contract, not an artifact.
pub fn merge_subselections<'a>(
    sets: impl IntoIterator<Item = &'a executable::SelectionSet>,
) -> Vec<executable::Selection> {
    merge_selection_items(sets.into_iter().flat_map(|set| &set.selections))
}

fn merge_selection_items<'a>(
    items: impl Iterator<Item = &'a executable::Selection>,
) -> Vec<executable::Selection> {
    let mut leaves: IndexMap<SelectionKey, &executable::Selection> = IndexMap::default();
    let mut branches: IndexMap<SelectionKey, Vec<&executable::Selection>> = IndexMap::default();
    for item in items {
        if is_branching(item) {
            branches.entry(item.key()).or_default().push(item);
        } else {
            leaves.entry(item.key()).or_insert(item);
        }
    }

    let mut merged: Vec<executable::Selection> = leaves.into_values().cloned().collect();
    for group in branches.into_values() {
        let Some((first, _)) = group.split_first() else {
            continue;
        };
        merged.push(merge_branch_group(first, &group));
    }
    merged
}

/// A branching item owns further selections of its own; everything else
/// merges as an atomic leaf.
fn is_branching(item: &executable::Selection) -> bool {
    match item {
        executable::Selection::Field(field) => !field.selection_set.selections.is_empty(),
        executable::Selection::InlineFragment(_) => true,
        executable::Selection::FragmentSpread(_) => false,
    }
}

fn combine_field_group(first: &Field, members: &[&Field]) -> executable::Selection {
    let mut field = first.node().as_ref().clone();
    if !field.selection_set.selections.is_empty() {
        field.selection_set.selections =
            merge_subselections(members.iter().map(|member| &member.node().selection_set));
    }
    executable::Selection::Field(Node::new(field))
}

fn merge_branch_group(
    first: &executable::Selection,
    members: &[&executable::Selection],
) -> executable::Selection {
    let children =
        merge_selection_items(members.iter().flat_map(|member| child_selections(member)));
    match first {
        executable::Selection::Field(field) => {
            let mut field = field.as_ref().clone();
            field.selection_set.selections = children;
            executable::Selection::Field(Node::new(field))
        }
        executable::Selection::InlineFragment(fragment) => {
            let mut fragment = fragment.as_ref().clone();
            fragment.selection_set.selections = children;
            executable::Selection::InlineFragment(Node::new(fragment))
        }
        // Spreads never head a branching group; they are classified as leaves.
        executable::Selection::FragmentSpread(spread) => {
            executable::Selection::FragmentSpread(spread.clone())
        }
    }
}

fn child_selections(item: &executable::Selection) -> &[executable::Selection] {
    match item {
        executable::Selection::Field(field) => &field.selection_set.selections,
        executable::Selection::InlineFragment(fragment) => &fragment.selection_set.selections,
        executable::Selection::FragmentSpread(_) => &[],
    }
}
