use std::sync::Arc;

use apollo_compiler::Schema;
use apollo_compiler::executable;
use apollo_compiler::name;
use apollo_compiler::validation::Valid;
use pretty_assertions::assert_eq;

use super::*;

const TEST_SCHEMA: &str = r#"
    type Query {
        products: [Product]
        node: Node
    }

    interface Node {
        id: ID!
    }

    type Product implements Node {
        id: ID!
        sku: String
        price: Int
        reviews: [Review]
        related: [Product]
    }

    type Review {
        body: String
        author: User
    }

    type User implements Node {
        id: ID!
        name: String
    }
"#;

fn test_schema() -> Valid<Schema> {
    Schema::parse_and_validate(TEST_SCHEMA, "schema.graphql").expect("valid schema")
}

/// Parses `selections` as requested against the scope's parent type,
/// returning one `Field` per top-level entry.
fn fields_on(
    schema: &Valid<Schema>,
    scope: &Arc<Scope>,
    selections: &str,
    extra_fragments: &str,
) -> Vec<Field> {
    let source = format!(
        "fragment Fields on {} {{ {} }}\n{}",
        scope.parent_type(),
        selections,
        extra_fragments,
    );
    let document = executable::ExecutableDocument::parse(schema, source, "fields.graphql")
        .expect("valid selections");
    let fragment = document
        .fragments
        .get(&name!("Fields"))
        .expect("fragment parsed");
    fragment
        .selection_set
        .selections
        .iter()
        .map(|selection| match selection {
            executable::Selection::Field(node) => Field::new(Arc::clone(scope), node.clone()),
            other => panic!("expected only fields at the top level, got {other:?}"),
        })
        .collect()
}

/// Renders a selection tree one entry per line, for snapshotting.
fn summarize(selections: &[executable::Selection]) -> String {
    fn walk(selections: &[executable::Selection], indent: usize, out: &mut String) {
        for selection in selections {
            let pad = "  ".repeat(indent);
            match selection {
                executable::Selection::Field(field) => {
                    let name = field.alias.as_ref().unwrap_or(&field.name);
                    if field.selection_set.selections.is_empty() {
                        out.push_str(&format!("{pad}{name}\n"));
                    } else {
                        out.push_str(&format!("{pad}{name} {{\n"));
                        walk(&field.selection_set.selections, indent + 1, out);
                        out.push_str(&format!("{pad}}}\n"));
                    }
                }
                executable::Selection::InlineFragment(fragment) => {
                    let condition = fragment
                        .type_condition
                        .as_ref()
                        .map_or("_", |name| name.as_str());
                    out.push_str(&format!("{pad}... on {condition} {{\n"));
                    walk(&fragment.selection_set.selections, indent + 1, out);
                    out.push_str(&format!("{pad}}}\n"));
                }
                executable::Selection::FragmentSpread(spread) => {
                    out.push_str(&format!("{pad}...{}\n", spread.fragment_name));
                }
            }
        }
    }
    let mut out = String::new();
    walk(selections, 0, &mut out);
    out.trim_end().to_string()
}

fn product_scope() -> Arc<Scope> {
    Scope::new(name!("Product"), [name!("Product")])
}

#[test]
fn scalars_precede_composite_groups() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(&schema, &scope, "sku reviews { body } price", "");

    let merged = build_selection_set(&fields, Some(&scope));

    insta::assert_snapshot!(summarize(&merged), @r#"
    sku
    price
    reviews {
      body
    }
    "#);
}

#[test]
fn duplicate_response_names_merge_their_subselections() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(
        &schema,
        &scope,
        "reviews { body } sku reviews { author { id } }",
        "",
    );

    let merged = build_selection_set(&fields, Some(&scope));

    insta::assert_snapshot!(summarize(&merged), @r#"
    sku
    reviews {
      body
      author {
        id
      }
    }
    "#);
}

#[test]
fn every_response_name_appears_exactly_once() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(
        &schema,
        &scope,
        "sku sku price reviews { body } reviews { author { id } }",
        "",
    );

    let merged = build_selection_set(&fields, Some(&scope));

    let names: Vec<&str> = merged
        .iter()
        .map(|selection| match selection {
            executable::Selection::Field(field) => field.name.as_str(),
            other => panic!("expected only fields, got {other:?}"),
        })
        .collect();
    assert_eq!(names, ["sku", "price", "reviews"]);
}

#[test]
fn aliased_fields_group_by_response_name() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(&schema, &scope, "code: sku sku", "");

    let merged = build_selection_set(&fields, Some(&scope));

    insta::assert_snapshot!(summarize(&merged), @r#"
    code
    sku
    "#);
}

#[test]
fn foreign_scopes_are_wrapped_in_type_conditions() {
    let schema = test_schema();
    let node_scope = Scope::new(name!("Node"), [name!("Product"), name!("User")]);
    let product_scope = node_scope.child(name!("Product"), [name!("Product")]);

    let mut fields = fields_on(&schema, &node_scope, "id", "");
    fields.extend(fields_on(&schema, &product_scope, "sku price", ""));

    let merged = build_selection_set(&fields, Some(&node_scope));

    insta::assert_snapshot!(summarize(&merged), @r#"
    id
    ... on Product {
      sku
      price
    }
    "#);
}

#[test]
fn empty_field_set_yields_empty_selections() {
    assert!(build_selection_set(&[], None).is_empty());
    let scope = product_scope();
    assert!(build_selection_set(&[], Some(&scope)).is_empty());
}

#[test]
fn merging_a_field_set_with_itself_changes_nothing() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(
        &schema,
        &scope,
        "sku reviews { body author { name } } related { sku }",
        "",
    );

    let once = build_selection_set(&fields, Some(&scope));
    let mut doubled = fields.clone();
    doubled.extend(fields.iter().cloned());
    let twice = build_selection_set(&doubled, Some(&scope));

    assert_eq!(summarize(&once), summarize(&twice));
}

#[test]
fn fragment_spreads_deduplicate_as_leaves() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(
        &schema,
        &scope,
        "reviews { ...Details body } reviews { ...Details }",
        "fragment Details on Review { body author { id } }",
    );

    let merged = build_selection_set(&fields, Some(&scope));

    insta::assert_snapshot!(summarize(&merged), @r#"
    reviews {
      ...Details
      body
    }
    "#);
}

#[test]
fn inline_fragments_merge_by_type_condition() {
    let schema = test_schema();
    let scope = Scope::new(name!("Query"), [name!("Query")]);
    let fields = fields_on(
        &schema,
        &scope,
        "node { ... on Product { sku } id } node { ... on Product { price } }",
        "",
    );

    let merged = build_selection_set(&fields, Some(&scope));

    insta::assert_snapshot!(summarize(&merged), @r#"
    node {
      id
      ... on Product {
        sku
        price
      }
    }
    "#);
}

#[test]
fn merge_subselections_unions_child_selections() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(
        &schema,
        &scope,
        "reviews { body } reviews { author { id } body }",
        "",
    );

    let merged = merge_subselections(fields.iter().map(|field| &field.node().selection_set));

    insta::assert_snapshot!(summarize(&merged), @r#"
    body
    author {
      id
    }
    "#);
}

#[test]
fn scope_chains_link_backwards_only() {
    let root = Scope::new(name!("Query"), [name!("Query")]);
    let product = root.child(name!("Product"), [name!("Product")]);

    assert!(root.enclosing().is_none());
    assert_eq!(
        product.enclosing().map(|scope| scope.parent_type().as_str()),
        Some("Query")
    );
    assert!(product.possible_types().contains(&name!("Product")));
}

#[test]
fn merged_output_wraps_into_a_printable_selection_set() {
    let schema = test_schema();
    let scope = product_scope();
    let fields = fields_on(&schema, &scope, "sku reviews { body }", "");

    let merged = build_selection_set(&fields, Some(&scope));
    let set = selection_set(name!("Product"), merged);

    assert_eq!(set.ty.as_str(), "Product");
    assert_eq!(set.selections.len(), 2);
}
