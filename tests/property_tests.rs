//! Property-based tests for the category forest builder and the text
//! normalization used by candidate search.

use chrono::Utc;
use proptest::prelude::*;

use dealerdesk_api::models::{Category, CategoryNode};
use dealerdesk_api::services::categories::build_category_tree;
use dealerdesk_api::text::{remove_accents, search_key};

fn category(id: String, parent_id: Option<String>) -> Category {
    let now = Utc::now();
    Category {
        name: format!("Category {id}"),
        id,
        parent_id,
        parent_name: None,
        created_at: now,
        updated_at: now,
    }
}

/// Flat category sets whose parents, when present, point at earlier records
/// (acyclic by construction) or at ids that do not exist at all.
fn flat_categories() -> impl Strategy<Value = Vec<Category>> {
    (0usize..40).prop_flat_map(|n| {
        let parents: Vec<BoxedStrategy<Option<String>>> = (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop_oneof![
                        3 => Just(None),
                        5 => (0..i).prop_map(|j| Some(format!("c{j}"))),
                        2 => Just(Some("missing".to_string())),
                    ]
                    .boxed()
                }
            })
            .collect();
        parents.prop_map(|parents| {
            parents
                .into_iter()
                .enumerate()
                .map(|(i, parent)| category(format!("c{i}"), parent))
                .collect()
        })
    })
}

fn collect_ids(forest: &[CategoryNode], into: &mut Vec<String>) {
    for node in forest {
        into.push(node.id.clone());
        collect_ids(&node.sub_categories, into);
    }
}

fn find<'a>(forest: &'a [CategoryNode], id: &str) -> Option<&'a CategoryNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.sub_categories, id) {
            return Some(found);
        }
    }
    None
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every input record lands in the forest exactly once: resolvable
    /// children under their parent, roots and orphans at the top level.
    #[test]
    fn every_record_appears_exactly_once(records in flat_categories()) {
        let forest = build_category_tree(&records);

        let mut seen = Vec::new();
        collect_ids(&forest, &mut seen);
        seen.sort();
        let mut expected: Vec<String> = records.iter().map(|c| c.id.clone()).collect();
        expected.sort();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn resolvable_children_hang_under_their_parent_and_never_at_the_root(
        records in flat_categories()
    ) {
        let ids: std::collections::HashSet<&str> =
            records.iter().map(|c| c.id.as_str()).collect();
        let forest = build_category_tree(&records);

        for record in &records {
            match record.parent_id.as_deref() {
                Some(parent) if ids.contains(parent) => {
                    let parent_node = find(&forest, parent).expect("parent in forest");
                    let under_parent = parent_node
                        .sub_categories
                        .iter()
                        .filter(|child| child.id == record.id)
                        .count();
                    prop_assert_eq!(under_parent, 1);
                    prop_assert!(forest.iter().all(|root| root.id != record.id));
                }
                _ => {
                    // Roots and orphans appear exactly once at the top level.
                    let at_root = forest.iter().filter(|root| root.id == record.id).count();
                    prop_assert_eq!(at_root, 1);
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Stripping accents twice is the same as stripping once.
    #[test]
    fn remove_accents_is_idempotent(s in "\\PC{0,40}") {
        let once = remove_accents(&s);
        prop_assert_eq!(remove_accents(&once), once);
    }

    /// The search key never contains combining marks or uppercase ASCII.
    #[test]
    fn search_key_is_fully_folded(s in "\\PC{0,40}") {
        let key = search_key(&s);
        prop_assert!(!key.chars().any(|c| ('\u{0300}'..='\u{036f}').contains(&c)), "search key contains a combining mark");
        prop_assert!(!key.chars().any(|c| c.is_ascii_uppercase()));
    }

    /// ASCII text is untouched by accent folding.
    #[test]
    fn ascii_is_a_fixed_point(s in "[ -~]{0,40}") {
        prop_assert_eq!(remove_accents(&s), s);
    }
}
