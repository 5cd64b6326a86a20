//! Integration tests for the structure tree: reference scenarios and the
//! counter properties every mutation has to keep.

use rstest::{fixture, rstest};

use strucount::domain::{Count, Entry, EntryKind, StructureTree, TreeChange};
use strucount::util::testing;

fn counts_of(tree: &StructureTree, name: &str) -> Count {
    tree.node(tree.find(name).expect("node exists"))
        .expect("live node")
        .counts()
}

fn names(tree: &StructureTree) -> Vec<String> {
    tree.iter().map(|(_, n)| n.name().to_string()).collect()
}

fn assert_consistent(tree: &StructureTree) {
    let mismatches = tree.recount();
    assert!(mismatches.is_empty(), "inconsistent counters: {:?}", mismatches);
}

/// P / pkg / A.java / Foo / bar, root 1/1.
#[fixture]
fn scenario_tree() -> StructureTree {
    testing::init_test_setup();
    StructureTree::new(&Entry::aggregate(
        EntryKind::Module,
        "P",
        vec![Entry::aggregate(
            EntryKind::Package,
            "pkg",
            vec![Entry::source_file(
                "A.java",
                vec![Entry::class("Foo", vec![Entry::function("bar")])],
            )],
        )],
    ))
    .expect("valid base entry")
}

fn b_java() -> Entry {
    Entry::source_file(
        "B.java",
        vec![Entry::class(
            "B",
            vec![Entry::function("x"), Entry::function("y")],
        )],
    )
}

// ============================================================
// Scenarios
// ============================================================

#[rstest]
fn given_scenario_a_when_creating_b_java_then_ancestors_grow(mut scenario_tree: StructureTree) {
    // Arrange
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1));

    // Act
    scenario_tree.create_child_node("pkg", &b_java()).unwrap();

    // Assert
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(2, 3));
    assert_eq!(counts_of(&scenario_tree, "pkg"), Count::new(2, 3));
    let pkg = scenario_tree.find("pkg").unwrap();
    let last = *scenario_tree.children(pkg).last().unwrap();
    assert_eq!(scenario_tree.node(last).unwrap().name(), "B.java");
    assert_consistent(&scenario_tree);
}

#[rstest]
fn given_b_java_when_replaced_by_empty_file_then_ancestors_shrink(
    mut scenario_tree: StructureTree,
) {
    // Arrange
    scenario_tree.create_child_node("pkg", &b_java()).unwrap();

    // Act
    scenario_tree
        .update_existing_file_node_by_contents("pkg", &Entry::source_file("B.java", vec![]))
        .unwrap();

    // Assert
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1));
    assert_eq!(counts_of(&scenario_tree, "pkg"), Count::new(1, 1));
    assert_eq!(counts_of(&scenario_tree, "B.java"), Count::ZERO);
    assert!(scenario_tree.find("x").is_none());
    assert_consistent(&scenario_tree);
}

#[rstest]
fn given_scenario_a_when_deleting_a_java_then_pkg_is_empty(mut scenario_tree: StructureTree) {
    scenario_tree.delete_child_node("pkg", "A.java").unwrap();

    assert_eq!(counts_of(&scenario_tree, "P"), Count::ZERO);
    assert_eq!(counts_of(&scenario_tree, "pkg"), Count::ZERO);
    let pkg = scenario_tree.find("pkg").unwrap();
    assert!(scenario_tree.children(pkg).is_empty());
    assert_eq!(scenario_tree.len(), 2);
}

#[rstest]
fn given_empty_b_java_when_renaming_then_counts_stay(mut scenario_tree: StructureTree) {
    // Arrange
    scenario_tree.create_child_node("pkg", &b_java()).unwrap();
    scenario_tree
        .update_existing_file_node_by_contents("pkg", &Entry::source_file("B.java", vec![]))
        .unwrap();
    let rx = scenario_tree.subscribe();

    // Act
    scenario_tree.rename_node("pkg", "B.java", "C.java").unwrap();

    // Assert
    let c = scenario_tree.find("C.java").expect("renamed node");
    assert_eq!(scenario_tree.node(c).unwrap().counts(), Count::ZERO);
    assert!(scenario_tree.find("B.java").is_none());
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1));
    let changes: Vec<TreeChange> = rx.try_iter().collect();
    assert_eq!(changes, vec![TreeChange::Changed { node: c }]);
}

// ============================================================
// Properties
// ============================================================

#[rstest]
fn given_mixed_mutations_when_applied_then_aggregation_holds(mut scenario_tree: StructureTree) {
    scenario_tree.create_child_node("pkg", &b_java()).unwrap();
    scenario_tree
        .create_child_node("P", &Entry::aggregate(EntryKind::Package, "other", vec![b_java()]))
        .unwrap();
    assert_consistent(&scenario_tree);

    scenario_tree
        .update_existing_file_node_by_contents(
            "other",
            &Entry::source_file(
                "B.java",
                vec![Entry::class("B", vec![]), Entry::class("B2", vec![Entry::function("z")])],
            ),
        )
        .unwrap();
    assert_consistent(&scenario_tree);

    scenario_tree.delete_child_node("pkg", "A.java").unwrap();
    assert_consistent(&scenario_tree);
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(3, 3));
}

#[rstest]
#[case::empty_file(0, 0)]
#[case::one_class(1, 2)]
#[case::several_classes(3, 5)]
fn given_created_child_when_deleted_then_ancestors_return_to_original_counts(
    mut scenario_tree: StructureTree,
    #[case] classes: usize,
    #[case] functions_per_class: usize,
) {
    // Arrange
    let functions = classes * functions_per_class;
    let added = Entry::source_file(
        "N.java",
        (0..classes)
            .map(|c| {
                Entry::class(
                    format!("N{}", c),
                    (0..functions_per_class)
                        .map(|f| Entry::function(format!("m{}_{}", c, f)))
                        .collect(),
                )
            })
            .collect(),
    );
    let expected_added = Count::new(classes as i64, functions as i64);
    assert_eq!(added.count(), expected_added);

    // Act + Assert: create adds exactly the entry's counts to every ancestor
    scenario_tree.create_child_node("pkg", &added).unwrap();
    assert_eq!(counts_of(&scenario_tree, "pkg"), Count::new(1, 1) + expected_added);
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1) + expected_added);

    // Act + Assert: deleting the same child removes exactly as much
    scenario_tree.delete_child_node("pkg", "N.java").unwrap();
    assert_eq!(counts_of(&scenario_tree, "pkg"), Count::new(1, 1));
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1));
    assert!(scenario_tree.find("N.java").is_none());
    assert_consistent(&scenario_tree);
}

#[rstest]
#[case::grows(Entry::source_file("A.java", vec![Entry::class("Foo", vec![Entry::function("bar"), Entry::function("baz")]), Entry::class("Qux", vec![])]), Count::new(2, 2))]
#[case::shrinks(Entry::source_file("A.java", vec![]), Count::ZERO)]
fn given_update_when_counts_differ_then_ancestors_follow_new_counts(
    mut scenario_tree: StructureTree,
    #[case] modified: Entry,
    #[case] expected_root: Count,
) {
    scenario_tree
        .update_existing_file_node_by_contents("pkg", &modified)
        .unwrap();

    assert_eq!(counts_of(&scenario_tree, "P"), expected_root);
    assert_eq!(counts_of(&scenario_tree, "pkg"), expected_root);
    assert_consistent(&scenario_tree);
}

#[rstest]
fn given_update_with_identical_counts_when_applied_then_ancestors_untouched(
    mut scenario_tree: StructureTree,
) {
    let rx = scenario_tree.subscribe();
    let same_counts = Entry::source_file("A.java", vec![Entry::class("Renamed", vec![Entry::function("other")])]);

    scenario_tree
        .update_existing_file_node_by_contents("pkg", &same_counts)
        .unwrap();

    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1));
    assert!(scenario_tree.find("Renamed").is_some());
    assert!(scenario_tree.find("Foo").is_none());
    let changes: Vec<TreeChange> = rx.try_iter().collect();
    assert!(
        !changes.iter().any(|c| matches!(c, TreeChange::Changed { .. })),
        "no counter change expected: {:?}",
        changes
    );
}

#[rstest]
fn given_any_node_when_renaming_then_counts_are_preserved(mut scenario_tree: StructureTree) {
    let before: Vec<Count> = scenario_tree.iter().map(|(_, n)| n.counts()).collect();

    scenario_tree.rename_node("P", "pkg", "renamed").unwrap();
    scenario_tree.rename_node("renamed", "bar", "qux").unwrap();

    let after: Vec<Count> = scenario_tree.iter().map(|(_, n)| n.counts()).collect();
    assert_eq!(before, after);
    assert_eq!(names(&scenario_tree), vec!["P", "renamed", "A.java", "Foo", "qux"]);
}

#[rstest]
#[case::create_unknown_parent("create")]
#[case::update_unknown_file("update")]
#[case::rename_unknown_node("rename")]
#[case::delete_unknown_scope("delete")]
fn given_missing_name_when_mutating_then_tree_is_unchanged(
    mut scenario_tree: StructureTree,
    #[case] operation: &str,
) {
    let before = names(&scenario_tree);
    let rx = scenario_tree.subscribe();

    let result = match operation {
        "create" => scenario_tree.create_child_node("nope", &b_java()),
        "update" => scenario_tree.update_existing_file_node_by_contents("pkg", &b_java()),
        "rename" => scenario_tree.rename_node("pkg", "Missing.java", "X.java"),
        _ => scenario_tree.delete_child_node("nope", "A.java"),
    };

    assert!(result.is_ok());
    assert_eq!(names(&scenario_tree), before);
    assert_eq!(counts_of(&scenario_tree, "P"), Count::new(1, 1));
    assert_eq!(rx.try_iter().count(), 0);
}

#[rstest]
fn given_duplicate_names_when_scoping_then_first_match_in_scope_wins(
    mut scenario_tree: StructureTree,
) {
    // Arrange: a second package also containing A.java
    scenario_tree
        .create_child_node(
            "P",
            &Entry::aggregate(
                EntryKind::Package,
                "other",
                vec![Entry::source_file("A.java", vec![Entry::class("Dup", vec![])])],
            ),
        )
        .unwrap();

    // Act
    scenario_tree.delete_child_node("other", "A.java").unwrap();

    // Assert: the copy inside "other" is gone, the one in "pkg" stays
    assert!(scenario_tree.find_within("other", "A.java").is_none());
    let kept = scenario_tree.find_within("pkg", "A.java").expect("A.java in pkg");
    assert_eq!(scenario_tree.path_of(kept), vec!["P", "pkg", "A.java"]);
    assert_eq!(counts_of(&scenario_tree, "pkg"), Count::new(1, 1));
    assert_eq!(counts_of(&scenario_tree, "other"), Count::ZERO);
    assert!(scenario_tree.find("Dup").is_none());
    assert_consistent(&scenario_tree);
}
