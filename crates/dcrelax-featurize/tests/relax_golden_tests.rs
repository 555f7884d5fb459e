//! Golden templates for the unit-test constraint fixtures under `data/unit_test`.

use std::path::PathBuf;

use dcrelax_dsl::dc_v1::parse_dc_v1;
use dcrelax_dsl::{AttributeCatalog, TupleSide};
use dcrelax_featurize::{generate_relaxations, relax_dc_text, RelaxConfig, RelaxError};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data/unit_test")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn dataset_catalog() -> AttributeCatalog {
    let csv = fixture("unit_test_dataset.csv");
    AttributeCatalog::from_csv_header(csv.lines().next().expect("header row"))
}

fn templates(constraints_file: &str) -> Vec<String> {
    relax_dc_text(
        &fixture(constraints_file),
        &dataset_catalog(),
        &RelaxConfig::default(),
    )
    .expect("relax")
    .into_iter()
    .map(|e| e.template)
    .collect()
}

#[test]
fn symmetric_constraints_match_golden_templates() {
    let expected = vec![
        "postab.tid = t1.__ind AND postab.attr_name ='A' AND postab.attr_val=t2.A AND  t1.B<>t2.B",
        "postab.tid = t2.__ind AND postab.attr_name = 'A' AND t1.A=postab.attr_val AND  t1.B<>t2.B",
        "postab.tid = t1.__ind AND postab.attr_name ='B' AND postab.attr_val<>t2.B AND  t1.A=t2.A",
        "postab.tid = t2.__ind AND postab.attr_name = 'B' AND t1.B<>postab.attr_val AND  t1.A=t2.A",
        "postab.tid = t1.__ind AND postab.attr_name ='C' AND postab.attr_val=\"f\" AND  t2.C=\"m\" AND  t1.E=t2.E",
        "postab.tid = t2.__ind AND postab.attr_name ='C' AND postab.attr_val=\"m\" AND  t1.C=\"f\" AND  t1.E=t2.E",
        "postab.tid = t1.__ind AND postab.attr_name ='E' AND postab.attr_val=t2.E AND  t1.C=\"f\" AND  t2.C=\"m\"",
        "postab.tid = t2.__ind AND postab.attr_name = 'E' AND t1.E=postab.attr_val AND  t1.C=\"f\" AND  t2.C=\"m\"",
    ];
    assert_eq!(templates("unit_test_constraints.txt"), expected);
}

#[test]
fn infix_fixture_renders_identically() {
    assert_eq!(
        templates("unit_test_infix_constraints.txt"),
        templates("unit_test_constraints.txt")
    );
}

#[test]
fn non_symmetric_constraints_match_golden_templates() {
    let expected = vec![
        "postab.tid = t1.__ind AND postab.attr_name ='A' AND postab.attr_val=t2.A AND  t1.B>t2.B",
        "postab.tid = t2.__ind AND postab.attr_name = 'A' AND t1.A=postab.attr_val AND  t1.B>t2.B",
        "postab.tid = t1.__ind AND postab.attr_name ='B' AND postab.attr_val>t2.B AND  t1.A=t2.A",
        "postab.tid = t2.__ind AND postab.attr_name = 'B' AND t1.B>postab.attr_val AND  t1.A=t2.A",
        "postab.tid = t1.__ind AND postab.attr_name ='C' AND postab.attr_val>=\"f\" AND  t2.C<=\"m\" AND  t1.E=t2.E",
        "postab.tid = t2.__ind AND postab.attr_name ='C' AND postab.attr_val<=\"m\" AND  t1.C>=\"f\" AND  t1.E=t2.E",
        "postab.tid = t1.__ind AND postab.attr_name ='E' AND postab.attr_val=t2.E AND  t1.C>=\"f\" AND  t2.C<=\"m\"",
        "postab.tid = t2.__ind AND postab.attr_name = 'E' AND t1.E=postab.attr_val AND  t1.C>=\"f\" AND  t2.C<=\"m\"",
    ];
    assert_eq!(templates("unit_test_non_symmetric_constraints.txt"), expected);
}

#[test]
fn entries_carry_attribute_side_and_constraint_index() {
    let set = parse_dc_v1(&fixture("unit_test_constraints.txt")).expect("parse");
    let entries =
        generate_relaxations(&set, &dataset_catalog(), &RelaxConfig::default()).expect("relax");

    let meta: Vec<(&str, TupleSide, usize)> = entries
        .iter()
        .map(|e| (e.attribute.as_str(), e.side, e.source_constraint_index))
        .collect();
    assert_eq!(
        meta,
        vec![
            ("A", TupleSide::T1, 0),
            ("A", TupleSide::T2, 0),
            ("B", TupleSide::T1, 0),
            ("B", TupleSide::T2, 0),
            ("C", TupleSide::T1, 1),
            ("C", TupleSide::T2, 1),
            ("E", TupleSide::T1, 1),
            ("E", TupleSide::T2, 1),
        ]
    );
}

#[test]
fn custom_index_name_only_changes_the_row_match() {
    let config = RelaxConfig::default().with_index_name("_tid_");
    let entries = relax_dc_text(
        &fixture("unit_test_constraints.txt"),
        &dataset_catalog(),
        &config,
    )
    .expect("relax");
    assert_eq!(
        entries[1].template,
        "postab.tid = t2._tid_ AND postab.attr_name = 'A' AND t1.A=postab.attr_val AND  t1.B<>t2.B"
    );
}

#[test]
fn malformed_file_emits_nothing() {
    let result = relax_dc_text(
        &fixture("unit_test_malformed_constraints.txt"),
        &dataset_catalog(),
        &RelaxConfig::default(),
    );
    assert!(matches!(result, Err(RelaxError::Parse(_))));
}

#[test]
fn attribute_missing_from_dataset_fails() {
    let catalog = AttributeCatalog::new(["A", "B", "C", "D"]);
    let err = relax_dc_text(
        &fixture("unit_test_constraints.txt"),
        &catalog,
        &RelaxConfig::default(),
    )
    .expect_err("E is not in the catalog");
    assert!(err.to_string().starts_with("unknown attribute `E` in constraint #1, predicate #2"));
}
