//! Include resolution tests
//!
//! Loads checked-in dialect trees end to end: schema gate, model, include
//! expansion, dependency lists and cross-file validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mavlib_gen::gate::SchemaError;
use mavlib_gen::validators::ValidationFailure;
use mavlib_gen::{DialectError, DialectLoader};

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn fixture(relative: &str) -> PathBuf {
    fixtures_path().join(relative)
}

fn complex_seeds() -> Vec<PathBuf> {
    vec![
        fixture("pass/complex_include_graph/top_level.xml"),
        fixture("pass/complex_include_graph/top_level2.xml"),
    ]
}

fn sorted(items: &[String]) -> Vec<&str> {
    let mut items: Vec<&str> = items.iter().map(String::as_str).collect();
    items.sort_unstable();
    items
}

// =============================================================================
// Successful resolution
// =============================================================================

#[test]
fn test_no_includes_is_single_node() {
    let resolved = DialectLoader::new().load([fixture("pass/minimal_common.xml")]).unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved.graph().nodes(), vec!["minimal_common.xml"]);
    assert_eq!(resolved.graph().edge_count(), 0);

    let file = resolved.get("minimal_common.xml").unwrap();
    assert_eq!(file.dependencies(), Some(&[][..]));
    assert_eq!(file.absolute_path(), fixture("pass/minimal_common.xml"));
}

#[test]
fn test_complex_include_tree_successors() {
    let expected: HashMap<&str, Vec<&str>> = HashMap::from([
        ("top_level.xml", vec!["m1.xml", "m2.xml", "m3.xml", "m5.xml"]),
        ("top_level2.xml", vec!["m5.xml"]),
        ("m1.xml", vec!["m4.xml"]),
        ("m2.xml", vec!["m4.xml"]),
        ("m3.xml", vec!["r1.xml", "r2.xml"]),
        ("m4.xml", vec!["r2.xml"]),
        ("m5.xml", vec!["m2.xml", "r1.xml"]),
        ("r1.xml", vec![]),
        ("r2.xml", vec![]),
    ]);

    let resolved = DialectLoader::new().load(complex_seeds()).unwrap();
    let graph = resolved.graph();

    assert_eq!(resolved.len(), expected.len());
    assert_eq!(graph.node_count(), expected.len());
    for (node, successors) in &expected {
        assert_eq!(&graph.includes(node), successors, "successors of {}", node);
    }
}

#[test]
fn test_complex_include_tree_dependency_lists() {
    let expected: HashMap<&str, Vec<&str>> = HashMap::from([
        (
            "top_level.xml",
            vec!["m1.xml", "m2.xml", "m3.xml", "m4.xml", "m5.xml", "r1.xml", "r2.xml"],
        ),
        ("top_level2.xml", vec!["m2.xml", "m4.xml", "m5.xml", "r1.xml", "r2.xml"]),
        ("m1.xml", vec!["m4.xml", "r2.xml"]),
        ("m2.xml", vec!["m4.xml", "r2.xml"]),
        ("m3.xml", vec!["r1.xml", "r2.xml"]),
        ("m4.xml", vec!["r2.xml"]),
        ("m5.xml", vec!["m2.xml", "m4.xml", "r1.xml", "r2.xml"]),
        ("r1.xml", vec![]),
        ("r2.xml", vec![]),
    ]);

    let resolved = DialectLoader::new().load(complex_seeds()).unwrap();
    for (filename, file) in resolved.files().iter() {
        let deps = file.dependencies().expect("dependencies assigned");
        // sorting also proves there are no duplicates from the diamonds
        assert_eq!(sorted(deps), expected[filename], "dependencies of {}", filename);
    }
}

#[test]
fn test_mixed_separators_resolve_to_one_file() {
    let resolved = DialectLoader::new().load(complex_seeds()).unwrap();
    let r1 = resolved.get("r1.xml").unwrap();
    assert_eq!(
        r1.absolute_path(),
        fixture("pass/complex_include_graph/root/r1.xml")
    );
    assert_eq!(resolved.graph().included_by("r1.xml"), vec!["m3.xml", "m5.xml"]);
}

#[test]
fn test_generation_order_puts_includes_first() {
    let resolved = DialectLoader::new().load(complex_seeds()).unwrap();
    let order: Vec<&str> = resolved.generation_order().iter().map(|f| f.filename()).collect();
    assert_eq!(order.len(), 9);

    let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
    for (from, to) in resolved.graph().edges() {
        assert!(position(to) < position(from), "{} must precede {}", to, from);
    }
}

#[test]
fn test_resolution_is_idempotent() {
    let first = DialectLoader::new().load(complex_seeds()).unwrap();
    let second = DialectLoader::new().load(complex_seeds()).unwrap();

    assert_eq!(first.graph().nodes(), second.graph().nodes());
    assert_eq!(first.graph().edges(), second.graph().edges());
    for (filename, file) in first.files().iter() {
        assert_eq!(file.dependencies(), second.get(filename).unwrap().dependencies());
    }
    assert_eq!(first.bundle_hash(), second.bundle_hash());
}

#[test]
fn test_seed_included_by_other_seed() {
    // m2.xml is both a seed and an include of m5.xml
    let resolved = DialectLoader::new()
        .load([
            fixture("pass/complex_include_graph/mid/m5.xml"),
            fixture("pass/complex_include_graph/mid/m2.xml"),
        ])
        .unwrap();
    assert_eq!(resolved.len(), 5);
    assert_eq!(resolved.graph().included_by("m2.xml"), vec!["m5.xml"]);
}

#[test]
fn test_relative_seed_paths_are_absolutized() {
    let relative = Path::new("tests/fixtures/pass/minimal_common.xml");
    std::env::set_current_dir(env!("CARGO_MANIFEST_DIR")).unwrap();
    let resolved = DialectLoader::new().load([relative]).unwrap();
    let file = resolved.get("minimal_common.xml").unwrap();
    assert!(file.absolute_path().is_absolute());
}

// =============================================================================
// Resolution failures
// =============================================================================

#[test]
fn test_invalid_include_path() {
    match DialectLoader::new().load([fixture("fail/invalid_include.xml")]) {
        Err(DialectError::UnresolvableInclude { including, include, expected }) => {
            assert_eq!(including, "invalid_include.xml");
            assert_eq!(include, "does/not/exist.xml");
            assert_eq!(expected, fixture("fail/does/not/exist.xml"));
        }
        other => panic!("Expected UnresolvableInclude, got {:?}", other),
    }
}

#[test]
fn test_transitive_cycle() {
    match DialectLoader::new().load([fixture("fail/circular/a.xml")]) {
        Err(DialectError::CircularDependency { from, to }) => {
            assert_eq!(from, "c.xml");
            assert_eq!(to, "a.xml");
        }
        other => panic!("Expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_self_include() {
    match DialectLoader::new().load([fixture("fail/circular/self_include.xml")]) {
        Err(DialectError::CircularDependency { from, to }) => {
            assert_eq!(from, "self_include.xml");
            assert_eq!(to, "self_include.xml");
        }
        other => panic!("Expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_schema_failure_in_included_file() {
    match DialectLoader::new().load([fixture("fail/schema/broken_include_target.xml")]) {
        Err(DialectError::Schema(err @ SchemaError::Nonconforming { .. })) => {
            assert!(err.path().ends_with("unknown_element.xml"));
            assert!(err.to_string().contains("<commands>"));
        }
        other => panic!("Expected Nonconforming schema error, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_type() {
    match DialectLoader::new().load([fixture("fail/schema/unknown_field_type.xml")]) {
        Err(DialectError::UnknownFieldType { message, field, type_name }) => {
            assert_eq!(message, "BROKEN");
            assert_eq!(field, "flag");
            assert_eq!(type_name, "bool");
        }
        other => panic!("Expected UnknownFieldType, got {:?}", other),
    }
}

#[test]
fn test_missing_seed_file() {
    assert!(matches!(
        DialectLoader::new().load([fixture("fail/nope.xml")]),
        Err(DialectError::Schema(SchemaError::Unreadable { .. }))
    ));
}

// =============================================================================
// Cross-file validation
// =============================================================================

#[test]
fn test_conflicting_ids() {
    match DialectLoader::new().load([fixture("fail/include_with_conflicting_msgid/top.xml")]) {
        Err(DialectError::Validation { validator, source }) => {
            assert_eq!(validator, "UniqueMessageIdsAcrossDependencies");
            assert_eq!(
                source,
                ValidationFailure::DuplicateMessageIds {
                    file: "top.xml".into(),
                    dependency: "dep.xml".into(),
                    ids: vec![42],
                }
            );
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[test]
fn test_transitively_conflicting_names() {
    match DialectLoader::new().load([fixture("fail/include_with_conflicting_msgname/top.xml")]) {
        Err(DialectError::Validation { source, .. }) => {
            assert_eq!(
                source,
                ValidationFailure::DuplicateMessageNames {
                    file: "top.xml".into(),
                    dependency: "leaf.xml".into(),
                    names: vec!["SHARED_NAME".into()],
                }
            );
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[test]
fn test_conflicts_pass_when_uniqueness_disabled() {
    let mut config = mavlib_gen::MavlibConfig::default();
    config.validation.unique_messages = false;
    let resolved = DialectLoader::from_config(&config)
        .load([fixture("fail/include_with_conflicting_msgid/top.xml")])
        .unwrap();
    assert_eq!(resolved.len(), 2);
}
