//! Unit tests for common-config crate

use common_config::{ExecutionConfig, GroupOrdering, QuiverConfig};

#[test]
fn test_quiver_config_default() {
    let config = QuiverConfig::default();

    assert!(!config.execution.parallel);
    assert_eq!(config.execution.num_threads, None);
    assert_eq!(config.execution.default_ordering, GroupOrdering::Stable);
    assert_eq!(config.execution.default_seed, None);
}

#[test]
fn test_group_ordering_default() {
    assert_eq!(GroupOrdering::default(), GroupOrdering::Stable);
    assert_eq!(GroupOrdering::Unordered.to_string(), "unordered");
}

#[test]
fn test_builders() {
    let config = ExecutionConfig::default()
        .with_parallel(true)
        .with_num_threads(4)
        .with_default_ordering(GroupOrdering::Unordered)
        .with_default_seed(7);

    assert!(config.parallel);
    assert_eq!(config.num_threads, Some(4));
    assert_eq!(config.default_ordering, GroupOrdering::Unordered);
    assert_eq!(config.default_seed, Some(7));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_serialization_roundtrip() {
    let mut config = QuiverConfig::default();
    config.execution.parallel = true;
    config.execution.num_threads = Some(8);
    config.execution.default_seed = Some(42);

    let json = config.to_json().unwrap();
    assert!(json.contains("\"parallel\": true"));

    let parsed = QuiverConfig::from_json(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_config_partial_json() {
    let json = r#"{ "execution": { "default_ordering": "Unordered" } }"#;

    let config = QuiverConfig::from_json(json).unwrap();
    assert_eq!(config.execution.default_ordering, GroupOrdering::Unordered);
    assert!(!config.execution.parallel);
    assert_eq!(config.execution.num_threads, None);
}

#[test]
fn test_empty_json_uses_defaults() {
    let config = QuiverConfig::from_json("{}").unwrap();
    assert_eq!(config, QuiverConfig::default());
}

#[test]
fn test_invalid_ordering_rejected() {
    let json = r#"{ "execution": { "default_ordering": "Sorted" } }"#;
    assert!(QuiverConfig::from_json(json).is_err());
}

#[test]
fn test_zero_threads_rejected() {
    let json = r#"{ "execution": { "num_threads": 0 } }"#;
    let err = QuiverConfig::from_json(json).unwrap_err();
    assert!(err.is_invalid_parameter());
}

#[test]
fn test_negative_seed_rejected() {
    let json = r#"{ "execution": { "default_seed": -1 } }"#;
    assert!(QuiverConfig::from_json(json).is_err());
}
