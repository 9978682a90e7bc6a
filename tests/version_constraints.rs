//! Version Constraint Tests
//!
//! Server versions are compared on their release numbers only:
//! - Pre-release and build suffixes are ignored
//! - Short versions are padded
//! - Malformed input is an error, never a silent `false`

use explainer::version::{satisfies, ServerVersion, VersionConstraint, VersionError};

#[test]
fn test_legacy_write_boundary() {
    assert!(!satisfies("< 3.4", "3.4.7").unwrap());
    assert!(satisfies("< 3.4", "3.2.16").unwrap());
    assert!(!satisfies("< 3.4", "3.4.7-rc1").unwrap());
    assert!(satisfies("< 3.4", "2.6.12").unwrap());
    assert!(!satisfies("< 3.4", "3.5.11").unwrap());
}

#[test]
fn test_verbosity_boundary() {
    assert!(!satisfies(">= 3.0", "2.6.12").unwrap());
    assert!(satisfies(">= 3.0", "3.0.15").unwrap());
    assert!(satisfies(">= 3.0", "3.0.0-rc9").unwrap());
}

#[test]
fn test_ranges_and_alternatives() {
    assert!(satisfies(">= 3.0, < 3.4", "3.2.16").unwrap());
    assert!(!satisfies(">= 3.0, < 3.4", "3.4.0").unwrap());
    assert!(satisfies("< 3.0 || >= 3.4", "3.5.11").unwrap());
    assert!(!satisfies("< 3.0 || >= 3.4", "3.2.16").unwrap());
}

#[test]
fn test_loose_version_forms() {
    assert!(satisfies(">= 3.4", "v3.4").unwrap());
    assert!(satisfies(">= 3.4", "3.4.7+build.5").unwrap());
    assert!(satisfies("< 4", "3").unwrap());
}

#[test]
fn test_malformed_inputs_are_errors() {
    assert!(matches!(
        satisfies("< 3.4", "three"),
        Err(VersionError::InvalidVersion { .. })
    ));
    assert!(matches!(
        satisfies("<< 3.4", "3.4.7"),
        Err(VersionError::InvalidConstraint { .. })
    ));
    assert!(matches!(
        satisfies("  ", "3.4.7"),
        Err(VersionError::EmptyConstraint { .. })
    ));
}

#[test]
fn test_constraint_reuse() {
    let legacy = VersionConstraint::below(3, 4);
    let releases = ["2.6.12", "3.0.15", "3.2.16", "3.4.7", "3.5.11"];

    let matched: Vec<&str> = releases
        .iter()
        .copied()
        .filter(|raw| legacy.matches(&ServerVersion::parse(raw).unwrap()))
        .collect();

    assert_eq!(matched, vec!["2.6.12", "3.0.15", "3.2.16"]);
}
