//! Server version constraint engine
//!
//! Parses server build versions and evaluates them against range
//! constraints such as `"< 3.4"` or `">= 3.0, < 4.2 || >= 5.0"`.
//!
//! # Normalization
//!
//! Everything from the first `-` onward is dropped before parsing. Some
//! server builds append non-semantic metadata after a dash on release
//! builds, so it must not be treated as a pre-release tag.
//!
//! # Constraint syntax
//!
//! Comparators within one alternative are joined by commas or whitespace
//! (`">= 3.0, < 3.4"` and `">= 3.0 < 3.4"` are the same range). A version
//! with no operator is an exact match on the parts written: `"3.4"` matches
//! every `3.4.x` release and nothing else. Wildcards (`3.x`, `3.*`) follow
//! the usual semver meaning. Hyphen ranges (`3.0 - 3.4`) are not accepted.
//!
//! All functions are pure and safe to call from any thread.

mod constraint;
mod errors;

pub use constraint::{satisfies, ServerVersion, VersionConstraint};
pub use errors::{VersionError, VersionResult};
