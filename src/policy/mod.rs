//! Explainability policy
//!
//! A declarative table of rules `(kind, optional version range) -> verdict`.
//! The first rule matching both the kind and the server version decides;
//! a kind with no matching rule is never explainable.
//!
//! Adding a server quirk is a table edit: prepend a rule, either in code
//! via [`PolicyTable::with_overrides`] or from configuration.

mod table;

pub use table::{Decision, PolicyRule, PolicyTable, Rejection, Verdict, LEGACY_WRITE_EXPLAIN};
