//! explainer - version-aware EXPLAIN for captured queries
//!
//! Takes a query captured from a running application (a bare command or a
//! profiler entry), decides whether the connected server release can explain
//! it, and either returns the server's explain document or a stable error.

pub mod classifier;
pub mod cli;
pub mod explain;
pub mod observability;
pub mod policy;
pub mod version;

pub use classifier::{classify, Command, Document, ExplainRequest, OperationKind};
pub use explain::{
    prepare, ErrorKind, ExplainConfig, ExplainError, ExplainResult, Explainer, PreparedExplain,
    Session, SessionError, Verbosity,
};
pub use policy::{Decision, PolicyRule, PolicyTable, Verdict};
pub use version::{satisfies, ServerVersion, VersionConstraint, VersionError};
