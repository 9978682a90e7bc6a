//! Explain pipeline
//!
//! ```text
//! raw bytes → decode → classify → policy → explain envelope → session
//! ```
//!
//! Rejections (unknown shape, never explainable, not explainable on this
//! release) are decided locally and never reach the server. Everything the
//! server says back is returned unmodified.

mod config;
mod errors;
mod executor;
mod session;
mod wire;

pub use config::{ConfigError, ExplainConfig, Verbosity};
pub use errors::{ErrorKind, ExplainError, ExplainResult, SessionError};
pub use executor::{prepare, Explainer, PreparedExplain};
pub use session::Session;
pub use wire::{explain_command, CommandFailure, VERBOSITY_SINCE};
