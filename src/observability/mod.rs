//! Observability for the explain path
//!
//! - Structured logging (JSON lines on stderr)
//! - Counter metrics per explainer
//!
//! Observability is read-only: it never changes an explain outcome.
//!
//! ```ignore
//! use explainer::observability::{log_event, Event};
//!
//! log_event(Event::ExplainComplete, &[("kind", "find")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{ExplainMetrics, MetricsSnapshot};

/// Log an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
