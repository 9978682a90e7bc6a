//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in the explain path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,
    /// Server version resolved and cached
    ServerVersionResolved,
    /// Explain begins
    ExplainBegin,
    /// Captured query classified
    ExplainClassified,
    /// Policy refused the explain; no server contact
    ExplainRejected,
    /// Explain command sent to the server
    ExplainSent,
    /// Explain result received
    ExplainComplete,
    /// Decode or server failure
    ExplainFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerVersionResolved => "SERVER_VERSION_RESOLVED",
            Event::ExplainBegin => "EXPLAIN_BEGIN",
            Event::ExplainClassified => "EXPLAIN_CLASSIFIED",
            Event::ExplainRejected => "EXPLAIN_REJECTED",
            Event::ExplainSent => "EXPLAIN_SENT",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
            Event::ExplainFailed => "EXPLAIN_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ExplainBegin | Event::ExplainClassified | Event::ExplainSent => Severity::Trace,
            Event::ExplainRejected => Severity::Warn,
            Event::ExplainFailed => Severity::Error,
            Event::ConfigLoaded | Event::ServerVersionResolved | Event::ExplainComplete => {
                Severity::Info
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::ServerVersionResolved,
            Event::ExplainBegin,
            Event::ExplainClassified,
            Event::ExplainRejected,
            Event::ExplainSent,
            Event::ExplainComplete,
            Event::ExplainFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failures_log_as_errors() {
        assert_eq!(Event::ExplainFailed.severity(), Severity::Error);
        assert_eq!(Event::ExplainRejected.severity(), Severity::Warn);
        assert_eq!(Event::ExplainSent.severity(), Severity::Trace);
    }
}
