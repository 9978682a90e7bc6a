//! Explain executor
//!
//! decode → classify → policy → explain envelope → session round trip.
//!
//! Policy is evaluated strictly before any explain command is sent, so a
//! query known to be unexplainable never reaches the server and its error
//! text does not depend on server state.

use std::sync::OnceLock;

use serde_json::Value;

use crate::classifier::{classify, Document, ExplainRequest, OperationKind};
use crate::observability::{log_event, Event, ExplainMetrics, MetricsSnapshot};
use crate::policy::{Decision, PolicyTable, Rejection};
use crate::version::ServerVersion;

use super::config::{ExplainConfig, Verbosity};
use super::errors::{ErrorKind, ExplainError, ExplainResult};
use super::session::Session;
use super::wire::{explain_command, CommandFailure};

/// An explain command ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedExplain {
    /// Target database; empty means the session default
    pub database: String,
    /// Classified operation kind
    pub kind: OperationKind,
    /// Full `{explain: ...}` command
    pub command: Document,
}

/// Prepare an explain command without contacting any server.
///
/// `database` wins over a database named inside the capture.
pub fn prepare(
    database: &str,
    query: &Value,
    version: &ServerVersion,
    policy: &PolicyTable,
    verbosity: Verbosity,
) -> ExplainResult<PreparedExplain> {
    let request = classify_known(query)?;
    authorize(database, request, version, policy, verbosity)
}

/// Classify, rejecting shapes that match no known operation
fn classify_known(query: &Value) -> ExplainResult<ExplainRequest> {
    let (kind, request) = classify(query);
    log_event(
        Event::ExplainClassified,
        &[
            ("command", request.command.display_name()),
            ("kind", kind.command_name()),
        ],
    );
    if kind == OperationKind::Unknown {
        return Err(ExplainError::ClassificationUnknown {
            command: request.command.display_name().to_string(),
        });
    }
    Ok(request)
}

fn authorize(
    database: &str,
    request: ExplainRequest,
    version: &ServerVersion,
    policy: &PolicyTable,
    verbosity: Verbosity,
) -> ExplainResult<PreparedExplain> {
    let kind = request.kind();
    let command = kind.command_name().to_string();

    match policy.allowed(kind, version) {
        Decision::Allowed => {}
        Decision::Rejected(Rejection::Permanent) => {
            return Err(ExplainError::PolicyRejectedPermanent { command });
        }
        Decision::Rejected(Rejection::ByVersion { .. }) => {
            return Err(ExplainError::PolicyRejectedByVersion {
                command,
                version: version.raw().to_string(),
            });
        }
    }

    let body = request
        .command
        .to_document()
        .ok_or(ExplainError::ClassificationUnknown { command })?;

    let database = if database.is_empty() {
        request.database.unwrap_or_default()
    } else {
        database.to_string()
    };

    Ok(PreparedExplain {
        database,
        kind,
        command: explain_command(body, version, verbosity),
    })
}

/// Explains captured queries over one session.
///
/// The server version is resolved once, on first use, and kept for the
/// lifetime of the explainer. Connecting to another server needs a new
/// explainer.
pub struct Explainer<S> {
    session: S,
    version: OnceLock<ServerVersion>,
    policy: PolicyTable,
    verbosity: Verbosity,
    metrics: ExplainMetrics,
}

impl<S: Session> Explainer<S> {
    /// Explainer with the builtin policy; the version is asked lazily
    pub fn new(session: S) -> Self {
        Self {
            session,
            version: OnceLock::new(),
            policy: PolicyTable::builtin(),
            verbosity: Verbosity::default(),
            metrics: ExplainMetrics::new(),
        }
    }

    /// Explainer for a server whose version is already known
    pub fn with_server_version(session: S, version: ServerVersion) -> Self {
        let explainer = Self::new(session);
        let _ = explainer.version.set(version);
        explainer
    }

    /// Explainer set up from configuration
    pub fn from_config(session: S, config: &ExplainConfig) -> ExplainResult<Self> {
        let pinned = config
            .server_version
            .as_deref()
            .map(ServerVersion::parse)
            .transpose()?;

        let explainer = match pinned {
            Some(version) => Self::with_server_version(session, version),
            None => Self::new(session),
        };

        Ok(explainer
            .with_policy(config.policy_table())
            .with_verbosity(config.verbosity))
    }

    /// Replace the policy table
    pub fn with_policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    /// Set the explain verbosity
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// The underlying session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The policy table in use
    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Counter snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The connected server's version, resolved on first call.
    ///
    /// Concurrent first calls may each ask the server; the first value
    /// stored wins and every caller sees it.
    pub fn server_version(&self) -> ExplainResult<&ServerVersion> {
        if let Some(version) = self.version.get() {
            return Ok(version);
        }

        let raw = self.session.build_version().map_err(ExplainError::Driver)?;
        let version = ServerVersion::parse(&raw)?;
        log_event(
            Event::ServerVersionResolved,
            &[("raw", &raw), ("version", &version.to_string())],
        );

        Ok(self.version.get_or_init(|| version))
    }

    /// Explain a captured query given as JSON bytes.
    ///
    /// Returns the server's explain document re-encoded as JSON, with the
    /// server's field order preserved.
    pub fn explain(&self, database: &str, raw_query: &[u8]) -> ExplainResult<Vec<u8>> {
        self.observe(|| {
            let query: Value = serde_json::from_slice(raw_query).map_err(ExplainError::Decode)?;
            self.execute(database, &query)
        })
        .map(|reply| Value::Object(reply).to_string().into_bytes())
    }

    /// Explain an already decoded captured query
    pub fn explain_value(&self, database: &str, query: &Value) -> ExplainResult<Document> {
        self.observe(|| self.execute(database, query))
    }

    /// Prepare the explain command without sending it
    pub fn prepare(&self, database: &str, query: &Value) -> ExplainResult<PreparedExplain> {
        let request = classify_known(query)?;
        let version = self.server_version()?;
        authorize(database, request, version, &self.policy, self.verbosity)
    }

    fn execute(&self, database: &str, query: &Value) -> ExplainResult<Document> {
        log_event(Event::ExplainBegin, &[("database", database)]);

        let PreparedExplain {
            database,
            kind,
            command,
        } = self.prepare(database, query)?;

        log_event(
            Event::ExplainSent,
            &[("database", &database), ("kind", kind.command_name())],
        );

        let reply = self
            .session
            .run_command(&database, command)
            .map_err(ExplainError::Driver)?;

        if let Some(failure) = CommandFailure::from_reply(&reply) {
            return Err(ExplainError::driver(failure));
        }

        log_event(Event::ExplainComplete, &[("kind", kind.command_name())]);
        Ok(reply)
    }

    fn observe<T>(&self, run: impl FnOnce() -> ExplainResult<T>) -> ExplainResult<T> {
        self.metrics.increment_attempted();

        let outcome = run();
        match &outcome {
            Ok(_) => self.metrics.increment_succeeded(),
            Err(err) => self.record_failure(err),
        }
        outcome
    }

    fn record_failure(&self, err: &ExplainError) {
        match err.kind() {
            ErrorKind::Decode => self.metrics.increment_decode_failures(),
            ErrorKind::ClassificationUnknown => self.metrics.increment_rejected_unknown(),
            ErrorKind::PolicyRejectedPermanent => self.metrics.increment_rejected_permanent(),
            ErrorKind::PolicyRejectedByVersion => self.metrics.increment_rejected_by_version(),
            ErrorKind::Driver | ErrorKind::InvalidServerVersion => {
                self.metrics.increment_driver_failures()
            }
        }

        let message = err.to_string();
        match err.command() {
            Some(command) if err.is_policy_rejection() => log_event(
                Event::ExplainRejected,
                &[("code", err.code()), ("command", command), ("error", &message)],
            ),
            _ => log_event(Event::ExplainFailed, &[("code", err.code()), ("error", &message)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::errors::SessionError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every command with a canned plan and records what it saw
    struct RecordingSession {
        version: String,
        reply: Value,
        commands: Mutex<Vec<(String, Document)>>,
        version_calls: AtomicUsize,
    }

    impl RecordingSession {
        fn new(version: &str) -> Self {
            Self {
                version: version.to_string(),
                reply: json!({"queryPlanner": {"winningPlan": {"stage": "COLLSCAN"}}, "ok": 1.0}),
                commands: Mutex::new(Vec::new()),
                version_calls: AtomicUsize::new(0),
            }
        }

        fn sent(&self) -> Vec<(String, Document)> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl Session for RecordingSession {
        fn run_command(&self, database: &str, command: Document) -> Result<Document, SessionError> {
            self.commands
                .lock()
                .unwrap()
                .push((database.to_string(), command));
            match &self.reply {
                Value::Object(map) => Ok(map.clone()),
                _ => Err("bad reply".into()),
            }
        }

        fn build_version(&self) -> Result<String, SessionError> {
            self.version_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.version.clone())
        }
    }

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_find_is_sent_with_verbosity() {
        let explainer = Explainer::new(RecordingSession::new("3.2.16"));
        let out = explainer
            .explain("shop", &bytes(json!({"find": "orders", "filter": {"status": "open"}})))
            .unwrap();

        let result: Value = serde_json::from_slice(&out).unwrap();
        assert!(result.get("queryPlanner").is_some());

        let sent = explainer.session().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "shop");
        assert_eq!(
            Value::Object(sent[0].1.clone()),
            json!({
                "explain": {"find": "orders", "filter": {"status": "open"}},
                "verbosity": "queryPlanner"
            })
        );
    }

    #[test]
    fn test_numeric_flags_are_explained() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));
        explainer
            .explain(
                "shop",
                &bytes(json!({"findAndModify": "orders", "query": {"_id": 1}, "remove": 1})),
            )
            .unwrap();
        explainer
            .explain(
                "shop",
                &bytes(json!({
                    "update": "orders",
                    "updates": [{"q": {}, "u": {"$set": {"a": 1}}, "multi": 1, "upsert": 0}]
                })),
            )
            .unwrap();

        let sent = explainer.session().sent();
        assert_eq!(sent[0].1["explain"]["remove"], json!(true));
        assert_eq!(sent[1].1["explain"]["updates"][0]["multi"], json!(true));
        assert_eq!(sent[1].1["explain"]["updates"][0]["upsert"], json!(false));
    }

    #[test]
    fn test_explain_value_returns_reply_document() {
        let explainer = Explainer::new(RecordingSession::new("3.2.16"));
        let reply = explainer
            .explain_value("shop", &json!({"count": "orders", "query": {"a": 1}}))
            .unwrap();
        assert!(reply.contains_key("queryPlanner"));

        let err = explainer
            .explain_value("shop", &json!({"aggregate": "orders", "pipeline": []}))
            .unwrap_err();
        assert_eq!(err.command(), Some("aggregate"));
        assert_eq!(explainer.metrics().attempted, 2);
        assert_eq!(explainer.metrics().rejected_permanent, 1);
    }

    #[test]
    fn test_rejections_never_reach_server() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));

        let err = explainer
            .explain("", &bytes(json!({"aggregate": "orders", "pipeline": []})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot explain cmd: aggregate");

        let err = explainer.explain("", &bytes(json!({"ping": 1}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClassificationUnknown);
        assert_eq!(err.to_string(), "Cannot explain cmd: ping");

        assert!(explainer.session().sent().is_empty());
    }

    #[test]
    fn test_unknown_is_rejected_before_version_lookup() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));
        let _ = explainer.explain("", &bytes(json!({"ping": 1})));
        assert_eq!(explainer.session().version_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_version_resolved_once() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));
        for _ in 0..3 {
            explainer
                .explain("", &bytes(json!({"count": "orders", "query": {}})))
                .unwrap();
        }
        assert_eq!(explainer.session().version_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pinned_version_skips_lookup() {
        let explainer = Explainer::with_server_version(
            RecordingSession::new("9.9.9"),
            ServerVersion::parse("3.2.16").unwrap(),
        );

        let err = explainer
            .explain("", &bytes(json!({"insert": "orders", "documents": [{}]})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyRejectedByVersion);
        assert_eq!(explainer.session().version_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decode_error() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));
        let err = explainer.explain("", b"{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().starts_with("explain: unable to decode query: "));
        assert_eq!(explainer.metrics().decode_failures, 1);
    }

    #[test]
    fn test_database_falls_back_to_namespace() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));
        explainer
            .explain("", &bytes(json!({"op": "query", "ns": "shop.orders", "query": {}})))
            .unwrap();
        explainer
            .explain("audit", &bytes(json!({"op": "query", "ns": "shop.orders", "query": {}})))
            .unwrap();

        let sent = explainer.session().sent();
        assert_eq!(sent[0].0, "shop");
        assert_eq!(sent[1].0, "audit");
    }

    #[test]
    fn test_failed_reply_becomes_driver_error() {
        let mut session = RecordingSession::new("3.4.7");
        session.reply = json!({"ok": 0, "errmsg": "no such cmd: explain", "code": 59});
        let explainer = Explainer::new(session);

        let err = explainer
            .explain("", &bytes(json!({"find": "orders"})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Driver);
        assert_eq!(err.to_string(), "no such cmd: explain");
    }

    #[test]
    fn test_metrics_track_outcomes() {
        let explainer = Explainer::new(RecordingSession::new("3.4.7"));
        let _ = explainer.explain("", &bytes(json!({"find": "orders"})));
        let _ = explainer.explain("", &bytes(json!({"geoNear": "places"})));
        let _ = explainer.explain("", &bytes(json!({"insert": "orders"})));

        let metrics = explainer.metrics();
        assert_eq!(metrics.attempted, 3);
        assert_eq!(metrics.succeeded, 1);
        assert_eq!(metrics.rejected_permanent, 2);
    }

    #[test]
    fn test_prepare_without_session() {
        let prepared = prepare(
            "",
            &json!({"distinct": "orders", "key": "status", "$db": "shop"}),
            &ServerVersion::parse("2.6.12").unwrap(),
            &PolicyTable::builtin(),
            Verbosity::ExecutionStats,
        )
        .unwrap();

        assert_eq!(prepared.database, "shop");
        assert_eq!(prepared.kind, OperationKind::Distinct);
        assert!(!prepared.command.contains_key("verbosity"));
    }
}
