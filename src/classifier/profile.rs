//! Profiler envelopes
//!
//! Captures taken from the database profiler wrap the operation in an
//! envelope carrying `op` and `ns` (`database.collection`). Depending on the
//! server release the operation itself sits in `command`, `query`,
//! `updateobj` or `originatingCommand`.

use serde::Deserialize;
use serde_json::Value;

use super::classify::{classify_command, empty_filter, sanitize, ExplainRequest};
use super::command::{
    Command, DeleteCommand, DeleteStatement, Document, FindCommand, InsertCommand, UnknownCommand,
    UpdateCommand, UpdateStatement,
};

/// Collection name the profiler records for database commands
const COMMAND_COLLECTION: &str = "$cmd";

/// A profiler entry
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProfileEntry {
    op: String,
    ns: String,
    #[serde(default)]
    query: Option<Value>,
    #[serde(default)]
    command: Option<Value>,
    #[serde(default)]
    updateobj: Option<Value>,
    #[serde(default, rename = "originatingCommand")]
    originating_command: Option<Value>,
}

impl ProfileEntry {
    /// Decode an envelope; `None` when `op` or `ns` is missing
    pub(crate) fn decode(doc: &Document) -> Option<Self> {
        serde_json::from_value(Value::Object(doc.clone())).ok()
    }

    /// Unwrap the envelope into a classified request
    pub(crate) fn into_request(self) -> ExplainRequest {
        let (database, collection) = split_namespace(&self.ns);
        let command = self.unwrap_command(collection.as_deref());

        ExplainRequest { database, command }
    }

    fn unwrap_command(&self, collection: Option<&str>) -> Command {
        let command = self.command.as_ref().and_then(Value::as_object);
        let query = self.query.as_ref().and_then(Value::as_object);

        match self.op.as_str() {
            "query" => {
                let source = command.filter(|c| !c.is_empty()).or(query);
                legacy_find(source, collection)
            }
            "update" => self.update(command, query, collection),
            "remove" => remove(command, query, collection),
            "insert" => Command::Insert(InsertCommand {
                collection: collection.unwrap_or_default().to_string(),
                documents: Vec::new(),
                options: Document::new(),
            }),
            "getmore" => match self.originating_command.as_ref().and_then(Value::as_object) {
                Some(origin) => classify_command(origin, collection),
                None => match query.filter(|q| q.contains_key("find")) {
                    Some(q) => classify_command(q, collection),
                    None => unknown(&self.op),
                },
            },
            "command" => match command.or(query) {
                Some(cmd) => classify_command(cmd, collection),
                None => unknown(&self.op),
            },
            other => unknown(other),
        }
    }

    fn update(
        &self,
        command: Option<&Document>,
        query: Option<&Document>,
        collection: Option<&str>,
    ) -> Command {
        let stmt = match command.filter(|c| c.contains_key("u")) {
            Some(cmd) => {
                serde_json::from_value::<UpdateStatement>(Value::Object(sanitize(cmd))).ok()
            }
            None => self.updateobj.clone().map(|u| UpdateStatement {
                q: query.cloned().map(Value::Object).unwrap_or_else(empty_filter),
                u,
                multi: None,
                upsert: None,
                options: Document::new(),
            }),
        };

        match stmt {
            Some(stmt) => Command::Update(UpdateCommand {
                collection: collection.unwrap_or_default().to_string(),
                updates: vec![stmt],
                options: Document::new(),
            }),
            None => unknown(&self.op),
        }
    }
}

/// A find from either a modern `find` command or a legacy query document
fn legacy_find(source: Option<&Document>, collection: Option<&str>) -> Command {
    let source = source.cloned().unwrap_or_default();
    if source.contains_key("find") {
        return classify_command(&source, collection);
    }

    let mut options = Document::new();
    let filter = match ["$query", "query", "filter"]
        .iter()
        .find_map(|key| source.get(*key).filter(|v| v.is_object()))
    {
        Some(filter) => {
            if let Some(sort) = source.get("$orderby").or_else(|| source.get("orderby")) {
                options.insert("sort".to_string(), sort.clone());
            }
            filter.clone()
        }
        None => Value::Object(source.clone()),
    };

    Command::Find(FindCommand {
        collection: collection.unwrap_or_default().to_string(),
        filter: Some(filter),
        options,
    })
}

fn remove(
    command: Option<&Document>,
    query: Option<&Document>,
    collection: Option<&str>,
) -> Command {
    let q = command
        .and_then(|c| c.get("q"))
        .cloned()
        .or_else(|| query.cloned().map(Value::Object))
        .unwrap_or_else(empty_filter);
    let limit = command
        .and_then(|c| c.get("limit"))
        .cloned()
        .unwrap_or_else(|| Value::from(0));

    Command::Delete(DeleteCommand {
        collection: collection.unwrap_or_default().to_string(),
        deletes: vec![DeleteStatement {
            q,
            limit,
            options: Document::new(),
        }],
        options: Document::new(),
    })
}

fn unknown(op: &str) -> Command {
    Command::Unknown(UnknownCommand {
        name: Some(op.to_string()),
    })
}

/// Split `database.collection`; the collection may itself contain dots.
/// `$cmd` is not a real collection and yields `None`.
fn split_namespace(ns: &str) -> (Option<String>, Option<String>) {
    let (db, coll) = match ns.split_once('.') {
        Some((db, coll)) => (db, Some(coll)),
        None => (ns, None),
    };

    let database = Some(db).filter(|d| !d.is_empty()).map(str::to_string);
    let collection = coll
        .filter(|c| !c.is_empty() && *c != COMMAND_COLLECTION)
        .map(str::to_string);

    (database, collection)
}
