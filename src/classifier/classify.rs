//! Shape-based classification
//!
//! A captured command is decoded against each candidate shape in a fixed
//! precedence order and the first shape that decodes wins. Field order in
//! the captured document never affects the outcome.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::command::{
    AggregateCommand, Command, CountCommand, DeleteCommand, DeleteStatement, DistinctCommand,
    Document, FindAndModifyCommand, FindCommand, GeoNearCommand, GroupCommand, InsertCommand,
    MapReduceCommand, UnknownCommand, UpdateCommand, UpdateStatement, flag,
};
use super::kind::OperationKind;
use super::profile::ProfileEntry;

/// Members recorded by drivers and sessions rather than the operation.
/// They are dropped before the command is explained.
pub const SESSION_FIELDS: &[&str] = &[
    "$db",
    "lsid",
    "$clusterTime",
    "$readPreference",
    "txnNumber",
    "autocommit",
    "startTransaction",
];

/// The classified form of a captured query
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainRequest {
    /// Database named by the capture itself, if any
    pub database: Option<String>,
    /// The command to explain
    pub command: Command,
}

impl ExplainRequest {
    /// Operation kind of the request
    pub fn kind(&self) -> OperationKind {
        self.command.kind()
    }

    pub(crate) fn unknown(name: Option<String>) -> Self {
        Self {
            database: None,
            command: Command::Unknown(UnknownCommand { name }),
        }
    }
}

/// Classify a captured query document.
///
/// Total over every JSON value: anything that matches no known shape,
/// including non-object values, classifies as `unknown`.
pub fn classify(doc: &Value) -> (OperationKind, ExplainRequest) {
    let request = match doc.as_object() {
        Some(obj) => match ProfileEntry::decode(obj) {
            Some(entry) => entry.into_request(),
            None => ExplainRequest {
                database: obj.get("$db").and_then(Value::as_str).map(str::to_string),
                command: classify_command(obj, None),
            },
        },
        None => ExplainRequest::unknown(None),
    };

    (request.kind(), request)
}

/// Classify a bare command document.
///
/// `fallback_collection` is used by shapes that can omit the collection
/// (filter-only finds) when the capture supplies it out of band.
pub(crate) fn classify_command(doc: &Document, fallback_collection: Option<&str>) -> Command {
    let doc = sanitize(doc);

    SHAPES
        .iter()
        .find_map(|shape| {
            (shape.decode)(&doc, fallback_collection).filter(|command| command.kind() == shape.kind)
        })
        .unwrap_or_else(|| {
            Command::Unknown(UnknownCommand {
                name: doc.keys().next().cloned(),
            })
        })
}

/// Drop session-level members from a captured command
pub(crate) fn sanitize(doc: &Document) -> Document {
    doc.iter()
        .filter(|(key, _)| !SESSION_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

struct Shape {
    kind: OperationKind,
    decode: fn(&Document, Option<&str>) -> Option<Command>,
}

/// Candidate shapes in precedence order
const SHAPES: &[Shape] = &[
    Shape {
        kind: OperationKind::Aggregate,
        decode: |doc, _| decode::<AggregateCommand>(doc).map(Command::Aggregate),
    },
    Shape {
        kind: OperationKind::MapReduce,
        decode: |doc, _| decode::<MapReduceCommand>(doc).map(Command::MapReduce),
    },
    Shape {
        kind: OperationKind::GeoNear,
        decode: |doc, _| decode::<GeoNearCommand>(doc).map(Command::GeoNear),
    },
    Shape {
        kind: OperationKind::FindAndModify,
        decode: |doc, _| decode::<FindAndModifyCommand>(doc).map(Command::FindAndModify),
    },
    Shape {
        kind: OperationKind::Insert,
        decode: |doc, _| decode::<InsertCommand>(doc).map(Command::Insert),
    },
    Shape {
        kind: OperationKind::Update,
        decode: |doc, _| decode::<UpdateShape>(doc).and_then(UpdateShape::into_command),
    },
    Shape {
        kind: OperationKind::Delete,
        decode: |doc, _| decode::<DeleteShape>(doc).and_then(DeleteShape::into_command),
    },
    Shape {
        kind: OperationKind::Count,
        decode: |doc, _| decode::<CountCommand>(doc).map(Command::Count),
    },
    Shape {
        kind: OperationKind::Distinct,
        decode: |doc, _| decode::<DistinctCommand>(doc).map(Command::Distinct),
    },
    Shape {
        kind: OperationKind::Group,
        decode: |doc, _| decode::<GroupShape>(doc).and_then(GroupShape::into_command),
    },
    Shape {
        kind: OperationKind::Find,
        decode: |doc, _| decode::<FindCommand>(doc).map(Command::Find),
    },
    Shape {
        kind: OperationKind::Find,
        decode: filter_only,
    },
];

fn decode<T: DeserializeOwned>(doc: &Document) -> Option<T> {
    serde_json::from_value(Value::Object(doc.clone())).ok()
}

/// `{filter: {...}}` with no command key
fn filter_only(doc: &Document, fallback_collection: Option<&str>) -> Option<Command> {
    let filter = doc.get("filter").filter(|f| f.is_object())?.clone();
    let options = doc
        .iter()
        .filter(|(key, _)| key.as_str() != "filter")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Some(Command::Find(FindCommand {
        collection: fallback_collection.unwrap_or_default().to_string(),
        filter: Some(filter),
        options,
    }))
}

/// `update` in either the batched (`updates: [...]`) or the flat
/// (`q`/`u`, `query`/`updateobj`) form
#[derive(Deserialize)]
struct UpdateShape {
    #[serde(rename = "update")]
    collection: String,
    #[serde(default)]
    updates: Option<Vec<UpdateStatement>>,
    #[serde(default, alias = "query")]
    q: Option<Value>,
    #[serde(default, alias = "updateobj")]
    u: Option<Value>,
    #[serde(default, deserialize_with = "flag")]
    multi: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    upsert: Option<bool>,
    #[serde(flatten)]
    options: Document,
}

impl UpdateShape {
    fn into_command(self) -> Option<Command> {
        let updates = match (self.updates, self.u) {
            (Some(updates), _) if !updates.is_empty() => updates,
            (_, Some(u)) => vec![UpdateStatement {
                q: self.q.unwrap_or_else(empty_filter),
                u,
                multi: self.multi,
                upsert: self.upsert,
                options: Document::new(),
            }],
            _ => return None,
        };

        Some(Command::Update(UpdateCommand {
            collection: self.collection,
            updates,
            options: self.options,
        }))
    }
}

/// `delete` in either the batched (`deletes: [...]`) or the flat
/// (`q`/`query`) form
#[derive(Deserialize)]
struct DeleteShape {
    #[serde(rename = "delete")]
    collection: String,
    #[serde(default)]
    deletes: Option<Vec<DeleteStatement>>,
    #[serde(default, alias = "query")]
    q: Option<Value>,
    #[serde(default)]
    limit: Option<Value>,
    #[serde(flatten)]
    options: Document,
}

impl DeleteShape {
    fn into_command(self) -> Option<Command> {
        let deletes = match (self.deletes, self.q) {
            (Some(deletes), _) if !deletes.is_empty() => deletes,
            (_, Some(q)) => vec![DeleteStatement {
                q,
                limit: self.limit.unwrap_or_else(|| Value::from(0)),
                options: Document::new(),
            }],
            _ => return None,
        };

        Some(Command::Delete(DeleteCommand {
            collection: self.collection,
            deletes,
            options: self.options,
        }))
    }
}

/// `{group: {ns: "<collection>", ...}}`
#[derive(Deserialize)]
struct GroupShape {
    group: Document,
    #[serde(flatten)]
    options: Document,
}

impl GroupShape {
    fn into_command(self) -> Option<Command> {
        let collection = self.group.get("ns")?.as_str()?.to_string();
        Some(Command::Group(GroupCommand {
            collection,
            spec: self.group,
            options: self.options,
        }))
    }
}

pub(crate) fn empty_filter() -> Value {
    Value::Object(Document::new())
}
