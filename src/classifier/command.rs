//! Typed command shapes
//!
//! Each supported operation has one serde shape. The command key itself
//! (`find`, `count`, ...) is a required field, so a shape only decodes when
//! its command key is present with the right type. Members a shape does not
//! name are kept in `options` and passed through to the server untouched.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::kind::OperationKind;

/// A JSON object
pub type Document = Map<String, Value>;

/// Boolean option that captures record either as `true`/`false` or as a
/// number, where `0` is false.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(flag)),
        Value::Number(n) => Ok(Some(n.as_f64() != Some(0.0))),
        other => Err(D::Error::custom(format!("expected a boolean flag, found {}", other))),
    }
}

/// `find` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindCommand {
    #[serde(rename = "find")]
    pub collection: String,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(flatten)]
    pub options: Document,
}

/// `count` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountCommand {
    #[serde(rename = "count")]
    pub collection: String,
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(flatten)]
    pub options: Document,
}

/// `distinct` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistinctCommand {
    #[serde(rename = "distinct")]
    pub collection: String,
    pub key: String,
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(flatten)]
    pub options: Document,
}

/// One statement of a `delete` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteStatement {
    pub q: Value,
    #[serde(default = "default_delete_limit")]
    pub limit: Value,
    #[serde(flatten)]
    pub options: Document,
}

fn default_delete_limit() -> Value {
    Value::from(0)
}

/// `delete` command
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCommand {
    pub collection: String,
    pub deletes: Vec<DeleteStatement>,
    pub options: Document,
}

/// One statement of an `update` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateStatement {
    pub q: Value,
    pub u: Value,
    #[serde(default, deserialize_with = "flag")]
    pub multi: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub upsert: Option<bool>,
    #[serde(flatten)]
    pub options: Document,
}

/// `update` command
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCommand {
    pub collection: String,
    pub updates: Vec<UpdateStatement>,
    pub options: Document,
}

/// `group` command; the collection lives in the nested spec
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCommand {
    pub collection: String,
    pub spec: Document,
    pub options: Document,
}

/// `findAndModify` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindAndModifyCommand {
    #[serde(rename = "findAndModify", alias = "findandmodify")]
    pub collection: String,
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub update: Option<Value>,
    #[serde(default, deserialize_with = "flag")]
    pub remove: Option<bool>,
    #[serde(flatten)]
    pub options: Document,
}

/// `aggregate` command; the target is a collection name or `1`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateCommand {
    #[serde(rename = "aggregate")]
    pub target: Value,
    pub pipeline: Vec<Value>,
    #[serde(flatten)]
    pub options: Document,
}

/// `insert` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsertCommand {
    #[serde(rename = "insert")]
    pub collection: String,
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(flatten)]
    pub options: Document,
}

/// `mapReduce` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapReduceCommand {
    #[serde(rename = "mapReduce", alias = "mapreduce")]
    pub collection: String,
    pub map: Value,
    pub reduce: Value,
    #[serde(flatten)]
    pub options: Document,
}

/// `geoNear` command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoNearCommand {
    #[serde(rename = "geoNear", alias = "geonear")]
    pub collection: String,
    #[serde(flatten)]
    pub options: Document,
}

/// A shape that matched nothing.
///
/// `name` is the command name the capture appears to carry, used only for
/// the rejection message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand {
    pub name: Option<String>,
}

/// A classified command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Find(FindCommand),
    Count(CountCommand),
    Distinct(DistinctCommand),
    Delete(DeleteCommand),
    Update(UpdateCommand),
    Group(GroupCommand),
    FindAndModify(FindAndModifyCommand),
    Aggregate(AggregateCommand),
    Insert(InsertCommand),
    MapReduce(MapReduceCommand),
    GeoNear(GeoNearCommand),
    Unknown(UnknownCommand),
}

impl Command {
    /// Operation kind of this command
    pub fn kind(&self) -> OperationKind {
        match self {
            Command::Find(_) => OperationKind::Find,
            Command::Count(_) => OperationKind::Count,
            Command::Distinct(_) => OperationKind::Distinct,
            Command::Delete(_) => OperationKind::Delete,
            Command::Update(_) => OperationKind::Update,
            Command::Group(_) => OperationKind::Group,
            Command::FindAndModify(_) => OperationKind::FindAndModify,
            Command::Aggregate(_) => OperationKind::Aggregate,
            Command::Insert(_) => OperationKind::Insert,
            Command::MapReduce(_) => OperationKind::MapReduce,
            Command::GeoNear(_) => OperationKind::GeoNear,
            Command::Unknown(_) => OperationKind::Unknown,
        }
    }

    /// Target collection, when the command names one
    pub fn collection(&self) -> Option<&str> {
        match self {
            Command::Find(c) => Some(&c.collection),
            Command::Count(c) => Some(&c.collection),
            Command::Distinct(c) => Some(&c.collection),
            Command::Delete(c) => Some(&c.collection),
            Command::Update(c) => Some(&c.collection),
            Command::Group(c) => Some(&c.collection),
            Command::FindAndModify(c) => Some(&c.collection),
            Command::Aggregate(c) => c.target.as_str(),
            Command::Insert(c) => Some(&c.collection),
            Command::MapReduce(c) => Some(&c.collection),
            Command::GeoNear(c) => Some(&c.collection),
            Command::Unknown(_) => None,
        }
    }

    /// The name the server would report when refusing to explain this
    /// command
    pub fn display_name(&self) -> &str {
        match self {
            Command::Unknown(UnknownCommand { name: Some(name) }) => name,
            other => other.kind().command_name(),
        }
    }

    /// Build the wire form of the command, command key first.
    ///
    /// Returns `None` for unknown commands, which have no wire form.
    pub fn to_document(&self) -> Option<Document> {
        let doc = match self {
            Command::Find(c) => {
                let mut doc = head("find", Value::from(c.collection.as_str()));
                put_opt(&mut doc, "filter", &c.filter);
                extend(doc, &c.options)
            }
            Command::Count(c) => {
                let mut doc = head("count", Value::from(c.collection.as_str()));
                put_opt(&mut doc, "query", &c.query);
                extend(doc, &c.options)
            }
            Command::Distinct(c) => {
                let mut doc = head("distinct", Value::from(c.collection.as_str()));
                doc.insert("key".to_string(), Value::from(c.key.as_str()));
                put_opt(&mut doc, "query", &c.query);
                extend(doc, &c.options)
            }
            Command::Delete(c) => {
                let mut doc = head("delete", Value::from(c.collection.as_str()));
                let deletes = c.deletes.iter().map(delete_statement).collect();
                doc.insert("deletes".to_string(), Value::Array(deletes));
                extend(doc, &c.options)
            }
            Command::Update(c) => {
                let mut doc = head("update", Value::from(c.collection.as_str()));
                let updates = c.updates.iter().map(update_statement).collect();
                doc.insert("updates".to_string(), Value::Array(updates));
                extend(doc, &c.options)
            }
            Command::Group(c) => {
                let doc = head("group", Value::Object(c.spec.clone()));
                extend(doc, &c.options)
            }
            Command::FindAndModify(c) => {
                let mut doc = head("findAndModify", Value::from(c.collection.as_str()));
                put_opt(&mut doc, "query", &c.query);
                put_opt(&mut doc, "update", &c.update);
                if let Some(remove) = c.remove {
                    doc.insert("remove".to_string(), Value::Bool(remove));
                }
                extend(doc, &c.options)
            }
            Command::Aggregate(c) => {
                let mut doc = head("aggregate", c.target.clone());
                doc.insert("pipeline".to_string(), Value::Array(c.pipeline.clone()));
                extend(doc, &c.options)
            }
            Command::Insert(c) => {
                let mut doc = head("insert", Value::from(c.collection.as_str()));
                doc.insert("documents".to_string(), Value::Array(c.documents.clone()));
                extend(doc, &c.options)
            }
            Command::MapReduce(c) => {
                let mut doc = head("mapReduce", Value::from(c.collection.as_str()));
                doc.insert("map".to_string(), c.map.clone());
                doc.insert("reduce".to_string(), c.reduce.clone());
                extend(doc, &c.options)
            }
            Command::GeoNear(c) => {
                let doc = head("geoNear", Value::from(c.collection.as_str()));
                extend(doc, &c.options)
            }
            Command::Unknown(_) => return None,
        };
        Some(doc)
    }
}

fn head(name: &str, value: Value) -> Document {
    let mut doc = Document::new();
    doc.insert(name.to_string(), value);
    doc
}

fn put_opt(doc: &mut Document, key: &str, value: &Option<Value>) {
    if let Some(value) = value {
        doc.insert(key.to_string(), value.clone());
    }
}

fn extend(mut doc: Document, options: &Document) -> Document {
    for (key, value) in options {
        doc.entry(key.clone()).or_insert_with(|| value.clone());
    }
    doc
}

fn delete_statement(stmt: &DeleteStatement) -> Value {
    let mut doc = head("q", stmt.q.clone());
    doc.insert("limit".to_string(), stmt.limit.clone());
    Value::Object(extend(doc, &stmt.options))
}

fn update_statement(stmt: &UpdateStatement) -> Value {
    let mut doc = head("q", stmt.q.clone());
    doc.insert("u".to_string(), stmt.u.clone());
    if let Some(multi) = stmt.multi {
        doc.insert("multi".to_string(), Value::Bool(multi));
    }
    if let Some(upsert) = stmt.upsert {
        doc.insert("upsert".to_string(), Value::Bool(upsert));
    }
    Value::Object(extend(doc, &stmt.options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(doc: &Document) -> Vec<&str> {
        doc.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_find_wire_form_puts_command_key_first() {
        let cmd: FindCommand = serde_json::from_value(json!({
            "limit": 5,
            "filter": {"status": "open"},
            "find": "orders"
        }))
        .unwrap();

        let doc = Command::Find(cmd).to_document().unwrap();
        assert_eq!(keys(&doc), vec!["find", "filter", "limit"]);
        assert_eq!(doc["filter"], json!({"status": "open"}));
    }

    #[test]
    fn test_find_requires_collection_string() {
        assert!(serde_json::from_value::<FindCommand>(json!({"find": 1})).is_err());
        assert!(serde_json::from_value::<FindCommand>(json!({"filter": {}})).is_err());
    }

    #[test]
    fn test_aliases_decode() {
        let fam: FindAndModifyCommand =
            serde_json::from_value(json!({"findandmodify": "c", "query": {}, "remove": true}))
                .unwrap();
        assert_eq!(fam.collection, "c");
        assert_eq!(fam.remove, Some(true));

        let mr: MapReduceCommand =
            serde_json::from_value(json!({"mapreduce": "c", "map": "f", "reduce": "g"})).unwrap();
        assert_eq!(mr.collection, "c");
    }

    #[test]
    fn test_numeric_flags() {
        let fam: FindAndModifyCommand =
            serde_json::from_value(json!({"findAndModify": "c", "query": {"_id": 1}, "remove": 1}))
                .unwrap();
        assert_eq!(fam.remove, Some(true));

        let stmt: UpdateStatement = serde_json::from_value(
            json!({"q": {}, "u": {"$set": {"a": 1}}, "multi": 1, "upsert": 0}),
        )
        .unwrap();
        assert_eq!(stmt.multi, Some(true));
        assert_eq!(stmt.upsert, Some(false));

        let stmt: UpdateStatement =
            serde_json::from_value(json!({"q": {}, "u": {}, "multi": null})).unwrap();
        assert_eq!(stmt.multi, None);
    }

    #[test]
    fn test_flag_rejects_other_types() {
        let result = serde_json::from_value::<UpdateStatement>(
            json!({"q": {}, "u": {}, "multi": "yes"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_statement_default_limit() {
        let stmt: DeleteStatement = serde_json::from_value(json!({"q": {"a": 1}})).unwrap();
        assert_eq!(stmt.limit, json!(0));
    }

    #[test]
    fn test_update_wire_form() {
        let cmd = Command::Update(UpdateCommand {
            collection: "orders".to_string(),
            updates: vec![UpdateStatement {
                q: json!({"_id": 1}),
                u: json!({"$set": {"x": 1}}),
                multi: Some(true),
                upsert: None,
                options: Document::new(),
            }],
            options: Document::new(),
        });

        let doc = cmd.to_document().unwrap();
        assert_eq!(
            Value::Object(doc),
            json!({
                "update": "orders",
                "updates": [{"q": {"_id": 1}, "u": {"$set": {"x": 1}}, "multi": true}]
            })
        );
    }

    #[test]
    fn test_aggregate_collection_only_for_string_target() {
        let named: AggregateCommand =
            serde_json::from_value(json!({"aggregate": "orders", "pipeline": []})).unwrap();
        assert_eq!(Command::Aggregate(named).collection(), Some("orders"));

        let db_level: AggregateCommand =
            serde_json::from_value(json!({"aggregate": 1, "pipeline": []})).unwrap();
        assert_eq!(Command::Aggregate(db_level).collection(), None);
    }

    #[test]
    fn test_unknown_has_no_wire_form() {
        let cmd = Command::Unknown(UnknownCommand {
            name: Some("ping".to_string()),
        });
        assert!(cmd.to_document().is_none());
        assert_eq!(cmd.display_name(), "ping");
        assert_eq!(cmd.kind(), OperationKind::Unknown);
    }
}
