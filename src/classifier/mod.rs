//! Command classifier
//!
//! Turns a captured query document into an [`OperationKind`] and the typed
//! [`ExplainRequest`] needed to build an explain command.
//!
//! # Accepted captures
//!
//! - Bare commands: `{find: "orders", filter: {...}}`,
//!   `{update: "orders", updates: [...]}`, ...
//! - Profiler envelopes: `{op: "query", ns: "shop.orders", query: {...}}`
//!
//! # Precedence (strict order)
//!
//! aggregate, mapReduce, geoNear, findAndModify, insert, update, delete,
//! count, distinct, group, find, filter-only find.
//!
//! The first shape that decodes wins. Anything else is `unknown`.

mod classify;
mod command;
mod kind;
mod profile;

pub use classify::{classify, ExplainRequest, SESSION_FIELDS};
pub use command::{
    AggregateCommand, Command, CountCommand, DeleteCommand, DeleteStatement, DistinctCommand,
    Document, FindAndModifyCommand, FindCommand, GeoNearCommand, GroupCommand, InsertCommand,
    MapReduceCommand, UnknownCommand, UpdateCommand, UpdateStatement,
};
pub use kind::OperationKind;
