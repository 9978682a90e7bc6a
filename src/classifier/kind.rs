//! Operation kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The category of database request a captured query represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Find,
    Count,
    Distinct,
    Delete,
    Update,
    Group,
    FindAndModify,
    Aggregate,
    Insert,
    MapReduce,
    GeoNear,
    Unknown,
}

impl OperationKind {
    /// Every kind, in classification precedence order
    pub const ALL: [OperationKind; 12] = [
        OperationKind::Aggregate,
        OperationKind::MapReduce,
        OperationKind::GeoNear,
        OperationKind::FindAndModify,
        OperationKind::Insert,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::Count,
        OperationKind::Distinct,
        OperationKind::Group,
        OperationKind::Find,
        OperationKind::Unknown,
    ];

    /// The command name the server uses for this kind
    pub fn command_name(&self) -> &'static str {
        match self {
            OperationKind::Find => "find",
            OperationKind::Count => "count",
            OperationKind::Distinct => "distinct",
            OperationKind::Delete => "delete",
            OperationKind::Update => "update",
            OperationKind::Group => "group",
            OperationKind::FindAndModify => "findAndModify",
            OperationKind::Aggregate => "aggregate",
            OperationKind::Insert => "insert",
            OperationKind::MapReduce => "mapReduce",
            OperationKind::GeoNear => "geoNear",
            OperationKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_name())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    /// Accepts the server command name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.command_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown operation kind '{}'", s))
    }
}
