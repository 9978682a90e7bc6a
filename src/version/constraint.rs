//! Version parsing and range evaluation

use std::fmt;
use std::str::FromStr;

use semver::{Comparator, Op, Prerelease, Version, VersionReq};
use serde::{Deserialize, Serialize};

use super::errors::{VersionError, VersionResult};

/// A server build version, normalized for comparison.
///
/// The raw string reported by the server is kept for diagnostics; only the
/// normalized `major.minor.patch` part takes part in comparisons.
#[derive(Debug, Clone)]
pub struct ServerVersion {
    version: Version,
    raw: String,
}

impl ServerVersion {
    /// Parse a server-reported version string
    pub fn parse(raw: &str) -> VersionResult<Self> {
        let normalized = normalize(raw);
        let version = Version::parse(&normalized).map_err(|source| VersionError::InvalidVersion {
            input: raw.to_string(),
            source,
        })?;

        Ok(Self {
            version,
            raw: raw.to_string(),
        })
    }

    /// Major component
    pub fn major(&self) -> u64 {
        self.version.major
    }

    /// Minor component
    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    /// Patch component
    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// The string as reported by the server
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Check this version against a constraint
    pub fn satisfies(&self, constraint: &VersionConstraint) -> bool {
        constraint.matches(self)
    }

    pub(crate) fn as_semver(&self) -> &Version {
        &self.version
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for ServerVersion {}

impl FromStr for ServerVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

/// A range expression over server versions.
///
/// Comparators inside one alternative are joined with `,` (all must hold);
/// alternatives are joined with `||` (any may hold).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    alternatives: Vec<VersionReq>,
    raw: String,
}

impl VersionConstraint {
    /// Parse a constraint expression
    pub fn parse(raw: &str) -> VersionResult<Self> {
        let mut alternatives = Vec::new();

        for part in raw.split("||") {
            let part = comparators(part);
            if part.is_empty() {
                return Err(VersionError::EmptyConstraint {
                    input: raw.to_string(),
                });
            }

            let req = VersionReq::parse(&part).map_err(|source| VersionError::InvalidConstraint {
                input: raw.to_string(),
                source,
            })?;
            alternatives.push(req);
        }

        Ok(Self {
            alternatives,
            raw: raw.trim().to_string(),
        })
    }

    /// `< major.minor`
    pub fn below(major: u64, minor: u64) -> Self {
        Self::single(Op::Less, major, minor)
    }

    /// `>= major.minor`
    pub fn at_least(major: u64, minor: u64) -> Self {
        Self::single(Op::GreaterEq, major, minor)
    }

    fn single(op: Op, major: u64, minor: u64) -> Self {
        let symbol = match op {
            Op::Less => "<",
            _ => ">=",
        };
        let comparator = Comparator {
            op,
            major,
            minor: Some(minor),
            patch: None,
            pre: Prerelease::EMPTY,
        };

        Self {
            alternatives: vec![VersionReq {
                comparators: vec![comparator],
            }],
            raw: format!("{} {}.{}", symbol, major, minor),
        }
    }

    /// Returns true if the version falls inside this range
    pub fn matches(&self, version: &ServerVersion) -> bool {
        self.alternatives
            .iter()
            .any(|req| req.matches(version.as_semver()))
    }

    /// The expression as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for VersionConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for VersionConstraint {}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.raw
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Check whether `version` satisfies `constraint`.
///
/// The version is parsed first, so a malformed version is reported even
/// when the constraint is also malformed.
pub fn satisfies(constraint: &str, version: &str) -> VersionResult<bool> {
    let version = ServerVersion::parse(version)?;
    let constraint = VersionConstraint::parse(constraint)?;
    Ok(constraint.matches(&version))
}

/// Reduce a reported version to a strict `major.minor.patch` string.
///
/// Drops everything from the first `-`, any `+build` suffix and a leading
/// `v`, then pads missing minor/patch components with zero.
/// Rewrite one `||` alternative into comma-joined comparators.
///
/// Comparators may be separated by whitespace or commas, an operator may be
/// split from its version by spaces, and a version without an operator is
/// an exact match on the parts given (`3.4` is `= 3.4`, any patch).
fn comparators(part: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut pending_op = String::new();

    let tokens = part
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty());

    for token in tokens {
        if token.chars().all(is_operator) {
            pending_op.push_str(token);
            continue;
        }

        let version = token.trim_start_matches(is_operator);
        let op = format!("{}{}", pending_op, &token[..token.len() - version.len()]);
        pending_op.clear();

        if op.is_empty() && !is_wildcard(version) {
            out.push(format!("={}", version));
        } else {
            out.push(format!("{}{}", op, version));
        }
    }

    if !pending_op.is_empty() {
        out.push(pending_op);
    }

    out.join(", ")
}

fn is_operator(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^' | '!')
}

fn is_wildcard(version: &str) -> bool {
    version.split('.').any(|part| matches!(part, "*" | "x" | "X"))
}

fn normalize(raw: &str) -> String {
    let release = raw.split('-').next().unwrap_or_default().trim();
    let release = release.split('+').next().unwrap_or_default();
    let release = release.strip_prefix('v').unwrap_or(release);

    match release.split('.').count() {
        1 if !release.is_empty() => format!("{}.0.0", release),
        2 => format!("{}.0", release),
        _ => release.to_string(),
    }
}
