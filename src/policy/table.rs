//! Policy rules and lookup

use serde::{Deserialize, Serialize};

use crate::classifier::OperationKind;
use crate::version::{ServerVersion, VersionConstraint};

/// Servers in this range refuse to explain write commands other than
/// update and delete.
pub const LEGACY_WRITE_EXPLAIN: (u64, u64) = (3, 4);

/// What a rule decides when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Explain may be sent
    Allow,
    /// The server never explains this command
    RejectPermanent,
    /// The connected server's release cannot explain this command
    RejectByVersion,
}

/// One row of the policy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Operation kind the rule applies to
    pub kind: OperationKind,
    /// Version range the rule is limited to; `None` matches every version
    #[serde(default)]
    pub when: Option<VersionConstraint>,
    /// Decision when the rule matches
    pub verdict: Verdict,
}

impl PolicyRule {
    /// A rule for every server version
    pub fn always(kind: OperationKind, verdict: Verdict) -> Self {
        Self {
            kind,
            when: None,
            verdict,
        }
    }

    /// A rule limited to a version range
    pub fn when(kind: OperationKind, constraint: VersionConstraint, verdict: Verdict) -> Self {
        Self {
            kind,
            when: Some(constraint),
            verdict,
        }
    }

    /// Returns true if the rule applies to this kind on this server
    pub fn matches(&self, kind: OperationKind, version: &ServerVersion) -> bool {
        self.kind == kind
            && self
                .when
                .as_ref()
                .map_or(true, |constraint| constraint.matches(version))
    }
}

/// Why a kind was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Never explainable on any release
    Permanent,
    /// Not explainable on releases inside `constraint`
    ByVersion { constraint: Option<VersionConstraint> },
}

/// Outcome of a policy lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Rejected(Rejection),
}

impl Decision {
    /// Returns true if explain may be sent
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Returns the rejection, if any
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decision::Allowed => None,
            Decision::Rejected(rejection) => Some(rejection),
        }
    }
}

/// The explainability table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PolicyTable {
    /// A table with no rules; every kind is rejected
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The compatibility rules for known server releases
    pub fn builtin() -> Self {
        use OperationKind::*;

        let (major, minor) = LEGACY_WRITE_EXPLAIN;
        let always = [Find, Count, Distinct, Delete, Update, Group, FindAndModify];
        let mut rules: Vec<PolicyRule> = always
            .into_iter()
            .map(|kind| PolicyRule::always(kind, Verdict::Allow))
            .collect();

        rules.extend(
            [Aggregate, MapReduce, GeoNear]
                .into_iter()
                .map(|kind| PolicyRule::always(kind, Verdict::RejectPermanent)),
        );
        rules.push(PolicyRule::when(
            Insert,
            VersionConstraint::below(major, minor),
            Verdict::RejectByVersion,
        ));
        rules.push(PolicyRule::always(Insert, Verdict::RejectPermanent));
        rules.push(PolicyRule::always(Unknown, Verdict::RejectPermanent));

        Self { rules }
    }

    /// The builtin table with `overrides` consulted first
    pub fn with_overrides(overrides: impl IntoIterator<Item = PolicyRule>) -> Self {
        let mut table = Self::builtin();
        table.prepend(overrides);
        table
    }

    /// Insert rules ahead of the existing ones, keeping their order
    pub fn prepend(&mut self, rules: impl IntoIterator<Item = PolicyRule>) {
        let mut merged: Vec<PolicyRule> = rules.into_iter().collect();
        merged.append(&mut self.rules);
        self.rules = merged;
    }

    /// All rules in lookup order
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Decide whether `kind` can be explained on `version`.
    ///
    /// `Unknown` is always rejected regardless of the table.
    pub fn allowed(&self, kind: OperationKind, version: &ServerVersion) -> Decision {
        if kind == OperationKind::Unknown {
            return Decision::Rejected(Rejection::Permanent);
        }

        let rule = self.rules.iter().find(|rule| rule.matches(kind, version));

        match rule.map(|rule| (rule.verdict, rule)) {
            Some((Verdict::Allow, _)) => Decision::Allowed,
            Some((Verdict::RejectByVersion, rule)) => Decision::Rejected(Rejection::ByVersion {
                constraint: rule.when.clone(),
            }),
            Some((Verdict::RejectPermanent, _)) | None => Decision::Rejected(Rejection::Permanent),
        }
    }
}
