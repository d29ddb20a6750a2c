//! The rule table: construct kind → decision weight.
//!
//! Classification is a pure table lookup. The visitor contains no
//! per-construct conditionals; changing a counting convention means
//! changing a weight here (or overriding it at configuration time),
//! never touching traversal code.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::syntax::ConstructKind;

/// Default McCabe weights, one entry per decision-candidate kind.
///
/// Zero-weight entries are deliberate: `try`/`with` are not branches, and
/// comprehension filters are a convention knob that tools disagree on, so
/// they stay in the table where an override can reach them.
const DEFAULT_RULES: &[(&str, u32, &str)] = &[
    ("if_clause", 1, "conditional clause"),
    ("loop_header", 1, "loop"),
    ("except_handler", 1, "exception handler"),
    ("boolean_op", 1, "boolean operator"),
    ("ternary", 1, "conditional expression"),
    ("match_arm", 1, "match arm"),
    ("comprehension_filter", 0, "comprehension filter"),
    ("with_block", 0, "with block"),
    ("try_block", 0, "try block"),
    ("yield_point", 0, "yield"),
];

/// Errors raised while building a rule table from overrides.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("unknown construct kind {kind:?} in rule overrides (known kinds: {known})")]
    UnknownKind { kind: String, known: String },
}

/// One resolved rule: the weight applied and a short label for
/// explainability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub weight: u32,
    pub label: &'static str,
}

/// Immutable mapping from construct kind to decision weight.
///
/// Built once per analysis run, before any visitor executes.
#[derive(Debug, Clone)]
pub struct RuleTable {
    weights: BTreeMap<&'static str, u32>,
}

impl RuleTable {
    /// The standard McCabe convention: conditional clauses, loop headers,
    /// exception handlers, boolean operators, ternaries, and match arms
    /// count one each; protected blocks, resource acquisition, yields, and
    /// comprehension filters count zero.
    pub fn mccabe() -> Self {
        let weights = DEFAULT_RULES.iter().map(|(id, w, _)| (*id, *w)).collect();
        Self { weights }
    }

    /// Build a table from the defaults plus an override set.
    pub fn with_overrides(overrides: &RuleOverrides) -> Result<Self, RuleError> {
        let mut table = Self::mccabe();
        table.apply(overrides)?;
        Ok(table)
    }

    /// Apply an override set. Unknown kind identifiers are rejected so a
    /// typo in configuration cannot silently drop a convention change.
    pub fn apply(&mut self, overrides: &RuleOverrides) -> Result<(), RuleError> {
        for (kind, weight) in &overrides.weights {
            let slot = DEFAULT_RULES
                .iter()
                .find(|(id, _, _)| id == kind)
                .ok_or_else(|| RuleError::UnknownKind {
                    kind: kind.clone(),
                    known: DEFAULT_RULES
                        .iter()
                        .map(|(id, _, _)| *id)
                        .collect::<Vec<_>>()
                        .join(", "),
                })?;
            self.weights.insert(slot.0, *weight);
        }
        Ok(())
    }

    /// Look up the rule for a kind identifier.
    pub fn lookup(&self, id: &str) -> Option<Rule> {
        let weight = *self.weights.get(id)?;
        let label = DEFAULT_RULES
            .iter()
            .find(|(rid, _, _)| *rid == id)
            .map(|(_, _, label)| *label)?;
        Some(Rule { weight, label })
    }

    /// Look up the rule for a construct kind. `None` for structural and
    /// unrecognized kinds, which are never decision candidates.
    pub fn rule_for(&self, kind: &ConstructKind) -> Option<Rule> {
        self.lookup(kind.rule_id()?)
    }

    /// All entries in stable (alphabetical) order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, Rule)> + '_ {
        self.weights.iter().map(|(id, weight)| {
            let label = DEFAULT_RULES
                .iter()
                .find(|(rid, _, _)| rid == id)
                .map(|(_, _, label)| *label)
                .unwrap_or("");
            (
                *id,
                Rule {
                    weight: *weight,
                    label,
                },
            )
        })
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::mccabe()
    }
}

/// Configuration-time weight overrides, keyed by kind identifier.
///
/// ```yaml
/// weights:
///   comprehension_filter: 1
///   boolean_op: 0
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleOverrides {
    #[serde(default)]
    pub weights: BTreeMap<String, u32>,
}

impl RuleOverrides {
    /// Load overrides from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let overrides: RuleOverrides = serde_yaml::from_str(&text)?;
        Ok(overrides)
    }

    /// Set a single override.
    pub fn set(&mut self, kind: &str, weight: u32) {
        self.weights.insert(kind.to_string(), weight);
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
