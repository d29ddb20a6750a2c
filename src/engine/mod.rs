//! The decision-point counting engine.
//!
//! A pure, synchronous transformation from one lowered syntax tree to one
//! complexity report:
//!
//! ```text
//! SyntaxNode tree ──▶ Scope Extractor ──▶ scope forest
//!                                            │ (per scope)
//!                                            ▼
//!                     Rule Table ◀── Decision Visitor ──▶ decision events
//!                                            │
//!                                            ▼
//!                                       Aggregator ──▶ ComplexityReport
//! ```
//!
//! The engine holds no process-wide state and performs no I/O; analysis of
//! independent files needs no coordination here.

pub mod aggregate;
pub mod rules;
pub mod scopes;
pub mod visitor;

use thiserror::Error;

pub use aggregate::{build_report, ComplexityReport, ScopeError, ScopeReport, ScopeWarning};
pub use rules::{Rule, RuleError, RuleOverrides, RuleTable};
pub use scopes::{extract, Extraction, ScopeForest, ScopeId, ScopeRecord};
pub use visitor::{collect_decisions, DecisionEvent, UnknownConstructWarning};

use crate::syntax::SyntaxNode;

/// Bound on tree-walk recursion, defending against pathological or
/// generated input. Exceeding it aborts the offending scope only.
pub const MAX_NESTING_DEPTH: usize = 200;

/// File-level analysis errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The parser collaborator could not produce a usable tree. The file
    /// gets an empty report with this error attached; structure is never
    /// guessed.
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },
    /// The file could not be read at all.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

/// Analyze one lowered tree with the default nesting bound.
pub fn analyze(root: &SyntaxNode, rules: &RuleTable) -> ComplexityReport {
    analyze_with_depth(root, rules, MAX_NESTING_DEPTH)
}

/// Analyze one lowered tree with an explicit nesting bound.
///
/// A single deterministic pass: scope extraction, then one visitor
/// invocation per scope, then aggregation. A scope whose visit trips the
/// bound becomes an error entry; every other scope reports normally.
pub fn analyze_with_depth(
    root: &SyntaxNode,
    rules: &RuleTable,
    max_depth: usize,
) -> ComplexityReport {
    let extraction = extract(root, max_depth);
    let results = extraction
        .nodes
        .iter()
        .map(|node| collect_decisions(node, rules, max_depth))
        .collect();
    build_report(&extraction.forest, results, extraction.errors)
}
