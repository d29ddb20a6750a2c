//! Aggregation: fold each scope's decision events into a score and
//! produce the final report.
//!
//! `score = 1 + Σ weight(decision_events)`, always ≥ 1. Report order is
//! source order of scope definitions; the module scope sorts first. The
//! same input tree always serializes to byte-identical output.

use serde::{Deserialize, Serialize};

use crate::syntax::{ScopeKind, Span};

use super::scopes::ScopeForest;
use super::visitor::{DecisionEvent, DepthExceeded, ScopeVisit};

/// Scoped, non-fatal analysis failure (recursion guard, truncated
/// extraction). The named scope is omitted from `scopes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeError {
    /// Qualified name of the affected scope.
    pub scope: String,
    pub span: Span,
    pub message: String,
}

/// Scoped unknown-construct warning, weight 0 applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeWarning {
    /// Qualified name of the scope that owns the construct.
    pub scope: String,
    /// Raw grammar tag of the unrecognized construct.
    pub construct: String,
    pub span: Span,
}

/// Final score and decision trace for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeReport {
    pub id: u32,
    pub qualified_name: String,
    pub kind: ScopeKind,
    pub span: Span,
    pub score: u32,
    pub decision_events: Vec<DecisionEvent>,
}

/// Complexity report for one source unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    /// Scope reports in source order; the module scope first.
    pub scopes: Vec<ScopeReport>,
    /// Scopes omitted because analysis failed for them alone.
    pub errors: Vec<ScopeError>,
    /// Unknown-construct warnings, in source order per scope.
    pub warnings: Vec<ScopeWarning>,
}

impl ComplexityReport {
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn max_score(&self) -> u32 {
        self.scopes.iter().map(|s| s.score).max().unwrap_or(0)
    }

    pub fn average_score(&self) -> f64 {
        if self.scopes.is_empty() {
            return 0.0;
        }
        let total: u32 = self.scopes.iter().map(|s| s.score).sum();
        total as f64 / self.scopes.len() as f64
    }
}

/// Fold per-scope visitor results into the final report.
///
/// `results` parallels the forest's source order. A failed visit yields an
/// error entry instead of a scope report; no other scope is affected.
pub fn build_report(
    forest: &ScopeForest,
    results: Vec<Result<ScopeVisit, DepthExceeded>>,
    extraction_errors: Vec<ScopeError>,
) -> ComplexityReport {
    let mut report = ComplexityReport {
        errors: extraction_errors,
        ..Default::default()
    };

    for (record, result) in forest.iter().zip(results) {
        match result {
            Ok(visit) => {
                let score: u32 = 1 + visit.events.iter().map(|e| e.weight).sum::<u32>();
                report.scopes.push(ScopeReport {
                    id: record.id.0,
                    qualified_name: record.qualified_name.clone(),
                    kind: record.kind,
                    span: record.span,
                    score,
                    decision_events: visit.events,
                });
                for w in visit.warnings {
                    report.warnings.push(ScopeWarning {
                        scope: record.qualified_name.clone(),
                        construct: w.construct,
                        span: w.span,
                    });
                }
            }
            Err(depth) => {
                report.errors.push(ScopeError {
                    scope: record.qualified_name.clone(),
                    span: record.span,
                    message: format!(
                        "nesting depth exceeds {}; scope omitted from report",
                        depth.limit
                    ),
                });
            }
        }
    }

    report
}
