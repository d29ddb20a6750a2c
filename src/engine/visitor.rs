//! The decision visitor: classify every construct one scope owns.
//!
//! The visitor walks exactly the nodes lexically owned by a scope. At any
//! child that introduces a nested scope it stops descending: that subtree
//! is analyzed by its own invocation of this visitor. Classification is a
//! single rule-table lookup per node.

use serde::{Deserialize, Serialize};

use crate::syntax::{ConstructKind, Span, SyntaxNode};

use super::rules::RuleTable;

/// One counted decision point, ordered by source position within its
/// owning scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Rule-table kind identifier, e.g. `if_clause`.
    pub kind: String,
    /// Weight applied, per the rule table in force.
    pub weight: u32,
    pub span: Span,
    /// Human-readable label, e.g. "elif clause", "except ValueError".
    pub label: String,
}

/// Non-fatal diagnostic for a construct the rule table does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownConstructWarning {
    /// Raw grammar tag of the unrecognized node.
    pub construct: String,
    pub span: Span,
}

/// Everything one visitor invocation produced for one scope.
#[derive(Debug, Default)]
pub struct ScopeVisit {
    pub events: Vec<DecisionEvent>,
    pub warnings: Vec<UnknownConstructWarning>,
}

/// The recursion guard tripped while visiting one scope. The scope is
/// omitted from the report; siblings are unaffected.
#[derive(Debug, Clone, Copy)]
pub struct DepthExceeded {
    pub limit: usize,
}

/// Collect the ordered decision events for the scope rooted at
/// `scope_node`, consulting `rules` for every construct.
pub fn collect_decisions(
    scope_node: &SyntaxNode,
    rules: &RuleTable,
    max_depth: usize,
) -> Result<ScopeVisit, DepthExceeded> {
    let mut visit = ScopeVisit::default();
    walk(scope_node, rules, max_depth, 1, &mut visit)?;
    // Pre-order traversal of a source-ordered tree is already nearly
    // sorted; the stable sort pins down nested constructs that share a
    // start position (e.g. chained boolean operators).
    visit
        .events
        .sort_by_key(|e| (e.span.start_byte, e.span.end_byte));
    Ok(visit)
}

fn walk(
    node: &SyntaxNode,
    rules: &RuleTable,
    max_depth: usize,
    depth: usize,
    visit: &mut ScopeVisit,
) -> Result<(), DepthExceeded> {
    if depth > max_depth {
        return Err(DepthExceeded { limit: max_depth });
    }

    for child in &node.children {
        // Nested scopes own their bodies; stop at the boundary.
        if child.kind.is_scope() {
            continue;
        }

        if let ConstructKind::Unrecognized(tag) = &child.kind {
            // Weight 0, warn, and treat the node as opaque: its interior
            // cannot be classified either.
            visit.warnings.push(UnknownConstructWarning {
                construct: tag.clone(),
                span: child.span,
            });
            continue;
        }

        if let Some(rule) = rules.rule_for(&child.kind) {
            if rule.weight > 0 {
                visit.events.push(DecisionEvent {
                    kind: child
                        .kind
                        .rule_id()
                        .unwrap_or_default()
                        .to_string(),
                    weight: rule.weight,
                    span: child.span,
                    label: event_label(&child.kind, child.detail.as_deref(), rule.label),
                });
            }
        }

        walk(child, rules, max_depth, depth + 1, visit)?;
    }

    Ok(())
}

/// Compose the human-readable label for an event from the rule label and
/// the construct-specific detail the frontend recorded.
fn event_label(kind: &ConstructKind, detail: Option<&str>, rule_label: &str) -> String {
    match (kind, detail) {
        (ConstructKind::IfClause, Some(d)) => format!("{} clause", d),
        (ConstructKind::IfClause, None) => "if clause".to_string(),
        (ConstructKind::LoopHeader, Some(d)) => format!("{} loop", d),
        (ConstructKind::BooleanOp, Some(d)) => format!("boolean {}", d),
        (ConstructKind::ExceptHandler, Some(d)) => d.to_string(),
        (_, _) => rule_label.to_string(),
    }
}
