//! Cycloscope - cyclomatic complexity analysis for Python, JavaScript, and C.
//!
//! Cycloscope parses source files, builds a forest of complexity-bearing
//! scopes (functions, methods, lambdas, and the module body), and scores
//! each one by counting decision points: a scope starts at 1 and every
//! branch, loop, exception handler, boolean operator, and match arm
//! beyond the first adds its configured weight.
//!
//! # Architecture
//!
//! - `syntax`: the language-neutral lowered tree and span types
//! - `lang`: tree-sitter frontends that lower source to `syntax` trees
//! - `engine`: rule table, scope extraction, decision visiting, scoring
//! - `report`: output formatting (pretty, JSON)
//! - `cli`: command-line surface
//!
//! # Adding a New Language
//!
//! See `src/lang/` for examples. Implement the `LanguageFrontend` trait
//! and register it in `lang/mod.rs`; the engine never changes.

pub mod cli;
pub mod engine;
pub mod lang;
pub mod report;
pub mod syntax;

pub use engine::{
    analyze, analyze_with_depth, AnalysisError, ComplexityReport, DecisionEvent, RuleOverrides,
    RuleTable, ScopeReport,
};
pub use lang::{get_frontend, register_frontends, LanguageFrontend};
pub use syntax::{ConstructKind, ScopeKind, Span, SyntaxNode};

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    register_frontends();
}
