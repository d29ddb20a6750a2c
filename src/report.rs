//! Output formatting for analysis results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::engine::{AnalysisError, ComplexityReport, RuleTable, ScopeReport};
use crate::syntax::ScopeKind;

/// Per-file analysis outcome. A file either yields a report or fails
/// whole with a parse error.
pub struct FileOutcome {
    pub path: String,
    pub language: &'static str,
    pub result: Result<ComplexityReport, AnalysisError>,
}

impl FileOutcome {
    pub fn report(&self) -> Option<&ComplexityReport> {
        self.result.as_ref().ok()
    }
}

/// Whether every analyzed scope is at or under the threshold.
pub fn within_threshold(outcomes: &[FileOutcome], threshold: u32) -> bool {
    outcomes
        .iter()
        .filter_map(FileOutcome::report)
        .flat_map(|r| r.scopes.iter())
        .all(|s| s.score <= threshold)
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub threshold: u32,
    pub passed: bool,
    pub files_scanned: usize,
    pub scopes: Vec<JsonScope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<JsonWarning>,
    pub summary: JsonSummary,
}

#[derive(Serialize, Deserialize)]
pub struct JsonScope {
    pub file: String,
    pub scope: String,
    pub kind: ScopeKind,
    pub line: usize,
    pub score: u32,
    pub exceeds: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<JsonDecision>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonDecision {
    pub kind: String,
    pub weight: u32,
    pub line: usize,
    pub label: String,
}

/// Parse errors and per-scope errors share one shape; `scope` is absent
/// for file-level failures.
#[derive(Serialize, Deserialize)]
pub struct JsonError {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct JsonWarning {
    pub file: String,
    pub scope: String,
    pub construct: String,
    pub line: usize,
}

#[derive(Serialize, Deserialize)]
pub struct JsonSummary {
    pub scopes: usize,
    pub max_score: u32,
    pub average_score: f64,
    pub over_threshold: usize,
    pub parse_errors: usize,
}

/// Write results for the whole run in JSON format.
pub fn write_json(
    path: &str,
    outcomes: &[FileOutcome],
    threshold: u32,
    include_details: bool,
) -> anyhow::Result<()> {
    let mut scopes = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                for scope in &report.scopes {
                    scopes.push(scope_to_json(&outcome.path, scope, threshold, include_details));
                }
                for err in &report.errors {
                    errors.push(JsonError {
                        file: outcome.path.clone(),
                        scope: Some(err.scope.clone()),
                        message: err.message.clone(),
                    });
                }
                for warn in &report.warnings {
                    warnings.push(JsonWarning {
                        file: outcome.path.clone(),
                        scope: warn.scope.clone(),
                        construct: warn.construct.clone(),
                        line: warn.span.start_line,
                    });
                }
            }
            Err(err) => errors.push(JsonError {
                file: outcome.path.clone(),
                scope: None,
                message: err.to_string(),
            }),
        }
    }

    let summary = summarize(&scopes, outcomes);
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        threshold,
        passed: within_threshold(outcomes, threshold),
        files_scanned: outcomes.len(),
        scopes,
        errors,
        warnings,
        summary,
    };

    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn scope_to_json(
    file: &str,
    scope: &ScopeReport,
    threshold: u32,
    include_details: bool,
) -> JsonScope {
    let details = if include_details {
        scope
            .decision_events
            .iter()
            .map(|e| JsonDecision {
                kind: e.kind.clone(),
                weight: e.weight,
                line: e.span.start_line,
                label: e.label.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    JsonScope {
        file: file.to_string(),
        scope: scope.qualified_name.clone(),
        kind: scope.kind,
        line: scope.span.start_line,
        score: scope.score,
        exceeds: scope.score > threshold,
        details,
    }
}

fn summarize(scopes: &[JsonScope], outcomes: &[FileOutcome]) -> JsonSummary {
    let max_score = scopes.iter().map(|s| s.score).max().unwrap_or(0);
    let average_score = if scopes.is_empty() {
        0.0
    } else {
        scopes.iter().map(|s| s.score as f64).sum::<f64>() / scopes.len() as f64
    };
    JsonSummary {
        scopes: scopes.len(),
        max_score,
        average_score,
        over_threshold: scopes.iter().filter(|s| s.exceeds).count(),
        parse_errors: outcomes.iter().filter(|o| o.result.is_err()).count(),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, outcomes: &[FileOutcome], threshold: u32, show_details: bool) {
    // Header
    println!();
    print!("  ");
    print!("{}", "cycloscope".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    print!("  {}", "Threshold: ".dimmed());
    println!("{}", threshold);
    println!();

    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => write_file_report(outcome, report, threshold, show_details),
            Err(err) => {
                print!("  {} ", "ERROR".red());
                println!("{}", err);
            }
        }
    }
    println!();

    write_final_status(outcomes, threshold);
    println!();
}

fn write_file_report(
    outcome: &FileOutcome,
    report: &ComplexityReport,
    threshold: u32,
    show_details: bool,
) {
    println!(
        "  {} {}",
        outcome.path.blue(),
        format!("({})", outcome.language).dimmed()
    );

    for scope in &report.scopes {
        print!("    {:<40}", scope.qualified_name);
        write_colored_score(scope.score, threshold);
        print!("  {}", format!("line {}", scope.span.start_line).dimmed());
        if scope.score > threshold {
            print!("  {}", "✗ over threshold".red());
        }
        println!();

        if show_details {
            for event in &scope.decision_events {
                println!(
                    "      {} {}",
                    format!("+{}", event.weight).dimmed(),
                    format!("{} (line {})", event.label, event.span.start_line).dimmed()
                );
            }
        }
    }

    for err in &report.errors {
        println!("    {} {}: {}", "ERROR".red(), err.scope, err.message);
    }
    for warn in &report.warnings {
        println!(
            "    {} unknown construct `{}` in {} at line {}",
            "WARN ".yellow(),
            warn.construct,
            warn.scope,
            warn.span.start_line
        );
    }
    println!();
}

fn write_colored_score(score: u32, threshold: u32) {
    match score {
        s if s > threshold => print!("{}", s.to_string().red().bold()),
        s if s > 10 => print!("{}", s.to_string().yellow().bold()),
        s if s > 5 => print!("{}", s.to_string().yellow()),
        s => print!("{}", s.to_string().green()),
    }
}

fn write_final_status(outcomes: &[FileOutcome], threshold: u32) {
    let scope_count: usize = outcomes
        .iter()
        .filter_map(FileOutcome::report)
        .map(|r| r.scopes.len())
        .sum();
    let over: usize = outcomes
        .iter()
        .filter_map(FileOutcome::report)
        .flat_map(|r| r.scopes.iter())
        .filter(|s| s.score > threshold)
        .count();
    let parse_errors = outcomes.iter().filter(|o| o.result.is_err()).count();

    print!(
        "  {}",
        format!(
            "{} scopes in {} files ({} parse errors)",
            scope_count,
            outcomes.len(),
            parse_errors
        )
        .dimmed()
    );
    print!("  ");
    if over == 0 && parse_errors == 0 {
        print!("{}", "PASSED".green());
    } else if over > 0 {
        print!("{}", format!("FAILED ({} over threshold)", over).red());
    } else {
        print!("{}", "FAILED (parse errors)".red());
    }
    println!();
}

/// Print the effective rule table, one row per kind.
pub fn write_rule_table(rules: &RuleTable) {
    println!();
    println!("  {}", "Decision-point weights".bold());
    println!();
    for (id, rule) in rules.entries() {
        println!("    {:<24} {:>2}  {}", id, rule.weight, rule.label.dimmed());
    }
    println!();
}
