//! Tests for the JSON output structure.
//!
//! These verify the serialized shape consumers depend on: stable field
//! names, empty-collection elision, and threshold bookkeeping.

use std::path::PathBuf;

use cycloscope::engine::{analyze, RuleTable};
use cycloscope::lang;
use cycloscope::report::{JsonReport, JsonScope, JsonSummary};
use cycloscope::syntax::ScopeKind;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Build a JsonReport over one fixture the way the CLI does.
fn fixture_json(threshold: u32) -> JsonReport {
    lang::register_frontends();
    let path = testdata_path().join("samples.py");
    let source = std::fs::read(&path).expect("fixture should be readable");
    let frontend = lang::get_frontend("py").expect("python frontend registered");
    let root = frontend.parse(&path, &source).expect("fixture should parse");
    let report = analyze(&root, &RuleTable::mccabe());

    let scopes: Vec<JsonScope> = report
        .scopes
        .iter()
        .map(|s| JsonScope {
            file: path.to_string_lossy().to_string(),
            scope: s.qualified_name.clone(),
            kind: s.kind,
            line: s.span.start_line,
            score: s.score,
            exceeds: s.score > threshold,
            details: Vec::new(),
        })
        .collect();

    let max_score = scopes.iter().map(|s| s.score).max().unwrap_or(0);
    let average_score =
        scopes.iter().map(|s| s.score as f64).sum::<f64>() / scopes.len() as f64;
    let over_threshold = scopes.iter().filter(|s| s.exceeds).count();
    let summary = JsonSummary {
        scopes: scopes.len(),
        max_score,
        average_score,
        over_threshold,
        parse_errors: 0,
    };

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string_lossy().to_string(),
        threshold,
        passed: over_threshold == 0,
        files_scanned: 1,
        scopes,
        errors: Vec::new(),
        warnings: Vec::new(),
        summary,
    }
}

#[test]
fn test_json_field_names_are_stable() {
    let report = fixture_json(10);
    let json = serde_json::to_string_pretty(&report).unwrap();

    assert!(json.contains("\"version\""));
    assert!(json.contains("\"threshold\""));
    assert!(json.contains("\"passed\""));
    assert!(json.contains("\"files_scanned\""));
    assert!(json.contains("\"scopes\""));
    assert!(json.contains("\"summary\""));
    assert!(json.contains("\"max_score\""));
    assert!(json.contains("\"average_score\""));
}

#[test]
fn test_empty_errors_and_warnings_are_elided() {
    let report = fixture_json(10);
    let json = serde_json::to_string(&report).unwrap();

    assert!(!json.contains("\"errors\""));
    assert!(!json.contains("\"warnings\""));
    assert!(!json.contains("\"details\""));
}

#[test]
fn test_scope_kind_serializes_snake_case() {
    let report = fixture_json(10);
    let json = serde_json::to_string(&report).unwrap();

    assert!(json.contains("\"static_method\""));
    assert!(json.contains("\"generator\""));
    assert!(json.contains("\"module\""));
}

#[test]
fn test_threshold_marks_exceeding_scopes() {
    let relaxed = fixture_json(10);
    assert!(relaxed.passed);
    assert_eq!(relaxed.summary.over_threshold, 0);

    let strict = fixture_json(1);
    assert!(!strict.passed);
    assert!(strict.summary.over_threshold > 0);
    let flagged: Vec<&JsonScope> = strict.scopes.iter().filter(|s| s.exceeds).collect();
    assert!(flagged.iter().all(|s| s.score > 1));
}

#[test]
fn test_json_round_trips() {
    let report = fixture_json(10);
    let json = serde_json::to_string(&report).unwrap();
    let back: JsonReport = serde_json::from_str(&json).unwrap();

    assert_eq!(back.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(back.scopes.len(), report.scopes.len());
    assert_eq!(back.summary.max_score, report.summary.max_score);
    assert!(back
        .scopes
        .iter()
        .any(|s| s.scope == "Queue.describe" && s.kind == ScopeKind::StaticMethod));
}
