//! End-to-end analysis tests over the fixture files in testdata/.
//!
//! Each fixture exercises one language frontend through the full
//! parse-extract-visit-score pipeline.

use std::path::PathBuf;

use cycloscope::engine::{analyze, RuleOverrides, RuleTable};
use cycloscope::lang;
use cycloscope::syntax::ScopeKind;
use cycloscope::ComplexityReport;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn analyze_fixture(name: &str, rules: &RuleTable) -> ComplexityReport {
    lang::register_frontends();
    let path = testdata_path().join(name);
    let source = std::fs::read(&path).expect("fixture should be readable");
    let ext = path.extension().unwrap().to_str().unwrap();
    let frontend = lang::get_frontend(ext).expect("fixture extension should be supported");
    let root = frontend.parse(&path, &source).expect("fixture should parse");
    analyze(&root, rules)
}

fn score_of(report: &ComplexityReport, name: &str) -> u32 {
    report
        .scopes
        .iter()
        .find(|s| s.qualified_name == name)
        .unwrap_or_else(|| panic!("no scope named {}", name))
        .score
}

fn kind_of(report: &ComplexityReport, name: &str) -> ScopeKind {
    report
        .scopes
        .iter()
        .find(|s| s.qualified_name == name)
        .unwrap_or_else(|| panic!("no scope named {}", name))
        .kind
}

#[test]
fn test_python_fixture_scores() {
    let report = analyze_fixture("samples.py", &RuleTable::mccabe());

    // Module-level if/else counts toward the module scope.
    assert_eq!(score_of(&report, "<module>"), 2);
    assert_eq!(score_of(&report, "constant"), 1);
    assert_eq!(score_of(&report, "clamp"), 3);
    assert_eq!(score_of(&report, "total"), 3);
    // try and with are free; the two handlers count.
    assert_eq!(score_of(&report, "load"), 3);
    assert_eq!(score_of(&report, "pick"), 2);
    // Comprehension filters are free by default.
    assert_eq!(score_of(&report, "valid_names"), 1);
    assert_eq!(score_of(&report, "Queue.__init__"), 1);
    assert_eq!(score_of(&report, "Queue.push"), 2);
    assert_eq!(score_of(&report, "Queue.describe"), 1);
    assert_eq!(score_of(&report, "evens"), 3);

    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_python_fixture_scope_kinds() {
    let report = analyze_fixture("samples.py", &RuleTable::mccabe());

    assert_eq!(kind_of(&report, "<module>"), ScopeKind::Module);
    assert_eq!(kind_of(&report, "constant"), ScopeKind::Function);
    assert_eq!(kind_of(&report, "Queue.push"), ScopeKind::Method);
    assert_eq!(kind_of(&report, "Queue.describe"), ScopeKind::StaticMethod);
    assert_eq!(kind_of(&report, "evens"), ScopeKind::Generator);
}

#[test]
fn test_comprehension_filter_override() {
    let mut overrides = RuleOverrides::default();
    overrides.set("comprehension_filter", 1);
    let rules = RuleTable::with_overrides(&overrides).unwrap();

    let report = analyze_fixture("samples.py", &rules);
    assert_eq!(score_of(&report, "valid_names"), 2);
    // Scores elsewhere are unchanged.
    assert_eq!(score_of(&report, "clamp"), 3);
}

#[test]
fn test_javascript_fixture_scores() {
    let report = analyze_fixture("samples.js", &RuleTable::mccabe());

    assert_eq!(score_of(&report, "<module>"), 1);
    assert_eq!(score_of(&report, "constant"), 1);
    assert_eq!(score_of(&report, "clamp"), 3);
    // Three switch arms: the first is free.
    assert_eq!(score_of(&report, "describe"), 3);
    assert_eq!(score_of(&report, "inRange"), 2);
    assert_eq!(score_of(&report, "parse"), 2);
    assert_eq!(score_of(&report, "Queue.constructor"), 1);
    assert_eq!(score_of(&report, "Queue.push"), 2);
    assert_eq!(score_of(&report, "evens"), 3);
    assert_eq!(kind_of(&report, "evens"), ScopeKind::Generator);
}

#[test]
fn test_c_fixture_scores() {
    let report = analyze_fixture("samples.c", &RuleTable::mccabe());

    assert_eq!(score_of(&report, "<module>"), 1);
    assert_eq!(score_of(&report, "constant"), 1);
    assert_eq!(score_of(&report, "clamp"), 3);
    assert_eq!(score_of(&report, "count_matches"), 3);
    assert_eq!(score_of(&report, "describe"), 3);
    assert_eq!(score_of(&report, "in_range"), 2);
    assert_eq!(score_of(&report, "abs_val"), 2);
}

#[test]
fn test_scopes_are_reported_in_source_order() {
    let report = analyze_fixture("samples.py", &RuleTable::mccabe());
    assert_eq!(report.scopes[0].qualified_name, "<module>");

    let lines: Vec<usize> = report
        .scopes
        .iter()
        .skip(1)
        .map(|s| s.span.start_line)
        .collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let a = serde_json::to_string(&analyze_fixture("samples.py", &RuleTable::mccabe())).unwrap();
    let b = serde_json::to_string(&analyze_fixture("samples.py", &RuleTable::mccabe())).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_decision_events_are_in_source_order() {
    let report = analyze_fixture("samples.py", &RuleTable::mccabe());
    for scope in &report.scopes {
        let offsets: Vec<usize> = scope
            .decision_events
            .iter()
            .map(|e| e.span.start_byte)
            .collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted, "events out of order in {}", scope.qualified_name);
    }
}
