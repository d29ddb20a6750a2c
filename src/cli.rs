//! Command-line interface for cycloscope.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::{analyze, AnalysisError, RuleOverrides, RuleTable};
use crate::lang;
use crate::report::{self, FileOutcome};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Per-scope score ceiling when none is given.
const DEFAULT_MAX_COMPLEXITY: u32 = 10;

/// Cyclomatic complexity analyzer for Python, JavaScript, and C.
///
/// Cycloscope scores every function, method, lambda, and module body by
/// counting decision points: a scope starts at 1 and each branch, loop,
/// handler, boolean operator, and match arm beyond the first adds its
/// configured weight.
#[derive(Parser)]
#[command(name = "cycloscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score decision-point complexity for a file or directory
    #[command(visible_alias = "run")]
    Analyze(AnalyzeArgs),
    /// Print the effective decision-point weight table
    Rules(RulesArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Maximum acceptable per-scope score (exit non-zero if exceeded)
    #[arg(short, long, default_value_t = DEFAULT_MAX_COMPLEXITY)]
    pub max_complexity: u32,

    /// YAML file overriding decision-point weights
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Count comprehension filters as decision points
    #[arg(long)]
    pub count_comprehension_filters: bool,

    /// List every decision point under its scope
    #[arg(long)]
    pub details: bool,

    /// Include files in test directories
    #[arg(long)]
    pub include_tests: bool,
}

/// Arguments for the rules command.
#[derive(Parser)]
pub struct RulesArgs {
    /// YAML file overriding decision-point weights
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Count comprehension filters as decision points
    #[arg(long)]
    pub count_comprehension_filters: bool,
}

/// Resolve the rule table from defaults plus file and flag overrides.
fn build_rule_table(
    rules_path: Option<&Path>,
    count_comprehension_filters: bool,
) -> anyhow::Result<RuleTable> {
    let mut overrides = match rules_path {
        Some(path) => RuleOverrides::parse_file(path)?,
        None => RuleOverrides::default(),
    };
    if count_comprehension_filters {
        overrides.set("comprehension_filter", 1);
    }
    Ok(RuleTable::with_overrides(&overrides)?)
}

/// Collect analyzable files under `root`.
fn collect_files(root: &Path, include_tests: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            // The walk root is never pruned; name filters apply to
            // entries below it.
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            // Skip vendor and build-output directories
            if e.file_type().is_dir()
                && (name == "vendor" || name == "node_modules" || name == "__pycache__")
            {
                return false;
            }
            // Skip test directories unless explicitly included
            if !include_tests
                && e.file_type().is_dir()
                && (name == "tests"
                    || name == "test"
                    || name == "testdata"
                    || name == "__tests__")
            {
                return false;
            }
            true
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if lang::get_frontend(ext).is_none() {
            continue;
        }
        if !include_tests && is_test_file(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    // Deterministic order regardless of directory walk order.
    files.sort();
    Ok(files)
}

fn is_test_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with(".test")
        || stem.ends_with(".spec")
}

/// Parse and score one file.
fn analyze_file(path: &Path, rules: &RuleTable) -> FileOutcome {
    let path_str = path.to_string_lossy().to_string();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    // collect_files only passes paths a frontend claims.
    let frontend = match lang::get_frontend(ext) {
        Some(f) => f,
        None => {
            return FileOutcome {
                path: path_str.clone(),
                language: "unknown",
                result: Err(AnalysisError::Parse {
                    path: path_str,
                    message: format!("no frontend for extension {:?}", ext),
                }),
            }
        }
    };

    let result = match std::fs::read(path) {
        Ok(source) => frontend
            .parse(path, &source)
            .map(|root| analyze(&root, rules)),
        Err(e) => Err(AnalysisError::Io {
            path: path_str.clone(),
            message: e.to_string(),
        }),
    };

    FileOutcome {
        path: path_str,
        language: frontend.language_id(),
        result,
    }
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    lang::register_frontends();

    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let rules = match build_rule_table(args.rules.as_deref(), args.count_comprehension_filters) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = if metadata.is_dir() {
        collect_files(&args.path, args.include_tests)?
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!("Warning: no files to analyze");
        return Ok(EXIT_SUCCESS);
    }

    let mut outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|file| analyze_file(file, &rules))
        .collect();
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &outcomes, args.max_complexity, args.details)?,
        _ => report::write_pretty(&path_str, &outcomes, args.max_complexity, args.details),
    }

    let failed = outcomes.iter().any(|o| o.result.is_err())
        || !report::within_threshold(&outcomes, args.max_complexity);
    if failed {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the rules command.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let rules = match build_rule_table(args.rules.as_deref(), args.count_comprehension_filters) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    report::write_rule_table(&rules);
    Ok(EXIT_SUCCESS)
}
