//! JavaScript frontend using tree-sitter.
//!
//! Lowering notes:
//! - `else if` is a nested `if_statement` in the grammar, so each `if`
//!   keyword becomes its own `IfClause` without special handling.
//! - Function expressions and arrow functions take their name from the
//!   enclosing declarator, assignment, or object key when one exists.
//! - Only `&&` and `||` lower to `BooleanOp`; `??` selects a value rather
//!   than guarding a branch and stays transparent.
//! - The first `case` of a `switch` lowers to a plain block; later cases
//!   and `default` are `MatchArm`s.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::engine::AnalysisError;
use crate::syntax::{ConstructKind, Span, SyntaxNode};

use super::{has_keyword, is_first_arm, node_text, LanguageFrontend, MAX_LOWERING_DEPTH};

pub struct JavaScriptFrontend {
    language: Language,
}

impl JavaScriptFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

impl Default for JavaScriptFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageFrontend for JavaScriptFrontend {
    fn language_id(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> Result<SyntaxNode, AnalysisError> {
        let path_str = path.to_string_lossy().to_string();
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| AnalysisError::Parse {
                path: path_str.clone(),
                message: e.to_string(),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::Parse {
                path: path_str.clone(),
                message: "tree-sitter returned no tree".to_string(),
            })?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(AnalysisError::Parse {
                path: path_str,
                message: "source contains syntax errors".to_string(),
            });
        }

        let lower = Lower {
            source,
            path: path_str,
        };
        let children = lower.lower_children(root, 1)?;
        Ok(SyntaxNode::new(ConstructKind::Module, Span::from_node(root)).with_children(children))
    }
}

/// Statement kinds with no control-flow meaning; their children splice
/// into the parent. A statement kind outside this list (and the handled
/// ones above) lowers to `Unrecognized` so the engine can warn; `with`
/// blocks land there deliberately, since their dynamic scoping defeats
/// static classification.
const STRUCTURAL_STATEMENTS: &[&str] = &[
    "expression_statement",
    "return_statement",
    "break_statement",
    "continue_statement",
    "throw_statement",
    "empty_statement",
    "debugger_statement",
    "labeled_statement",
    "switch_statement",
    "import_statement",
    "export_statement",
];

struct Lower<'a> {
    source: &'a [u8],
    path: String,
}

impl Lower<'_> {
    fn text(&self, node: Node) -> &str {
        node_text(node, self.source)
    }

    fn too_deep(&self) -> AnalysisError {
        AnalysisError::Parse {
            path: self.path.clone(),
            message: format!("nesting deeper than {} during lowering", MAX_LOWERING_DEPTH),
        }
    }

    fn lower_children(&self, node: Node, depth: usize) -> Result<Vec<SyntaxNode>, AnalysisError> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.lower_into(child, depth, &mut out)?;
        }
        Ok(out)
    }

    fn lower_into(
        &self,
        node: Node,
        depth: usize,
        out: &mut Vec<SyntaxNode>,
    ) -> Result<(), AnalysisError> {
        if depth > MAX_LOWERING_DEPTH {
            return Err(self.too_deep());
        }
        let span = Span::from_node(node);
        match node.kind() {
            "comment" => {}
            "function_declaration" | "generator_function_declaration" => {
                out.push(self.lower_function(node, depth, None)?);
            }
            "function_expression" | "generator_function" | "arrow_function" => {
                out.push(self.lower_function(node, depth, self.inferred_name(node))?);
            }
            "method_definition" => {
                let mut decorators = Vec::new();
                if has_keyword(node, "static") {
                    decorators.push(
                        SyntaxNode::new(ConstructKind::Decorator, span)
                            .with_detail("staticmethod"),
                    );
                }
                let kind = if has_keyword(node, "async") {
                    ConstructKind::AsyncFunctionDef
                } else {
                    ConstructKind::FunctionDef
                };
                let mut children = decorators;
                children.extend(self.lower_children(node, depth + 1)?);
                let mut sn = SyntaxNode::new(kind, span).with_children(children);
                if let Some(name) = node.child_by_field_name("name") {
                    sn = sn.with_detail(self.text(name));
                }
                out.push(sn);
            }
            "class_declaration" | "class" => {
                let mut sn = SyntaxNode::new(ConstructKind::ClassDef, span)
                    .with_children(self.lower_children(node, depth + 1)?);
                if let Some(name) = node.child_by_field_name("name") {
                    sn = sn.with_detail(self.text(name));
                }
                out.push(sn);
            }
            "if_statement" => {
                out.push(
                    SyntaxNode::new(ConstructKind::IfClause, span)
                        .with_detail("if")
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "for_statement" => self.push_loop(node, depth, "for", out)?,
            "for_in_statement" => {
                let detail = if has_keyword(node, "of") { "for-of" } else { "for-in" };
                self.push_loop(node, depth, detail, out)?;
            }
            "while_statement" => self.push_loop(node, depth, "while", out)?,
            "do_statement" => self.push_loop(node, depth, "do-while", out)?,
            "ternary_expression" => {
                out.push(
                    SyntaxNode::new(ConstructKind::Ternary, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "binary_expression" => {
                let op = node.child_by_field_name("operator");
                let op_text = op.map(|o| self.text(o).to_string()).unwrap_or_default();
                if op_text == "&&" || op_text == "||" {
                    let op_span = op.map(Span::from_node).unwrap_or(span);
                    out.push(
                        SyntaxNode::new(ConstructKind::BooleanOp, op_span)
                            .with_detail(op_text)
                            .with_children(self.lower_children(node, depth + 1)?),
                    );
                } else {
                    let mut cursor = node.walk();
                    for child in node.named_children(&mut cursor) {
                        self.lower_into(child, depth + 1, out)?;
                    }
                }
            }
            "try_statement" => {
                out.push(
                    SyntaxNode::new(ConstructKind::TryBlock, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "catch_clause" => {
                let detail = match node.child_by_field_name("parameter") {
                    Some(param) => format!("catch ({})", self.text(param)),
                    None => "catch".to_string(),
                };
                out.push(
                    SyntaxNode::new(ConstructKind::ExceptHandler, span)
                        .with_detail(detail)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "finally_clause" => {
                out.push(
                    SyntaxNode::new(ConstructKind::Block, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "switch_case" | "switch_default" => {
                let kind = if is_first_arm(node, &["switch_case", "switch_default"]) {
                    ConstructKind::Block
                } else {
                    ConstructKind::MatchArm
                };
                out.push(
                    SyntaxNode::new(kind, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "yield_expression" => {
                out.push(
                    SyntaxNode::new(ConstructKind::Yield, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            // A statement form the lowering does not know. Opaque: the
            // owning scope's visitor reports the warning.
            kind if kind.ends_with("_statement") && !STRUCTURAL_STATEMENTS.contains(&kind) => {
                out.push(SyntaxNode::new(
                    ConstructKind::Unrecognized(kind.to_string()),
                    span,
                ));
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.lower_into(child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }

    fn lower_function(
        &self,
        node: Node,
        depth: usize,
        inferred: Option<String>,
    ) -> Result<SyntaxNode, AnalysisError> {
        let kind = if has_keyword(node, "async") {
            ConstructKind::AsyncFunctionDef
        } else {
            ConstructKind::FunctionDef
        };
        let mut sn = SyntaxNode::new(kind, Span::from_node(node))
            .with_children(self.lower_children(node, depth + 1)?);
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .or(inferred);
        if let Some(name) = name {
            sn = sn.with_detail(name);
        }
        Ok(sn)
    }

    fn push_loop(
        &self,
        node: Node,
        depth: usize,
        detail: &str,
        out: &mut Vec<SyntaxNode>,
    ) -> Result<(), AnalysisError> {
        out.push(
            SyntaxNode::new(ConstructKind::LoopHeader, Span::from_node(node))
                .with_detail(detail)
                .with_children(self.lower_children(node, depth + 1)?),
        );
        Ok(())
    }

    /// Name an anonymous function from the construct it is bound to, if any.
    fn inferred_name(&self, node: Node) -> Option<String> {
        let parent = node.parent()?;
        match parent.kind() {
            "variable_declarator" => parent
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
            "assignment_expression" => parent
                .child_by_field_name("left")
                .map(|n| self.text(n).to_string()),
            "pair" => parent
                .child_by_field_name("key")
                .map(|n| self.text(n).to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{analyze, ComplexityReport, RuleTable};
    use crate::syntax::ScopeKind;

    fn report(source: &str) -> ComplexityReport {
        let frontend = JavaScriptFrontend::new();
        let root = frontend
            .parse(Path::new("test.js"), source.as_bytes())
            .unwrap();
        analyze(&root, &RuleTable::mccabe())
    }

    fn score_of(report: &ComplexityReport, name: &str) -> u32 {
        report
            .scopes
            .iter()
            .find(|s| s.qualified_name == name)
            .unwrap_or_else(|| panic!("no scope named {}", name))
            .score
    }

    #[test]
    fn test_plain_function_scores_one() {
        let r = report("function f() { return 42; }\n");
        assert_eq!(score_of(&r, "f"), 1);
    }

    #[test]
    fn test_else_if_chain_counts_each_if() {
        let src = r#"
function classify(x) {
    if (x > 0) {
        return "positive";
    } else if (x < 0) {
        return "negative";
    } else {
        return "zero";
    }
}
"#;
        assert_eq!(score_of(&report(src), "classify"), 3);
    }

    #[test]
    fn test_loop_variants() {
        let src = r#"
function walk(items) {
    for (let i = 0; i < items.length; i++) {}
    for (const item of items) {}
    while (items.pop()) {}
    do { items.shift(); } while (items.length);
}
"#;
        let r = report(src);
        assert_eq!(score_of(&r, "walk"), 5);
        let labels: Vec<&str> = r.scopes
            .iter()
            .find(|s| s.qualified_name == "walk")
            .unwrap()
            .decision_events
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, vec!["for loop", "for-of loop", "while loop", "do-while loop"]);
    }

    #[test]
    fn test_boolean_operators_count_nullish_does_not() {
        let src = "function f(a, b, c) { return (a && b) || (c ?? 0); }\n";
        assert_eq!(score_of(&report(src), "f"), 3);
    }

    #[test]
    fn test_ternary_scores_two() {
        let src = "function f(x) { return x > 0 ? x : -x; }\n";
        assert_eq!(score_of(&report(src), "f"), 2);
    }

    #[test]
    fn test_switch_arms_beyond_first() {
        let src = r#"
function dispatch(cmd) {
    switch (cmd) {
        case "start": return 1;
        case "stop": return 2;
        default: return 0;
    }
}
"#;
        // Three arms: first case is free, second case and default count.
        assert_eq!(score_of(&report(src), "dispatch"), 3);
    }

    #[test]
    fn test_catch_counts_try_does_not() {
        let src = r#"
function f() {
    try {
        return risky();
    } catch (e) {
        return null;
    } finally {
        cleanup();
    }
}
"#;
        let r = report(src);
        assert_eq!(score_of(&r, "f"), 2);
        let events = &r.scopes.iter().find(|s| s.qualified_name == "f").unwrap().decision_events;
        assert_eq!(events[0].label, "catch (e)");
    }

    #[test]
    fn test_arrow_function_named_from_declarator() {
        let src = "const check = (x) => x > 0 && x < 5;\n";
        let r = report(src);
        assert_eq!(score_of(&r, "check"), 2);
        assert_eq!(score_of(&r, "<module>"), 1);
    }

    #[test]
    fn test_anonymous_callback_scope() {
        let src = "items.forEach(function (item) { if (item) { go(item); } });\n";
        let r = report(src);
        assert_eq!(score_of(&r, "<anonymous>"), 2);
    }

    #[test]
    fn test_class_methods_are_scopes_class_is_not() {
        let src = r#"
class Worker {
    process(job) {
        if (!job) {
            return null;
        }
        return job.run();
    }

    static idle() {
        return true;
    }
}
"#;
        let r = report(src);
        assert_eq!(score_of(&r, "Worker.process"), 2);
        let kind_of = |name: &str| {
            r.scopes
                .iter()
                .find(|s| s.qualified_name == name)
                .unwrap()
                .kind
        };
        assert_eq!(kind_of("Worker.process"), ScopeKind::Method);
        assert_eq!(kind_of("Worker.idle"), ScopeKind::StaticMethod);
        assert!(r.scopes.iter().all(|s| s.qualified_name != "Worker"));
    }

    #[test]
    fn test_generator_method_yields() {
        let src = r#"
function* evens(items) {
    for (const item of items) {
        if (item % 2 === 0) {
            yield item;
        }
    }
}
"#;
        let r = report(src);
        assert_eq!(score_of(&r, "evens"), 3);
        let scope = r.scopes.iter().find(|s| s.qualified_name == "evens").unwrap();
        assert_eq!(scope.kind, ScopeKind::Generator);
    }

    #[test]
    fn test_nested_function_boundary() {
        let src = r#"
function outer() {
    const inner = () => {
        if (ready()) {
            return 1;
        }
        return 0;
    };
    return inner;
}
"#;
        let r = report(src);
        assert_eq!(score_of(&r, "outer"), 1);
        assert_eq!(score_of(&r, "outer.inner"), 2);
    }

    #[test]
    fn test_with_block_surfaces_as_unknown_construct() {
        let src = r#"
function f(o) {
    with (o) {
        go();
    }
    return 1;
}
"#;
        let r = report(src);
        // Unknown constructs weigh zero and warn; the score is unaffected.
        assert_eq!(score_of(&r, "f"), 1);
        assert_eq!(r.warnings.len(), 1);
        assert_eq!(r.warnings[0].construct, "with_statement");
        assert_eq!(r.warnings[0].scope, "f");
    }

    #[test]
    fn test_parse_error_is_file_level() {
        let frontend = JavaScriptFrontend::new();
        let err = frontend
            .parse(Path::new("bad.js"), b"function broken( {\n")
            .unwrap_err();
        assert!(err.to_string().contains("bad.js"));
    }
}
