//! Python frontend using tree-sitter.
//!
//! Lowering notes:
//! - `elif` clauses lower to their own `IfClause`; terminal `else`,
//!   `finally`, and loop-`else` clauses are plain blocks.
//! - The comprehension guard kind (`if_clause`) lowers to
//!   `ComprehensionFilter`; a `case` guard shares that grammar kind and is
//!   lowered in context as a real conditional clause.
//! - The first `case` arm of a `match` lowers to a plain block so arm
//!   counting stays a rule-table lookup.
//! - Decorators lower to opaque leaves carrying their expression text.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::engine::AnalysisError;
use crate::syntax::{ConstructKind, Span, SyntaxNode};

use super::{has_keyword, is_first_arm, node_text, LanguageFrontend, MAX_LOWERING_DEPTH};

pub struct PythonFrontend {
    language: Language,
}

impl PythonFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }
}

impl Default for PythonFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageFrontend for PythonFrontend {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
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
/// ones above) lowers to `Unrecognized` so the engine can warn.
const STRUCTURAL_STATEMENTS: &[&str] = &[
    "expression_statement",
    "return_statement",
    "pass_statement",
    "break_statement",
    "continue_statement",
    "import_statement",
    "import_from_statement",
    "future_import_statement",
    "raise_statement",
    "assert_statement",
    "delete_statement",
    "global_statement",
    "nonlocal_statement",
    "exec_statement",
    "print_statement",
    "type_alias_statement",
    "match_statement",
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
            "function_definition" => {
                out.push(self.lower_function(node, depth, Vec::new())?);
            }
            "decorated_definition" => self.lower_decorated(node, depth, out)?,
            "lambda" => {
                out.push(
                    SyntaxNode::new(ConstructKind::Lambda, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "class_definition" => {
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
            "elif_clause" => {
                out.push(
                    SyntaxNode::new(ConstructKind::IfClause, span)
                        .with_detail("elif")
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "else_clause" | "finally_clause" => {
                out.push(
                    SyntaxNode::new(ConstructKind::Block, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "for_statement" => {
                out.push(
                    SyntaxNode::new(ConstructKind::LoopHeader, span)
                        .with_detail("for")
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "while_statement" => {
                out.push(
                    SyntaxNode::new(ConstructKind::LoopHeader, span)
                        .with_detail("while")
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "try_statement" => {
                out.push(
                    SyntaxNode::new(ConstructKind::TryBlock, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "except_clause" | "except_group_clause" => {
                out.push(
                    SyntaxNode::new(ConstructKind::ExceptHandler, span)
                        .with_detail(self.except_label(node))
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "boolean_operator" => {
                let op = node.child_by_field_name("operator");
                let op_span = op.map(Span::from_node).unwrap_or(span);
                let mut sn = SyntaxNode::new(ConstructKind::BooleanOp, op_span)
                    .with_children(self.lower_children(node, depth + 1)?);
                if let Some(op) = op {
                    sn = sn.with_detail(self.text(op));
                }
                out.push(sn);
            }
            "conditional_expression" => {
                out.push(
                    SyntaxNode::new(ConstructKind::Ternary, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            // Comprehension guard. Case guards share this grammar kind but
            // are lowered by lower_case before generic dispatch sees them.
            "if_clause" => {
                out.push(
                    SyntaxNode::new(ConstructKind::ComprehensionFilter, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "case_clause" => out.push(self.lower_case(node, depth)?),
            "with_statement" => {
                out.push(
                    SyntaxNode::new(ConstructKind::With, span)
                        .with_children(self.lower_children(node, depth + 1)?),
                );
            }
            "yield" => {
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
            // Everything else is structural: splice its children.
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
        decorators: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode, AnalysisError> {
        let kind = if has_keyword(node, "async") {
            ConstructKind::AsyncFunctionDef
        } else {
            ConstructKind::FunctionDef
        };
        let mut children = decorators;
        children.extend(self.lower_children(node, depth + 1)?);
        let mut sn = SyntaxNode::new(kind, Span::from_node(node)).with_children(children);
        if let Some(name) = node.child_by_field_name("name") {
            sn = sn.with_detail(self.text(name));
        }
        Ok(sn)
    }

    fn lower_decorated(
        &self,
        node: Node,
        depth: usize,
        out: &mut Vec<SyntaxNode>,
    ) -> Result<(), AnalysisError> {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "decorator" => {
                    let text = self.text(child).trim_start_matches('@').trim().to_string();
                    decorators.push(
                        SyntaxNode::new(ConstructKind::Decorator, Span::from_node(child))
                            .with_detail(text),
                    );
                }
                "function_definition" => {
                    out.push(self.lower_function(child, depth, std::mem::take(&mut decorators))?);
                }
                _ => {
                    decorators.clear();
                    self.lower_into(child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }

    fn lower_case(&self, node: Node, depth: usize) -> Result<SyntaxNode, AnalysisError> {
        let kind = if is_first_arm(node, &["case_clause"]) {
            ConstructKind::Block
        } else {
            ConstructKind::MatchArm
        };
        let guard = node.child_by_field_name("guard");
        let mut children = Vec::new();
        let mut cursor = node.walk();
        let named: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in named {
            if guard.map_or(false, |g| g.id() == child.id()) {
                children.push(
                    SyntaxNode::new(ConstructKind::IfClause, Span::from_node(child))
                        .with_detail("guard")
                        .with_children(self.lower_children(child, depth + 1)?),
                );
            } else {
                self.lower_into(child, depth + 1, &mut children)?;
            }
        }
        Ok(SyntaxNode::new(kind, Span::from_node(node)).with_children(children))
    }

    fn except_label(&self, node: Node) -> String {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "block" {
                return format!("except {}", self.text(child));
            }
        }
        "bare except".to_string()
    }
}
