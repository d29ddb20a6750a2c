//! Language-neutral syntax model consumed by the complexity engine.
//!
//! Frontends in `crate::lang` lower a tree-sitter parse tree into this
//! model. The engine never touches tree-sitter types directly: it sees a
//! tree of [`SyntaxNode`]s with a closed [`ConstructKind`] tag and a source
//! [`Span`] per node, which is all that scope delimitation and decision
//! classification need.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }

    /// Whether `other` lies entirely within this span (byte ranges).
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// Whether two spans cover exactly the same byte range.
    pub fn same_extent(&self, other: &Span) -> bool {
        self.start_byte == other.start_byte && self.end_byte == other.end_byte
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Kind tag for a lowered syntax node.
///
/// The set is closed for everything the engine knows how to classify;
/// `Unrecognized` carries the raw grammar tag for anything a frontend
/// could not map, so the rule-table lookup stays exhaustive and unknown
/// constructs degrade to a warning instead of a misclassification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructKind {
    /// Synthetic root for a source unit; owns module-level statements.
    Module,
    /// Named function definition.
    FunctionDef,
    /// `async` function definition.
    AsyncFunctionDef,
    /// Anonymous function (Python lambda, JS arrow/function expression).
    Lambda,
    /// Class definition. A namespace, not a scorable scope.
    ClassDef,
    /// Decorator attached to a definition. Opaque: metadata only.
    Decorator,
    /// `if` or `elif`/`else if` clause. The terminal `else` is a `Block`.
    IfClause,
    /// `for`/`while`/`do` loop header.
    LoopHeader,
    /// Protected `try` block (its handlers carry the weight).
    TryBlock,
    /// `except`/`catch` clause, bare catch-all included.
    ExceptHandler,
    /// One short-circuit boolean operator (`and`/`or`, `&&`/`||`).
    BooleanOp,
    /// Ternary / conditional expression.
    Ternary,
    /// Filter clause inside a comprehension or generator expression.
    ComprehensionFilter,
    /// Pattern-match / switch arm beyond the first.
    MatchArm,
    /// Resource-acquisition construct (`with`).
    With,
    /// Suspension point (`yield`); marks the enclosing function a generator.
    Yield,
    /// Structural container with no decision semantics of its own.
    Block,
    /// Grammar tag the frontend could not map.
    Unrecognized(String),
}

impl ConstructKind {
    /// Stable identifier used by the rule table and by configuration
    /// overrides. `None` for structural kinds that are never decision
    /// candidates.
    pub fn rule_id(&self) -> Option<&'static str> {
        match self {
            ConstructKind::IfClause => Some("if_clause"),
            ConstructKind::LoopHeader => Some("loop_header"),
            ConstructKind::TryBlock => Some("try_block"),
            ConstructKind::ExceptHandler => Some("except_handler"),
            ConstructKind::BooleanOp => Some("boolean_op"),
            ConstructKind::Ternary => Some("ternary"),
            ConstructKind::ComprehensionFilter => Some("comprehension_filter"),
            ConstructKind::MatchArm => Some("match_arm"),
            ConstructKind::With => Some("with_block"),
            ConstructKind::Yield => Some("yield_point"),
            ConstructKind::Module
            | ConstructKind::FunctionDef
            | ConstructKind::AsyncFunctionDef
            | ConstructKind::Lambda
            | ConstructKind::ClassDef
            | ConstructKind::Decorator
            | ConstructKind::Block
            | ConstructKind::Unrecognized(_) => None,
        }
    }

    /// Display name: the rule id where one exists, the structural name
    /// otherwise, the raw grammar tag for unrecognized kinds.
    pub fn name(&self) -> &str {
        if let Some(id) = self.rule_id() {
            return id;
        }
        match self {
            ConstructKind::Module => "module",
            ConstructKind::FunctionDef => "function_def",
            ConstructKind::AsyncFunctionDef => "async_function_def",
            ConstructKind::Lambda => "lambda",
            ConstructKind::ClassDef => "class_def",
            ConstructKind::Decorator => "decorator",
            ConstructKind::Block => "block",
            ConstructKind::Unrecognized(tag) => tag,
            _ => unreachable!("kinds with a rule id are handled above"),
        }
    }

    /// Whether this node introduces a complexity-bearing scope.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            ConstructKind::FunctionDef | ConstructKind::AsyncFunctionDef | ConstructKind::Lambda
        )
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One node of the lowered tree.
///
/// Frontends splice purely structural grammar nodes, so the tree carries
/// only scope-bearing and decision-bearing nodes plus the blocks that hold
/// them. Built once per file, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: ConstructKind,
    pub span: Span,
    /// Construct-specific text: definition name, operator, handler type,
    /// decorator expression.
    pub detail: Option<String>,
    /// Children in source order.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: ConstructKind, span: Span) -> Self {
        Self {
            kind,
            span,
            detail: None,
            children: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }
}

/// Kind of complexity-bearing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Function,
    AsyncFunction,
    Generator,
    Lambda,
    Method,
    StaticMethod,
    ClassMethod,
    Module,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Function => "function",
            ScopeKind::AsyncFunction => "async function",
            ScopeKind::Generator => "generator",
            ScopeKind::Lambda => "lambda",
            ScopeKind::Method => "method",
            ScopeKind::StaticMethod => "static method",
            ScopeKind::ClassMethod => "class method",
            ScopeKind::Module => "module",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
