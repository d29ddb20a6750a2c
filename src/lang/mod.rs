//! Parser collaborators: tree-sitter frontends that lower source code
//! into the neutral syntax model the engine consumes.
//!
//! Each frontend parses one source unit with its tree-sitter grammar and
//! lowers the parse tree to [`SyntaxNode`]s, splicing purely structural
//! grammar nodes so the engine sees only scope- and decision-bearing
//! structure. The engine assumes the tree is free of syntax errors; a
//! tree-sitter tree containing ERROR nodes is rejected here as a
//! file-level parse error.
//!
//! # Adding a new language
//!
//! 1. Create a module here (e.g. `ruby.rs`) implementing
//!    [`LanguageFrontend`].
//! 2. Map the grammar's control-flow kinds onto `ConstructKind`, keeping
//!    the lowering conventions: operator-token spans for boolean
//!    operators, first match/switch arm lowered as a plain block.
//! 3. Register it below.

mod c;
mod javascript;
mod python;

pub use c::CFrontend;
pub use javascript::JavaScriptFrontend;
pub use python::PythonFrontend;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;

use crate::engine::AnalysisError;
use crate::syntax::SyntaxNode;

/// Lowering recursion bound. A tree deeper than this fails the whole file
/// as a parse error; the engine's scope-scoped guard handles everything
/// shallower.
pub(crate) const MAX_LOWERING_DEPTH: usize = 400;

/// A language-specific parser collaborator.
///
/// tree_sitter::Parser is not Sync, so implementations create a parser
/// per call rather than holding one.
pub trait LanguageFrontend: Send + Sync {
    /// Language identifier, e.g. "python".
    fn language_id(&self) -> &'static str;

    /// File extensions this frontend handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse one source unit and lower it to the neutral model.
    ///
    /// The returned root is always a `ConstructKind::Module` node spanning
    /// the whole unit.
    fn parse(&self, path: &Path, source: &[u8]) -> Result<SyntaxNode, AnalysisError>;

    /// Check if this frontend handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

/// Static storage for the Python frontend.
static PYTHON_FRONTEND: OnceCell<PythonFrontend> = OnceCell::new();

/// Static storage for the JavaScript frontend.
static JAVASCRIPT_FRONTEND: OnceCell<JavaScriptFrontend> = OnceCell::new();

/// Static storage for the C frontend.
static C_FRONTEND: OnceCell<CFrontend> = OnceCell::new();

/// Whether frontends have been registered.
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register all available language frontends.
///
/// Idempotent; call once at startup.
pub fn register_frontends() {
    if REGISTERED.swap(true, Ordering::SeqCst) {
        return;
    }
    PYTHON_FRONTEND.get_or_init(PythonFrontend::new);
    JAVASCRIPT_FRONTEND.get_or_init(JavaScriptFrontend::new);
    C_FRONTEND.get_or_init(CFrontend::new);
}

/// All registered frontends, in registration order.
fn frontends() -> Vec<&'static dyn LanguageFrontend> {
    register_frontends();

    let mut out: Vec<&'static dyn LanguageFrontend> = Vec::new();
    if let Some(f) = PYTHON_FRONTEND.get() {
        out.push(f);
    }
    if let Some(f) = JAVASCRIPT_FRONTEND.get() {
        out.push(f);
    }
    if let Some(f) = C_FRONTEND.get() {
        out.push(f);
    }
    out
}

/// Get a frontend for the given file extension. Dispatch consults each
/// frontend's own extension list; there is no second copy to drift.
pub fn get_frontend(ext: &str) -> Option<&'static dyn LanguageFrontend> {
    frontends().into_iter().find(|f| f.handles_extension(ext))
}

/// All file extensions with a registered frontend.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = frontends()
        .into_iter()
        .flat_map(|f| f.file_extensions().iter().copied())
        .collect();
    exts.sort_unstable();
    exts
}

/// Source text for a tree-sitter node.
pub(crate) fn node_text<'a>(node: tree_sitter::Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Whether a node carries the given anonymous keyword token (e.g. `async`,
/// `static`).
pub(crate) fn has_keyword(node: tree_sitter::Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    // The child iterator borrows the cursor; end the borrow before
    // returning.
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == keyword);
    found
}

/// Whether this node is the first arm among its `case`-like siblings.
/// Used to lower "1 per arm beyond the first": the first arm becomes a
/// plain block, so arm counting stays a table lookup.
pub(crate) fn is_first_arm(node: tree_sitter::Node, arm_kinds: &[&str]) -> bool {
    let mut prev = node.prev_named_sibling();
    while let Some(p) = prev {
        if arm_kinds.contains(&p.kind()) {
            return false;
        }
        prev = p.prev_named_sibling();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_dispatch_by_extension() {
        register_frontends();
        assert_eq!(get_frontend("py").unwrap().language_id(), "python");
        assert_eq!(get_frontend("js").unwrap().language_id(), "javascript");
        assert_eq!(get_frontend("mjs").unwrap().language_id(), "javascript");
        assert_eq!(get_frontend("c").unwrap().language_id(), "c");
        assert!(get_frontend("xyz").is_none());
    }

    #[test]
    fn test_supported_extensions_all_dispatch() {
        let exts = supported_extensions();
        for ext in &exts {
            assert!(get_frontend(ext).is_some(), "no frontend for {}", ext);
        }
        for expected in ["py", "js", "jsx", "mjs", "c", "h"] {
            assert!(exts.contains(&expected), "missing extension {}", expected);
        }
    }
}
