//! Scope extraction: build the scope forest for one file.
//!
//! One pass over the lowered tree finds every complexity-bearing scope and
//! records lexical parent/child links. The forest is an arena addressed by
//! [`ScopeId`]; parent references are ids, not pointers, so the structure
//! stays acyclic with O(1) parent lookup.
//!
//! Class bodies are namespaces, not scopes: methods attach to the class's
//! lexical parent, with the class name folded into the qualified name, and
//! executable class-level statements belong to the synthetic module scope.

use serde::Serialize;

use crate::syntax::{ConstructKind, ScopeKind, Span, SyntaxNode};

use super::ScopeError;

/// Stable identifier of a scope within one file's forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One complexity-bearing unit of code.
#[derive(Debug, Clone)]
pub struct ScopeRecord {
    pub id: ScopeId,
    /// Bare name: `wrapper`, `<lambda>`, `<module>`.
    pub name: String,
    /// Dotted path through enclosing classes and functions.
    pub qualified_name: String,
    pub kind: ScopeKind,
    pub span: Span,
    /// Decorator expressions attached to the definition, metadata only.
    pub decorators: Vec<String>,
    /// Lexically enclosing scope; `None` for the module scope.
    pub parent: Option<ScopeId>,
    /// Child scopes in source order.
    pub children: Vec<ScopeId>,
}

/// Arena of scope records in source (pre-order) order.
#[derive(Debug, Default)]
pub struct ScopeForest {
    scopes: Vec<ScopeRecord>,
}

impl ScopeForest {
    pub fn get(&self, id: ScopeId) -> &ScopeRecord {
        &self.scopes[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopeRecord> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Result of scope extraction. `nodes` parallels the forest: the subtree
/// each scope owns, consumed later by the decision visitor.
pub struct Extraction<'a> {
    pub forest: ScopeForest,
    pub nodes: Vec<&'a SyntaxNode>,
    pub errors: Vec<ScopeError>,
}

/// Extract the full scope forest for one file.
///
/// `max_depth` bounds the tree walk. Exceeding it abandons the offending
/// subtree and records a scope-scoped error; sibling extraction continues.
pub fn extract(root: &SyntaxNode, max_depth: usize) -> Extraction<'_> {
    let mut ex = Extractor {
        scopes: Vec::new(),
        nodes: Vec::new(),
        errors: Vec::new(),
        max_depth,
    };

    let module_id = ex.push_scope(ScopeRecord {
        id: ScopeId(0),
        name: "<module>".to_string(),
        qualified_name: "<module>".to_string(),
        kind: ScopeKind::Module,
        span: root.span,
        decorators: Vec::new(),
        parent: None,
        children: Vec::new(),
    });
    ex.nodes.push(root);
    ex.walk(root, module_id, "", false, 1);

    Extraction {
        forest: ScopeForest { scopes: ex.scopes },
        nodes: ex.nodes,
        errors: ex.errors,
    }
}

struct Extractor<'a> {
    scopes: Vec<ScopeRecord>,
    nodes: Vec<&'a SyntaxNode>,
    errors: Vec<ScopeError>,
    max_depth: usize,
}

impl<'a> Extractor<'a> {
    fn push_scope(&mut self, mut record: ScopeRecord) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        record.id = id;
        if let Some(parent) = record.parent {
            self.scopes[parent.index()].children.push(id);
        }
        self.scopes.push(record);
        id
    }

    fn walk(
        &mut self,
        node: &'a SyntaxNode,
        owner: ScopeId,
        prefix: &str,
        in_class: bool,
        depth: usize,
    ) {
        if depth > self.max_depth {
            let scope = &self.scopes[owner.index()];
            self.errors.push(ScopeError {
                scope: scope.qualified_name.clone(),
                span: node.span,
                message: format!(
                    "nesting depth exceeds {} while extracting scopes; deeper definitions omitted",
                    self.max_depth
                ),
            });
            return;
        }

        for child in &node.children {
            match &child.kind {
                ConstructKind::FunctionDef
                | ConstructKind::AsyncFunctionDef
                | ConstructKind::Lambda => {
                    let id = self.register_scope(child, owner, prefix, in_class);
                    let qual = self.scopes[id.index()].qualified_name.clone();
                    self.walk(child, id, &qual, false, depth + 1);
                }
                ConstructKind::ClassDef => {
                    let name = child.detail.as_deref().unwrap_or("<class>");
                    let qual = join_qualified(prefix, name);
                    // No scope for the class body itself: methods attach
                    // under the class's lexical parent.
                    self.walk(child, owner, &qual, true, depth + 1);
                }
                ConstructKind::Unrecognized(_) => {
                    // Opaque: produces no scope. The owning scope's
                    // decision visitor reports the warning.
                }
                _ => {
                    self.walk(child, owner, prefix, in_class, depth + 1);
                }
            }
        }
    }

    fn register_scope(
        &mut self,
        node: &'a SyntaxNode,
        parent: ScopeId,
        prefix: &str,
        in_class: bool,
    ) -> ScopeId {
        let decorators: Vec<String> = node
            .children
            .iter()
            .filter(|c| c.kind == ConstructKind::Decorator)
            .filter_map(|c| c.detail.clone())
            .collect();

        let name = match node.detail.as_deref() {
            Some(n) => n.to_string(),
            None if node.kind == ConstructKind::Lambda => "<lambda>".to_string(),
            None => "<anonymous>".to_string(),
        };

        let has_yield = contains_owned_yield(node, self.max_depth);
        let kind = classify_scope(&node.kind, in_class, &decorators, has_yield);
        let qualified_name = join_qualified(prefix, &name);

        let id = self.push_scope(ScopeRecord {
            id: ScopeId(0),
            name,
            qualified_name,
            kind,
            span: node.span,
            decorators,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes.push(node);
        id
    }
}

fn join_qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Scope-kind classification.
///
/// Precedence for mixed cases: lambda, then decorator-derived method
/// kinds, then plain method, then async, then generator.
fn classify_scope(
    kind: &ConstructKind,
    in_class: bool,
    decorators: &[String],
    has_yield: bool,
) -> ScopeKind {
    if *kind == ConstructKind::Lambda {
        return ScopeKind::Lambda;
    }
    if in_class {
        if decorators.iter().any(|d| d == "staticmethod") {
            return ScopeKind::StaticMethod;
        }
        if decorators.iter().any(|d| d == "classmethod") {
            return ScopeKind::ClassMethod;
        }
        return ScopeKind::Method;
    }
    if *kind == ConstructKind::AsyncFunctionDef {
        return ScopeKind::AsyncFunction;
    }
    if has_yield {
        return ScopeKind::Generator;
    }
    ScopeKind::Function
}

/// Whether the scope's own body suspends. Stops at nested scope
/// boundaries: a yield inside an inner function belongs to that function.
fn contains_owned_yield(node: &SyntaxNode, budget: usize) -> bool {
    if budget == 0 {
        return false;
    }
    node.children.iter().any(|c| {
        if c.kind.is_scope() {
            return false;
        }
        c.kind == ConstructKind::Yield || contains_owned_yield(c, budget - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start_byte: usize, end_byte: usize) -> Span {
        Span {
            start_byte,
            end_byte,
            start_line: start_byte + 1,
            start_col: 1,
            end_line: end_byte + 1,
            end_col: 1,
        }
    }

    fn func(name: &str, sp: Span, children: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new(ConstructKind::FunctionDef, sp)
            .with_detail(name)
            .with_children(children)
    }

    #[test]
    fn test_module_scope_is_first() {
        let root = SyntaxNode::new(ConstructKind::Module, span(0, 100));
        let extraction = extract(&root, 64);
        assert_eq!(extraction.forest.len(), 1);
        let module = extraction.forest.get(ScopeId(0));
        assert_eq!(module.kind, ScopeKind::Module);
        assert_eq!(module.qualified_name, "<module>");
        assert!(module.parent.is_none());
    }

    #[test]
    fn test_nested_function_parentage() {
        let inner = func("inner", span(10, 20), vec![]);
        let outer = func("outer", span(5, 30), vec![inner]);
        let root =
            SyntaxNode::new(ConstructKind::Module, span(0, 100)).with_children(vec![outer]);

        let extraction = extract(&root, 64);
        assert_eq!(extraction.forest.len(), 3);

        let outer_rec = extraction.forest.get(ScopeId(1));
        assert_eq!(outer_rec.qualified_name, "outer");
        assert_eq!(outer_rec.parent, Some(ScopeId(0)));
        assert_eq!(outer_rec.children, vec![ScopeId(2)]);

        let inner_rec = extraction.forest.get(ScopeId(2));
        assert_eq!(inner_rec.qualified_name, "outer.inner");
        assert_eq!(inner_rec.parent, Some(ScopeId(1)));
    }

    #[test]
    fn test_methods_attach_under_class_lexical_parent() {
        let method = func("process", span(20, 40), vec![]);
        let class = SyntaxNode::new(ConstructKind::ClassDef, span(10, 50))
            .with_detail("Worker")
            .with_children(vec![method]);
        let root = SyntaxNode::new(ConstructKind::Module, span(0, 100)).with_children(vec![class]);

        let extraction = extract(&root, 64);
        assert_eq!(extraction.forest.len(), 2);
        let method_rec = extraction.forest.get(ScopeId(1));
        assert_eq!(method_rec.qualified_name, "Worker.process");
        assert_eq!(method_rec.kind, ScopeKind::Method);
        // Parent is the module, not a class scope.
        assert_eq!(method_rec.parent, Some(ScopeId(0)));
    }

    #[test]
    fn test_static_and_class_method_kinds() {
        let deco = |text: &str, sp: Span| {
            SyntaxNode::new(ConstructKind::Decorator, sp).with_detail(text)
        };
        let static_m = func("build", span(22, 30), vec![deco("staticmethod", span(20, 21))]);
        let class_m = func("of", span(42, 50), vec![deco("classmethod", span(40, 41))]);
        let class = SyntaxNode::new(ConstructKind::ClassDef, span(10, 60))
            .with_detail("Factory")
            .with_children(vec![static_m, class_m]);
        let root = SyntaxNode::new(ConstructKind::Module, span(0, 100)).with_children(vec![class]);

        let extraction = extract(&root, 64);
        assert_eq!(extraction.forest.get(ScopeId(1)).kind, ScopeKind::StaticMethod);
        assert_eq!(extraction.forest.get(ScopeId(2)).kind, ScopeKind::ClassMethod);
        assert_eq!(
            extraction.forest.get(ScopeId(1)).decorators,
            vec!["staticmethod".to_string()]
        );
    }

    #[test]
    fn test_generator_detection_does_not_leak_from_nested_scope() {
        let yields = SyntaxNode::new(ConstructKind::Yield, span(12, 14));
        let inner = func("inner", span(10, 20), vec![yields]);
        let outer = func("outer", span(5, 30), vec![inner]);
        let root = SyntaxNode::new(ConstructKind::Module, span(0, 100)).with_children(vec![outer]);

        let extraction = extract(&root, 64);
        assert_eq!(extraction.forest.get(ScopeId(1)).kind, ScopeKind::Function);
        assert_eq!(extraction.forest.get(ScopeId(2)).kind, ScopeKind::Generator);
    }

    #[test]
    fn test_depth_guard_records_error_and_keeps_siblings() {
        // A chain of blocks deeper than the limit, then a healthy sibling.
        let mut deep = SyntaxNode::new(ConstructKind::Block, span(10, 12));
        for _ in 0..10 {
            deep = SyntaxNode::new(ConstructKind::Block, span(10, 12)).with_children(vec![deep]);
        }
        let sibling = func("ok", span(50, 60), vec![]);
        let root = SyntaxNode::new(ConstructKind::Module, span(0, 100))
            .with_children(vec![deep, sibling]);

        let extraction = extract(&root, 4);
        assert_eq!(extraction.errors.len(), 1);
        assert_eq!(extraction.errors[0].scope, "<module>");
        // The sibling function was still extracted.
        assert!(extraction
            .forest
            .iter()
            .any(|s| s.qualified_name == "ok"));
    }

    #[test]
    fn test_unrecognized_construct_produces_no_scope() {
        let odd = SyntaxNode::new(
            ConstructKind::Unrecognized("mystery".to_string()),
            span(10, 20),
        );
        let sibling = func("ok", span(30, 40), vec![]);
        let root = SyntaxNode::new(ConstructKind::Module, span(0, 100))
            .with_children(vec![odd, sibling]);

        let extraction = extract(&root, 64);
        assert_eq!(extraction.forest.len(), 2);
        assert_eq!(extraction.forest.get(ScopeId(1)).qualified_name, "ok");
    }
}
