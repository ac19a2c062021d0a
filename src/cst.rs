//! Concrete syntax tree and the cursor contract the syntax builder walks.
//!
//! The tree mirrors the shape a Python grammar engine produces: statements
//! and expressions are interior nodes, keywords, operators and punctuation
//! are leaves whose text is recovered from their span. The syntax builder
//! never sees this module's storage, only [`TreeCursor`], so any engine that
//! can expose the same node kinds can drive the compiler.

use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Script,
    AssignStatement,
    TypeDef,
    AssignOp,
    FunctionDefinition,
    ParamList,
    Body,
    IfStatement,
    WhileStatement,
    PassStatement,
    ReturnStatement,
    ExpressionStatement,
    VariableName,
    Number,
    Boolean,
    None,
    UnaryExpression,
    BinaryExpression,
    ParenthesizedExpression,
    CallExpression,
    ArgList,
    Keyword,
    Operator,
    Punctuation,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Navigation over a concrete syntax tree.
///
/// Every `goto_*` method reports whether the move happened; a failed move
/// leaves the cursor where it was.
pub trait TreeCursor {
    fn kind(&self) -> NodeKind;
    fn span(&self) -> Span;
    fn goto_first_child(&mut self) -> bool;
    fn goto_next_sibling(&mut self) -> bool;
    fn goto_prev_sibling(&mut self) -> bool;
    fn goto_parent(&mut self) -> bool;
}

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    parent: Option<NodeId>,
    index: usize,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            tree: self,
            node: self.root,
        }
    }

    /// S-expression view of the tree. Leaves print their source text.
    pub fn dump(&self, src: &str) -> String {
        let mut out = String::new();
        self.dump_node(self.root, src, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, src: &str, out: &mut String) {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::Keyword | NodeKind::Operator | NodeKind::Punctuation => {
                out.push_str(&format!("{:?}", node.span.text(src)));
            }
            _ if node.children.is_empty() => out.push_str(&node.kind.to_string()),
            _ => {
                out.push('(');
                out.push_str(&node.kind.to_string());
                for &child in &node.children {
                    out.push(' ');
                    self.dump_node(child, src, out);
                }
                out.push(')');
            }
        }
    }
}

/// Accumulates nodes bottom-up; children must be built before their parent.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<SyntaxNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.node(kind, span, Vec::new())
    }

    /// Interior node spanning its children.
    pub fn branch(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let span = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => self.nodes[first].span.merge(self.nodes[last].span),
            _ => Span::default(),
        };
        self.node(kind, span, children)
    }

    pub fn node(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = self.nodes.len();
        for (index, &child) in children.iter().enumerate() {
            let child = &mut self.nodes[child];
            child.parent = Some(id);
            child.index = index;
        }
        self.nodes.push(SyntaxNode {
            kind,
            span,
            parent: None,
            index: 0,
            children,
        });
        id
    }

    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'t> {
    tree: &'t SyntaxTree,
    node: NodeId,
}

impl Cursor<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    fn sibling(&self, offset: isize) -> Option<NodeId> {
        let node = &self.tree.nodes[self.node];
        let parent = &self.tree.nodes[node.parent?];
        let index = node.index.checked_add_signed(offset)?;
        parent.children.get(index).copied()
    }
}

impl TreeCursor for Cursor<'_> {
    fn kind(&self) -> NodeKind {
        self.tree.nodes[self.node].kind
    }

    fn span(&self) -> Span {
        self.tree.nodes[self.node].span
    }

    fn goto_first_child(&mut self) -> bool {
        match self.tree.nodes[self.node].children.first() {
            Some(&child) => {
                self.node = child;
                true
            }
            None => false,
        }
    }

    fn goto_next_sibling(&mut self) -> bool {
        match self.sibling(1) {
            Some(next) => {
                self.node = next;
                true
            }
            None => false,
        }
    }

    fn goto_prev_sibling(&mut self) -> bool {
        match self.sibling(-1) {
            Some(prev) => {
                self.node = prev;
                true
            }
            None => false,
        }
    }

    fn goto_parent(&mut self) -> bool {
        match self.tree.nodes[self.node].parent {
            Some(parent) => {
                self.node = parent;
                true
            }
            None => false,
        }
    }
}
