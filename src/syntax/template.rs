//! The template tree: an arena of nodes plus a handle-keyed derived cache.
//!
//! Parameters and expression parts are computed on first access and
//! memoized for the lifetime of the tree, so repeated reads return the very
//! same structure.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use text_size::{TextRange, TextSize};

use super::expression::{Expression, parse_expression};
use super::node::{Node, NodeId, NodeKind, NodeKindTag, SectionNode};
use super::parameter::{Parameter, parse_parameters};

/// Lazily derived per-node data, indexed by [`NodeId`].
#[derive(Debug, Default)]
struct DerivedCache {
    parameters: Vec<OnceCell<Vec<Parameter>>>,
    expressions: Vec<OnceCell<Expression>>,
}

impl DerivedCache {
    fn with_len(len: usize) -> Self {
        Self {
            parameters: (0..len).map(|_| OnceCell::new()).collect(),
            expressions: (0..len).map(|_| OnceCell::new()).collect(),
        }
    }
}

/// Parsed template. Node `0` is the root and spans the whole document.
#[derive(Debug)]
pub struct Template {
    source: Arc<str>,
    nodes: Vec<Node>,
    derived: DerivedCache,
}

/// Preorder walk event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    Enter(NodeId),
    Leave(NodeId),
}

impl Template {
    pub(crate) fn from_nodes(source: Arc<str>, nodes: Vec<Node>) -> Self {
        let derived = DerivedCache::with_len(nodes.len());
        Self {
            source,
            nodes,
            derived,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self, range: TextRange) -> &str {
        &self.source[range]
    }

    pub fn len(&self) -> TextSize {
        TextSize::of(&*self.source)
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in creation order, which is document order of their starts.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::from_index(i), node))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    /// Ancestors from the parent outwards to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn section(&self, id: NodeId) -> Option<&SectionNode> {
        self.node(id).as_section()
    }

    /// Enter/leave events in document order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            template: self,
            stack: vec![(NodeId::ROOT, false)],
        }
    }

    /// Preorder node handles below and including `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// Nodes of one kind in document order.
    pub fn nodes_of(&self, tag: NodeKindTag) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(NodeId::ROOT)
            .filter(move |&id| self.node(id).kind().tag() == tag)
    }

    /// Deepest node whose range contains `offset`.
    ///
    /// An offset equal to a node's end still selects it when the node is
    /// unclosed, so a caret after `{item.` finds the expression being typed.
    pub fn find_node_at(&self, offset: TextSize) -> NodeId {
        let mut current = NodeId::ROOT;
        'descend: loop {
            for &child in self.children(current) {
                let node = self.node(child);
                let inside = node.start() <= offset
                    && (offset < node.end() || (!node.is_closed() && offset == node.end()));
                if inside {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Parameters of a section, parsed on first access.
    ///
    /// The micro-parsers take no cancellation token: their work is linear in
    /// one node's text, and callers check cancellation per node visit.
    pub fn parameters(&self, id: NodeId) -> &[Parameter] {
        let Some(section) = self.section(id) else {
            return &[];
        };
        self.derived.parameters[id.index()].get_or_init(|| match section.parameters {
            Some(region) => parse_parameters(&self.source, region, section.kind),
            None => Vec::new(),
        })
    }

    /// Parsed expression of an expression node, parsed on first access.
    pub fn expression(&self, id: NodeId) -> Option<&Expression> {
        let content = self.node(id).as_expression()?.content;
        Some(
            self.derived.expressions[id.index()]
                .get_or_init(|| parse_expression(&self.source[content], content.start())),
        )
    }

    /// Every expression in the tree: expression nodes and type-bearing
    /// section parameters, in document order.
    pub fn expressions(&self) -> Vec<(NodeId, &Expression)> {
        let mut out = Vec::new();
        for id in self.descendants(NodeId::ROOT) {
            match self.node(id).kind() {
                NodeKind::Expression(_) => out.extend(self.expression(id).map(|e| (id, e))),
                NodeKind::Section(_) => out.extend(
                    self.parameters(id)
                        .iter()
                        .filter_map(|p| p.expression.as_ref())
                        .map(|e| (id, e)),
                ),
                _ => {}
            }
        }
        out
    }
}

/// Iterator behind [`Template::walk`].
pub struct Walk<'a> {
    template: &'a Template,
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for Walk<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        let (id, entered) = self.stack.pop()?;
        if entered {
            return Some(WalkEvent::Leave(id));
        }
        self.stack.push((id, true));
        for &child in self.template.children(id).iter().rev() {
            self.stack.push((child, false));
        }
        Some(WalkEvent::Enter(id))
    }
}
