//! Tolerant tree builder
//!
//! A single forward pass over the scanner's tokens with one cursor node.
//! Structural problems never fail the parse; they become tree shape:
//!
//! 1. A tag-open advances an unclosed cursor's end to the tag start; a closed
//!    cursor is left for its parent before the new child is attached.
//! 2. A matching end tag closes the cursor and moves to its parent.
//! 3. A mismatched end tag force-closes every unmatched open ancestor at the
//!    end tag's start until the matching one is found.
//! 4. An end tag with no open match becomes an orphan section.
//! 5. Leaves (expressions, comments, CDATA, declarations) close on their end
//!    token; end-of-stream closes everything at the document end with
//!    `closed = false`.

use std::sync::Arc;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use tokio_util::sync::CancellationToken;

use super::scanner::{Scanner, Token, TokenKind};
use crate::base::{AnalysisError, check_cancelled};
use crate::syntax::{
    CDataNode, CommentNode, ExpressionNode, Node, NodeId, NodeKind, ParameterDeclarationNode,
    SectionKind, SectionNode, Template, parse_declaration,
};

/// Parse template text into a tree. Never fails.
pub fn parse(source: &str) -> Template {
    match TreeBuilder::new(source).run(None) {
        Ok(template) => template,
        // Without a token nothing can cancel the build.
        Err(_) => Template::from_nodes(Arc::from(source), vec![root_node(source)]),
    }
}

/// Parse with cooperative cancellation, checked once per token.
pub fn parse_with_cancel(
    source: &str,
    cancel: &CancellationToken,
) -> Result<Template, AnalysisError> {
    TreeBuilder::new(source).run(Some(cancel))
}

fn root_node(source: &str) -> Node {
    Node::new(
        NodeKind::Template,
        TextSize::new(0),
        TextSize::of(source),
        None,
    )
}

/// An end tag seen but not yet applied to the tree.
struct PendingEndTag {
    start: TextSize,
    end: TextSize,
    name: Option<(SmolStr, TextRange)>,
}

struct TreeBuilder<'a> {
    source: &'a str,
    nodes: Vec<Node>,
    current: NodeId,
    /// `{#` seen, tag name not yet.
    pending_start: Option<TextSize>,
    pending_end: Option<PendingEndTag>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        let mut root = root_node(source);
        root.end = TextSize::new(0);
        Self {
            source,
            nodes: vec![root],
            current: NodeId::ROOT,
            pending_start: None,
            pending_end: None,
        }
    }

    fn run(mut self, cancel: Option<&CancellationToken>) -> Result<Template, AnalysisError> {
        let mut scanner = Scanner::new(self.source);
        loop {
            if let Some(cancel) = cancel {
                check_cancelled(cancel)?;
            }
            let token = scanner.next_token();
            if token.kind == TokenKind::Eos {
                break;
            }
            self.on_token(token);
        }
        self.finish();

        tracing::debug!(
            nodes = self.nodes.len(),
            len = self.source.len(),
            "parsed template"
        );
        Ok(Template::from_nodes(Arc::from(self.source), self.nodes))
    }

    // =========================================================================
    // Token dispatch
    // =========================================================================

    fn on_token(&mut self, token: Token) {
        match token.kind {
            TokenKind::StartTagOpen => {
                self.flush_pending(token.offset());
                self.close_open_leaf(token.offset());
                self.on_tag_open(token.offset());
                self.pending_start = Some(token.offset());
            }
            TokenKind::StartTag => {
                let start = self.pending_start.take().unwrap_or(token.offset());
                let name = token.text(self.source);
                self.open_section(start, name, token.range);
            }
            TokenKind::ParameterTag => {
                self.flush_pending_start(token.offset());
                if let Some(section) = self.current_section_mut() {
                    section.parameters = Some(match section.parameters {
                        Some(region) => region.cover(token.range),
                        None => token.range,
                    });
                }
                self.extend_start_tag(token.end());
            }
            TokenKind::Whitespace => {
                if let Some(pending) = self.pending_end.as_mut() {
                    pending.end = token.end();
                } else {
                    self.flush_pending_start(token.offset());
                    self.extend_start_tag(token.end());
                }
            }
            TokenKind::StartTagClose => {
                self.flush_pending_start(token.offset());
                self.extend_start_tag(token.end());
                if let Some(section) = self.current_section_mut() {
                    section.start_tag_closed = true;
                }
            }
            TokenKind::StartTagSelfClose => {
                self.flush_pending_start(token.offset());
                self.extend_start_tag(token.end());
                let current = self.current;
                if let Some(section) = self.current_section_mut() {
                    section.start_tag_closed = true;
                    section.self_closed = true;
                    self.close(current, token.end());
                    self.move_to_parent();
                }
            }
            TokenKind::EndTagOpen => {
                self.flush_pending(token.offset());
                self.close_open_leaf(token.offset());
                self.on_tag_open(token.offset());
                self.pending_end = Some(PendingEndTag {
                    start: token.offset(),
                    end: token.end(),
                    name: None,
                });
            }
            TokenKind::EndTag => {
                if let Some(pending) = self.pending_end.as_mut() {
                    pending.name = Some((SmolStr::new(token.text(self.source)), token.range));
                    pending.end = token.end();
                }
            }
            TokenKind::Unknown => {
                if let Some(pending) = self.pending_end.as_mut() {
                    pending.end = token.end();
                }
            }
            TokenKind::EndTagClose => {
                if let Some(mut pending) = self.pending_end.take() {
                    pending.end = token.end();
                    self.apply_end_tag(pending);
                }
            }
            TokenKind::EndTagSelfClose => {
                self.flush_pending(token.offset());
                self.close_open_leaf(token.offset());
                self.on_tag_open(token.offset());
                self.close_nearest_section(token.range);
            }
            TokenKind::StartExpression
            | TokenKind::StartComment
            | TokenKind::CDataTagOpen
            | TokenKind::StartParameterDeclaration => {
                self.flush_pending(token.offset());
                self.close_open_leaf(token.offset());
                self.on_tag_open(token.offset());
                self.open_leaf(token);
            }
            TokenKind::ExpressionContent
            | TokenKind::Comment
            | TokenKind::CDataContent
            | TokenKind::ParameterDeclaration => {
                let current = self.current;
                if self.node(current).kind.is_leaf() {
                    set_leaf_content(&mut self.nodes[current.index()].kind, token.range);
                    self.set_end(current, token.end());
                }
            }
            TokenKind::EndExpression
            | TokenKind::EndComment
            | TokenKind::CDataTagClose
            | TokenKind::EndParameterDeclaration => {
                let current = self.current;
                if self.node(current).kind.is_leaf() {
                    self.finish_leaf(current);
                    self.close(current, token.end());
                    self.move_to_parent();
                }
            }
            TokenKind::Content => {
                self.flush_pending(token.offset());
                self.close_open_leaf(token.offset());
                let mut text = Node::new(NodeKind::Text, token.offset(), token.end(), None);
                text.closed = true;
                self.add_child(text);
            }
            TokenKind::Eos => {}
        }
    }

    // =========================================================================
    // Tree mutation
    // =========================================================================

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn current_section_mut(&mut self) -> Option<&mut SectionNode> {
        match &mut self.nodes[self.current.index()].kind {
            NodeKind::Section(section) => Some(section),
            _ => None,
        }
    }

    /// Attach `node` under the cursor and return its handle.
    fn add_child(&mut self, mut node: Node) -> NodeId {
        let parent = self.current;
        let id = NodeId::from_index(self.nodes.len());
        node.parent = Some(parent);
        let end = node.end;
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        self.set_end(parent, end);
        id
    }

    /// Extend `id` and its open ancestors to at least `end`. Closed nodes
    /// never move.
    fn set_end(&mut self, id: NodeId, end: TextSize) {
        let mut next = Some(id);
        while let Some(node_id) = next {
            let node = &mut self.nodes[node_id.index()];
            if node.closed || node.end >= end {
                break;
            }
            node.end = end;
            next = node.parent;
        }
    }

    fn close(&mut self, id: NodeId, end: TextSize) {
        self.set_end(id, end);
        self.nodes[id.index()].closed = true;
    }

    fn move_to_parent(&mut self) {
        if let Some(parent) = self.node(self.current).parent {
            self.current = parent;
        }
    }

    /// Rule 1.
    fn on_tag_open(&mut self, at: TextSize) {
        let current = self.current;
        let node = self.node(current);
        if !node.closed && node.parent.is_some() {
            self.set_end(current, at);
        }
        if self.node(current).closed {
            self.move_to_parent();
        }
    }

    fn open_section(&mut self, start: TextSize, name: &str, name_range: TextRange) {
        let kind = SectionKind::from_tag(name);
        if kind.is_block_label() {
            let current = self.current;
            let label_open = self
                .node(current)
                .as_section()
                .is_some_and(|s| s.kind.is_block_label());
            if label_open && !self.node(current).closed {
                self.close(current, start);
                self.move_to_parent();
            }
        }

        let section = SectionNode::new(
            name,
            name_range,
            Some(TextRange::new(start, name_range.end())),
        );
        let node = Node::new(NodeKind::Section(section), start, name_range.end(), None);
        self.current = self.add_child(node);
    }

    fn extend_start_tag(&mut self, end: TextSize) {
        let current = self.current;
        if let Some(section) = self.current_section_mut() {
            if let Some(tag) = section.start_tag.as_mut() {
                *tag = TextRange::new(tag.start(), end.max(tag.end()));
            }
            self.set_end(current, end);
        }
    }

    fn open_leaf(&mut self, token: Token) {
        let empty = TextRange::empty(token.end());
        let kind = match token.kind {
            TokenKind::StartExpression => NodeKind::Expression(ExpressionNode { content: empty }),
            TokenKind::StartComment => NodeKind::Comment(CommentNode { content: empty }),
            TokenKind::CDataTagOpen => NodeKind::CData(CDataNode {
                content: empty,
                legacy: token.text(self.source) == "{[",
            }),
            _ => NodeKind::ParameterDeclaration(ParameterDeclarationNode {
                content: empty,
                parts: Default::default(),
            }),
        };
        let node = Node::new(kind, token.offset(), token.end(), None);
        self.current = self.add_child(node);
    }

    /// Compute derived leaf data once the content is final.
    fn finish_leaf(&mut self, id: NodeId) {
        if let NodeKind::ParameterDeclaration(decl) = &mut self.nodes[id.index()].kind {
            decl.parts = parse_declaration(&self.source[decl.content], decl.content.start());
        }
    }

    /// An unclosed leaf met by a new construct ends there, still unclosed.
    fn close_open_leaf(&mut self, at: TextSize) {
        let current = self.current;
        let node = self.node(current);
        if node.kind.is_leaf() && !node.closed {
            self.finish_leaf(current);
            self.set_end(current, at);
            self.move_to_parent();
        }
    }

    fn flush_pending_start(&mut self, at: TextSize) {
        if let Some(start) = self.pending_start.take() {
            self.open_section(start, "", TextRange::empty(at));
        }
    }

    fn flush_pending(&mut self, at: TextSize) {
        self.flush_pending_start(at);
        if let Some(pending) = self.pending_end.take() {
            self.apply_end_tag(pending);
        }
    }

    /// Rules 2, 3 and 4.
    fn apply_end_tag(&mut self, pending: PendingEndTag) {
        let range = TextRange::new(pending.start, pending.end);
        let Some((name, name_range)) = pending.name else {
            self.close_nearest_section(range);
            return;
        };

        let target = std::iter::successors(Some(self.current), |&id| self.node(id).parent)
            .take_while(|&id| id != NodeId::ROOT)
            .find(|&id| {
                let node = self.node(id);
                !node.closed && node.as_section().is_some_and(|s| s.tag == name)
            });

        let Some(target) = target else {
            tracing::trace!(tag = %name, "orphan end tag");
            self.add_orphan(&name, name_range, range);
            return;
        };

        while self.current != target {
            let current = self.current;
            self.finish_leaf(current);
            self.close(current, pending.start);
            self.move_to_parent();
        }
        if let NodeKind::Section(section) = &mut self.nodes[target.index()].kind {
            section.end_tag = Some(range);
        }
        self.close(target, pending.end);
        self.move_to_parent();
    }

    /// `{/}` closes the nearest open section.
    fn close_nearest_section(&mut self, range: TextRange) {
        let current = self.current;
        if current == NodeId::ROOT {
            self.add_orphan("", TextRange::empty(range.start()), range);
            return;
        }
        if let Some(section) = self.current_section_mut() {
            section.end_tag = Some(range);
        }
        self.close(current, range.end());
        self.move_to_parent();
    }

    fn add_orphan(&mut self, name: &str, name_range: TextRange, range: TextRange) {
        let mut section = SectionNode::new(name, name_range, None);
        section.end_tag = Some(range);
        let mut node = Node::new(NodeKind::Section(section), range.start(), range.end(), None);
        node.closed = true;
        self.add_child(node);
    }

    /// Close everything still open at the document end, keeping `closed = false`.
    fn finish(&mut self) {
        let len = TextSize::of(self.source);
        self.flush_pending(len);
        let mut next = Some(self.current);
        while let Some(id) = next {
            if id == NodeId::ROOT {
                break;
            }
            self.finish_leaf(id);
            self.set_end(id, len);
            next = self.node(id).parent;
        }
        let root = &mut self.nodes[NodeId::ROOT.index()];
        root.end = len;
        root.closed = true;
    }
}

fn set_leaf_content(kind: &mut NodeKind, range: TextRange) {
    let content = match kind {
        NodeKind::Expression(e) => &mut e.content,
        NodeKind::Comment(c) => &mut c.content,
        NodeKind::CData(c) => &mut c.content,
        NodeKind::ParameterDeclaration(d) => &mut d.content,
        _ => return,
    };
    *content = match content.is_empty() && content.start() == range.start() {
        true => range,
        false => content.cover(range),
    };
}
