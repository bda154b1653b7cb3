//! Node model: arena handles, node kinds and per-kind payloads.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::declaration::ParameterDeclarationParts;
use super::section::SectionKind;

/// Handle to a node inside a [`super::Template`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lightweight discriminant for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKindTag {
    Template,
    Section,
    Expression,
    ParameterDeclaration,
    Comment,
    CData,
    Text,
}

/// Per-kind node payload. Matching on this is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Template,
    Section(SectionNode),
    Expression(ExpressionNode),
    ParameterDeclaration(ParameterDeclarationNode),
    Comment(CommentNode),
    CData(CDataNode),
    Text,
}

impl NodeKind {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::Template => NodeKindTag::Template,
            NodeKind::Section(_) => NodeKindTag::Section,
            NodeKind::Expression(_) => NodeKindTag::Expression,
            NodeKind::ParameterDeclaration(_) => NodeKindTag::ParameterDeclaration,
            NodeKind::Comment(_) => NodeKindTag::Comment,
            NodeKind::CData(_) => NodeKindTag::CData,
            NodeKind::Text => NodeKindTag::Text,
        }
    }

    /// Leaf kinds never receive children.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, NodeKind::Template | NodeKind::Section(_))
    }
}

/// A positioned node. Parent owns children; the parent link is a plain handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) start: TextSize,
    pub(crate) end: TextSize,
    pub(crate) closed: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, start: TextSize, end: TextSize, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            start,
            end,
            closed: false,
            parent,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn start(&self) -> TextSize {
        self.start
    }

    pub fn end(&self) -> TextSize {
        self.end
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }

    /// Whether an explicit terminator was observed (or the node was
    /// force-closed by an enclosing end tag).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_section(&self) -> Option<&SectionNode> {
        match &self.kind {
            NodeKind::Section(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&ExpressionNode> {
        match &self.kind {
            NodeKind::Expression(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_parameter_declaration(&self) -> Option<&ParameterDeclarationNode> {
        match &self.kind {
            NodeKind::ParameterDeclaration(decl) => Some(decl),
            _ => None,
        }
    }
}

/// `{#tag params}...{/tag}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNode {
    pub tag: SmolStr,
    pub kind: SectionKind,
    /// Name range in the start tag, or in the end tag for orphans.
    pub tag_range: TextRange,
    /// `{#` up to the end of the start tag. `None` for orphan end tags.
    pub start_tag: Option<TextRange>,
    /// Whether the start tag saw its `}` or `/}`.
    pub start_tag_closed: bool,
    /// Raw parameter region inside the start tag.
    pub parameters: Option<TextRange>,
    /// `{/tag}` or `{/}`, when observed.
    pub end_tag: Option<TextRange>,
    pub self_closed: bool,
}

impl SectionNode {
    pub(crate) fn new(tag: &str, tag_range: TextRange, start_tag: Option<TextRange>) -> Self {
        Self {
            tag: SmolStr::new(tag),
            kind: SectionKind::from_tag(tag),
            tag_range,
            start_tag,
            start_tag_closed: false,
            parameters: None,
            end_tag: None,
            self_closed: false,
        }
    }

    /// An end tag with no matching start tag.
    pub fn is_orphan(&self) -> bool {
        self.start_tag.is_none()
    }

    pub fn start_tag_open_offset(&self) -> Option<TextSize> {
        self.start_tag.map(|r| r.start())
    }

    pub fn start_tag_close_offset(&self) -> Option<TextSize> {
        self.start_tag
            .filter(|_| self.start_tag_closed)
            .map(|r| r.end())
    }

    pub fn end_tag_open_offset(&self) -> Option<TextSize> {
        self.end_tag.map(|r| r.start())
    }

    pub fn end_tag_close_offset(&self) -> Option<TextSize> {
        self.end_tag.map(|r| r.end())
    }
}

/// `{expr}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionNode {
    /// Text between the delimiters.
    pub content: TextRange,
}

/// `{@Type alias}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclarationNode {
    pub content: TextRange,
    pub parts: ParameterDeclarationParts,
}

/// `{! comment !}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub content: TextRange,
}

/// `{| raw |}` or the legacy `{[ raw ]}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CDataNode {
    pub content: TextRange,
    pub legacy: bool,
}
