//! Structural assertions over parsed templates.

use stencil::syntax::{NodeId, NodeKindTag, Template};
use stencil::{TextSize, parse};

/// Inputs that exercise every recovery path of the tree builder.
pub const MALFORMED: &[&str] = &[
    "",
    "{",
    "}{",
    "{#if cond}",
    "{#a}{#b}{/a}",
    "{/for}text",
    "{#for item in items}{item.name",
    "{#if a}{#else}{#else}{/if}{/if}",
    "{#each}{/}{/}{/each}",
    "{! unterminated comment",
    "{| raw {#if} |}{/if}",
    "{@java.util.List<Item items}{items.",
    "{#let a=1 b='x}{a}{/let}",
    "héllo {wörld} {#ünïcode}{/ünïcode}",
    "{#include foo /}{#include bar /",
];

/// Kind, range and closedness of every node, in creation order.
pub fn shape(template: &Template) -> Vec<(NodeKindTag, TextSize, TextSize, bool)> {
    template
        .nodes()
        .map(|(_, node)| (node.kind().tag(), node.start(), node.end(), node.is_closed()))
        .collect()
}

/// Every child lies within its parent.
pub fn assert_ranges_nested(template: &Template) {
    for (id, node) in template.nodes() {
        for &child in node.children() {
            let inner = template.node(child);
            assert!(
                node.start() <= inner.start() && inner.end() <= node.end(),
                "child {:?} {:?} escapes parent {:?} {:?} in {:?}",
                child,
                inner.range(),
                id,
                node.range(),
                template.source()
            );
        }
    }
}

/// Closed sections and expressions as `(tag, start, end)`.
pub fn closed_nodes(template: &Template) -> Vec<(NodeKindTag, TextSize, TextSize)> {
    template
        .nodes()
        .filter(|(_, n)| n.is_closed())
        .filter(|(_, n)| matches!(n.kind().tag(), NodeKindTag::Section | NodeKindTag::Expression))
        .map(|(_, n)| (n.kind().tag(), n.start(), n.end()))
        .collect()
}

pub fn sections(source: &str) -> Vec<(String, NodeId)> {
    let template = parse(source);
    template
        .nodes_of(NodeKindTag::Section)
        .map(|id| (template.section(id).map(|s| s.tag.to_string()).unwrap_or_default(), id))
        .collect()
}
