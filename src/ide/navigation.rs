//! Offset-based navigation: tag matching, part lookup and hover.

use text_size::{TextRange, TextSize};

use crate::hir::{ResolvedType, Validation};
use crate::syntax::{Expression, NodeId, NodeKind, Part, Template};

/// The expression part under an offset.
#[derive(Clone, Copy, Debug)]
pub struct PartAt<'a> {
    /// Expression node or section holding the expression.
    pub node: NodeId,
    pub expression: &'a Expression,
    pub part: &'a Part,
}

/// Result of a hover request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverResult {
    /// Hovered token.
    pub range: TextRange,
    /// Type signature (markdown).
    pub contents: String,
}

/// The other tag of the section whose start or end tag contains `offset`.
///
/// `None` when the offset is not on a tag, or when the tag has no partner:
/// orphan end tags, self-closing and unclosed sections.
pub fn matching_tag(template: &Template, offset: TextSize) -> Option<TextRange> {
    let section = template.section(template.find_node_at(offset))?;
    let on = |range: TextRange| range.contains_inclusive(offset);
    match (section.start_tag, section.end_tag) {
        (Some(start), end) if on(start) => end,
        (start, Some(end)) if on(end) => start,
        _ => None,
    }
}

/// Expressions of `node` whose text contains `offset`.
fn expressions_at(template: &Template, node: NodeId, offset: TextSize) -> Vec<&Expression> {
    match template.node(node).kind() {
        NodeKind::Expression(_) => template.expression(node).into_iter().collect(),
        NodeKind::Section(_) => template
            .parameters(node)
            .iter()
            .filter(|p| p.range().contains_inclusive(offset))
            .filter_map(|p| p.expression.as_ref())
            .collect(),
        _ => Vec::new(),
    }
}

/// Part under `offset`, searching method arguments first.
pub fn part_at(template: &Template, offset: TextSize) -> Option<PartAt<'_>> {
    let node = template.find_node_at(offset);
    expressions_at(template, node, offset)
        .into_iter()
        .find_map(|expression| {
            expression.part_at(offset).map(|part| PartAt {
                node,
                expression,
                part,
            })
        })
}

/// Token under `offset` and the type a validation pass resolved for it.
/// Literal expressions resolve as a whole.
pub fn resolved_type_at<'v>(
    template: &Template,
    validation: &'v Validation,
    offset: TextSize,
) -> Option<(TextRange, &'v ResolvedType)> {
    if let Some(at) = part_at(template, offset) {
        return validation
            .resolved_type(at.part.range)
            .map(|ty| (at.part.range, ty));
    }
    let node = template.find_node_at(offset);
    expressions_at(template, node, offset)
        .into_iter()
        .filter(|e| e.literal.is_some() && e.range.contains_inclusive(offset))
        .find_map(|e| validation.resolved_type(e.range).map(|ty| (e.range, ty)))
}

pub fn hover(template: &Template, validation: &Validation, offset: TextSize) -> Option<HoverResult> {
    let (range, ty) = resolved_type_at(template, validation, offset)?;
    Some(HoverResult {
        range,
        contents: format!("`{}`", ty.signature()),
    })
}
