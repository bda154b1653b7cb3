#![allow(clippy::unwrap_used)]

use stencil::syntax::NodeKindTag;
use stencil::{AnalysisError, TextSize, parse, parse_with_cancel};
use tokio_util::sync::CancellationToken;

use crate::helpers::tree_assertions::sections;

#[test]
fn test_unclosed_tag_yields_one_open_section() {
    let source = "{#if cond}";
    let template = parse(source);
    let found = sections(source);
    assert_eq!(found.len(), 1);

    let node = template.node(found[0].1);
    assert_eq!(found[0].0, "if");
    assert!(!node.is_closed());
    assert_eq!(node.end(), TextSize::of(source));
}

#[test]
fn test_mismatched_closer_force_closes_both() {
    let source = "{#a}{#b}{/a}";
    let template = parse(source);
    let found = sections(source);
    let (a, b) = (found[0].1, found[1].1);

    assert!(template.node(a).is_closed());
    assert!(template.node(b).is_closed());
    assert!(template.node(b).end() < template.node(a).end());
    assert_eq!(template.node(b).end(), TextSize::new(8));
    assert_eq!(template.node(a).end(), TextSize::of(source));
}

#[test]
fn test_orphans_are_kept_as_sections() {
    let template = parse("a{/for}b{/if}");
    let orphans: Vec<_> = template
        .nodes_of(NodeKindTag::Section)
        .filter_map(|id| template.section(id))
        .filter(|s| s.is_orphan())
        .map(|s| s.tag.to_string())
        .collect();
    assert_eq!(orphans, vec!["for", "if"]);
}

#[test]
fn test_expressions_in_document_order() {
    let template = parse("{#for x in items}{x.name}{/for}{total}");
    let texts: Vec<_> = template
        .expressions()
        .into_iter()
        .map(|(_, e)| template.text(e.range).to_string())
        .collect();
    assert_eq!(texts, vec!["items", "x.name", "total"]);
}

#[test]
fn test_cancelled_parse_drops_output() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(
        parse_with_cancel("{#for x in items}{x}{/for}", &cancel).err(),
        Some(AnalysisError::Cancelled)
    );
}
