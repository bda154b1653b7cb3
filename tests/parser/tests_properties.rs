#![allow(clippy::unwrap_used)]

use rstest::rstest;
use stencil::{TextSize, parse};
use stencil::syntax::NodeKindTag;

use crate::helpers::tree_assertions::{MALFORMED, assert_ranges_nested, closed_nodes, shape};

const DOCUMENTS: &[&str] = &[
    "{@org.acme.Item item}<h1>{item.name}</h1>{#for x in items}{x_index}:{x.name}\
     {#if x.active}!{#else}?{/if}{/for}{! note !}",
    "{#a}{#b}{/a}{/b}{#c /}{d}",
    "{#let total=order.total name='n'}{total} {name}{/let}{#each order.items}{it}{/}",
    "{#with order}{#for i in items}{i.name ?: 'none'}{/for}{/with}{/with}",
];

fn corpus() -> impl Iterator<Item = &'static str> {
    DOCUMENTS.iter().chain(MALFORMED.iter()).copied()
}

// ============================================================================
// Range containment
// ============================================================================

#[test]
fn test_children_lie_within_parents() {
    for source in corpus() {
        assert_ranges_nested(&parse(source));
    }
}

#[test]
fn test_root_covers_every_document() {
    for source in corpus() {
        let template = parse(source);
        let root = template.node(template.root());
        assert_eq!(root.start(), TextSize::new(0));
        assert_eq!(root.end(), template.len(), "{source:?}");
    }
}

// ============================================================================
// Closure monotonicity
// ============================================================================

/// A node closed while parsing a prefix keeps its range once more input
/// follows.
#[test]
fn test_closed_nodes_survive_longer_input() {
    for source in DOCUMENTS {
        let cuts = source
            .char_indices()
            .filter(|&(_, c)| c == '}')
            .map(|(i, _)| i + 1);
        let full = closed_nodes(&parse(source));
        for cut in cuts {
            for node in closed_nodes(&parse(&source[..cut])) {
                assert!(
                    full.contains(&node),
                    "{node:?} closed in prefix {:?} but not in {source:?}",
                    &source[..cut]
                );
            }
        }
    }
}

// ============================================================================
// Idempotent lazy parsing
// ============================================================================

#[test]
fn test_micro_parsers_memoize() {
    for source in corpus() {
        let template = parse(source);
        for id in template.nodes_of(NodeKindTag::Section) {
            assert!(std::ptr::eq(template.parameters(id), template.parameters(id)));
        }
        for id in template.nodes_of(NodeKindTag::Expression) {
            let first = template.expression(id).unwrap();
            assert!(std::ptr::eq(first, template.expression(id).unwrap()));
        }
    }
}

#[test]
fn test_fresh_parse_derives_equal_structures() {
    for source in corpus() {
        let a = parse(source);
        let b = parse(source);
        let left: Vec<_> = a.expressions().into_iter().map(|(_, e)| e.clone()).collect();
        let right: Vec<_> = b.expressions().into_iter().map(|(_, e)| e.clone()).collect();
        assert_eq!(left, right);
    }
}

// ============================================================================
// Recovery determinism
// ============================================================================

#[rstest]
#[case("{#a}{#b}{/a}")]
#[case("{/for}{/for}{#for}")]
#[case("{#if a}{#else}{/else}{/if}{/}")]
#[case("{{{{#x}}}{/x")]
fn test_recovery_is_deterministic(#[case] source: &str) {
    let first = parse(source);
    for _ in 0..3 {
        assert_eq!(shape(&parse(source)), shape(&first));
    }
}
