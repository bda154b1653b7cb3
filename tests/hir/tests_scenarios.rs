#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rstest::rstest;
use stencil::TextRange;
use stencil::hir::{DataModel, DiagnosticCode};

use crate::helpers::type_fixtures::{
    ITEM, bare_item_info, codes, item_info, shop_cache, shop_model, validate_source,
};

const LOOP: &str = "{#for item in items}{item.name}{/for}";

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn test_literal_short_circuit() {
    let cache = shop_cache();
    let before = cache.lookup_count();
    let validation = validate_source("{123}", &cache, &shop_model());
    assert!(validation.diagnostics.is_empty());
    assert_eq!(cache.lookup_count(), before);
    assert_eq!(
        validation.resolved_type(range(1, 4)).unwrap().signature(),
        "java.lang.Integer"
    );
}

#[test]
fn test_scoped_binding() {
    let cache = shop_cache();
    let clean = validate_source(LOOP, &cache, &shop_model());
    assert!(clean.diagnostics.is_empty(), "{:?}", clean.diagnostics);

    cache.insert(bare_item_info());
    let broken = validate_source(LOOP, &cache, &shop_model());
    assert_eq!(codes(&broken), vec![DiagnosticCode::UnknownProperty]);
    assert_eq!(broken.diagnostics[0].range, range(26, 30));
}

#[tokio::test]
async fn test_pending_then_second_pass() {
    let cache = shop_cache();
    cache.begin_loading(ITEM);
    let source = "{#for item in items}{item.anything}{/for}";

    let first = validate_source(source, &cache, &shop_model());
    assert!(first.diagnostics.is_empty());
    assert_eq!(first.pending.len(), 1);

    cache.insert(item_info());
    tokio::time::timeout(Duration::from_secs(5), first.wait_for_pending())
        .await
        .unwrap();

    let second = validate_source(source, &cache, &shop_model());
    assert!(second.is_complete());
    assert_eq!(codes(&second), vec![DiagnosticCode::UnknownProperty]);
    assert_eq!(second.diagnostics[0].range, range(26, 34));
}

#[rstest]
#[case::resolvable(shop_model())]
#[case::unknown(DataModel::loaded())]
#[case::not_loaded(DataModel::new())]
fn test_trailing_dot(#[case] model: DataModel) {
    let cache = shop_cache();
    let validation = validate_source("{items.}", &cache, &model);
    let syntax: Vec<_> = validation
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::SyntaxError)
        .map(|d| d.range)
        .collect();
    assert_eq!(syntax, vec![range(6, 7)]);
}

#[test]
fn test_member_chain_through_generics() {
    let cache = shop_cache();
    let validation = validate_source(
        "{#for i in order.items}{i.name.length}{i.price}{/for}{order.itemAt(0).name}{order.items.size}",
        &cache,
        &shop_model(),
    );
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_invalid_argument_is_reported_on_method_name() {
    let cache = shop_cache();
    let validation = validate_source("{order.itemAt('x')}", &cache, &shop_model());
    assert_eq!(codes(&validation), vec![DiagnosticCode::InvalidMethodParameter]);
    assert_eq!(validation.diagnostics[0].range, range(7, 13));
}

#[test]
fn test_quick_fix_data() {
    let cache = shop_cache();
    let validation = validate_source("{#for x in missing}{/for}", &cache, &shop_model());
    assert_eq!(codes(&validation), vec![DiagnosticCode::UndefinedObject]);
    let diagnostic = &validation.diagnostics[0];
    assert_eq!(diagnostic.range, range(11, 18));
    let data = diagnostic.data.as_ref().unwrap();
    assert_eq!(data.name.as_deref(), Some("missing"));
    assert!(data.iterable);
}

#[test]
fn test_malformed_input_still_validates() {
    let cache = shop_cache();
    for source in crate::helpers::tree_assertions::MALFORMED {
        let validation = validate_source(source, &cache, &shop_model());
        for diagnostic in &validation.diagnostics {
            assert!(diagnostic.range.end() <= stencil::TextSize::of(*source));
        }
    }
}
