//! A small shop domain served from an in-memory type cache.

use std::sync::Arc;

use stencil::hir::{
    DataModel, DiagnosticCode, LONG, NoNamespaces, STRING, TypeCache, TypeInfo, TypeRef,
    Validation, ValidationEnv, ValidationSettings, validate,
};
use stencil::parse;
use tokio_util::sync::CancellationToken;

pub const ITEM: &str = "org.acme.Item";
pub const ORDER: &str = "org.acme.Order";
pub const LIST: &str = "java.util.List";

pub fn item_info() -> TypeInfo {
    TypeInfo::new(ITEM)
        .with_field("name", TypeRef::simple(STRING))
        .with_method("getPrice", vec![], TypeRef::simple(LONG))
}

/// Item without its `name` member.
pub fn bare_item_info() -> TypeInfo {
    TypeInfo::new(ITEM).with_method("getPrice", vec![], TypeRef::simple(LONG))
}

pub fn list_of(element: &str) -> TypeRef {
    TypeRef::generic(LIST, vec![TypeRef::simple(element)])
}

pub fn shop_cache() -> Arc<TypeCache> {
    let cache = TypeCache::new();
    cache.insert(TypeInfo::new(STRING).with_method("length", vec![], TypeRef::simple("int")));
    cache.insert(item_info());
    cache.insert(
        TypeInfo::new(ORDER)
            .with_field("items", list_of(ITEM))
            .with_method("itemAt", vec![TypeRef::simple("int")], TypeRef::simple(ITEM)),
    );
    cache.insert(
        TypeInfo::new(LIST)
            .with_type_params(["E"])
            .iterable_of(TypeRef::simple("E"))
            .with_method("size", vec![], TypeRef::simple("int")),
    );
    Arc::new(cache)
}

pub fn shop_model() -> DataModel {
    DataModel::loaded()
        .with_parameter("items", list_of(ITEM))
        .with_parameter("order", TypeRef::simple(ORDER))
}

pub fn validate_source(source: &str, cache: &TypeCache, model: &DataModel) -> Validation {
    let settings = ValidationSettings::default();
    let template = parse(source);
    let env = ValidationEnv::new(cache, &NoNamespaces, model, &settings);
    validate(&template, &env, &CancellationToken::new()).unwrap()
}

pub fn codes(validation: &Validation) -> Vec<DiagnosticCode> {
    validation.diagnostics.iter().map(|d| d.code).collect()
}
