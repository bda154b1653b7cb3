#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use text_size::TextRange;
use tokio_util::sync::CancellationToken;

use crate::base::AnalysisError;
use crate::hir::{
    DataModel, DiagnosticCode, INTEGER, LONG, NamespaceResolver, NamespaceTable, NoNamespaces,
    STRING, Severity, TypeCache, TypeInfo, TypeRef, Validation, ValidationEnv, ValidationSettings,
    validate,
};
use crate::parser::parse;

// ============================================================================
// Fixtures
// ============================================================================

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

fn item_info(with_name: bool) -> TypeInfo {
    let info = TypeInfo::new("org.acme.Item")
        .with_super_type(TypeRef::simple("org.acme.Base"))
        .with_method("getPrice", vec![], TypeRef::simple("int"))
        .with_method("isActive", vec![], TypeRef::simple("boolean"))
        .with_method("discount", vec![TypeRef::simple("int")], TypeRef::simple("int"));
    match with_name {
        true => info.with_field("name", TypeRef::simple(STRING)),
        false => info,
    }
}

fn cache() -> TypeCache {
    let cache = TypeCache::new();
    cache.insert(
        TypeInfo::new(STRING)
            .with_method("length", vec![], TypeRef::simple("int"))
            .with_method("charAt", vec![TypeRef::simple("int")], TypeRef::simple("char")),
    );
    cache.insert(TypeInfo::new("org.acme.Base").with_field("id", TypeRef::simple(LONG)));
    cache.insert(item_info(true));
    cache.insert(
        TypeInfo::new("java.util.List")
            .with_type_params(["E"])
            .iterable_of(TypeRef::simple("E"))
            .with_method("size", vec![], TypeRef::simple("int"))
            .with_method("get", vec![TypeRef::simple("int")], TypeRef::simple("E")),
    );
    cache.insert(
        TypeInfo::new("java.util.concurrent.CompletionStage")
            .with_type_params(["T"])
            .wrapping(TypeRef::simple("T")),
    );
    cache
}

fn item_list() -> TypeRef {
    TypeRef::generic("java.util.List", vec![TypeRef::simple("org.acme.Item")])
}

fn model() -> DataModel {
    DataModel::loaded()
        .with_parameter("items", item_list())
        .with_parameter("item", TypeRef::simple("org.acme.Item"))
}

fn run(
    source: &str,
    cache: &TypeCache,
    namespaces: &dyn NamespaceResolver,
    model: &DataModel,
    settings: &ValidationSettings,
) -> Validation {
    let template = parse(source);
    let env = ValidationEnv::new(cache, namespaces, model, settings);
    validate(&template, &env, &CancellationToken::new()).unwrap()
}

fn check(source: &str, cache: &TypeCache, model: &DataModel) -> Validation {
    run(
        source,
        cache,
        &NoNamespaces,
        model,
        &ValidationSettings::default(),
    )
}

fn codes(validation: &Validation) -> Vec<DiagnosticCode> {
    validation.diagnostics.iter().map(|d| d.code).collect()
}

// ============================================================================
// Literals and syntax
// ============================================================================

#[test]
fn test_literal_needs_no_provider_lookup() {
    let cache = cache();
    let before = cache.lookup_count();
    let validation = check("{123}", &cache, &model());

    assert!(validation.diagnostics.is_empty());
    assert_eq!(cache.lookup_count(), before);
    assert_eq!(
        validation.resolved_type(range(1, 4)).unwrap().ty.name,
        INTEGER
    );
}

#[rstest]
#[case::string("{'abc'}", STRING)]
#[case::boolean("{true}", "java.lang.Boolean")]
#[case::long("{10L}", LONG)]
fn test_literal_types(#[case] source: &str, #[case] expected: &str) {
    let cache = cache();
    let validation = check(source, &cache, &model());
    let types: Vec<_> = validation.resolved.values().map(|t| t.ty.name.clone()).collect();
    assert_eq!(types, vec![expected]);
}

#[rstest]
#[case::resolved(true)]
#[case::unresolved(false)]
fn test_trailing_dot_is_a_syntax_error(#[case] known: bool) {
    let cache = cache();
    let model = match known {
        true => model(),
        false => DataModel::new(),
    };
    let validation = check("{items.}", &cache, &model);
    let syntax: Vec<_> = validation
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::SyntaxError)
        .collect();
    assert_eq!(syntax.len(), 1);
    assert_eq!(syntax[0].range, range(6, 7));
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn test_loop_binding_resolves_member() {
    let cache = cache();
    let validation = check("{#for item in items}{item.name}{/for}", &cache, &model());
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
    assert!(validation.is_complete());
    assert_eq!(
        validation.resolved_type(range(26, 30)).unwrap().ty.name,
        STRING
    );
}

#[test]
fn test_missing_member_reports_exactly_its_token() {
    let cache = cache();
    cache.insert(item_info(false));
    let validation = check("{#for item in items}{item.name}{/for}", &cache, &model());

    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownProperty]);
    let diagnostic = &validation.diagnostics[0];
    assert_eq!(diagnostic.range, range(26, 30));
    let data = diagnostic.data.as_ref().unwrap();
    assert_eq!(data.name.as_deref(), Some("name"));
    assert_eq!(data.type_name.as_deref(), Some("org.acme.Item"));
}

#[test]
fn test_loop_alias_does_not_leak() {
    let cache = cache();
    let model = DataModel::loaded().with_parameter("items", item_list());
    let validation = check("{#for it in items}{it.name}{/for}{it.name}", &cache, &model);
    assert_eq!(codes(&validation), vec![DiagnosticCode::UndefinedObject]);
    assert_eq!(validation.diagnostics[0].range, range(34, 36));
}

#[test]
fn test_loop_metadata_bindings() {
    let cache = cache();
    let validation = check(
        "{#for item in items}{item_index}{item_hasNext}{item_odd}{/for}",
        &cache,
        &model(),
    );
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_each_uses_default_alias() {
    let cache = cache();
    let validation = check("{#each items}{it.name}{/each}", &cache, &model());
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_let_binds_value_type() {
    let cache = cache();
    let validation = check("{#let n=item.name}{n.length}{n.nope}{/let}", &cache, &model());
    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownProperty]);
    assert_eq!(validation.diagnostics[0].range, range(31, 35));
}

#[test]
fn test_with_makes_members_bare() {
    let cache = cache();
    let validation = check("{#with item}{name}{nope}{/with}", &cache, &model());
    assert_eq!(codes(&validation), vec![DiagnosticCode::UndefinedObject]);
    assert_eq!(validation.diagnostics[0].range, range(19, 23));
}

#[test]
fn test_declaration_binds_root_frame() {
    let cache = cache();
    let validation = check(
        "{@java.util.List<org.acme.Item> list}{#for x in list}{x.price}{/for}",
        &cache,
        &DataModel::loaded(),
    );
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_unknown_declared_type_uses_name_range() {
    let cache = cache();
    let validation = check(
        "{@java.util.List<org.acme.Nope> list}{list.size}",
        &cache,
        &DataModel::loaded(),
    );
    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownType]);
    assert_eq!(validation.diagnostics[0].range, range(17, 30));
}

#[test]
fn test_unknown_type_argument_sharing_prefix_with_outer_name() {
    let cache = cache();
    let validation = check("{@java.util.List<java.util.Lis> x}", &cache, &DataModel::loaded());
    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownType]);
    assert_eq!(validation.diagnostics[0].range, range(17, 30));
    assert!(validation.diagnostics[0].message.contains("java.util.Lis"));
}

#[test]
fn test_short_class_names_are_not_type_variables() {
    let cache = cache();
    cache.insert(TypeInfo::new("Ab").with_field("name", TypeRef::simple(STRING)));
    let model = DataModel::loaded().with_parameter("ab", TypeRef::simple("Ab"));

    let declared = check("{@AB x}{x.name}", &cache, &model);
    assert_eq!(codes(&declared), vec![DiagnosticCode::UnknownType]);
    assert_eq!(declared.diagnostics[0].range, range(2, 4));

    let data = check("{ab.name}{ab.nope}", &cache, &model);
    assert_eq!(codes(&data), vec![DiagnosticCode::UnknownProperty]);
    assert_eq!(data.resolved_type(range(4, 8)).unwrap().ty.name, STRING);
}

#[test]
fn test_raw_iterable_element_is_unchecked() {
    let cache = cache();
    let model = DataModel::loaded().with_parameter("raw", TypeRef::simple("java.util.List"));
    let validation = check("{#for x in raw}{x.anything}{/for}{raw.get(0).anything}", &cache, &model);
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

// ============================================================================
// Root objects and namespaces
// ============================================================================

#[test]
fn test_undefined_object_waits_for_loaded_model() {
    let cache = cache();

    let incomplete = check("{missing}", &cache, &DataModel::new());
    assert!(incomplete.diagnostics.is_empty());
    assert!(incomplete.data_model_incomplete);

    let complete = check("{missing}", &cache, &DataModel::loaded());
    assert_eq!(codes(&complete), vec![DiagnosticCode::UndefinedObject]);
    assert_eq!(complete.diagnostics[0].range, range(1, 8));
    assert!(!complete.data_model_incomplete);
}

#[test]
fn test_undefined_object_in_iteration_is_flagged() {
    let cache = cache();
    let validation = check("{#for x in things}{/for}", &cache, &DataModel::loaded());
    let data = validation.diagnostics[0].data.as_ref().unwrap();
    assert!(data.iterable);
}

#[test]
fn test_excluded_and_ignored_objects() {
    let cache = cache();
    let settings = ValidationSettings::default().with_excluded_name("msg*");
    let excluded = run(
        "{msgs.title}",
        &cache,
        &NoNamespaces,
        &DataModel::loaded(),
        &settings,
    );
    assert!(excluded.diagnostics.is_empty());

    let settings = ValidationSettings::default().with_undefined_object_severity(None);
    let ignored = run("{nope}", &cache, &NoNamespaces, &DataModel::loaded(), &settings);
    assert!(ignored.diagnostics.is_empty());
}

#[test]
fn test_severity_setting_applies() {
    let cache = cache();
    let settings =
        ValidationSettings::default().with_undefined_object_severity(Some(Severity::Warning));
    let validation = run("{nope}", &cache, &NoNamespaces, &DataModel::loaded(), &settings);
    assert_eq!(validation.diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_data_namespace() {
    let cache = cache();
    let validation = check(
        "{@org.acme.Item it}{data:it.name}{data:items.size}",
        &cache,
        &model(),
    );
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_unknown_namespace() {
    let cache = cache();
    let validation = check("{foo:bar}", &cache, &model());
    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownNamespace]);
    assert_eq!(validation.diagnostics[0].range, range(1, 4));
}

#[test]
fn test_registered_namespace() {
    let cache = cache();
    let namespaces = NamespaceTable::new();
    namespaces.insert("inject", "bean", TypeRef::simple("org.acme.Item"));
    let settings = ValidationSettings::default();

    let ok = run("{inject:bean.name}", &cache, &namespaces, &model(), &settings);
    assert!(ok.diagnostics.is_empty(), "{:?}", ok.diagnostics);

    let missing = run("{inject:nope}", &cache, &namespaces, &model(), &settings);
    assert_eq!(codes(&missing), vec![DiagnosticCode::UndefinedObject]);
    let data = missing.diagnostics[0].data.as_ref().unwrap();
    assert_eq!(data.namespace.as_deref(), Some("inject"));
}

// ============================================================================
// Members
// ============================================================================

#[test]
fn test_accessors_and_supertypes() {
    let cache = cache();
    let validation = check("{item.price}{item.active}{item.id}", &cache, &model());
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
    assert_eq!(validation.resolved_type(range(6, 11)).unwrap().ty.name, "int");
    assert_eq!(validation.resolved_type(range(31, 33)).unwrap().ty.name, LONG);
}

#[test]
fn test_generic_return_type_is_substituted() {
    let cache = cache();
    let validation = check("{items.get(0).name}{items.size}", &cache, &model());
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_wrapper_is_unwrapped() {
    let cache = cache();
    let model = DataModel::loaded().with_parameter(
        "future",
        TypeRef::generic(
            "java.util.concurrent.CompletionStage",
            vec![TypeRef::simple("org.acme.Item")],
        ),
    );
    let validation = check("{future.name}{future.nope}", &cache, &model);
    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownProperty]);
}

#[test]
fn test_array_members() {
    let cache = cache();
    let validation = check(
        "{@org.acme.Item[] arr}{arr.length}{#for a in arr}{a.name}{/for}",
        &cache,
        &DataModel::loaded(),
    );
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[rstest]
#[case::applicable("{item.discount(5)}", vec![], None)]
#[case::widening_rejected(
    "{item.discount(5L)}",
    vec![DiagnosticCode::InvalidMethodParameter],
    Some(range(6, 14))
)]
#[case::wrong_type(
    "{item.discount('x')}",
    vec![DiagnosticCode::InvalidMethodParameter],
    Some(range(6, 14))
)]
#[case::wrong_arity(
    "{item.discount()}",
    vec![DiagnosticCode::InvalidMethodParameter],
    Some(range(6, 14))
)]
#[case::unknown("{item.missing()}", vec![DiagnosticCode::UnknownMethod], Some(range(6, 13)))]
fn test_method_applicability(
    #[case] source: &str,
    #[case] expected: Vec<DiagnosticCode>,
    #[case] expected_range: Option<TextRange>,
) {
    let cache = cache();
    let validation = check(source, &cache, &model());
    assert_eq!(codes(&validation), expected);
    assert_eq!(validation.diagnostics.first().map(|d| d.range), expected_range);
}

#[rstest]
#[case::elvis_after_unknown_object("{missing ?: item.nope}", range(17, 21))]
#[case::argument_after_unknown_object("{missing.call(item.nope)}", range(19, 23))]
#[case::argument_after_unknown_method("{item.missing(item.nope)}", range(19, 23))]
fn test_arguments_checked_after_unresolved_receiver(
    #[case] source: &str,
    #[case] argument: TextRange,
) {
    let cache = cache();
    let validation = check(source, &cache, &model());
    let unknown_property: Vec<_> = validation
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::UnknownProperty)
        .map(|d| d.range)
        .collect();
    assert_eq!(unknown_property, vec![argument]);
}

#[test]
fn test_arguments_checked_after_pending_receiver() {
    let cache = cache();
    cache.begin_loading("org.acme.Slow");
    let model = model().with_parameter("slow", TypeRef::simple("org.acme.Slow"));
    let validation = check("{slow.call(item.nope)}", &cache, &model);

    assert!(!validation.is_complete());
    assert_eq!(codes(&validation), vec![DiagnosticCode::UnknownProperty]);
    assert_eq!(validation.diagnostics[0].range, range(16, 20));
}

#[test]
fn test_not_iterable() {
    let cache = cache();
    let validation = check("{#for x in item}{x.name}{/for}", &cache, &model());
    assert_eq!(codes(&validation), vec![DiagnosticCode::NotIterable]);
    assert_eq!(validation.diagnostics[0].range, range(11, 15));
}

#[test]
fn test_integer_is_iterable() {
    let cache = cache();
    let validation = check("{#for i in 3}{i}{/for}", &cache, &model());
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

#[test]
fn test_infix_keeps_left_type() {
    let cache = cache();
    let validation = check("{item.name or 'n/a'}{item.name ?: 'x'}", &cache, &model());
    assert!(validation.diagnostics.is_empty(), "{:?}", validation.diagnostics);
}

// ============================================================================
// Pass control
// ============================================================================

#[test]
fn test_disabled_reports_nothing() {
    let cache = cache();
    let settings = ValidationSettings::default().with_enabled(false);
    let validation = run("{nope.x}", &cache, &NoNamespaces, &DataModel::loaded(), &settings);
    assert!(validation.diagnostics.is_empty());
}

#[test]
fn test_cancelled_pass() {
    let cache = cache();
    let model = model();
    let settings = ValidationSettings::default();
    let template = parse("{item.name}");
    let env = ValidationEnv::new(&cache, &NoNamespaces, &model, &settings);
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(matches!(
        validate(&template, &env, &cancel),
        Err(AnalysisError::Cancelled)
    ));
}

#[tokio::test]
async fn test_pending_suppresses_then_settles() {
    let cache = Arc::new(cache());
    cache.begin_loading("org.acme.Item");
    let source = "{#for item in items}{item.anything}{/for}";

    let first = check(source, &cache, &model());
    assert!(first.diagnostics.is_empty());
    assert!(!first.is_complete());
    assert_eq!(first.pending.len(), 1);

    let loader = Arc::clone(&cache);
    tokio::spawn(async move {
        loader.insert(item_info(true));
    });
    tokio::time::timeout(Duration::from_secs(5), first.wait_for_pending())
        .await
        .unwrap();

    let second = check(source, &cache, &model());
    assert!(second.is_complete());
    assert_eq!(codes(&second), vec![DiagnosticCode::UnknownProperty]);
    assert_eq!(second.diagnostics[0].range, range(26, 34));
}
