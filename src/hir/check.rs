//! Validation pass: resolves every expression of a template against the host
//! type model.
//!
//! ```text
//! pre-pass   {@Type alias}           → root frame bindings
//! walk       for / each              → check iterable, bind alias + metadata
//!            with                    → ambient object
//!            let / set               → named bindings
//!            other sections, {expr}  → check in the current frame
//! ```
//!
//! A lookup that is still in flight never produces a diagnostic. It yields
//! [`Binding::Pending`], which silently ends the chain it belongs to, and is
//! returned in [`Validation::pending`] so the caller can await it and run the
//! pass again.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use text_size::TextRange;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector};
use super::provider::{DataModel, NamespaceResolver, PendingLookup, Resolution, TypeProvider};
use super::scope::{Binding, ResolutionContext};
use super::settings::ValidationSettings;
use super::types::{
    BOOLEAN, INTEGER, LONG, MemberInfo, OBJECT, ResolvedType, TypeInfo, TypeRef, is_class_name,
    numeric_rank,
};
use crate::base::{AnalysisError, check_cancelled};
use crate::syntax::{
    ALIAS, DEFAULT_ALIAS, Expression, ITERABLE, MethodCall, NodeId, NodeKind, NodeKindTag,
    OBJECT as WITH_OBJECT, Part, PartKind, SectionKind, Template,
};

/// Built-in namespace aliasing declared and global bindings.
pub const DATA_NAMESPACE: &str = "data";

/// Suffixes of the per-iteration bindings a loop adds next to its alias.
const LOOP_METADATA: &[(&str, &str)] = &[
    ("index", INTEGER),
    ("count", INTEGER),
    ("hasNext", BOOLEAN),
    ("isFirst", BOOLEAN),
    ("isLast", BOOLEAN),
    ("odd", BOOLEAN),
    ("even", BOOLEAN),
];

// ============================================================================
// PUBLIC API
// ============================================================================

/// Collaborators of one validation pass.
#[derive(Clone, Copy)]
pub struct ValidationEnv<'a> {
    pub provider: &'a dyn TypeProvider,
    pub namespaces: &'a dyn NamespaceResolver,
    pub data_model: &'a DataModel,
    pub settings: &'a ValidationSettings,
    /// Scope key handed to the type provider.
    pub project: Option<&'a str>,
}

impl<'a> ValidationEnv<'a> {
    pub fn new(
        provider: &'a dyn TypeProvider,
        namespaces: &'a dyn NamespaceResolver,
        data_model: &'a DataModel,
        settings: &'a ValidationSettings,
    ) -> Self {
        Self {
            provider,
            namespaces,
            data_model,
            settings,
            project: None,
        }
    }

    pub fn with_project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Default)]
pub struct Validation {
    pub diagnostics: Vec<Diagnostic>,
    /// Lookups still in flight; validate again once they settle.
    pub pending: Vec<PendingLookup>,
    /// Type of every resolved part, keyed by the part's name range.
    pub resolved: FxHashMap<TextRange, ResolvedType>,
    /// Some root object was left unchecked because the data model is not loaded.
    pub data_model_incomplete: bool,
}

impl Validation {
    /// No dependency was pending, so another pass would not change anything.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Wait until every pending lookup of this pass has settled.
    pub async fn wait_for_pending(&self) {
        for lookup in &self.pending {
            lookup.clone().wait().await;
        }
    }

    pub fn resolved_type(&self, range: TextRange) -> Option<&ResolvedType> {
        self.resolved.get(&range)
    }
}

/// Run one validation pass over `template`.
pub fn validate(
    template: &Template,
    env: &ValidationEnv<'_>,
    cancel: &CancellationToken,
) -> Result<Validation, AnalysisError> {
    Checker {
        template,
        env,
        cancel,
        collector: DiagnosticCollector::new(),
        pending: Vec::new(),
        pending_keys: FxHashSet::default(),
        resolved: FxHashMap::default(),
        incomplete: false,
    }
    .run()
}

// ============================================================================
// HOST TYPE QUERIES
// ============================================================================

enum MethodLookup {
    Found(TypeRef),
    Pending(PendingLookup),
    /// Overloads exist but none accepts the arguments.
    NotApplicable,
    Missing,
}

impl ValidationEnv<'_> {
    /// Visit `ty` and then its supertypes breadth-first, with type arguments
    /// substituted, until `visit` returns a value.
    fn walk_supertypes<T>(
        &self,
        info: Arc<TypeInfo>,
        ty: &TypeRef,
        mut visit: impl FnMut(&TypeInfo, &FxHashMap<SmolStr, TypeRef>) -> Option<T>,
    ) -> Resolution<T> {
        let max_depth = self.settings.max_supertype_depth;
        let mut queue = VecDeque::from([(info, ty.clone(), 0usize)]);
        let mut seen = FxHashSet::default();
        let mut pending = None;

        while let Some((info, ty, depth)) = queue.pop_front() {
            if !seen.insert(info.name.clone()) {
                continue;
            }
            let bindings = info.substitution(&ty);
            if let Some(found) = visit(&info, &bindings) {
                return Resolution::Resolved(found);
            }
            if depth >= max_depth {
                continue;
            }
            for super_type in &info.super_types {
                let super_type = super_type.substitute(&bindings);
                match self.provider.resolve_type(&super_type.name, self.project) {
                    Resolution::Resolved(super_info) => {
                        queue.push_back((super_info, super_type, depth + 1))
                    }
                    Resolution::Pending(lookup) => pending = Some(lookup),
                    Resolution::Unresolved => {}
                }
            }
        }

        match pending {
            Some(lookup) => Resolution::Pending(lookup),
            None => Resolution::Unresolved,
        }
    }

    fn find_property(&self, name: &str, info: Arc<TypeInfo>, ty: &TypeRef) -> Resolution<TypeRef> {
        self.walk_supertypes(info, ty, |info, bindings| {
            self.provider
                .resolve_member(name, info)
                .map(|member| member.result_type().substitute(bindings))
        })
    }

    fn find_method(
        &self,
        name: &str,
        info: Arc<TypeInfo>,
        ty: &TypeRef,
        args: &[Binding],
    ) -> MethodLookup {
        let mut overloads = false;
        let found = self.walk_supertypes(info, ty, |info, bindings| {
            info.find_methods(name).find_map(|method| {
                overloads = true;
                self.is_applicable(method, args, bindings)
                    .then(|| method.result_type().substitute(bindings))
            })
        });
        match found {
            Resolution::Resolved(ty) => MethodLookup::Found(ty),
            Resolution::Pending(lookup) => MethodLookup::Pending(lookup),
            Resolution::Unresolved if overloads => MethodLookup::NotApplicable,
            Resolution::Unresolved => MethodLookup::Missing,
        }
    }

    /// Arity, then per-argument assignability. Unchecked arguments match anything.
    fn is_applicable(
        &self,
        method: &MemberInfo,
        args: &[Binding],
        bindings: &FxHashMap<SmolStr, TypeRef>,
    ) -> bool {
        let MemberInfo::Method { params, varargs, .. } = method else {
            return false;
        };
        let varargs = *varargs && !params.is_empty();
        let arity_ok = match varargs {
            true => args.len() + 1 >= params.len(),
            false => args.len() == params.len(),
        };
        if !arity_ok {
            return false;
        }

        args.iter().enumerate().all(|(i, arg)| {
            let Binding::Typed(arg) = arg else {
                return true;
            };
            if varargs && i + 1 >= params.len() {
                let last = params[params.len() - 1].substitute(bindings);
                let element = last.array_element().unwrap_or_else(|| last.clone());
                return self.is_assignable(&arg.ty, &element) || self.is_assignable(&arg.ty, &last);
            }
            match params.get(i) {
                Some(param) => self.is_assignable(&arg.ty, &param.substitute(bindings)),
                None => false,
            }
        })
    }

    /// Boxing, numeric widening, `Object`, type variables and supertypes.
    /// Anything the provider cannot disprove is assignable.
    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if to.is_wildcard() || to.is_type_variable() || from.name == "null" {
            return true;
        }
        let to = to.boxed();
        if to.name == OBJECT && to.array_dims == 0 {
            return true;
        }
        let from = from.boxed();
        if from.array_dims != to.array_dims {
            return false;
        }
        if from.name == to.name {
            return true;
        }
        if let (Some(from_rank), Some(to_rank)) = (numeric_rank(&from.name), numeric_rank(&to.name)) {
            return from_rank <= to_rank;
        }
        match self.provider.resolve_type(&from.name, self.project) {
            Resolution::Resolved(info) => !matches!(
                self.walk_supertypes(info, &from, |info, _| (info.name == to.name).then_some(())),
                Resolution::Unresolved
            ),
            Resolution::Pending(_) | Resolution::Unresolved => true,
        }
    }
}

fn is_integer(ty: &TypeRef) -> bool {
    let ty = ty.boxed();
    ty.array_dims == 0
        && matches!(
            ty.name.as_str(),
            INTEGER | LONG | "java.lang.Short" | "java.lang.Byte"
        )
}

fn is_index(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Infix operators whose result has the left operand's type.
fn keeps_left_type(op: &str) -> bool {
    matches!(op, "or" | "?:" | "ifTruthy" | "+" | "-" | "*" | "/" | "%")
}

/// Infix operators that always produce a boolean.
fn yields_boolean(op: &str) -> bool {
    matches!(
        op,
        "&&" | "||"
            | "and"
            | "=="
            | "!="
            | "eq"
            | "ne"
            | "is"
            | "gt"
            | "ge"
            | "lt"
            | "le"
            | ">"
            | ">="
            | "<"
            | "<="
    )
}

// ============================================================================
// CHECKER
// ============================================================================

struct Checker<'a> {
    template: &'a Template,
    env: &'a ValidationEnv<'a>,
    cancel: &'a CancellationToken,
    collector: DiagnosticCollector,
    pending: Vec<PendingLookup>,
    pending_keys: FxHashSet<SmolStr>,
    resolved: FxHashMap<TextRange, ResolvedType>,
    incomplete: bool,
}

impl Checker<'_> {
    fn run(mut self) -> Result<Validation, AnalysisError> {
        if !self.env.settings.enabled {
            return Ok(Validation::default());
        }

        let mut root = ResolutionContext::root();
        self.bind_declarations(&mut root)?;
        self.check_children(NodeId::ROOT, &root)?;

        let validation = Validation {
            diagnostics: self.collector.take(),
            pending: self.pending,
            resolved: self.resolved,
            data_model_incomplete: self.incomplete,
        };
        debug!(
            diagnostics = validation.diagnostics.len(),
            pending = validation.pending.len(),
            resolved = validation.resolved.len(),
            incomplete = validation.data_model_incomplete,
            "validated template"
        );
        Ok(validation)
    }

    fn defer(&mut self, lookup: PendingLookup) {
        if self.pending_keys.insert(SmolStr::new(lookup.key())) {
            trace!(key = lookup.key(), "lookup pending");
            self.pending.push(lookup);
        }
    }

    fn record(&mut self, part: &Part, binding: &Binding) {
        if let Binding::Typed(ty) = binding {
            self.resolved.insert(part.range, ty.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    /// Bind every `{@Type alias}` in the root frame, wherever it appears.
    fn bind_declarations(&mut self, root: &mut ResolutionContext<'_>) -> Result<(), AnalysisError> {
        let template = self.template;
        for id in template.nodes_of(NodeKindTag::ParameterDeclaration) {
            check_cancelled(self.cancel)?;
            let Some(decl) = template.node(id).as_parameter_declaration() else {
                continue;
            };
            let Some(class_range) = decl.parts.class_name else {
                continue;
            };
            let signature = template.text(class_range);
            let binding = match TypeRef::parse_with_names(signature) {
                Some((ty, names)) => self.declared_type(&ty, class_range, &names),
                None => {
                    self.collector.unknown_type(class_range, signature);
                    Binding::Unknown
                }
            };
            if let Some(alias) = decl.parts.alias {
                trace!(alias = template.text(alias), "declared parameter");
                root.bind(template.text(alias), binding);
            }
        }
        Ok(())
    }

    /// Resolve every class named in a declared signature, reporting the
    /// unknown ones on their own sub-range.
    fn declared_type(
        &mut self,
        ty: &TypeRef,
        range: TextRange,
        names: &[(SmolStr, TextRange)],
    ) -> Binding {
        let env = self.env;
        let mut base_info = None;
        let mut missing = false;
        let mut pending = false;
        for (i, (name, name_range)) in names.iter().enumerate() {
            if !is_class_name(name) {
                continue;
            }
            match env.provider.resolve_type(name, env.project) {
                Resolution::Resolved(info) if i == 0 => base_info = Some(info),
                Resolution::Resolved(_) => {}
                Resolution::Pending(lookup) => {
                    self.defer(lookup);
                    pending = true;
                }
                Resolution::Unresolved => {
                    self.collector
                        .unknown_type(*name_range + range.start(), name);
                    missing = true;
                }
            }
        }

        if missing {
            Binding::Unknown
        } else if pending {
            Binding::Pending
        } else {
            let info = base_info.filter(|_| !ty.is_array());
            Binding::Typed(ResolvedType::new(ty.clone(), info))
        }
    }

    // ------------------------------------------------------------------------
    // Tree walk
    // ------------------------------------------------------------------------

    fn check_children(
        &mut self,
        parent: NodeId,
        ctx: &ResolutionContext<'_>,
    ) -> Result<(), AnalysisError> {
        let template = self.template;
        for &child in template.children(parent) {
            check_cancelled(self.cancel)?;
            match template.node(child).kind() {
                NodeKind::Section(_) => self.check_section(child, ctx)?,
                NodeKind::Expression(_) => {
                    if let Some(expr) = template.expression(child) {
                        self.check_expression(expr, ctx, false);
                    }
                }
                NodeKind::Template
                | NodeKind::ParameterDeclaration(_)
                | NodeKind::Comment(_)
                | NodeKind::CData(_)
                | NodeKind::Text => {}
            }
        }
        Ok(())
    }

    fn check_section(&mut self, id: NodeId, ctx: &ResolutionContext<'_>) -> Result<(), AnalysisError> {
        let template = self.template;
        let Some(section) = template.section(id) else {
            return Ok(());
        };
        let params = template.parameters(id);
        let role = |name: &str| params.iter().find(|p| p.role == Some(name));

        match section.kind {
            SectionKind::Each | SectionKind::For => {
                let alias = role(ALIAS).map_or_else(|| SmolStr::new(DEFAULT_ALIAS), |p| p.name.clone());
                let element = match role(ITERABLE).and_then(|p| p.expression.as_ref()) {
                    Some(expr) => {
                        let iterable = self.check_expression(expr, ctx, true);
                        self.element_binding(iterable, expr)
                    }
                    None => Binding::Unknown,
                };

                let mut scope = ctx.child();
                for (suffix, ty) in LOOP_METADATA {
                    scope.bind(
                        format!("{alias}_{suffix}"),
                        Binding::Typed(ResolvedType::builtin(ty)),
                    );
                }
                trace!(alias = %alias, depth = scope.depth(), "loop scope");
                scope.bind(alias, element);
                self.check_children(id, &scope)
            }
            SectionKind::With => {
                let ambient = match role(WITH_OBJECT).and_then(|p| p.expression.as_ref()) {
                    Some(expr) => self.check_expression(expr, ctx, false),
                    None => Binding::Unknown,
                };
                let mut scope = ctx.child();
                scope.set_ambient(ambient);
                self.check_children(id, &scope)
            }
            SectionKind::Let | SectionKind::Set => {
                let mut scope = ctx.child();
                for param in params.iter().filter(|p| p.is_assignment()) {
                    let binding = match &param.expression {
                        Some(expr) => self.check_expression(expr, ctx, false),
                        None => Binding::Unknown,
                    };
                    scope.bind(param.name.clone(), binding);
                }
                self.check_children(id, &scope)
            }
            _ => {
                for expr in params.iter().filter_map(|p| p.expression.as_ref()) {
                    self.check_expression(expr, ctx, false);
                }
                self.check_children(id, ctx)
            }
        }
    }

    /// Element binding of a loop, reporting a resolved non-iterable.
    fn element_binding(&mut self, iterable: Binding, expr: &Expression) -> Binding {
        let Binding::Typed(ty) = iterable else {
            return iterable;
        };
        match self.element_of(&ty, 0) {
            Some(element) => element,
            None => {
                let range = expr.last_part().map_or(expr.range, |p| p.range);
                self.collector.not_iterable(range, &ty.signature());
                Binding::Unknown
            }
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Report syntax problems, then resolve.
    fn check_expression(
        &mut self,
        expr: &Expression,
        ctx: &ResolutionContext<'_>,
        iterable: bool,
    ) -> Binding {
        for problem in expr.all_problems() {
            self.collector
                .syntax_error(problem.range, problem.kind.message());
        }
        self.resolve_expression(expr, ctx, iterable)
    }

    fn resolve_expression(
        &mut self,
        expr: &Expression,
        ctx: &ResolutionContext<'_>,
        iterable: bool,
    ) -> Binding {
        if let Some(literal) = expr.literal {
            let ty = ResolvedType::builtin(literal.type_name());
            self.resolved.insert(expr.range, ty.clone());
            return Binding::Typed(ty);
        }

        let parts = &expr.parts;
        let Some(first) = parts.first() else {
            return Binding::Unknown;
        };
        let last = parts.len() - 1;

        let (mut current, rest) = if first.is_namespace() {
            let Some(object) = parts.get(1) else {
                return Binding::Unknown;
            };
            (
                self.resolve_namespaced(first, object, ctx, iterable && last == 1),
                2,
            )
        } else {
            (self.resolve_object(first, ctx, iterable && last == 0), 1)
        };

        for (i, part) in parts.iter().enumerate().skip(rest) {
            current = match current {
                Binding::Typed(receiver) => {
                    self.resolve_member(&receiver, part, ctx, iterable && part.index == last)
                }
                other => {
                    self.resolve_detached_args(&parts[i..], ctx);
                    return other;
                }
            };
        }
        current
    }

    /// Arguments are independent expressions: they are still checked when
    /// the receiver chain stopped resolving.
    fn resolve_detached_args(&mut self, parts: &[Part], ctx: &ResolutionContext<'_>) {
        for part in parts {
            if let PartKind::Method(call) = &part.kind {
                self.resolve_args(call, ctx);
            }
        }
    }

    fn resolve_args(&mut self, call: &MethodCall, ctx: &ResolutionContext<'_>) -> Vec<Binding> {
        call.args
            .iter()
            .map(|arg| self.resolve_expression(arg, ctx, false))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Root objects
    // ------------------------------------------------------------------------

    fn resolve_object(&mut self, part: &Part, ctx: &ResolutionContext<'_>, iterable: bool) -> Binding {
        let binding = match &part.kind {
            PartKind::Object {
                literal: Some(literal),
            } => Binding::Typed(ResolvedType::builtin(literal.type_name())),
            PartKind::Method(call) => self.resolve_root_method(part, call, ctx),
            _ => self.lookup_object(part, ctx, iterable),
        };
        self.record(part, &binding);
        binding
    }

    /// Scope chain (frame bindings, then the frame's ambient object),
    /// then the data model.
    fn lookup_object(&mut self, part: &Part, ctx: &ResolutionContext<'_>, iterable: bool) -> Binding {
        let name = part.name.as_str();
        for frame in ctx.frames() {
            if let Some(binding) = frame.binding(name) {
                return binding.clone();
            }
            match frame.ambient() {
                Some(Binding::Typed(ambient)) => {
                    if let Some(binding) = self.silent_property(ambient, name) {
                        return binding;
                    }
                }
                Some(other) => return other.clone(),
                None => {}
            }
        }

        let env = self.env;
        match env.data_model.lookup(name) {
            Some(ty) => self.binding_for(ty),
            None => self.unresolved_object(part, None, iterable),
        }
    }

    /// A bare `method()` call resolves against the nearest ambient object.
    fn resolve_root_method(
        &mut self,
        part: &Part,
        call: &MethodCall,
        ctx: &ResolutionContext<'_>,
    ) -> Binding {
        let args = self.resolve_args(call, ctx);
        let env = self.env;
        for frame in ctx.frames() {
            match frame.ambient() {
                Some(Binding::Typed(ambient)) => {
                    let info = match self.info_for(ambient) {
                        Resolution::Resolved(info) => info,
                        Resolution::Pending(lookup) => {
                            self.defer(lookup);
                            return Binding::Pending;
                        }
                        Resolution::Unresolved => return Binding::Unknown,
                    };
                    match env.find_method(&part.name, info, &ambient.ty, &args) {
                        MethodLookup::Found(ty) => return self.binding_for(&ty),
                        MethodLookup::Pending(lookup) => {
                            self.defer(lookup);
                            return Binding::Pending;
                        }
                        MethodLookup::NotApplicable | MethodLookup::Missing => {}
                    }
                }
                Some(other) => return other.clone(),
                None => {}
            }
        }
        self.unresolved_object(part, None, false)
    }

    fn resolve_namespaced(
        &mut self,
        namespace_part: &Part,
        object: &Part,
        ctx: &ResolutionContext<'_>,
        iterable: bool,
    ) -> Binding {
        let env = self.env;
        let namespace = namespace_part.name.as_str();

        let binding = if namespace == DATA_NAMESPACE {
            match ctx.root_frame().binding(&object.name) {
                Some(binding) => binding.clone(),
                None => match env.data_model.lookup(&object.name) {
                    Some(ty) => self.binding_for(ty),
                    None => self.unresolved_object(object, Some(namespace), iterable),
                },
            }
        } else if !env.namespaces.has_namespace(namespace) {
            if let Some(severity) = env.settings.undefined_namespace_severity {
                self.collector
                    .unknown_namespace(namespace_part.range, namespace, severity);
            }
            Binding::Unknown
        } else {
            if let PartKind::Method(call) = &object.kind {
                self.resolve_args(call, ctx);
            }
            match env.namespaces.resolve(namespace, &object.name) {
                Resolution::Resolved(ty) => self.binding_for(&ty),
                Resolution::Pending(lookup) => {
                    self.defer(lookup);
                    Binding::Pending
                }
                Resolution::Unresolved => self.unresolved_object(object, Some(namespace), iterable),
            }
        };
        self.record(object, &binding);
        binding
    }

    /// Unresolved root names are only reported against a fully loaded data
    /// model; until then the pass is flagged incomplete.
    fn unresolved_object(&mut self, part: &Part, namespace: Option<&str>, iterable: bool) -> Binding {
        let env = self.env;
        if !env.data_model.is_loaded() {
            self.incomplete = true;
            return Binding::Unknown;
        }
        if env.settings.is_excluded(&part.name) {
            return Binding::Unknown;
        }
        if let Some(severity) = env.settings.undefined_object_severity {
            self.collector
                .undefined_object(part.range, &part.name, namespace, iterable, severity);
        }
        Binding::Unknown
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    fn resolve_member(
        &mut self,
        receiver: &ResolvedType,
        part: &Part,
        ctx: &ResolutionContext<'_>,
        iterable_last: bool,
    ) -> Binding {
        let binding = match &part.kind {
            PartKind::Method(call) if call.infix => {
                let args = self.resolve_args(call, ctx);
                let op = part.name.as_str();
                if keeps_left_type(op) {
                    Binding::Typed(receiver.clone())
                } else if yields_boolean(op) {
                    Binding::Typed(ResolvedType::builtin(BOOLEAN))
                } else {
                    self.resolve_call(receiver, part, &args, 0)
                }
            }
            PartKind::Method(call) => {
                let args = self.resolve_args(call, ctx);
                self.resolve_call(receiver, part, &args, 0)
            }
            _ => self.resolve_property(receiver, part, iterable_last, 0),
        };
        self.record(part, &binding);
        binding
    }

    fn resolve_property(
        &mut self,
        receiver: &ResolvedType,
        part: &Part,
        iterable_last: bool,
        depth: usize,
    ) -> Binding {
        let env = self.env;
        let name = part.name.as_str();

        if receiver.ty.is_array() {
            if name == "length" {
                return Binding::Typed(ResolvedType::builtin(INTEGER));
            }
            if is_index(name) {
                return match receiver.ty.array_element() {
                    Some(element) => self.binding_for(&element),
                    None => Binding::Unknown,
                };
            }
            self.collector.unknown_member(
                part.range,
                DiagnosticCode::UnknownProperty,
                name,
                &receiver.signature(),
                iterable_last,
            );
            return Binding::Unknown;
        }

        let info = match self.info_for(receiver) {
            Resolution::Resolved(info) => info,
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                return Binding::Pending;
            }
            Resolution::Unresolved => return Binding::Unknown,
        };
        if let Some(unwrapped) = self.unwrap(receiver, &info, depth) {
            return match unwrapped {
                Binding::Typed(inner) => self.resolve_property(&inner, part, iterable_last, depth + 1),
                other => other,
            };
        }
        if is_index(name) {
            if let Some(element) = self.element_of(receiver, depth) {
                return element;
            }
        }

        match env.find_property(name, info, &receiver.ty) {
            Resolution::Resolved(ty) => return self.binding_for(&ty),
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                return Binding::Pending;
            }
            Resolution::Unresolved => {}
        }

        // Outside an iteration target, members of an iterable's element
        // are reachable through the iterable itself.
        if !iterable_last {
            if let Some(Binding::Typed(element)) = self.element_of(receiver, depth) {
                if let Some(binding) = self.silent_property(&element, name) {
                    return binding;
                }
            }
        }

        self.collector.unknown_member(
            part.range,
            DiagnosticCode::UnknownProperty,
            name,
            &receiver.signature(),
            iterable_last,
        );
        Binding::Unknown
    }

    fn resolve_call(
        &mut self,
        receiver: &ResolvedType,
        part: &Part,
        args: &[Binding],
        depth: usize,
    ) -> Binding {
        let env = self.env;
        let name = part.name.as_str();

        let info = match self.info_for(receiver) {
            Resolution::Resolved(info) => info,
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                return Binding::Pending;
            }
            Resolution::Unresolved if receiver.ty.is_array() => {
                self.collector.unknown_member(
                    part.range,
                    DiagnosticCode::UnknownMethod,
                    name,
                    &receiver.signature(),
                    false,
                );
                return Binding::Unknown;
            }
            Resolution::Unresolved => return Binding::Unknown,
        };
        if let Some(unwrapped) = self.unwrap(receiver, &info, depth) {
            return match unwrapped {
                Binding::Typed(inner) => self.resolve_call(&inner, part, args, depth + 1),
                other => other,
            };
        }

        match env.find_method(name, info, &receiver.ty, args) {
            MethodLookup::Found(ty) => self.binding_for(&ty),
            MethodLookup::Pending(lookup) => {
                self.defer(lookup);
                Binding::Pending
            }
            MethodLookup::NotApplicable => {
                self.collector
                    .invalid_method_parameter(part.range, name, &receiver.signature());
                Binding::Unknown
            }
            MethodLookup::Missing => {
                self.collector.unknown_member(
                    part.range,
                    DiagnosticCode::UnknownMethod,
                    name,
                    &receiver.signature(),
                    false,
                );
                Binding::Unknown
            }
        }
    }

    /// Property lookup that reports nothing; `None` when the name is absent.
    fn silent_property(&mut self, receiver: &ResolvedType, name: &str) -> Option<Binding> {
        let env = self.env;
        let info = match self.info_for(receiver) {
            Resolution::Resolved(info) => info,
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                return Some(Binding::Pending);
            }
            Resolution::Unresolved => return None,
        };
        match env.find_property(name, info, &receiver.ty) {
            Resolution::Resolved(ty) => Some(self.binding_for(&ty)),
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                Some(Binding::Pending)
            }
            Resolution::Unresolved => None,
        }
    }

    // ------------------------------------------------------------------------
    // Type plumbing
    // ------------------------------------------------------------------------

    /// Host description of a resolved type, fetched lazily for built-ins.
    fn info_for(&self, ty: &ResolvedType) -> Resolution<Arc<TypeInfo>> {
        if let Some(info) = &ty.info {
            return Resolution::Resolved(Arc::clone(info));
        }
        let boxed = ty.ty.boxed();
        if boxed.is_array() || boxed.is_wildcard() || boxed.name == "null" {
            return Resolution::Unresolved;
        }
        self.env.provider.resolve_type(&boxed.name, self.env.project)
    }

    /// Binding for a type named by a host signature. A class the provider
    /// does not describe is still a valid type, just without members.
    fn binding_for(&mut self, ty: &TypeRef) -> Binding {
        if ty.is_wildcard() {
            return Binding::Unknown;
        }
        if ty.is_array() || ty.is_primitive() {
            return Binding::Typed(ResolvedType::new(ty.clone(), None));
        }
        match self.env.provider.resolve_type(&ty.name, self.env.project) {
            Resolution::Resolved(info) => Binding::Typed(ResolvedType::new(ty.clone(), Some(info))),
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                Binding::Pending
            }
            Resolution::Unresolved => Binding::Typed(ResolvedType::new(ty.clone(), None)),
        }
    }

    /// The wrapped type of an asynchronous wrapper.
    fn unwrap(&mut self, ty: &ResolvedType, info: &TypeInfo, depth: usize) -> Option<Binding> {
        if depth >= self.env.settings.max_supertype_depth {
            return None;
        }
        let wrapped = info.wrapper.as_ref()?.substitute(&info.substitution(&ty.ty));
        Some(self.binding_for(&wrapped))
    }

    /// Element binding when `ty` can be iterated; `None` when it cannot.
    fn element_of(&mut self, ty: &ResolvedType, depth: usize) -> Option<Binding> {
        if let Some(element) = ty.ty.array_element() {
            return Some(self.binding_for(&element));
        }
        if is_integer(&ty.ty) {
            return Some(Binding::Typed(ResolvedType::builtin(INTEGER)));
        }

        let env = self.env;
        let info = match self.info_for(ty) {
            Resolution::Resolved(info) => info,
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                return Some(Binding::Pending);
            }
            Resolution::Unresolved => return Some(Binding::Unknown),
        };
        if let Some(unwrapped) = self.unwrap(ty, &info, depth) {
            return match unwrapped {
                Binding::Typed(inner) => self.element_of(&inner, depth + 1),
                other => Some(other),
            };
        }

        let element = env.walk_supertypes(info, &ty.ty, |info, bindings| {
            info.iterable.as_ref().map(|e| e.substitute(bindings))
        });
        match element {
            Resolution::Resolved(element) => Some(self.binding_for(&element)),
            Resolution::Pending(lookup) => {
                self.defer(lookup);
                Some(Binding::Pending)
            }
            Resolution::Unresolved => None,
        }
    }
}
