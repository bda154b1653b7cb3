//! Host type model: type references, type descriptions and members.
//!
//! A [`TypeRef`] is a signature as written (`java.util.List<org.acme.Item>`,
//! `Item[]`). A [`TypeInfo`] is what the host type provider knows about a
//! class: type parameters, supertypes, members and whether it iterates or
//! wraps another type.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const BOOLEAN: &str = "java.lang.Boolean";
pub const INTEGER: &str = "java.lang.Integer";
pub const LONG: &str = "java.lang.Long";
/// `?`, also bound to type parameters a raw type leaves open.
pub const WILDCARD: &str = "?";

// ============================================================================
// TYPE REFERENCES
// ============================================================================

/// A type signature: qualified name, generic arguments and array depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: SmolStr,
    pub args: Vec<TypeRef>,
    pub array_dims: u8,
}

impl TypeRef {
    pub fn simple(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn generic(name: impl Into<SmolStr>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            array_dims: 0,
        }
    }

    pub fn array_of(element: TypeRef) -> Self {
        Self {
            array_dims: element.array_dims + 1,
            ..element
        }
    }

    /// Parse a signature such as `java.util.Map<String, List<Item>>[]`.
    ///
    /// Returns `None` for malformed input (unbalanced brackets, empty names).
    pub fn parse(signature: &str) -> Option<TypeRef> {
        Self::parse_with_names(signature).map(|(ty, _)| ty)
    }

    /// Like [`parse`](Self::parse), also returning every name written in the
    /// signature with its range relative to the signature start, outermost
    /// first.
    pub fn parse_with_names(signature: &str) -> Option<(TypeRef, Vec<(SmolStr, TextRange)>)> {
        let mut parser = SignatureParser {
            text: signature.as_bytes(),
            source: signature,
            pos: 0,
            names: Vec::new(),
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        (parser.pos == signature.len()).then_some((ty, parser.names))
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// Element type of an array signature.
    pub fn array_element(&self) -> Option<TypeRef> {
        self.is_array().then(|| TypeRef {
            array_dims: self.array_dims - 1,
            ..self.clone()
        })
    }

    pub fn is_primitive(&self) -> bool {
        self.array_dims == 0 && boxed_name(&self.name).is_some()
    }

    /// Primitive types map to their wrapper class; everything else is unchanged.
    pub fn boxed(&self) -> TypeRef {
        match (self.array_dims, boxed_name(&self.name)) {
            (0, Some(name)) => TypeRef::simple(name),
            _ => self.clone(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.args.is_empty() && self.name == WILDCARD
    }

    /// Unqualified one- or two-letter uppercase names like `T` or `E`.
    /// Only meaningful in member signatures, for method type parameters
    /// the declaring class does not list.
    pub fn is_type_variable(&self) -> bool {
        self.args.is_empty()
            && !self.name.contains('.')
            && self.name.len() <= 2
            && self.name.starts_with(|c: char| c.is_ascii_uppercase())
    }

    /// Replace type variables bound in `bindings`.
    pub fn substitute(&self, bindings: &FxHashMap<SmolStr, TypeRef>) -> TypeRef {
        if self.args.is_empty() {
            if let Some(bound) = bindings.get(&self.name) {
                let mut ty = bound.clone();
                ty.array_dims += self.array_dims;
                return ty;
            }
        }
        TypeRef {
            name: self.name.clone(),
            args: self.args.iter().map(|a| a.substitute(bindings)).collect(),
            array_dims: self.array_dims,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Whether `name` names a class: not a primitive, not a wildcard.
pub(crate) fn is_class_name(name: &str) -> bool {
    name != WILDCARD && boxed_name(name).is_none()
}

fn boxed_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "boolean" => BOOLEAN,
        "byte" => "java.lang.Byte",
        "short" => "java.lang.Short",
        "char" => "java.lang.Character",
        "int" => INTEGER,
        "long" => LONG,
        "float" => "java.lang.Float",
        "double" => "java.lang.Double",
        _ => return None,
    })
}

/// Widening rank of a boxed numeric type.
pub(crate) fn numeric_rank(name: &str) -> Option<u8> {
    Some(match name {
        "java.lang.Byte" => 0,
        "java.lang.Short" | "java.lang.Character" => 1,
        INTEGER => 2,
        LONG => 3,
        "java.lang.Float" => 4,
        "java.lang.Double" => 5,
        _ => return None,
    })
}

struct SignatureParser<'a> {
    text: &'a [u8],
    source: &'a str,
    pos: usize,
    names: Vec<(SmolStr, TextRange)>,
}

impl SignatureParser<'_> {
    fn skip_ws(&mut self) {
        while self.pos < self.text.len() && self.text[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.text.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.text.len() {
            let c = self.text[self.pos];
            if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'$' | b'.' | b'?') || c >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return None;
        }
        let mut ty = TypeRef::simple(&self.source[start..self.pos]);
        self.names.push((
            ty.name.clone(),
            TextRange::new(TextSize::new(start as u32), TextSize::new(self.pos as u32)),
        ));

        if self.eat(b'<') {
            loop {
                ty.args.push(self.parse_type()?);
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b'>') {
                    break;
                }
                return None;
            }
        }
        while self.eat(b'[') {
            if !self.eat(b']') {
                return None;
            }
            ty.array_dims += 1;
        }
        Some(ty)
    }
}

// ============================================================================
// TYPE DESCRIPTIONS
// ============================================================================

/// A field or method of a host type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberInfo {
    Field {
        name: SmolStr,
        ty: TypeRef,
    },
    Method {
        name: SmolStr,
        params: Vec<TypeRef>,
        return_type: TypeRef,
        varargs: bool,
    },
}

impl MemberInfo {
    pub fn name(&self) -> &SmolStr {
        match self {
            MemberInfo::Field { name, .. } | MemberInfo::Method { name, .. } => name,
        }
    }

    /// Field type or method return type.
    pub fn result_type(&self) -> &TypeRef {
        match self {
            MemberInfo::Field { ty, .. } => ty,
            MemberInfo::Method { return_type, .. } => return_type,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, MemberInfo::Method { .. })
    }

    fn is_accessor(&self) -> bool {
        matches!(self, MemberInfo::Method { params, .. } if params.is_empty())
    }
}

/// What the host knows about one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: SmolStr,
    pub type_params: Vec<SmolStr>,
    pub super_types: Vec<TypeRef>,
    /// Members by name; methods may be overloaded.
    pub members: IndexMap<SmolStr, Vec<MemberInfo>>,
    /// Element type when the class is iterable. May mention type parameters.
    pub iterable: Option<TypeRef>,
    /// Wrapped type when the class is an asynchronous wrapper.
    pub wrapper: Option<TypeRef>,
}

impl TypeInfo {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            super_types: Vec::new(),
            members: IndexMap::new(),
            iterable: None,
            wrapper: None,
        }
    }

    pub fn with_type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_super_type(mut self, super_type: TypeRef) -> Self {
        self.super_types.push(super_type);
        self
    }

    pub fn with_field(mut self, name: impl Into<SmolStr>, ty: TypeRef) -> Self {
        let name = name.into();
        self.members
            .entry(name.clone())
            .or_default()
            .push(MemberInfo::Field { name, ty });
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<SmolStr>,
        params: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Self {
        self.push_method(name.into(), params, return_type, false);
        self
    }

    pub fn with_varargs_method(
        mut self,
        name: impl Into<SmolStr>,
        params: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Self {
        self.push_method(name.into(), params, return_type, true);
        self
    }

    fn push_method(&mut self, name: SmolStr, params: Vec<TypeRef>, return_type: TypeRef, varargs: bool) {
        self.members
            .entry(name.clone())
            .or_default()
            .push(MemberInfo::Method {
                name,
                params,
                return_type,
                varargs,
            });
    }

    pub fn iterable_of(mut self, element: TypeRef) -> Self {
        self.iterable = Some(element);
        self
    }

    pub fn wrapping(mut self, wrapped: TypeRef) -> Self {
        self.wrapper = Some(wrapped);
        self
    }

    /// Property lookup on this class only: a field, a zero-argument method,
    /// then the `getName()` / `isName()` accessor conventions.
    pub fn find_property(&self, name: &str) -> Option<&MemberInfo> {
        let direct = self.members.get(name).and_then(|members| {
            members
                .iter()
                .find(|m| !m.is_method())
                .or_else(|| members.iter().find(|m| m.is_accessor()))
        });
        if direct.is_some() {
            return direct;
        }

        let mut chars = name.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return None,
        };
        ["get", "is"].iter().find_map(|prefix| {
            self.members
                .get(format!("{prefix}{capitalized}").as_str())?
                .iter()
                .find(|m| m.is_accessor())
        })
    }

    /// All overloads of a method on this class only.
    pub fn find_methods<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MemberInfo> + 'a {
        self.members
            .get(name)
            .into_iter()
            .flatten()
            .filter(|m| m.is_method())
    }

    /// Bind this class's type parameters to the arguments of `ty`.
    /// Parameters a raw `ty` leaves open bind to [`WILDCARD`].
    pub fn substitution(&self, ty: &TypeRef) -> FxHashMap<SmolStr, TypeRef> {
        self.type_params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let arg = ty.args.get(i).cloned();
                (param.clone(), arg.unwrap_or_else(|| TypeRef::simple(WILDCARD)))
            })
            .collect()
    }
}

/// A concrete type attached to an expression part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub ty: TypeRef,
    /// Host description when the provider knows the class.
    pub info: Option<Arc<TypeInfo>>,
}

impl ResolvedType {
    pub fn new(ty: TypeRef, info: Option<Arc<TypeInfo>>) -> Self {
        Self { ty, info }
    }

    /// A built-in type that needs no provider round trip.
    pub fn builtin(name: &str) -> Self {
        Self {
            ty: TypeRef::simple(name),
            info: None,
        }
    }

    pub fn signature(&self) -> String {
        self.ty.to_string()
    }
}
