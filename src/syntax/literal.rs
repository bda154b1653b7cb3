//! Literal detection. A pure function of the raw text; never consults types.

/// Literal categories and their host type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    Boolean,
    Null,
    Integer,
    Long,
    Double,
    Float,
}

impl LiteralKind {
    /// Qualified name of the built-in host type the literal evaluates to.
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralKind::String => "java.lang.String",
            LiteralKind::Boolean => "java.lang.Boolean",
            LiteralKind::Null => "null",
            LiteralKind::Integer => "java.lang.Integer",
            LiteralKind::Long => "java.lang.Long",
            LiteralKind::Double => "java.lang.Double",
            LiteralKind::Float => "java.lang.Float",
        }
    }
}

/// Detect whether `text` (already trimmed) is a literal.
pub fn literal_kind(text: &str) -> Option<LiteralKind> {
    match text {
        "" => return None,
        "true" | "false" => return Some(LiteralKind::Boolean),
        "null" => return Some(LiteralKind::Null),
        _ => {}
    }
    if is_quoted(text) {
        return Some(LiteralKind::String);
    }
    numeric_kind(text)
}

fn is_quoted(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
        && !text[1..text.len() - 1].contains(bytes[0] as char)
}

fn numeric_kind(text: &str) -> Option<LiteralKind> {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (digits, suffix) = match body.chars().last()? {
        'l' | 'L' => (&body[..body.len() - 1], Some(LiteralKind::Long)),
        'd' | 'D' => (&body[..body.len() - 1], Some(LiteralKind::Double)),
        'f' | 'F' => (&body[..body.len() - 1], Some(LiteralKind::Float)),
        _ => (body, None),
    };

    let mut split = digits.splitn(2, '.');
    let whole = split.next().unwrap_or("");
    let fraction = split.next();
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    match (suffix, fraction.is_some()) {
        (Some(LiteralKind::Long), true) => None,
        (Some(kind), _) => Some(kind),
        (None, true) => Some(LiteralKind::Double),
        (None, false) => Some(LiteralKind::Integer),
    }
}
