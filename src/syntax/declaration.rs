//! Splitting of parameter declarations: `{@java.util.List<org.acme.Item> items}`.

use text_size::{TextRange, TextSize};

/// Sub-ranges of a parameter declaration body. Offsets are absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDeclarationParts {
    /// Type signature, generics included.
    pub class_name: Option<TextRange>,
    pub alias: Option<TextRange>,
    /// Value after `alias=`.
    pub default_value: Option<TextRange>,
}

/// Split the declaration body `text` starting at `base`.
///
/// Whitespace inside `<...>` belongs to the type signature, so
/// `Map<String, Item> map` yields a single class name.
pub fn parse_declaration(text: &str, base: TextSize) -> ParameterDeclarationParts {
    let at = |i: usize| base + TextSize::new(i as u32);
    let bytes = text.as_bytes();
    let mut parts = ParameterDeclarationParts::default();

    let mut i = skip_whitespace(text, 0);
    let class_start = i;
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            c if c.is_ascii_whitespace() && depth == 0 => break,
            _ => {}
        }
        i += 1;
    }
    if i > class_start {
        parts.class_name = Some(TextRange::new(at(class_start), at(i)));
    }

    i = skip_whitespace(text, i);
    let alias_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
        i += 1;
    }
    if i > alias_start {
        parts.alias = Some(TextRange::new(at(alias_start), at(i)));
    }

    i = skip_whitespace(text, i);
    if i < bytes.len() && bytes[i] == b'=' {
        let value_start = skip_whitespace(text, i + 1);
        let value_end = text.trim_end().len().max(value_start);
        if value_end > value_start {
            parts.default_value = Some(TextRange::new(at(value_start), at(value_end)));
        }
    }

    parts
}

fn skip_whitespace(text: &str, mut i: usize) -> usize {
    let bytes = text.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}
