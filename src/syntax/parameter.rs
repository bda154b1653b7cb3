//! Parameter micro-parser: splits a section's parameter region.
//!
//! `{#for item in items}` yields three parameters; the loop schema marks only
//! `items` as a type-bearing expression. `{#let name=item.name}` yields one
//! assignment whose value is the expression.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::expression::{Expression, parse_expression};
use super::lexer::{LexKind, Lexeme, lex};
use super::section::{ParameterInfo, ParameterMode, SectionKind, is_operator_keyword};

/// A `name` or `name=value` parameter. Offsets are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: SmolStr,
    pub name_range: TextRange,
    pub value: Option<SmolStr>,
    pub value_range: Option<TextRange>,
    /// Offset of `=` when the parameter is an assignment.
    pub assign_offset: Option<TextSize>,
    /// Schema entry this positional parameter matched.
    pub role: Option<&'static str>,
    /// Type-bearing view over the name or value range.
    pub expression: Option<Expression>,
}

impl Parameter {
    pub fn is_assignment(&self) -> bool {
        self.assign_offset.is_some()
    }

    /// Whole range from name start to value end.
    pub fn range(&self) -> TextRange {
        match self.value_range {
            Some(value) => self.name_range.cover(value),
            None => self.name_range,
        }
    }
}

/// Parse the parameter region `region` of a section of `kind`.
pub fn parse_parameters(source: &str, region: TextRange, kind: SectionKind) -> Vec<Parameter> {
    let splitter = Splitter {
        source,
        lexemes: lex(&source[region], region.start()),
    };
    let mut params = splitter.split();

    match kind.parameter_mode() {
        ParameterMode::Positional(schema) => assign_roles(source, &mut params, schema),
        ParameterMode::Operands => return operands(source, params),
        ParameterMode::Assignments => {
            for param in params.iter_mut().filter(|p| p.is_assignment()) {
                param.expression = value_expression(source, param);
            }
        }
        ParameterMode::UserTag => {
            let mut positional_seen = false;
            for param in params.iter_mut() {
                if param.is_assignment() {
                    param.expression = value_expression(source, param);
                } else if !positional_seen {
                    positional_seen = true;
                    param.role = Some("it");
                    param.expression = Some(expression_over(source, param.name_range));
                }
            }
        }
        ParameterMode::Literal => {}
    }
    params
}

/// Match positional parameters against `schema`.
///
/// With at least as many parameters as entries, the mapping is 1:1.
/// Otherwise parameters fill the entries lacking a default value, in order.
fn assign_roles(source: &str, params: &mut [Parameter], schema: &'static [ParameterInfo]) {
    let positional: Vec<usize> = (0..params.len())
        .filter(|&i| !params[i].is_assignment())
        .collect();

    let entries: Vec<&'static ParameterInfo> = if positional.len() >= schema.len() {
        schema.iter().collect()
    } else {
        schema.iter().filter(|info| info.is_expression()).collect()
    };

    for (&index, info) in positional.iter().zip(entries) {
        let param = &mut params[index];
        param.role = Some(info.name);
        if info.is_expression() {
            param.expression = Some(expression_over(source, param.name_range));
        }
    }
}

/// Operand mode: every non-operator operand is an expression. Leading `!`
/// is stripped and parenthesized groups are split recursively.
fn operands(source: &str, params: Vec<Parameter>) -> Vec<Parameter> {
    let mut out = Vec::with_capacity(params.len());
    for mut param in params {
        if param.is_assignment() || is_operator_keyword(&param.name) {
            out.push(param);
            continue;
        }

        let mut range = param.name_range;
        let mut text = param.name.as_str();
        while let Some(rest) = text.strip_prefix('!') {
            range = TextRange::new(range.start() + TextSize::of('!'), range.end());
            text = rest;
        }

        if text.len() >= 2 && text.starts_with('(') && text.ends_with(')') {
            let inner = TextRange::new(
                range.start() + TextSize::of('('),
                range.end() - TextSize::of(')'),
            );
            let splitter = Splitter {
                source,
                lexemes: lex(&source[inner], inner.start()),
            };
            out.extend(operands(source, splitter.split()));
            continue;
        }

        if !text.is_empty() {
            param.expression = Some(expression_over(source, range));
        }
        out.push(param);
    }
    out
}

fn value_expression(source: &str, param: &Parameter) -> Option<Expression> {
    param.value_range.map(|range| expression_over(source, range))
}

fn expression_over(source: &str, range: TextRange) -> Expression {
    parse_expression(&source[range], range.start())
}

struct Splitter<'a> {
    source: &'a str,
    lexemes: Vec<Lexeme>,
}

impl Splitter<'_> {
    fn text(&self, range: TextRange) -> &str {
        &self.source[range]
    }

    /// Whitespace-separated segments at parenthesis depth 0.
    fn segments(&self) -> Vec<(usize, usize)> {
        let mut segments = Vec::new();
        let mut depth = 0usize;
        let mut start = None;
        for (i, lexeme) in self.lexemes.iter().enumerate() {
            match lexeme.kind {
                LexKind::LParen | LexKind::LBracket => depth += 1,
                LexKind::RParen | LexKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            if depth == 0 && lexeme.kind == LexKind::Whitespace {
                if let Some(s) = start.take() {
                    segments.push((s, i));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            segments.push((s, self.lexemes.len()));
        }
        segments
    }

    fn cover(&self, (lo, hi): (usize, usize)) -> Option<TextRange> {
        (lo < hi).then(|| self.lexemes[lo].range.cover(self.lexemes[hi - 1].range))
    }

    fn eq_position(&self, (lo, hi): (usize, usize)) -> Option<usize> {
        let mut depth = 0usize;
        for i in lo..hi {
            match self.lexemes[i].kind {
                LexKind::LParen | LexKind::LBracket => depth += 1,
                LexKind::RParen | LexKind::RBracket => depth = depth.saturating_sub(1),
                LexKind::Eq if depth == 0 => return Some(i),
                _ => {}
            }
        }
        None
    }

    /// Group segments into parameters, folding `name = value` spellings.
    fn split(&self) -> Vec<Parameter> {
        let segments = self.segments();
        let mut params = Vec::new();
        let mut k = 0;
        while k < segments.len() {
            let seg = segments[k];
            k += 1;

            let (name_span, eq, mut value_span) = match self.eq_position(seg) {
                Some(eq) => ((seg.0, eq), Some(eq), (eq + 1, seg.1)),
                None => match segments.get(k).copied() {
                    // `name =value` or `name = value`
                    Some(next) if self.lexemes[next.0].kind == LexKind::Eq => {
                        k += 1;
                        (seg, Some(next.0), (next.0 + 1, next.1))
                    }
                    _ => (seg, None, (seg.1, seg.1)),
                },
            };
            if eq.is_some() && value_span.0 >= value_span.1 {
                if let Some(next) = segments.get(k).copied() {
                    k += 1;
                    value_span = next;
                }
            }

            let Some(name_range) = self.cover(name_span).or_else(|| {
                eq.map(|e| TextRange::empty(self.lexemes[e].range.start()))
            }) else {
                continue;
            };
            let value_range = eq.and_then(|_| self.cover(value_span));
            params.push(Parameter {
                name: SmolStr::new(self.text(name_range)),
                name_range,
                value: value_range.map(|r| SmolStr::new(self.text(r))),
                value_range,
                assign_offset: eq.map(|e| self.lexemes[e].range.start()),
                role: None,
                expression: None,
            });
        }
        params
    }
}
