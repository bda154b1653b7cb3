//! Expression micro-parser: splits `{inject:bean.items.get(0) ?: 'none'}` into parts.
//!
//! An expression is a chain of [`Part`]s:
//!
//! ```text
//! inject : bean . items . get ( 0 )   ?:   'none'
//! ^^^^^^   ^^^^   ^^^^^   ^^^^^^^^^   ^^^^^^^^^^^^
//! Namespace Object Property Method    Method (infix, one argument)
//! ```
//!
//! Literals short-circuit the whole split. Infix operators are only
//! recognised at the top level; method arguments are plain chains.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::lexer::{LexKind, Lexeme, lex};
use super::literal::{LiteralKind, literal_kind};

/// A parsed expression. Offsets are absolute document offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Trimmed range of the expression text.
    pub range: TextRange,
    /// Set when the whole expression is a literal; `parts` is then empty.
    pub literal: Option<LiteralKind>,
    pub parts: Vec<Part>,
    /// Local syntax problems, reported as diagnostics.
    pub problems: Vec<SyntaxProblem>,
}

/// One segment of an access chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub kind: PartKind,
    pub name: SmolStr,
    /// Range of the name token.
    pub range: TextRange,
    /// Position in the chain; the predecessor is `index - 1`.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// `data:` / `inject:` prefix, first position only
    Namespace,
    /// Root identifier, or a literal used as a receiver (`'abc'.length`)
    Object { literal: Option<LiteralKind> },
    Property,
    Method(MethodCall),
}

/// Call details of a method part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub args: Vec<Expression>,
    /// `a or b` / `a ?: b` rewritten as a one-argument call
    pub infix: bool,
    pub open_paren: Option<TextSize>,
    pub close_paren: Option<TextSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxProblemKind {
    TrailingDot,
    EmptyPart,
    UnclosedParenthesis,
    UnterminatedString,
    MissingOperand,
    UnexpectedToken,
}

impl SyntaxProblemKind {
    pub fn message(&self) -> &'static str {
        match self {
            SyntaxProblemKind::TrailingDot => "unexpected '.' at the end of the expression",
            SyntaxProblemKind::EmptyPart => "missing name between '.' separators",
            SyntaxProblemKind::UnclosedParenthesis => "unclosed '(' in method call",
            SyntaxProblemKind::UnterminatedString => "unterminated string literal",
            SyntaxProblemKind::MissingOperand => "missing operand after operator",
            SyntaxProblemKind::UnexpectedToken => "unexpected token in expression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxProblem {
    pub kind: SyntaxProblemKind,
    pub range: TextRange,
}

impl Part {
    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, PartKind::Namespace)
    }

    pub fn method(&self) -> Option<&MethodCall> {
        match &self.kind {
            PartKind::Method(call) => Some(call),
            _ => None,
        }
    }
}

impl Expression {
    fn empty(at: TextSize) -> Self {
        Self {
            range: TextRange::empty(at),
            literal: None,
            parts: Vec::new(),
            problems: Vec::new(),
        }
    }

    pub fn is_literal(&self) -> bool {
        self.literal.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.literal.is_none() && self.parts.is_empty()
    }

    pub fn namespace_part(&self) -> Option<&Part> {
        self.parts.first().filter(|p| p.is_namespace())
    }

    /// First non-namespace part.
    pub fn object_part(&self) -> Option<&Part> {
        self.parts.iter().find(|p| !p.is_namespace())
    }

    pub fn last_part(&self) -> Option<&Part> {
        self.parts.last()
    }

    pub fn previous_part(&self, part: &Part) -> Option<&Part> {
        part.index.checked_sub(1).and_then(|i| self.parts.get(i))
    }

    /// Deepest part whose name range touches `offset`, searching method arguments.
    pub fn part_at(&self, offset: TextSize) -> Option<&Part> {
        for part in &self.parts {
            if let Some(call) = part.method() {
                for arg in &call.args {
                    if let Some(inner) = arg.part_at(offset) {
                        return Some(inner);
                    }
                }
            }
            if part.range.contains_inclusive(offset) {
                return Some(part);
            }
        }
        None
    }

    /// All problems, including those of nested argument expressions.
    pub fn all_problems(&self) -> Vec<SyntaxProblem> {
        let mut out = self.problems.clone();
        for part in &self.parts {
            if let Some(call) = part.method() {
                for arg in &call.args {
                    out.extend(arg.all_problems());
                }
            }
        }
        out
    }
}

/// Parse `text`, whose first byte sits at `base`, as a top-level expression.
pub fn parse_expression(text: &str, base: TextSize) -> Expression {
    let parser = ExpressionParser {
        text,
        base,
        lexemes: lex(text, base),
    };
    parser.parse_range(0, parser.lexemes.len(), true)
}

struct ExpressionParser<'a> {
    text: &'a str,
    base: TextSize,
    lexemes: Vec<Lexeme>,
}

/// Half-open lexeme index span.
type Span = (usize, usize);

impl ExpressionParser<'_> {
    fn slice(&self, range: TextRange) -> &str {
        let start = u32::from(range.start() - self.base) as usize;
        let end = u32::from(range.end() - self.base) as usize;
        &self.text[start..end]
    }

    fn lexeme_text(&self, i: usize) -> &str {
        self.slice(self.lexemes[i].range)
    }

    fn kind(&self, i: usize) -> LexKind {
        self.lexemes[i].kind
    }

    fn cover(&self, (lo, hi): Span) -> TextRange {
        self.lexemes[lo].range.cover(self.lexemes[hi - 1].range)
    }

    fn trim(&self, (mut lo, mut hi): Span) -> Span {
        while lo < hi && self.kind(lo) == LexKind::Whitespace {
            lo += 1;
        }
        while hi > lo && self.kind(hi - 1) == LexKind::Whitespace {
            hi -= 1;
        }
        (lo, hi)
    }

    fn parse_range(&self, lo: usize, hi: usize, allow_infix: bool) -> Expression {
        let (lo, hi) = self.trim((lo, hi));
        if lo >= hi {
            let at = self
                .lexemes
                .get(lo)
                .map(|l| l.range.start())
                .unwrap_or(self.base + TextSize::of(self.text));
            return Expression::empty(at);
        }

        let range = self.cover((lo, hi));
        if let Some(literal) = literal_kind(self.slice(range)) {
            return Expression {
                range,
                literal: Some(literal),
                parts: Vec::new(),
                problems: Vec::new(),
            };
        }

        let mut problems = Vec::new();
        let segments = self.segments((lo, hi));
        let mut parts = self.parse_chain(segments[0], &mut problems);

        if allow_infix {
            let mut i = 1;
            while i < segments.len() {
                let op = segments[i];
                let op_range = self.cover(op);
                let args = match segments.get(i + 1) {
                    Some(&(a, b)) => vec![self.parse_range(a, b, false)],
                    None => {
                        problems.push(SyntaxProblem {
                            kind: SyntaxProblemKind::MissingOperand,
                            range: op_range,
                        });
                        Vec::new()
                    }
                };
                parts.push(Part {
                    kind: PartKind::Method(MethodCall {
                        args,
                        infix: true,
                        open_paren: None,
                        close_paren: None,
                    }),
                    name: SmolStr::new(self.slice(op_range)),
                    range: op_range,
                    index: 0,
                });
                i += 2;
            }
        } else if segments.len() > 1 {
            let rest = (segments[1].0, segments[segments.len() - 1].1);
            problems.push(SyntaxProblem {
                kind: SyntaxProblemKind::UnexpectedToken,
                range: self.cover(rest),
            });
        }

        for (index, part) in parts.iter_mut().enumerate() {
            part.index = index;
        }

        Expression {
            range,
            literal: None,
            parts,
            problems,
        }
    }

    /// Split at depth-0 whitespace; `?:` always forms its own segment.
    fn segments(&self, (lo, hi): Span) -> Vec<Span> {
        let mut segments = Vec::new();
        let mut depth = 0usize;
        let mut start: Option<usize> = None;
        for i in lo..hi {
            match self.kind(i) {
                LexKind::LParen | LexKind::LBracket => depth += 1,
                LexKind::RParen | LexKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            let kind = self.kind(i);
            if depth == 0 && kind == LexKind::Whitespace {
                if let Some(s) = start.take() {
                    segments.push((s, i));
                }
            } else if depth == 0 && kind == LexKind::Elvis {
                if let Some(s) = start.take() {
                    segments.push((s, i));
                }
                segments.push((i, i + 1));
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            segments.push((s, hi));
        }
        segments
    }

    fn parse_chain(&self, (lo, hi): Span, problems: &mut Vec<SyntaxProblem>) -> Vec<Part> {
        let mut parts = Vec::new();
        let mut i = lo;

        if i + 1 < hi && self.kind(i) == LexKind::Ident && self.kind(i + 1) == LexKind::Colon {
            parts.push(self.part(PartKind::Namespace, i));
            i += 2;
            if i >= hi {
                problems.push(SyntaxProblem {
                    kind: SyntaxProblemKind::EmptyPart,
                    range: self.lexemes[i - 1].range,
                });
                return parts;
            }
        }

        while i < hi {
            let first = parts.iter().all(Part::is_namespace);
            match self.kind(i) {
                LexKind::Ident | LexKind::Number | LexKind::Str => {
                    let name_index = i;
                    i += 1;
                    if i < hi && self.kind(i) == LexKind::LParen {
                        let (call, next) = self.parse_call(i, hi, problems);
                        parts.push(self.part(PartKind::Method(call), name_index));
                        i = next;
                    } else if first {
                        let text = self.lexeme_text(name_index);
                        let literal = literal_kind(text);
                        if self.kind(name_index) == LexKind::Str && literal.is_none() {
                            problems.push(SyntaxProblem {
                                kind: SyntaxProblemKind::UnterminatedString,
                                range: self.lexemes[name_index].range,
                            });
                        }
                        parts.push(self.part(PartKind::Object { literal }, name_index));
                    } else if self.kind(name_index) == LexKind::Str {
                        problems.push(SyntaxProblem {
                            kind: SyntaxProblemKind::UnexpectedToken,
                            range: self.lexemes[name_index].range,
                        });
                        return parts;
                    } else {
                        parts.push(self.part(PartKind::Property, name_index));
                    }
                }
                _ => {
                    problems.push(SyntaxProblem {
                        kind: SyntaxProblemKind::UnexpectedToken,
                        range: self.cover((i, hi)),
                    });
                    return parts;
                }
            }

            if i >= hi {
                break;
            }
            if self.kind(i) != LexKind::Dot {
                problems.push(SyntaxProblem {
                    kind: SyntaxProblemKind::UnexpectedToken,
                    range: self.cover((i, hi)),
                });
                return parts;
            }
            if i + 1 >= hi {
                problems.push(SyntaxProblem {
                    kind: SyntaxProblemKind::TrailingDot,
                    range: self.lexemes[i].range,
                });
                return parts;
            }
            i += 1;
            while i < hi && self.kind(i) == LexKind::Dot {
                problems.push(SyntaxProblem {
                    kind: SyntaxProblemKind::EmptyPart,
                    range: self.lexemes[i].range,
                });
                i += 1;
            }
            if i >= hi {
                problems.push(SyntaxProblem {
                    kind: SyntaxProblemKind::TrailingDot,
                    range: self.lexemes[i - 1].range,
                });
                return parts;
            }
        }
        parts
    }

    /// Parse `( args )` starting at the `(` lexeme. Returns the call and the
    /// index following the closing parenthesis.
    fn parse_call(
        &self,
        open: usize,
        hi: usize,
        problems: &mut Vec<SyntaxProblem>,
    ) -> (MethodCall, usize) {
        let mut depth = 0usize;
        let mut close = None;
        let mut arg_start = open + 1;
        let mut arg_spans = Vec::new();
        for i in open..hi {
            match self.kind(i) {
                LexKind::LParen | LexKind::LBracket => depth += 1,
                LexKind::RParen | LexKind::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                LexKind::Comma if depth == 1 => {
                    arg_spans.push((arg_start, i));
                    arg_start = i + 1;
                }
                _ => {}
            }
        }
        let args_end = close.unwrap_or(hi);
        if arg_start < args_end || !arg_spans.is_empty() {
            arg_spans.push((arg_start, args_end));
        }
        if close.is_none() {
            problems.push(SyntaxProblem {
                kind: SyntaxProblemKind::UnclosedParenthesis,
                range: self.lexemes[open].range,
            });
        }

        let args = arg_spans
            .into_iter()
            .map(|(a, b)| self.parse_range(a, b, false))
            .collect();
        let call = MethodCall {
            args,
            infix: false,
            open_paren: Some(self.lexemes[open].range.start()),
            close_paren: close.map(|c| self.lexemes[c].range.start()),
        };
        (call, close.map_or(hi, |c| c + 1))
    }

    fn part(&self, kind: PartKind, i: usize) -> Part {
        let range = self.lexemes[i].range;
        Part {
            kind,
            name: SmolStr::new(self.slice(range)),
            range,
            index: 0,
        }
    }
}

