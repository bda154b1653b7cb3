//! Logos-based lexer shared by the parameter and expression micro-parsers.

use logos::Logos;
use text_size::{TextRange, TextSize};

use crate::base::text::is_ident_continue;

/// Kind of a lexeme inside a parameter region or expression body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexKind {
    Whitespace,
    Ident,
    Number,
    /// Quoted string; may be unterminated
    Str,
    Dot,
    Colon,
    /// `?:`
    Elvis,
    LParen,
    RParen,
    Comma,
    LBracket,
    RBracket,
    /// `=`
    Eq,
    /// Comparison, logical and arithmetic operators
    Op,
    Unknown,
}

/// A lexeme with absolute range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexKind,
    pub range: TextRange,
}

impl Lexeme {
    pub fn text<'s>(&self, source: &'s str, base: TextSize) -> &'s str {
        let start = u32::from(self.range.start() - base) as usize;
        let end = u32::from(self.range.end() - base) as usize;
        &source[start..end]
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?[lLdDfF]?")]
    Number,

    #[regex(r"'[^'\n]*'?")]
    #[regex(r#""[^"\n]*"?"#)]
    Str,

    #[token("?:")]
    Elvis,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("=")]
    Eq,

    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token("<")]
    #[token(">")]
    #[token("!")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    Op,
}

impl From<LogosToken> for LexKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => LexKind::Whitespace,
            LogosToken::Ident => LexKind::Ident,
            LogosToken::Number => LexKind::Number,
            LogosToken::Str => LexKind::Str,
            LogosToken::Elvis => LexKind::Elvis,
            LogosToken::Dot => LexKind::Dot,
            LogosToken::Colon => LexKind::Colon,
            LogosToken::LParen => LexKind::LParen,
            LogosToken::RParen => LexKind::RParen,
            LogosToken::Comma => LexKind::Comma,
            LogosToken::LBracket => LexKind::LBracket,
            LogosToken::RBracket => LexKind::RBracket,
            LogosToken::Eq => LexKind::Eq,
            LogosToken::Op => LexKind::Op,
        }
    }
}

/// Tokenize `text`, whose first byte sits at `base` in the document.
///
/// Non-ASCII identifier characters the logos automaton rejects are folded
/// into the neighbouring identifier.
pub fn lex(text: &str, base: TextSize) -> Vec<Lexeme> {
    let mut out: Vec<Lexeme> = Vec::new();
    let mut inner = LogosToken::lexer(text);
    while let Some(result) = inner.next() {
        let span = inner.span();
        let range = TextRange::new(
            base + TextSize::new(span.start as u32),
            base + TextSize::new(span.end as u32),
        );
        let kind = match result {
            Ok(token) => token.into(),
            Err(()) => {
                let slice = inner.slice();
                if slice.chars().all(is_ident_continue) {
                    LexKind::Ident
                } else {
                    LexKind::Unknown
                }
            }
        };
        match out.last_mut() {
            Some(prev)
                if kind == LexKind::Ident
                    && prev.kind == LexKind::Ident
                    && prev.range.end() == range.start() =>
            {
                prev.range = prev.range.cover(range);
            }
            _ => out.push(Lexeme { kind, range }),
        }
    }
    out
}
