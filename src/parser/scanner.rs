//! Stateful scanner for template text
//!
//! The same delimiter characters mean different things depending on the
//! active sub-grammar (`{` opens an expression in text but is literal inside a
//! CDATA block), so the scanner carries a small [`ScannerState`] and switches
//! it as delimiters go by. It never fails: ill-formed input just produces a
//! token stream the parser has to reconcile.

use text_size::{TextRange, TextSize};

use crate::base::text::is_tag_name_char;

/// Lexical event kinds produced by [`Scanner::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `{#`
    StartTagOpen,
    /// Section tag name after `{#`
    StartTag,
    /// Raw parameter region of a start tag
    ParameterTag,
    /// `}` closing a start tag
    StartTagClose,
    /// `/}` closing a start tag
    StartTagSelfClose,
    /// `{/`
    EndTagOpen,
    /// Section tag name after `{/`
    EndTag,
    /// `}` closing an end tag
    EndTagClose,
    /// `{/}`
    EndTagSelfClose,
    /// `{` opening an expression
    StartExpression,
    ExpressionContent,
    /// `}` closing an expression
    EndExpression,
    /// `{!`
    StartComment,
    Comment,
    /// `!}`
    EndComment,
    /// `{|` or the legacy `{[`
    CDataTagOpen,
    CDataContent,
    /// `|}` or the legacy `]}`
    CDataTagClose,
    /// `{@`
    StartParameterDeclaration,
    ParameterDeclaration,
    /// `}` closing a parameter declaration
    EndParameterDeclaration,
    /// Whitespace inside a tag
    Whitespace,
    /// Plain template text
    Content,
    /// Junk inside an end tag
    Unknown,
    /// End of stream; repeated forever once reached
    Eos,
}

/// A token with its kind and position. The text is `&source[range]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn offset(&self) -> TextSize {
        self.range.start()
    }

    pub fn end(&self) -> TextSize {
        self.range.end()
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range]
    }
}

/// Active sub-grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    WithinContent,
    AfterOpeningStartTag,
    WithinTag,
    AfterOpeningEndTag,
    WithinEndTag,
    WithinExpression,
    WithinComment,
    WithinCData { legacy: bool },
    WithinParameterDeclaration,
}

/// Tokenizer over raw template text.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    state: ScannerState,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            state: ScannerState::WithinContent,
            done: false,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    /// Produce the next token. Returns `Eos` forever once input is consumed.
    pub fn next_token(&mut self) -> Token {
        loop {
            let start = self.pos;
            if start >= self.source.len() {
                return self.token(TokenKind::Eos, start);
            }
            if let Some(kind) = self.scan_in_state() {
                return self.token(kind, start);
            }
            // State switched without consuming anything; rescan.
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            range: TextRange::new(offset(start), offset(self.pos)),
        }
    }

    fn scan_in_state(&mut self) -> Option<TokenKind> {
        match self.state {
            ScannerState::WithinContent => Some(self.scan_content()),
            ScannerState::AfterOpeningStartTag => {
                self.state = ScannerState::WithinTag;
                if self.eat_while(is_tag_name_char) > 0 {
                    Some(TokenKind::StartTag)
                } else {
                    None
                }
            }
            ScannerState::WithinTag => self.scan_within_tag(),
            ScannerState::AfterOpeningEndTag => {
                self.state = ScannerState::WithinEndTag;
                if self.eat_while(is_tag_name_char) > 0 {
                    Some(TokenKind::EndTag)
                } else {
                    None
                }
            }
            ScannerState::WithinEndTag => self.scan_within_end_tag(),
            ScannerState::WithinExpression => {
                self.scan_delimited_body(TokenKind::EndExpression, TokenKind::ExpressionContent)
            }
            ScannerState::WithinParameterDeclaration => self.scan_delimited_body(
                TokenKind::EndParameterDeclaration,
                TokenKind::ParameterDeclaration,
            ),
            ScannerState::WithinComment => {
                if self.eat("!}") {
                    self.state = ScannerState::WithinContent;
                    return Some(TokenKind::EndComment);
                }
                self.advance_until_str("!}");
                Some(TokenKind::Comment)
            }
            ScannerState::WithinCData { legacy } => {
                let close = if legacy { "]}" } else { "|}" };
                if self.eat(close) {
                    self.state = ScannerState::WithinContent;
                    return Some(TokenKind::CDataTagClose);
                }
                self.advance_until_str(close);
                Some(TokenKind::CDataContent)
            }
        }
    }

    fn scan_content(&mut self) -> TokenKind {
        if self.rest().starts_with('{') {
            if let Some((kind, len, next)) = self.construct_at(self.pos) {
                self.pos += len;
                self.state = next;
                return kind;
            }
        }
        // Plain text up to the next construct opener.
        let bytes = self.source.as_bytes();
        self.bump_char();
        while self.pos < bytes.len() {
            if bytes[self.pos] == b'{' && self.construct_at(self.pos).is_some() {
                break;
            }
            self.bump_char();
        }
        TokenKind::Content
    }

    /// Classify a `{` at `at`: the token it opens, its length and the next state.
    fn construct_at(&self, at: usize) -> Option<(TokenKind, usize, ScannerState)> {
        let rest = &self.source[at..];
        if at > 0 && self.source.as_bytes()[at - 1] == b'\\' {
            return None;
        }
        if rest.starts_with("{#") {
            return Some((TokenKind::StartTagOpen, 2, ScannerState::AfterOpeningStartTag));
        }
        if rest.starts_with("{/}") {
            return Some((TokenKind::EndTagSelfClose, 3, ScannerState::WithinContent));
        }
        if rest.starts_with("{/") {
            return Some((TokenKind::EndTagOpen, 2, ScannerState::AfterOpeningEndTag));
        }
        if rest.starts_with("{!") {
            return Some((TokenKind::StartComment, 2, ScannerState::WithinComment));
        }
        if rest.starts_with("{|") {
            return Some((
                TokenKind::CDataTagOpen,
                2,
                ScannerState::WithinCData { legacy: false },
            ));
        }
        if rest.starts_with("{[") {
            return Some((
                TokenKind::CDataTagOpen,
                2,
                ScannerState::WithinCData { legacy: true },
            ));
        }
        if rest.starts_with("{@") {
            return Some((
                TokenKind::StartParameterDeclaration,
                2,
                ScannerState::WithinParameterDeclaration,
            ));
        }
        match rest[1..].chars().next() {
            Some(c) if !c.is_whitespace() && c != '}' && c != '{' => Some((
                TokenKind::StartExpression,
                1,
                ScannerState::WithinExpression,
            )),
            _ => None,
        }
    }

    fn scan_within_tag(&mut self) -> Option<TokenKind> {
        if self.eat_while(char::is_whitespace) > 0 {
            return Some(TokenKind::Whitespace);
        }
        if self.eat("/}") {
            self.state = ScannerState::WithinContent;
            return Some(TokenKind::StartTagSelfClose);
        }
        if self.eat("}") {
            self.state = ScannerState::WithinContent;
            return Some(TokenKind::StartTagClose);
        }
        if self.rest().starts_with('{') {
            // Unterminated start tag; the brace belongs to the next construct.
            self.state = ScannerState::WithinContent;
            return None;
        }
        let start = self.pos;
        self.advance_guarded(|rest| rest.starts_with('}') || rest.starts_with("/}"));
        // Trailing whitespace before `/}` is its own token.
        let trimmed = self.source[start..self.pos].trim_end().len();
        if trimmed > 0 {
            self.pos = start + trimmed;
        }
        Some(TokenKind::ParameterTag)
    }

    fn scan_within_end_tag(&mut self) -> Option<TokenKind> {
        if self.eat_while(char::is_whitespace) > 0 {
            return Some(TokenKind::Whitespace);
        }
        if self.eat("}") {
            self.state = ScannerState::WithinContent;
            return Some(TokenKind::EndTagClose);
        }
        if self.rest().starts_with('{') {
            self.state = ScannerState::WithinContent;
            return None;
        }
        self.bump_char();
        self.eat_while(|c| !c.is_whitespace() && c != '}' && c != '{');
        Some(TokenKind::Unknown)
    }

    /// Body of an expression or parameter declaration: content up to `}`,
    /// with quotes protecting braces.
    fn scan_delimited_body(&mut self, close: TokenKind, content: TokenKind) -> Option<TokenKind> {
        if self.eat("}") {
            self.state = ScannerState::WithinContent;
            return Some(close);
        }
        if self.rest().starts_with('{') {
            self.state = ScannerState::WithinContent;
            return None;
        }
        self.advance_guarded(|rest| rest.starts_with('}'));
        Some(content)
    }

    /// Advance until `stop` matches outside quotes, or an unquoted `{` is met.
    /// A quote left open at a line break stops protecting.
    fn advance_guarded(&mut self, stop: impl Fn(&str) -> bool) {
        let mut quote: Option<char> = None;
        while let Some(c) = self.peek() {
            match quote {
                Some(q) => {
                    if c == q || c == '\n' {
                        quote = None;
                    }
                }
                None => {
                    if c == '{' || stop(self.rest()) {
                        return;
                    }
                    if c == '\'' || c == '"' {
                        quote = Some(c);
                    }
                }
            }
            self.bump_char();
        }
    }

    fn advance_until_str(&mut self, needle: &str) {
        match self.rest().find(needle) {
            Some(idx) => self.pos += idx,
            None => self.pos = self.source.len(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.pos - start
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    /// Yields every token including a single trailing `Eos`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eos {
            self.done = true;
        }
        Some(token)
    }
}

fn offset(pos: usize) -> TextSize {
    TextSize::new(pos as u32)
}

/// Tokenize an entire string into a Vec (including the final `Eos`).
pub fn tokenize(source: &str) -> Vec<Token> {
    Scanner::new(source).collect()
}
