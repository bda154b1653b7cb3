#![allow(clippy::unwrap_used)]

use rstest::rstest;

use crate::parser::{Scanner, ScannerState, TokenKind, tokenize};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).into_iter().map(|t| t.kind).collect()
}

fn texts(source: &str) -> Vec<(TokenKind, &str)> {
    tokenize(source)
        .into_iter()
        .map(|t| (t.kind, t.text(source)))
        .collect()
}

// ============================================================================
// Content and expressions
// ============================================================================

#[test]
fn test_plain_text_is_single_content_token() {
    assert_eq!(kinds("hello world"), vec![TokenKind::Content, TokenKind::Eos]);
}

#[test]
fn test_empty_input_yields_eos_only() {
    assert_eq!(kinds(""), vec![TokenKind::Eos]);
}

#[test]
fn test_expression_tokens() {
    assert_eq!(
        texts("a{item.name}b"),
        vec![
            (TokenKind::Content, "a"),
            (TokenKind::StartExpression, "{"),
            (TokenKind::ExpressionContent, "item.name"),
            (TokenKind::EndExpression, "}"),
            (TokenKind::Content, "b"),
            (TokenKind::Eos, ""),
        ]
    );
}

#[rstest]
#[case("{ not an expression }")]
#[case("{}")]
#[case("\\{escaped}")]
#[case("trailing {")]
fn test_brace_that_opens_nothing_is_content(#[case] source: &str) {
    assert!(
        kinds(source)
            .iter()
            .all(|k| matches!(k, TokenKind::Content | TokenKind::Eos)),
        "{source:?} produced {:?}",
        kinds(source)
    );
}

#[test]
fn test_quoted_brace_does_not_end_expression() {
    let tokens = texts("{str:concat('}')}");
    assert_eq!(tokens[1], (TokenKind::ExpressionContent, "str:concat('}')"));
    assert_eq!(tokens[2], (TokenKind::EndExpression, "}"));
}

#[test]
fn test_unterminated_expression_stops_at_next_construct() {
    assert_eq!(
        kinds("{item.{#if}"),
        vec![
            TokenKind::StartExpression,
            TokenKind::ExpressionContent,
            TokenKind::StartTagOpen,
            TokenKind::StartTag,
            TokenKind::StartTagClose,
            TokenKind::Eos,
        ]
    );
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn test_section_with_parameters() {
    assert_eq!(
        texts("{#for item in items}x{/for}"),
        vec![
            (TokenKind::StartTagOpen, "{#"),
            (TokenKind::StartTag, "for"),
            (TokenKind::Whitespace, " "),
            (TokenKind::ParameterTag, "item in items"),
            (TokenKind::StartTagClose, "}"),
            (TokenKind::Content, "x"),
            (TokenKind::EndTagOpen, "{/"),
            (TokenKind::EndTag, "for"),
            (TokenKind::EndTagClose, "}"),
            (TokenKind::Eos, ""),
        ]
    );
}

#[test]
fn test_self_closing_start_tag() {
    assert_eq!(
        kinds("{#include base /}"),
        vec![
            TokenKind::StartTagOpen,
            TokenKind::StartTag,
            TokenKind::Whitespace,
            TokenKind::ParameterTag,
            TokenKind::Whitespace,
            TokenKind::StartTagSelfClose,
            TokenKind::Eos,
        ]
    );
}

#[test]
fn test_empty_end_tag() {
    assert_eq!(kinds("{/}"), vec![TokenKind::EndTagSelfClose, TokenKind::Eos]);
}

#[test]
fn test_junk_inside_end_tag() {
    assert_eq!(
        kinds("{/if junk}"),
        vec![
            TokenKind::EndTagOpen,
            TokenKind::EndTag,
            TokenKind::Whitespace,
            TokenKind::Unknown,
            TokenKind::EndTagClose,
            TokenKind::Eos,
        ]
    );
}

#[test]
fn test_tag_names_allow_dashes_dots_and_colons() {
    let tokens = texts("{#my-tag.x:y}");
    assert_eq!(tokens[1], (TokenKind::StartTag, "my-tag.x:y"));
}

// ============================================================================
// Comments, CDATA and declarations
// ============================================================================

#[test]
fn test_comment_tokens() {
    assert_eq!(
        texts("{! hidden {x} !}"),
        vec![
            (TokenKind::StartComment, "{!"),
            (TokenKind::Comment, " hidden {x} "),
            (TokenKind::EndComment, "!}"),
            (TokenKind::Eos, ""),
        ]
    );
}

#[rstest]
#[case("{|raw {x}|}", "raw {x}")]
#[case("{[raw {x}]}", "raw {x}")]
fn test_cdata_tokens(#[case] source: &str, #[case] body: &str) {
    let tokens = texts(source);
    assert_eq!(tokens[0].0, TokenKind::CDataTagOpen);
    assert_eq!(tokens[1], (TokenKind::CDataContent, body));
    assert_eq!(tokens[2].0, TokenKind::CDataTagClose);
}

#[test]
fn test_parameter_declaration_tokens() {
    assert_eq!(
        texts("{@org.acme.Item item}"),
        vec![
            (TokenKind::StartParameterDeclaration, "{@"),
            (TokenKind::ParameterDeclaration, "org.acme.Item item"),
            (TokenKind::EndParameterDeclaration, "}"),
            (TokenKind::Eos, ""),
        ]
    );
}

// ============================================================================
// Scanner state and stream end
// ============================================================================

#[test]
fn test_eos_repeats_and_iterator_stops() {
    let mut scanner = Scanner::new("x");
    assert_eq!(scanner.next_token().kind, TokenKind::Content);
    assert_eq!(scanner.next_token().kind, TokenKind::Eos);
    assert_eq!(scanner.next_token().kind, TokenKind::Eos);

    let collected: Vec<_> = Scanner::new("x").collect();
    assert_eq!(collected.len(), 2);
}

#[test]
fn test_state_tracks_sub_grammar() {
    let mut scanner = Scanner::new("{#if a}");
    assert_eq!(scanner.state(), ScannerState::WithinContent);
    scanner.next_token();
    assert_eq!(scanner.state(), ScannerState::AfterOpeningStartTag);
    scanner.next_token();
    assert_eq!(scanner.state(), ScannerState::WithinTag);
}

#[test]
fn test_tokens_cover_input_without_gaps() {
    let source = "a {#for x in xs}{x.name}{! c !}{|r|}{/for} {@T t}";
    let tokens = tokenize(source);
    let mut expected = 0u32;
    for token in &tokens {
        assert_eq!(u32::from(token.offset()), expected);
        expected = u32::from(token.end());
    }
    assert_eq!(expected as usize, source.len());
}
