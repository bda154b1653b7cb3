//! Tolerant template parser
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Scanner (state machine) → Tokens with TokenKind
//!     ↓
//! TreeBuilder (single cursor) → Template arena
//!     ↓
//! syntax micro-parsers (lazily, per node) → Parameters, Expressions
//! ```
//!
//! Parsing never fails. Missing terminators, mismatched end tags and
//! stray `{/x}` tags all produce a tree whose shape records the damage.

#[allow(clippy::module_inception)]
mod parser;
mod scanner;

pub use parser::{parse, parse_with_cancel};
pub use scanner::{Scanner, ScannerState, Token, TokenKind, tokenize};

#[cfg(test)]
mod tests;
