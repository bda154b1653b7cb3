//! Syntax: the template tree and its embedded micro-parsers.
//!
//! ```text
//! Template (arena)
//!   ├── Node { kind, range, closed, parent, children }
//!   │     └── NodeKind::{Section, Expression, ParameterDeclaration, Comment, CData, Text}
//!   └── derived cache (per NodeId, filled on first access)
//!         ├── parameters(section)  → Vec<Parameter>
//!         └── expression(expr)     → Expression { parts: [Namespace?, Object, Property|Method...] }
//! ```

mod declaration;
mod expression;
mod lexer;
mod literal;
mod node;
mod parameter;
mod section;
mod template;

pub use declaration::{ParameterDeclarationParts, parse_declaration};
pub use expression::{
    Expression, MethodCall, Part, PartKind, SyntaxProblem, SyntaxProblemKind, parse_expression,
};
pub use lexer::{LexKind, Lexeme, lex};
pub use literal::{LiteralKind, literal_kind};
pub use node::{
    CDataNode, CommentNode, ExpressionNode, Node, NodeId, NodeKind, NodeKindTag,
    ParameterDeclarationNode, SectionNode,
};
pub use parameter::{Parameter, parse_parameters};
pub use section::{
    ALIAS, DEFAULT_ALIAS, ITERABLE, OBJECT, ParameterInfo, ParameterMode, SectionKind, VALUE,
    is_operator_keyword,
};
pub use template::{Template, Walk, WalkEvent};
