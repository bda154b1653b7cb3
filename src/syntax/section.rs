//! Section kinds and their parameter schemas.

/// Closed set of section kinds, derived from the tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Each,
    For,
    If,
    Else,
    With,
    Let,
    Set,
    Switch,
    When,
    Case,
    Is,
    Include,
    Insert,
    Fragment,
    Eval,
    /// User tag or any unknown tag name
    Custom,
}

/// One entry of a positional parameter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: &'static str,
    /// Value used when the parameter is omitted. Entries without a default
    /// hold a type-bearing expression.
    pub default_value: Option<&'static str>,
    pub optional: bool,
}

impl ParameterInfo {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            default_value: None,
            optional: false,
        }
    }

    const fn defaulted(name: &'static str, default_value: &'static str) -> Self {
        Self {
            name,
            default_value: Some(default_value),
            optional: true,
        }
    }

    /// Whether a parameter matched against this entry is an expression.
    pub fn is_expression(&self) -> bool {
        self.default_value.is_none()
    }
}

/// How a section's parameters are turned into expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMode {
    /// Matched positionally against a schema.
    Positional(&'static [ParameterInfo]),
    /// Every operand that is not an operator keyword is an expression (`if`).
    Operands,
    /// `name=value` pairs whose values are expressions (`let`, `set`).
    Assignments,
    /// First positional (`it`) and every assignment value are expressions.
    UserTag,
    /// Parameters are plain literals, never type-checked.
    Literal,
}

pub const ALIAS: &str = "alias";
pub const ITERABLE: &str = "iterable";
pub const IN: &str = "in";
pub const OBJECT: &str = "object";
pub const VALUE: &str = "value";
pub const DEFAULT_ALIAS: &str = "it";

const LOOP_PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo::defaulted(ALIAS, DEFAULT_ALIAS),
    ParameterInfo::defaulted(IN, IN),
    ParameterInfo::required(ITERABLE),
];

const WITH_PARAMETERS: &[ParameterInfo] = &[ParameterInfo::required(OBJECT)];

const SWITCH_PARAMETERS: &[ParameterInfo] = &[ParameterInfo::required(VALUE)];

const EVAL_PARAMETERS: &[ParameterInfo] = &[ParameterInfo::required("template")];

impl SectionKind {
    /// Map a tag name to its kind. Unknown names are user tags.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "each" => Self::Each,
            "for" => Self::For,
            "if" => Self::If,
            "else" => Self::Else,
            "with" => Self::With,
            "let" => Self::Let,
            "set" => Self::Set,
            "switch" => Self::Switch,
            "when" => Self::When,
            "case" => Self::Case,
            "is" => Self::Is,
            "include" => Self::Include,
            "insert" => Self::Insert,
            "fragment" => Self::Fragment,
            "eval" => Self::Eval,
            _ => Self::Custom,
        }
    }

    /// Whether the section opens a new resolution scope for its body.
    pub fn changes_scope(&self) -> bool {
        matches!(
            self,
            Self::Each | Self::For | Self::With | Self::Let | Self::Set
        )
    }

    /// Whether the section binds an element of an iterable.
    pub fn is_iterable(&self) -> bool {
        matches!(self, Self::Each | Self::For)
    }

    /// Block labels split their parent's body and end at the next label.
    pub fn is_block_label(&self) -> bool {
        matches!(self, Self::Else | Self::Case | Self::Is)
    }

    pub fn parameter_mode(&self) -> ParameterMode {
        match self {
            Self::Each | Self::For => ParameterMode::Positional(LOOP_PARAMETERS),
            Self::With => ParameterMode::Positional(WITH_PARAMETERS),
            Self::Switch | Self::When => ParameterMode::Positional(SWITCH_PARAMETERS),
            Self::Eval => ParameterMode::Positional(EVAL_PARAMETERS),
            Self::If | Self::Else => ParameterMode::Operands,
            Self::Let | Self::Set => ParameterMode::Assignments,
            Self::Custom => ParameterMode::UserTag,
            Self::Case | Self::Is | Self::Include | Self::Insert | Self::Fragment => {
                ParameterMode::Literal
            }
        }
    }

    /// Positional schema, if the section has one.
    pub fn schema(&self) -> &'static [ParameterInfo] {
        match self.parameter_mode() {
            ParameterMode::Positional(schema) => schema,
            _ => &[],
        }
    }
}

/// Operator keywords that never count as operands in `if`-style sections.
pub fn is_operator_keyword(text: &str) -> bool {
    matches!(
        text,
        "if" | "!"
            | "&&"
            | "||"
            | "and"
            | "or"
            | "not"
            | "=="
            | "!="
            | "eq"
            | "ne"
            | "is"
            | "gt"
            | "ge"
            | "lt"
            | "le"
            | ">"
            | ">="
            | "<"
            | "<="
    )
}
