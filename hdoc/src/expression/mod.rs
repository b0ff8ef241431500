use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// Arithmetic negation: -x
    Negation,
    /// Logical not: !x
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LogicalAnd,
    LogicalOr,
    Equality,
    Inequality,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// An expression AST node, as written on the right-hand side of an attribute.
#[derive(Debug, Clone)]
pub enum Expression {
    // Literals
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    NullLiteral,

    /// A quoted string containing `${...}` interpolations.
    Template(Vec<TemplatePart>),

    /// `[a, b, c]`
    Tuple(Vec<Expression>),

    // References
    VariableReference(String, Range<usize>),

    /// `name(args...)`
    FunctionCall {
        name: String,
        args: Vec<Expression>,
        span: Range<usize>,
    },

    /// `collection[key]`
    Index {
        collection: Box<Expression>,
        key: Box<Expression>,
        span: Range<usize>,
    },

    // Operations
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `cond ? a : b`
    Conditional {
        condition: Box<Expression>,
        true_branch: Box<Expression>,
        false_branch: Box<Expression>,
    },
}

/// One piece of a template string.
#[derive(Debug, Clone)]
pub enum TemplatePart {
    Literal(String),
    Interpolation(Expression),
}
