use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("input text is empty")]
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("unsupported character {character:?} at position {position}")]
    UnsafeExpression { character: char, position: usize },
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is too large to represent")]
    NumericOverflow,
    #[error("result is not a real number")]
    UndefinedResult,
}

impl ExpressionError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedExpression(reason.into())
    }
}
