/// Result type for engine arithmetic.
pub type CalcResult<T> = Result<T, CalcError>;

/// Hard failures raised by the calculation engine.
///
/// Soft conditions (missing operator, exhausted undo/redo) are not errors;
/// they are logged and leave state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown operator: {0:?} (expected one of + - * /)")]
    UnknownOperator(String),

    #[error("invalid operand: {0}")]
    InvalidOperand(String),
}
