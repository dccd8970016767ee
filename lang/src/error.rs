//! Error handling.

use core::fmt;

use crate::values::ValueKind;

/// Operator involved in a failed evaluation, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Op {
    /// Addition: `+`.
    Add,
    /// Subtraction: `-`.
    Sub,
    /// Multiplication: `*`.
    Mul,
    /// Division: `/`.
    Div,
    /// Exponentiation: `^`.
    Power,
    /// Dot product: `.`.
    Dot,
    /// Unary negation: `-`.
    Negate,
    /// Factorial: `!`.
    Factorial,
}

impl fmt::Display for Op {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Power => "^",
            Self::Dot => ".",
            Self::Negate => "unary -",
            Self::Factorial => "!",
        })
    }
}

/// Errors that can occur while parsing or evaluating a statement.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Grammar violation. The parser resynchronizes at the next statement boundary
    /// and continues with the following statement.
    Syntax(String),

    /// Semantic error detected during parsing or literal materialization
    /// (e.g., a vector of a non-numeric element kind).
    Semantic(String),

    /// Incompatible operand kinds for an operator.
    TypeMismatch {
        /// Operator that failed.
        op: Op,
        /// Kind of the left-hand side (or the sole operand for unary operators).
        lhs: ValueKind,
        /// Kind of the right-hand side, if the operator is binary.
        rhs: Option<ValueKind>,
    },

    /// Vector / matrix shape disagreement.
    DimensionMismatch {
        /// Operator that failed.
        op: Op,
        /// Shape of the left-hand side.
        lhs: ValueKind,
        /// Shape of the right-hand side.
        rhs: ValueKind,
    },

    /// Fewer values on the stack than an instruction consumes. This indicates
    /// an instruction-emission bug rather than a user error: well-formed grammar
    /// never produces it.
    StackUnderflow {
        /// Number of values the instruction declares it consumes.
        expected: usize,
        /// Number of values actually on the stack.
        actual: usize,
    },

    /// Variable with the enclosed name is not defined.
    UndefinedSymbol(String),

    /// No function is registered under the enclosed name.
    UnknownFunction(String),

    /// None of the overloads registered under the enclosed name accept
    /// the actual arguments.
    NoMatchingOverload(String),

    /// Factorial of a negative integer.
    NegativeFactorial,

    /// Overflow of a checked machine-integer operation.
    IntegerOverflow(Op),

    /// Integer, big-integer or decimal division by zero.
    DivisionByZero,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(message) | Self::Semantic(message) => formatter.write_str(message),

            Self::TypeMismatch { op, lhs, rhs: Some(rhs) } => write!(
                formatter,
                "Cannot apply `{}` to {} and {}",
                op, lhs, rhs
            ),
            Self::TypeMismatch { op, lhs, rhs: None } => {
                write!(formatter, "Cannot apply `{}` to {}", op, lhs)
            }

            Self::DimensionMismatch { op, lhs, rhs } => write!(
                formatter,
                "Dimension mismatch in `{}`: {} vs {}",
                op, lhs, rhs
            ),

            Self::StackUnderflow { expected, actual } => write!(
                formatter,
                "Only {} value(s) on the stack, {}-ary instruction given",
                actual, expected
            ),

            Self::UndefinedSymbol(name) => write!(formatter, "`{}` is not defined", name),
            Self::UnknownFunction(name) => {
                write!(formatter, "`{}` is an unknown function name", name)
            }
            Self::NoMatchingOverload(name) => write!(
                formatter,
                "Cannot call `{}`: no overload matches the arguments",
                name
            ),

            Self::NegativeFactorial => {
                formatter.write_str("Factorial is not defined for negative integers")
            }
            Self::IntegerOverflow(op) => {
                write!(formatter, "Integer overflow in `{}`", op)
            }
            Self::DivisionByZero => formatter.write_str("Division by zero"),
        }
    }
}

impl std::error::Error for ErrorKind {}

/// [`ErrorKind`] with the associated source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    line: u32,
    col: u32,
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(line: u32, col: u32, kind: ErrorKind) -> Self {
        Self { line, col, kind }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the 1-based line on which the error was detected.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the 1-based column at which the error was detected.
    pub fn col(&self) -> u32 {
        self.col
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}: {}",
            self.line, self.col, self.kind
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
