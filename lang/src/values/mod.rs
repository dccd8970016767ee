//! Values produced and consumed by the runtime.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use core::fmt;
use std::rc::Rc;

use crate::{algebra::{Matrix, Vector}, machine::Instruction};

pub(crate) mod ops;

/// Shape + numeric kind of a [`Value`], used for matching and error reporting.
///
/// Tensor variants carry their dimensions so that shape errors can name both
/// operands precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueKind {
    /// Machine-width signed integer.
    Int,
    /// Double-precision floating-point number.
    Float,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Arbitrary-precision integer.
    BigInt,
    /// Integer vector with the enclosed dimension count.
    IntVector(usize),
    /// Floating-point vector with the enclosed dimension count.
    FloatVector(usize),
    /// Integer matrix with the enclosed `rows x cols` shape.
    IntMatrix(usize, usize),
    /// Floating-point matrix with the enclosed `rows x cols` shape.
    FloatMatrix(usize, usize),
    /// Captured instruction list of a function body being defined.
    Instructions,
}

impl ValueKind {
    /// Checks whether this is a vector kind, integer or floating-point.
    pub fn is_vector(self) -> bool {
        matches!(self, Self::IntVector(_) | Self::FloatVector(_))
    }

    /// Checks whether this is a matrix kind, integer or floating-point.
    pub fn is_matrix(self) -> bool {
        matches!(self, Self::IntMatrix(..) | Self::FloatMatrix(..))
    }

    /// Checks whether this is a scalar numeric kind.
    pub fn is_numeric_scalar(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Decimal | Self::BigInt)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => formatter.write_str("integer"),
            Self::Float => formatter.write_str("float"),
            Self::Decimal => formatter.write_str("decimal"),
            Self::BigInt => formatter.write_str("big integer"),
            Self::IntVector(dims) => write!(formatter, "{}-dimensional integer vector", dims),
            Self::FloatVector(dims) => write!(formatter, "{}-dimensional float vector", dims),
            Self::IntMatrix(rows, cols) => {
                write!(formatter, "{} x {} integer matrix", rows, cols)
            }
            Self::FloatMatrix(rows, cols) => {
                write!(formatter, "{} x {} float matrix", rows, cols)
            }
            Self::Instructions => formatter.write_str("instruction list"),
        }
    }
}

/// Runtime datum: a closed tagged union over scalar, vector and matrix shapes.
///
/// Exactly one shape is active at a time; a `Value` owns its backing storage
/// and shares nothing with other `Value`s (the transient [`Self::Instructions`]
/// variant aside, which is reference-counted so that a function body can be
/// handed to its closure without copying).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// Machine-width signed integer.
    Int(i64),
    /// Double-precision floating-point number.
    Float(f64),
    /// Arbitrary-precision decimal. Produced by float literals whose text
    /// exceeds the width threshold, and by decimal-absorbing promotions.
    Decimal(BigDecimal),
    /// Arbitrary-precision integer.
    BigInt(BigInt),
    /// Vector of integers.
    IntVector(Vector<i64>),
    /// Vector of floats.
    FloatVector(Vector<f64>),
    /// Matrix of integers.
    IntMatrix(Matrix<i64>),
    /// Matrix of floats.
    FloatMatrix(Matrix<f64>),
    /// Captured instruction list. Only materialized transiently while a
    /// user-defined function body is being installed; never a first-class
    /// value a user can manipulate.
    Instructions(Rc<Vec<Instruction>>),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::BigInt(_) => ValueKind::BigInt,
            Self::IntVector(vector) => ValueKind::IntVector(vector.dimensions()),
            Self::FloatVector(vector) => ValueKind::FloatVector(vector.dimensions()),
            Self::IntMatrix(matrix) => ValueKind::IntMatrix(matrix.rows(), matrix.cols()),
            Self::FloatMatrix(matrix) => ValueKind::FloatMatrix(matrix.rows(), matrix.cols()),
            Self::Instructions(_) => ValueKind::Instructions,
        }
    }

    /// Checks whether this is a scalar numeric value.
    pub fn is_numeric_scalar(&self) -> bool {
        self.kind().is_numeric_scalar()
    }

    /// Checks whether this is a matrix, integer or floating-point.
    pub fn is_matrix(&self) -> bool {
        self.kind().is_matrix()
    }

    /// Lossily converts a scalar numeric value to `f64`.
    /// Returns `None` for tensors and instruction lists.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Decimal(value) => value.to_f64(),
            Self::BigInt(value) => value.to_f64(),
            _ => None,
        }
    }

    /// Converts a scalar numeric value to `i64`, truncating fractional parts
    /// toward zero. Returns `None` for out-of-range values and non-scalars.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) => Some(value.trunc() as i64),
            Self::Decimal(value) => value.to_i64(),
            Self::BigInt(value) => value.to_i64(),
            _ => None,
        }
    }
}

fn write_elements<T>(
    formatter: &mut fmt::Formatter<'_>,
    elements: impl Iterator<Item = T>,
    write: impl Fn(&mut fmt::Formatter<'_>, T) -> fmt::Result,
) -> fmt::Result {
    for (i, element) in elements.enumerate() {
        if i > 0 {
            formatter.write_str(" ")?;
        }
        write(formatter, element)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(formatter, "{}", value),
            // `{:?}` keeps a trailing `.0`, distinguishing `8.0` from the
            // integer `8` in session output.
            Self::Float(value) => write!(formatter, "{:?}", value),
            Self::Decimal(value) => write!(formatter, "{}", value),
            Self::BigInt(value) => write!(formatter, "{}", value),

            Self::IntVector(vector) => {
                formatter.write_str("(")?;
                write_elements(formatter, vector.elements().iter(), |f, x| write!(f, "{}", x))?;
                formatter.write_str(")")
            }
            Self::FloatVector(vector) => {
                formatter.write_str("(")?;
                write_elements(formatter, vector.elements().iter(), |f, x| write!(f, "{:?}", x))?;
                formatter.write_str(")")
            }

            Self::IntMatrix(matrix) => write_matrix(formatter, matrix.rows(), matrix.cols(), |f, i, j| {
                write!(f, "{}", matrix.get(i, j))
            }),
            Self::FloatMatrix(matrix) => write_matrix(formatter, matrix.rows(), matrix.cols(), |f, i, j| {
                write!(f, "{:?}", matrix.get(i, j))
            }),

            Self::Instructions(_) => formatter.write_str("[function body]"),
        }
    }
}

fn write_matrix(
    formatter: &mut fmt::Formatter<'_>,
    rows: usize,
    cols: usize,
    write: impl Fn(&mut fmt::Formatter<'_>, usize, usize) -> fmt::Result,
) -> fmt::Result {
    formatter.write_str("[")?;
    for i in 0..rows {
        if i > 0 {
            formatter.write_str(" , ")?;
        }
        for j in 0..cols {
            if j > 0 {
                formatter.write_str(" ")?;
            }
            write(formatter, i, j)?;
        }
    }
    formatter.write_str("]")
}
