//! Arithmetic on [`Value`]s: the scalar promotion kernel and the
//! dimension-checked tensor operations built on top of [`crate::algebra`].
//!
//! Binary arithmetic always produces a result in the more general of the two
//! operand representations, following `Int < Float < Decimal` with `BigInt`
//! exact for integer pairs and lossily narrowed for float pairs. The promotion
//! table is explicit: every kind pair is matched, and unsupported combinations
//! report both operand kinds.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Pow, Signed, ToPrimitive, Zero};

use crate::{
    algebra::{Matrix, Vector},
    error::{ErrorKind, Op},
    values::{Value, ValueKind},
};

fn mismatch(op: Op, lhs: ValueKind, rhs: ValueKind) -> ErrorKind {
    ErrorKind::TypeMismatch {
        op,
        lhs,
        rhs: Some(rhs),
    }
}

fn dimension_mismatch(op: Op, lhs: ValueKind, rhs: ValueKind) -> ErrorKind {
    ErrorKind::DimensionMismatch { op, lhs, rhs }
}

/// Scalar pair after promotion to the more general representation.
enum Promoted {
    Int(i64, i64),
    Float(f64, f64),
    Big(BigInt, BigInt),
    Decimal(BigDecimal, BigDecimal),
}

fn to_decimal(value: Value) -> Result<BigDecimal, ErrorKind> {
    match value {
        Value::Int(value) => Ok(BigDecimal::from(value)),
        Value::Float(value) => BigDecimal::from_f64(value).ok_or_else(|| {
            ErrorKind::Semantic("Cannot convert a non-finite float to a decimal".to_owned())
        }),
        Value::BigInt(value) => Ok(BigDecimal::from(value)),
        Value::Decimal(value) => Ok(value),
        other => Err(ErrorKind::TypeMismatch {
            op: Op::Add,
            lhs: other.kind(),
            rhs: None,
        }),
    }
}

fn big_to_f64(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn promote(lhs: Value, rhs: Value) -> Result<Option<Promoted>, ErrorKind> {
    Ok(Some(match (lhs, rhs) {
        (Value::Int(x), Value::Int(y)) => Promoted::Int(x, y),

        (Value::Int(x), Value::Float(y)) => Promoted::Float(x as f64, y),
        (Value::Float(x), Value::Int(y)) => Promoted::Float(x, y as f64),
        (Value::Float(x), Value::Float(y)) => Promoted::Float(x, y),
        (Value::BigInt(x), Value::Float(y)) => Promoted::Float(big_to_f64(&x), y),
        (Value::Float(x), Value::BigInt(y)) => Promoted::Float(x, big_to_f64(&y)),

        (Value::BigInt(x), Value::BigInt(y)) => Promoted::Big(x, y),
        (Value::BigInt(x), Value::Int(y)) => Promoted::Big(x, BigInt::from(y)),
        (Value::Int(x), Value::BigInt(y)) => Promoted::Big(BigInt::from(x), y),

        // Decimal absorbs every other scalar kind.
        (lhs @ Value::Decimal(_), rhs) if rhs.is_numeric_scalar() => {
            Promoted::Decimal(to_decimal(lhs)?, to_decimal(rhs)?)
        }
        (lhs, rhs @ Value::Decimal(_)) if lhs.is_numeric_scalar() => {
            Promoted::Decimal(to_decimal(lhs)?, to_decimal(rhs)?)
        }

        _ => return Ok(None),
    }))
}

fn int_op(op: Op, x: i64, y: i64) -> Result<Value, ErrorKind> {
    let result = match op {
        Op::Add => x.checked_add(y),
        Op::Sub => x.checked_sub(y),
        Op::Mul => x.checked_mul(y),
        Op::Div => {
            if y == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            // Truncates toward zero; the only overflow is `i64::MIN / -1`.
            x.checked_div(y)
        }
        _ => None,
    };
    result
        .map(Value::Int)
        .ok_or(ErrorKind::IntegerOverflow(op))
}

fn float_op(op: Op, x: f64, y: f64) -> Result<Value, ErrorKind> {
    let result = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div => x / y,
        _ => return Err(mismatch(op, ValueKind::Float, ValueKind::Float)),
    };
    Ok(Value::Float(result))
}

fn big_op(op: Op, x: BigInt, y: BigInt) -> Result<Value, ErrorKind> {
    let result = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div => {
            if y.is_zero() {
                return Err(ErrorKind::DivisionByZero);
            }
            x / y
        }
        _ => return Err(mismatch(op, ValueKind::BigInt, ValueKind::BigInt)),
    };
    Ok(Value::BigInt(result))
}

fn decimal_op(op: Op, x: BigDecimal, y: BigDecimal) -> Result<Value, ErrorKind> {
    let result = match op {
        Op::Add => &x + &y,
        Op::Sub => &x - &y,
        Op::Mul => &x * &y,
        Op::Div => {
            if y.is_zero() {
                return Err(ErrorKind::DivisionByZero);
            }
            &x / &y
        }
        _ => return Err(mismatch(op, ValueKind::Decimal, ValueKind::Decimal)),
    };
    Ok(Value::Decimal(result))
}

fn scalar_binary(op: Op, lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (lhs.kind(), rhs.kind());
    let promoted = promote(lhs, rhs)?.ok_or_else(|| mismatch(op, lhs_kind, rhs_kind))?;
    match promoted {
        Promoted::Int(x, y) => int_op(op, x, y),
        Promoted::Float(x, y) => float_op(op, x, y),
        Promoted::Big(x, y) => big_op(op, x, y),
        Promoted::Decimal(x, y) => decimal_op(op, x, y),
    }
}

fn int_vector_pair(op: Op, lhs: Vector<i64>, rhs: Vector<i64>) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (
        ValueKind::IntVector(lhs.dimensions()),
        ValueKind::IntVector(rhs.dimensions()),
    );
    let result = match op {
        Op::Add => lhs.checked_add(&rhs),
        Op::Sub => lhs.checked_sub(&rhs),
        // `*` between two vectors is the cross product, defined for 3-D only.
        Op::Mul => lhs.cross(&rhs),
        _ => return Err(mismatch(op, lhs_kind, rhs_kind)),
    };
    result
        .map(Value::IntVector)
        .ok_or_else(|| dimension_mismatch(op, lhs_kind, rhs_kind))
}

fn float_vector_pair(op: Op, lhs: Vector<f64>, rhs: Vector<f64>) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (
        ValueKind::FloatVector(lhs.dimensions()),
        ValueKind::FloatVector(rhs.dimensions()),
    );
    let result = match op {
        Op::Add => lhs.checked_add(&rhs),
        Op::Sub => lhs.checked_sub(&rhs),
        Op::Mul => lhs.cross(&rhs),
        _ => return Err(mismatch(op, lhs_kind, rhs_kind)),
    };
    result
        .map(Value::FloatVector)
        .ok_or_else(|| dimension_mismatch(op, lhs_kind, rhs_kind))
}

fn int_matrix_pair(op: Op, lhs: Matrix<i64>, rhs: Matrix<i64>) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (
        ValueKind::IntMatrix(lhs.rows(), lhs.cols()),
        ValueKind::IntMatrix(rhs.rows(), rhs.cols()),
    );
    let result = match op {
        Op::Add => lhs.checked_add(&rhs),
        Op::Sub => lhs.checked_sub(&rhs),
        // Elementwise product; the mathematical product is spelled `.`.
        Op::Mul => lhs.elementwise_mul(&rhs),
        _ => return Err(mismatch(op, lhs_kind, rhs_kind)),
    };
    result
        .map(Value::IntMatrix)
        .ok_or_else(|| dimension_mismatch(op, lhs_kind, rhs_kind))
}

fn float_matrix_pair(op: Op, lhs: Matrix<f64>, rhs: Matrix<f64>) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (
        ValueKind::FloatMatrix(lhs.rows(), lhs.cols()),
        ValueKind::FloatMatrix(rhs.rows(), rhs.cols()),
    );
    let result = match op {
        Op::Add => lhs.checked_add(&rhs),
        Op::Sub => lhs.checked_sub(&rhs),
        Op::Mul => lhs.elementwise_mul(&rhs),
        _ => return Err(mismatch(op, lhs_kind, rhs_kind)),
    };
    result
        .map(Value::FloatMatrix)
        .ok_or_else(|| dimension_mismatch(op, lhs_kind, rhs_kind))
}

/// Broadcast between an integer vector and a numeric scalar. Only `*` and `/`
/// broadcast; the scalar must be an integer or a float, matching the closed
/// set of tensor element kinds.
fn int_vector_scalar(op: Op, vector: Vector<i64>, scalar: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (ValueKind::IntVector(vector.dimensions()), scalar.kind());
    match (op, scalar) {
        (Op::Mul, Value::Int(k)) => Ok(Value::IntVector(vector.scale(k))),
        (Op::Div, Value::Int(0)) => Err(ErrorKind::DivisionByZero),
        (Op::Div, Value::Int(k)) => Ok(Value::IntVector(vector.scale_div(k))),
        (Op::Mul, Value::Float(k)) => Ok(Value::FloatVector(vector.map(|x| x as f64).scale(k))),
        (Op::Div, Value::Float(k)) => {
            Ok(Value::FloatVector(vector.map(|x| x as f64).scale_div(k)))
        }
        _ => Err(mismatch(op, lhs_kind, rhs_kind)),
    }
}

fn float_vector_scalar(op: Op, vector: Vector<f64>, scalar: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (ValueKind::FloatVector(vector.dimensions()), scalar.kind());
    let factor = match scalar {
        Value::Int(k) => k as f64,
        Value::Float(k) => k,
        _ => return Err(mismatch(op, lhs_kind, rhs_kind)),
    };
    match op {
        Op::Mul => Ok(Value::FloatVector(vector.scale(factor))),
        Op::Div => Ok(Value::FloatVector(vector.scale_div(factor))),
        _ => Err(mismatch(op, lhs_kind, rhs_kind)),
    }
}

fn int_matrix_scalar(op: Op, matrix: Matrix<i64>, scalar: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (
        ValueKind::IntMatrix(matrix.rows(), matrix.cols()),
        scalar.kind(),
    );
    match (op, scalar) {
        (Op::Mul, Value::Int(k)) => Ok(Value::IntMatrix(matrix.scale(k))),
        (Op::Div, Value::Int(0)) => Err(ErrorKind::DivisionByZero),
        (Op::Div, Value::Int(k)) => Ok(Value::IntMatrix(matrix.scale_div(k))),
        (Op::Mul, Value::Float(k)) => Ok(Value::FloatMatrix(matrix.map(|x| x as f64).scale(k))),
        (Op::Div, Value::Float(k)) => {
            Ok(Value::FloatMatrix(matrix.map(|x| x as f64).scale_div(k)))
        }
        _ => Err(mismatch(op, lhs_kind, rhs_kind)),
    }
}

fn float_matrix_scalar(op: Op, matrix: Matrix<f64>, scalar: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (
        ValueKind::FloatMatrix(matrix.rows(), matrix.cols()),
        scalar.kind(),
    );
    let factor = match scalar {
        Value::Int(k) => k as f64,
        Value::Float(k) => k,
        _ => return Err(mismatch(op, lhs_kind, rhs_kind)),
    };
    match op {
        Op::Mul => Ok(Value::FloatMatrix(matrix.scale(factor))),
        Op::Div => Ok(Value::FloatMatrix(matrix.scale_div(factor))),
        _ => Err(mismatch(op, lhs_kind, rhs_kind)),
    }
}

/// Applies a binary arithmetic operator (`+`, `-`, `*`, `/`) to two values.
pub(crate) fn binary(op: Op, lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (lhs.kind(), rhs.kind());
    match (lhs, rhs) {
        // Tensor x tensor, promoting mixed element kinds to float.
        (Value::IntVector(a), Value::IntVector(b)) => int_vector_pair(op, a, b),
        (Value::FloatVector(a), Value::FloatVector(b)) => float_vector_pair(op, a, b),
        (Value::IntVector(a), Value::FloatVector(b)) => {
            float_vector_pair(op, a.map(|x| x as f64), b)
        }
        (Value::FloatVector(a), Value::IntVector(b)) => {
            float_vector_pair(op, a, b.map(|x| x as f64))
        }

        (Value::IntMatrix(a), Value::IntMatrix(b)) => int_matrix_pair(op, a, b),
        (Value::FloatMatrix(a), Value::FloatMatrix(b)) => float_matrix_pair(op, a, b),
        (Value::IntMatrix(a), Value::FloatMatrix(b)) => {
            float_matrix_pair(op, a.map(|x| x as f64), b)
        }
        (Value::FloatMatrix(a), Value::IntMatrix(b)) => {
            float_matrix_pair(op, a, b.map(|x| x as f64))
        }

        // Tensor x scalar broadcasts `*` and `/`.
        (Value::IntVector(a), scalar) if scalar.is_numeric_scalar() => {
            int_vector_scalar(op, a, scalar)
        }
        (Value::FloatVector(a), scalar) if scalar.is_numeric_scalar() => {
            float_vector_scalar(op, a, scalar)
        }
        (Value::IntMatrix(a), scalar) if scalar.is_numeric_scalar() => {
            int_matrix_scalar(op, a, scalar)
        }
        (Value::FloatMatrix(a), scalar) if scalar.is_numeric_scalar() => {
            float_matrix_scalar(op, a, scalar)
        }

        // Scalar x tensor broadcasts `*` only, as the original runtime did.
        (scalar, Value::IntVector(b)) if scalar.is_numeric_scalar() && op == Op::Mul => {
            int_vector_scalar(op, b, scalar)
        }
        (scalar, Value::FloatVector(b)) if scalar.is_numeric_scalar() && op == Op::Mul => {
            float_vector_scalar(op, b, scalar)
        }
        (scalar, Value::IntMatrix(b)) if scalar.is_numeric_scalar() && op == Op::Mul => {
            int_matrix_scalar(op, b, scalar)
        }
        (scalar, Value::FloatMatrix(b)) if scalar.is_numeric_scalar() && op == Op::Mul => {
            float_matrix_scalar(op, b, scalar)
        }

        (lhs, rhs) if lhs.is_numeric_scalar() && rhs.is_numeric_scalar() => {
            scalar_binary(op, lhs, rhs)
        }

        _ => Err(mismatch(op, lhs_kind, rhs_kind)),
    }
}

/// Negates a value, flipping sign component-wise for tensors.
pub(crate) fn negate(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::Int(value) => value
            .checked_neg()
            .map(Value::Int)
            .ok_or(ErrorKind::IntegerOverflow(Op::Negate)),
        Value::Float(value) => Ok(Value::Float(-value)),
        Value::Decimal(value) => Ok(Value::Decimal(-value)),
        Value::BigInt(value) => Ok(Value::BigInt(-value)),
        Value::IntVector(vector) => Ok(Value::IntVector(vector.negate())),
        Value::FloatVector(vector) => Ok(Value::FloatVector(vector.negate())),
        Value::IntMatrix(matrix) => Ok(Value::IntMatrix(matrix.negate())),
        Value::FloatMatrix(matrix) => Ok(Value::FloatMatrix(matrix.negate())),
        Value::Instructions(_) => Err(ErrorKind::TypeMismatch {
            op: Op::Negate,
            lhs: ValueKind::Instructions,
            rhs: None,
        }),
    }
}

/// Computes the factorial of an integer or big-integer value by iterative
/// product down to 1; `0!` is 1 and negative input is an explicit error.
pub(crate) fn factorial(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::Int(n) => {
            if n < 0 {
                return Err(ErrorKind::NegativeFactorial);
            }
            let mut product = 1_i64;
            for k in 2..=n {
                product = product
                    .checked_mul(k)
                    .ok_or(ErrorKind::IntegerOverflow(Op::Factorial))?;
            }
            Ok(Value::Int(product))
        }
        Value::BigInt(n) => {
            if n.is_negative() {
                return Err(ErrorKind::NegativeFactorial);
            }
            let mut product = BigInt::one();
            let mut k = n;
            while k > BigInt::one() {
                product *= &k;
                k -= BigInt::one();
            }
            Ok(Value::BigInt(product))
        }
        other => Err(ErrorKind::TypeMismatch {
            op: Op::Factorial,
            lhs: other.kind(),
            rhs: None,
        }),
    }
}

fn matrix_exponent(exponent: Value, base_kind: ValueKind) -> Result<i64, ErrorKind> {
    let n = match &exponent {
        Value::Int(n) => Some(*n),
        Value::BigInt(n) => n.to_i64(),
        _ => {
            return Err(mismatch(Op::Power, base_kind, exponent.kind()));
        }
    };
    let n = n.ok_or_else(|| {
        ErrorKind::Semantic("Matrix exponent is too large".to_owned())
    })?;
    if n < 0 {
        return Err(ErrorKind::Semantic(
            "Matrix exponent must be non-negative".to_owned(),
        ));
    }
    Ok(n)
}

fn matrix_power<T: crate::algebra::Element>(
    base: Matrix<T>,
    n: i64,
    kind: ValueKind,
) -> Result<Matrix<T>, ErrorKind> {
    if !base.is_square() {
        return Err(dimension_mismatch(Op::Power, kind, kind));
    }
    // `m ^ 0` leaves the base unchanged, as the original runtime did.
    let mut acc = base.clone();
    for _ in 1..n {
        acc = acc
            .product(&base)
            .ok_or_else(|| dimension_mismatch(Op::Power, kind, kind))?;
    }
    Ok(acc)
}

/// Exponentiation. Scalar bases float-promote except for exact big-integer
/// cases; a square matrix base with a non-negative integer exponent is raised
/// via repeated matrix products. Vector bases and tensor exponents are
/// deliberate type mismatches.
pub(crate) fn power(base: Value, exponent: Value) -> Result<Value, ErrorKind> {
    let (base_kind, exponent_kind) = (base.kind(), exponent.kind());
    if base_kind == ValueKind::Instructions
        || exponent_kind == ValueKind::Instructions
        || base_kind.is_vector()
        || exponent_kind.is_vector()
        || exponent_kind.is_matrix()
    {
        return Err(mismatch(Op::Power, base_kind, exponent_kind));
    }

    match base {
        Value::IntMatrix(matrix) => {
            let n = matrix_exponent(exponent, base_kind)?;
            matrix_power(matrix, n, base_kind).map(Value::IntMatrix)
        }
        Value::FloatMatrix(matrix) => {
            let n = matrix_exponent(exponent, base_kind)?;
            matrix_power(matrix, n, base_kind).map(Value::FloatMatrix)
        }

        // Exact exponentiation when the operand shapes allow it.
        Value::BigInt(base) => match exponent {
            Value::Int(n) if n >= 0 => Ok(Value::BigInt(Pow::pow(base, n as u64))),
            Value::BigInt(n) if !n.is_negative() => {
                let n = n.to_u64().ok_or_else(|| {
                    ErrorKind::Semantic("Exponent is too large".to_owned())
                })?;
                Ok(Value::BigInt(Pow::pow(base, n)))
            }
            exponent => float_power(Value::BigInt(base), exponent),
        },

        base => float_power(base, exponent),
    }
}

fn float_power(base: Value, exponent: Value) -> Result<Value, ErrorKind> {
    let error = mismatch(Op::Power, base.kind(), exponent.kind());
    let (base, exponent) = match (base.to_f64(), exponent.to_f64()) {
        (Some(base), Some(exponent)) => (base, exponent),
        _ => return Err(error),
    };
    Ok(Value::Float(base.powf(exponent)))
}

/// Dot product, overloaded by shape: vector . vector is the scalar sum of
/// products, matrix . matrix is the standard matrix product.
pub(crate) fn dot(lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    let (lhs_kind, rhs_kind) = (lhs.kind(), rhs.kind());
    let dim_error = || dimension_mismatch(Op::Dot, lhs_kind, rhs_kind);
    match (lhs, rhs) {
        (Value::IntVector(a), Value::IntVector(b)) => {
            a.dot(&b).map(Value::Int).ok_or_else(dim_error)
        }
        (Value::FloatVector(a), Value::FloatVector(b)) => {
            a.dot(&b).map(Value::Float).ok_or_else(dim_error)
        }
        (Value::IntVector(a), Value::FloatVector(b)) => a
            .map(|x| x as f64)
            .dot(&b)
            .map(Value::Float)
            .ok_or_else(dim_error),
        (Value::FloatVector(a), Value::IntVector(b)) => a
            .dot(&b.map(|x| x as f64))
            .map(Value::Float)
            .ok_or_else(dim_error),

        (Value::IntMatrix(a), Value::IntMatrix(b)) => {
            a.product(&b).map(Value::IntMatrix).ok_or_else(dim_error)
        }
        (Value::FloatMatrix(a), Value::FloatMatrix(b)) => {
            a.product(&b).map(Value::FloatMatrix).ok_or_else(dim_error)
        }
        (Value::IntMatrix(a), Value::FloatMatrix(b)) => a
            .map(|x| x as f64)
            .product(&b)
            .map(Value::FloatMatrix)
            .ok_or_else(dim_error),
        (Value::FloatMatrix(a), Value::IntMatrix(b)) => a
            .product(&b.map(|x| x as f64))
            .map(Value::FloatMatrix)
            .ok_or_else(dim_error),

        _ => Err(mismatch(Op::Dot, lhs_kind, rhs_kind)),
    }
}
