//! Functions callable from the language: native built-ins and user-defined
//! functions captured as instruction lists.
//!
//! A name maps to an ordered list of overloads. Resolution walks the list in
//! registration order and picks the first overload whose arity and argument
//! kinds match, so more specific overloads must be registered before more
//! general ones (the integer `abs` before the float one, for instance).

use std::rc::Rc;

use crate::{
    error::ErrorKind,
    machine::Instruction,
    values::Value,
};

/// Native function: a fixed-arity Rust implementation with a kind filter.
#[derive(Debug, Clone, Copy)]
pub struct NativeFn {
    name: &'static str,
    arity: usize,
    accepts: fn(&Value) -> bool,
    invoke: fn(&[Value]) -> Result<Value, ErrorKind>,
}

impl NativeFn {
    /// Returns the name this function was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn invoke(&self, args: &[Value]) -> Result<Value, ErrorKind> {
        (self.invoke)(args)
    }
}

/// User-defined function: parameter names plus the captured body.
#[derive(Debug)]
pub struct UserFn {
    /// Parameter names, in declaration order.
    pub params: Vec<String>,
    /// Captured body instructions, replayed on each call.
    pub body: Vec<Instruction>,
}

/// A single overload of a callable name.
#[derive(Debug, Clone)]
pub enum Function {
    /// Implemented natively.
    Native(NativeFn),
    /// Defined in the language itself.
    User(Rc<UserFn>),
}

impl Function {
    /// Returns the number of arguments this overload takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Native(native) => native.arity,
            Self::User(user) => user.params.len(),
        }
    }

    /// Checks whether this overload accepts the given arguments. User-defined
    /// functions constrain arity only; native ones additionally filter every
    /// argument through their kind predicate.
    pub fn matches(&self, args: &[Value]) -> bool {
        match self {
            Self::Native(native) => {
                native.arity == args.len() && args.iter().all(native.accepts)
            }
            Self::User(user) => user.params.len() == args.len(),
        }
    }
}

fn scalar_arg(name: &'static str, value: &Value) -> Result<f64, ErrorKind> {
    value.to_f64().ok_or_else(|| {
        ErrorKind::Semantic(format!("`{}` expects a numeric scalar argument", name))
    })
}

/// Built-in functions in registration order. Overload order matters: within
/// a name, earlier entries win.
pub(crate) fn standard_library() -> Vec<(&'static str, Function)> {
    macro_rules! unary_float {
        ($name:tt, $func:expr) => {
            (
                $name,
                Function::Native(NativeFn {
                    name: $name,
                    arity: 1,
                    accepts: Value::is_numeric_scalar,
                    invoke: |args| {
                        let x = scalar_arg($name, &args[0])?;
                        Ok(Value::Float($func(x)))
                    },
                }),
            )
        };
    }

    macro_rules! binary_float {
        ($name:tt, $func:expr) => {
            (
                $name,
                Function::Native(NativeFn {
                    name: $name,
                    arity: 2,
                    accepts: Value::is_numeric_scalar,
                    invoke: |args| {
                        let x = scalar_arg($name, &args[0])?;
                        let y = scalar_arg($name, &args[1])?;
                        Ok(Value::Float($func(x, y)))
                    },
                }),
            )
        };
    }

    vec![
        unary_float!("sin", f64::sin),
        unary_float!("cos", f64::cos),
        unary_float!("tan", f64::tan),
        unary_float!("asin", f64::asin),
        unary_float!("acos", f64::acos),
        unary_float!("atan", f64::atan),
        unary_float!("sinh", f64::sinh),
        unary_float!("cosh", f64::cosh),
        unary_float!("tanh", f64::tanh),
        unary_float!("exp", f64::exp),
        unary_float!("ln", f64::ln),
        unary_float!("log10", f64::log10),
        unary_float!("sqrt", f64::sqrt),
        // The integer overload comes first so that `abs(-3)` stays an integer.
        (
            "abs",
            Function::Native(NativeFn {
                name: "abs",
                arity: 1,
                accepts: |value| matches!(value, Value::Int(_)),
                invoke: |args| match &args[0] {
                    Value::Int(value) => value.checked_abs().map(Value::Int).ok_or(
                        ErrorKind::IntegerOverflow(crate::error::Op::Negate),
                    ),
                    _ => unreachable!("filtered by `accepts`"),
                },
            }),
        ),
        unary_float!("abs", f64::abs),
        unary_float!("floor", f64::floor),
        unary_float!("ceil", f64::ceil),
        unary_float!("round", f64::round),
        binary_float!("atan2", f64::atan2),
        binary_float!("pow", f64::powf),
        binary_float!("min", f64::min),
        binary_float!("max", f64::max),
        (
            "transpose",
            Function::Native(NativeFn {
                name: "transpose",
                arity: 1,
                accepts: Value::is_matrix,
                invoke: |args| match &args[0] {
                    Value::IntMatrix(matrix) => Ok(Value::IntMatrix(matrix.transpose())),
                    Value::FloatMatrix(matrix) => Ok(Value::FloatMatrix(matrix.transpose())),
                    _ => unreachable!("filtered by `accepts`"),
                },
            }),
        ),
        (
            "invert",
            Function::Native(NativeFn {
                name: "invert",
                arity: 1,
                accepts: Value::is_matrix,
                invoke: |args| {
                    let matrix = match &args[0] {
                        Value::IntMatrix(matrix) => matrix.map(|x| x as f64),
                        Value::FloatMatrix(matrix) => matrix.clone(),
                        _ => unreachable!("filtered by `accepts`"),
                    };
                    matrix.inverse().map(Value::FloatMatrix).ok_or_else(|| {
                        ErrorKind::Semantic(format!(
                            "Cannot invert a {} x {} matrix; only square matrices are invertible",
                            matrix.rows(),
                            matrix.cols()
                        ))
                    })
                },
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::algebra::Matrix;

    fn overloads(name: &str) -> Vec<Function> {
        standard_library()
            .into_iter()
            .filter_map(|(reg_name, function)| (reg_name == name).then_some(function))
            .collect()
    }

    #[test]
    fn abs_overloads_in_registration_order() {
        let abs = overloads("abs");
        assert_eq!(abs.len(), 2);

        let int_args = [Value::Int(-3)];
        let chosen = abs.iter().find(|function| function.matches(&int_args));
        let result = assert_matches!(chosen, Some(Function::Native(native)) => native)
            .invoke(&int_args)
            .unwrap();
        assert_eq!(result, Value::Int(3));

        let float_args = [Value::Float(-1.5)];
        let chosen = abs.iter().find(|function| function.matches(&float_args));
        let result = assert_matches!(chosen, Some(Function::Native(native)) => native)
            .invoke(&float_args)
            .unwrap();
        assert_eq!(result, Value::Float(1.5));
    }

    #[test]
    fn native_kind_filter() {
        let sqrt = &overloads("sqrt")[0];
        assert!(sqrt.matches(&[Value::Int(4)]));
        assert!(!sqrt.matches(&[Value::Int(4), Value::Int(2)]));
        assert!(!sqrt.matches(&[Value::IntMatrix(
            Matrix::new(1, 1, vec![4]).unwrap()
        )]));
    }

    #[test]
    fn invert_rejects_non_square() {
        let invert = &overloads("invert")[0];
        let args = [Value::IntMatrix(Matrix::new(2, 3, vec![0; 6]).unwrap())];
        assert!(invert.matches(&args));
        let native = assert_matches!(invert, Function::Native(native) => native);
        assert_matches!(native.invoke(&args), Err(ErrorKind::Semantic(_)));
    }

    #[test]
    fn user_function_matches_on_arity_only() {
        let user = Function::User(Rc::new(UserFn {
            params: vec!["x".to_owned()],
            body: vec![],
        }));
        assert_eq!(user.arity(), 1);
        assert!(user.matches(&[Value::Float(1.0)]));
        assert!(user.matches(&[Value::IntMatrix(Matrix::new(1, 1, vec![1]).unwrap())]));
        assert!(!user.matches(&[Value::Int(1), Value::Int(2)]));
    }
}
