//! Stack machine executing the instructions emitted by the parser.

use crate::{
    error::{ErrorKind, Op},
    fns::{Function, UserFn},
    symbols::SymbolTable,
    values::{ops, Value},
};

/// One executable step. The parser emits instructions in evaluation order;
/// each either pushes a value, or pops a fixed number of operands and pushes
/// the results.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Instruction {
    /// Pushes a literal value.
    Push(Value),
    /// Pops two operands and pushes their sum.
    Add,
    /// Pops two operands and pushes their difference.
    Subtract,
    /// Pops two operands and pushes their product (elementwise for matrices,
    /// cross product for 3-D vectors).
    Multiply,
    /// Pops two operands and pushes their quotient.
    Divide,
    /// Pops one operand and pushes its negation.
    Negate,
    /// Pops base and exponent and pushes the power.
    Power,
    /// Pops one operand and pushes its factorial.
    Factorial,
    /// Pops two operands and pushes their dot product (matrix product for
    /// matrices).
    DotProduct,
    /// Pops the enclosed number of scalars and pushes a vector built from
    /// them in push order.
    BuildVector(usize),
    /// Pops `rows * cols` scalars in row-major push order and pushes a matrix.
    BuildMatrix(usize, usize),
    /// Pops one value and binds it to the enclosed variable name.
    Assign(String),
    /// Pushes the value bound to the enclosed variable name.
    ReferenceSymbol(String),
    /// Pops `arity` arguments and calls the named function.
    Call {
        /// Function name to resolve at execution time.
        name: String,
        /// Number of arguments popped from the stack.
        arity: usize,
    },
}

impl Instruction {
    /// Number of stack values this instruction consumes.
    pub fn consumed_args(&self) -> usize {
        match self {
            Self::Push(_) | Self::ReferenceSymbol(_) => 0,
            Self::Negate | Self::Factorial | Self::Assign(_) => 1,
            Self::Add
            | Self::Subtract
            | Self::Multiply
            | Self::Divide
            | Self::Power
            | Self::DotProduct => 2,
            Self::BuildVector(len) => *len,
            Self::BuildMatrix(rows, cols) => rows * cols,
            Self::Call { arity, .. } => *arity,
        }
    }
}

/// Evaluation stack plus the symbol table it resolves names against.
///
/// Operand order on the stack follows source order: for `a - b`, `a` is
/// pushed first, so popping the operand window yields `[a, b]` left to right.
#[derive(Debug)]
pub struct StackMachine {
    stack: Vec<Value>,
    symbols: SymbolTable,
}

impl StackMachine {
    /// Creates a machine with an empty stack and the built-in functions
    /// registered.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    /// Returns the symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Returns the symbol table for mutation.
    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Pushes a value onto the stack.
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pops the top of the stack.
    pub fn pop(&mut self) -> Result<Value, ErrorKind> {
        self.stack.pop().ok_or(ErrorKind::StackUnderflow {
            expected: 1,
            actual: 0,
        })
    }

    /// Returns the top of the stack without popping it.
    pub fn peek(&self) -> Option<&Value> {
        self.stack.last()
    }

    /// Returns the number of values on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Discards values pushed past the given depth. Used to roll the stack
    /// back to a statement boundary after an error.
    pub(crate) fn truncate_to(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    /// Drains the whole stack in push order.
    pub fn drain(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.stack)
    }

    /// Executes one instruction against the stack, returning a reference to
    /// the pushed result if the instruction produced one.
    pub fn operate(&mut self, instruction: &Instruction) -> Result<Option<&Value>, ErrorKind> {
        let needed = instruction.consumed_args();
        if self.stack.len() < needed {
            return Err(ErrorKind::StackUnderflow {
                expected: needed,
                actual: self.stack.len(),
            });
        }
        let args = self.stack.split_off(self.stack.len() - needed);
        let results = self.execute(instruction, args)?;
        self.stack.extend(results);
        Ok(self.stack.last())
    }

    fn execute(
        &mut self,
        instruction: &Instruction,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, ErrorKind> {
        Ok(match instruction {
            Instruction::Push(value) => vec![value.clone()],

            Instruction::Add | Instruction::Subtract | Instruction::Multiply
            | Instruction::Divide => {
                let op = match instruction {
                    Instruction::Add => Op::Add,
                    Instruction::Subtract => Op::Sub,
                    Instruction::Multiply => Op::Mul,
                    _ => Op::Div,
                };
                let [lhs, rhs] = binary_args(args);
                vec![ops::binary(op, lhs, rhs)?]
            }

            Instruction::Negate => vec![ops::negate(unary_arg(args))?],
            Instruction::Factorial => vec![ops::factorial(unary_arg(args))?],
            Instruction::Power => {
                let [base, exponent] = binary_args(args);
                vec![ops::power(base, exponent)?]
            }
            Instruction::DotProduct => {
                let [lhs, rhs] = binary_args(args);
                vec![ops::dot(lhs, rhs)?]
            }

            Instruction::BuildVector(_) => vec![build_vector(args)?],
            Instruction::BuildMatrix(rows, cols) => vec![build_matrix(*rows, *cols, args)?],

            Instruction::Assign(name) => {
                self.symbols.assign_variable(name, unary_arg(args));
                vec![]
            }
            Instruction::ReferenceSymbol(name) => {
                vec![self.symbols.get_variable(name)?.clone()]
            }

            Instruction::Call { name, arity: _ } => self.call(name, args)?,
        })
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Vec<Value>, ErrorKind> {
        let overloads = self
            .symbols
            .get_function(name)
            .ok_or_else(|| ErrorKind::UnknownFunction(name.to_owned()))?;
        let function = overloads
            .iter()
            .find(|function| function.matches(&args))
            .cloned()
            .ok_or_else(|| ErrorKind::NoMatchingOverload(name.to_owned()))?;

        match function {
            Function::Native(native) => Ok(vec![native.invoke(&args)?]),
            Function::User(user) => {
                self.call_user(&user, args)?;
                // The replayed body leaves its result on the stack itself.
                Ok(vec![])
            }
        }
    }

    /// Calls a user-defined function: binds arguments over the parameter
    /// names, replays the captured body, then restores the previous bindings
    /// (unbinding parameters that had none) whether the body succeeded or not.
    fn call_user(&mut self, user: &UserFn, args: Vec<Value>) -> Result<(), ErrorKind> {
        let mut saved = Vec::with_capacity(user.params.len());
        for (param, arg) in user.params.iter().zip(args) {
            saved.push((param.clone(), self.symbols.remove_variable(param)));
            self.symbols.assign_variable(param, arg);
        }

        let mut result = Ok(());
        for instruction in &user.body {
            if let Err(error) = self.operate(instruction) {
                result = Err(error);
                break;
            }
        }

        for (param, previous) in saved {
            match previous {
                Some(value) => self.symbols.assign_variable(&param, value),
                None => {
                    self.symbols.remove_variable(&param);
                }
            }
        }
        result
    }
}

impl Default for StackMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn unary_arg(args: Vec<Value>) -> Value {
    let [arg] = <[Value; 1]>::try_from(args).expect("arity checked by `operate`");
    arg
}

fn binary_args(args: Vec<Value>) -> [Value; 2] {
    <[Value; 2]>::try_from(args).expect("arity checked by `operate`")
}

enum TensorElements {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

/// The first element picks the representation; later numeric elements are
/// coerced to it, truncating fractional parts toward zero when the first
/// element is an integer.
fn tensor_elements(shape: &str, args: Vec<Value>) -> Result<TensorElements, ErrorKind> {
    let element_error = |value: &Value| {
        ErrorKind::Semantic(format!("Cannot create a {} of {}", shape, value.kind()))
    };

    match args.first() {
        Some(Value::Int(_)) | None => {
            let mut elements = Vec::with_capacity(args.len());
            for arg in &args {
                elements.push(arg.to_i64().ok_or_else(|| element_error(arg))?);
            }
            Ok(TensorElements::Int(elements))
        }
        Some(Value::Float(_)) => {
            let mut elements = Vec::with_capacity(args.len());
            for arg in &args {
                elements.push(arg.to_f64().ok_or_else(|| element_error(arg))?);
            }
            Ok(TensorElements::Float(elements))
        }
        Some(other) => Err(element_error(other)),
    }
}

fn build_vector(args: Vec<Value>) -> Result<Value, ErrorKind> {
    Ok(match tensor_elements("vector", args)? {
        TensorElements::Int(ints) => Value::IntVector(crate::algebra::Vector::new(ints)),
        TensorElements::Float(floats) => Value::FloatVector(crate::algebra::Vector::new(floats)),
    })
}

fn build_matrix(rows: usize, cols: usize, args: Vec<Value>) -> Result<Value, ErrorKind> {
    let shape_error = || ErrorKind::Semantic(format!("Malformed {} x {} matrix", rows, cols));
    Ok(match tensor_elements("matrix", args)? {
        TensorElements::Int(ints) => Value::IntMatrix(
            crate::algebra::Matrix::new(rows, cols, ints).ok_or_else(shape_error)?,
        ),
        TensorElements::Float(floats) => Value::FloatMatrix(
            crate::algebra::Matrix::new(rows, cols, floats).ok_or_else(shape_error)?,
        ),
    })
}
