//! Symbol table: variable bindings and function overload lists.

use std::collections::HashMap;

use crate::{
    error::ErrorKind,
    fns::{standard_library, Function},
    values::Value,
};

/// Variables and functions visible to the machine.
///
/// Variables live in a single flat scope and assignment is an upsert.
/// Functions are additive: registering a name that already exists appends an
/// overload rather than replacing the earlier ones, and lookups later walk
/// the overloads in registration order.
#[derive(Debug)]
pub struct SymbolTable {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Vec<Function>>,
}

impl SymbolTable {
    /// Creates a table pre-populated with the built-in functions.
    pub fn new() -> Self {
        let mut functions = HashMap::<String, Vec<Function>>::new();
        for (name, function) in standard_library() {
            functions.entry(name.to_owned()).or_default().push(function);
        }
        Self {
            variables: HashMap::new(),
            functions,
        }
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn assign_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_owned(), value);
    }

    /// Looks up a variable.
    pub fn get_variable(&self, name: &str) -> Result<&Value, ErrorKind> {
        self.variables
            .get(name)
            .ok_or_else(|| ErrorKind::UndefinedSymbol(name.to_owned()))
    }

    /// Removes a variable binding, returning the removed value if any.
    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Appends an overload under `name`.
    pub fn add_function(&mut self, name: &str, function: Function) {
        self.functions.entry(name.to_owned()).or_default().push(function);
    }

    /// Returns the overloads registered under `name`, in registration order.
    pub fn get_function(&self, name: &str) -> Option<&[Function]> {
        self.functions.get(name).map(Vec::as_slice)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
