//! Recursive descent parser driving the stack machine.
//!
//! Parsing and evaluation are interleaved: outside a function definition,
//! every emitted instruction executes against the machine immediately, so a
//! statement's value is on top of the stack the moment its last token is
//! consumed. Inside a definition body, emission is redirected into a capture
//! buffer instead, and the buffered instructions become the function body.
//!
//! Two constructs need lookahead to disambiguate. `name (` begins either a
//! call or a definition; the parser peeks ahead to the end of the statement
//! looking for `=>` (or `=`) to decide. `name =` at statement start is an
//! assignment rather than an expression.

use crate::{
    error::{Error, ErrorKind},
    fns::{Function, UserFn},
    machine::{Instruction, StackMachine},
    token::{tokenize, Token, TokenKind, TokenStream},
    values::Value,
};

use std::rc::Rc;

/// Where emitted instructions go: straight to the machine, or into the
/// capture buffer of a function body under definition.
#[derive(Debug)]
enum Emission {
    Immediate,
    Capture(Vec<Instruction>),
}

/// Parses the given source against a machine, executing statements as they
/// complete.
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: TokenStream,
    machine: &'a mut StackMachine,
    emission: Emission,
    /// Position of the most recently consumed token, for error reporting.
    last: (u32, u32),
    outputs: Vec<String>,
    errors: Vec<Error>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `source`.
    pub fn new(source: &str, machine: &'a mut StackMachine) -> Self {
        Self {
            tokens: TokenStream::new(tokenize(source)),
            machine,
            emission: Emission::Immediate,
            last: (1, 1),
            outputs: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parses and executes every statement, collecting rendered outputs and
    /// errors. A failed statement does not stop the ones after it: the parser
    /// rolls the stack back to the statement boundary, skips to the next
    /// line, and continues.
    pub fn run(mut self) -> (Vec<String>, Vec<Error>) {
        loop {
            while matches!(self.tokens.current().kind, TokenKind::Eol) {
                self.advance();
            }
            if self.tokens.current().kind == TokenKind::Eof {
                break;
            }

            let depth_before = self.machine.depth();
            if let Err(error) = self.statement() {
                self.errors.push(error);
                self.machine.truncate_to(depth_before);
                self.synchronize();
            }
        }
        (self.outputs, self.errors)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens.advance();
        self.last = (token.line, token.col);
        token
    }

    fn error_here(&self, kind: ErrorKind) -> Error {
        let token = self.tokens.current();
        Error::new(token.line, token.col, kind)
    }

    fn error_at_last(&self, kind: ErrorKind) -> Error {
        Error::new(self.last.0, self.last.1, kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.tokens.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error_here(ErrorKind::Syntax(format!(
                "Expected {}, found {}",
                kind,
                self.tokens.current().kind
            ))))
        }
    }

    /// Skips past the rest of the statement after an error and resets the
    /// parser modes the statement may have left behind.
    fn synchronize(&mut self) {
        self.tokens.set_space_significant(false);
        self.emission = Emission::Immediate;
        loop {
            match self.tokens.current().kind {
                TokenKind::Eof => break,
                TokenKind::Eol => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Routes an instruction to the machine or the capture buffer.
    fn emit(&mut self, instruction: Instruction) -> Result<(), Error> {
        match &mut self.emission {
            Emission::Capture(body) => {
                body.push(instruction);
                Ok(())
            }
            Emission::Immediate => {
                let result = self.machine.operate(&instruction).map(drop);
                result.map_err(|kind| self.error_at_last(kind))
            }
        }
    }

    fn statement(&mut self) -> Result<(), Error> {
        let current = self.tokens.current();
        if current.kind == TokenKind::Ident {
            let next = self.tokens.peek().kind;
            self.tokens.reset_peek();
            if next == TokenKind::Equal {
                return self.assignment();
            }
        }

        let depth_before = self.machine.depth();
        self.expression()?;
        self.end_statement()?;

        // A definition leaves nothing on the stack and prints nothing.
        if self.machine.depth() > depth_before {
            if let Some(value) = self.machine.peek() {
                self.outputs.push(value.to_string());
            }
        }
        Ok(())
    }

    fn assignment(&mut self) -> Result<(), Error> {
        let name = self.advance().text;
        self.expect(TokenKind::Equal)?;
        self.expression()?;
        self.emit(Instruction::Assign(name.clone()))?;
        self.end_statement()?;

        let value = self
            .machine
            .symbols()
            .get_variable(&name)
            .map_err(|kind| self.error_at_last(kind))?;
        self.outputs.push(value.to_string());
        Ok(())
    }

    fn end_statement(&mut self) -> Result<(), Error> {
        match self.tokens.current().kind {
            TokenKind::Eol => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            other => Err(self.error_here(ErrorKind::Syntax(format!(
                "Expected end of statement, found {}",
                other
            )))),
        }
    }

    fn expression(&mut self) -> Result<(), Error> {
        self.additive()
    }

    /// `additive = multiplicative (("+" | "-") additive)?`
    ///
    /// The tail recurses rather than loops, so chains of the same operator
    /// group to the right: `1 - 2 - 3` evaluates as `1 - (2 - 3)`.
    fn additive(&mut self) -> Result<(), Error> {
        self.multiplicative()?;
        match self.tokens.current().kind {
            TokenKind::Plus => {
                self.advance();
                self.additive()?;
                self.emit(Instruction::Add)
            }
            TokenKind::Minus => {
                self.advance();
                self.additive()?;
                self.emit(Instruction::Subtract)
            }
            _ => Ok(()),
        }
    }

    /// `multiplicative = power (("*" | "/" | ".") multiplicative)?`
    fn multiplicative(&mut self) -> Result<(), Error> {
        self.power()?;
        match self.tokens.current().kind {
            TokenKind::Star => {
                self.advance();
                self.multiplicative()?;
                self.emit(Instruction::Multiply)
            }
            TokenKind::Slash => {
                self.advance();
                self.multiplicative()?;
                self.emit(Instruction::Divide)
            }
            TokenKind::Dot => {
                self.advance();
                self.multiplicative()?;
                self.emit(Instruction::DotProduct)
            }
            _ => Ok(()),
        }
    }

    /// `power = factor ("^" factor)?`
    fn power(&mut self) -> Result<(), Error> {
        self.factor()?;
        if self.tokens.current().kind == TokenKind::Caret {
            self.advance();
            self.factor()?;
            self.emit(Instruction::Power)?;
        }
        Ok(())
    }

    /// `factor = ("+" | "-") factor | primary "!"?`
    fn factor(&mut self) -> Result<(), Error> {
        match self.tokens.current().kind {
            TokenKind::Plus => {
                self.advance();
                return self.factor();
            }
            TokenKind::Minus => {
                self.advance();
                self.factor()?;
                return self.emit(Instruction::Negate);
            }
            _ => {}
        }

        self.primary()?;
        if self.tokens.current().kind == TokenKind::Bang {
            self.advance();
            self.emit(Instruction::Factorial)?;
        }
        Ok(())
    }

    fn primary(&mut self) -> Result<(), Error> {
        match self.tokens.current().kind {
            TokenKind::Ident => self.identifier(),
            TokenKind::Integer => self.integer_literal(),
            TokenKind::Float => self.float_literal(),
            TokenKind::LParen => self.parenthesized(),
            TokenKind::LBracket => self.matrix_literal(),
            other => Err(self.error_here(ErrorKind::Syntax(format!(
                "Expected an expression, found {}",
                other
            )))),
        }
    }

    fn identifier(&mut self) -> Result<(), Error> {
        if self.tokens.current().kind == TokenKind::Ident
            && self.next_is(TokenKind::LParen)
            && self.is_function_definition()
        {
            return self.function_definition();
        }

        let name_token = self.advance();
        if self.tokens.current().kind == TokenKind::LParen {
            self.function_call(name_token)
        } else {
            self.emit(Instruction::ReferenceSymbol(name_token.text))
        }
    }

    fn next_is(&mut self, kind: TokenKind) -> bool {
        let result = self.tokens.peek().kind == kind;
        self.tokens.reset_peek();
        result
    }

    /// Distinguishes `f(x) => ...` from `f(x)` by scanning ahead to the end
    /// of the statement for a definer. `=` after the parameter list is also
    /// accepted, matching the assignment spelling.
    fn is_function_definition(&mut self) -> bool {
        let found = loop {
            match self.tokens.peek().kind {
                TokenKind::Eof | TokenKind::Eol => break false,
                TokenKind::Definer | TokenKind::Equal => break true,
                _ => {}
            }
        };
        self.tokens.reset_peek();
        found
    }

    fn function_call(&mut self, name_token: Token) -> Result<(), Error> {
        // Unknown names are reported before the arguments are evaluated, so
        // a failed call cannot leave argument side effects behind. Inside a
        // capture the check is deferred to the call site, where the function
        // may exist by then.
        if matches!(self.emission, Emission::Immediate)
            && self.machine.symbols().get_function(&name_token.text).is_none()
        {
            return Err(Error::new(
                name_token.line,
                name_token.col,
                ErrorKind::UnknownFunction(name_token.text),
            ));
        }

        self.expect(TokenKind::LParen)?;
        let mut arity = 0;
        if self.tokens.current().kind != TokenKind::RParen {
            self.expression()?;
            arity += 1;
            while self.tokens.current().kind == TokenKind::Comma {
                self.advance();
                self.expression()?;
                arity += 1;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.emit(Instruction::Call {
            name: name_token.text,
            arity,
        })
    }

    fn function_definition(&mut self) -> Result<(), Error> {
        if matches!(self.emission, Emission::Capture(_)) {
            return Err(self.error_here(ErrorKind::Semantic(
                "Cannot define a function inside another function definition".to_owned(),
            )));
        }

        let name = self.advance().text;
        self.expect(TokenKind::LParen)?;
        let mut params = vec![];
        while self.tokens.current().kind == TokenKind::Ident {
            params.push(self.advance().text);
            if self.tokens.current().kind == TokenKind::Comma {
                self.advance();
            }
        }
        self.expect(TokenKind::RParen)?;

        match self.tokens.current().kind {
            TokenKind::Definer | TokenKind::Equal => {
                self.advance();
            }
            other => {
                return Err(self.error_here(ErrorKind::Syntax(format!(
                    "Expected `=>`, found {}",
                    other
                ))));
            }
        }

        self.emission = Emission::Capture(vec![]);
        let body_result = self.expression();
        let body = match std::mem::replace(&mut self.emission, Emission::Immediate) {
            Emission::Capture(body) => body,
            Emission::Immediate => vec![],
        };
        body_result?;

        let function = Function::User(Rc::new(UserFn { params, body }));
        self.machine.symbols_mut().add_function(&name, function);
        Ok(())
    }

    fn integer_literal(&mut self) -> Result<(), Error> {
        let token = self.advance();
        // Out-of-range literals overflow into big integers.
        let value = match token.text.parse::<i64>() {
            Ok(value) => Value::Int(value),
            Err(_) => token
                .text
                .parse::<num_bigint::BigInt>()
                .map(Value::BigInt)
                .map_err(|_| {
                    self.error_at_last(ErrorKind::Syntax(format!(
                        "Malformed integer literal `{}`",
                        token.text
                    )))
                })?,
        };
        self.emit(Instruction::Push(value))
    }

    /// Length of literal text beyond which a float literal is read as an
    /// arbitrary-precision decimal instead of an `f64`.
    const DECIMAL_WIDTH_THRESHOLD: usize = 8;

    fn float_literal(&mut self) -> Result<(), Error> {
        let token = self.advance();
        let value = if token.text.len() > Self::DECIMAL_WIDTH_THRESHOLD {
            token
                .text
                .parse::<bigdecimal::BigDecimal>()
                .ok()
                .map(Value::Decimal)
        } else {
            token.text.parse::<f64>().ok().map(Value::Float)
        };
        let value = value.ok_or_else(|| {
            self.error_at_last(ErrorKind::Syntax(format!(
                "Malformed number literal `{}`",
                token.text
            )))
        })?;
        self.emit(Instruction::Push(value))
    }

    /// `( expr )` is grouping; `( expr expr ... )` with space-separated
    /// elements is a vector literal.
    fn parenthesized(&mut self) -> Result<(), Error> {
        self.expect(TokenKind::LParen)?;
        let was_significant = self.tokens.set_space_significant(true);
        let result = self.vector_elements();
        self.tokens.set_space_significant(was_significant);
        result
    }

    fn vector_elements(&mut self) -> Result<(), Error> {
        self.skip_spaces();
        self.expression()?;
        self.skip_spaces();

        if self.tokens.current().kind == TokenKind::RParen {
            // A single parenthesized expression is plain grouping.
            self.advance();
            return Ok(());
        }

        let mut len = 1;
        while self.tokens.current().kind != TokenKind::RParen {
            self.expression()?;
            self.skip_spaces();
            len += 1;
        }
        self.expect(TokenKind::RParen)?;
        self.emit(Instruction::BuildVector(len))
    }

    /// `[ row ("," row)* ]` where each row is a space-separated element list.
    /// The first row fixes the column count.
    fn matrix_literal(&mut self) -> Result<(), Error> {
        self.expect(TokenKind::LBracket)?;
        let was_significant = self.tokens.set_space_significant(true);
        let result = self.matrix_rows();
        self.tokens.set_space_significant(was_significant);
        result
    }

    fn matrix_rows(&mut self) -> Result<(), Error> {
        let mut rows = 0;
        let mut cols = 0;
        loop {
            let mut row_len = 0;
            self.skip_spaces();
            while !matches!(
                self.tokens.current().kind,
                TokenKind::Comma | TokenKind::RBracket
            ) {
                self.expression()?;
                self.skip_spaces();
                row_len += 1;
            }
            rows += 1;
            if rows == 1 {
                if row_len < 2 {
                    return Err(self.error_here(ErrorKind::Syntax(format!(
                        "A matrix row needs at least 2 elements, found {}",
                        row_len
                    ))));
                }
                cols = row_len;
            } else if row_len != cols {
                return Err(self.error_here(ErrorKind::Syntax(format!(
                    "Matrix row {} has {} element(s), expected {}",
                    rows, row_len, cols
                ))));
            }

            match self.tokens.current().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect(TokenKind::RBracket)?;
        self.emit(Instruction::BuildMatrix(rows, cols))
    }

    fn skip_spaces(&mut self) {
        while self.tokens.current().kind == TokenKind::Space {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn eval(machine: &mut StackMachine, source: &str) -> Vec<String> {
        let (outputs, errors) = Parser::new(source, machine).run();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        outputs
    }

    #[test]
    fn literal_statement_prints_its_value() {
        let mut machine = StackMachine::new();
        assert_eq!(eval(&mut machine, "1+2"), ["3"]);
    }

    #[test]
    fn assignment_prints_the_bound_value() {
        let mut machine = StackMachine::new();
        assert_eq!(eval(&mut machine, "a = 1\nb = 2\na+b"), ["1", "2", "3"]);
    }

    #[test]
    fn definition_prints_nothing() {
        let mut machine = StackMachine::new();
        assert_eq!(eval(&mut machine, "f(x) => x*2\nf(4)"), ["8"]);
    }

    #[test]
    fn precedence_and_unary() {
        let mut machine = StackMachine::new();
        assert_eq!(eval(&mut machine, "1+2*3"), ["7"]);
        // The sign is part of the factor, so it is squared along with it.
        assert_eq!(eval(&mut machine, "-2^2"), ["4.0"]);
        assert_eq!(eval(&mut machine, "(5)"), ["5"]);
        assert_eq!(eval(&mut machine, "3!"), ["6"]);
    }

    #[test]
    fn vector_literal_vs_grouping() {
        let mut machine = StackMachine::new();
        assert_eq!(eval(&mut machine, "(1 2 3)"), ["(1 2 3)"]);
        assert_eq!(eval(&mut machine, "(1+1 2 3)"), ["(2 2 3)"]);
        assert_eq!(eval(&mut machine, "(1+1)"), ["2"]);
    }

    #[test]
    fn matrix_literal_rows() {
        let mut machine = StackMachine::new();
        assert_eq!(
            eval(&mut machine, "[1 2 3,3 2 1]"),
            ["[1 2 3 , 3 2 1]"]
        );
    }

    #[test]
    fn ragged_matrix_is_a_syntax_error() {
        let mut machine = StackMachine::new();
        let (outputs, errors) = Parser::new("[1 2 3,4 5]", &mut machine).run();
        assert!(outputs.is_empty());
        assert_matches!(
            errors[0].kind(),
            ErrorKind::Syntax(message) if message.contains("expected 3")
        );
    }

    #[test]
    fn unknown_function_is_reported_before_arguments_run() {
        let mut machine = StackMachine::new();
        let (outputs, errors) = Parser::new("nope(1+2)", &mut machine).run();
        assert!(outputs.is_empty());
        assert_matches!(
            errors[0].kind(),
            ErrorKind::UnknownFunction(name) if name == "nope"
        );
        assert_eq!(machine.depth(), 0);
    }

    #[test]
    fn error_recovery_continues_with_next_statement() {
        let mut machine = StackMachine::new();
        let (outputs, errors) = Parser::new("1+\n2+2", &mut machine).run();
        assert_eq!(outputs, ["4"]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn stack_rolls_back_to_statement_boundary_on_error() {
        let mut machine = StackMachine::new();
        let (_, errors) = Parser::new("1+2\n3*undefined_name", &mut machine).run();
        assert_eq!(errors.len(), 1);
        // Only the successful statement's value remains.
        assert_eq!(machine.depth(), 1);
    }

    #[test]
    fn nested_definitions_are_rejected() {
        let mut machine = StackMachine::new();
        let (_, errors) = Parser::new("f(x) => g(y) => y", &mut machine).run();
        assert_matches!(errors[0].kind(), ErrorKind::Semantic(_));
    }

    #[test]
    fn long_float_literal_becomes_decimal() {
        let mut machine = StackMachine::new();
        let outputs = eval(&mut machine, "3.14159265358979");
        assert_eq!(outputs, ["3.14159265358979"]);
        assert_matches!(machine.peek(), Some(Value::Decimal(_)));
    }

    #[test]
    fn huge_integer_literal_becomes_bigint() {
        let mut machine = StackMachine::new();
        eval(&mut machine, "123456789012345678901234567890");
        assert_matches!(machine.peek(), Some(Value::BigInt(_)));
    }

    #[test]
    fn definer_lookahead_does_not_consume() {
        let mut machine = StackMachine::new();
        // `f(2)` must parse as a call even though `f` was defined with `=`.
        assert_eq!(eval(&mut machine, "f(x) = x+1\nf(2)"), ["3"]);
    }
}
