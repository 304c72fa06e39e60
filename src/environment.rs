use tracing::debug;

use crate::{
    arena::Arena,
    error::Error,
    parser::Parser,
    scanner::tokenize,
    vm_interpreter::{Chunk, Compiler, InterpreterError, Variable, VariableError, Vm},
};

/// An expression compiled once and evaluated any number of times, with
/// variables changed in between.
///
/// ```
/// let mut env = mp_rs::Environment::new("x * (2 + x) / 2").unwrap();
/// env.set_variable('x', 10.0).unwrap();
/// assert_eq!(env.evaluate().unwrap(), 60.0);
/// ```
#[derive(Debug, Clone)]
pub struct Environment {
    vm: Vm,
}

impl Environment {
    /// Tokenizes, parses and compiles `source`. The tokens and tree are
    /// dropped once the code is built.
    pub fn new(source: &str) -> Result<Self, Error> {
        let tokens = tokenize(source)?;
        let mut arena = Arena::new();
        let root = Parser::parse(&mut arena, &tokens)?;
        let chunk = Compiler::compile(&arena, root)?;
        debug!(
            tokens = tokens.len(),
            nodes = arena.len(),
            bytes = chunk.len(),
            "compiled environment"
        );
        Ok(Self { vm: Vm::new(chunk) })
    }

    pub fn set_variable(&mut self, letter: char, value: f64) -> Result<(), VariableError> {
        self.vm.set_variable(Variable::from_letter(letter)?, value);
        Ok(())
    }

    pub fn variable(&self, letter: char) -> Result<f64, VariableError> {
        Ok(self.vm.variable(Variable::from_letter(letter)?))
    }

    /// Runs the code from the start with the current variables.
    pub fn evaluate(&mut self) -> Result<f64, Error> {
        self.vm.reset();
        self.vm.run()?;
        Ok(self.vm.result().ok_or(InterpreterError::StackUnderflow)?)
    }

    pub fn chunk(&self) -> &Chunk {
        self.vm.chunk()
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }
}
