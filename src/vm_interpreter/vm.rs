use std::sync::Arc;

use super::{
    chunk::{Chunk, CodeReadError, OpCode},
    variable::{Variable, VariableBank},
};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum InterpreterError {
    #[error("Error reading bytecode: {0}")]
    CodeReadError(#[from] CodeReadError),
    #[error("Stack underflow")]
    StackUnderflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Running,
    Halted,
}

/// Stack machine running one compiled chunk.
///
/// The chunk is shared, so cloning a `Vm` gives an independent stack and
/// variable bank over the same code.
#[derive(Debug, Clone)]
pub struct Vm {
    chunk: Arc<Chunk>,
    ip: usize,
    stack: Vec<f64>,
    variables: VariableBank,
}

impl Vm {
    pub fn new(chunk: impl Into<Arc<Chunk>>) -> Self {
        Self {
            chunk: chunk.into(),
            ip: 0,
            stack: vec![],
            variables: VariableBank::new(),
        }
    }
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }
    pub fn stack(&self) -> &[f64] {
        &self.stack
    }
    pub fn variables(&self) -> &VariableBank {
        &self.variables
    }
    pub fn variable(&self, variable: Variable) -> f64 {
        self.variables.get(variable)
    }
    /// Variables keep their value across runs and resets.
    pub fn set_variable(&mut self, variable: Variable, value: f64) {
        self.variables.set(variable, value);
    }
    /// Rewinds to the first instruction with an empty stack.
    pub fn reset(&mut self) {
        self.ip = 0;
        self.stack.clear();
    }
    pub fn is_halted(&self) -> bool {
        self.ip >= self.chunk.len()
    }
    /// Top of the stack, left in place.
    pub fn result(&self) -> Option<f64> {
        self.stack.last().copied()
    }
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        while self.step()? == VmState::Running {}
        Ok(())
    }
    /// Executes the instruction at `ip`, if any.
    pub fn step(&mut self) -> Result<VmState, InterpreterError> {
        if self.is_halted() {
            return Ok(VmState::Halted);
        }

        #[cfg(feature = "debug_stack")]
        tracing::trace!(
            ip = self.ip,
            instruction = %self
                .chunk
                .read_instruction(self.ip)
                .map_or_else(|e| e.to_string(), |(_, instruction)| instruction.to_string()),
            stack = ?self.stack,
            "step"
        );

        let op_code = self.next(Chunk::read_op_code)?;
        match op_code {
            OpCode::PushNumber => {
                let value = self.next(Chunk::read_number)?;
                self.stack_push(value);
            }
            OpCode::PushVariable => {
                let variable = self.next(Chunk::read_variable)?;
                self.stack_push(self.variables.get(variable));
            }
            OpCode::Negate => {
                let value = -self.stack_pop()?;
                self.stack_push(value);
            }
            OpCode::Add => self.binary_op(|a, b| a + b)?,
            OpCode::Sub => self.binary_op(|a, b| a - b)?,
            OpCode::Mul => self.binary_op(|a, b| a * b)?,
            OpCode::Div => self.binary_op(|a, b| a / b)?,
            OpCode::Pow => self.binary_op(f64::powf)?,
        };

        Ok(if self.is_halted() {
            VmState::Halted
        } else {
            VmState::Running
        })
    }
    fn binary_op(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<(), InterpreterError> {
        let b = self.stack_pop()?;
        let a = self.stack_pop()?;
        self.stack_push(op(a, b));
        Ok(())
    }
    fn stack_push(&mut self, value: f64) {
        self.stack.push(value);
    }
    fn stack_pop(&mut self) -> Result<f64, InterpreterError> {
        self.stack.pop().ok_or(InterpreterError::StackUnderflow)
    }
    fn next<T, F: FnOnce(&Chunk, usize) -> Result<(usize, T), CodeReadError>>(
        &mut self,
        read: F,
    ) -> Result<T, CodeReadError> {
        let (next_ip, value) = read(&*self.chunk, self.ip)?;
        self.ip = next_ip;
        Ok(value)
    }
}
