use std::fmt::Display;

use miette::Diagnostic;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use super::variable::Variable;

/// Width in bytes of a `PushNumber` operand.
pub const NUMBER_WIDTH: usize = 8;

/// Byte `0` is left unassigned so zeroed code never decodes.
#[derive(Debug, IntoPrimitive, TryFromPrimitive, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    PushNumber = 1,
    PushVariable,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Negate,
}

impl OpCode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::PushNumber => "PUSH_NUM",
            Self::PushVariable => "PUSH_VAR",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Pow => "POW",
            Self::Negate => "NEG",
        }
    }
    /// Bytes taken by the opcode and its operand.
    pub fn width(&self) -> usize {
        match self {
            Self::PushNumber => 1 + NUMBER_WIDTH,
            Self::PushVariable => 2,
            _ => 1,
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    PushNumber(f64),
    PushVariable(Variable),
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Negate,
}

impl Instruction {
    pub fn op_code(&self) -> OpCode {
        match self {
            Self::PushNumber(_) => OpCode::PushNumber,
            Self::PushVariable(_) => OpCode::PushVariable,
            Self::Add => OpCode::Add,
            Self::Sub => OpCode::Sub,
            Self::Mul => OpCode::Mul,
            Self::Div => OpCode::Div,
            Self::Pow => OpCode::Pow,
            Self::Negate => OpCode::Negate,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.op_code().mnemonic())?;
        match self {
            Self::PushNumber(value) => write!(f, " {:.6}", value),
            Self::PushVariable(variable) => write!(f, " {}", variable),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum CodeReadError {
    #[error("Unexpected end of code")]
    UnexpectedEnd,
    #[error("Unexpected opcode {1} at index {0}")]
    InvalidOpCode(usize, u8),
    #[error("Unknown variable {1} at index {0}")]
    InvalidVariable(usize, u8),
}

/// Compiled bytecode: a one byte opcode followed by its operand, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_code(code: Vec<u8>) -> Self {
        Self { code }
    }
    pub fn code(&self) -> &[u8] {
        &self.code[..]
    }
    pub fn len(&self) -> usize {
        self.code.len()
    }
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
    pub fn write_op(&mut self, op: OpCode) {
        self.code.push(op.into());
    }
    pub fn write_number(&mut self, value: f64) {
        self.write_op(OpCode::PushNumber);
        self.code.extend_from_slice(&value.to_le_bytes());
    }
    pub fn write_variable(&mut self, variable: Variable) {
        self.write_op(OpCode::PushVariable);
        self.code.push(variable.index());
    }
    pub fn write_instruction(&mut self, instruction: Instruction) {
        match instruction {
            Instruction::PushNumber(value) => self.write_number(value),
            Instruction::PushVariable(variable) => self.write_variable(variable),
            other => self.write_op(other.op_code()),
        }
    }
    pub fn read_byte(&self, offset: usize) -> Result<u8, CodeReadError> {
        self.code
            .get(offset)
            .cloned()
            .ok_or(CodeReadError::UnexpectedEnd)
    }
    pub fn read_op_code(&self, offset: usize) -> Result<(usize, OpCode), CodeReadError> {
        let op_code = self.read_byte(offset)?;
        Ok((
            offset + 1,
            OpCode::try_from(op_code).map_err(|_| CodeReadError::InvalidOpCode(offset, op_code))?,
        ))
    }
    pub fn read_number(&self, offset: usize) -> Result<(usize, f64), CodeReadError> {
        let bytes: [u8; NUMBER_WIDTH] = self
            .code
            .get(offset..offset + NUMBER_WIDTH)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(CodeReadError::UnexpectedEnd)?;
        Ok((offset + NUMBER_WIDTH, f64::from_le_bytes(bytes)))
    }
    pub fn read_variable(&self, offset: usize) -> Result<(usize, Variable), CodeReadError> {
        let index = self.read_byte(offset)?;
        let variable =
            Variable::from_index(index).map_err(|_| CodeReadError::InvalidVariable(offset, index))?;
        Ok((offset + 1, variable))
    }
    pub fn read_instruction(&self, offset: usize) -> Result<(usize, Instruction), CodeReadError> {
        let (offset, op_code) = self.read_op_code(offset)?;
        Ok(match op_code {
            OpCode::PushNumber => {
                let (offset, value) = self.read_number(offset)?;
                (offset, Instruction::PushNumber(value))
            }
            OpCode::PushVariable => {
                let (offset, variable) = self.read_variable(offset)?;
                (offset, Instruction::PushVariable(variable))
            }
            OpCode::Add => (offset, Instruction::Add),
            OpCode::Sub => (offset, Instruction::Sub),
            OpCode::Mul => (offset, Instruction::Mul),
            OpCode::Div => (offset, Instruction::Div),
            OpCode::Pow => (offset, Instruction::Pow),
            OpCode::Negate => (offset, Instruction::Negate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn number_operand_is_little_endian() {
        let mut chunk = Chunk::new();
        chunk.write_number(1.0);
        assert_eq!(chunk.code(), &[1, 0, 0, 0, 0, 0, 0, 0xf0, 0x3f]);
        assert_eq!(chunk.len(), OpCode::PushNumber.width());
    }

    #[test]
    fn variable_operand_is_an_index() {
        let mut chunk = Chunk::new();
        chunk.write_variable(Variable::from_letter('c').unwrap());
        chunk.write_op(OpCode::Negate);
        assert_eq!(chunk.code(), &[2, 2, 8]);
    }

    #[test]
    fn zero_is_not_an_opcode() {
        let chunk = Chunk::from_code(vec![0]);
        assert_eq!(
            chunk.read_op_code(0),
            Err(CodeReadError::InvalidOpCode(0, 0))
        );
    }

    #[test]
    fn truncated_operands() {
        let chunk = Chunk::from_code(vec![OpCode::PushNumber.into(), 0, 0, 0]);
        assert_eq!(chunk.read_instruction(0), Err(CodeReadError::UnexpectedEnd));

        let chunk = Chunk::from_code(vec![OpCode::PushVariable.into()]);
        assert_eq!(chunk.read_instruction(0), Err(CodeReadError::UnexpectedEnd));

        let chunk = Chunk::from_code(vec![OpCode::PushVariable.into(), 26]);
        assert_eq!(
            chunk.read_instruction(0),
            Err(CodeReadError::InvalidVariable(1, 26))
        );
    }

    #[test]
    fn instructions_display_their_mnemonic() {
        assert_eq!(
            Instruction::PushNumber(2.5).to_string(),
            "PUSH_NUM 2.500000"
        );
        assert_eq!(
            Instruction::PushVariable(Variable::from_letter('x').unwrap()).to_string(),
            "PUSH_VAR x"
        );
        assert_eq!(Instruction::Negate.to_string(), "NEG");
        assert_eq!(Instruction::Pow.to_string(), "POW");
    }
}
