use std::fmt::Display;

use super::chunk::{Chunk, CodeReadError, Instruction};
use colored::Colorize;

/// Decoded instructions of a chunk, each with its byte offset. Displayed one
/// per line, numbered by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Disassembly(Vec<(usize, Instruction)>);

impl Disassembly {
    pub fn instructions(&self) -> &[(usize, Instruction)] {
        &self.0
    }
}

impl IntoIterator for Disassembly {
    type Item = (usize, Instruction);
    type IntoIter = std::vec::IntoIter<(usize, Instruction)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for Disassembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, (_, instruction)) in self.0.iter().enumerate() {
            writeln!(f, "{}: {}", index, instruction)?;
        }
        Ok(())
    }
}

impl Chunk {
    pub fn disassembly(&self) -> Result<Disassembly, CodeReadError> {
        let mut instructions = Vec::new();
        let mut offset = 0;
        while offset < self.len() {
            let (next_offset, instruction) = self.read_instruction(offset)?;
            instructions.push((offset, instruction));
            offset = next_offset;
        }
        Ok(Disassembly(instructions))
    }
    pub fn disassemble(&self, name: &str) {
        println!("== {} ==", name);
        let mut offset = 0;
        while offset < self.len() {
            match self.disassemble_instruction_at(offset) {
                Ok(next_offset) => offset = next_offset,
                Err(e) => {
                    println!("{}", format!("Error reading code: {}", e).red());
                    break;
                }
            }
        }
    }
    pub fn disassemble_instruction_at(
        &self,
        initial_offset: usize,
    ) -> Result<usize, CodeReadError> {
        let (offset, instruction) = self.read_instruction(initial_offset)?;
        let mnemonic = instruction.op_code().mnemonic().purple();
        match instruction {
            Instruction::PushNumber(value) => println!(
                "{} | {} {}",
                format!("{:04}", initial_offset).dimmed(),
                mnemonic,
                format!("{:.6}", value).blue(),
            ),
            Instruction::PushVariable(variable) => println!(
                "{} | {} {}",
                format!("{:04}", initial_offset).dimmed(),
                mnemonic,
                variable.to_string().green(),
            ),
            _ => println!("{} | {}", format!("{:04}", initial_offset).dimmed(), mnemonic),
        }
        Ok(offset)
    }
}
