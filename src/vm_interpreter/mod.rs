pub mod chunk;
mod compiler;
pub mod disassembler;
pub mod variable;
mod vm;

pub use chunk::{Chunk, CodeReadError, Instruction, OpCode};
pub use compiler::{Compiler, CompilerError};
pub use disassembler::Disassembly;
pub use variable::{Variable, VariableBank, VariableError};
pub use vm::{InterpreterError, Vm, VmState};
