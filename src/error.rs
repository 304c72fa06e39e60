use miette::Diagnostic;
use thiserror::Error;

use crate::{
    parser::ParserError,
    scanner::ScannerError,
    source::SourceOffset,
    tree_walk_interpreter::RuntimeError,
    vm_interpreter::{CompilerError, InterpreterError, VariableError},
};

/// Error taxonomy shared by the front end and the tree interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidToken,
    InvalidExpression,
    EmptyExpression,
    InvalidNode,
    ZeroDivision,
}

impl ErrorKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidToken => "Unexpected token",
            Self::InvalidExpression => "Invalid expression",
            Self::EmptyExpression => "Empty expression",
            Self::InvalidNode => "Invalid expression",
            Self::ZeroDivision => "Division by zero",
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scanner(#[from] ScannerError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compiler(#[from] CompilerError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Interpreter(#[from] InterpreterError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Variable(#[from] VariableError),
}

impl Error {
    /// `None` for failures of the compiled path, which only reports that it
    /// failed.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Scanner(error) => Some(error.kind()),
            Self::Parser(error) => Some(error.kind()),
            Self::Runtime(error) => Some(error.kind()),
            Self::Compiler(_) | Self::Interpreter(_) | Self::Variable(_) => None,
        }
    }
    pub fn offset(&self) -> Option<SourceOffset> {
        match self {
            Self::Scanner(error) => Some(error.offset()),
            Self::Parser(error) => Some(error.offset()),
            Self::Runtime(error) => error.offset(),
            Self::Compiler(_) | Self::Interpreter(_) | Self::Variable(_) => None,
        }
    }
}
