use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

pub const VARIABLE_COUNT: usize = 26;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum VariableError {
    #[error("{0:?} is not a variable")]
    #[diagnostic(help("variables are single letters from a to z"))]
    InvalidName(char),
    #[error("No variable at index {0}")]
    InvalidIndex(u8),
}

/// One of the variable slots `a` through `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(u8);

impl Variable {
    pub fn from_letter(letter: char) -> Result<Self, VariableError> {
        match letter {
            'a'..='z' => Ok(Self(letter as u8 - b'a')),
            other => Err(VariableError::InvalidName(other)),
        }
    }
    pub fn from_index(index: u8) -> Result<Self, VariableError> {
        if (index as usize) < VARIABLE_COUNT {
            Ok(Self(index))
        } else {
            Err(VariableError::InvalidIndex(index))
        }
    }
    pub fn index(&self) -> u8 {
        self.0
    }
    pub fn letter(&self) -> char {
        (b'a' + self.0) as char
    }
    pub fn all() -> impl Iterator<Item = Variable> {
        (0..VARIABLE_COUNT as u8).map(Variable)
    }
}

impl TryFrom<char> for Variable {
    type Error = VariableError;

    fn try_from(letter: char) -> Result<Self, Self::Error> {
        Self::from_letter(letter)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Values of every variable. Starts out all zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableBank([f64; VARIABLE_COUNT]);

impl VariableBank {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, variable: Variable) -> f64 {
        self.0[variable.index() as usize]
    }
    pub fn set(&mut self, variable: Variable, value: f64) {
        self.0[variable.index() as usize] = value;
    }
    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        Variable::all().map(move |variable| (variable, self.get(variable)))
    }
}
