use crate::{
    error::ErrorKind,
    source::{SourceOffset, SourceSpan},
};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Division by zero")]
    ZeroDivision {
        #[label("this evaluated to zero")]
        divisor_at: SourceSpan,
        #[label("the '/' operator can't divide by zero")]
        operator_at: SourceSpan,
    },
    #[error("Invalid expression")]
    #[diagnostic(help("the tree refers to a node that no longer exists"))]
    InvalidNode,
    #[error("Variable {name} can't be evaluated here")]
    #[diagnostic(help("variables are only available when the expression is compiled"))]
    UnsupportedSymbol {
        name: char,
        #[label("found here")]
        at: SourceSpan,
    },
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroDivision { .. } => ErrorKind::ZeroDivision,
            Self::InvalidNode | Self::UnsupportedSymbol { .. } => ErrorKind::InvalidNode,
        }
    }
    pub fn offset(&self) -> Option<SourceOffset> {
        match self {
            Self::ZeroDivision { divisor_at, .. } => Some(divisor_at.start()),
            Self::InvalidNode => None,
            Self::UnsupportedSymbol { at, .. } => Some(at.start()),
        }
    }
}
