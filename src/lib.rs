pub mod arena;
pub mod ast;
mod environment;
mod error;
mod parser;
mod scanner;
mod source;
mod tree_walk_interpreter;
pub mod vm_interpreter;

pub use arena::{Arena, NodeId};
pub use ast::TreeDisplay;
pub use environment::Environment;
pub use error::{Error, ErrorKind};
pub use parser::{Parser, ParserError, MAX_DEPTH};
pub use scanner::{tokenize, Scanner, ScannerError, Token, TokenList, TokenType, TokenTypeName};
pub use source::{SourceOffset, SourceSpan};
pub use tree_walk_interpreter::{Interpreter, RuntimeError};

/// Evaluates `source` once through the tree interpreter. Variables are not
/// available on this path.
pub fn interpret(source: &str) -> Result<f64, Error> {
    let tokens = tokenize(source)?;
    let mut arena = Arena::new();
    let root = Parser::parse(&mut arena, &tokens)?;
    Ok(Interpreter::new(&arena).interpret(root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm_interpreter::Compiler;
    use pretty_assertions::assert_eq;

    const CONSTANT_EXPRESSIONS: &[&str] = &[
        "(2+2)*3",
        "1 - 2 - 3",
        "2^0.5",
        "-(3 * 4) / +2",
        "1.5e3 / 4 ^ 2",
        "((((7))))",
        "10 / 4 * 3 - -1",
    ];

    #[test]
    fn both_paths_agree_on_constants() {
        for source in CONSTANT_EXPRESSIONS {
            let mut env = Environment::new(source).unwrap();
            assert_eq!(
                interpret(source).unwrap(),
                env.evaluate().unwrap(),
                "{}",
                source
            );
        }
    }

    #[test]
    fn zero_division_differs_between_paths() {
        assert_eq!(
            interpret("1/0").unwrap_err().kind(),
            Some(ErrorKind::ZeroDivision)
        );
        assert_eq!(
            Environment::new("1/0").unwrap().evaluate().unwrap(),
            f64::INFINITY
        );
    }

    #[test]
    fn arena_reuse_never_resurrects_old_nodes() {
        let mut arena = Arena::new();
        let tokens = tokenize("1+2").unwrap();
        let first = Parser::parse(&mut arena, &tokens).unwrap();
        arena.reset();
        let tokens = tokenize("7").unwrap();
        let second = Parser::parse(&mut arena, &tokens).unwrap();

        assert_eq!(TreeDisplay::new(&arena, first).to_string(), "INVALID");
        assert_eq!(TreeDisplay::new(&arena, second).to_string(), "7.000000");
        assert!(Compiler::compile(&arena, first).is_err());
        assert_eq!(Interpreter::new(&arena).interpret(second), Ok(7.0));
    }

    #[test]
    fn very_deep_input_is_rejected_on_both_paths() {
        let source = format!("{}1", "-".repeat(200_000));
        let error = interpret(&source).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::InvalidExpression));
        let error = Environment::new(&source).unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::InvalidExpression));

        let source = format!("{}2", "2*".repeat(200_000));
        assert!(interpret(&source).is_err());
        assert!(Environment::new(&source).is_err());
    }

    #[test]
    fn deepest_accepted_tree_evaluates_on_both_paths() {
        let source = format!("{}3", "-".repeat(MAX_DEPTH - 1));
        assert_eq!(interpret(&source).unwrap(), -3.0);
        assert_eq!(Environment::new(&source).unwrap().evaluate().unwrap(), -3.0);
    }

    #[test]
    fn crate_errors_render_their_kind() {
        let error = interpret("2 ** 3").unwrap_err();
        assert_eq!(error.kind(), Some(ErrorKind::InvalidExpression));
        assert_eq!(
            error.kind().map(|kind| kind.description()),
            Some("Invalid expression")
        );
        assert_eq!(ErrorKind::ZeroDivision.description(), "Division by zero");
    }
}
