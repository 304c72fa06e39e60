use miette::Diagnostic;
use thiserror::Error;
use tracing::trace;

use super::{
    chunk::{Chunk, OpCode},
    variable::Variable,
};
use crate::{
    arena::{Arena, NodeId},
    ast::*,
    source::SourceSpan,
};

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Could not compile expression")]
    InvalidNode,
    #[error("Could not compile expression")]
    InvalidSymbol {
        name: char,
        #[label("{name:?} is not a variable")]
        at: SourceSpan,
    },
}

/// Emits a tree in post order: operands first, then their operator.
pub struct Compiler<'a> {
    arena: &'a Arena,
    chunk: Chunk,
}

impl<'a> Compiler<'a> {
    pub fn compile(arena: &'a Arena, root: NodeId) -> Result<Chunk, CompilerError> {
        let mut compiler = Self {
            arena,
            chunk: Chunk::new(),
        };
        compiler.compile_node(root)?;
        trace!(bytes = compiler.chunk.len(), "compiled expression");
        Ok(compiler.chunk)
    }

    fn compile_node(&mut self, id: NodeId) -> Result<(), CompilerError> {
        match self.arena.get(id) {
            None => Err(CompilerError::InvalidNode),
            Some(Node::Number(expr)) => {
                self.chunk.write_number(expr.value);
                Ok(())
            }
            Some(Node::Symbol(expr)) => self.compile_symbol_expr(expr),
            Some(Node::Binary(expr)) => self.compile_binary_expr(expr),
            Some(Node::Unary(expr)) => self.compile_unary_expr(expr),
        }
    }
    fn compile_symbol_expr(&mut self, expr: &SymbolExpr) -> Result<(), CompilerError> {
        let variable =
            Variable::from_letter(expr.name).map_err(|_| CompilerError::InvalidSymbol {
                name: expr.name,
                at: expr.source_span,
            })?;
        self.chunk.write_variable(variable);
        Ok(())
    }
    fn compile_unary_expr(&mut self, expr: &UnaryExpr) -> Result<(), CompilerError> {
        self.compile_node(expr.right)?;
        match expr.operator.inner() {
            UnaryOperator::Plus => {}
            UnaryOperator::Minus => self.chunk.write_op(OpCode::Negate),
        }
        Ok(())
    }
    fn compile_binary_expr(&mut self, expr: &BinaryExpr) -> Result<(), CompilerError> {
        self.compile_node(expr.left)?;
        self.compile_node(expr.right)?;
        let op_code = match expr.operator.inner() {
            BinaryOperator::Add => OpCode::Add,
            BinaryOperator::Sub => OpCode::Sub,
            BinaryOperator::Mul => OpCode::Mul,
            BinaryOperator::Div => OpCode::Div,
            BinaryOperator::Pow => OpCode::Pow,
        };
        self.chunk.write_op(op_code);
        Ok(())
    }
}
