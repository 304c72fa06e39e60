mod error;

use crate::{
    arena::{Arena, NodeId},
    ast::*,
};
pub use error::RuntimeError;

/// Evaluates a parsed tree directly, without compiling it.
pub struct Interpreter<'a> {
    arena: &'a Arena,
}

impl<'a> Interpreter<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Self { arena }
    }

    pub fn interpret(&self, root: NodeId) -> Result<f64, RuntimeError> {
        self.eval_node(root)
    }

    fn eval_node(&self, id: NodeId) -> Result<f64, RuntimeError> {
        match self.arena.get(id) {
            None => Err(RuntimeError::InvalidNode),
            Some(Node::Number(NumberExpr { value, .. })) => Ok(*value),
            Some(Node::Symbol(SymbolExpr { name, source_span })) => {
                Err(RuntimeError::UnsupportedSymbol {
                    name: *name,
                    at: *source_span,
                })
            }
            Some(Node::Binary(expr)) => self.eval_binary(expr),
            Some(Node::Unary(UnaryExpr {
                operator, right, ..
            })) => {
                let right_val = self.eval_node(*right)?;
                Ok(match operator.inner() {
                    UnaryOperator::Plus => right_val,
                    UnaryOperator::Minus => -right_val,
                })
            }
        }
    }

    fn eval_binary(&self, expr: &BinaryExpr) -> Result<f64, RuntimeError> {
        let BinaryExpr {
            left,
            right,
            operator,
            source_span,
        } = expr;

        Ok(match operator.inner() {
            BinaryOperator::Add => self.eval_node(*left)? + self.eval_node(*right)?,
            BinaryOperator::Sub => self.eval_node(*left)? - self.eval_node(*right)?,
            BinaryOperator::Mul => self.eval_node(*left)? * self.eval_node(*right)?,
            BinaryOperator::Pow => self.eval_node(*left)?.powf(self.eval_node(*right)?),
            // the divisor is checked before the dividend is touched
            BinaryOperator::Div => {
                let divisor = self.eval_node(*right)?;
                if divisor == 0.0 {
                    return Err(RuntimeError::ZeroDivision {
                        divisor_at: self
                            .arena
                            .get(*right)
                            .map_or(*source_span, |node| node.source_span()),
                        operator_at: operator.source_span(),
                    });
                }
                self.eval_node(*left)? / divisor
            }
        })
    }
}
