use std::{fmt::Display, ops::Deref};

use crate::{
    arena::{Arena, NodeId},
    source::SourceSpan,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithSpan<T> {
    inner: T,
    source_span: SourceSpan,
}

impl<T> WithSpan<T> {
    pub fn new(inner: T, source_span: SourceSpan) -> Self {
        Self { inner, source_span }
    }
    pub fn source_span(&self) -> SourceSpan {
        self.source_span
    }
    pub fn inner(&self) -> &T {
        &self.inner
    }
}
impl<T> Deref for WithSpan<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub trait AstNode {
    fn source_span(&self) -> SourceSpan;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}
impl BinaryOperator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
        }
    }
}
impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}
impl UnaryOperator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
        }
    }
}
impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberExpr {
    pub value: f64,
    pub source_span: SourceSpan,
}
impl AstNode for NumberExpr {
    fn source_span(&self) -> SourceSpan {
        self.source_span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolExpr {
    pub name: char,
    pub source_span: SourceSpan,
}
impl AstNode for SymbolExpr {
    fn source_span(&self) -> SourceSpan {
        self.source_span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: NodeId,
    pub right: NodeId,
    pub operator: WithSpan<BinaryOperator>,
    /// Covers both operands.
    pub source_span: SourceSpan,
}
impl AstNode for BinaryExpr {
    fn source_span(&self) -> SourceSpan {
        self.source_span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: WithSpan<UnaryOperator>,
    pub right: NodeId,
    pub source_span: SourceSpan,
}
impl AstNode for UnaryExpr {
    fn source_span(&self) -> SourceSpan {
        self.source_span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(NumberExpr),
    Symbol(SymbolExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
}
impl AstNode for Node {
    fn source_span(&self) -> SourceSpan {
        match self {
            Self::Number(expr) => expr.source_span(),
            Self::Symbol(expr) => expr.source_span(),
            Self::Binary(expr) => expr.source_span(),
            Self::Unary(expr) => expr.source_span(),
        }
    }
}

/// Prefix rendering of a tree, e.g. `add(1.000000,mul(x,2.000000))`.
pub struct TreeDisplay<'a> {
    arena: &'a Arena,
    root: NodeId,
}

impl<'a> TreeDisplay<'a> {
    pub fn new(arena: &'a Arena, root: NodeId) -> Self {
        Self { arena, root }
    }

    fn fmt_node(&self, id: NodeId, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.arena.get(id) {
            None => f.write_str("INVALID"),
            Some(Node::Number(expr)) => write!(f, "{:.6}", expr.value),
            Some(Node::Symbol(expr)) => write!(f, "{}", expr.name),
            Some(Node::Binary(expr)) => {
                write!(f, "{}(", expr.operator.name())?;
                self.fmt_node(expr.left, f)?;
                f.write_str(",")?;
                self.fmt_node(expr.right, f)?;
                f.write_str(")")
            }
            Some(Node::Unary(expr)) => {
                write!(f, "{}(", expr.operator.name())?;
                self.fmt_node(expr.right, f)?;
                f.write_str(")")
            }
        }
    }
}

impl Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_node(self.root, f)
    }
}
