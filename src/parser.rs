use miette::Diagnostic;
use thiserror::Error;

use crate::{
    arena::{Arena, NodeId},
    ast::*,
    error::ErrorKind,
    scanner::{Token, TokenList, TokenType, TokenTypeName},
    source::{SourceOffset, SourceSpan},
};

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("Empty expression")]
    EmptyExpression {
        #[label("Expected an expression here")]
        at: SourceSpan,
    },
    #[error("Expected closing parenthesis")]
    UnmatchedParenthesis {
        #[label("Opening parenthesis here")]
        opener: SourceSpan,
        found_token_type: TokenTypeName,
        #[label("Found {found_token_type:?} instead")]
        found_at: SourceSpan,
    },
    #[error("Unexpected token in expression")]
    UnexpectedExpressionToken {
        actual: TokenTypeName,
        #[label("Found {actual:?} instead of a number, variable, unary or group")]
        found_at: SourceSpan,
        token: Token,
    },
    #[error("Expression nests deeper than {limit} levels")]
    TooDeep {
        limit: usize,
        #[label("Nesting limit reached here")]
        at: SourceSpan,
    },
    #[error("Unexpected token after expression")]
    #[diagnostic(help("missing an operator?"))]
    TrailingToken {
        actual: TokenTypeName,
        #[label("Found {actual:?} after a complete expression")]
        found_at: SourceSpan,
    },
}

impl ParserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyExpression { .. } => ErrorKind::EmptyExpression,
            _ => ErrorKind::InvalidExpression,
        }
    }
    pub fn offset(&self) -> SourceOffset {
        match self {
            Self::EmptyExpression { at } | Self::TooDeep { at, .. } => at.start(),
            Self::UnmatchedParenthesis { found_at, .. }
            | Self::UnexpectedExpressionToken { found_at, .. }
            | Self::TrailingToken { found_at, .. } => found_at.start(),
        }
    }
    /// The token that could not start a factor, if that is what failed.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::UnexpectedExpressionToken { token, .. } => Some(token),
            _ => None,
        }
    }
}

/// Deepest tree the parser builds, and the deepest it recurses. Evaluation and
/// compilation recurse once per tree level.
pub const MAX_DEPTH: usize = 256;

/// A parsed subexpression and the height of its tree.
struct Subtree {
    node: WithSpan<NodeId>,
    depth: usize,
}

/// Recursive descent parser building one expression into an [`Arena`].
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/' | '^') factor)*
/// factor := '(' expr ')' | number | symbol | ('+' | '-') factor
/// ```
pub struct Parser<'a> {
    arena: &'a mut Arena,
    tokens: &'a TokenList,
    cursor: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn parse(arena: &mut Arena, tokens: &TokenList) -> Result<NodeId, ParserError> {
        if tokens.is_empty() {
            return Err(ParserError::EmptyExpression {
                at: tokens.eof().span,
            });
        }

        let mut parser = Parser {
            arena,
            tokens,
            cursor: 0,
            nesting: 0,
        };
        let root = parser.parse_expr()?;

        let next = parser.current();
        if next.token_type != TokenType::Eof {
            return Err(ParserError::TrailingToken {
                actual: next.type_name(),
                found_at: next.span,
            });
        }
        Ok(*root.node)
    }

    fn parse_expr(&mut self) -> Result<Subtree, ParserError> {
        let mut last_expr = self.parse_term()?;

        while let Some(operator) = self.consume_match(|token| match token.token_type {
            TokenType::Plus => Some(WithSpan::new(BinaryOperator::Add, token.span)),
            TokenType::Minus => Some(WithSpan::new(BinaryOperator::Sub, token.span)),
            _ => None,
        }) {
            let right = self.parse_term()?;
            last_expr = self.alloc_binary(last_expr, operator, right)?;
        }

        Ok(last_expr)
    }

    fn parse_term(&mut self) -> Result<Subtree, ParserError> {
        let mut last_expr = self.parse_factor()?;

        while let Some(operator) = self.consume_match(|token| match token.token_type {
            TokenType::Multiply => Some(WithSpan::new(BinaryOperator::Mul, token.span)),
            TokenType::Divide => Some(WithSpan::new(BinaryOperator::Div, token.span)),
            TokenType::Power => Some(WithSpan::new(BinaryOperator::Pow, token.span)),
            _ => None,
        }) {
            let right = self.parse_factor()?;
            last_expr = self.alloc_binary(last_expr, operator, right)?;
        }

        Ok(last_expr)
    }

    fn parse_factor(&mut self) -> Result<Subtree, ParserError> {
        if let Some(operator) = self.consume_match(|token| match token.token_type {
            TokenType::Plus => Some(WithSpan::new(UnaryOperator::Plus, token.span)),
            TokenType::Minus => Some(WithSpan::new(UnaryOperator::Minus, token.span)),
            _ => None,
        }) {
            let right = self.nested(Self::parse_factor)?;
            let depth = self.check_depth(right.depth + 1, operator.source_span())?;
            let source_span = operator.source_span().to(right.node.source_span());
            let id = self.arena.alloc(Node::Unary(UnaryExpr {
                operator,
                right: *right.node,
                source_span,
            }));
            return Ok(Subtree {
                node: WithSpan::new(id, source_span),
                depth,
            });
        }

        if let Some(opener) = self.consume_token_to_span(TokenType::OpenParen) {
            let inner = self.nested(Self::parse_expr)?;
            let closer = self.consume_token_or_error(&TokenType::CloseParen, |token| {
                ParserError::UnmatchedParenthesis {
                    opener,
                    found_token_type: token.type_name(),
                    found_at: token.span,
                }
            })?;
            return Ok(Subtree {
                node: WithSpan::new(*inner.node, opener.to(closer)),
                depth: inner.depth,
            });
        }

        let token = self.current();
        let node = match token.token_type {
            TokenType::Number(value) => Node::Number(NumberExpr {
                value,
                source_span: token.span,
            }),
            TokenType::Symbol(name) => Node::Symbol(SymbolExpr {
                name,
                source_span: token.span,
            }),
            _ => {
                return Err(ParserError::UnexpectedExpressionToken {
                    actual: token.type_name(),
                    found_at: token.span,
                    token: token.clone(),
                })
            }
        };
        self.advance();
        Ok(Subtree {
            node: WithSpan::new(self.arena.alloc(node), token.span),
            depth: 1,
        })
    }

    fn alloc_binary(
        &mut self,
        left: Subtree,
        operator: WithSpan<BinaryOperator>,
        right: Subtree,
    ) -> Result<Subtree, ParserError> {
        let depth = self.check_depth(
            left.depth.max(right.depth) + 1,
            operator.source_span(),
        )?;
        let source_span = left.node.source_span().to(right.node.source_span());
        let id = self.arena.alloc(Node::Binary(BinaryExpr {
            left: *left.node,
            right: *right.node,
            operator,
            source_span,
        }));
        Ok(Subtree {
            node: WithSpan::new(id, source_span),
            depth,
        })
    }

    /// Runs `parse` one recursion level deeper, failing at the current token
    /// once [`MAX_DEPTH`] levels are open.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParserError>,
    ) -> Result<T, ParserError> {
        if self.nesting >= MAX_DEPTH {
            return Err(ParserError::TooDeep {
                limit: MAX_DEPTH,
                at: self.current().span,
            });
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn check_depth(&self, depth: usize, at: SourceSpan) -> Result<usize, ParserError> {
        if depth > MAX_DEPTH {
            Err(ParserError::TooDeep {
                limit: MAX_DEPTH,
                at,
            })
        } else {
            Ok(depth)
        }
    }

    /// The lookahead token. Past the last token this is the end-of-input token.
    fn current(&self) -> &'a Token {
        let tokens = self.tokens;
        tokens.get(self.cursor).unwrap_or_else(|| tokens.eof())
    }
    fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }
    fn consume_match<T: Sized, F: Fn(&Token) -> Option<T>>(&mut self, check: F) -> Option<T> {
        let value = check(self.current())?;
        self.advance();
        Some(value)
    }
    fn consume_token_to_span(&mut self, token_type: TokenType) -> Option<SourceSpan> {
        self.consume_match(|token| (token.token_type == token_type).then(|| token.span))
    }
    fn consume_token_or_error<F: Fn(&Token) -> ParserError>(
        &mut self,
        token_type: &TokenType,
        make_err: F,
    ) -> Result<SourceSpan, ParserError> {
        let token = self.current();
        if token.token_type == *token_type {
            self.advance();
            Ok(token.span)
        } else {
            Err(make_err(token))
        }
    }
}
