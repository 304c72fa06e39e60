use crate::{
    error::ErrorKind,
    source::{SourceOffset, SourceSpan},
};
use derive_new::new;
use miette::Diagnostic;
use std::fmt::Display;
use strum::EnumDiscriminants;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ScannerError {
    #[error("Unexpected character: {character:?}")]
    UnexpectedCharacter {
        character: char,
        #[label("Character found here")]
        at: SourceOffset,
    },
    #[error("Variables are a single letter, found {word:?}")]
    #[diagnostic(help("variables are named a through z"))]
    MultiLetterSymbol {
        word: String,
        #[label("Word found here")]
        at: SourceSpan,
    },
    #[error("Malformed number {literal:?}")]
    MalformedNumber {
        literal: String,
        #[label("Number found here")]
        at: SourceSpan,
    },
}

impl ScannerError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidToken
    }
    pub fn offset(&self) -> SourceOffset {
        match self {
            Self::UnexpectedCharacter { at, .. } => *at,
            Self::MultiLetterSymbol { at, .. } | Self::MalformedNumber { at, .. } => at.start(),
        }
    }
    /// The token the scanner gave up on.
    pub fn token(&self) -> Token {
        let span = match self {
            Self::UnexpectedCharacter { at, character } => {
                SourceSpan::new(*at, character.len_utf8())
            }
            Self::MultiLetterSymbol { at, .. } | Self::MalformedNumber { at, .. } => *at,
        };
        Token::new(span, TokenType::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, new)]
pub struct Token {
    pub span: SourceSpan,
    pub token_type: TokenType,
}

impl Token {
    pub fn offset(&self) -> SourceOffset {
        self.span.start()
    }
    pub fn type_name(&self) -> TokenTypeName {
        (&self.token_type).into()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name().debug_name())?;
        match self.token_type {
            TokenType::Number(value) => write!(f, " {:.6}", value),
            TokenType::Symbol(symbol) => write!(f, " {}", symbol),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(TokenTypeName))]
pub enum TokenType {
    Number(f64),
    Symbol(char),
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    OpenParen,
    CloseParen,
    Eof,
    Invalid,
}

impl TokenTypeName {
    pub fn debug_name(&self) -> &'static str {
        match self {
            Self::Number => "TOKEN_NUMBER",
            Self::Symbol => "TOKEN_SYMBOL",
            Self::Plus => "TOKEN_PLUS",
            Self::Minus => "TOKEN_MINUS",
            Self::Multiply => "TOKEN_MULTIPLY",
            Self::Divide => "TOKEN_DIVIDE",
            Self::Power => "TOKEN_POWER",
            Self::OpenParen => "TOKEN_LPAREN",
            Self::CloseParen => "TOKEN_RPAREN",
            Self::Eof => "TOKEN_EOF",
            Self::Invalid => "TOKEN_INVALID",
        }
    }
}

/// Tokens of one expression, in source order. The end-of-input token is kept
/// apart so an empty expression has an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenList {
    tokens: Vec<Token>,
    eof: Token,
}

impl TokenList {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    pub fn eof(&self) -> &Token {
        &self.eof
    }
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }
}

impl Display for TokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            writeln!(f, "{}: {}", i, token)?;
        }
        Ok(())
    }
}

/// Scans the whole expression, stopping at the first invalid token.
pub fn tokenize(source: &str) -> Result<TokenList, ScannerError> {
    let mut tokens = Vec::new();
    for token in Scanner::new(source) {
        let token = token?;
        if token.token_type == TokenType::Eof {
            return Ok(TokenList { tokens, eof: token });
        }
        tokens.push(token);
    }
    Ok(TokenList {
        tokens,
        eof: Token::new(SourceSpan::empty(source.len().into()), TokenType::Eof),
    })
}

pub struct Scanner<'a> {
    source: &'a str,
    at_end: bool,
    current_offset: usize,
    current_token_start_offset: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            at_end: false,
            current_offset: 0,
            current_token_start_offset: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source[self.current_offset..].chars().next()?;
        self.current_offset += ch.len_utf8();
        Some(ch)
    }

    fn advance_while<F: Fn(char) -> bool>(&mut self, check: F) {
        loop {
            match self.peek(1) {
                Some(ch) if check(ch) => {
                    self.advance();
                }
                _ => return,
            }
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        assert!(offset > 0);
        self.source[self.current_offset..].chars().nth(offset - 1)
    }

    fn begin_token(&mut self) {
        self.current_token_start_offset = self.current_offset;
    }

    fn token_span(&self) -> SourceSpan {
        (self.current_token_start_offset..self.current_offset).into()
    }

    fn yield_token(&self, token_type: TokenType) -> Token {
        Token::new(self.token_span(), token_type)
    }

    fn scan_number(&mut self) -> Result<Token, ScannerError> {
        self.advance_while(|ch| ch.is_ascii_digit());
        if self.peek(1) == Some('.') {
            self.advance();
            self.advance_while(|ch| ch.is_ascii_digit());
        }
        if matches!(self.peek(1), Some('e' | 'E')) {
            let has_exponent = match self.peek(2) {
                Some('+' | '-') => self.peek(3).map_or(false, |ch| ch.is_ascii_digit()),
                Some(ch) => ch.is_ascii_digit(),
                None => false,
            };
            if has_exponent {
                self.advance();
                if matches!(self.peek(1), Some('+' | '-')) {
                    self.advance();
                }
                self.advance_while(|ch| ch.is_ascii_digit());
            }
        }

        let literal = &self.source[self.current_token_start_offset..self.current_offset];
        match literal.parse::<f64>() {
            Ok(number) => Ok(self.yield_token(TokenType::Number(number))),
            Err(_) => Err(ScannerError::MalformedNumber {
                literal: literal.to_string(),
                at: self.token_span(),
            }),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, ScannerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_end {
            return None;
        }

        self.advance_while(|ch| matches!(ch, ' ' | '\t' | '\n'));

        self.begin_token();
        let next = self.advance();
        let result = match next {
            None => Ok(self.yield_token(TokenType::Eof)),
            Some('+') => Ok(self.yield_token(TokenType::Plus)),
            Some('-') => Ok(self.yield_token(TokenType::Minus)),
            Some('*') => Ok(self.yield_token(TokenType::Multiply)),
            Some('/') => Ok(self.yield_token(TokenType::Divide)),
            Some('^') => Ok(self.yield_token(TokenType::Power)),
            Some('(') => Ok(self.yield_token(TokenType::OpenParen)),
            Some(')') => Ok(self.yield_token(TokenType::CloseParen)),
            Some(ch) if ch.is_ascii_digit() => self.scan_number(),
            Some(ch @ 'a'..='z') => {
                if self.peek(1).map_or(false, |next| next.is_ascii_lowercase()) {
                    self.advance_while(|ch| ch.is_ascii_lowercase());
                    Err(ScannerError::MultiLetterSymbol {
                        word: self.source[self.current_token_start_offset..self.current_offset]
                            .to_string(),
                        at: self.token_span(),
                    })
                } else {
                    Ok(self.yield_token(TokenType::Symbol(ch)))
                }
            }
            Some(ch) => Err(ScannerError::UnexpectedCharacter {
                character: ch,
                at: self.current_token_start_offset.into(),
            }),
        };

        // the first error ends the scan, as does the end of input
        if matches!(
            result,
            Err(_)
                | Ok(Token {
                    token_type: TokenType::Eof,
                    ..
                })
        ) {
            self.at_end = true;
        }
        Some(result)
    }
}
