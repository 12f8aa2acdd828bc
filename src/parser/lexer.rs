//! Tokenizer for the block syntax of build scripts.

use std::iter::Peekable;
use std::str::CharIndices;

use super::errors::{Location, ParseError};

/// Kind of a lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Dot,
    Eq,
    Comma,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Eof,
}

impl TokenKind {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semi => "';'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Location,
    /// Length in bytes
    pub len: usize,
}

/// Split source text into tokens. The last token is always `Eof`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            chars: src.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len())
    }

    fn loc(&mut self) -> Location {
        Location {
            line: self.line,
            column: self.column,
            offset: self.offset(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn rest(&mut self) -> &'a str {
        let offset = self.offset();
        &self.src[offset..]
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.rest().starts_with("//") => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.rest().starts_with("/*") => {
                    let start = self.loc();
                    self.bump();
                    self.bump();
                    loop {
                        if self.rest().starts_with("*/") {
                            self.bump();
                            self.bump();
                            break;
                        }
                        if self.bump().is_none() {
                            return Err(ParseError::syntax("unterminated block comment", start, 2));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;

        let start = self.loc();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                loc: start,
                len: 0,
            });
        };

        let kind = match c {
            '.' | '=' | ',' | ';' | '(' | ')' | '{' | '}' => {
                self.bump();
                match c {
                    '.' => TokenKind::Dot,
                    '=' => TokenKind::Eq,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semi,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    _ => TokenKind::RBrace,
                }
            }
            '"' => self.lex_string(start)?,
            c if c.is_ascii_digit() => self.lex_int(start)?,
            c if c.is_alphabetic() || c == '_' => self.lex_ident(),
            other => {
                return Err(ParseError::syntax(
                    format!("unexpected character '{}'", other),
                    start,
                    other.len_utf8(),
                ))
            }
        };

        let len = self.offset() - start.offset;
        Ok(Token {
            kind,
            loc: start,
            len,
        })
    }

    fn lex_string(&mut self, start: Location) -> Result<TokenKind, ParseError> {
        self.bump();
        let mut value = String::new();

        loop {
            let escape_loc = self.loc();
            match self.bump() {
                None | Some('\n') => {
                    return Err(ParseError::syntax("unterminated string literal", start, 1))
                }
                Some('"') => return Ok(TokenKind::Str(value)),
                Some('\\') => match self.bump() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('$') => value.push('$'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => {
                        return Err(ParseError::syntax(
                            format!("unknown escape sequence '\\{}'", other),
                            escape_loc,
                            1 + other.len_utf8(),
                        ))
                    }
                    None => {
                        return Err(ParseError::syntax("unterminated string literal", start, 1))
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn lex_int(&mut self, start: Location) -> Result<TokenKind, ParseError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.bump();
        }

        digits.parse().map(TokenKind::Int).map_err(|_| {
            ParseError::syntax(
                format!("integer literal `{}` is out of range", digits),
                start,
                digits.len(),
            )
        })
    }

    fn lex_ident(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            name.push(c);
            self.bump();
        }
        TokenKind::Ident(name)
    }
}
