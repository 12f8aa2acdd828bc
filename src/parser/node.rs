//! The generic node tree.
//!
//! Build scripts are a tree of key/value and key/block pairs. The tree is
//! built once from the token stream and then mapped onto the manifest schema;
//! nothing downstream looks at text again.

use std::fmt;

use super::errors::{Location, ParseError};
use super::lexer::{tokenize, Token, TokenKind};

/// A value on the right-hand side of an assignment or inside call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    /// A dotted reference (`flutter.compileSdkVersion`)
    Path(Vec<String>),
    /// A call expression (`signingConfigs.getByName("debug")`)
    Call { callee: Vec<String>, args: Vec<Arg> },
}

impl Value {
    /// Get the string contents, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean, if this is a boolean literal.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Path(path) => write!(f, "{}", path.join(".")),
            Value::Call { callee, args } => {
                write!(f, "{}(", callee.join("."))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(name) = &arg.name {
                        write!(f, "{} = ", name)?;
                    }
                    write!(f, "{}", arg.value)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A call argument, optionally named (`version = "1.0"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Value,
}

/// A call statement: `id("x") version "1.0" apply false { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub args: Vec<Arg>,
    /// Infix modifiers on the same line (`version "1.0"`, `apply false`)
    pub infix: Vec<(String, Value)>,
    /// Trailing block
    pub body: Option<Block>,
}

impl Call {
    /// Get the first positional argument.
    pub fn positional(&self) -> Option<&Value> {
        self.args.iter().find(|a| a.name.is_none()).map(|a| &a.value)
    }

    /// Get a named argument.
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| &a.value)
    }

    /// Get an infix modifier.
    pub fn modifier(&self, name: &str) -> Option<&Value> {
        self.infix.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Value),
    Block(Block),
    Call(Call),
}

/// A keyed entry of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry key, dotted if the script used a dotted path
    pub key: String,
    pub node: Node,
    pub location: Location,
}

/// An ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub entries: Vec<Entry>,
    /// Position of the block's key (or the start of the source for the root)
    pub location: Location,
}

impl Block {
    /// Get the last entry with the given key (later assignments win).
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().rev().find(|e| e.key == key)
    }
}

/// Deepest block or argument nesting accepted.
pub const MAX_NESTING: usize = 64;

/// Parse source text into the root block.
pub fn parse_tree(src: &str) -> Result<Block, ParseError> {
    let tokens = tokenize(src)?;
    let mut parser = TreeParser {
        tokens,
        pos: 0,
        depth: 0,
    };
    parser.parse_block_body(Location::start(), false)
}

struct TreeParser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open blocks and argument lists
    depth: usize,
}

impl TreeParser {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof and `pos` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn previous_line(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].loc.line
    }

    fn error_at(&self, token: &Token, expected: &str) -> ParseError {
        ParseError::syntax(
            format!("expected {}, found {}", expected, token.kind.describe()),
            token.loc,
            token.len,
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.bump())
        } else {
            Err(self.error_at(self.peek(), expected))
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let token = self.peek();
            return Err(ParseError::syntax(
                format!("nesting exceeds {} levels", MAX_NESTING),
                token.loc,
                token.len,
            ));
        }
        Ok(())
    }

    fn parse_block_body(&mut self, location: Location, nested: bool) -> Result<Block, ParseError> {
        let mut entries = Vec::new();
        if nested {
            self.descend()?;
        }

        loop {
            match &self.peek().kind {
                TokenKind::Semi => {
                    self.bump();
                }
                TokenKind::Eof if nested => return Err(self.error_at(self.peek(), "'}'")),
                TokenKind::Eof => break,
                TokenKind::RBrace if nested => {
                    self.bump();
                    self.depth -= 1;
                    break;
                }
                _ => entries.push(self.parse_entry()?),
            }
        }

        Ok(Block { entries, location })
    }

    fn parse_entry(&mut self) -> Result<Entry, ParseError> {
        let location = self.peek().loc;
        let path = self.parse_path()?;
        let key = path.join(".");

        let node = match self.peek().kind {
            TokenKind::Eq => {
                self.bump();
                Node::Leaf(self.parse_value()?)
            }
            TokenKind::LBrace => {
                self.bump();
                Node::Block(self.parse_block_body(location, true)?)
            }
            TokenKind::LParen => {
                self.bump();
                let args = self.parse_args()?;

                let mut infix = Vec::new();
                while let TokenKind::Ident(name) = &self.peek().kind {
                    if self.peek().loc.line != self.previous_line() {
                        break;
                    }
                    let name = name.clone();
                    self.bump();
                    infix.push((name, self.parse_value()?));
                }

                let body = if self.peek().kind == TokenKind::LBrace {
                    let body_loc = self.bump().loc;
                    Some(self.parse_block_body(body_loc, true)?)
                } else {
                    None
                };

                Node::Call(Call { args, infix, body })
            }
            _ => return Err(self.error_at(self.peek(), "'=', '(' or '{'")),
        };

        Ok(Entry {
            key,
            node,
            location,
        })
    }

    fn parse_path(&mut self) -> Result<Vec<String>, ParseError> {
        let mut path = vec![self.parse_ident()?];
        while self.peek().kind == TokenKind::Dot {
            self.bump();
            path.push(self.parse_ident()?);
        }
        Ok(path)
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.error_at(self.peek(), "identifier")),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.bump();
                Ok(Value::Str(s))
            }
            TokenKind::Int(n) => {
                self.bump();
                Ok(Value::Int(n))
            }
            TokenKind::Ident(name) if name == "true" || name == "false" => {
                self.bump();
                Ok(Value::Bool(name == "true"))
            }
            TokenKind::Ident(_) => {
                let path = self.parse_path()?;
                if self.peek().kind == TokenKind::LParen {
                    self.bump();
                    let args = self.parse_args()?;
                    Ok(Value::Call { callee: path, args })
                } else {
                    Ok(Value::Path(path))
                }
            }
            _ => Err(self.error_at(self.peek(), "a value")),
        }
    }

    /// Parse call arguments; the opening parenthesis is already consumed.
    fn parse_args(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        self.descend()?;

        loop {
            if self.peek().kind == TokenKind::RParen {
                self.bump();
                self.depth -= 1;
                return Ok(args);
            }

            let name = match (&self.peek().kind, &self.peek_nth(1).kind) {
                (TokenKind::Ident(name), TokenKind::Eq) => {
                    let name = name.clone();
                    self.bump();
                    self.bump();
                    Some(name)
                }
                _ => None,
            };

            let value = self.parse_value()?;
            args.push(Arg { name, value });

            match self.peek().kind {
                TokenKind::Comma => {
                    self.bump();
                }
                TokenKind::RParen => {}
                _ => return Err(self.error_at(self.peek(), "',' or ')'")),
            }
        }
    }
}
