//! JSON parsing straight into packed form.
//!
//! A byte lexer feeds a single-token-lookahead recursive-descent parser.
//! Instead of building a node graph, the parser appends node words as it
//! goes: a container is emitted with operand 0 and its position is kept on
//! the call stack; when the container closes, the operand is overwritten
//! with the span up to the current end of the array. Number lexemes are
//! interned verbatim (sign, digits, exponent spelling preserved); strings
//! are unescaped before interning.
//!
//! Duplicate object keys are accepted - uniqueness is imposed only by
//! [`SortedTree::deduplicate`](crate::SortedTree::deduplicate).

use crate::error::{Error, Result};
use crate::node::{Kind, Node};
use crate::tree::{JsonTree, ROOT_NODE};

/// Nesting depth guard for the recursive descent.
const MAX_DEPTH: u32 = 1024;

/// Parse a JSON text into a tree.
///
/// # Errors
///
/// Returns `Error::Parse` (with 1-based line and column) on malformed
/// input, including trailing non-whitespace after the root value.
pub fn from_json(input: &str) -> Result<JsonTree> {
    Parser::new(input, None).parse()
}

/// Parse a JSON text, prefixing error messages with a source name.
///
/// # Errors
///
/// As [`from_json`].
pub fn from_json_named(input: &str, filename: &str) -> Result<JsonTree> {
    Parser::new(input, Some(filename)).parse()
}

/// Parse JSON bytes, validating UTF-8 first.
///
/// # Errors
///
/// As [`from_json`], plus an `Error::Parse` pointing at the first invalid
/// UTF-8 byte.
pub fn from_json_bytes(input: &[u8]) -> Result<JsonTree> {
    match std::str::from_utf8(input) {
        Ok(text) => from_json(text),
        Err(e) => {
            let prefix = &input[..e.valid_up_to()];
            let line = prefix.iter().filter(|&&b| b == b'\n').count() as u32 + 1;
            let column = prefix
                .iter()
                .rev()
                .take_while(|&&b| b != b'\n')
                .count() as u32
                + 1;
            Err(Error::Parse {
                message: "invalid UTF-8".to_string(),
                line,
                column,
            })
        }
    }
}

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Null,
    True,
    False,
    /// String value, already unescaped.
    String(String),
    /// Number with its lexeme kept verbatim.
    Number { lexeme: &'a str, float: bool },
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    filename: Option<&'a str>,
    pos: usize,
    line: u32,
    column: u32,
    /// Position of the current token's first byte.
    tok_line: u32,
    tok_column: u32,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, filename: Option<&'a str>) -> Self {
        Self {
            input,
            filename,
            pos: 0,
            line: 1,
            column: 1,
            tok_line: 1,
            tok_column: 1,
        }
    }

    fn error_at(&self, line: u32, column: u32, message: &str) -> Error {
        let message = match self.filename {
            Some(name) => format!("{name}: {message}"),
            None => message.to_string(),
        };
        Error::Parse {
            message,
            line,
            column,
        }
    }

    fn error_here(&self, message: &str) -> Error {
        self.error_at(self.line, self.column, message)
    }

    /// Peek at the current byte without consuming it.
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Consume and return the current byte, tracking line and column.
    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token<'a>> {
        self.skip_whitespace();
        self.tok_line = self.line;
        self.tok_column = self.column;

        match self.peek() {
            None => Ok(Token::Eof),
            Some(b'{') => {
                self.advance();
                Ok(Token::LeftBrace)
            }
            Some(b'}') => {
                self.advance();
                Ok(Token::RightBrace)
            }
            Some(b'[') => {
                self.advance();
                Ok(Token::LeftBracket)
            }
            Some(b']') => {
                self.advance();
                Ok(Token::RightBracket)
            }
            Some(b':') => {
                self.advance();
                Ok(Token::Colon)
            }
            Some(b',') => {
                self.advance();
                Ok(Token::Comma)
            }
            Some(b'"') => self.read_string(),
            Some(b'-' | b'0'..=b'9') => self.read_number(),
            Some(b't') => self.read_literal(b"true", Token::True),
            Some(b'f') => self.read_literal(b"false", Token::False),
            Some(b'n') => self.read_literal(b"null", Token::Null),
            Some(b) => Err(self.error_here(&format!("unexpected character {:?}", b as char))),
        }
    }

    /// Read a string token, resolving escape sequences.
    fn read_string(&mut self) -> Result<Token<'a>> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_here("unterminated string")),
                Some(b'"') => {
                    self.advance();
                    return Ok(Token::String(out));
                }
                Some(b'\\') => {
                    self.advance();
                    out.push(self.read_escape()?);
                }
                Some(b) if b < 0x20 => {
                    return Err(self.error_here("control character in string"));
                }
                Some(b) if b < 0x80 => {
                    self.advance();
                    out.push(b as char);
                }
                Some(_) => {
                    // Multi-byte UTF-8 sequence; the input is already
                    // validated, so take the whole character.
                    let ch = self.input[self.pos..]
                        .chars()
                        .next()
                        .expect("input is valid UTF-8");
                    for _ in 0..ch.len_utf8() {
                        self.advance();
                    }
                    out.push(ch);
                }
            }
        }
    }

    /// Read the escape sequence after a backslash.
    fn read_escape(&mut self) -> Result<char> {
        match self.advance() {
            None => Err(self.error_here("unterminated string")),
            Some(b'"') => Ok('"'),
            Some(b'\\') => Ok('\\'),
            Some(b'/') => Ok('/'),
            Some(b'b') => Ok('\x08'),
            Some(b'f') => Ok('\x0C'),
            Some(b'n') => Ok('\n'),
            Some(b'r') => Ok('\r'),
            Some(b't') => Ok('\t'),
            Some(b'u') => self.read_unicode_escape(),
            Some(b) => Err(self.error_here(&format!("invalid escape \\{}", b as char))),
        }
    }

    /// Read a `\uXXXX` escape, pairing surrogates.
    fn read_unicode_escape(&mut self) -> Result<char> {
        let code = self.read_hex4()?;

        if (0xD800..=0xDBFF).contains(&code) {
            // High surrogate: must be followed by an escaped low surrogate.
            if self.advance() != Some(b'\\') || self.advance() != Some(b'u') {
                return Err(self.error_here("unpaired surrogate escape"));
            }
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.error_here("unpaired surrogate escape"));
            }
            let combined = 0x10000 + ((u32::from(code) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
            return char::from_u32(combined).ok_or_else(|| self.error_here("invalid codepoint"));
        }
        if (0xDC00..=0xDFFF).contains(&code) {
            return Err(self.error_here("unpaired surrogate escape"));
        }
        char::from_u32(u32::from(code)).ok_or_else(|| self.error_here("invalid codepoint"))
    }

    /// Read 4 hex digits.
    fn read_hex4(&mut self) -> Result<u16> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let digit = match self.advance() {
                Some(b @ b'0'..=b'9') => b - b'0',
                Some(b @ b'a'..=b'f') => b - b'a' + 10,
                Some(b @ b'A'..=b'F') => b - b'A' + 10,
                _ => return Err(self.error_here("expected 4 hex digits after \\u")),
            };
            value = (value << 4) | u16::from(digit);
        }
        Ok(value)
    }

    /// Read a number token, keeping the lexeme verbatim.
    fn read_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.advance();
        }
        match self.peek() {
            Some(b'0') => {
                self.advance();
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.error_here("leading zero in number"));
                }
            }
            Some(b'1'..=b'9') => {
                while let Some(b'0'..=b'9') = self.peek() {
                    self.advance();
                }
            }
            _ => return Err(self.error_here("expected digits in number")),
        }

        let mut float = false;
        if self.peek() == Some(b'.') {
            float = true;
            self.advance();
            self.read_digits()?;
        }
        if let Some(b'e' | b'E') = self.peek() {
            float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            self.read_digits()?;
        }

        Ok(Token::Number {
            lexeme: &self.input[start..self.pos],
            float,
        })
    }

    /// Require at least one digit, then consume the run.
    fn read_digits(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'0'..=b'9') => {
                while let Some(b'0'..=b'9') = self.peek() {
                    self.advance();
                }
                Ok(())
            }
            _ => Err(self.error_here("expected digits in number")),
        }
    }

    /// Expect a full literal keyword at the current position.
    fn read_literal(&mut self, expected: &[u8], token: Token<'a>) -> Result<Token<'a>> {
        for &b in expected {
            if self.advance() != Some(b) {
                return Err(self.error_at(self.tok_line, self.tok_column, "invalid literal"));
            }
        }
        Ok(token)
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    depth: u32,
    tree: JsonTree,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, filename: Option<&'a str>) -> Self {
        Self {
            lexer: Lexer::new(input, filename),
            current: Token::Eof,
            depth: 0,
            tree: JsonTree::default(),
        }
    }

    /// Error positioned at the start of the current token.
    fn err(&self, message: &str) -> Error {
        self.lexer
            .error_at(self.lexer.tok_line, self.lexer.tok_column, message)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn parse(mut self) -> Result<JsonTree> {
        self.advance()?;
        self.parse_value()?;
        if self.current != Token::Eof {
            return Err(self.err("trailing characters after top-level value"));
        }
        debug_assert_eq!(self.tree.span(ROOT_NODE) as usize, self.tree.len());
        Ok(self.tree)
    }

    fn parse_value(&mut self) -> Result<()> {
        match &mut self.current {
            Token::Null => {
                self.tree.push(Node::new(Kind::Null, 0));
                self.advance()
            }
            Token::True => {
                self.tree.push(Node::new(Kind::Bool, 1));
                self.advance()
            }
            Token::False => {
                self.tree.push(Node::new(Kind::Bool, 0));
                self.advance()
            }
            Token::String(s) => {
                let text = std::mem::take(s);
                let id = self.tree.atoms.intern(&text);
                self.tree.push(Node::new(Kind::String, id.raw()));
                self.advance()
            }
            Token::Number { lexeme, float } => {
                let kind = if *float { Kind::Float } else { Kind::Int };
                let id = self.tree.atoms.intern(lexeme);
                self.tree.push(Node::new(kind, id.raw()));
                self.advance()
            }
            Token::LeftBrace => self.parse_object(),
            Token::LeftBracket => self.parse_array(),
            Token::Eof => Err(self.err("unexpected end of input")),
            _ => Err(self.err("expected a JSON value")),
        }
    }

    fn parse_object(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.err("structure nested too deeply"));
        }
        let obj = self.tree.push(Node::new(Kind::Object, 0));
        self.advance()?; // '{'

        if self.current == Token::RightBrace {
            self.advance()?;
        } else {
            loop {
                let key = match &mut self.current {
                    Token::String(s) => std::mem::take(s),
                    _ => return Err(self.err("expected object key")),
                };
                self.advance()?;

                let pair = self.tree.push(Node::new(Kind::KeyValue, 0));
                let id = self.tree.atoms.intern(&key);
                self.tree.push(Node::new(Kind::String, id.raw()));

                if self.current != Token::Colon {
                    return Err(self.err("expected ':' after object key"));
                }
                self.advance()?;

                self.parse_value()?;
                self.tree.patch_span(pair);

                match self.current {
                    Token::Comma => self.advance()?,
                    Token::RightBrace => {
                        self.advance()?;
                        break;
                    }
                    _ => return Err(self.err("expected ',' or '}' in object")),
                }
            }
        }

        self.tree.patch_span(obj);
        self.depth -= 1;
        Ok(())
    }

    fn parse_array(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.err("structure nested too deeply"));
        }
        let arr = self.tree.push(Node::new(Kind::Array, 0));
        self.advance()?; // '['

        if self.current == Token::RightBracket {
            self.advance()?;
        } else {
            loop {
                self.parse_value()?;
                match self.current {
                    Token::Comma => self.advance()?,
                    Token::RightBracket => {
                        self.advance()?;
                        break;
                    }
                    _ => return Err(self.err("expected ',' or ']' in array")),
                }
            }
        }

        self.tree.patch_span(arr);
        self.depth -= 1;
        Ok(())
    }
}
