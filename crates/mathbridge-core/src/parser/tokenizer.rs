//! Markup tokenizer — converts normalized LaTeX markup into a token stream
//!
//! Handles: numbers, single letters, `\commands`, opaque names
//! (`\mathit{...}`, `\mathrm{...}`, `\text{...}`), operators, grouping.
//! `\left(` / `\right)` collapse into plain parentheses, `\cdot`/`\times`
//! into `*`. Spacing commands (`\,`, `\quad`, ...) are discarded.
//!
//! Guarantees:
//! - Deterministic: same input always produces same token stream
//! - Complete error reporting: line:column for every error

use std::fmt;

use crate::Error;

/// Token types for markup syntax
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Digit run with optional fraction, kept as written
    Number(String),
    Letter(char),
    /// `\name` without the backslash
    Command(String),
    /// Content of `\mathit{...}` and friends
    Text(String),

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // * \cdot \times
    Slash,      // / \div
    Caret,      // ^
    Underscore, // _
    Equals,     // =
    Comma,      // ,

    // Grouping
    LBrace, // {
    RBrace, // }
    LParen, // ( \left(
    RParen, // ) \right)

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "'{}'", n),
            Token::Letter(c) => write!(f, "'{}'", c),
            Token::Command(name) => write!(f, "'\\{}'", name),
            Token::Text(text) => write!(f, "text '{}'", text),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Caret => f.write_str("'^'"),
            Token::Underscore => f.write_str("'_'"),
            Token::Equals => f.write_str("'='"),
            Token::Comma => f.write_str("','"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Position in source text for error reporting
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token with source position
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Commands whose brace argument is read verbatim as one name
const OPAQUE_COMMANDS: &[&str] = &["mathit", "mathrm", "text", "operatorname"];

/// Named spacing and style commands with no mathematical meaning
const IGNORED_COMMANDS: &[&str] = &["quad", "qquad", "displaystyle", "textstyle"];

/// Tokenizer for markup text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Previous token was `_` or `^`: a bare number argument is one digit
    script_pending: bool,
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        Tokenizer {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            script_pending: false,
        }
    }

    /// Tokenize the entire input into a stream of spanned tokens
    pub fn tokenize(&mut self) -> crate::Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            let Some(ch) = self.peek() else {
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    span: self.current_span(),
                });
                break;
            };

            if let Some(token) = self.next_token(ch)? {
                self.script_pending = matches!(token.token, Token::Underscore | Token::Caret);
                tokens.push(token);
            }
        }

        Ok(tokens)
    }

    // ── Character helpers ──────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    // ── Main dispatch ──────────────────────────────────────

    /// Next token, or `None` for text that produces no token (spacing)
    fn next_token(&mut self, ch: char) -> crate::Result<Option<SpannedToken>> {
        let span = self.current_span();

        let token = match ch {
            '\\' => return self.read_command(span),
            c if c.is_ascii_digit() => return self.read_number(span).map(Some),
            c if c.is_ascii_alphabetic() => Token::Letter(c),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '_' => Token::Underscore,
            '=' => Token::Equals,
            ',' => Token::Comma,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => {
                return Err(Error::ParseError(format!(
                    "Unexpected character '{}' at {}",
                    ch, span
                )))
            }
        };
        self.advance();
        Ok(Some(SpannedToken { token, span }))
    }

    // ── Numbers ────────────────────────────────────────────

    fn read_number(&mut self, span: Span) -> crate::Result<SpannedToken> {
        let start = self.position;

        if self.script_pending {
            self.advance();
        } else {
            let mut has_dot = false;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    self.advance();
                } else if ch == '.' && !has_dot {
                    has_dot = true;
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text: String = self.input[start..self.position].iter().collect();
        if text.ends_with('.') {
            return Err(Error::ParseError(format!(
                "Invalid number '{}' at {}",
                text, span
            )));
        }

        Ok(SpannedToken {
            token: Token::Number(text),
            span,
        })
    }

    // ── Commands ───────────────────────────────────────────

    fn read_command(&mut self, span: Span) -> crate::Result<Option<SpannedToken>> {
        self.advance(); // consume '\'

        let name = self.read_letters();
        if name.is_empty() {
            return match self.advance() {
                // \, \; \: \! and an escaped space
                Some(',' | ';' | ':' | '!' | ' ') => Ok(None),
                Some(c) => Err(Error::ParseError(format!(
                    "Unsupported command '\\{}' at {}",
                    c, span
                ))),
                None => Err(Error::ParseError(format!(
                    "Dangling '\\' at {}",
                    span
                ))),
            };
        }

        let token = match name.as_str() {
            "cdot" | "times" => Token::Star,
            "div" => Token::Slash,
            "left" => self.read_delimiter('(', Token::LParen, &span)?,
            "right" => self.read_delimiter(')', Token::RParen, &span)?,
            n if IGNORED_COMMANDS.contains(&n) => return Ok(None),
            n if OPAQUE_COMMANDS.contains(&n) => Token::Text(self.read_opaque_argument(&span)?),
            _ => Token::Command(name),
        };

        Ok(Some(SpannedToken { token, span }))
    }

    fn read_letters(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphabetic() {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    /// `\left(` and `\right)`; other delimiters are not supported
    fn read_delimiter(&mut self, expected: char, token: Token, span: &Span) -> crate::Result<Token> {
        self.skip_whitespace();
        match self.advance() {
            Some(c) if c == expected => Ok(token),
            Some(c) => Err(Error::ParseError(format!(
                "Unsupported delimiter '{}' at {}",
                c, span
            ))),
            None => Err(Error::ParseError(format!(
                "Missing delimiter after command at {}",
                span
            ))),
        }
    }

    /// Raw text between the braces following an opaque command
    fn read_opaque_argument(&mut self, span: &Span) -> crate::Result<String> {
        self.skip_whitespace();
        if self.advance() != Some('{') {
            return Err(Error::ParseError(format!(
                "Expected '{{' after text command at {}",
                span
            )));
        }

        let mut text = String::new();
        loop {
            match self.advance() {
                Some('}') => break,
                Some(c) => text.push(c),
                None => {
                    return Err(Error::ParseError(format!(
                        "Unterminated text argument starting at {}",
                        span
                    )))
                }
            }
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(Error::ParseError(format!("Empty text argument at {}", span)));
        }
        Ok(text)
    }
}
