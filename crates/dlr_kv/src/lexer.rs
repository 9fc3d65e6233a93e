//! Byte cursor shared by the KV1 and KV3 parsers.
//!
//! Both formats are ASCII at the syntax level; string contents may hold any
//! UTF-8 and are always sliced on quote boundaries.

use crate::error::{Error, Result};

pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.src.as_bytes()[self.pos..].starts_with(prefix.as_bytes())
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn bump(&mut self) -> Option<u8> {
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

    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    pub fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: u8) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{}'", expected as char)))
        }
    }

    /// Skip whitespace, `// line` comments and `/* block */` comments.
    pub fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.starts_with("//") => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.starts_with("/*") => {
                    self.advance(2);
                    loop {
                        if self.is_eof() {
                            return Err(Error::UnexpectedEof("unterminated block comment".into()));
                        }
                        if self.starts_with("*/") {
                            self.advance(2);
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consume bytes while `pred` holds and return them as a slice.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Consume everything up to `terminator` (exclusive) and the terminator itself.
    pub fn take_until(&mut self, terminator: &str) -> Result<&'a str> {
        let start = self.pos;
        match self.src.get(start..).and_then(|rest| rest.find(terminator)) {
            Some(offset) => {
                self.advance(offset);
                let text = &self.src[start..self.pos];
                self.advance(terminator.len());
                Ok(text)
            }
            None => Err(Error::UnexpectedEof(format!("missing '{terminator}'"))),
        }
    }

    /// Read a double-quoted string with backslash escapes. The opening quote
    /// must be the current byte.
    pub fn quoted_string(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut out = String::new();
        let mut run_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(Error::UnexpectedEof("unterminated string".into())),
                Some(b'"') => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.bump();
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.bump();
                    let unescaped = match self.peek() {
                        Some(b'n') => Some('\n'),
                        Some(b't') => Some('\t'),
                        Some(b'r') => Some('\r'),
                        Some(b'"') => Some('"'),
                        Some(b'\\') => Some('\\'),
                        Some(_) => None,
                        None => return Err(Error::UnexpectedEof("unterminated escape".into())),
                    };
                    match unescaped {
                        Some(c) => {
                            self.bump();
                            out.push(c);
                        }
                        // Unknown escapes are kept verbatim.
                        None => out.push('\\'),
                    }
                    run_start = self.pos;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    pub fn unexpected(&self, message: &str) -> Error {
        let found = match self.src.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(c) => format!("{message}, found '{c}'"),
            None => return Error::UnexpectedEof(message.to_string()),
        };
        Error::Parse {
            line: self.line,
            column: self.column,
            message: found,
        }
    }
}

/// Escape a string for a double-quoted KeyValues literal.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
