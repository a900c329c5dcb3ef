//! Tolerant decoder for JSON that may be cut off mid-value.
//!
//! Streaming responses deliver tool payloads a few bytes at a time, so the
//! decoder must produce a best-effort `Value` from whatever has arrived:
//! unterminated strings, objects missing their closing brace, literals cut
//! mid-word. Complete input decodes exactly as strict JSON would.

use serde_json::{Map, Number, Value};

use crate::errors::{ParserError, ParserResult};

/// Parser for incomplete JSON
pub struct PartialJson {
    /// Maximum depth for nested structures
    max_depth: usize,
    /// Whether to allow incomplete values
    allow_incomplete: bool,
}

impl PartialJson {
    /// Create a new partial JSON parser
    pub fn new(max_depth: usize, allow_incomplete: bool) -> Self {
        Self {
            max_depth,
            allow_incomplete,
        }
    }

    /// Parse a possibly-truncated JSON value.
    ///
    /// Returns the decoded value and the number of input bytes consumed.
    /// The consumed count is always a character boundary of `input`, so the
    /// caller can slice the remainder safely.
    pub fn parse_value(&self, input: &str) -> ParserResult<(Value, usize)> {
        let mut cursor = Cursor {
            input,
            pos: 0,
            max_depth: self.max_depth,
            allow_incomplete: self.allow_incomplete,
        };
        let value = cursor.value(0)?;
        Ok((value, cursor.pos))
    }
}

impl Default for PartialJson {
    fn default() -> Self {
        Self::new(32, true)
    }
}

/// Internal parser state
struct Cursor<'a> {
    input: &'a str,
    /// Byte offset of the next unread character
    pos: usize,
    max_depth: usize,
    allow_incomplete: bool,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn eat_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    fn value(&mut self, depth: usize) -> ParserResult<Value> {
        if depth > self.max_depth {
            return Err(ParserError::DepthExceeded(self.max_depth));
        }

        self.eat_whitespace();

        match self.peek() {
            Some('{') => self.object(depth + 1),
            Some('[') => self.array(depth + 1),
            Some('"') => self.string().map(Value::String),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.number(),
            Some(ch) if ch.is_ascii_alphabetic() => self.literal(),
            _ => {
                if self.allow_incomplete {
                    Ok(Value::Null)
                } else {
                    Err(ParserError::ParsingFailed("unexpected character".into()))
                }
            }
        }
    }

    fn object(&mut self, depth: usize) -> ParserResult<Value> {
        if depth > self.max_depth {
            return Err(ParserError::DepthExceeded(self.max_depth));
        }

        let mut object = Map::new();

        // Consume '{'
        self.bump();
        self.eat_whitespace();

        if self.peek() == Some('}') {
            self.bump();
            return Ok(Value::Object(object));
        }

        loop {
            let key = match self.string() {
                Ok(key) => key,
                Err(_) if self.allow_incomplete => {
                    // Incomplete object
                    return Ok(Value::Object(object));
                }
                Err(e) => return Err(e),
            };

            self.eat_whitespace();

            if self.peek() != Some(':') {
                if self.allow_incomplete {
                    // Pair cut off before its value
                    object.insert(key, Value::Null);
                    return Ok(Value::Object(object));
                }
                return Err(ParserError::ParsingFailed("expected ':'".into()));
            }
            self.bump();

            // Same depth: the object already incremented it
            let value = match self.value(depth) {
                Ok(value) => value,
                Err(_) if self.allow_incomplete => {
                    object.insert(key, Value::Null);
                    return Ok(Value::Object(object));
                }
                Err(e) => return Err(e),
            };

            object.insert(key, value);
            self.eat_whitespace();

            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.eat_whitespace();
                    // Trailing comma
                    if self.peek() == Some('}') {
                        self.bump();
                        return Ok(Value::Object(object));
                    }
                }
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(object));
                }
                None if self.allow_incomplete => {
                    return Ok(Value::Object(object));
                }
                _ => {
                    if self.allow_incomplete {
                        return Ok(Value::Object(object));
                    }
                    return Err(ParserError::ParsingFailed("expected ',' or '}'".into()));
                }
            }
        }
    }

    fn array(&mut self, depth: usize) -> ParserResult<Value> {
        if depth > self.max_depth {
            return Err(ParserError::DepthExceeded(self.max_depth));
        }

        let mut array = Vec::new();

        // Consume '['
        self.bump();
        self.eat_whitespace();

        if self.peek() == Some(']') {
            self.bump();
            return Ok(Value::Array(array));
        }

        loop {
            let value = match self.value(depth) {
                Ok(value) => value,
                Err(_) if self.allow_incomplete => {
                    return Ok(Value::Array(array));
                }
                Err(e) => return Err(e),
            };

            array.push(value);
            self.eat_whitespace();

            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.eat_whitespace();
                    // Trailing comma
                    if self.peek() == Some(']') {
                        self.bump();
                        return Ok(Value::Array(array));
                    }
                }
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(array));
                }
                None if self.allow_incomplete => {
                    return Ok(Value::Array(array));
                }
                _ => {
                    if self.allow_incomplete {
                        return Ok(Value::Array(array));
                    }
                    return Err(ParserError::ParsingFailed("expected ',' or ']'".into()));
                }
            }
        }
    }

    fn string(&mut self) -> ParserResult<String> {
        if self.peek() != Some('"') {
            return Err(ParserError::ParsingFailed("expected '\"'".into()));
        }

        // Consume opening quote
        self.bump();

        let mut string = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.bump();
                    return Ok(string);
                }
                '\\' => {
                    self.bump();
                    let Some(escaped) = self.peek() else {
                        // Dangling backslash at end of input
                        break;
                    };
                    match escaped {
                        '"' | '\\' | '/' => string.push(escaped),
                        'b' => string.push('\u{0008}'),
                        'f' => string.push('\u{000C}'),
                        'n' => string.push('\n'),
                        'r' => string.push('\r'),
                        't' => string.push('\t'),
                        'u' => {
                            self.bump();
                            string.push(self.unicode_escape()?);
                            continue;
                        }
                        // Invalid escape, but be lenient
                        other => string.push(other),
                    }
                    self.bump();
                }
                _ => {
                    string.push(ch);
                    self.bump();
                }
            }
        }

        // Unterminated string
        if self.allow_incomplete {
            Ok(string)
        } else {
            Err(ParserError::ParsingFailed("unterminated string".into()))
        }
    }

    fn unicode_escape(&mut self) -> ParserResult<char> {
        let start = self.pos;
        for _ in 0..4 {
            if matches!(self.peek(), Some(ch) if ch.is_ascii_hexdigit()) {
                self.bump();
            } else {
                break;
            }
        }

        let hex = &self.input[start..self.pos];
        if hex.len() == 4 {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| ParserError::ParsingFailed("invalid unicode escape".into()))
        } else if self.allow_incomplete {
            Ok('\u{FFFD}')
        } else {
            Err(ParserError::ParsingFailed("incomplete unicode escape".into()))
        }
    }

    fn number(&mut self) -> ParserResult<Value> {
        let start = self.pos;

        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                self.bump();
            }
        }

        let text = &self.input[start..self.pos];
        if let Ok(n) = text.parse::<i64>() {
            Ok(Value::Number(Number::from(n)))
        } else if let Ok(n) = text.parse::<f64>() {
            Ok(Value::Number(
                Number::from_f64(n).unwrap_or_else(|| Number::from(0)),
            ))
        } else if self.allow_incomplete {
            // A bare "-" or similar truncation
            Ok(Value::Number(Number::from(0)))
        } else {
            Err(ParserError::ParsingFailed("invalid number".into()))
        }
    }

    fn literal(&mut self) -> ParserResult<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphabetic()) {
            self.bump();
        }
        let word = &self.input[start..self.pos];

        match word {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            _ if self.allow_incomplete && !word.is_empty() && "true".starts_with(word) => {
                Ok(Value::Bool(true))
            }
            _ if self.allow_incomplete && !word.is_empty() && "false".starts_with(word) => {
                Ok(Value::Bool(false))
            }
            _ if self.allow_incomplete && !word.is_empty() && "null".starts_with(word) => {
                Ok(Value::Null)
            }
            _ => Err(ParserError::ParsingFailed(format!(
                "invalid literal `{word}`"
            ))),
        }
    }
}
