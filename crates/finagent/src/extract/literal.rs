//! Relaxed decoding for tool results that arrive as stringified
//! language literals rather than JSON: single-quoted strings, tuples,
//! `True`/`False`/`None`. Decodes to `serde_json::Value`, mapping tuples
//! to arrays. Only whole-input parses succeed, so partially literal-like
//! prose still falls through to the raw-text fallback.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid literal at offset {offset}: {message}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.chars.len() {
        return Err(parser.error("trailing characters after literal"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn error(&self, message: &str) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> Result<(), LiteralError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let end = self.pos + keyword.len();
        if end <= self.chars.len()
            && self.chars[self.pos..end].iter().collect::<String>() == keyword
        {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            Some('{') => self.parse_dict(),
            Some('[') => self.parse_sequence('[', ']'),
            Some('(') => self.parse_sequence('(', ')'),
            Some('\'') | Some('"') => self.parse_string().map(Value::String),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                self.parse_number()
            }
            Some('T') | Some('F') | Some('N') => self.parse_keyword(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        if self.eat_keyword("True") {
            Ok(Value::Bool(true))
        } else if self.eat_keyword("False") {
            Ok(Value::Bool(false))
        } else if self.eat_keyword("None") {
            Ok(Value::Null)
        } else {
            Err(self.error("unexpected character"))
        }
    }

    fn parse_dict(&mut self) -> Result<Value, LiteralError> {
        self.eat('{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.parse_value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return Err(self.error("unsupported dict key")),
            };
            self.skip_whitespace();
            self.eat(':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    // Lists and tuples both decode to arrays.
    fn parse_sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.eat(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(c) if c == close => {}
                _ => return Err(self.error("expected ',' or closing bracket")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let quote = match self.bump() {
            Some(c) => c,
            None => return Err(self.error("unexpected end of input")),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    None => return Err(self.error("unterminated escape")),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('u') => {
                        let code = self.parse_hex(4)?;
                        match char::from_u32(code) {
                            Some(c) => out.push(c),
                            None => return Err(self.error("invalid unicode escape")),
                        }
                    }
                    Some('x') => {
                        let code = self.parse_hex(2)?;
                        match char::from_u32(code) {
                            Some(c) => out.push(c),
                            None => return Err(self.error("invalid hex escape")),
                        }
                    }
                    // unknown escapes keep the backslash, as the source language does
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_hex(&mut self, digits: usize) -> Result<u32, LiteralError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let c = self
                .bump()
                .ok_or_else(|| self.error("unterminated escape"))?;
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.error("invalid hex digit"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                }
                '-' | '+' if is_float => self.pos += 1,
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        let n = text
            .parse::<f64>()
            .map_err(|_| self.error("invalid number"))?;
        Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| self.error("number out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_quoted_dict() {
        let value = parse("{'content': 'single quoted'}").unwrap();
        assert_eq!(value, json!({"content": "single quoted"}));
    }

    #[test]
    fn test_list_of_tuples_decodes_to_arrays() {
        let value = parse("[('a', 1), ('b', 2)]").unwrap();
        assert_eq!(value, json!([["a", 1], ["b", 2]]));
    }

    #[test]
    fn test_python_keywords() {
        let value = parse("{'ok': True, 'failed': False, 'missing': None}").unwrap();
        assert_eq!(value, json!({"ok": true, "failed": false, "missing": null}));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("42").unwrap(), json!(42));
        assert_eq!(parse("-7").unwrap(), json!(-7));
        assert_eq!(parse("2.5").unwrap(), json!(2.5));
        assert_eq!(parse("1e3").unwrap(), json!(1000.0));
    }

    #[test]
    fn test_nested_structures() {
        let value = parse("{'docs': [{'content': 'a', 'meta': {'page': 1}}]}").unwrap();
        assert_eq!(value, json!({"docs": [{"content": "a", "meta": {"page": 1}}]}));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            parse(r"'line\none \'quoted\''").unwrap(),
            json!("line\none 'quoted'")
        );
        assert_eq!(parse(r"'\x41B'").unwrap(), json!("AB"));
    }

    #[test]
    fn test_trailing_comma() {
        assert_eq!(parse("[1, 2,]").unwrap(), json!([1, 2]));
        assert_eq!(parse("('only',)").unwrap(), json!(["only"]));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse("hello (world)").is_err());
        assert!(parse("[1, 2] and more").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_prose_is_rejected() {
        assert!(parse("No results found.").is_err());
        assert!(parse("Rate limit reached. Please try again later.").is_err());
    }
}
