//! Parser for the list literals embedded in scoring responses
//!
//! Accepts both JSON and Python literal syntax: `[...]` lists and `(...)`
//! tuples, single or double quoted strings, bare numbers, and trailing
//! commas.

use crate::ScoringError;

/// A parsed literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    List(Vec<Literal>),
    Str(String),
    /// Numbers keep their source text so integer ids survive untouched
    Num { raw: String, value: f64 },
}

impl Literal {
    /// Render a scalar as text (ids may be strings or integers)
    pub fn as_text(&self) -> Option<String> {
        match self {
            Literal::Str(s) => Some(s.clone()),
            Literal::Num { raw, .. } => Some(raw.clone()),
            Literal::List(_) => None,
        }
    }

    /// Read a scalar as a float, parsing quoted numbers too
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Num { value, .. } => Some(*value),
            Literal::Str(s) => s.trim().parse().ok(),
            Literal::List(_) => None,
        }
    }
}

/// Parse a complete literal; trailing non-whitespace input is an error
pub fn parse_literal(input: &str) -> Result<Literal, ScoringError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn error(&self, message: &str) -> ScoringError {
        ScoringError::Literal {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Result<Literal, ScoringError> {
        self.skip_ws();
        match self.peek() {
            Some('[') => self.sequence(']'),
            Some('(') => self.sequence(')'),
            Some(q @ ('\'' | '"')) => self.string(q).map(Literal::Str),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(_) => Err(self.error("expected list, tuple, string or number")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn sequence(&mut self, close: char) -> Result<Literal, ScoringError> {
        // opening bracket
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Literal::List(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {}
                Some(_) => return Err(self.error("expected ',' or closing bracket")),
                None => return Err(self.error("unterminated sequence")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, ScoringError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'u' => out.push(self.unicode_escape()?),
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, ScoringError> {
        let end = self.pos + 4;
        if end > self.chars.len() {
            return Err(self.error("truncated unicode escape"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos = end;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn number(&mut self) -> Result<Literal, ScoringError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
        ) {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let value = raw.parse::<f64>().map_err(|_| ScoringError::Literal {
            offset: start,
            message: format!("invalid number '{}'", raw),
        })?;
        Ok(Literal::Num { raw, value })
    }
}
