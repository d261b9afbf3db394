//! Recognizes enumerated-value CHECK constraints.
//!
//! Only the `<column> = ANY (ARRAY[<literal>, ...])` shape is understood, in
//! the spellings `pg_get_constraintdef` and `information_schema` produce:
//!
//! ```text
//! status = ANY (ARRAY['a', 'b'])
//! ((status)::text = ANY ((ARRAY['a'::character varying, 'b'::character varying])::text[]))
//! ```
//!
//! Anything else is "no enum". The parser never fails loudly.

/// A column restricted to a fixed list of string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEnum {
    pub column: String,
    pub values: Vec<String>,
}

/// Parse a CHECK clause, returning the column and its allowed values.
pub fn parse_check_enum(clause: &str) -> Option<CheckEnum> {
    let mut s = Scanner::new(strip_outer_parens(clause.trim()));

    let column = s.operand()?;
    s.skip_cast(&['=']);
    s.skip_ws();
    s.expect("=")?;
    s.skip_ws();
    s.expect_keyword("ANY")?;
    s.skip_ws();

    let mut open = 0;
    while s.eat('(') {
        open += 1;
        s.skip_ws();
    }
    s.expect_keyword("ARRAY")?;
    s.skip_ws();
    s.expect("[")?;

    let mut values = Vec::new();
    loop {
        s.skip_ws();
        values.push(s.string_literal()?);
        s.skip_cast(&[',', ']']);
        s.skip_ws();
        if s.eat(',') {
            continue;
        }
        s.expect("]")?;
        break;
    }

    // Trailing casts and the parentheses opened before ARRAY.
    loop {
        s.skip_ws();
        if s.at_end() {
            break;
        }
        if s.peek_str("::") {
            s.skip_cast(&[')']);
        } else if s.eat(')') {
            if open == 0 {
                return None;
            }
            open -= 1;
        } else {
            return None;
        }
    }

    Some(CheckEnum { column, values })
}

/// Strip parentheses that wrap the entire expression, at any depth.
fn strip_outer_parens(mut s: &str) -> &str {
    while s.starts_with('(') && matching_paren(s, 0) == Some(s.len() - 1) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Byte index of the `)` matching the `(` at `open`, skipping quoted text.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0u32;
    let mut in_quotes = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'\'' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Option<()> {
        if self.peek_str(s) {
            self.pos += s.len();
            Some(())
        } else {
            None
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Option<()> {
        let matches = self
            .rest()
            .get(..kw.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(kw));
        if matches {
            self.pos += kw.len();
            Some(())
        } else {
            None
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    /// Skip a `::type` cast if present. The type ends at any of `stops`.
    fn skip_cast(&mut self, stops: &[char]) {
        self.skip_ws();
        if !self.peek_str("::") {
            return;
        }
        self.pos += 2;
        while let Some(c) = self.peek() {
            if self.peek_str("[]") {
                self.pos += 2;
                continue;
            }
            let type_char = c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '"' | '.');
            if stops.contains(&c) || !type_char {
                break;
            }
            self.pos += 1;
        }
    }

    /// A column reference: `name`, `"Name"` or a parenthesized, cast operand.
    fn operand(&mut self) -> Option<String> {
        self.skip_ws();
        if self.peek() == Some('(') {
            let close = matching_paren(self.src, self.pos)?;
            let inner = &self.src[self.pos + 1..close];
            let mut nested = Scanner::new(inner.trim());
            let column = nested.operand()?;
            nested.skip_cast(&[]);
            nested.skip_ws();
            if !nested.at_end() {
                return None;
            }
            self.pos = close + 1;
            return Some(column);
        }
        if self.eat('"') {
            let mut name = String::new();
            loop {
                let c = self.peek()?;
                self.pos += c.len_utf8();
                if c == '"' {
                    if self.eat('"') {
                        name.push('"');
                        continue;
                    }
                    break;
                }
                name.push(c);
            }
            return Some(name);
        }
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            self.pos += 1;
        }
        Some(self.src[start..self.pos].to_string())
    }

    /// A single-quoted literal with `''` escapes.
    fn string_literal(&mut self) -> Option<String> {
        if !self.eat('\'') {
            return None;
        }
        let mut value = String::new();
        loop {
            let c = self.peek()?;
            self.pos += c.len_utf8();
            if c == '\'' {
                if self.eat('\'') {
                    value.push('\'');
                    continue;
                }
                return Some(value);
            }
            value.push(c);
        }
    }
}
