use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::error::{Error, Result};

/// The right-hand side of a `[key=value]` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(number) => write!(f, "{number}"),
            FilterValue::String(text) => f.write_str(text),
            FilterValue::Boolean(flag) => write!(f, "{flag}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A mapping key, or the scalar text of a sequence element.
    Key(String),
    /// A 0-based sequence index.
    Index(usize),
    /// The first mapping element of a sequence whose `key` holds `value`.
    Filter { key: String, value: FilterValue },
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
            Segment::Filter {
                key,
                value: FilterValue::String(text),
            } => write!(f, "[{key}='{}']", text.replace('\'', "\\'")),
            Segment::Filter { key, value } => write!(f, "[{key}={value}]"),
        }
    }
}

/// A compiled path such as `mapping.a.sequence.3.otherValue` or `items[name='bob'].email`.
///
/// - a bare word (anything up to the next `.` or `[`) is a [`Segment::Key`]
/// - a run of digits is a [`Segment::Index`], so `3abc` reads as index 3 then key `abc`
/// - `[key=value]` is a [`Segment::Filter`]; the value is an integer when it starts
///   with a digit, a quoted string, `true`/`false`, or otherwise a raw string
/// - `.` only separates; empty segments are skipped
#[derive(Debug, Clone, PartialEq, Eq, fieldwork::Fieldwork)]
#[fieldwork(get)]
pub struct Selector {
    path: String,
    segments: Vec<Segment>,
}

impl Selector {
    pub fn parse(path: &str) -> Result<Self> {
        let segments = Scanner::new(path).run()?;
        Ok(Self {
            path: path.to_string(),
            segments,
        })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        Self::parse(path)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

struct Scanner<'a> {
    path: &'a str,
    cursor: usize,
    segments: Vec<Segment>,
}

impl<'a> Scanner<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            cursor: 0,
            segments: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.path[self.cursor..]
    }

    fn error(&self, position: usize, message: impl Into<String>) -> Error {
        Error::path_syntax(self.path, position, message)
    }

    fn run(mut self) -> Result<Vec<Segment>> {
        while let Some(c) = self.rest().chars().next() {
            match c {
                '.' => self.cursor += 1,
                '[' => {
                    let segment = self.filter()?;
                    self.segments.push(segment);
                }
                c if c.is_ascii_digit() => {
                    let segment = self.index()?;
                    self.segments.push(segment);
                }
                _ => {
                    let segment = self.key();
                    self.segments.push(segment);
                }
            }
        }
        Ok(self.segments)
    }

    fn index(&mut self) -> Result<Segment> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..len];
        let index = digits
            .parse::<usize>()
            .map_err(|_| self.error(self.cursor, format!("index `{digits}` is too large")))?;
        self.cursor += len;
        Ok(Segment::Index(index))
    }

    fn key(&mut self) -> Segment {
        let rest = self.rest();
        let len = rest.find(|c: char| c == '.' || c == '[').unwrap_or(rest.len());
        self.cursor += len;
        Segment::Key(rest[..len].to_string())
    }

    fn filter(&mut self) -> Result<Segment> {
        let open = self.cursor;
        let body_start = open + 1;
        let close = closing_bracket(&self.path[body_start..])
            .map(|i| body_start + i)
            .ok_or_else(|| self.error(open, "unterminated filter, expected `]`"))?;
        let body = &self.path[body_start..close];

        let equals = body
            .find('=')
            .ok_or_else(|| self.error(open, "filter is missing `=`"))?;
        let key = body[..equals].trim();
        if key.is_empty() {
            return Err(self.error(body_start, "filter key is empty"));
        }

        let raw = &body[equals + 1..];
        let value_start = body_start + equals + 1 + (raw.len() - raw.trim_start().len());
        let value = self.filter_value(raw.trim(), value_start)?;

        self.cursor = close + 1;
        Ok(Segment::Filter {
            key: key.to_string(),
            value,
        })
    }

    fn filter_value(&self, text: &str, start: usize) -> Result<FilterValue> {
        match text.chars().next() {
            Some(c) if c.is_ascii_digit() => text
                .parse::<i64>()
                .map(FilterValue::Integer)
                .map_err(|_| self.error(start, format!("`{text}` is not an integer"))),
            Some(quote @ ('\'' | '"')) => self.quoted(text, quote, start),
            _ if text == "true" => Ok(FilterValue::Boolean(true)),
            _ if text == "false" => Ok(FilterValue::Boolean(false)),
            _ => match text.find('=') {
                Some(at) => Err(self.error(start + at, "unexpected `=` in filter value")),
                None => Ok(FilterValue::String(text.to_string())),
            },
        }
    }

    fn quoted(&self, text: &str, quote: char, start: usize) -> Result<FilterValue> {
        let mut value = String::new();
        let mut chars = text.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) if escaped == quote => value.push(quote),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                c if c == quote => {
                    let trailing = i + c.len_utf8();
                    if trailing < text.len() {
                        return Err(self.error(
                            start + trailing,
                            "unexpected characters after closing quote",
                        ));
                    }
                    return Ok(FilterValue::String(value));
                }
                c => value.push(c),
            }
        }
        Err(self.error(start, format!("unterminated {quote}-quoted string")))
    }
}

/// Byte index of the `]` closing a filter body, skipping over quoted text.
fn closing_bracket(body: &str) -> Option<usize> {
    let mut quote = None;
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            (None, _) => {}
        }
    }
    None
}
