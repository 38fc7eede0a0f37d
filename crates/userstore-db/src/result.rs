//! Query result sets.
//!
//! A `ResultSet` keeps every row of a query in column order. Its `Display`
//! output is the plain row-collection form printed by the runner:
//! a bracketed list of tuples with no header line.

use rusqlite::types::Value;
use serde_json::{Map, Value as JsonValue};
use std::fmt::{self, Write as _};

/// Rows returned by a query, with the column names in table order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }

    /// Render the rows as a JSON array of objects keyed by column name.
    ///
    /// Keys keep column order. A repeated column name gets a numeric suffix
    /// (`a`, `a_2`, ...) so no value is lost.
    pub fn to_json(&self) -> JsonValue {
        let keys = self.json_keys();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, JsonValue> = keys
                    .iter()
                    .cloned()
                    .zip(row.iter().map(value_to_json))
                    .collect();
                JsonValue::Object(object)
            })
            .collect();
        JsonValue::Array(rows)
    }

    fn json_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let mut key = column.clone();
            let mut n = 1;
            while keys.contains(&key) || (n > 1 && self.columns.contains(&key)) {
                n += 1;
                key = format!("{}_{}", column, n);
            }
            keys.push(key);
        }
        keys
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_char('(')?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, value)?;
            }
            // One-element tuples keep their trailing comma.
            if row.len() == 1 {
                f.write_char(',')?;
            }
            f.write_char(')')?;
        }
        f.write_char(']')
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("None"),
        Value::Integer(i) => write!(f, "{}", i),
        Value::Real(r) => write_real(f, *r),
        Value::Text(s) => write_text(f, s),
        Value::Blob(bytes) => {
            f.write_str("b'")?;
            for b in bytes {
                match b {
                    b'\\' => f.write_str("\\\\")?,
                    b'\'' => f.write_str("\\'")?,
                    0x20..=0x7e => f.write_char(*b as char)?,
                    _ => write!(f, "\\x{:02x}", b)?,
                }
            }
            f.write_char('\'')
        }
    }
}

/// Shortest round-trip form with a signed, at least two-digit exponent
/// (`1e+16`, `1e-07`).
fn write_real(f: &mut fmt::Formatter<'_>, r: f64) -> fmt::Result {
    if r.is_nan() {
        return f.write_str("nan");
    }
    let repr = format!("{:?}", r);
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            write!(f, "{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => f.write_str(&repr),
    }
}

/// Quote text the way the row printout has always shown it: single quotes
/// unless the text contains a single quote and no double quote.
fn write_text(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(r) => JsonValue::from(*r),
        Value::Text(s) => JsonValue::from(s.as_str()),
        Value::Blob(bytes) => JsonValue::from(bytes.clone()),
    }
}
