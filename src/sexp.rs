//! Canonical S-expressions.
//!
//! The canonical encoding is binary safe: every atom is written as its
//! decimal length, a colon and the raw octets, and lists are delimited by
//! parentheses without any whitespace, e.g.
//! `(10:public-key(3:rsa(1:n3:...)(1:e3:...)))`.
//!
//! [`Sexp::parse`] accepts exactly one canonical expression and rejects any
//! other syntax. The `Display` impl renders the readable "advanced" form
//! for logs and error messages.

use std::fmt;

use crate::error::{CertReadError, Result};

/// Default limit on list nesting accepted by [`Sexp::parse`].
pub const DEFAULT_MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    Atom(Vec<u8>),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn atom(bytes: impl AsRef<[u8]>) -> Self {
        Sexp::Atom(bytes.as_ref().to_vec())
    }

    pub fn list(items: Vec<Sexp>) -> Self {
        Sexp::List(items)
    }

    /// Builds the common `(name value)` pair.
    pub fn pair(name: &str, value: impl AsRef<[u8]>) -> Self {
        Sexp::List(vec![Sexp::atom(name), Sexp::atom(value)])
    }

    /// Parses one canonical expression that must span all of `input`.
    pub fn parse(input: &[u8]) -> Result<Self> {
        Self::parse_with_depth(input, DEFAULT_MAX_DEPTH)
    }

    pub fn parse_with_depth(input: &[u8], max_depth: usize) -> Result<Self> {
        let mut stack: Vec<Vec<Sexp>> = Vec::new();
        let mut pos = 0;
        loop {
            let Some(&byte) = input.get(pos) else {
                return Err(CertReadError::malformed_sexp(pos, "unexpected end of expression"));
            };
            let finished = match byte {
                b'(' => {
                    if stack.len() >= max_depth {
                        return Err(CertReadError::malformed_sexp(pos, "nesting too deep"));
                    }
                    stack.push(Vec::new());
                    pos += 1;
                    None
                }
                b')' => {
                    let items = stack.pop().ok_or_else(|| {
                        CertReadError::malformed_sexp(pos, "unbalanced closing parenthesis")
                    })?;
                    pos += 1;
                    Some(Sexp::List(items))
                }
                b'0'..=b'9' => {
                    let (atom, next) = parse_atom(input, pos)?;
                    pos = next;
                    Some(Sexp::Atom(atom.to_vec()))
                }
                _ => {
                    return Err(CertReadError::malformed_sexp(
                        pos,
                        format!("unexpected character 0x{byte:02x}"),
                    ));
                }
            };

            if let Some(value) = finished {
                match stack.last_mut() {
                    Some(parent) => parent.push(value),
                    None => {
                        if pos != input.len() {
                            return Err(CertReadError::malformed_sexp(
                                pos,
                                "trailing data after expression",
                            ));
                        }
                        return Ok(value);
                    }
                }
            }
        }
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Sexp::Atom(bytes) => Some(bytes),
            Sexp::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::Atom(_) => None,
            Sexp::List(items) => Some(items),
        }
    }

    /// The leading atom of a list.
    pub fn tag(&self) -> Option<&[u8]> {
        self.as_list()?.first()?.as_atom()
    }

    /// Finds the first direct sub-list whose leading atom is `name`.
    pub fn find(&self, name: &str) -> Option<&Sexp> {
        self.as_list()?
            .iter()
            .skip(1)
            .find(|item| item.tag() == Some(name.as_bytes()))
    }

    /// The value of a `(name value)` sub-list.
    pub fn find_value(&self, name: &str) -> Option<&[u8]> {
        match self.find(name)?.as_list()? {
            [_, value] => value.as_atom(),
            _ => None,
        }
    }

    pub fn to_canonical(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_canonical(&mut out);
        out
    }

    pub fn write_canonical(&self, out: &mut Vec<u8>) {
        match self {
            Sexp::Atom(bytes) => {
                out.extend_from_slice(bytes.len().to_string().as_bytes());
                out.push(b':');
                out.extend_from_slice(bytes);
            }
            Sexp::List(items) => {
                out.push(b'(');
                for item in items {
                    item.write_canonical(out);
                }
                out.push(b')');
            }
        }
    }
}

fn parse_atom(input: &[u8], start: usize) -> Result<(&[u8], usize)> {
    let mut pos = start;
    let mut len = 0usize;
    while let Some(&b) = input.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        if pos > start && input[start] == b'0' {
            return Err(CertReadError::malformed_sexp(start, "length with leading zero"));
        }
        len = len
            .checked_mul(10)
            .and_then(|l| l.checked_add(usize::from(b - b'0')))
            .ok_or_else(|| CertReadError::malformed_sexp(start, "length overflow"))?;
        pos += 1;
    }
    if input.get(pos) != Some(&b':') {
        return Err(CertReadError::malformed_sexp(pos, "expected ':' after length"));
    }
    pos += 1;
    if len > input.len() - pos {
        return Err(CertReadError::malformed_sexp(start, "atom extends past end of input"));
    }
    Ok((&input[pos..pos + len], pos + len))
}

fn is_token(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(first) if !first.is_ascii_digit() => bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || b"-./_:*+=".contains(b)),
        _ => false,
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(bytes) if is_token(bytes) => {
                f.write_str(std::str::from_utf8(bytes).map_err(|_| fmt::Error)?)
            }
            Sexp::Atom(bytes)
                if !bytes.is_empty() && bytes.iter().all(|b| (0x20..0x7f).contains(b)) =>
            {
                f.write_str("\"")?;
                for &b in bytes {
                    if b == b'"' || b == b'\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", char::from(b))?;
                }
                f.write_str("\"")
            }
            Sexp::Atom(bytes) => write!(f, "#{}#", hex::encode_upper(bytes)),
            Sexp::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}
