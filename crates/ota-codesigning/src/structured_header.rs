//! Structured field dictionary parsing (RFC 8941).
//!
//! Signature headers are dictionaries such as
//!
//! ```text
//! sig="MEUCIQ...", keyid="root", alg="rsa-v1_5-sha256"
//! ```
//!
//! The parser checks the full dictionary grammar (keys, integers, decimals,
//! strings, tokens, byte sequences, booleans, inner lists and parameters) but
//! only string-valued members are returned. Everything else is validated and
//! dropped, which is what callers of the signature header want: the bare `sig`
//! member of an accept header is a boolean and never shadows a real value.

use std::collections::HashMap;

/// Malformed structured field input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {position}")]
pub struct HeaderParseError {
    /// Byte offset into the raw header value.
    pub position: usize,
    pub message: String,
}

impl HeaderParseError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Parse a dictionary header into its string-valued members.
///
/// With `ignoring_parameters` set, `;key=value` parameters on members and
/// inner-list items are parsed and discarded. Without it, any parameter is a
/// parse error since the returned mapping has nowhere to keep it.
///
/// Duplicate keys follow RFC 8941: the last occurrence wins, even when it is
/// not a string (the key is then absent from the result).
///
/// # Examples
///
/// ```
/// use ota_codesigning::structured_header::parse_dictionary;
///
/// let dict = parse_dictionary(r#"sig="abc", keyid="my\"key""#, true).unwrap();
/// assert_eq!(dict["sig"], "abc");
/// assert_eq!(dict["keyid"], "my\"key");
/// ```
pub fn parse_dictionary(
    raw: &str,
    ignoring_parameters: bool,
) -> Result<HashMap<String, String>, HeaderParseError> {
    Parser::new(raw, ignoring_parameters).parse_dictionary()
}

/// Serialize a value as an sf-string: wrap in quotes, escape `\` and `"`.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Value of a dictionary member, reduced to what callers can observe.
enum Member {
    String(String),
    Other,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    ignoring_parameters: bool,
}

impl<'a> Parser<'a> {
    fn new(raw: &'a str, ignoring_parameters: bool) -> Self {
        // Leading and trailing SP are not part of the field value.
        let input = raw.trim_end_matches(' ').as_bytes();
        let pos = input.iter().take_while(|b| **b == b' ').count();
        Self {
            input,
            pos,
            ignoring_parameters,
        }
    }

    fn parse_dictionary(mut self) -> Result<HashMap<String, String>, HeaderParseError> {
        let mut members = HashMap::new();
        if self.at_end() {
            return Ok(members);
        }

        loop {
            let key = self.parse_key()?;
            let member = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.parse_item_or_inner_list()?
            } else {
                // Bare key: boolean true with optional parameters.
                self.parse_parameters()?;
                Member::Other
            };

            match member {
                Member::String(value) => {
                    members.insert(key, value);
                }
                Member::Other => {
                    members.remove(&key);
                }
            }

            self.skip_ows();
            if self.at_end() {
                return Ok(members);
            }
            self.expect(b',', "expected ',' between dictionary members")?;
            self.skip_ows();
            if self.at_end() {
                return Err(self.error("trailing comma in dictionary"));
            }
        }
    }

    fn parse_item_or_inner_list(&mut self) -> Result<Member, HeaderParseError> {
        if self.peek() == Some(b'(') {
            self.parse_inner_list()?;
            Ok(Member::Other)
        } else {
            self.parse_item()
        }
    }

    fn parse_inner_list(&mut self) -> Result<(), HeaderParseError> {
        self.expect(b'(', "expected '('")?;
        loop {
            self.skip_sp();
            match self.peek() {
                None => return Err(self.error("unterminated inner list")),
                Some(b')') => {
                    self.pos += 1;
                    return self.parse_parameters();
                }
                Some(_) => {
                    self.parse_item()?;
                    match self.peek() {
                        Some(b' ') | Some(b')') => {}
                        None => return Err(self.error("unterminated inner list")),
                        Some(_) => return Err(self.error("expected SP or ')' in inner list")),
                    }
                }
            }
        }
    }

    fn parse_item(&mut self) -> Result<Member, HeaderParseError> {
        let item = self.parse_bare_item()?;
        self.parse_parameters()?;
        Ok(item)
    }

    fn parse_parameters(&mut self) -> Result<(), HeaderParseError> {
        while self.peek() == Some(b';') {
            if !self.ignoring_parameters {
                return Err(self.error("parameters are not supported here"));
            }
            self.pos += 1;
            self.skip_sp();
            self.parse_key()?;
            if self.peek() == Some(b'=') {
                self.pos += 1;
                self.parse_bare_item()?;
            }
        }
        Ok(())
    }

    fn parse_key(&mut self) -> Result<String, HeaderParseError> {
        match self.peek() {
            Some(c) if c.is_ascii_lowercase() || c == b'*' => {}
            _ => return Err(self.error("key must start with a lowercase letter or '*'")),
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, b'_' | b'-' | b'.' | b'*')
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.slice_to_string(start))
    }

    fn parse_bare_item(&mut self) -> Result<Member, HeaderParseError> {
        match self.peek() {
            Some(b'-') => self.parse_number().map(|_| Member::Other),
            Some(c) if c.is_ascii_digit() => self.parse_number().map(|_| Member::Other),
            Some(b'"') => self.parse_string().map(Member::String),
            Some(b':') => self.parse_byte_sequence().map(|_| Member::Other),
            Some(b'?') => self.parse_boolean().map(|_| Member::Other),
            Some(c) if c.is_ascii_alphabetic() || c == b'*' => {
                self.parse_token();
                Ok(Member::Other)
            }
            Some(_) => Err(self.error("unexpected character at start of item")),
            None => Err(self.error("expected item, found end of input")),
        }
    }

    fn parse_number(&mut self) -> Result<(), HeaderParseError> {
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {}
            _ => return Err(self.error("expected digit")),
        }

        let mut digits = 0usize;
        let mut fraction_digits: Option<usize> = None;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                match fraction_digits.as_mut() {
                    Some(n) => *n += 1,
                    None => digits += 1,
                }
            } else if c == b'.' && fraction_digits.is_none() {
                if digits > 12 {
                    return Err(self.error("decimal has too many integer digits"));
                }
                fraction_digits = Some(0);
            } else {
                break;
            }
            self.pos += 1;

            let total = digits + fraction_digits.map_or(0, |n| n + 1);
            if fraction_digits.is_none() && total > 15 {
                return Err(self.error("integer has too many digits"));
            }
            if fraction_digits.is_some() && total > 16 {
                return Err(self.error("decimal has too many digits"));
            }
        }

        match fraction_digits {
            Some(0) => Err(self.error("decimal ends with '.'")),
            Some(n) if n > 3 => Err(self.error("decimal has too many fractional digits")),
            _ => Ok(()),
        }
    }

    fn parse_string(&mut self) -> Result<String, HeaderParseError> {
        self.expect(b'"', "expected '\"'")?;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += 1;
            match c {
                b'\\' => match self.peek() {
                    Some(escaped @ (b'\\' | b'"')) => {
                        self.pos += 1;
                        out.push(escaped as char);
                    }
                    _ => return Err(self.error("invalid escape in string")),
                },
                b'"' => return Ok(out),
                0x20..=0x7e => out.push(c as char),
                _ => {
                    self.pos -= 1;
                    return Err(self.error("invalid character in string"));
                }
            }
        }
    }

    fn parse_token(&mut self) {
        let is_tchar = |c: u8| {
            c.is_ascii_alphanumeric()
                || matches!(
                    c,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                        | b':'
                        | b'/'
                )
        };
        // First character already checked by the caller.
        self.pos += 1;
        while self.peek().is_some_and(is_tchar) {
            self.pos += 1;
        }
    }

    fn parse_byte_sequence(&mut self) -> Result<(), HeaderParseError> {
        self.expect(b':', "expected ':'")?;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated byte sequence")),
                Some(b':') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(c) if c.is_ascii_alphanumeric() || matches!(c, b'+' | b'/' | b'=') => {
                    self.pos += 1;
                }
                Some(_) => return Err(self.error("invalid character in byte sequence")),
            }
        }
    }

    fn parse_boolean(&mut self) -> Result<(), HeaderParseError> {
        self.expect(b'?', "expected '?'")?;
        match self.peek() {
            Some(b'0') | Some(b'1') => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error("boolean must be ?0 or ?1")),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect(&mut self, expected: u8, message: &str) -> Result<(), HeaderParseError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn skip_sp(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn skip_ows(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn slice_to_string(&self, start: usize) -> String {
        // Keys are ASCII by construction.
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn error(&self, message: &str) -> HeaderParseError {
        HeaderParseError::new(self.pos, message)
    }
}
