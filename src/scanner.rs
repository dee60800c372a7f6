//! Structural scanner over JSON input.
//!
//! The scanner checks the grammar of the input and reports byte spans: the
//! span of each object key and the span of each complete value. It never
//! builds values itself; spans are handed to `serde_json` for decoding.
//! Number and string contents are only delimited here, their detailed
//! validation is left to `serde_json`.

use crate::error::CodecError;
use core::ops::Range;

/// `serde_json`'s default recursion limit. A value may nest at most
/// `MAX_DEPTH - 1` containers.
const MAX_DEPTH: usize = 128;

pub(crate) const NO_OPEN_BRACE: &str = "the input JSON does not start with '{'";
pub(crate) const NO_CLOSE_BRACE: &str = "the input JSON does not end with '}'";

/// Top-level tokens of the object being decoded.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Token {
    /// Span of a key string, quotes included.
    Key(Range<usize>),
    /// The closing `}` of the top-level object.
    End,
}

pub(crate) struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    entries: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            entries: 0,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    pub(crate) fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Consume the opening brace. `Ok(false)` means the input holds nothing
    /// but whitespace.
    pub(crate) fn open(&mut self) -> Result<bool, CodecError> {
        self.skip_ws();
        match self.peek() {
            None => Ok(false),
            Some(b'{') => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Err(CodecError::syntax(0, NO_OPEN_BRACE)),
        }
    }

    /// Next key of the top-level object, or its closing brace.
    pub(crate) fn next_token(&mut self) -> Result<Token, CodecError> {
        self.skip_ws();
        if self.entries > 0 {
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                }
                Some(b'}') => return Ok(self.close()),
                Some(c) => return Err(self.invalid(c, "after object key:value pair")),
                None => return Err(self.unterminated()),
            }
        } else if self.peek() == Some(b'}') {
            return Ok(self.close());
        }

        match self.peek() {
            Some(b'"') => {
                let span = self.string()?;
                self.skip_ws();
                match self.peek() {
                    Some(b':') => self.pos += 1,
                    Some(c) => return Err(self.invalid(c, "after object key")),
                    None => return Err(self.unterminated()),
                }
                self.entries += 1;
                Ok(Token::Key(span))
            }
            Some(c) => Err(self.invalid(c, "looking for beginning of object key string")),
            None => Err(self.unterminated()),
        }
    }

    /// Span of the next complete value at any nesting depth.
    pub(crate) fn value(&mut self) -> Result<Range<usize>, CodecError> {
        self.skip_ws();
        let start = self.pos;
        self.skip_value(0)?;
        Ok(start..self.pos)
    }

    /// Reject anything but whitespace after the top-level object.
    pub(crate) fn finish(&mut self) -> Result<(), CodecError> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.invalid(c, "after top-level value")),
        }
    }

    fn close(&mut self) -> Token {
        self.pos += 1;
        Token::End
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn skip_value(&mut self, depth: usize) -> Result<(), CodecError> {
        match self.peek() {
            Some(b'{') => self.skip_container(depth, b'}', true),
            Some(b'[') => self.skip_container(depth, b']', false),
            Some(b'"') => self.string().map(drop),
            Some(b't') => self.literal(b"true"),
            Some(b'f') => self.literal(b"false"),
            Some(b'n') => self.literal(b"null"),
            Some(b'-' | b'0'..=b'9') => {
                while let Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') = self.peek() {
                    self.pos += 1;
                }
                Ok(())
            }
            Some(c) => Err(self.invalid(c, "looking for beginning of value")),
            None => Err(self.unterminated()),
        }
    }

    /// Skip an object or array whose opening delimiter is at `pos`.
    fn skip_container(&mut self, depth: usize, close: u8, keyed: bool) -> Result<(), CodecError> {
        if depth + 1 >= MAX_DEPTH {
            return Err(CodecError::syntax(self.pos, "exceeded maximum nesting depth"));
        }
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(());
        }
        loop {
            self.skip_ws();
            if keyed {
                match self.peek() {
                    Some(b'"') => {
                        self.string()?;
                    }
                    Some(c) => {
                        return Err(self.invalid(c, "looking for beginning of object key string"))
                    }
                    None => return Err(self.unterminated()),
                }
                self.skip_ws();
                match self.peek() {
                    Some(b':') => self.pos += 1,
                    Some(c) => return Err(self.invalid(c, "after object key")),
                    None => return Err(self.unterminated()),
                }
                self.skip_ws();
            }
            self.skip_value(depth + 1)?;
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(c) if keyed => return Err(self.invalid(c, "after object key:value pair")),
                Some(c) => return Err(self.invalid(c, "after array element")),
                None => return Err(self.unterminated()),
            }
        }
    }

    /// Span of a string literal at `pos`, quotes included.
    fn string(&mut self) -> Result<Range<usize>, CodecError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(start..self.pos);
                }
                Some(b'\\') => self.pos += 2,
                Some(_) => self.pos += 1,
                None => {
                    self.pos = self.input.len();
                    return Err(self.unterminated());
                }
            }
        }
    }

    fn literal(&mut self, word: &[u8]) -> Result<(), CodecError> {
        for &expected in word {
            match self.peek() {
                Some(c) if c == expected => self.pos += 1,
                Some(c) => return Err(self.invalid(c, "in literal")),
                None => return Err(self.unterminated()),
            }
        }
        Ok(())
    }

    fn invalid(&self, c: u8, context: &str) -> CodecError {
        CodecError::syntax(
            self.pos,
            format!("invalid character {} {}", describe(c), context),
        )
    }

    fn unterminated(&self) -> CodecError {
        CodecError::syntax(self.input.len(), NO_CLOSE_BRACE)
    }
}

fn describe(c: u8) -> String {
    if c.is_ascii_graphic() {
        format!("'{}'", c as char)
    } else {
        format!("'\\x{:02x}'", c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_and_values(input: &str) -> Result<Vec<(String, String)>, CodecError> {
        let bytes = input.as_bytes();
        let mut sc = Scanner::new(bytes);
        assert!(sc.open()?);
        let mut out = Vec::new();
        while let Token::Key(k) = sc.next_token()? {
            let v = sc.value()?;
            out.push((input[k].to_string(), input[v].to_string()));
        }
        sc.finish()?;
        Ok(out)
    }

    fn syntax_at(err: CodecError) -> (usize, String) {
        match err {
            CodecError::Syntax { offset, message } => (offset, message),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn spans_cover_keys_and_nested_values() {
        let got = keys_and_values(r#" { "a" : 1 , "b":{"x":[1,{"y":null}],"z":"}"}, "c\"d":true } "#)
            .unwrap();
        assert_eq!(
            got,
            [
                (r#""a""#.to_string(), "1".to_string()),
                (r#""b""#.to_string(), r#"{"x":[1,{"y":null}],"z":"}"}"#.to_string()),
                (r#""c\"d""#.to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert!(!Scanner::new(b"").open().unwrap());
        assert!(!Scanner::new(b" \n").open().unwrap());
        assert!(keys_and_values("{}").unwrap().is_empty());
        assert!(keys_and_values(" { } ").unwrap().is_empty());
    }

    #[test]
    fn non_object_input_fails_at_offset_zero() {
        let (offset, msg) = syntax_at(Scanner::new(b"123").open().unwrap_err());
        assert_eq!(offset, 0);
        assert_eq!(msg, NO_OPEN_BRACE);
    }

    #[test]
    fn missing_close_reports_end_of_input() {
        let (offset, msg) = syntax_at(keys_and_values(r#"{"A":"a""#).unwrap_err());
        assert_eq!((offset, msg.as_str()), (8, NO_CLOSE_BRACE));
        let (offset, _) = syntax_at(keys_and_values(r#"{"A":{"B":1"#).unwrap_err());
        assert_eq!(offset, 11);
        let (offset, _) = syntax_at(keys_and_values(r#"{"A":"abc"#).unwrap_err());
        assert_eq!(offset, 9);
    }

    #[test]
    fn open_brace_where_key_expected() {
        let (offset, msg) = syntax_at(keys_and_values(r#"{{"a":1}}"#).unwrap_err());
        assert_eq!(offset, 1);
        assert_eq!(msg, "invalid character '{' looking for beginning of object key string");
    }

    #[test]
    fn malformed_nested_object_reports_offending_character() {
        let (offset, msg) = syntax_at(keys_and_values(r#"{"A":{"B":"C":"abc"}}}"#).unwrap_err());
        assert_eq!(offset, 13);
        assert_eq!(msg, "invalid character ':' after object key:value pair");
    }

    #[test]
    fn trailing_garbage_and_commas() {
        let (offset, _) = syntax_at(keys_and_values(r#"{"a":1}}"#).unwrap_err());
        assert_eq!(offset, 7);
        let (offset, msg) = syntax_at(keys_and_values(r#"{"a":1,}"#).unwrap_err());
        assert_eq!(offset, 7);
        assert!(msg.starts_with("invalid character '}'"));
        let (_, msg) = syntax_at(keys_and_values("{@}").unwrap_err());
        assert_eq!(msg, "invalid character '@' looking for beginning of object key string");
    }

    #[test]
    fn bad_literals_and_missing_colon() {
        let (offset, _) = syntax_at(keys_and_values(r#"{"a":tru}"#).unwrap_err());
        assert_eq!(offset, 8);
        let (offset, msg) = syntax_at(keys_and_values(r#"{"a" 1}"#).unwrap_err());
        assert_eq!(offset, 5);
        assert_eq!(msg, "invalid character '1' after object key");
    }

    #[test]
    fn nesting_limit_matches_serde_json() {
        let nested = |n: usize| format!(r#"{{"a":{}0{}}}"#, "[".repeat(n), "]".repeat(n));
        let ok = nested(MAX_DEPTH - 1);
        let (_, value) = keys_and_values(&ok).unwrap().remove(0);
        assert!(serde_json::from_str::<serde_json::Value>(&value).is_ok());

        let (offset, msg) = syntax_at(keys_and_values(&nested(MAX_DEPTH)).unwrap_err());
        assert_eq!(msg, "exceeded maximum nesting depth");
        assert_eq!(offset, 5 + MAX_DEPTH - 1);
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!(r#"{{"a":{}{}}}"#, "[".repeat(200), "]".repeat(200));
        let (_, msg) = syntax_at(keys_and_values(&deep).unwrap_err());
        assert_eq!(msg, "exceeded maximum nesting depth");
    }
}
