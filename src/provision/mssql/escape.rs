//! Identifier and string literal escaping for T-SQL.
//!
//! Bootstrap statements are assembled by interpolation, so everything a user
//! types (database name, login, password) passes through here first.
//! Identifiers are bracket-quoted and rejected when they cannot be quoted
//! safely; literals never fail and encode control characters as `CHAR()`
//! expressions.

use std::fmt::Write;

use thiserror::Error;

/// Maximum length (exclusive) of a login/user name.
pub const MAX_USER_NAME_LEN: usize = 128;

/// Why a name cannot be used as a T-SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIdentifier {
    #[error("identifier cannot be empty")]
    Empty,

    #[error("identifier cannot contain '[' or ']' characters")]
    Bracket,

    #[error("identifier cannot contain non-printable characters")]
    NonPrintable,

    #[error("user name must be shorter than {MAX_USER_NAME_LEN} characters, got {len}")]
    TooLong { len: usize },
}

/// Printable ASCII, the only range allowed inside identifiers and plain
/// literal runs.
pub fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// Quote `name` as `[name]`.
pub fn escape_identifier(name: &str) -> Result<String, InvalidIdentifier> {
    if name.is_empty() {
        return Err(InvalidIdentifier::Empty);
    }
    if name.contains(['[', ']']) {
        return Err(InvalidIdentifier::Bracket);
    }
    if !name.chars().all(is_printable) {
        return Err(InvalidIdentifier::NonPrintable);
    }
    Ok(format!("[{name}]"))
}

/// Like [`escape_identifier`], with the login name length limit applied.
pub fn escape_user(name: &str) -> Result<String, InvalidIdentifier> {
    let len = name.chars().count();
    if len >= MAX_USER_NAME_LEN {
        return Err(InvalidIdentifier::TooLong { len });
    }
    escape_identifier(name)
}

/// A piece of a literal: either a maximal printable run or one
/// non-printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlToken<'a> {
    pub text: &'a str,
    pub printable: bool,
}

/// Splits a string into [`SqlToken`]s, in order. Never yields an empty token.
#[derive(Debug, Clone)]
pub struct SqlTokens<'a> {
    rest: &'a str,
}

impl<'a> SqlTokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl<'a> Iterator for SqlTokens<'a> {
    type Item = SqlToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;

        let split_at = if is_printable(first) {
            self.rest
                .find(|c: char| !is_printable(c))
                .unwrap_or(self.rest.len())
        } else {
            first.len_utf8()
        };

        let (text, rest) = self.rest.split_at(split_at);
        self.rest = rest;
        Some(SqlToken {
            text,
            printable: is_printable(first),
        })
    }
}

/// Render `value` as a T-SQL string expression.
///
/// `"foo\r\n"` becomes `'foo' + CHAR(13) + CHAR(10)`.
pub fn escape_literal(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    for (i, token) in SqlTokens::new(value).enumerate() {
        if i > 0 {
            out.push_str(" + ");
        }
        if token.printable {
            out.push('\'');
            out.push_str(&token.text.replace('\'', "''"));
            out.push('\'');
        } else {
            // Non-printable tokens are exactly one char.
            for c in token.text.chars() {
                push_char_code(&mut out, c);
            }
        }
    }
    out
}

/// `CHAR(n)` for ASCII control characters, `NCHAR(n)` beyond that.
/// Characters outside the BMP are spelled as their UTF-16 surrogate pair.
fn push_char_code(out: &mut String, c: char) {
    let code = c as u32;
    if code < 0x80 {
        let _ = write!(out, "CHAR({code})");
        return;
    }

    let mut units = [0u16; 2];
    for (i, unit) in c.encode_utf16(&mut units).iter().enumerate() {
        if i > 0 {
            out.push_str(" + ");
        }
        let _ = write!(out, "NCHAR({unit})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_wrapped_in_brackets() {
        assert_eq!(escape_identifier("foo").unwrap(), "[foo]");
        assert_eq!(escape_identifier("_foo").unwrap(), "[_foo]");
        assert_eq!(escape_identifier("foo.").unwrap(), "[foo.]");
        assert_eq!(escape_identifier("_$#.@-").unwrap(), "[_$#.@-]");
        assert_eq!(escape_identifier("my db").unwrap(), "[my db]");
    }

    #[test]
    fn test_identifier_rejections() {
        assert_eq!(escape_identifier(""), Err(InvalidIdentifier::Empty));
        assert_eq!(escape_identifier("a[b"), Err(InvalidIdentifier::Bracket));
        assert_eq!(escape_identifier("ab]"), Err(InvalidIdentifier::Bracket));
        assert_eq!(
            escape_identifier("f\u{7}oo"),
            Err(InvalidIdentifier::NonPrintable)
        );
        assert_eq!(
            escape_identifier("f\noo"),
            Err(InvalidIdentifier::NonPrintable)
        );
        assert_eq!(
            escape_identifier("f\u{7f}oo"),
            Err(InvalidIdentifier::NonPrintable)
        );
        assert_eq!(
            escape_identifier("caf\u{e9}"),
            Err(InvalidIdentifier::NonPrintable)
        );
    }

    #[test]
    fn test_user_length_limit() {
        assert!(escape_user(&"a".repeat(127)).is_ok());
        assert_eq!(
            escape_user(&"a".repeat(128)),
            Err(InvalidIdentifier::TooLong { len: 128 })
        );
    }

    #[test]
    fn test_user_escapes_like_identifier() {
        for name in ["!asd", "_$#.@-", "as.d", "a"] {
            assert_eq!(escape_user(name), escape_identifier(name));
        }
        assert_eq!(escape_user(""), Err(InvalidIdentifier::Empty));
        assert_eq!(escape_user("as\nda"), Err(InvalidIdentifier::NonPrintable));
    }

    #[test]
    fn test_literal_quotes() {
        assert_eq!(escape_literal(""), "''");
        assert_eq!(escape_literal("foo"), "'foo'");
        assert_eq!(escape_literal("o'foo"), "'o''foo'");
        assert_eq!(escape_literal("'ofoo"), "'''ofoo'");
        assert_eq!(escape_literal("'"), "''''");
    }

    #[test]
    fn test_literal_control_characters() {
        assert_eq!(escape_literal("foo\r\n"), "'foo' + CHAR(13) + CHAR(10)");
        assert_eq!(escape_literal("foo\nb'ar"), "'foo' + CHAR(10) + 'b''ar'");
        assert_eq!(escape_literal("\nfoo"), "CHAR(10) + 'foo'");
        assert_eq!(escape_literal("\t"), "CHAR(9)");
        assert_eq!(escape_literal("\u{7f}x"), "CHAR(127) + 'x'");
    }

    #[test]
    fn test_literal_non_ascii() {
        assert_eq!(escape_literal("caf\u{e9}"), "'caf' + NCHAR(233)");
        assert_eq!(escape_literal("\u{1F600}"), "NCHAR(55357) + NCHAR(56832)");
    }

    #[test]
    fn test_tokens_have_no_empty_segments() {
        let tokens: Vec<_> = SqlTokens::new("\u{1}ab\u{2}\u{3}c\u{4}").collect();
        let texts: Vec<_> = tokens.iter().map(|t| (t.text, t.printable)).collect();
        assert_eq!(
            texts,
            vec![
                ("\u{1}", false),
                ("ab", true),
                ("\u{2}", false),
                ("\u{3}", false),
                ("c", true),
                ("\u{4}", false),
            ]
        );
        assert!(tokens.iter().all(|t| !t.text.is_empty()));
        assert_eq!(SqlTokens::new("").count(), 0);
    }
}
