//! # Error Types Module
//!
//! Structured rejection reasons produced by the credential parser and the
//! spreadsheet assembler. Every variant is recoverable: the bot shell turns
//! it into a single localized message and re-prompts or aborts.

use std::fmt;
use thiserror::Error;

/// The three credential columns, in their fixed validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Uid,
    Password,
    Cookie,
}

impl Field {
    /// Column header as it appears in the rendered sheet
    pub const fn header(self) -> &'static str {
        match self {
            Field::Uid => "UID",
            Field::Password => "PASSWORD",
            Field::Cookie => "COOKIE",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Which cookie rule rejected a cookie token, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieRule {
    /// Blank after trimming
    Empty,
    /// Shorter than 20 characters
    TooShort,
    /// Missing `c_user=` or `xs=`
    MissingRequiredKeys,
    /// Not a `key=value;key=value;` sequence
    MalformedPairs,
}

impl fmt::Display for CookieRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CookieRule::Empty => "cookie is empty",
            CookieRule::TooShort => "cookie is shorter than 20 characters",
            CookieRule::MissingRequiredKeys => "cookie must contain c_user= and xs=",
            CookieRule::MalformedPairs => "cookie must be key=value;key=value;",
        };
        f.write_str(reason)
    }
}

/// First rule violated by a submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} list is empty")]
    EmptyField { field: Field },

    /// `index` is 1-based
    #[error("{field} #{index} is invalid: {value}")]
    InvalidFormat {
        field: Field,
        index: usize,
        value: String,
        rule: Option<CookieRule>,
    },

    /// `cookies` is `None` when the mismatch is caught before any cookie was submitted
    #[error("counts differ: {}", count_summary(.uids, .passwords, .cookies))]
    CountMismatch {
        uids: usize,
        passwords: usize,
        cookies: Option<usize>,
    },

    #[error("instant input needs at least 3 non-empty lines, found {found}")]
    InsufficientLines { found: usize },

    #[error("UID input must use a comma, space or newline delimiter")]
    MissingDelimiter,

    #[error("file name may only contain letters, digits, '_' or '-' (max 50)")]
    InvalidFilename,
}

fn count_summary(uids: &usize, passwords: &usize, cookies: &Option<usize>) -> String {
    match cookies {
        Some(cookies) => format!("UID={uids}, PASSWORD={passwords}, COOKIE={cookies}"),
        None => format!("UID={uids}, PASSWORD={passwords}"),
    }
}

/// Assembler failure; no partial buffer is ever handed out
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render spreadsheet: {0}")]
    RenderFailure(String),
}

impl From<rust_xlsxwriter::XlsxError> for RenderError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        RenderError::RenderFailure(err.to_string())
    }
}
