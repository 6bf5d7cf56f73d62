//! # Credential Parser
//!
//! Turns raw user text into a validated [`CredentialTriple`] or the first
//! [`ValidationError`] encountered.
//!
//! Two submission shapes are supported:
//!
//! - **Instant**: one message with at least three non-empty lines
//!   (UIDs, passwords, cookies). Lines past the third are ignored.
//! - **Manual**: three separate messages, each checked against the fields
//!   already accepted.
//!
//! Fields are always checked in the order UID → password → cookie → counts.
//!
//! ## Usage
//!
//! ```rust
//! use fbdocbot::credential_parser::parse_instant;
//!
//! let text = "12345678 87654321\nSecret1 Secret2\n\
//!             c_user=12345678;xs=abcdef; c_user=87654321;xs=ghijkl;";
//! let triple = parse_instant(text).unwrap();
//! assert_eq!(triple.len(), 2);
//! ```

use tracing::{debug, trace};

use crate::credential_patterns::{
    COOKIE_FORMAT_REGEX, DELIMITER_REGEX, MIN_COOKIE_LENGTH, PASSWORD_REGEX, UID_REGEX,
};
use crate::errors::{CookieRule, Field, ValidationError};

/// Minimum number of non-empty lines in an instant submission
pub const INSTANT_MIN_LINES: usize = 3;

/// One account: the row view of a single index across the triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub uid: String,
    pub password: String,
    pub cookie: String,
}

/// Validated UIDs, passwords and cookies of equal, non-zero length
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CredentialTriple {
    uids: Vec<String>,
    passwords: Vec<String>,
    cookies: Vec<String>,
}

impl CredentialTriple {
    /// Validate all three sequences and build the triple
    pub fn new(
        uids: Vec<String>,
        passwords: Vec<String>,
        cookies: Vec<String>,
    ) -> Result<Self, ValidationError> {
        validate_uids(&uids)?;
        validate_passwords(&passwords)?;
        validate_cookies(&cookies)?;
        check_counts(uids.len(), passwords.len(), cookies.len())?;
        Ok(Self {
            uids,
            passwords,
            cookies,
        })
    }

    pub fn uids(&self) -> &[String] {
        &self.uids
    }

    pub fn passwords(&self) -> &[String] {
        &self.passwords
    }

    pub fn cookies(&self) -> &[String] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// Always false for a constructed triple
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Records in submission order
    pub fn records(&self) -> Vec<CredentialRecord> {
        self.uids
            .iter()
            .zip(&self.passwords)
            .zip(&self.cookies)
            .map(|((uid, password), cookie)| CredentialRecord {
                uid: uid.clone(),
                password: password.clone(),
                cookie: cookie.clone(),
            })
            .collect()
    }
}

/// Split on runs of commas and whitespace, dropping empty tokens
pub fn tokenize(raw: &str) -> Vec<String> {
    DELIMITER_REGEX
        .split(raw.trim())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `raw` contains at least one comma or whitespace character
pub fn has_delimiter(raw: &str) -> bool {
    raw.chars().any(|c| c == ',' || c.is_whitespace())
}

fn first_invalid<'a>(
    values: &'a [String],
    is_valid: impl Fn(&str) -> bool,
) -> Option<(usize, &'a String)> {
    values
        .iter()
        .enumerate()
        .find(|(_, value)| !is_valid(value))
        .map(|(i, value)| (i + 1, value))
}

pub fn validate_uids(uids: &[String]) -> Result<(), ValidationError> {
    if uids.is_empty() {
        return Err(ValidationError::EmptyField { field: Field::Uid });
    }
    if let Some((index, value)) = first_invalid(uids, |uid| UID_REGEX.is_match(uid)) {
        return Err(ValidationError::InvalidFormat {
            field: Field::Uid,
            index,
            value: value.clone(),
            rule: None,
        });
    }
    Ok(())
}

pub fn validate_passwords(passwords: &[String]) -> Result<(), ValidationError> {
    if passwords.is_empty() {
        return Err(ValidationError::EmptyField {
            field: Field::Password,
        });
    }
    if let Some((index, value)) = first_invalid(passwords, |pwd| PASSWORD_REGEX.is_match(pwd)) {
        return Err(ValidationError::InvalidFormat {
            field: Field::Password,
            index,
            value: value.clone(),
            rule: None,
        });
    }
    Ok(())
}

/// Check one cookie against the rules in order and report the first one it breaks
pub fn validate_cookie(cookie: &str) -> Result<(), CookieRule> {
    let trimmed = cookie.trim();
    if trimmed.is_empty() {
        return Err(CookieRule::Empty);
    }
    if trimmed.chars().count() < MIN_COOKIE_LENGTH {
        return Err(CookieRule::TooShort);
    }
    if !trimmed.contains("c_user=") || !trimmed.contains("xs=") {
        return Err(CookieRule::MissingRequiredKeys);
    }
    if !COOKIE_FORMAT_REGEX.is_match(trimmed) {
        return Err(CookieRule::MalformedPairs);
    }
    Ok(())
}

pub fn validate_cookies(cookies: &[String]) -> Result<(), ValidationError> {
    if cookies.is_empty() {
        return Err(ValidationError::EmptyField {
            field: Field::Cookie,
        });
    }
    for (i, cookie) in cookies.iter().enumerate() {
        if let Err(rule) = validate_cookie(cookie) {
            trace!(index = i + 1, rule = ?rule, "Cookie rejected");
            return Err(ValidationError::InvalidFormat {
                field: Field::Cookie,
                index: i + 1,
                value: cookie.clone(),
                rule: Some(rule),
            });
        }
    }
    Ok(())
}

pub fn check_counts(uids: usize, passwords: usize, cookies: usize) -> Result<(), ValidationError> {
    if uids == passwords && passwords == cookies {
        Ok(())
    } else {
        Err(ValidationError::CountMismatch {
            uids,
            passwords,
            cookies: Some(cookies),
        })
    }
}

/// Line boundaries recognised in pasted text, including bare `\r` and Unicode separators
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0B}', '\u{0C}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Non-empty, trimmed lines of a message
pub fn non_empty_lines(text: &str) -> Vec<&str> {
    text.split(LINE_BREAKS)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Whether a free-form message looks like an instant payload
pub fn looks_like_instant_payload(text: &str) -> bool {
    non_empty_lines(text).len() >= INSTANT_MIN_LINES
}

/// Parse a single-message submission: line 1 UIDs, line 2 passwords, line 3 cookies
pub fn parse_instant(text: &str) -> Result<CredentialTriple, ValidationError> {
    let lines = non_empty_lines(text);
    if lines.len() < INSTANT_MIN_LINES {
        return Err(ValidationError::InsufficientLines { found: lines.len() });
    }
    if lines.len() > INSTANT_MIN_LINES {
        debug!(
            ignored_lines = lines.len() - INSTANT_MIN_LINES,
            "Ignoring lines past the cookie line"
        );
    }

    let triple = CredentialTriple::new(tokenize(lines[0]), tokenize(lines[1]), tokenize(lines[2]))?;
    debug!(records = triple.len(), "Instant submission parsed");
    Ok(triple)
}

/// Manual step 1: the UID list must carry a delimiter somewhere, even for a single UID
pub fn accept_manual_uids(raw: &str) -> Result<Vec<String>, ValidationError> {
    if !has_delimiter(raw) {
        return Err(ValidationError::MissingDelimiter);
    }
    let uids = tokenize(raw);
    validate_uids(&uids)?;
    Ok(uids)
}

/// Manual step 2: passwords must match the accepted UID count
pub fn accept_manual_passwords(raw: &str, uids: &[String]) -> Result<Vec<String>, ValidationError> {
    let passwords = tokenize(raw);
    validate_passwords(&passwords)?;
    if passwords.len() != uids.len() {
        return Err(ValidationError::CountMismatch {
            uids: uids.len(),
            passwords: passwords.len(),
            cookies: None,
        });
    }
    Ok(passwords)
}

/// Manual step 3: cookies complete the triple
pub fn accept_manual_cookies(
    raw: &str,
    uids: &[String],
    passwords: &[String],
) -> Result<CredentialTriple, ValidationError> {
    let cookies = tokenize(raw);
    validate_cookies(&cookies)?;
    check_counts(uids.len(), passwords.len(), cookies.len())?;
    Ok(CredentialTriple {
        uids: uids.to_vec(),
        passwords: passwords.to_vec(),
        cookies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_collapses_delimiter_runs() {
        assert_eq!(tokenize("a, b  c\nd"), strings(&["a", "b", "c", "d"]));
        assert_eq!(tokenize(" ,, \t "), Vec::<String>::new());
        assert_eq!(tokenize("x x"), strings(&["x", "x"]));
    }

    #[test]
    fn test_has_delimiter() {
        assert!(has_delimiter("12345678 "));
        assert!(has_delimiter("12345678,87654321"));
        assert!(!has_delimiter("1234567887654321"));
        assert!(!has_delimiter(""));
    }

    #[test]
    fn test_cookie_rule_order() {
        assert_eq!(validate_cookie("   "), Err(CookieRule::Empty));
        assert_eq!(validate_cookie("c_user=1;xs=a;"), Err(CookieRule::TooShort));
        assert_eq!(
            validate_cookie("datr=abcdefghijklmnopqrst;"),
            Err(CookieRule::MissingRequiredKeys)
        );
        assert_eq!(
            validate_cookie("c_user=1xs=2datr=abcdefgh"),
            Err(CookieRule::MalformedPairs)
        );
        assert_eq!(validate_cookie("c_user=12345678;xs=abcdef;"), Ok(()));
    }

    #[test]
    fn test_manual_passwords_count_mismatch() {
        let uids = strings(&["12345678", "87654321"]);
        let err = accept_manual_passwords("Secret1", &uids).unwrap_err();
        assert_eq!(
            err,
            ValidationError::CountMismatch {
                uids: 2,
                passwords: 1,
                cookies: None
            }
        );
    }
}
