//! # Credential Patterns Module
//!
//! Regex patterns and constants shared by the credential and inventory validators.

use lazy_static::lazy_static;
use regex::Regex;

pub const UID_PATTERN: &str = r"^[0-9]{8,20}$";
pub const PASSWORD_PATTERN: &str = r"^\S{6,64}$";
pub const DELIMITER_PATTERN: &str = r"[,\s]+";
// key=value pairs separated by ';', trailing ';' optional
pub const COOKIE_FORMAT_PATTERN: &str =
    r"^\s*[A-Za-z0-9_]+=[^;=\n\r]+(?:;\s*[A-Za-z0-9_]+=[^;=\n\r]+)*;?\s*$";
pub const FILENAME_PATTERN: &str = r"^[A-Za-z0-9_-]{1,50}$";
pub const COOKIE_UID_PATTERN: &str = r"(?:^|;)\s*c_user=(\d+)";
pub const COOKIE_XS_PATTERN: &str = r"(?:^|;)\s*xs=";

pub const MIN_COOKIE_LENGTH: usize = 20;

lazy_static! {
    pub static ref UID_REGEX: Regex = Regex::new(UID_PATTERN).expect("UID pattern should be valid");
    pub static ref PASSWORD_REGEX: Regex =
        Regex::new(PASSWORD_PATTERN).expect("Password pattern should be valid");
    pub static ref DELIMITER_REGEX: Regex =
        Regex::new(DELIMITER_PATTERN).expect("Delimiter pattern should be valid");
    pub static ref COOKIE_FORMAT_REGEX: Regex =
        Regex::new(COOKIE_FORMAT_PATTERN).expect("Cookie pattern should be valid");
    pub static ref FILENAME_REGEX: Regex =
        Regex::new(FILENAME_PATTERN).expect("Filename pattern should be valid");
    pub static ref COOKIE_UID_REGEX: Regex =
        Regex::new(COOKIE_UID_PATTERN).expect("Cookie UID pattern should be valid");
    pub static ref COOKIE_XS_REGEX: Regex =
        Regex::new(COOKIE_XS_PATTERN).expect("Cookie xs pattern should be valid");
}
