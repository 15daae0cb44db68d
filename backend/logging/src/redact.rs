//! Log Redaction
//!
//! Masks ID numbers, mobile numbers and access tokens before they reach a
//! log line.

use regex::Regex;
use std::sync::LazyLock;

static ID_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}[ -]?\d{4}[ -]?(\d{4})\b").unwrap());
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+91[\s-]?)?\b[6-9]\d{4}[\s-]?\d{5}\b").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // ID numbers first so their digits are not mistaken for phone numbers.
    let redacted = ID_NUMBER_RE.replace_all(input, "XXXX XXXX $1");
    let redacted = MOBILE_RE.replace_all(&redacted, "[REDACTED_PHONE]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}

/// `234123412346` -> `XXXX XXXX 2346`. Anything else is fully masked.
pub fn mask_id_number(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 12 {
        format!("XXXX XXXX {}", &digits[8..])
    } else {
        "[REDACTED_ID]".to_string()
    }
}
