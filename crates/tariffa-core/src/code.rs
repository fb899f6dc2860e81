//! Parsing of free-text regional code lists.
//!
//! Users type or dictate codes such as `"12345,23456 - 34567"`. The input is
//! normalised and split into tokens; each token is classified as a valid
//! regional code (exactly five decimal digits) or an invalid one.
//!
//! # Normalisation
//!
//! 1. Uppercase the whole input
//! 2. Remove every occurrence of the filler token `PAI`
//! 3. Treat `-` as a separator equivalent to `,`
//! 4. Split on runs of commas, trim each token, drop empty tokens

use std::sync::LazyLock;

use regex::Regex;

/// Filler token stripped from input before splitting.
pub const FILLER_TOKEN: &str = "PAI";

/// Length of a regional code.
pub const CODE_LEN: usize = 5;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",+").expect("separator pattern is valid"));

/// `\d` is Unicode-aware: any decimal digit, not only ASCII.
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("digit pattern is valid"));

/// A token extracted from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCode {
    /// Exactly five decimal digits.
    Valid(String),
    /// Any other shape, kept verbatim for the error line.
    Invalid(String),
}

impl ParsedCode {
    /// Classify a single raw token.
    pub fn classify(token: &str) -> Self {
        if is_regional_code(token) {
            ParsedCode::Valid(token.to_string())
        } else {
            ParsedCode::Invalid(token.to_string())
        }
    }
}

/// True iff `s` is exactly [`CODE_LEN`] decimal digits.
pub fn is_regional_code(s: &str) -> bool {
    s.chars().count() == CODE_LEN && DIGITS.is_match(s)
}

/// Apply the normalisation rules: uppercase, strip filler, `-` → `,`.
pub fn normalize_input(text: &str) -> String {
    text.to_uppercase()
        .replace(FILLER_TOKEN, "")
        .replace('-', ",")
}

/// Split normalised input into trimmed, non-empty raw tokens.
pub fn split_tokens(normalized: &str) -> Vec<&str> {
    // Empty tokens (from a trailing separator or a blank line) are dropped
    // rather than reported as unknown codes.
    SEPARATORS
        .split(normalized)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalise, split and classify free-text input, preserving input order.
pub fn parse_codes(text: &str) -> Vec<ParsedCode> {
    let normalized = normalize_input(text);
    split_tokens(&normalized)
        .into_iter()
        .map(ParsedCode::classify)
        .collect()
}
