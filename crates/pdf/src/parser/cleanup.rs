use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up the text of one extracted span.
///
/// Applies NFC normalization, expands ligatures, drops replacement and
/// control characters, collapses whitespace runs to a single space and
/// trims. An empty result means the span carries no text.
pub fn cleanup_span_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    for (lig, replacement) in LIGATURES {
        if result.contains(lig) {
            result = result.replace(lig, replacement);
        }
    }

    result.retain(|c| c != '\u{FFFD}' && (!c.is_control() || c.is_whitespace()));

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_spaces.replace_all(result.trim(), " ").into_owned()
}
