//! Text helpers: decoding byte strings and turning arbitrary text into names
//! that are safe to use as a single path component.

use ostrich_core::{OstrichError, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

const MAX_PATH_NAME_LEN: usize = 255;

/// How to handle invalid UTF-8 when decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeErrors {
    #[default]
    Strict,
    /// Substitute U+FFFD for invalid sequences
    Replace,
}

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_=.-]").expect("valid safe-path pattern"))
}

/// Decode UTF-8 bytes as text.
pub fn as_text(bytes: &[u8], errors: DecodeErrors) -> Result<Cow<'_, str>> {
    match errors {
        DecodeErrors::Strict => Ok(Cow::Borrowed(std::str::from_utf8(bytes)?)),
        DecodeErrors::Replace => Ok(String::from_utf8_lossy(bytes)),
    }
}

/// Convert `in_str` to a string usable as a file or directory name.
///
/// The text is NFKD-normalized and trimmed, then every character outside
/// `[a-zA-Z0-9-_=.]` becomes `_` and the result is cut to 255 characters.
/// Many inputs map to the same output; the name is not checked against the
/// filesystem.
///
/// # Errors
/// `InvalidArgument` when nothing but dots (or nothing at all) is left.
pub fn get_safe_path(in_str: &str) -> Result<String> {
    let normalized: String = in_str.nfkd().collect();
    let safe = unsafe_chars().replace_all(normalized.trim(), "_");

    if safe.trim_matches('.').is_empty() {
        return Err(OstrichError::InvalidArgument(format!(
            "no usable path characters in {:?}",
            in_str
        )));
    }

    Ok(safe.chars().take(MAX_PATH_NAME_LEN).collect())
}

/// [`get_safe_path`] for UTF-8 encoded bytes.
pub fn get_safe_path_bytes(bytes: &[u8]) -> Result<String> {
    get_safe_path(&as_text(bytes, DecodeErrors::Strict)?)
}
