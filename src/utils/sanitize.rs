// single path-segment validation for request arguments

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const MAX_SEGMENT_BYTES: usize = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("missing required argument")]
    Missing,

    #[error("malformed argument")]
    Malformed,
}

fn illegal_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[/?<>\\:*|"\x00-\x1f\x80-\x9f]"#).expect("static regex"))
}

fn dots_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\.+$").expect("static regex"))
}

fn windows_reserved() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").expect("static regex")
    })
}

fn trailing_dots_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[. ]+$").expect("static regex"))
}

/// strip everything that is unsafe inside a single filesystem segment:
/// separators, shell/windows metacharacters, control characters, dot-only
/// names, reserved device names and trailing dots or spaces. the result is
/// truncated to 255 bytes on a character boundary.
pub fn clean_segment(input: &str) -> String {
    let cleaned = illegal_chars().replace_all(input, "");
    let cleaned = dots_only().replace(&cleaned, "");
    let cleaned = windows_reserved().replace(&cleaned, "");
    let cleaned = trailing_dots_spaces().replace(&cleaned, "");

    let mut end = cleaned.len().min(MAX_SEGMENT_BYTES);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    cleaned[..end].to_string()
}

/// validate one required segment. a token that cleaning would alter is
/// rejected rather than silently rewritten, so "a/b" never becomes "ab".
pub fn sanitize(token: &str) -> Result<String, SanitizeError> {
    if token.is_empty() {
        return Err(SanitizeError::Missing);
    }

    let cleaned = clean_segment(token);
    if cleaned.is_empty() || cleaned != token {
        return Err(SanitizeError::Malformed);
    }

    Ok(cleaned)
}

/// validate a fixed, ordered list of required arguments; the first missing
/// or malformed one short-circuits
pub fn require_all<const N: usize>(
    args: [Option<&str>; N],
) -> Result<[String; N], SanitizeError> {
    let mut cleaned = Vec::with_capacity(N);
    for arg in args {
        let arg = arg.filter(|a| !a.is_empty()).ok_or(SanitizeError::Missing)?;
        cleaned.push(sanitize(arg)?);
    }
    cleaned.try_into().map_err(|_| SanitizeError::Malformed)
}
