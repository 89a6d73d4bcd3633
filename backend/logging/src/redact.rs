//! Log Redaction Layer
//!
//! Scrubs API keys and bearer tokens, and collapses inline base64 image
//! payloads, before strings reach the logs.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[A-Za-z0-9_\-]{16,})|(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)").unwrap()
});
static DATA_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(data:[\w/+.\-]*;base64,)([A-Za-z0-9+/]{32,}=*)").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");

    DATA_URI_RE
        .replace_all(&redacted, |caps: &regex::Captures| {
            format!("{}[{} chars]", &caps[1], caps[2].len())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_keys_and_tokens() {
        let raw = "key sk-proj-abcdefghijklmnopqrstuvwxyz0123 sent with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("abcdefghijklmnop"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert_eq!(clean.matches("[REDACTED_TOKEN]").count(), 2);
    }

    #[test]
    fn collapses_image_payloads() {
        let payload = "A".repeat(400);
        let raw = format!("url=data:image/png;base64,{payload} end");
        assert_eq!(
            redact_sensitive_data(&raw),
            "url=data:image/png;base64,[400 chars] end"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        let raw = "Described 3 images with gpt-4o in 812ms";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
