//! Message identifiers as handed out by the mailbox.

use std::fmt;

/// Opaque, protocol-assigned message identifier.
///
/// For IMAP this is a sequence number. It is only unique within one
/// session and must not be persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a raw identifier token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A form of the identifier that is safe to embed in a file name.
    ///
    /// Anything outside `[A-Za-z0-9._-]` becomes `_`.
    pub fn file_safe(&self) -> String {
        let safe: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if safe.is_empty() || safe.chars().all(|c| c == '.') {
            "unknown".to_string()
        } else {
            safe
        }
    }
}

impl From<u32> for MessageId {
    fn from(seq: u32) -> Self {
        Self(seq.to_string())
    }
}

impl From<&str> for MessageId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for MessageId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_raw() {
        assert_eq!(MessageId::from(17u32).to_string(), "17");
        assert_eq!(MessageId::from("abc").as_str(), "abc");
    }

    #[test]
    fn test_file_safe() {
        assert_eq!(MessageId::from("42").file_safe(), "42");
        assert_eq!(MessageId::from("a/b c").file_safe(), "a_b_c");
        assert_eq!(MessageId::from("..").file_safe(), "unknown");
        assert_eq!(MessageId::from("").file_safe(), "unknown");
    }
}
