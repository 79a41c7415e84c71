// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Message envelope: `"<Sender>: <text>"`.
//!
//! The first `:` ends the sender. The text starts two characters after it,
//! whatever the character following the colon is.

use std::fmt;

use crate::error::EnvelopeError;

/// A decoded chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    pub text: String,
}

impl Envelope {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Encode without building an `Envelope` first.
    pub fn encode(sender: &str, text: &str) -> String {
        format!("{}: {}", sender, text)
    }

    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let colon = raw.find(':').ok_or(EnvelopeError::MissingDelimiter)?;
        let sender = &raw[..colon];

        // Skip the colon and exactly one following character.
        let mut rest = raw[colon..].chars();
        rest.next();
        if rest.next().is_none() {
            return Err(EnvelopeError::ContentOutOfRange {
                colon: sender.chars().count(),
                len: raw.chars().count(),
            });
        }

        Ok(Self::new(sender, rest.as_str()))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inverts_encode() {
        let cases = [
            ("Chat1", "hello"),
            ("Chat2", ""),
            ("Алиса", "привет: как дела?"),
            ("B", "  leading spaces"),
        ];
        for (sender, text) in cases {
            let parsed = Envelope::parse(&Envelope::encode(sender, text)).unwrap();
            assert_eq!(parsed, Envelope::new(sender, text));
        }
    }

    #[test]
    fn test_first_colon_delimits() {
        let env = Envelope::parse("A: time is 12:30").unwrap();
        assert_eq!(env.sender, "A");
        assert_eq!(env.text, "time is 12:30");
    }

    #[test]
    fn test_missing_delimiter() {
        assert_eq!(
            Envelope::parse("no delimiter here"),
            Err(EnvelopeError::MissingDelimiter)
        );
    }

    #[test]
    fn test_content_out_of_range() {
        assert_eq!(
            Envelope::parse("A:"),
            Err(EnvelopeError::ContentOutOfRange { colon: 1, len: 2 })
        );
    }

    #[test]
    fn test_second_char_is_skipped_even_if_not_space() {
        // Matches the writer contract: content starts two chars after the colon
        let env = Envelope::parse("A:xyz").unwrap();
        assert_eq!(env.text, "yz");

        let env = Envelope::parse("A:ж").unwrap();
        assert_eq!(env.text, "");
    }

    #[test]
    fn test_display_matches_encode() {
        let env = Envelope::new("Chat1", "hi");
        assert_eq!(env.to_string(), Envelope::encode("Chat1", "hi"));
    }
}
