//! Hex command encoding and frame formatting
//!
//! Operator-entered command text is whitespace-separated base-16 tokens,
//! one byte each. Parsing is strict: an empty input is an explicit
//! "no command" and any malformed token fails the whole encode — nothing
//! half-parsed ever reaches a device.

use crate::error::{Result, SessionError};

/// Parse command text into a command frame.
///
/// Splits on runs of whitespace and parses each token as a base-16 byte.
/// Tokens may carry an optional `0x` prefix.
pub fn encode_command(text: &str) -> Result<Vec<u8>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(SessionError::NoCommand);
    }

    tokens
        .iter()
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u8::from_str_radix(digits, 16).map_err(|_| SessionError::InvalidHex {
                token: (*token).to_string(),
            })
        })
        .collect()
}

/// Format a frame as upper-case, space-separated hex pairs (`AA 0B 00`)
pub fn format_frame(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_basic_frame() {
        let frame = encode_command("00 C0 0A 00 00").unwrap();
        assert_eq!(frame, vec![0x00, 0xC0, 0x0A, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_mixed_case_and_prefix() {
        assert_eq!(encode_command("ff Ab 0x10").unwrap(), vec![0xFF, 0xAB, 0x10]);
    }

    #[test]
    fn test_encode_collapses_whitespace_runs() {
        assert_eq!(encode_command("  01\t 02  ").unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn test_encode_empty_is_no_command() {
        assert!(matches!(encode_command(""), Err(SessionError::NoCommand)));
        assert!(matches!(encode_command("   "), Err(SessionError::NoCommand)));
    }

    #[test]
    fn test_encode_rejects_malformed_token() {
        match encode_command("01 ZZ 02") {
            Err(SessionError::InvalidHex { token }) => assert_eq!(token, "ZZ"),
            other => panic!("expected InvalidHex, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_rejects_oversized_token() {
        assert!(matches!(
            encode_command("100"),
            Err(SessionError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_format_frame() {
        assert_eq!(format_frame(&[0xAA, 0x0B, 0x00]), "AA 0B 00");
        assert_eq!(format_frame(&[]), "");
    }
}
