//! Hex transport encoding for ciphertext blobs.

use common::SealError;

/// Encode `bytes` as lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string of at most `max_bytes` decoded bytes.
///
/// Surrounding whitespace is ignored. The length bound is checked before
/// any conversion takes place.
///
/// # Errors
///
/// Returns [`SealError::MalformedInput`] if the text is longer than
/// `2 * max_bytes` characters, has odd length, or contains a non-hex
/// character.
pub fn decode_hex(text: &str, max_bytes: usize) -> Result<Vec<u8>, SealError> {
    let text = text.trim();
    if text.len() > max_bytes.saturating_mul(2) {
        return Err(SealError::MalformedInput(format!(
            "hex input is {} characters, limit is {}",
            text.len(),
            max_bytes.saturating_mul(2)
        )));
    }
    hex::decode(text).map_err(|e| match e {
        hex::FromHexError::OddLength => SealError::MalformedInput("odd-length hex".into()),
        hex::FromHexError::InvalidHexCharacter { c, index } => SealError::MalformedInput(
            format!("invalid hex character {c:?} at position {index}"),
        ),
        other => SealError::MalformedInput(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_lowercase() {
        assert_eq!(encode_hex(&[0x00, 0xAB, 0xff]), "00abff");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn decodes_either_case_and_trims() {
        assert_eq!(decode_hex(" 00AbfF\n", 8).unwrap(), vec![0x00, 0xab, 0xff]);
    }

    #[test]
    fn rejects_odd_length() {
        assert!(matches!(
            decode_hex("abc", 8),
            Err(SealError::MalformedInput(_))
        ));
    }

    #[test]
    fn rejects_non_hex_character() {
        let err = decode_hex("zz", 8).unwrap_err();
        assert!(matches!(err, SealError::MalformedInput(ref m) if m.contains("'z'")));
    }

    #[test]
    fn rejects_overlong_input_instead_of_truncating() {
        assert!(decode_hex("0011", 2).is_ok());
        assert!(matches!(
            decode_hex("001122", 2),
            Err(SealError::MalformedInput(_))
        ));
    }

    proptest! {
        #[test]
        fn hex_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let text = encode_hex(&bytes);
            prop_assert_eq!(decode_hex(&text, bytes.len()).unwrap(), bytes);
        }

        #[test]
        fn odd_length_never_decodes(s in "[0-9a-f]{0,63}") {
            prop_assume!(s.len() % 2 == 1);
            prop_assert!(decode_hex(&s, 64).is_err());
        }
    }
}
