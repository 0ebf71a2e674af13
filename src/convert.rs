//! Small conversions used when interpreting dissected records

use crate::error::ConversionError;

/// Decode a base64 string and return the decoded bytes hex-encoded.
///
/// dir-spec strips the trailing `=` padding from base64 values, so missing
/// padding is restored before decoding.
pub fn base64_to_hex(encoded: &str) -> Result<String, ConversionError> {
    let mut padded = encoded.to_string();
    let rem = padded.len() % 4;
    if rem != 0 {
        padded.push_str(&"=".repeat(4 - rem));
    }

    let decoded = base64::decode(&padded)?;
    Ok(hex::encode(decoded))
}

/// Parse a decimal port number.
///
/// Anything that is not a valid 16-bit unsigned number yields 0.
pub fn string_to_port(port: &str) -> u16 {
    // from_str_radix would accept a leading '+'
    if !port.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    u16::from_str_radix(port, 10).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_unpadded() {
        // relay identity as it appears in an "r" line
        assert_eq!(
            base64_to_hex("AAoQ1DAR6kkoo19hBAX5K0QztNw").unwrap(),
            "000a10d43011ea4928a35f610405f92b4433b4dc"
        );
        assert_eq!(base64_to_hex("Zm9vYg").unwrap(), "666f6f62");
        assert_eq!(base64_to_hex("Zm9vYg==").unwrap(), "666f6f62");
        assert_eq!(base64_to_hex("").unwrap(), "");
    }

    #[test]
    fn base64_invalid() {
        assert!(matches!(
            base64_to_hex("Zm9v!g"),
            Err(ConversionError::InvalidBase64(_))
        ));
    }

    #[test]
    fn port() {
        assert_eq!(string_to_port("80"), 80);
        assert_eq!(string_to_port("0"), 0);
        assert_eq!(string_to_port("65535"), 65535);
        assert_eq!(string_to_port("70000"), 0);
        assert_eq!(string_to_port("abc"), 0);
        assert_eq!(string_to_port(""), 0);
        assert_eq!(string_to_port("-1"), 0);
        assert_eq!(string_to_port("+80"), 0);
    }
}
