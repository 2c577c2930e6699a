//! Hex helpers for logging raw serial traffic and for hex-encoded captures.

use std::fmt::Write;

/// Compact lowercase hex of at most `max` leading bytes, with an ellipsis when
/// the input was cut so raw dumps stay single-line.
pub fn hex_snippet(data: &[u8], max: usize) -> String {
    let shown = &data[..data.len().min(max)];
    let mut out = String::with_capacity(shown.len() * 2 + 3);
    for b in shown {
        let _ = write!(&mut out, "{:02x}", b);
    }
    if data.len() > max {
        out.push('…');
    }
    out
}

/// Space separated uppercase hex, the way the module datasheet prints frames.
pub fn hex_spaced(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse hex text into bytes. Whitespace, commas and `0x` prefixes are ignored
/// so both `01 00 0E` and `0x01,0x00,0x0e` are accepted.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let mut digits = String::with_capacity(text.len());
    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = digits.get(i..i + 2).ok_or_else(|| "non-ascii input".to_string())?;
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte '{}'", pair))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_truncates_with_ellipsis() {
        assert_eq!(hex_snippet(&[0x01, 0x0e, 0x02], 8), "010e02");
        assert_eq!(hex_snippet(&[0x01, 0x0e, 0x02], 2), "010e…");
    }

    #[test]
    fn spaced_uppercase() {
        assert_eq!(hex_spaced(&[0x01, 0x0E, 0xF3]), "01 0E F3");
    }

    #[test]
    fn parses_common_hex_spellings() {
        assert_eq!(parse_hex("01 00 0e").unwrap(), vec![0x01, 0x00, 0x0E]);
        assert_eq!(parse_hex("0x01,0x0E\n0XF3").unwrap(), vec![0x01, 0x0E, 0xF3]);
        assert_eq!(parse_hex("010EF3").unwrap(), vec![0x01, 0x0E, 0xF3]);
        assert!(parse_hex("0").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
