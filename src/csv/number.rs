/// Parses numeric cell text, returning `None` unless the value is finite.
///
/// Accepts decimal and exponent notation plus `0x`, `0o` and `0b`
/// prefixed integers. Empty text is not a number.
pub fn parse_finite(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let prefixed = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| text.strip_prefix(prefix).map(|digits| (digits, radix)));
    if let Some((digits, radix)) = prefixed {
        return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }

    // f64::from_str also accepts "inf" and "NaN".
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }

    text.parse::<f64>().ok().filter(|n| n.is_finite())
}
