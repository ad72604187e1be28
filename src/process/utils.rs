/// Trim whitespace; an empty result is treated as no value.
pub fn clean_str(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a ledger amount such as `"1,234,567"` or `"(500)"`.
///
/// A value wholly wrapped in parentheses is an accounting negative. Thousands
/// separators, spaces and any remaining parentheses are dropped before the
/// numeric parse. Empty text, a lone `-`, anything unparseable and non-finite
/// results all come back as `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let negative = raw.starts_with('(') && raw.ends_with(')');

    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '(' | ')'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    let value = cleaned.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}

/// Quantity uses the amount rules; only whole numbers are kept, anything else is 1.
pub fn parse_quantity(raw: &str) -> i64 {
    match parse_amount(raw) {
        Some(q) if q.fract() == 0.0 && q.abs() < i64::MAX as f64 => q as i64,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_str() {
        assert_eq!(clean_str("  장미 꽃바구니 "), Some("장미 꽃바구니".to_string()));
        assert_eq!(clean_str("   "), None);
        assert_eq!(clean_str(""), None);
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_amount("1,234,567"), Some(1234567.0));
        assert_eq!(parse_amount(" 85,000 "), Some(85000.0));
        assert_eq!(parse_amount("12 000"), Some(12000.0));
    }

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(parse_amount("(500)"), Some(-500.0));
        assert_eq!(parse_amount("(1,500)"), Some(-1500.0));
        // only a fully wrapped value is negative; stray parens are dropped
        assert_eq!(parse_amount("12(3)"), Some(123.0));
    }

    #[test]
    fn test_absent_amounts() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(" - "), None);
        assert_eq!(parse_amount("()"), None);
        assert_eq!(parse_amount("미정"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_amount("-3000"), Some(-3000.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount("0"), Some(0.0));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3.0"), 3);
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity("2.5"), 1);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("-"), 1);
        assert_eq!(parse_quantity("1,200"), 1200);
        assert_eq!(parse_quantity("(2)"), -2);
    }
}
