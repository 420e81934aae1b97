//! Validation and normalization utilities for the Top-Up Retail Platform

use rust_decimal::Decimal;

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate that a monetary amount is strictly positive
pub fn validate_positive_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be positive");
    }
    Ok(())
}

/// Validate a purchase quantity
pub fn validate_quantity(quantity: u32) -> Result<(), &'static str> {
    if quantity == 0 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

/// Returns true when a value looks like spreadsheet scientific notation
/// (e.g. `1.23E+10` produced by Excel for long PIN numbers).
pub fn is_scientific_notation(value: &str) -> bool {
    let mut chars = value.chars();
    let has_exponent = value.contains(['e', 'E']);
    let numeric_shape = chars.all(|c| {
        c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')
    });
    has_exponent && numeric_shape && value.chars().any(|c| c.is_ascii_digit())
}

/// Restore an identifier rendered in scientific notation to its full
/// decimal digit string. PINs and ICCIDs are identifiers, so the
/// conversion must be exact; values that cannot be parsed exactly are
/// returned unchanged.
///
/// `"1.23E+10"` becomes `"12300000000"`.
pub fn normalize_identifier(value: &str) -> String {
    let trimmed = value.trim();
    if !is_scientific_notation(trimmed) {
        return trimmed.to_string();
    }
    match Decimal::from_scientific(trimmed) {
        Ok(d) => d.normalize().to_string(),
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("shop@example.com").is_ok());
        assert!(validate_email("owner.name@retailer.co.uk").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(Decimal::from(10)).is_ok());
        assert!(validate_positive_amount(Decimal::ZERO).is_err());
        assert!(validate_positive_amount(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
    }

    #[test]
    fn test_is_scientific_notation() {
        assert!(is_scientific_notation("1.23E+10"));
        assert!(is_scientific_notation("8.9e12"));
        assert!(!is_scientific_notation("12300000000"));
        assert!(!is_scientific_notation("SER-00123"));
        // Contains an 'e' but is not numeric
        assert!(!is_scientific_notation("esim"));
    }

    #[test]
    fn test_normalize_identifier_scientific() {
        assert_eq!(normalize_identifier("1.23E+10"), "12300000000");
        assert_eq!(normalize_identifier("8.9E+12"), "8900000000000");
    }

    #[test]
    fn test_normalize_identifier_passthrough() {
        assert_eq!(normalize_identifier("12300000000"), "12300000000");
        assert_eq!(normalize_identifier("  SER-00123 "), "SER-00123");
    }

    #[test]
    fn test_normalize_identifier_exactness() {
        // Exact decimal parsing, never a lossy float round-trip
        let restored = normalize_identifier("1.234567891234567E+15");
        assert_eq!(restored, "1234567891234567");
        assert_eq!(
            Decimal::from_str(&restored).unwrap(),
            Decimal::from_str("1234567891234567").unwrap()
        );
    }
}
