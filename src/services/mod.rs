// Shop catalogue and stock
pub mod products;

// Money in and out
pub mod debts;
pub mod expenses;
pub mod sales;

// Read-side aggregates
pub mod dashboard;
pub mod reports;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Rejects negative amounts
pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects zero and negative amounts
pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects text that is empty once surrounding whitespace is trimmed
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Trims a free-text field, mapping blank input to `None`
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_validators() {
        assert!(validate_non_negative(&dec!(0)).is_ok());
        assert!(validate_non_negative(&dec!(-0.01)).is_err());
        assert!(validate_positive(&dec!(0.001)).is_ok());
        assert!(validate_positive(&dec!(0)).is_err());
    }

    #[test]
    fn whitespace_only_text_is_blank() {
        assert!(validate_not_blank("Sukari").is_ok());
        assert!(validate_not_blank(" \t ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" Maziwa ".into())).as_deref(), Some("Maziwa"));
    }
}
