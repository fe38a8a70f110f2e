//! Field validators shared by service inputs (`#[validate(custom = "...")]`).

use chrono::NaiveTime;
use rust_decimal::Decimal;
use validator::ValidationError;

pub fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Value must be greater than 0".into());
        Err(err)
    }
}

pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("Value must not be negative".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("Currency must be a 3-letter ISO-4217 code".into());
        Err(err)
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Opening must be strictly before closing
pub fn check_business_hours(opening: NaiveTime, closing: NaiveTime) -> Result<(), String> {
    if opening < closing {
        Ok(())
    } else {
        Err(format!(
            "Opening time {} must be before closing time {}",
            opening, closing
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_bounds() {
        assert!(validate_positive_decimal(&dec!(0.01)).is_ok());
        assert!(validate_positive_decimal(&dec!(0)).is_err());
        assert!(validate_non_negative_decimal(&dec!(0)).is_ok());
        assert!(validate_non_negative_decimal(&dec!(-1)).is_err());
    }

    #[test]
    fn currency_codes() {
        assert!(validate_currency("KES").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("EURO").is_err());
    }

    #[test]
    fn business_hours_must_be_ordered() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(check_business_hours(nine, five).is_ok());
        assert!(check_business_hours(five, nine).is_err());
        assert!(check_business_hours(nine, nine).is_err());
    }
}
