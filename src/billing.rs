//! Simulated payment handling. Card details are checked for shape only and
//! never processed; a well-formed card always "succeeds". The tier change
//! itself is a pure transition applied by the caller.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub number: String,
    /// MM/YY
    pub expiry: String,
    pub cvv: String,
}

lazy_static! {
    static ref CARD_NUMBER: Regex = Regex::new(r"^\d{12,19}$").unwrap();
    static ref CARD_EXPIRY: Regex = Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").unwrap();
    static ref CARD_CVV: Regex = Regex::new(r"^\d{3,4}$").unwrap();
}

/// Syntactic validation only. Spaces and dashes in the number are ignored.
pub fn validate_card(card: &CardDetails) -> Result<(), AppError> {
    let number: String = card
        .number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    if !CARD_NUMBER.is_match(&number) {
        return Err(AppError::BadRequest("Malformed card number".into()));
    }
    if !CARD_EXPIRY.is_match(&card.expiry) {
        return Err(AppError::BadRequest("Malformed card expiry".into()));
    }
    if !CARD_CVV.is_match(&card.cvv) {
        return Err(AppError::BadRequest("Malformed card CVV".into()));
    }
    Ok(())
}

/// Masked description recorded on the payment row.
pub fn masked_method(card: &CardDetails) -> String {
    let digits: String = card.number.chars().filter(|c| c.is_ascii_digit()).collect();
    let last4 = if digits.len() >= 4 {
        &digits[digits.len() - 4..]
    } else {
        "0000"
    };
    format!("Simulated Card **** {}", last4)
}

pub fn transaction_id() -> String {
    format!("SIM-TXN-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str, cvv: &str) -> CardDetails {
        CardDetails {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }

    #[test]
    fn accepts_well_formed_card() {
        assert!(validate_card(&card("4242424242424242", "12/30", "123")).is_ok());
    }

    #[test]
    fn accepts_spaced_card_number() {
        assert!(validate_card(&card("4242 4242 4242 4242", "01/27", "4321")).is_ok());
    }

    #[test]
    fn rejects_short_number() {
        assert!(validate_card(&card("1234", "12/30", "123")).is_err());
    }

    #[test]
    fn rejects_non_numeric_number() {
        assert!(validate_card(&card("4242abcd42424242", "12/30", "123")).is_err());
    }

    #[test]
    fn rejects_bad_expiry_month() {
        assert!(validate_card(&card("4242424242424242", "13/30", "123")).is_err());
        assert!(validate_card(&card("4242424242424242", "2030-12", "123")).is_err());
    }

    #[test]
    fn rejects_bad_cvv() {
        assert!(validate_card(&card("4242424242424242", "12/30", "12")).is_err());
    }

    #[test]
    fn masks_all_but_last_four() {
        let method = masked_method(&card("4242 4242 4242 4242", "12/30", "123"));
        assert_eq!(method, "Simulated Card **** 4242");
        assert!(!method.contains("4242 4242"));
    }

    #[test]
    fn transaction_ids_are_unique() {
        assert_ne!(transaction_id(), transaction_id());
    }
}
