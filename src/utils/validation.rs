//! Utilidades de validación
//!
//! Validadores personalizados para los requests (`#[validate(custom = ...)]`)
//! y normalización de identificadores de vehículo.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

lazy_static! {
    /// Matrícula ya normalizada: alfanumérica, con espacios o guiones internos
    pub static ref LICENSE_PLATE_REGEX: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9 -]{1,18}[A-Z0-9]$")
        .expect("license plate regex is valid");
    /// VIN: 11 a 17 caracteres alfanuméricos sin I, O ni Q
    pub static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{11,17}$")
        .expect("VIN regex is valid");
}

/// Mayúsculas y espacios colapsados
pub fn normalize_license_plate(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

pub fn normalize_vin(value: &str) -> String {
    value.trim().to_uppercase()
}

pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if LICENSE_PLATE_REGEX.is_match(&normalize_license_plate(value)) {
        Ok(())
    } else {
        let mut error = ValidationError::new("license_plate");
        error.message = Some("Invalid license plate format".into());
        Err(error)
    }
}

pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    if VIN_REGEX.is_match(&normalize_vin(value)) {
        Ok(())
    } else {
        let mut error = ValidationError::new("vin");
        error.message = Some("VIN must be 11-17 letters/digits (no I, O or Q)".into());
        Err(error)
    }
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_empty"));
    }
    Ok(())
}

/// Importe o cantidad: positivo y por debajo de un millón
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO && *value < Decimal::from(1_000_000) {
        return Ok(());
    }
    let mut error = ValidationError::new("amount");
    error.message = Some("Amount must be greater than 0 and less than 1000000".into());
    Err(error)
}

/// Recorta y descarta cadenas vacías en campos opcionales
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("KA 01 AB 1234").is_ok());
        assert!(validate_license_plate("ka01ab1234").is_ok());
        assert!(validate_license_plate("AB-123-CD").is_ok());
        assert!(validate_license_plate("A").is_err());
        assert!(validate_license_plate("-AB12").is_err());
        assert!(validate_license_plate(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_normalize_license_plate() {
        assert_eq!(normalize_license_plate("  ka 01   ab 1234 "), "KA 01 AB 1234");
    }

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("MA3EWDE1S00123456").is_ok());
        assert!(validate_vin("ma3ewde1s00123456").is_ok());
        assert!(validate_vin("MA3EWDE1S0O123456").is_err());
        assert!(validate_vin("SHORT").is_err());
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  ".to_string())), None);
        assert_eq!(clean_optional(Some(" Red ".to_string())), Some("Red".to_string()));
        assert!(validate_not_empty(" ").is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount(&Decimal::new(4250, 2)).is_ok());
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_positive_amount(&Decimal::new(-1, 0)).is_err());
        assert!(validate_positive_amount(&Decimal::from(1_000_000)).is_err());
    }
}
