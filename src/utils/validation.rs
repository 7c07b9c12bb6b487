//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! usadas por los DTOs (`#[validate(custom = ...)]`) y los controllers.

use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

use crate::models::vehicle::MIN_VEHICLE_YEAR;

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{8,18}[0-9]$").unwrap();
    static ref LICENSE_PLATE_REGEX: Regex = Regex::new(r"^[A-Z0-9](?:[A-Z0-9 \-]{0,18}[A-Z0-9])?$").unwrap();
    static ref OTP_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Validar formato de teléfono: 10 a 15 dígitos, con prefijo '+' opcional
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_REGEX.is_match(value) || !(10..=15).contains(&digits) {
        return Err(error("phone", "Phone number must contain 10 to 15 digits"));
    }
    Ok(())
}

/// Validar matrícula (mayúsculas, dígitos, espacios y guiones; máximo 20)
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > 20 || !LICENSE_PLATE_REGEX.is_match(value) {
        return Err(error("license_plate", "License plate must be 1-20 uppercase letters or digits"));
    }
    Ok(())
}

/// Validar código OTP de 6 dígitos
pub fn validate_otp_code(value: &str) -> Result<(), ValidationError> {
    if !OTP_REGEX.is_match(value) {
        return Err(error("otp", "OTP must be 6 digits"));
    }
    Ok(())
}

/// Validar año de fabricación entre 1978 y el año actual
pub fn validate_vehicle_year(year: i16) -> Result<(), ValidationError> {
    let current_year = Utc::now().year();
    if (year as i32) < MIN_VEHICLE_YEAR || (year as i32) > current_year {
        return Err(error("year", "Year must be between 1978 and the current year"));
    }
    Ok(())
}

/// Validar precio por hora: positivo y dentro de NUMERIC(6, 2)
pub fn validate_price_per_hour(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO || *price > Decimal::new(999_999, 2) || price.normalize().scale() > 2 {
        return Err(error("price_per_hour", "Price per hour must be between 0.01 and 9999.99"));
    }
    Ok(())
}

/// Mayor importe representable en NUMERIC(10, 2)
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Validar importe positivo con como máximo 2 decimales
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return Err(error("amount", "Amount must be positive with at most 2 decimal places"));
    }
    if *amount > max_amount() {
        return Err(error("amount", "Amount must not exceed 99999999.99"));
    }
    Ok(())
}

/// Validar que una ventana temporal no esté vacía
pub fn validate_time_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(error("end_time", "end_time must be after start_time"));
    }
    Ok(())
}

/// Normalizar email (trim + minúsculas)
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+639171234567").is_ok());
        assert!(validate_phone("0917 123 4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+63917abc4567").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("ABC1234").is_ok());
        assert!(validate_license_plate("NCR-4521").is_ok());
        assert!(validate_license_plate("abc1234").is_err());
        assert!(validate_license_plate("").is_err());
        assert!(validate_license_plate("ABCDEFGHIJKLMNOPQRSTU").is_err());
    }

    #[test]
    fn test_license_plate_must_end_alphanumeric() {
        assert!(validate_license_plate("A").is_ok());
        assert!(validate_license_plate("AB-12").is_ok());
        assert!(validate_license_plate("ABC 123").is_ok());
        assert!(validate_license_plate("AB-").is_err());
        assert!(validate_license_plate("AB ").is_err());
        assert!(validate_license_plate("A-").is_err());
    }

    #[test]
    fn test_validate_otp_code() {
        assert!(validate_otp_code("012345").is_ok());
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12345a").is_err());
    }

    #[test]
    fn test_validate_vehicle_year() {
        assert!(validate_vehicle_year(1978).is_ok());
        assert!(validate_vehicle_year(1977).is_err());
        assert!(validate_vehicle_year((Utc::now().year() + 1) as i16).is_err());
    }

    #[test]
    fn test_validate_prices() {
        assert!(validate_price_per_hour(&dec!(10.00)).is_ok());
        assert!(validate_price_per_hour(&dec!(9999.99)).is_ok());
        assert!(validate_price_per_hour(&dec!(10000)).is_err());
        assert!(validate_price_per_hour(&dec!(0)).is_err());
        assert!(validate_price_per_hour(&dec!(1.005)).is_err());

        assert!(validate_amount(&dec!(240.00)).is_ok());
        assert!(validate_amount(&dec!(-1)).is_err());
        assert!(validate_amount(&dec!(1.234)).is_err());
        assert!(validate_amount(&dec!(99999999.99)).is_ok());
        assert!(validate_amount(&dec!(100000000)).is_err());
    }

    #[test]
    fn test_validate_time_window() {
        let now = Utc::now();
        assert!(validate_time_window(now, now + Duration::hours(1)).is_ok());
        assert!(validate_time_window(now, now).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Juan@Mail.COM "), "juan@mail.com");
    }
}
