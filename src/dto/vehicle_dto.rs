use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_license_plate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateManufacturerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

// Create vehicle request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    pub manufacturer_id: Uuid,
    #[validate(length(min = 1, max = 20), custom = "validate_license_plate")]
    pub license_plate: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    pub year: i16,
    #[validate(range(min = 1, message = "Passenger capacity must be at least 1"))]
    pub passenger_capacity: i16,
    pub price_per_hour: Decimal,
    pub is_available: Option<bool>,
    pub location: Option<serde_json::Value>,
}

// Update vehicle request (parcial)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub is_available: Option<bool>,
    #[validate(range(min = 1, message = "Passenger capacity must be at least 1"))]
    pub passenger_capacity: Option<i16>,
    pub location: Option<serde_json::Value>,
}
