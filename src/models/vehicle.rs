//! Modelo de Vehicle
//!
//! Este módulo contiene la flota: fabricantes, propietarios y vehículos (coches).
//! Mapea a las tablas `manufacturers`, `owners` y `vehicles`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Primer año de fabricación admitido en la flota
pub const MIN_VEHICLE_YEAR: i32 = 1978;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Manufacturer {
    pub id: Uuid,
    pub name: String,
    pub country: String,
}

/// Perfil de propietario, enlazado al usuario car_owner que publica vehículos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Owner {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub manufacturer_id: Uuid,
    pub license_plate: String,
    pub model: String,
    pub year: i16,
    pub passenger_capacity: i16,
    pub is_available: bool,
    pub price_per_hour: Decimal,
    pub location: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Baja lógica: las reservas y su historial siguen apuntando al vehículo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Filtros para el listado público de vehículos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilters {
    pub manufacturer_id: Option<Uuid>,
    pub max_price_per_hour: Option<Decimal>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl VehicleFilters {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Aplica los filtros a un vehículo disponible (usado por el backend en memoria)
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        vehicle.is_available
            && !vehicle.is_deleted()
            && self
                .manufacturer_id
                .map_or(true, |id| vehicle.manufacturer_id == id)
            && self
                .max_price_per_hour
                .map_or(true, |max| vehicle.price_per_hour <= max)
    }
}
