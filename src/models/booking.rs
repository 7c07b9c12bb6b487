//! Modelo de Booking
//!
//! Reservas de vehículos, su máquina de estados y el registro de auditoría
//! de cada cambio de estado (`booking_status_logs`).
//!
//! ```text
//! requested ──► confirmed ──► rented ──► driving ──► returned
//!     │
//!     └──────► canceled
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Requested,
    Canceled,
    Confirmed,
    Rented,
    Driving,
    Returned,
}

impl BookingStatus {
    /// Estados que bloquean el vehículo para otras reservas
    pub const ACTIVE: [BookingStatus; 4] = [
        BookingStatus::Requested,
        BookingStatus::Confirmed,
        BookingStatus::Rented,
        BookingStatus::Driving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rented => "rented",
            BookingStatus::Driving => "driving",
            BookingStatus::Returned => "returned",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Siguiente estado permitido desde el actual
    pub fn allowed_next(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Requested => &[BookingStatus::Confirmed, BookingStatus::Canceled],
            BookingStatus::Confirmed => &[BookingStatus::Rented],
            BookingStatus::Rented => &[BookingStatus::Driving],
            BookingStatus::Driving => &[BookingStatus::Returned],
            BookingStatus::Canceled | BookingStatus::Returned => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acciones que un actor puede ejecutar sobre una reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Cancel,
    Confirm,
    Deliver,
    StartDriving,
    Return,
}

impl BookingAction {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            BookingAction::Cancel => BookingStatus::Canceled,
            BookingAction::Confirm => BookingStatus::Confirmed,
            BookingAction::Deliver => BookingStatus::Rented,
            BookingAction::StartDriving => BookingStatus::Driving,
            BookingAction::Return => BookingStatus::Returned,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BookingAction::Cancel => "cancel booking",
            BookingAction::Confirm => "confirm booking",
            BookingAction::Deliver => "deliver car",
            BookingAction::StartDriving => "start driving",
            BookingAction::Return => "return car",
        }
    }
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: Uuid,
        vehicle_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        total_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            vehicle_id,
            start_time,
            end_time,
            total_price,
            status: BookingStatus::Requested,
            created_at: now,
            updated_at: now,
        }
    }

    /// Intervalos semiabiertos `[start, end)`: reservas consecutivas no se solapan
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time && end > self.start_time
    }
}

/// Precio total: horas (fraccionarias) por precio/hora, redondeado a 2 decimales
pub fn compute_total_price(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    price_per_hour: Decimal,
) -> Decimal {
    let millis = Decimal::from((end - start).num_milliseconds());
    let hours = millis / Decimal::from(3_600_000);
    (hours * price_per_hour).round_dp(2)
}

/// Entrada del registro de auditoría (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct BookingStatusLog {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl BookingStatusLog {
    pub fn new(booking_id: Uuid, status: BookingStatus, user_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            status,
            user_id,
            created_at: Utc::now(),
        }
    }
}
