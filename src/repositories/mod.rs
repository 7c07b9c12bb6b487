//! Repositorios
//!
//! Cada repositorio define un trait de persistencia con su implementación
//! PostgreSQL (`Pg*`). `in_memory` contiene las implementaciones en memoria.

pub mod booking_repository;
pub mod in_memory;
pub mod payment_repository;
pub mod user_repository;
pub mod vehicle_repository;
pub mod verification_repository;

pub use booking_repository::{BookingRepository, PgBookingRepository};
pub use payment_repository::{PaymentRepository, PgPaymentRepository};
pub use user_repository::{OtpRepository, PgOtpRepository, PgUserRepository, UserRepository};
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};
pub use verification_repository::{PgVerificationRepository, VerificationRepository};
