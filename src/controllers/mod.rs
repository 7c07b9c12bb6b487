//! Controllers
//!
//! Lógica de cada recurso de la API. Las rutas extraen la request y delegan aquí.

pub mod auth_controller;
pub mod booking_controller;
pub mod payment_controller;
pub mod vehicle_controller;
pub mod verification_controller;

pub use auth_controller::AuthController;
pub use booking_controller::BookingController;
pub use payment_controller::PaymentController;
pub use vehicle_controller::VehicleController;
pub use verification_controller::VerificationController;
