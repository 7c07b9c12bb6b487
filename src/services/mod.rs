//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones que involucran varios repositorios
//! o integraciones externas (proveedores de pago, envío de OTP).

pub mod booking_service;
pub mod notification_service;
pub mod otp_service;
pub mod payments;

pub use booking_service::BookingService;
pub use notification_service::{LogNotifier, OtpNotifier};
pub use otp_service::OtpService;
pub use payments::{PaymentGateway, PaymentGatewayRegistry};
