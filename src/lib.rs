//! Drive Rental API
//!
//! Backend de un marketplace de alquiler de coches: cuentas con OTP,
//! verificación de identidad, flota, ciclo de vida de reservas y pagos
//! con varios proveedores.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
