//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL (ver `migrations/`).

pub mod booking;
pub mod payment;
pub mod user;
pub mod vehicle;
pub mod verification;
