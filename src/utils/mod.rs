//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! cifrado de documentos y JWT.

pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod validation;
