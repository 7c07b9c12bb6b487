//! Envío de OTP
//!
//! El canal real (SMS o email) queda detrás de `OtpNotifier`.
//! `LogNotifier` es la implementación por defecto y solo deja el código en los logs.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::models::user::{User, VerificationMethod};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait OtpNotifier: Send + Sync {
    /// Entrega el código al usuario por su método de verificación
    async fn send_otp(&self, user: &User, code: &str) -> AppResult<()>;
}

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl OtpNotifier for LogNotifier {
    async fn send_otp(&self, user: &User, code: &str) -> AppResult<()> {
        let destination = match user.verification_method {
            VerificationMethod::Sms => user.phone_number.as_deref(),
            VerificationMethod::Email => user.email.as_deref(),
        }
        .unwrap_or("<sin contacto>");

        info!("📨 OTP enviado vía {} a {}", user.verification_method, destination);
        debug!("🔑 Código OTP para {}: {}", user.id, code);
        Ok(())
    }
}
