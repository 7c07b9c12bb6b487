//! Servicio de OTP
//!
//! Genera, guarda, envía y consume los códigos de activación de cuenta.

use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::user::{Otp, User};
use crate::repositories::OtpRepository;
use crate::services::notification_service::OtpNotifier;
use crate::utils::errors::{AppError, AppResult};

pub const OTP_LENGTH: usize = 6;

/// Código numérico de 6 dígitos, con ceros a la izquierda
pub fn generate_code() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", value, width = OTP_LENGTH)
}

pub struct OtpService {
    otps: Arc<dyn OtpRepository>,
    notifier: Arc<dyn OtpNotifier>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(otps: Arc<dyn OtpRepository>, notifier: Arc<dyn OtpNotifier>, ttl_minutes: i64) -> Self {
        Self {
            otps,
            notifier,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Crea un OTP nuevo y lo envía. Un fallo de envío se devuelve como 503.
    pub async fn issue(&self, user: &User) -> AppResult<()> {
        let otp = self
            .otps
            .create(Otp::new(user.id, generate_code(), self.ttl))
            .await?;

        if let Err(e) = self.notifier.send_otp(user, &otp.code).await {
            warn!("⚠️ No se pudo enviar el OTP a {}: {}", user.id, e);
            self.otps.delete(otp.id).await?;
            return Err(AppError::ServiceUnavailable(format!(
                "Could not send OTP via {}",
                user.verification_method
            )));
        }

        Ok(())
    }

    /// Consume el código si es válido y purga los códigos caducados del usuario
    pub async fn verify(&self, user_id: Uuid, code: &str) -> AppResult<()> {
        let now = Utc::now();
        let otp = self
            .otps
            .find(user_id, code)
            .await?
            .filter(|otp| otp.is_valid_at(now))
            .ok_or_else(|| AppError::BadRequest("Invalid or expired OTP".to_string()))?;

        self.otps.delete(otp.id).await?;
        let purged = self.otps.delete_expired(user_id, now).await?;
        if purged > 0 {
            info!("🧹 {} OTP caducados eliminados para {}", purged, user_id);
        }

        Ok(())
    }
}
