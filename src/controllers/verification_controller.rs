//! Controller de verificación de identidad
//!
//! Subida en tres pasos (selfie, documento, selfie con documento) y revisión por staff.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::verification_dto::{ReviewRequest, UploadDocumentRequest, VerificationStatusResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::verification::{DocumentKind, VerificationStatus};
use crate::repositories::{UserRepository, VerificationRepository};
use crate::state::AppState;
use crate::utils::crypto;
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

pub struct VerificationController {
    verifications: Arc<dyn VerificationRepository>,
    users: Arc<dyn UserRepository>,
    max_document_bytes: usize,
}

/// Acepta base64 plano o una data URL (`data:image/jpeg;base64,...`)
fn decode_image(raw: &str, max_bytes: usize) -> AppResult<Vec<u8>> {
    let payload = match raw.split_once("base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("Image is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "Image exceeds the maximum size of {} bytes",
            max_bytes
        )));
    }
    Ok(bytes)
}

impl VerificationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            verifications: state.verifications.clone(),
            users: state.users.clone(),
            max_document_bytes: state.config.max_document_bytes,
        }
    }

    pub async fn upload(
        &self,
        actor: &AuthenticatedUser,
        kind: DocumentKind,
        request: UploadDocumentRequest,
    ) -> AppResult<VerificationStatusResponse> {
        request.validate()?;
        let bytes = decode_image(&request.image_base64, self.max_document_bytes)?;

        let mut verification = self.verifications.get_or_create(actor.user_id).await?;
        let key = verification
            .encryption_key
            .get_or_insert_with(crypto::generate_key)
            .clone();
        let sealed = crypto::seal(&key, &bytes)?;
        verification.attach(kind, sealed).map_err(|_| {
            AppError::BadRequest(format!(
                "Cannot upload {} at this verification step",
                kind.as_str()
            ))
        })?;
        self.verifications.save(&verification).await?;

        if kind == DocumentKind::SelfieWithId {
            self.set_user_verified(actor.user_id, true).await?;
        }

        info!("🪪 Usuario {} subió {}", actor.user_id, kind.as_str());
        Ok(VerificationStatusResponse::from(&verification))
    }

    pub async fn status(&self, actor: &AuthenticatedUser) -> AppResult<VerificationStatusResponse> {
        let verification = self.verifications.get_or_create(actor.user_id).await?;
        Ok(VerificationStatusResponse::from(&verification))
    }

    pub async fn image(&self, actor: &AuthenticatedUser, kind: &str) -> AppResult<Vec<u8>> {
        let kind: DocumentKind = kind.parse().map_err(AppError::BadRequest)?;

        let missing = || AppError::NotFound(format!("No {} image uploaded", kind.as_str()));
        let verification = self
            .verifications
            .find_by_user(actor.user_id)
            .await?
            .ok_or_else(missing)?;
        let sealed = verification.image(kind).ok_or_else(missing)?;
        let key = verification.encryption_key.as_deref().ok_or_else(|| {
            AppError::Internal(format!("Verification {} has no encryption key", verification.id))
        })?;

        crypto::open(key, sealed)
    }

    pub async fn review(
        &self,
        actor: &AuthenticatedUser,
        user_id: Uuid,
        request: ReviewRequest,
    ) -> AppResult<VerificationStatusResponse> {
        if !actor.is_staff_member() {
            return Err(forbidden_error("review verification", "staff only"));
        }

        let mut verification = self
            .verifications
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| not_found_error("Verification for user", &user_id.to_string()))?;

        if verification.status != VerificationStatus::SelfieWithIdUploaded {
            return Err(AppError::BadRequest(
                "Verification is not ready for review".to_string(),
            ));
        }

        verification.status = if request.approved {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Rejected
        };
        verification.updated_at = Utc::now();
        self.verifications.save(&verification).await?;
        self.set_user_verified(user_id, request.approved).await?;

        info!(
            "🔎 Verificación de {} revisada por {}: {}",
            user_id,
            actor.user_id,
            if request.approved { "aprobada" } else { "rechazada" }
        );
        Ok(VerificationStatusResponse::from(&verification))
    }

    async fn set_user_verified(&self, user_id: Uuid, verified: bool) -> AppResult<()> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id.to_string()))?;
        if user.is_verified != verified {
            user.is_verified = verified;
            self.users.update(&user).await?;
        }
        Ok(())
    }
}
