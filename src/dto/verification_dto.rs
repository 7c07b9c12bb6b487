use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::verification::{UserVerification, VerificationStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct UploadDocumentRequest {
    #[validate(length(min = 1, message = "Image is required"))]
    pub image_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub approved: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationStatusResponse {
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserVerification> for VerificationStatusResponse {
    fn from(verification: &UserVerification) -> Self {
        Self {
            status: verification.status,
            created_at: verification.created_at,
            updated_at: verification.updated_at,
        }
    }
}
