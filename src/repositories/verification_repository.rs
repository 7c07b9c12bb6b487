use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::verification::UserVerification;
use crate::utils::errors::AppError;

#[async_trait]
pub trait VerificationRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserVerification>, AppError>;
    /// Devuelve la verificación del usuario, creándola en estado pending si no existe
    async fn get_or_create(&self, user_id: Uuid) -> Result<UserVerification, AppError>;
    async fn save(&self, verification: &UserVerification) -> Result<(), AppError>;
}

pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserVerification>, AppError> {
        let verification =
            sqlx::query_as::<_, UserVerification>("SELECT * FROM user_verifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(verification)
    }

    async fn get_or_create(&self, user_id: Uuid) -> Result<UserVerification, AppError> {
        let fresh = UserVerification::new(user_id);
        sqlx::query(
            r#"
            INSERT INTO user_verifications (id, user_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(fresh.id)
        .bind(fresh.user_id)
        .bind(fresh.status)
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Verification row vanished after upsert".to_string()))
    }

    async fn save(&self, verification: &UserVerification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE user_verifications
            SET selfie_image = $2, id_card_image = $3, selfie_with_id_image = $4,
                encryption_key = $5, status = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(verification.id)
        .bind(&verification.selfie_image)
        .bind(&verification.id_card_image)
        .bind(&verification.selfie_with_id_image)
        .bind(&verification.encryption_key)
        .bind(verification.status)
        .bind(verification.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
