use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{Otp, User};
use crate::utils::errors::{map_unique_violation, AppError};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, AppError>;
    async fn update(&self, user: &User) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    async fn create(&self, otp: Otp) -> Result<Otp, AppError>;
    async fn find(&self, user_id: Uuid, code: &str) -> Result<Option<Otp>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    /// Borra los OTP expirados del usuario; devuelve cuántos se eliminaron
    async fn delete_expired(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, phone_number, password_hash, first_name, last_name,
                               user_type, verification_method, is_staff, is_active, is_verified, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.user_type)
        .bind(user.verification_method)
        .bind(user.is_staff)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.date_joined)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || AppError::Conflict("User already exists".to_string()))
        })?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, is_active = $4, is_verified = $5, password_hash = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub struct PgOtpRepository {
    pool: PgPool,
}

impl PgOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpRepository for PgOtpRepository {
    async fn create(&self, otp: Otp) -> Result<Otp, AppError> {
        let otp = sqlx::query_as::<_, Otp>(
            r#"
            INSERT INTO otps (id, user_id, code, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(otp.id)
        .bind(otp.user_id)
        .bind(&otp.code)
        .bind(otp.created_at)
        .bind(otp.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(otp)
    }

    async fn find(&self, user_id: Uuid, code: &str) -> Result<Option<Otp>, AppError> {
        let otp = sqlx::query_as::<_, Otp>(
            "SELECT * FROM otps WHERE user_id = $1 AND code = $2 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(otp)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM otps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM otps WHERE user_id = $1 AND expires_at < $2")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
