use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::payment::{Payment, PaymentMethod, PaymentStatus, ProviderDetails};
use crate::utils::errors::AppError;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment, AppError>;
    async fn update(&self, payment: &Payment) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError>;
    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>, AppError>;
}

/// Fila de booking_payments; `provider_details` es JSONB
#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount: Decimal,
    method: PaymentMethod,
    transaction_id: Option<String>,
    status: PaymentStatus,
    provider_details: Json<ProviderDetails>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            method: row.method,
            transaction_id: row.transaction_id,
            status: row.status,
            provider_details: row.provider_details.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment, AppError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO booking_payments (id, booking_id, amount, method, transaction_id, status,
                                          provider_details, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(&payment.transaction_id)
        .bind(payment.status)
        .bind(Json(&payment.provider_details))
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, payment: &Payment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE booking_payments
            SET transaction_id = $2, status = $3, provider_details = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(payment.id)
        .bind(&payment.transaction_id)
        .bind(payment.status)
        .bind(Json(&payment.provider_details))
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM booking_payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Payment::from))
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM booking_payments WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Payment::from).collect())
    }
}
