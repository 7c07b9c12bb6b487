use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, BookingStatusLog};
use crate::utils::errors::AppError;

/// Estados activos en SQL; debe coincidir con `BookingStatus::ACTIVE`
const ACTIVE_STATUSES_SQL: &str = "('requested', 'confirmed', 'rented', 'driving')";

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserta la reserva junto con su primera entrada de auditoría
    async fn create(&self, booking: Booking, log: BookingStatusLog) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError>;
    async fn list_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Booking>, AppError>;
    async fn list_all(&self) -> Result<Vec<Booking>, AppError>;

    /// Existe alguna reserva activa del vehículo que se solape con `[start, end)`
    async fn has_active_overlap(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, AppError>;
    async fn has_active_bookings(&self, vehicle_id: Uuid) -> Result<bool, AppError>;

    /// Compare-and-set del estado más la entrada de auditoría.
    /// Devuelve `None` si el estado actual ya no es `from`.
    async fn transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        log: BookingStatusLog,
    ) -> Result<Option<Booking>, AppError>;

    /// Historial de estados, más reciente primero
    async fn status_logs(&self, booking_id: Uuid) -> Result<Vec<BookingStatusLog>, AppError>;
}

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_log(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    log: &BookingStatusLog,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO booking_status_logs (id, booking_id, status, user_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(log.id)
    .bind(log.booking_id)
    .bind(log.status)
    .bind(log.user_id)
    .bind(log.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, booking: Booking, log: BookingStatusLog) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, user_id, vehicle_id, start_time, end_time, total_price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.vehicle_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.total_price)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_log(&mut tx, &log).await?;
        tx.commit().await?;

        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY start_time DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn list_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE vehicle_id = ANY($1) ORDER BY start_time DESC",
        )
        .bind(vehicle_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY start_time DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    async fn has_active_overlap(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let query = format!(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1
                  AND status IN {}
                  AND start_time < $3
                  AND end_time > $2
            )
            "#,
            ACTIVE_STATUSES_SQL
        );
        let result: (bool,) = sqlx::query_as(&query)
            .bind(vehicle_id)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn has_active_bookings(&self, vehicle_id: Uuid) -> Result<bool, AppError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE vehicle_id = $1 AND status IN {})",
            ACTIVE_STATUSES_SQL
        );
        let result: (bool,) = sqlx::query_as(&query)
            .bind(vehicle_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        log: BookingStatusLog,
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(log.status)
        .bind(log.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(booking) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        insert_log(&mut tx, &log).await?;
        tx.commit().await?;

        Ok(Some(booking))
    }

    async fn status_logs(&self, booking_id: Uuid) -> Result<Vec<BookingStatusLog>, AppError> {
        let logs = sqlx::query_as::<_, BookingStatusLog>(
            r#"
            SELECT id, booking_id, status, user_id, created_at
            FROM booking_status_logs
            WHERE booking_id = $1
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
