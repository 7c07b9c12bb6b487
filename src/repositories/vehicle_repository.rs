use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::{Manufacturer, Owner, Vehicle, VehicleFilters};
use crate::utils::errors::{conflict_error, map_unique_violation, AppError};

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer, AppError>;
    async fn find_manufacturer(&self, id: Uuid) -> Result<Option<Manufacturer>, AppError>;
    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError>;

    async fn create_owner(&self, owner: Owner) -> Result<Owner, AppError>;
    async fn find_owner(&self, id: Uuid) -> Result<Option<Owner>, AppError>;
    async fn find_owner_by_user(&self, user_id: Uuid) -> Result<Option<Owner>, AppError>;

    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError>;
    /// Vehículos disponibles que cumplen los filtros, más recientes primero
    async fn list_available(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>, AppError>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Vehicle>, AppError>;
    async fn license_plate_exists(&self, license_plate: &str) -> Result<bool, AppError>;
    async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer, AppError> {
        let manufacturer = sqlx::query_as::<_, Manufacturer>(
            "INSERT INTO manufacturers (id, name, country) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(manufacturer.id)
        .bind(&manufacturer.name)
        .bind(&manufacturer.country)
        .fetch_one(&self.pool)
        .await?;

        Ok(manufacturer)
    }

    async fn find_manufacturer(&self, id: Uuid) -> Result<Option<Manufacturer>, AppError> {
        let manufacturer = sqlx::query_as::<_, Manufacturer>("SELECT * FROM manufacturers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(manufacturer)
    }

    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError> {
        let manufacturers = sqlx::query_as::<_, Manufacturer>("SELECT * FROM manufacturers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(manufacturers)
    }

    async fn create_owner(&self, owner: Owner) -> Result<Owner, AppError> {
        let owner = sqlx::query_as::<_, Owner>(
            "INSERT INTO owners (id, user_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(owner.id)
        .bind(owner.user_id)
        .bind(&owner.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn find_owner(&self, id: Uuid) -> Result<Option<Owner>, AppError> {
        let owner = sqlx::query_as::<_, Owner>("SELECT * FROM owners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    async fn find_owner_by_user(&self, user_id: Uuid) -> Result<Option<Owner>, AppError> {
        let owner = sqlx::query_as::<_, Owner>("SELECT * FROM owners WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle, AppError> {
        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, owner_id, manufacturer_id, license_plate, model, year,
                                  passenger_capacity, is_available, price_per_hour, location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.owner_id)
        .bind(vehicle.manufacturer_id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(vehicle.passenger_capacity)
        .bind(vehicle.is_available)
        .bind(vehicle.price_per_hour)
        .bind(&vehicle.location)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                conflict_error("Vehicle", "license_plate", &vehicle.license_plate)
            })
        })?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn list_available(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE is_available = TRUE
              AND deleted_at IS NULL
              AND ($1::uuid IS NULL OR manufacturer_id = $1)
              AND ($2::numeric IS NULL OR price_per_hour <= $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filters.manufacturer_id)
        .bind(filters.max_price_per_hour)
        .bind(filters.limit())
        .bind(filters.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn license_plate_exists(&self, license_plate: &str) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE license_plate = $1 AND deleted_at IS NULL)")
            .bind(license_plate)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET model = $2, passenger_capacity = $3, is_available = $4, price_per_hour = $5,
                location = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.model)
        .bind(vehicle.passenger_capacity)
        .bind(vehicle.is_available)
        .bind(vehicle.price_per_hour)
        .bind(&vehicle.location)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE vehicles SET deleted_at = NOW(), is_available = FALSE, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
