use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{CreateManufacturerRequest, CreateVehicleRequest, UpdateVehicleRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::user::UserType;
use crate::models::vehicle::{Manufacturer, Owner, Vehicle, VehicleFilters};
use crate::repositories::{BookingRepository, UserRepository, VehicleRepository};
use crate::state::AppState;
use crate::utils::errors::{
    conflict_error, forbidden_error, invalid_field, not_found_error, AppError, AppResult,
};
use crate::utils::validation::{validate_price_per_hour, validate_vehicle_year};

pub struct VehicleController {
    repository: Arc<dyn VehicleRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.vehicles.clone(),
            bookings: state.bookings.clone(),
            users: state.users.clone(),
        }
    }

    pub async fn list_available(&self, filters: VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.repository.list_available(&filters).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_by_id(id)
            .await?
            .filter(|v| !v.is_deleted())
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    pub async fn list_mine(&self, actor: &AuthenticatedUser) -> AppResult<Vec<Vehicle>> {
        if actor.user_type != UserType::CarOwner {
            return Err(forbidden_error("list vehicles", "only car owners have vehicles"));
        }
        match self.repository.find_owner_by_user(actor.user_id).await? {
            Some(owner) => Ok(self
                .repository
                .list_by_owner(owner.id)
                .await?
                .into_iter()
                .filter(|v| !v.is_deleted())
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Perfil de owner del usuario, creado en su primer alta de vehículo
    async fn owner_profile(&self, actor: &AuthenticatedUser) -> AppResult<Owner> {
        if let Some(owner) = self.repository.find_owner_by_user(actor.user_id).await? {
            return Ok(owner);
        }

        let user = self
            .users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &actor.user_id.to_string()))?;

        let owner = self
            .repository
            .create_owner(Owner {
                id: Uuid::new_v4(),
                user_id: Some(user.id),
                name: user.display_name(),
            })
            .await?;
        info!("🧑‍💼 Perfil de owner {} creado para usuario {}", owner.id, user.id);
        Ok(owner)
    }

    /// Carga el vehículo y comprueba que pertenece al actor
    async fn owned_vehicle(&self, actor: &AuthenticatedUser, id: Uuid, operation: &str) -> AppResult<Vehicle> {
        let vehicle = self.get_by_id(id).await?;
        let owner = self.repository.find_owner_by_user(actor.user_id).await?;

        match (owner, vehicle.owner_id) {
            (Some(owner), Some(owner_id)) if owner.id == owner_id => Ok(vehicle),
            _ => Err(forbidden_error(operation, "you do not own this vehicle")),
        }
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        request: CreateVehicleRequest,
    ) -> AppResult<ApiResponse<Vehicle>> {
        if actor.user_type != UserType::CarOwner {
            return Err(forbidden_error("create vehicle", "only car owners can list vehicles"));
        }

        request.validate()?;
        validate_vehicle_year(request.year).map_err(|e| invalid_field("year", e))?;
        validate_price_per_hour(&request.price_per_hour)
            .map_err(|e| invalid_field("price_per_hour", e))?;

        if self.repository.find_manufacturer(request.manufacturer_id).await?.is_none() {
            return Err(not_found_error("Manufacturer", &request.manufacturer_id.to_string()));
        }
        if self.repository.license_plate_exists(&request.license_plate).await? {
            return Err(conflict_error("Vehicle", "license_plate", &request.license_plate));
        }

        let owner = self.owner_profile(actor).await?;
        let now = Utc::now();
        let vehicle = self
            .repository
            .create(Vehicle {
                id: Uuid::new_v4(),
                owner_id: Some(owner.id),
                manufacturer_id: request.manufacturer_id,
                license_plate: request.license_plate,
                model: request.model,
                year: request.year,
                passenger_capacity: request.passenger_capacity,
                is_available: request.is_available.unwrap_or(true),
                price_per_hour: request.price_per_hour,
                location: request.location,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await?;

        info!("🚗 Vehículo {} ({}) publicado", vehicle.id, vehicle.license_plate);
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle created successfully"))
    }

    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> AppResult<ApiResponse<Vehicle>> {
        let mut vehicle = self.owned_vehicle(actor, id, "update vehicle").await?;
        request.validate()?;

        if let Some(price) = request.price_per_hour {
            validate_price_per_hour(&price).map_err(|e| invalid_field("price_per_hour", e))?;
            vehicle.price_per_hour = price;
        }
        if let Some(model) = request.model {
            vehicle.model = model;
        }
        if let Some(is_available) = request.is_available {
            vehicle.is_available = is_available;
        }
        if let Some(capacity) = request.passenger_capacity {
            vehicle.passenger_capacity = capacity;
        }
        if request.location.is_some() {
            vehicle.location = request.location;
        }
        vehicle.updated_at = Utc::now();

        let vehicle = self.repository.update(&vehicle).await?;
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle updated successfully"))
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, id: Uuid) -> AppResult<()> {
        let vehicle = self.owned_vehicle(actor, id, "delete vehicle").await?;

        if self.bookings.has_active_bookings(vehicle.id).await? {
            return Err(AppError::Conflict(
                "Vehicle has active bookings and cannot be deleted".to_string(),
            ));
        }

        self.repository.delete(vehicle.id).await?;
        info!("🗑️ Vehículo {} dado de baja", vehicle.id);
        Ok(())
    }

    pub async fn list_manufacturers(&self) -> AppResult<Vec<Manufacturer>> {
        self.repository.list_manufacturers().await
    }

    pub async fn create_manufacturer(
        &self,
        actor: &AuthenticatedUser,
        request: CreateManufacturerRequest,
    ) -> AppResult<ApiResponse<Manufacturer>> {
        if !actor.is_staff_member() {
            return Err(forbidden_error("create manufacturer", "staff only"));
        }
        request.validate()?;

        let manufacturer = self
            .repository
            .create_manufacturer(Manufacturer {
                id: Uuid::new_v4(),
                name: request.name.trim().to_string(),
                country: request.country.trim().to_string(),
            })
            .await?;
        Ok(ApiResponse::success(manufacturer))
    }
}
