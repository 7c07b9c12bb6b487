//! Motor del ciclo de vida de reservas
//!
//! Reúne la máquina de estados, las reglas de autorización por actor,
//! el control de solapamiento y el registro de auditoría.
//!
//! | Acción        | Actor permitido                        | Transición             |
//! |---------------|----------------------------------------|------------------------|
//! | cancel        | cliente, propietario del coche o staff | requested → canceled   |
//! | confirm       | propietario del coche o staff          | requested → confirmed  |
//! | deliver       | propietario del coche o staff          | confirmed → rented     |
//! | start driving | solo el cliente                        | rented → driving       |
//! | return        | propietario del coche o staff          | driving → returned     |

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{
    compute_total_price, Booking, BookingAction, BookingStatus, BookingStatusLog,
};
use crate::models::user::UserType;
use crate::models::vehicle::Vehicle;
use crate::repositories::{BookingRepository, VehicleRepository};
use crate::utils::errors::{forbidden_error, invalid_field, not_found_error, AppError, AppResult};
use crate::utils::validation::{max_amount, validate_time_window};

/// Relación del actor con una reserva concreta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActorRole {
    is_customer: bool,
    is_vehicle_owner: bool,
    is_staff: bool,
}

impl ActorRole {
    fn may_perform(&self, action: BookingAction) -> bool {
        match action {
            BookingAction::Cancel => self.is_customer || self.is_vehicle_owner || self.is_staff,
            BookingAction::Confirm | BookingAction::Deliver | BookingAction::Return => {
                self.is_vehicle_owner || self.is_staff
            }
            BookingAction::StartDriving => self.is_customer,
        }
    }

    fn may_view(&self) -> bool {
        self.is_customer || self.is_vehicle_owner || self.is_staff
    }
}

#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    vehicles: Arc<dyn VehicleRepository>,
}

impl BookingService {
    pub fn new(bookings: Arc<dyn BookingRepository>, vehicles: Arc<dyn VehicleRepository>) -> Self {
        Self { bookings, vehicles }
    }

    /// Usuario propietario del vehículo, si tiene perfil de owner enlazado
    async fn vehicle_owner_user(&self, vehicle: &Vehicle) -> AppResult<Option<Uuid>> {
        let Some(owner_id) = vehicle.owner_id else {
            return Ok(None);
        };
        Ok(self
            .vehicles
            .find_owner(owner_id)
            .await?
            .and_then(|owner| owner.user_id))
    }

    async fn role_for(&self, actor: &AuthenticatedUser, booking: &Booking) -> AppResult<ActorRole> {
        let owner_user = match self.vehicles.find_by_id(booking.vehicle_id).await? {
            Some(vehicle) => self.vehicle_owner_user(&vehicle).await?,
            None => None,
        };

        Ok(ActorRole {
            is_customer: booking.user_id == actor.user_id,
            is_vehicle_owner: owner_user == Some(actor.user_id),
            is_staff: actor.is_staff_member(),
        })
    }

    async fn load(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    /// Crea una reserva en estado requested tras pasar el control de solapamiento
    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        vehicle_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<Booking> {
        if actor.user_type != UserType::Customer {
            return Err(forbidden_error("create booking", "only customers can book vehicles"));
        }
        validate_time_window(start_time, end_time).map_err(|e| invalid_field("end_time", e))?;

        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .filter(|v| !v.is_deleted())
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        if !vehicle.is_available {
            return Err(AppError::BadRequest("Vehicle is not available".to_string()));
        }

        if self
            .bookings
            .has_active_overlap(vehicle_id, start_time, end_time)
            .await?
        {
            warn!(
                "⚠️ Solapamiento detectado para vehículo {} entre {} y {}",
                vehicle_id, start_time, end_time
            );
            return Err(AppError::Conflict(
                "Vehicle is already booked for the requested time".to_string(),
            ));
        }

        let total_price = compute_total_price(start_time, end_time, vehicle.price_per_hour);
        if total_price > max_amount() {
            return Err(AppError::BadRequest(format!(
                "Booking total {} exceeds the maximum of {}",
                total_price,
                max_amount()
            )));
        }
        let booking = Booking::new(actor.user_id, vehicle_id, start_time, end_time, total_price);
        let log = BookingStatusLog::new(booking.id, BookingStatus::Requested, Some(actor.user_id));

        let booking = self.bookings.create(booking, log).await?;
        info!(
            "📅 Reserva {} creada para vehículo {} (total {})",
            booking.id, vehicle_id, booking.total_price
        );
        Ok(booking)
    }

    /// Ejecuta una acción del ciclo de vida.
    /// 404 si no existe, 403 si el actor no puede, 409 si el estado no lo permite.
    pub async fn perform(
        &self,
        actor: &AuthenticatedUser,
        booking_id: Uuid,
        action: BookingAction,
    ) -> AppResult<Booking> {
        let booking = self.load(booking_id).await?;
        let role = self.role_for(actor, &booking).await?;

        if !role.may_perform(action) {
            return Err(forbidden_error(
                action.describe(),
                "you are not allowed to perform this action on this booking",
            ));
        }

        let target = action.target_status();
        if !booking.status.can_transition_to(target) {
            return Err(AppError::Conflict(format!(
                "Cannot {} from status '{}'",
                action.describe(),
                booking.status
            )));
        }

        let log = BookingStatusLog::new(booking.id, target, Some(actor.user_id));
        let updated = self
            .bookings
            .transition(booking.id, booking.status, log)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Booking status changed concurrently, retry".to_string())
            })?;

        info!(
            "🔄 Reserva {}: {} → {} por {}",
            updated.id, booking.status, updated.status, actor.user_id
        );
        Ok(updated)
    }

    /// Reserva visible para el cliente, el propietario del coche o staff
    pub async fn get_visible(&self, actor: &AuthenticatedUser, booking_id: Uuid) -> AppResult<Booking> {
        let booking = self.load(booking_id).await?;
        if !self.role_for(actor, &booking).await?.may_view() {
            return Err(forbidden_error("view booking", "not your booking"));
        }
        Ok(booking)
    }

    pub async fn history(
        &self,
        actor: &AuthenticatedUser,
        booking_id: Uuid,
    ) -> AppResult<Vec<BookingStatusLog>> {
        let booking = self.get_visible(actor, booking_id).await?;
        self.bookings.status_logs(booking.id).await
    }

    /// Clientes ven las suyas, propietarios las de sus coches y staff todas
    pub async fn list_for(&self, actor: &AuthenticatedUser) -> AppResult<Vec<Booking>> {
        if actor.is_staff_member() {
            return self.bookings.list_all().await;
        }

        match actor.user_type {
            UserType::CarOwner => {
                let Some(owner) = self.vehicles.find_owner_by_user(actor.user_id).await? else {
                    return Ok(Vec::new());
                };
                let vehicle_ids: Vec<Uuid> = self
                    .vehicles
                    .list_by_owner(owner.id)
                    .await?
                    .into_iter()
                    .map(|v| v.id)
                    .collect();
                if vehicle_ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.bookings.list_for_vehicles(&vehicle_ids).await
            }
            _ => self.bookings.list_for_user(actor.user_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::{Manufacturer, Owner};
    use crate::repositories::in_memory::{InMemoryBookingRepository, InMemoryVehicleRepository};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Fixture {
        service: BookingService,
        vehicles: Arc<InMemoryVehicleRepository>,
        customer: AuthenticatedUser,
        owner: AuthenticatedUser,
        staff: AuthenticatedUser,
        stranger: AuthenticatedUser,
        vehicle_id: Uuid,
    }

    fn actor(user_type: UserType) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            user_type,
            is_staff: user_type == UserType::Staff,
        }
    }

    async fn fixture() -> Fixture {
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let vehicles = Arc::new(InMemoryVehicleRepository::new());
        let owner = actor(UserType::CarOwner);

        let manufacturer = vehicles
            .create_manufacturer(Manufacturer {
                id: Uuid::new_v4(),
                name: "Toyota".into(),
                country: "Japan".into(),
            })
            .await
            .unwrap();
        let profile = vehicles
            .create_owner(Owner {
                id: Uuid::new_v4(),
                user_id: Some(owner.user_id),
                name: "Owner".into(),
            })
            .await
            .unwrap();
        let vehicle = vehicles
            .create(Vehicle {
                id: Uuid::new_v4(),
                owner_id: Some(profile.id),
                manufacturer_id: manufacturer.id,
                license_plate: "NCR1234".into(),
                model: "Vios".into(),
                year: 2021,
                passenger_capacity: 5,
                is_available: true,
                price_per_hour: dec!(12.50),
                location: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            })
            .await
            .unwrap();

        Fixture {
            service: BookingService::new(bookings, vehicles.clone()),
            vehicles,
            customer: actor(UserType::Customer),
            owner,
            staff: actor(UserType::Staff),
            stranger: actor(UserType::Customer),
            vehicle_id: vehicle.id,
        }
    }

    fn window(offset_hours: i64, hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let base = Utc::now() + Duration::days(1);
        let start = base + Duration::hours(offset_hours);
        (start, start + Duration::hours(hours))
    }

    #[tokio::test]
    async fn test_create_computes_price_and_logs() {
        let f = fixture().await;
        let (start, end) = window(0, 3);
        let booking = f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Requested);
        assert_eq!(booking.total_price, dec!(37.50));

        let history = f.service.history(&f.customer, booking.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_id, Some(f.customer.user_id));
    }

    #[tokio::test]
    async fn test_overlap_is_rejected_but_back_to_back_is_allowed() {
        let f = fixture().await;
        let (start, end) = window(0, 2);
        f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();

        let (s2, e2) = window(1, 2);
        let err = f.service.create(&f.stranger, f.vehicle_id, s2, e2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let (s3, e3) = window(2, 2);
        assert!(f.service.create(&f.stranger, f.vehicle_id, s3, e3).await.is_ok());
    }

    #[tokio::test]
    async fn test_canceled_booking_frees_the_window() {
        let f = fixture().await;
        let (start, end) = window(0, 2);
        let booking = f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();
        f.service.perform(&f.customer, booking.id, BookingAction::Cancel).await.unwrap();

        assert!(f.service.create(&f.stranger, f.vehicle_id, start, end).await.is_ok());
    }

    #[tokio::test]
    async fn test_only_customers_can_book() {
        let f = fixture().await;
        let (start, end) = window(0, 1);
        let err = f.service.create(&f.owner, f.vehicle_id, start, end).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_authorized_actors() {
        let f = fixture().await;
        let (start, end) = window(0, 4);
        let booking = f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();

        let steps = [
            (&f.owner, BookingAction::Confirm, BookingStatus::Confirmed),
            (&f.staff, BookingAction::Deliver, BookingStatus::Rented),
            (&f.customer, BookingAction::StartDriving, BookingStatus::Driving),
            (&f.owner, BookingAction::Return, BookingStatus::Returned),
        ];
        for (who, action, expected) in steps {
            let updated = f.service.perform(who, booking.id, action).await.unwrap();
            assert_eq!(updated.status, expected);
        }

        let history = f.service.history(&f.staff, booking.id).await.unwrap();
        let statuses: Vec<BookingStatus> = history.iter().map(|l| l.status).collect();
        assert_eq!(
            statuses,
            vec![
                BookingStatus::Returned,
                BookingStatus::Driving,
                BookingStatus::Rented,
                BookingStatus::Confirmed,
                BookingStatus::Requested,
            ]
        );
    }

    #[tokio::test]
    async fn test_wrong_actor_is_forbidden() {
        let f = fixture().await;
        let (start, end) = window(0, 2);
        let booking = f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();

        let err = f.service.perform(&f.customer, booking.id, BookingAction::Confirm).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = f.service.perform(&f.stranger, booking.id, BookingAction::Cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let other_owner = actor(UserType::CarOwner);
        let err = f.service.perform(&other_owner, booking.id, BookingAction::Confirm).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_invalid_transition_conflicts_without_logging() {
        let f = fixture().await;
        let (start, end) = window(0, 2);
        let booking = f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();

        let err = f.service.perform(&f.owner, booking.id, BookingAction::Deliver).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        f.service.perform(&f.owner, booking.id, BookingAction::Confirm).await.unwrap();
        let err = f.service.perform(&f.owner, booking.id, BookingAction::Confirm).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let history = f.service.history(&f.customer, booking.id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .perform(&f.staff, Uuid::new_v4(), BookingAction::Cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_is_scoped_by_role() {
        let f = fixture().await;
        let (start, end) = window(0, 2);
        f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();
        let (s2, e2) = window(5, 2);
        f.service.create(&f.stranger, f.vehicle_id, s2, e2).await.unwrap();

        assert_eq!(f.service.list_for(&f.customer).await.unwrap().len(), 1);
        assert_eq!(f.service.list_for(&f.owner).await.unwrap().len(), 2);
        assert_eq!(f.service.list_for(&f.staff).await.unwrap().len(), 2);
        assert!(f.service.list_for(&actor(UserType::CarOwner)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_or_inverted_window_is_invalid() {
        let f = fixture().await;
        let (start, _) = window(0, 1);
        let err = f.service.create(&f.customer, f.vehicle_id, start, start).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = f
            .service
            .create(&f.customer, f.vehicle_id, start, start - Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_total_above_storable_maximum_is_rejected() {
        let f = fixture().await;
        let mut luxury = f.vehicles.find_by_id(f.vehicle_id).await.unwrap().unwrap();
        luxury.id = Uuid::new_v4();
        luxury.license_plate = "LUX0001".into();
        luxury.price_per_hour = dec!(9999.99);
        let luxury = f.vehicles.create(luxury).await.unwrap();

        // ~14 meses a 9999.99/h
        let start = Utc::now() + Duration::days(1);
        let err = f
            .service
            .create(&f.customer, luxury.id, start, start + Duration::days(425))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(f.service.list_for(&f.customer).await.unwrap().is_empty());

        let booking = f
            .service
            .create(&f.customer, luxury.id, start, start + Duration::days(400))
            .await
            .unwrap();
        assert!(booking.total_price <= max_amount());
    }

    #[tokio::test]
    async fn test_deleted_vehicle_keeps_booking_history() {
        let f = fixture().await;
        let (start, end) = window(0, 2);
        let booking = f.service.create(&f.customer, f.vehicle_id, start, end).await.unwrap();
        f.service.perform(&f.customer, booking.id, BookingAction::Cancel).await.unwrap();

        f.vehicles.delete(f.vehicle_id).await.unwrap();

        let history = f.service.history(&f.owner, booking.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(f.service.list_for(&f.owner).await.unwrap().len(), 1);

        let (s2, e2) = window(5, 2);
        let err = f.service.create(&f.customer, f.vehicle_id, s2, e2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
