use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, BookingStatusLog};
use crate::models::payment::Payment;
use crate::models::user::{Otp, User};
use crate::models::vehicle::{Manufacturer, Owner, Vehicle, VehicleFilters};
use crate::models::verification::UserVerification;
use crate::repositories::{
    BookingRepository, OtpRepository, PaymentRepository, UserRepository, VehicleRepository,
    VerificationRepository,
};
use crate::utils::errors::AppError;

/// Almacén de usuarios en memoria.
///
/// Usa `Arc<RwLock<HashMap<..>>>` para permitir acceso concurrente compartido.
/// Pensado para tests y para `STORAGE=memory` en desarrollo.
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let duplicate = users.values().any(|existing| {
            (user.email.is_some() && existing.email == user.email)
                || (user.phone_number.is_some() && existing.phone_number == user.phone_number)
        });
        if duplicate {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email.as_deref() == Some(email)).cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.phone_number.as_deref() == Some(phone_number))
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.users.write().await.remove(&id);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryOtpRepository {
    otps: Arc<RwLock<Vec<Otp>>>,
}

impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn create(&self, otp: Otp) -> Result<Otp, AppError> {
        self.otps.write().await.push(otp.clone());
        Ok(otp)
    }

    async fn find(&self, user_id: Uuid, code: &str) -> Result<Option<Otp>, AppError> {
        let otps = self.otps.read().await;
        Ok(otps
            .iter()
            .rev()
            .find(|otp| otp.user_id == user_id && otp.code == code)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.otps.write().await.retain(|otp| otp.id != id);
        Ok(())
    }

    async fn delete_expired(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut otps = self.otps.write().await;
        let before = otps.len();
        otps.retain(|otp| otp.user_id != user_id || otp.expires_at >= now);
        Ok((before - otps.len()) as u64)
    }
}

#[derive(Default)]
struct FleetTables {
    manufacturers: HashMap<Uuid, Manufacturer>,
    owners: HashMap<Uuid, Owner>,
    vehicles: HashMap<Uuid, Vehicle>,
}

#[derive(Default, Clone)]
pub struct InMemoryVehicleRepository {
    tables: Arc<RwLock<FleetTables>>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(vehicles: &mut [Vehicle]) {
    vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer, AppError> {
        let mut tables = self.tables.write().await;
        tables.manufacturers.insert(manufacturer.id, manufacturer.clone());
        Ok(manufacturer)
    }

    async fn find_manufacturer(&self, id: Uuid) -> Result<Option<Manufacturer>, AppError> {
        Ok(self.tables.read().await.manufacturers.get(&id).cloned())
    }

    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError> {
        let tables = self.tables.read().await;
        let mut manufacturers: Vec<Manufacturer> = tables.manufacturers.values().cloned().collect();
        manufacturers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(manufacturers)
    }

    async fn create_owner(&self, owner: Owner) -> Result<Owner, AppError> {
        let mut tables = self.tables.write().await;
        tables.owners.insert(owner.id, owner.clone());
        Ok(owner)
    }

    async fn find_owner(&self, id: Uuid) -> Result<Option<Owner>, AppError> {
        Ok(self.tables.read().await.owners.get(&id).cloned())
    }

    async fn find_owner_by_user(&self, user_id: Uuid) -> Result<Option<Owner>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .owners
            .values()
            .find(|o| o.user_id == Some(user_id))
            .cloned())
    }

    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .vehicles
            .values()
            .any(|v| !v.is_deleted() && v.license_plate == vehicle.license_plate)
        {
            return Err(AppError::Conflict("License plate already registered".to_string()));
        }
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn list_available(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>, AppError> {
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| filters.matches(v))
            .cloned()
            .collect();
        newest_first(&mut vehicles);
        Ok(vehicles
            .into_iter()
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| v.owner_id == Some(owner_id))
            .cloned()
            .collect();
        newest_first(&mut vehicles);
        Ok(vehicles)
    }

    async fn license_plate_exists(&self, license_plate: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .values()
            .any(|v| !v.is_deleted() && v.license_plate == license_plate))
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let mut tables = self.tables.write().await;
        match tables.vehicles.get_mut(&vehicle.id) {
            Some(existing) => {
                *existing = vehicle.clone();
                Ok(vehicle.clone())
            }
            None => Err(AppError::NotFound("Vehicle not found".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(vehicle) = tables.vehicles.get_mut(&id).filter(|v| !v.is_deleted()) {
            let now = Utc::now();
            vehicle.deleted_at = Some(now);
            vehicle.is_available = false;
            vehicle.updated_at = now;
        }
        Ok(())
    }
}

#[derive(Default)]
struct BookingTables {
    bookings: HashMap<Uuid, Booking>,
    // Orden de inserción; el historial se lee al revés
    logs: Vec<BookingStatusLog>,
}

#[derive(Default, Clone)]
pub struct InMemoryBookingRepository {
    tables: Arc<RwLock<BookingTables>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_start_desc(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    bookings
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, booking: Booking, log: BookingStatusLog) -> Result<Booking, AppError> {
        let mut tables = self.tables.write().await;
        tables.bookings.insert(booking.id, booking.clone());
        tables.logs.push(log);
        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let tables = self.tables.read().await;
        Ok(by_start_desc(
            tables
                .bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_vehicles(&self, vehicle_ids: &[Uuid]) -> Result<Vec<Booking>, AppError> {
        let tables = self.tables.read().await;
        Ok(by_start_desc(
            tables
                .bookings
                .values()
                .filter(|b| vehicle_ids.contains(&b.vehicle_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        let tables = self.tables.read().await;
        Ok(by_start_desc(tables.bookings.values().cloned().collect()))
    }

    async fn has_active_overlap(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.values().any(|b| {
            b.vehicle_id == vehicle_id && b.status.is_active() && b.overlaps(start, end)
        }))
    }

    async fn has_active_bookings(&self, vehicle_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .any(|b| b.vehicle_id == vehicle_id && b.status.is_active()))
    }

    async fn transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        log: BookingStatusLog,
    ) -> Result<Option<Booking>, AppError> {
        let mut tables = self.tables.write().await;
        let updated = match tables.bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == from => {
                booking.status = log.status;
                booking.updated_at = log.created_at;
                booking.clone()
            }
            _ => return Ok(None),
        };
        tables.logs.push(log);
        Ok(Some(updated))
    }

    async fn status_logs(&self, booking_id: Uuid) -> Result<Vec<BookingStatusLog>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .logs
            .iter()
            .rev()
            .filter(|log| log.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPaymentRepository {
    payments: Arc<RwLock<Vec<Payment>>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment, AppError> {
        self.payments.write().await.push(payment.clone());
        Ok(payment)
    }

    async fn update(&self, payment: &Payment) -> Result<(), AppError> {
        let mut payments = self.payments.write().await;
        match payments.iter_mut().find(|p| p.id == payment.id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Payment not found".to_string())),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        let payments = self.payments.read().await;
        Ok(payments.iter().find(|p| p.id == id).cloned())
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = self.payments.read().await;
        Ok(payments
            .iter()
            .rev()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryVerificationRepository {
    verifications: Arc<RwLock<HashMap<Uuid, UserVerification>>>,
}

impl InMemoryVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationRepository for InMemoryVerificationRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<UserVerification>, AppError> {
        Ok(self.verifications.read().await.get(&user_id).cloned())
    }

    async fn get_or_create(&self, user_id: Uuid) -> Result<UserVerification, AppError> {
        let mut verifications = self.verifications.write().await;
        Ok(verifications
            .entry(user_id)
            .or_insert_with(|| UserVerification::new(user_id))
            .clone())
    }

    async fn save(&self, verification: &UserVerification) -> Result<(), AppError> {
        let mut verifications = self.verifications.write().await;
        verifications.insert(verification.user_id, verification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn booking(vehicle_id: Uuid, start: DateTime<Utc>, hours: i64) -> Booking {
        Booking::new(Uuid::new_v4(), vehicle_id, start, start + Duration::hours(hours), dec!(10))
    }

    #[tokio::test]
    async fn test_overlap_ignores_inactive_bookings() {
        let repo = InMemoryBookingRepository::new();
        let vehicle_id = Uuid::new_v4();
        let start = Utc::now();

        let b = booking(vehicle_id, start, 4);
        let log = BookingStatusLog::new(b.id, BookingStatus::Requested, Some(b.user_id));
        repo.create(b.clone(), log).await.unwrap();

        assert!(repo
            .has_active_overlap(vehicle_id, start + Duration::hours(1), start + Duration::hours(2))
            .await
            .unwrap());
        assert!(!repo
            .has_active_overlap(Uuid::new_v4(), start, start + Duration::hours(1))
            .await
            .unwrap());

        let cancel = BookingStatusLog::new(b.id, BookingStatus::Canceled, Some(b.user_id));
        repo.transition(b.id, BookingStatus::Requested, cancel).await.unwrap().unwrap();

        assert!(!repo
            .has_active_overlap(vehicle_id, start, start + Duration::hours(4))
            .await
            .unwrap());
        assert!(!repo.has_active_bookings(vehicle_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = InMemoryBookingRepository::new();
        let b = booking(Uuid::new_v4(), Utc::now(), 2);
        repo.create(b.clone(), BookingStatusLog::new(b.id, BookingStatus::Requested, None))
            .await
            .unwrap();

        let confirm = BookingStatusLog::new(b.id, BookingStatus::Confirmed, None);
        assert!(repo.transition(b.id, BookingStatus::Requested, confirm).await.unwrap().is_some());

        // El estado ya no es requested: no se escribe nada
        let stale = BookingStatusLog::new(b.id, BookingStatus::Canceled, None);
        assert!(repo.transition(b.id, BookingStatus::Requested, stale).await.unwrap().is_none());

        let logs = repo.status_logs(b.id).await.unwrap();
        assert_eq!(
            logs.iter().map(|l| l.status).collect::<Vec<_>>(),
            vec![BookingStatus::Confirmed, BookingStatus::Requested]
        );
    }

    #[tokio::test]
    async fn test_otp_delete_expired_only_touches_user() {
        let repo = InMemoryOtpRepository::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        repo.create(Otp::new(user_a, "111111".into(), Duration::minutes(-1))).await.unwrap();
        repo.create(Otp::new(user_a, "222222".into(), Duration::minutes(5))).await.unwrap();
        repo.create(Otp::new(user_b, "333333".into(), Duration::minutes(-1))).await.unwrap();

        assert_eq!(repo.delete_expired(user_a, Utc::now()).await.unwrap(), 1);
        assert!(repo.find(user_a, "222222").await.unwrap().is_some());
        assert!(repo.find(user_b, "333333").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verification_get_or_create_is_idempotent() {
        let repo = InMemoryVerificationRepository::new();
        let user_id = Uuid::new_v4();
        let first = repo.get_or_create(user_id).await.unwrap();
        let second = repo.get_or_create(user_id).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    fn vehicle(plate: &str) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            owner_id: None,
            manufacturer_id: Uuid::new_v4(),
            license_plate: plate.to_string(),
            model: "Vios".to_string(),
            year: 2020,
            passenger_capacity: 5,
            is_available: true,
            price_per_hour: dec!(10),
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_vehicle_delete_is_soft() {
        let repo = InMemoryVehicleRepository::new();
        let car = repo.create(vehicle("SOFT001")).await.unwrap();
        assert!(repo.create(vehicle("SOFT001")).await.is_err());

        repo.delete(car.id).await.unwrap();

        let stored = repo.find_by_id(car.id).await.unwrap().unwrap();
        assert!(stored.is_deleted());
        assert!(!stored.is_available);
        assert!(repo.list_available(&VehicleFilters::default()).await.unwrap().is_empty());
        assert!(!repo.license_plate_exists("SOFT001").await.unwrap());
        assert!(repo.create(vehicle("SOFT001")).await.is_ok());
    }
}

