//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: configuración, repositorios, notificador
//! de OTP y registro de gateways de pago.

use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::in_memory::{
    InMemoryBookingRepository, InMemoryOtpRepository, InMemoryPaymentRepository,
    InMemoryUserRepository, InMemoryVehicleRepository, InMemoryVerificationRepository,
};
use crate::repositories::{
    BookingRepository, OtpRepository, PaymentRepository, PgBookingRepository, PgOtpRepository,
    PgPaymentRepository, PgUserRepository, PgVehicleRepository, PgVerificationRepository,
    UserRepository, VehicleRepository, VerificationRepository,
};
use crate::services::{BookingService, LogNotifier, OtpNotifier, OtpService, PaymentGatewayRegistry};
use crate::utils::errors::AppResult;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub users: Arc<dyn UserRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub notifier: Arc<dyn OtpNotifier>,
    pub gateways: Arc<PaymentGatewayRegistry>,
}

/// Cliente HTTP compartido por los gateways de pago
fn payment_http_client(config: &EnvironmentConfig) -> AppResult<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?)
}

impl AppState {
    /// Estado respaldado por PostgreSQL
    pub fn postgres(pool: PgPool, config: EnvironmentConfig) -> AppResult<Self> {
        let http_client = payment_http_client(&config)?;
        Ok(Self {
            gateways: Arc::new(PaymentGatewayRegistry::from_config(&config, http_client)),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            otps: Arc::new(PgOtpRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            verifications: Arc::new(PgVerificationRepository::new(pool)),
            notifier: Arc::new(LogNotifier),
            config,
        })
    }

    /// Estado en memoria (tests y `STORAGE=memory`)
    pub fn in_memory(config: EnvironmentConfig) -> AppResult<Self> {
        let http_client = payment_http_client(&config)?;
        Ok(Self {
            gateways: Arc::new(PaymentGatewayRegistry::from_config(&config, http_client)),
            users: Arc::new(InMemoryUserRepository::new()),
            otps: Arc::new(InMemoryOtpRepository::new()),
            vehicles: Arc::new(InMemoryVehicleRepository::new()),
            bookings: Arc::new(InMemoryBookingRepository::new()),
            payments: Arc::new(InMemoryPaymentRepository::new()),
            verifications: Arc::new(InMemoryVerificationRepository::new()),
            notifier: Arc::new(LogNotifier),
            config,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OtpNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_gateways(mut self, gateways: PaymentGatewayRegistry) -> Self {
        self.gateways = Arc::new(gateways);
        self
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(&self.config)
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(self.bookings.clone(), self.vehicles.clone())
    }

    pub fn otp_service(&self) -> OtpService {
        OtpService::new(self.otps.clone(), self.notifier.clone(), self.config.otp_ttl_minutes)
    }
}
