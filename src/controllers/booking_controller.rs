use uuid::Uuid;

use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{Booking, BookingAction, BookingStatusLog};
use crate::services::BookingService;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub struct BookingController {
    service: BookingService,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.booking_service(),
        }
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        request: CreateBookingRequest,
    ) -> AppResult<ApiResponse<Booking>> {
        let booking = self
            .service
            .create(actor, request.vehicle_id, request.start_time, request.end_time)
            .await?;
        Ok(ApiResponse::success_with_message(booking, "Booking requested"))
    }

    pub async fn apply(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        action: BookingAction,
    ) -> AppResult<ApiResponse<Booking>> {
        let booking = self.service.perform(actor, id, action).await?;
        let message = format!("Booking is now {}", booking.status);
        Ok(ApiResponse::success_with_message(booking, message))
    }

    pub async fn get(&self, actor: &AuthenticatedUser, id: Uuid) -> AppResult<Booking> {
        self.service.get_visible(actor, id).await
    }

    pub async fn list(&self, actor: &AuthenticatedUser) -> AppResult<Vec<Booking>> {
        self.service.list_for(actor).await
    }

    pub async fn history(&self, actor: &AuthenticatedUser, id: Uuid) -> AppResult<Vec<BookingStatusLog>> {
        self.service.history(actor, id).await
    }
}
