use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::database::repository::{BookingRepository, ProviderRepository, ReviewRepository};
use crate::database::schema::types::BookingStatus;
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{CreateReviewRequest, NewReview, Review};

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// One review per completed booking, written by that booking's client.
    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateReviewRequest,
    ) -> Result<Review, ApiError> {
        request.validate()?;

        let booking = self
            .store
            .find_booking(request.booking_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking"))?;
        if booking.client_id != caller.id {
            return Err(ApiError::access_denied("booking"));
        }
        if booking.status != BookingStatus::Completed {
            return Err(ApiError::review_not_allowed(format!(
                "Only completed bookings can be reviewed; this one is {}",
                booking.status
            )));
        }
        if let Some(provider_id) = request.provider_id {
            if provider_id != booking.provider_id {
                return Err(ApiError::validation_field(
                    "providerId",
                    "Provider does not match the booking",
                ));
            }
        }

        let review = self
            .store
            .create_review(NewReview {
                booking_id: booking.id,
                client_id: caller.id,
                provider_id: booking.provider_id,
                rating: request.rating,
                comment: request
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            })
            .await?;

        metrics::counter!("reviews_created_total").increment(1);
        info!(
            review_id = %review.id,
            booking_id = %booking.id,
            rating = review.rating,
            "Review created"
        );
        Ok(review)
    }

    pub async fn for_provider(&self, provider_id: Uuid) -> Result<Vec<Review>, ApiError> {
        if self.store.find_provider(provider_id).await?.is_none() {
            return Err(ApiError::not_found("Provider"));
        }
        self.store.reviews_for_provider(provider_id).await
    }
}
