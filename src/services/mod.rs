pub mod auth;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod dashboard;
pub mod message;
pub mod provider;
pub mod review;

pub use auth::AuthService;
pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use catalog::CatalogService;
pub use dashboard::DashboardService;
pub use message::MessageService;
pub use provider::ProviderService;
pub use review::ReviewService;

use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::database::repository::ProviderRepository;
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{Booking, ProviderProfile};

/// The caller's own provider profile, or `ProviderProfileRequired`.
pub(crate) async fn own_provider_profile(
    store: &dyn Store,
    user_id: Uuid,
) -> Result<ProviderProfile, ApiError> {
    store
        .find_provider_by_user(user_id)
        .await?
        .ok_or_else(ApiError::provider_profile_required)
}

/// Which side of a booking the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client,
    Provider,
    Admin,
}

/// Resolves the caller's role in `booking`; strangers get `ResourceAccessDenied`.
pub(crate) async fn booking_party(
    store: &dyn Store,
    caller: &CurrentUser,
    booking: &Booking,
) -> Result<(Party, ProviderProfile), ApiError> {
    let provider = store
        .find_provider(booking.provider_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Booking {} has no provider", booking.id)))?;

    let party = if booking.client_id == caller.id {
        Party::Client
    } else if provider.user_id == caller.id {
        Party::Provider
    } else if caller.is_admin() {
        Party::Admin
    } else {
        return Err(ApiError::access_denied("booking"));
    };
    Ok((party, provider))
}
