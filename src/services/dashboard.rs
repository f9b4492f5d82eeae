use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::own_provider_profile;
use crate::auth::CurrentUser;
use crate::constants::pricing::NET_EARNINGS_SHARE;
use crate::database::repository::{BookingRepository, ReviewRepository};
use crate::database::schema::types::BookingStatus;
use crate::database::Store;
use crate::error::ApiError;
use crate::models::{Booking, ProviderProfile};

/// A client's booking plus whether the review button should be shown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientBookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub can_rate: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDashboard {
    /// pending, confirmed or in progress
    pub active: Vec<ClientBookingView>,
    pub completed: Vec<ClientBookingView>,
    /// cancelled or disputed
    pub other: Vec<ClientBookingView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    #[schema(value_type = String)]
    pub total_earnings: Decimal,
    #[schema(value_type = String)]
    pub net_earnings: Decimal,
    pub active_jobs: usize,
    pub completed_jobs: i32,
    #[schema(value_type = String)]
    pub rating: Decimal,
    pub review_count: i32,
}

impl ProviderStats {
    pub fn new(profile: &ProviderProfile, active_jobs: usize) -> Self {
        Self {
            total_earnings: profile.total_earnings,
            net_earnings: net_earnings(profile.total_earnings),
            active_jobs,
            completed_jobs: profile.completed_jobs,
            rating: profile.rating,
            review_count: profile.review_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDashboard {
    pub profile: ProviderProfile,
    pub stats: ProviderStats,
    pub pending: Vec<Booking>,
    /// confirmed or in progress
    pub active: Vec<Booking>,
}

/// Provider's take-home share of gross earnings. Not rounded.
pub fn net_earnings(total: Decimal) -> Decimal {
    total * NET_EARNINGS_SHARE
}

pub fn partition_client_bookings(
    bookings: Vec<Booking>,
    reviewed: &HashSet<Uuid>,
) -> ClientDashboard {
    let mut dashboard = ClientDashboard::default();
    for booking in bookings {
        let can_rate =
            booking.status == BookingStatus::Completed && !reviewed.contains(&booking.id);
        let view = ClientBookingView { booking, can_rate };
        match view.booking.status {
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress => {
                dashboard.active.push(view)
            }
            BookingStatus::Completed => dashboard.completed.push(view),
            BookingStatus::Cancelled | BookingStatus::Disputed => dashboard.other.push(view),
        }
    }
    dashboard
}

/// Splits into (pending, active). Finished bookings are dropped.
pub fn partition_provider_bookings(bookings: Vec<Booking>) -> (Vec<Booking>, Vec<Booking>) {
    let mut pending = Vec::new();
    let mut active = Vec::new();
    for booking in bookings {
        match booking.status {
            BookingStatus::Pending => pending.push(booking),
            BookingStatus::Confirmed | BookingStatus::InProgress => active.push(booking),
            _ => {}
        }
    }
    (pending, active)
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn client(&self, caller: &CurrentUser) -> Result<ClientDashboard, ApiError> {
        let bookings = self.store.bookings_for_client(caller.id).await?;
        let reviewed: HashSet<Uuid> = self
            .store
            .reviewed_booking_ids(caller.id)
            .await?
            .into_iter()
            .collect();
        Ok(partition_client_bookings(bookings, &reviewed))
    }

    pub async fn provider(&self, caller: &CurrentUser) -> Result<ProviderDashboard, ApiError> {
        let profile = own_provider_profile(self.store.as_ref(), caller.id).await?;
        let bookings = self.store.bookings_for_provider(profile.id).await?;
        let (pending, active) = partition_provider_bookings(bookings);
        Ok(ProviderDashboard {
            stats: ProviderStats::new(&profile, active.len()),
            profile,
            pending,
            active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::types::{BookingType, PaymentStatus};
    use crate::constants::pricing::COMMISSION_RATE;
    use crate::services::booking::commission_for;
    use chrono::Utc;
    use proptest::prelude::*;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            booking_type: BookingType::Instant,
            status,
            scheduled_date: None,
            scheduled_time: None,
            location: "Gulu".to_string(),
            notes: None,
            photos: None,
            estimated_price: Decimal::from(20000),
            final_price: None,
            commission: None,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_client_buckets_and_can_rate() {
        let done = booking(BookingStatus::Completed);
        let reviewed = booking(BookingStatus::Completed);
        let reviewed_ids: HashSet<Uuid> = [reviewed.id].into_iter().collect();
        let bookings = vec![
            booking(BookingStatus::Pending),
            booking(BookingStatus::InProgress),
            done.clone(),
            reviewed.clone(),
            booking(BookingStatus::Cancelled),
        ];

        let dashboard = partition_client_bookings(bookings, &reviewed_ids);
        assert_eq!(dashboard.active.len(), 2);
        assert!(dashboard.active.iter().all(|v| !v.can_rate));
        assert_eq!(dashboard.completed.len(), 2);
        let rate = |id: Uuid| {
            dashboard
                .completed
                .iter()
                .find(|v| v.booking.id == id)
                .map(|v| v.can_rate)
        };
        assert_eq!(rate(done.id), Some(true));
        assert_eq!(rate(reviewed.id), Some(false));
        assert_eq!(dashboard.other.len(), 1);
    }

    #[test]
    fn test_provider_buckets() {
        let (pending, active) = partition_provider_bookings(vec![
            booking(BookingStatus::Pending),
            booking(BookingStatus::Confirmed),
            booking(BookingStatus::InProgress),
            booking(BookingStatus::Completed),
            booking(BookingStatus::Disputed),
        ]);
        assert_eq!(pending.len(), 1);
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_can_rate_serialized_beside_booking_fields() {
        let view = ClientBookingView {
            booking: booking(BookingStatus::Completed),
            can_rate: true,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["canRate"], true);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["type"], "instant");
    }

    #[test]
    fn test_net_earnings_exact() {
        assert_eq!(net_earnings(Decimal::new(15000000, 2)), Decimal::new(13500000, 2));
        assert_eq!(net_earnings(Decimal::new(1, 2)), Decimal::new(9, 3));
        assert_eq!(net_earnings(Decimal::new(5, 2)), Decimal::new(45, 3));
    }

    proptest! {
        #[test]
        fn prop_net_plus_commission_is_total(cents in 1i64..9_999_999_999i64) {
            let total = Decimal::new(cents, 2);
            let net = net_earnings(total);
            let exact_commission = total * COMMISSION_RATE;
            prop_assert!(net <= total);
            prop_assert_eq!(net + exact_commission, total);

            let commission = commission_for(total);
            prop_assert!(commission <= total);
            prop_assert!((commission - exact_commission).abs() <= Decimal::new(5, 3));
        }
    }
}
