use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

use crate::database::schema::types::{
    BookingStatus, BookingType, PaymentStatus, ProviderTier, ServiceCategory, UserRole,
    VerificationStatus,
};
use crate::handlers::health::{HealthStatus, ServiceHealth};
use crate::models::*;
use crate::services::dashboard::{
    ClientBookingView, ClientDashboard, ProviderDashboard, ProviderStats,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ServiceHub API",
        description = "Local services marketplace: provider profiles, service listings, bookings and reviews",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::readiness_check,
        crate::handlers::metrics::get_prometheus_metrics,

        // Authentication
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::current_user,
        crate::handlers::auth::update_current_user,
        crate::handlers::auth::login_redirect,
        crate::handlers::auth::logout_redirect,
        crate::handlers::auth::logout,

        // Bookings
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::client_bookings,
        crate::handlers::bookings::provider_bookings,
        crate::handlers::bookings::get_booking,
        crate::handlers::bookings::update_booking,

        // Providers
        crate::handlers::providers::list_providers,
        crate::handlers::providers::get_provider,
        crate::handlers::providers::create_provider,
        crate::handlers::providers::update_provider,
        crate::handlers::providers::set_verification,

        // Services
        crate::handlers::catalog::list_services,
        crate::handlers::catalog::provider_services,
        crate::handlers::catalog::create_service,
        crate::handlers::catalog::update_service,
        crate::handlers::catalog::delete_service,

        // Availability
        crate::handlers::availability::list_availability,
        crate::handlers::availability::create_availability,
        crate::handlers::availability::delete_availability,

        // Reviews and messages
        crate::handlers::reviews::create_review,
        crate::handlers::reviews::provider_reviews,
        crate::handlers::messages::send_message,
        crate::handlers::messages::list_messages,
        crate::handlers::messages::mark_read,

        // Dashboards
        crate::handlers::dashboard::client_dashboard,
        crate::handlers::dashboard::provider_dashboard,
    ),
    components(
        schemas(
            HealthStatus, ServiceHealth,
            User, RegisterRequest, LoginRequest, UpdateUserRequest,
            ProviderProfile, ProviderWithDetails, CreateProviderRequest, UpdateProviderRequest,
            VerificationRequest,
            ServiceListing, CreateServiceRequest, UpdateServiceRequest,
            Booking, CreateBookingRequest, UpdateBookingRequest,
            Review, CreateReviewRequest,
            Message, SendMessageRequest,
            Availability, CreateAvailabilityRequest,
            ClientBookingView, ClientDashboard, ProviderDashboard, ProviderStats,
            UserRole, BookingStatus, BookingType, PaymentStatus, ProviderTier,
            ServiceCategory, VerificationStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "metrics", description = "Prometheus metrics"),
        (name = "auth", description = "Registration and sessions"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "providers", description = "Provider profiles"),
        (name = "services", description = "Service listings"),
        (name = "availability", description = "Weekly provider availability"),
        (name = "reviews", description = "Reviews of completed bookings"),
        (name = "messages", description = "Per-booking conversation"),
        (name = "dashboard", description = "Client and provider dashboards"),
        (name = "admin", description = "Provider verification (admin only)"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("sid"))),
            );
        }
    }
}
