pub mod availability;
pub mod booking;
pub mod message;
pub mod provider;
pub mod review;
pub mod service;
pub mod user;

pub use availability::{Availability, CreateAvailabilityRequest, NewAvailability};
pub use booking::{
    Booking, BookingChanges, CreateBookingRequest, NewBooking, UpdateBookingRequest,
    DEFAULT_LOCATION,
};
pub use message::{Message, NewMessage, SendMessageRequest};
pub use provider::{
    CreateProviderRequest, JobStats, NewProviderProfile, ProviderFilter, ProviderProfile,
    ProviderWithDetails, RatingStats, UpdateProviderRequest, VerificationRequest,
};
pub use review::{CreateReviewRequest, NewReview, Review};
pub use service::{
    CreateServiceRequest, NewServiceListing, ServiceFilter, ServiceListing, UpdateServiceRequest,
    DEFAULT_PRICE_UNIT,
};
pub use user::{LoginRequest, NewUser, RegisterRequest, UpdateUserRequest, User};
