pub mod auth;
pub mod availability;
pub mod bookings;
pub mod catalog;
pub mod dashboard;
pub mod extractors;
pub mod health;
pub mod messages;
pub mod metrics;
pub mod providers;
pub mod reviews;

pub use extractors::ApiJson;
