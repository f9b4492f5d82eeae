//! Typed async client for the marketplace API.
//!
//! Keeps the session cookie in a cookie jar, caches read queries by path,
//! retries failed reads and drops the affected cache entries after every
//! mutation. Any 401 surfaces as [`ClientError::Unauthorized`] carrying the
//! login URL the caller should send the user to.

pub mod cache;
pub mod wizard;

pub use cache::QueryCache;
pub use wizard::{parse_price_label, BookingWizard, WizardError, WizardStep};

use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::constants::client::{MAX_QUERY_FAILURES, REQUEST_TIMEOUT_SECS};
use crate::models::{
    Availability, Booking, CreateAvailabilityRequest, CreateBookingRequest,
    CreateProviderRequest, CreateReviewRequest, CreateServiceRequest, LoginRequest, Message,
    ProviderFilter, ProviderProfile, ProviderWithDetails, RegisterRequest, Review,
    SendMessageRequest, ServiceFilter, ServiceListing, UpdateBookingRequest,
    UpdateProviderRequest, UpdateServiceRequest, UpdateUserRequest, User,
};
use crate::services::dashboard::{ClientDashboard, ProviderDashboard};

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Session missing or expired; send the user to `login_url`.
    #[error("Authentication required. Please log in")]
    Unauthorized { login_url: String },

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Wizard(#[from] WizardError),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Read queries are retried while fewer than `max_failures` attempts have
/// failed. A 401 is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_failures: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_failures: MAX_QUERY_FAILURES,
        }
    }
}

impl RetryPolicy {
    pub fn never() -> Self {
        Self { max_failures: 0 }
    }

    /// `failures` counts the attempts that failed before this one.
    pub fn should_retry(&self, failures: u32, error: &ClientError) -> bool {
        !error.is_unauthorized() && failures < self.max_failures
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Server origin, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Path of the redirect-based login entry point
    pub login_path: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            login_path: "/api/login".to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct MarketplaceClient {
    http: reqwest::Client,
    base_url: String,
    login_url: String,
    retry: RetryPolicy,
    cache: QueryCache,
}

impl MarketplaceClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let base_url = options.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            login_url: format!("{}{}", base_url, options.login_path),
            base_url,
            http,
            retry: options.retry,
            cache: QueryCache::new(),
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientOptions {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    // ─── Auth ──────────────────────────────────────────────────────

    /// `None` when nobody is signed in; never retried.
    pub async fn current_user(&self) -> Result<Option<User>, ClientError> {
        const KEY: &str = "/api/auth/user";
        if let Some(user) = self.cache.get(KEY) {
            return Ok(Some(user));
        }
        match self.fetch(KEY).await {
            Ok(value) => {
                self.cache.insert(KEY, value.clone());
                decode(value).map(Some)
            }
            Err(ClientError::Unauthorized { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        let user = self
            .mutate(Method::POST, "/api/auth/register", Some(request), &[])
            .await?;
        self.cache.clear();
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = self
            .mutate(Method::POST, "/api/auth/login", Some(&request), &[])
            .await?;
        self.cache.clear();
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute(Method::POST, "/api/auth/logout", None::<&()>)
            .await?;
        self.cache.clear();
        Ok(())
    }

    pub async fn update_profile(&self, request: &UpdateUserRequest) -> Result<User, ClientError> {
        self.mutate(Method::PUT, "/api/auth/user", Some(request), &["/api/auth/user"])
            .await
    }

    // ─── Providers ─────────────────────────────────────────────────

    pub async fn providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderWithDetails>, ClientError> {
        let key = query_key(
            "/api/providers",
            &[
                ("category", filter.category.map(|c| c.as_str().to_string())),
                ("verified", filter.verified.map(|v| v.to_string())),
                ("location", filter.location.clone()),
                ("isOnline", filter.is_online.map(|v| v.to_string())),
                ("userId", filter.user_id.map(|v| v.to_string())),
            ],
        );
        self.query(&key).await
    }

    pub async fn provider(&self, id: Uuid) -> Result<ProviderWithDetails, ClientError> {
        self.query(&format!("/api/providers/{}", id)).await
    }

    pub async fn create_provider(
        &self,
        request: &CreateProviderRequest,
    ) -> Result<ProviderProfile, ClientError> {
        self.mutate(
            Method::POST,
            "/api/providers",
            Some(request),
            &["/api/providers", "/api/auth/user"],
        )
        .await
    }

    pub async fn update_provider(
        &self,
        id: Uuid,
        request: &UpdateProviderRequest,
    ) -> Result<ProviderProfile, ClientError> {
        self.mutate(
            Method::PUT,
            &format!("/api/providers/{}", id),
            Some(request),
            &["/api/providers", "/api/dashboard/provider"],
        )
        .await
    }

    pub async fn availability(&self, provider_id: Uuid) -> Result<Vec<Availability>, ClientError> {
        self.query(&format!("/api/providers/{}/availability", provider_id))
            .await
    }

    pub async fn add_availability(
        &self,
        provider_id: Uuid,
        request: &CreateAvailabilityRequest,
    ) -> Result<Availability, ClientError> {
        let path = format!("/api/providers/{}/availability", provider_id);
        self.mutate(Method::POST, &path, Some(request), &[path.as_str()])
            .await
    }

    pub async fn remove_availability(&self, id: Uuid) -> Result<(), ClientError> {
        self.execute(Method::DELETE, &format!("/api/availability/{}", id), None::<&()>)
            .await?;
        self.cache.invalidate("/api/providers");
        Ok(())
    }

    // ─── Services ──────────────────────────────────────────────────

    pub async fn services(&self, filter: &ServiceFilter) -> Result<Vec<ServiceListing>, ClientError> {
        let key = query_key(
            "/api/services",
            &[
                ("category", filter.category.map(|c| c.as_str().to_string())),
                ("providerId", filter.provider_id.map(|v| v.to_string())),
            ],
        );
        self.query(&key).await
    }

    pub async fn provider_services(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceListing>, ClientError> {
        self.query(&format!("/api/services/provider/{}", provider_id))
            .await
    }

    pub async fn create_service(
        &self,
        request: &CreateServiceRequest,
    ) -> Result<ServiceListing, ClientError> {
        self.mutate(Method::POST, "/api/services", Some(request), &["/api/services"])
            .await
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        request: &UpdateServiceRequest,
    ) -> Result<ServiceListing, ClientError> {
        self.mutate(
            Method::PUT,
            &format!("/api/services/{}", id),
            Some(request),
            &["/api/services"],
        )
        .await
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<(), ClientError> {
        self.execute(Method::DELETE, &format!("/api/services/{}", id), None::<&()>)
            .await?;
        self.cache.invalidate("/api/services");
        Ok(())
    }

    // ─── Bookings ──────────────────────────────────────────────────

    pub async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<Booking, ClientError> {
        self.mutate(Method::POST, "/api/bookings", Some(request), BOOKING_KEYS)
            .await
    }

    /// Submits a wizard sitting on its confirm step and resets it on success.
    pub async fn submit_wizard(&self, wizard: &mut BookingWizard) -> Result<Booking, ClientError> {
        let request = wizard.request()?;
        let booking = self.create_booking(&request).await?;
        wizard.reset();
        Ok(booking)
    }

    pub async fn update_booking(
        &self,
        id: Uuid,
        request: &UpdateBookingRequest,
    ) -> Result<Booking, ClientError> {
        self.mutate(
            Method::PUT,
            &format!("/api/bookings/{}", id),
            Some(request),
            BOOKING_KEYS,
        )
        .await
    }

    pub async fn client_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        self.query("/api/bookings/client").await
    }

    pub async fn provider_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        self.query("/api/bookings/provider").await
    }

    pub async fn booking(&self, id: Uuid) -> Result<Booking, ClientError> {
        self.query(&format!("/api/bookings/{}", id)).await
    }

    // ─── Reviews and messages ──────────────────────────────────────

    pub async fn create_review(&self, request: &CreateReviewRequest) -> Result<Review, ClientError> {
        self.mutate(
            Method::POST,
            "/api/reviews",
            Some(request),
            &["/api/reviews", "/api/bookings", "/api/dashboard", "/api/providers"],
        )
        .await
    }

    pub async fn provider_reviews(&self, provider_id: Uuid) -> Result<Vec<Review>, ClientError> {
        self.query(&format!("/api/reviews/provider/{}", provider_id))
            .await
    }

    pub async fn messages(&self, booking_id: Uuid) -> Result<Vec<Message>, ClientError> {
        self.query(&format!("/api/bookings/{}/messages", booking_id))
            .await
    }

    pub async fn send_message(
        &self,
        booking_id: Uuid,
        content: impl Into<String>,
    ) -> Result<Message, ClientError> {
        let path = format!("/api/bookings/{}/messages", booking_id);
        let request = SendMessageRequest {
            content: content.into(),
        };
        self.mutate(Method::POST, &path, Some(&request), &[path.as_str()])
            .await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Message, ClientError> {
        let message: Message = self
            .mutate(Method::PUT, &format!("/api/messages/{}/read", id), None::<&()>, &[])
            .await?;
        self.cache
            .invalidate(&format!("/api/bookings/{}/messages", message.booking_id));
        Ok(message)
    }

    // ─── Dashboards ────────────────────────────────────────────────

    pub async fn client_dashboard(&self) -> Result<ClientDashboard, ClientError> {
        self.query("/api/dashboard/client").await
    }

    pub async fn provider_dashboard(&self) -> Result<ProviderDashboard, ClientError> {
        self.query("/api/dashboard/provider").await
    }

    // ─── Internal helpers ──────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Cached GET with the retry policy applied.
    async fn query<T: DeserializeOwned>(&self, key: &str) -> Result<T, ClientError> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }

        let mut failures = 0;
        let value = loop {
            match self.fetch(key).await {
                Ok(value) => break value,
                Err(e) if self.retry.should_retry(failures, &e) => {
                    failures += 1;
                    debug!(path = key, failures, error = %e, "Retrying query");
                }
                Err(e) => return Err(e),
            }
        };

        self.cache.insert(key, value.clone());
        decode(value)
    }

    async fn fetch(&self, path: &str) -> Result<Value, ClientError> {
        let response = self.execute(Method::GET, path, None::<&()>).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Single attempt; on success the listed cache prefixes are dropped.
    async fn mutate<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        invalidates: &[&str],
    ) -> Result<T, ClientError> {
        let response = self.execute(method, path, body).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        for prefix in invalidates {
            self.cache.invalidate(prefix);
        }
        decode(value)
    }

    async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized {
                login_url: self.login_url.clone(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        Err(api_error(status, &text))
    }
}

const BOOKING_KEYS: &[&str] = &["/api/bookings", "/api/dashboard"];

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Pulls `error.message` / `error.code` out of the server's error body.
fn api_error(status: StatusCode, body: &str) -> ClientError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    let code = error
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);

    ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Cache key and request path: `path?k=v&...` with unset params left out.
fn query_key(path: &str, params: &[(&str, Option<String>)]) -> String {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (*k, v)))
        .collect();
    if pairs.is_empty() {
        return path.to_string();
    }
    match Url::parse_with_params("http://query.local/", &pairs) {
        Ok(url) => format!("{}?{}", path, url.query().unwrap_or_default()),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::types::ServiceCategory;

    #[test]
    fn test_retry_policy() {
        let policy = RetryPolicy::default();
        let server = ClientError::Api {
            status: 500,
            code: None,
            message: "boom".to_string(),
        };
        let unauthorized = ClientError::Unauthorized {
            login_url: "/api/login".to_string(),
        };
        assert!(policy.should_retry(0, &server));
        assert!(policy.should_retry(2, &server));
        assert!(!policy.should_retry(3, &server));
        assert!(!policy.should_retry(0, &unauthorized));
        assert!(!RetryPolicy::never().should_retry(0, &server));
    }

    #[test]
    fn test_query_key_skips_unset_params() {
        assert_eq!(query_key("/api/services", &[("category", None)]), "/api/services");
        assert_eq!(
            query_key(
                "/api/providers",
                &[
                    ("category", Some(ServiceCategory::HomeServices.as_str().to_string())),
                    ("location", Some("Kampala Central".to_string())),
                ]
            ),
            "/api/providers?category=home_services&location=Kampala+Central"
        );
    }

    #[test]
    fn test_api_error_reads_server_body() {
        let body = r#"{"error":{"code":"BIZ_5001","code_number":5001,"message":"Invalid status transition"}}"#;
        match api_error(StatusCode::CONFLICT, body) {
            ClientError::Api { status, code, message } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("BIZ_5001"));
                assert_eq!(message, "Invalid status transition");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match api_error(StatusCode::BAD_GATEWAY, "") {
            ClientError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
