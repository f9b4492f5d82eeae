#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use servicehub::auth::password::PasswordService;
use servicehub::config::Config;
use servicehub::database::repository::UserRepository;
use servicehub::database::schema::types::UserRole;
use servicehub::database::{MemoryStore, Store};
use servicehub::models::NewUser;
use servicehub::router::build_router;
use servicehub::AppState;

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` pair from `Set-Cookie`, ready for a `Cookie` header.
    pub fn session_cookie(&self) -> Option<String> {
        let raw = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        raw.split(';').next().map(|pair| pair.trim().to_string())
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Result<Self> {
        let config = Config::from_lookup(|_| None)?;
        let state = AppState::new(store, config, None).with_bcrypt_cost(4);
        Ok(Self {
            router: build_router(state.clone()),
            state,
        })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, cookie, Some(body)).await
    }

    /// Registers a user and returns the session cookie.
    pub async fn register(&self, email: &str, role: &str) -> Result<String> {
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "firstName": "Test",
                    "location": "Kampala",
                    "role": role,
                }),
            )
            .await?;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response
            .session_cookie()
            .ok_or_else(|| anyhow::anyhow!("register did not set a session cookie"))
    }

    /// Admins cannot self-register; seed one directly and log in.
    pub async fn admin(&self) -> Result<String> {
        let password_hash = PasswordService::hash_with_cost(PASSWORD, 4).await?;
        self.state
            .store
            .create_user(NewUser {
                email: "admin@servicehub.test".to_string(),
                password_hash,
                first_name: Some("Ada".to_string()),
                last_name: None,
                phone: None,
                location: None,
                role: UserRole::Admin,
            })
            .await?;
        let response = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": "admin@servicehub.test", "password": PASSWORD }),
            )
            .await?;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response
            .session_cookie()
            .ok_or_else(|| anyhow::anyhow!("login did not set a session cookie"))
    }
}

/// A provider with one listed service plus a registered client.
pub struct Marketplace {
    pub app: TestApp,
    pub provider_cookie: String,
    pub client_cookie: String,
    pub provider_id: String,
    pub service_id: String,
}

impl Marketplace {
    pub async fn new() -> Result<Self> {
        Self::on(TestApp::new()?, "servicehub.test").await
    }

    /// `domain` keeps emails unique when the store outlives the test.
    pub async fn on(app: TestApp, domain: &str) -> Result<Self> {
        let provider_cookie = app.register(&format!("fixer@{}", domain), "provider").await?;
        let client_cookie = app.register(&format!("client@{}", domain), "client").await?;

        let profile = app
            .post(
                "/api/providers",
                Some(&provider_cookie),
                json!({ "bio": "Plumbing and electrical", "isOnline": true }),
            )
            .await?;
        assert_eq!(profile.status, StatusCode::CREATED, "{}", profile.body);
        let provider_id = profile.body["id"].as_str().unwrap_or_default().to_string();

        let service = app
            .post(
                "/api/services",
                Some(&provider_cookie),
                json!({
                    "category": "home_services",
                    "name": "Pipe repair",
                    "price": "20000",
                    "priceUnit": "per job",
                }),
            )
            .await?;
        assert_eq!(service.status, StatusCode::CREATED, "{}", service.body);
        let service_id = service.body["id"].as_str().unwrap_or_default().to_string();

        Ok(Self {
            app,
            provider_cookie,
            client_cookie,
            provider_id,
            service_id,
        })
    }

    pub fn booking_body(&self) -> Value {
        json!({
            "providerId": self.provider_id,
            "serviceId": self.service_id,
            "type": "instant",
            "location": "Ntinda",
            "estimatedPrice": "20000",
        })
    }

    pub async fn book(&self) -> Result<String> {
        let response = self
            .app
            .post("/api/bookings", Some(&self.client_cookie), self.booking_body())
            .await?;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        Ok(response.body["id"].as_str().unwrap_or_default().to_string())
    }

    pub async fn set_status(&self, booking_id: &str, status: &str) -> Result<TestResponse> {
        self.app
            .put(
                &format!("/api/bookings/{}", booking_id),
                Some(&self.provider_cookie),
                json!({ "status": status }),
            )
            .await
    }

    /// Walks a fresh booking to `completed`.
    pub async fn completed_booking(&self) -> Result<String> {
        let id = self.book().await?;
        for status in ["confirmed", "in_progress", "completed"] {
            let response = self.set_status(&id, status).await?;
            assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        }
        Ok(id)
    }
}
