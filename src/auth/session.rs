//! Server-side sessions carried by a signed cookie.
//!
//! The cookie value is `<sid>.<hex HMAC-SHA256(sid)>`; the session row
//! (`sessions.sess = {"userId": …}`) lives in the store.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::database::repository::SessionRepository;
use crate::database::Store;
use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

const SESSION_ID_BYTES: usize = 32;

/// JSON payload stored in `sessions.sess`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub sid: String,
    pub user_id: Uuid,
    pub expire: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire <= now
    }
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    key: Arc<Vec<u8>>,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn Store>, config: &SessionConfig, secure: bool) -> Self {
        Self {
            store,
            key: Arc::new(config.secret.as_bytes().to_vec()),
            cookie_name: config.cookie_name.clone(),
            ttl: Duration::hours(config.ttl_hours),
            secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    /// `<sid>.<signature>`
    pub fn sign(&self, sid: &str) -> String {
        let mut mac = self.mac();
        mac.update(sid.as_bytes());
        format!("{}.{}", sid, hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the session id when the signature checks out.
    pub fn verify(&self, cookie_value: &str) -> Option<String> {
        let (sid, signature) = cookie_value.rsplit_once('.')?;
        if sid.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(sid.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(sid.to_string())
    }

    /// Raw value of this manager's cookie from any `Cookie` header.
    pub fn cookie_value<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| raw.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }

    pub fn set_cookie(&self, signed: &str) -> HeaderValue {
        self.cookie_header(signed, self.ttl.num_seconds())
    }

    pub fn clear_cookie(&self) -> HeaderValue {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age: i64) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        // Name, hex and the fixed attributes are all visible ASCII
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    /// Persists a fresh session for `user_id` and returns the `Set-Cookie` value.
    pub async fn start(&self, user_id: Uuid) -> Result<HeaderValue, ApiError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let sid = hex::encode(bytes);

        let record = SessionRecord {
            sid: sid.clone(),
            user_id,
            expire: Utc::now() + self.ttl,
        };
        self.store.save_session(&record).await?;
        debug!(user_id = %user_id, "Session started");

        Ok(self.set_cookie(&self.sign(&sid)))
    }

    /// Looks up the live session behind the request's cookie, if any.
    /// Expired rows are deleted on sight.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionRecord>, ApiError> {
        let Some(sid) = self.cookie_value(headers).and_then(|v| self.verify(v)) else {
            return Ok(None);
        };
        let Some(record) = self.store.load_session(&sid).await? else {
            return Ok(None);
        };
        if record.is_expired(Utc::now()) {
            self.store.delete_session(&sid).await?;
            debug!(user_id = %record.user_id, "Expired session discarded");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Deletes the request's session and returns the clearing `Set-Cookie` value.
    pub async fn end(&self, headers: &HeaderMap) -> Result<HeaderValue, ApiError> {
        if let Some(sid) = self.cookie_value(headers).and_then(|v| self.verify(v)) {
            self.store.delete_session(&sid).await?;
        }
        Ok(self.clear_cookie())
    }

    pub async fn purge_expired(&self) -> Result<u64, ApiError> {
        self.store.purge_expired_sessions(Utc::now()).await
    }
}
