use std::{collections::HashMap, sync::Arc, time::Duration};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";

/// A logged-in admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// In-memory store of live admin sessions keyed by token.
///
/// Cloning shares the same map. Expired entries are dropped lazily on
/// lookup and whenever a new session is created.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Start a session for `user_id` and return its token.
    pub async fn create(&self, user_id: i64, username: &str) -> Uuid {
        let now = Utc::now();
        let token = Uuid::new_v4();
        let session = Session {
            user_id,
            username: username.to_owned(),
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut map = self.inner.write().await;
        map.retain(|_, s| s.expires_at > now);
        map.insert(token, session);
        token
    }

    /// Return the live session for `token`, if any.
    pub async fn get(&self, token: &Uuid) -> Option<Session> {
        let now = Utc::now();
        {
            let map = self.inner.read().await;
            match map.get(token) {
                Some(s) if s.expires_at > now => return Some(s.clone()),
                None => return None,
                Some(_) => {}
            }
        }
        self.inner.write().await.remove(token);
        None
    }

    /// Forget `token`. Returns whether it was present.
    pub async fn remove(&self, token: &Uuid) -> bool {
        self.inner.write().await.remove(token).is_some()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Session token carried by the request's cookies, if well formed.
pub fn session_token(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value().trim()).ok())
}

/// Cookie that installs `token` for `max_age_secs`.
pub fn session_cookie(token: &Uuid, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Template handed to `CookieJar::remove`; the path must match the one set
/// at login.
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
