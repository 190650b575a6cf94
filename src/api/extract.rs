use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;
use uuid::Uuid;

use super::{dto::ApiKeyParams, errors::AppError, AppState};
use crate::auth::{session::session_token, Session};

/// Characters left as-is in the `next` parameter; everything else, the
/// query's `?`, `=` and `&` included, is escaped.
const NEXT_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const INVALID_API_KEY: &str = "Invalid API key";

/// Shared-secret gate for the device endpoints.
///
/// Fails with `401 {"error": "Invalid API key"}` on a wrong or missing key.
pub fn check_api_key(state: &AppState, provided: Option<&str>) -> Result<(), AppError> {
    if state.api_key.verify(provided.unwrap_or_default()) {
        Ok(())
    } else {
        warn!("Rejected device request with invalid API key");
        Err(AppError::Authentication(INVALID_API_KEY.to_owned()))
    }
}

/// Device caller authenticated through `?api_key=`.
#[derive(Debug, Clone, Copy)]
pub struct DeviceKey;

impl FromRequestParts<AppState> for DeviceKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let params = Query::<ApiKeyParams>::try_from_uri(&parts.uri)
            .map(|Query(p)| p)
            .unwrap_or_default();
        check_api_key(state, params.api_key.as_deref())?;
        Ok(DeviceKey)
    }
}

/// Logged-in admin, taken from the `session_id` cookie.
///
/// Requests without a live session are redirected to the login page with
/// the requested path and query in `next`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: Uuid,
    pub session: Session,
}

pub struct LoginRedirect(String);

impl LoginRedirect {
    fn location(&self) -> String {
        format!("/login/?next={}", utf8_percent_encode(&self.0, NEXT_ESCAPE))
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location()).into_response()
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&CookieJar::from_headers(&parts.headers));

        let found = match token {
            Some(token) => state.sessions.get(&token).await.map(|s| (token, s)),
            None => None,
        };

        match found {
            Some((token, session)) => Ok(AdminSession { token, session }),
            None => {
                let requested = parts
                    .uri
                    .path_and_query()
                    .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
                Err(LoginRedirect(requested.to_owned()))
            }
        }
    }
}
