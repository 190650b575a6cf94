use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use super::{extract::AdminSession, AppState};
use crate::auth::{
    session::{session_cookie, session_cookie_removal},
    users,
};

const DEFAULT_LANDING: &str = "/dashboard/";

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

/// Any field may be absent; a missing username or password is simply a
/// failed login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub next: Option<String>,
}

/// Only same-site absolute paths are honoured as `next`.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => DEFAULT_LANDING,
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn login_page(next: &str, error: Option<&str>) -> Html<String> {
    let next = escape_attr(next);
    let error = error
        .map(|e| format!(r#"<p class="error">{e}</p>"#))
        .unwrap_or_default();
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Aquarium admin login</title></head>
<body>
<h1>Aquarium admin</h1>
{error}
<form method="post" action="/login/">
  <input type="hidden" name="next" value="{next}">
  <label>Username <input name="username" autocomplete="username"></label>
  <label>Password <input name="password" type="password" autocomplete="current-password"></label>
  <button type="submit">Log in</button>
</form>
</body>
</html>
"#
    ))
}

pub async fn login_form(Query(params): Query<NextParams>) -> Html<String> {
    login_page(safe_next(params.next.as_deref()), None)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());
    let rejected = || {
        let page = login_page(next, Some("Invalid credentials"));
        (StatusCode::UNAUTHORIZED, page).into_response()
    };

    let (Some(username), Some(password)) = (form.username.as_deref(), form.password.as_deref())
    else {
        warn!("Admin login with missing credentials");
        return rejected();
    };

    let user = match users::authenticate(&state.pool, username, password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(username = %username, "Failed admin login");
            return rejected();
        }
        Err(e) => return e.into_response(),
    };

    let token = state.sessions.create(user.id, &user.username).await;
    info!(username = %user.username, "Admin logged in");

    let jar = jar.add(session_cookie(&token, state.sessions.ttl_secs()));
    (jar, Redirect::to(next)).into_response()
}

pub async fn logout(admin: AdminSession, State(state): State<AppState>, jar: CookieJar) -> Response {
    state.sessions.remove(&admin.token).await;
    info!(username = %admin.session.username, "Admin logged out");

    (jar.remove(session_cookie_removal()), Redirect::to("/login/")).into_response()
}
