pub mod admin;
pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod login;

use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    auth::{ApiKey, SessionStore},
    control::ControlService,
    sensors::SensorService,
};
use handlers::ApiDoc;

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sensors: SensorService,
    pub control: ControlService,
    pub api_key: Arc<ApiKey>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, device_api_key: &str, session_ttl: Duration) -> Self {
        Self {
            sensors: SensorService::new(pool.clone()),
            control: ControlService::new(pool.clone()),
            pool,
            api_key: Arc::new(ApiKey::new(device_api_key)),
            sessions: SessionStore::new(session_ttl),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        // Sensor device, gated by the shared API key
        .route("/api/sensor-data/", post(handlers::post_sensor_data))
        .route("/api/get-setpoint/", get(handlers::get_setpoint))
        .route("/api/get-device-status/", get(handlers::get_device_status))
        .route("/api/latest-sensor/", get(handlers::get_latest_sensor))
        // Admin, gated by the session cookie
        .route("/update-setpoint/", post(admin::update_setpoint))
        .route("/control-device/", post(admin::control_device))
        .route("/dashboard/", get(admin::dashboard))
        .route("/history/", get(admin::history))
        .route("/public-dashboard/", get(admin::public_dashboard))
        .route("/login/", get(login::login_form).post(login::login))
        .route("/logout/", get(login::logout).post(login::logout))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
