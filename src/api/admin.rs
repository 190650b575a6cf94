use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::de::DeserializeOwned;

use super::{
    dto::{
        ControlDeviceRequest, ControlDeviceResponse, DashboardResponse, HistoryParams,
        HistoryResponse, UpdateSetpointRequest, UpdateSetpointResponse,
    },
    errors::{AdminError, AppError, AppResult},
    extract::AdminSession,
    AppState,
};
use crate::{
    control::DEFAULT_SETPOINT_CELSIUS,
    db::models::Device,
    sensors::history::HISTORY_PAGE_SIZE,
};

/// Admin bodies must be JSON objects; anything else is a 400.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AdminError> {
    serde_json::from_slice(body)
        .map_err(|e| AdminError(AppError::Validation(format!("Invalid JSON body: {e}"))))
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// Change the target temperature. A missing `setpoint` means 25.0.
#[utoipa::path(
    post,
    path = "/update-setpoint/",
    request_body = UpdateSetpointRequest,
    responses(
        (status = 200, description = "Setpoint saved", body = UpdateSetpointResponse),
        (status = 303, description = "No session; redirect to login"),
        (status = 400, description = "Invalid setpoint"),
    ),
    tag = "admin"
)]
pub async fn update_setpoint(
    admin: AdminSession,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateSetpointResponse>, AdminError> {
    let req: UpdateSetpointRequest = parse_body(&body)?;

    let temperature = match req.setpoint {
        None => DEFAULT_SETPOINT_CELSIUS,
        Some(v) => v
            .as_f64()
            .ok_or_else(|| AppError::Validation("setpoint must be a number".to_owned()))?,
    };

    let row = state
        .control
        .set_active_setpoint(temperature, Some(admin.session.user_id))
        .await?;

    Ok(Json(UpdateSetpointResponse {
        success: true,
        // `{:?}` keeps the `.0` on whole degrees
        message: format!("Setpoint updated to {:?}°C", row.setpoint_temperature),
        setpoint: row.setpoint_temperature,
    }))
}

/// Switch the fan or heater. Only `action: "on"` turns it on; any other
/// value, or none, turns it off.
#[utoipa::path(
    post,
    path = "/control-device/",
    request_body = ControlDeviceRequest,
    responses(
        (status = 200, description = "Device switched", body = ControlDeviceResponse),
        (status = 303, description = "No session; redirect to login"),
        (status = 400, description = "Invalid device or malformed body"),
    ),
    tag = "admin"
)]
pub async fn control_device(
    _admin: AdminSession,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ControlDeviceResponse>, AdminError> {
    let req: ControlDeviceRequest = parse_body(&body)?;

    let device: Device = req
        .device
        .as_ref()
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| AppError::Validation("Invalid device".to_owned()))?;

    let action = req.action.as_ref().and_then(|a| a.as_str());
    let is_on = action == Some("on");

    let row = state.control.set_device_state(device, is_on).await?;

    let shown = match action {
        Some(a) => a.to_uppercase(),
        None if row.is_on => "ON".to_owned(),
        None => "OFF".to_owned(),
    };

    Ok(Json(ControlDeviceResponse {
        success: true,
        message: format!("{} turned {shown}", row.device.label()),
        device: row.device,
        status: row.is_on,
    }))
}

// ---------------------------------------------------------------------------
// Dashboards
// ---------------------------------------------------------------------------

async fn snapshot(state: &AppState) -> AppResult<DashboardResponse> {
    let latest_sensor = state.sensors.latest_reading().await?;
    let devices = state.control.list_devices().await?;
    let setpoint = state.control.active_setpoint().await?;

    Ok(DashboardResponse {
        latest_sensor: latest_sensor.map(Into::into),
        devices: devices.into_iter().map(Into::into).collect(),
        setpoint: setpoint.map(Into::into),
    })
}

/// Admin dashboard data.
#[utoipa::path(
    get,
    path = "/dashboard/",
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardResponse),
        (status = 303, description = "No session; redirect to login"),
    ),
    tag = "admin"
)]
pub async fn dashboard(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardResponse>> {
    Ok(Json(snapshot(&state).await?))
}

/// Read-only dashboard data, no login required.
#[utoipa::path(
    get,
    path = "/public-dashboard/",
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardResponse),
    ),
    tag = "public"
)]
pub async fn public_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    Ok(Json(snapshot(&state).await?))
}

/// Sensor history, newest first, 50 readings per page.
#[utoipa::path(
    get,
    path = "/history/",
    params(("page" = Option<String>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "One page of readings", body = HistoryResponse),
        (status = 303, description = "No session; redirect to login"),
    ),
    tag = "admin"
)]
pub async fn history(
    _admin: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<HistoryResponse>> {
    let page = state
        .sensors
        .history_page(params.page.as_deref(), HISTORY_PAGE_SIZE)
        .await?;
    Ok(Json(page.into()))
}
