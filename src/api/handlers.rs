use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use utoipa::OpenApi;

use super::{
    admin,
    dto::{
        ControlDeviceRequest, ControlDeviceResponse, DashboardResponse, DeviceControlDto,
        DeviceStatusDto, DeviceStatusResponse, HistoryResponse, LatestSensorResponse,
        SensorDataCreated, SensorDataRequest, SensorReadingDto, SetpointDto, SetpointResponse,
        UpdateSetpointRequest, UpdateSetpointResponse,
    },
    errors::{AppError, AppResult},
    extract::{check_api_key, DeviceKey},
    AppState,
};
use crate::db::models::Device;

// ---------------------------------------------------------------------------
// Device API
// ---------------------------------------------------------------------------

/// Record one reading pushed by the sensor device.
///
/// The key is checked before anything else in the body, so a wrong key is
/// always a 401. A body that is not a JSON object counts as empty.
#[utoipa::path(
    post,
    path = "/api/sensor-data/",
    request_body = SensorDataRequest,
    responses(
        (status = 201, description = "Reading recorded", body = SensorDataCreated),
        (status = 400, description = "Missing or non-numeric temperature/humidity"),
        (status = 401, description = "Invalid API key"),
    ),
    tag = "device"
)]
pub async fn post_sensor_data(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<SensorDataCreated>)> {
    let req: SensorDataRequest = serde_json::from_slice(&body).unwrap_or_default();
    check_api_key(&state, req.api_key.as_ref().and_then(|k| k.as_str()))?;

    let (Some(temperature), Some(humidity)) = (req.temperature, req.humidity) else {
        return Err(AppError::Validation(
            "Missing temperature or humidity".to_owned(),
        ));
    };
    let temperature = temperature
        .as_f64()
        .ok_or_else(|| AppError::Validation("temperature must be a number".to_owned()))?;
    let humidity = humidity
        .as_f64()
        .ok_or_else(|| AppError::Validation("humidity must be a number".to_owned()))?;

    let reading = state.sensors.record_reading(temperature, humidity).await?;

    Ok((
        StatusCode::CREATED,
        Json(SensorDataCreated {
            success: true,
            message: "Sensor data recorded".to_owned(),
            data_id: reading.id,
            timestamp: reading.recorded_at,
        }),
    ))
}

/// Current temperature setpoint, 25.0 if none was ever saved.
#[utoipa::path(
    get,
    path = "/api/get-setpoint/",
    params(("api_key" = String, Query, description = "Device API key")),
    responses(
        (status = 200, description = "Active setpoint", body = SetpointResponse),
        (status = 401, description = "Invalid API key"),
    ),
    tag = "device"
)]
pub async fn get_setpoint(
    _key: DeviceKey,
    State(state): State<AppState>,
) -> AppResult<Json<SetpointResponse>> {
    let setpoint = state.control.active_setpoint().await?;
    Ok(Json(setpoint.into()))
}

/// On/off state of both actuators; a device never switched reads as off.
#[utoipa::path(
    get,
    path = "/api/get-device-status/",
    params(("api_key" = String, Query, description = "Device API key")),
    responses(
        (status = 200, description = "Fan and heater state", body = DeviceStatusResponse),
        (status = 401, description = "Invalid API key"),
    ),
    tag = "device"
)]
pub async fn get_device_status(
    _key: DeviceKey,
    State(state): State<AppState>,
) -> AppResult<Json<DeviceStatusResponse>> {
    let fan = state.control.device_status(Device::Fan).await?;
    let heater = state.control.device_status(Device::Heater).await?;
    Ok(Json(DeviceStatusResponse {
        fan: fan.into(),
        heater: heater.into(),
    }))
}

/// Most recent sensor reading.
#[utoipa::path(
    get,
    path = "/api/latest-sensor/",
    params(("api_key" = String, Query, description = "Device API key")),
    responses(
        (status = 200, description = "Latest reading", body = LatestSensorResponse),
        (status = 401, description = "Invalid API key"),
        (status = 404, description = "No sensor data available"),
    ),
    tag = "device"
)]
pub async fn get_latest_sensor(
    _key: DeviceKey,
    State(state): State<AppState>,
) -> AppResult<Json<LatestSensorResponse>> {
    state
        .sensors
        .latest_reading()
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound("No sensor data available".to_owned()))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        post_sensor_data,
        get_setpoint,
        get_device_status,
        get_latest_sensor,
        admin::update_setpoint,
        admin::control_device,
        admin::dashboard,
        admin::public_dashboard,
        admin::history,
        health,
    ),
    components(schemas(
        SensorDataRequest,
        SensorDataCreated,
        SetpointResponse,
        DeviceStatusDto,
        DeviceStatusResponse,
        LatestSensorResponse,
        UpdateSetpointRequest,
        UpdateSetpointResponse,
        ControlDeviceRequest,
        ControlDeviceResponse,
        DashboardResponse,
        SensorReadingDto,
        DeviceControlDto,
        SetpointDto,
        HistoryResponse,
        Device,
    )),
    tags(
        (name = "device", description = "Endpoints for the sensor device (API key)"),
        (name = "admin",  description = "Admin endpoints (session cookie)"),
        (name = "public", description = "Read-only public endpoints"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Smart Aquarium API",
        version = "0.1.0",
        description = "Telemetry and control API for an aquarium sensor device"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
