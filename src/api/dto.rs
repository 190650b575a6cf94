use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    control::DEFAULT_SETPOINT_CELSIUS,
    db::models::{Device, DeviceControl, SensorReading, TemperatureSetpoint},
    sensors::history::HistoryPage,
};

// ---------------------------------------------------------------------------
// Loose request fields
//
// The sensor device and the admin page send numbers either as JSON numbers
// or as numeric strings. Anything else still deserializes (as `Other`) so a
// malformed field never hides a bad API key behind a parse error.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Numeric value, accepting numbers and trimmed numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Device API
// ---------------------------------------------------------------------------

/// Body of `POST /api/sensor-data/`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SensorDataRequest {
    /// Degrees Celsius (number or numeric string)
    #[schema(value_type = Option<f64>)]
    pub temperature: Option<FieldValue>,
    /// Relative humidity percentage (number or numeric string)
    #[schema(value_type = Option<f64>)]
    pub humidity: Option<FieldValue>,
    #[schema(value_type = Option<String>)]
    pub api_key: Option<FieldValue>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorDataCreated {
    pub success: bool,
    pub message: String,
    pub data_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// `?api_key=` on the device GET endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeyParams {
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetpointResponse {
    /// Degrees Celsius; 25.0 when no setpoint was ever saved
    pub setpoint_temperature: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Option<TemperatureSetpoint>> for SetpointResponse {
    fn from(row: Option<TemperatureSetpoint>) -> Self {
        match row {
            Some(s) => Self {
                setpoint_temperature: s.setpoint_temperature,
                updated_at: Some(s.updated_at),
            },
            None => Self {
                setpoint_temperature: DEFAULT_SETPOINT_CELSIUS,
                updated_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceStatusDto {
    pub is_on: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<Option<DeviceControl>> for DeviceStatusDto {
    fn from(row: Option<DeviceControl>) -> Self {
        match row {
            Some(d) => Self {
                is_on: d.is_on,
                last_updated: Some(d.last_updated),
            },
            None => Self {
                is_on: false,
                last_updated: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceStatusResponse {
    pub fan: DeviceStatusDto,
    pub heater: DeviceStatusDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LatestSensorResponse {
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<SensorReading> for LatestSensorResponse {
    fn from(r: SensorReading) -> Self {
        Self {
            temperature: r.temperature,
            humidity: r.humidity,
            timestamp: r.recorded_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Admin API
// ---------------------------------------------------------------------------

/// Body of `POST /update-setpoint/`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSetpointRequest {
    /// Degrees Celsius (number or numeric string); defaults to 25.0
    #[schema(value_type = Option<f64>)]
    pub setpoint: Option<FieldValue>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSetpointResponse {
    pub success: bool,
    pub message: String,
    pub setpoint: f64,
}

/// Body of `POST /control-device/`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ControlDeviceRequest {
    /// `fan` or `heater`
    #[schema(value_type = Option<String>)]
    pub device: Option<FieldValue>,
    /// `on` switches the device on; anything else switches it off
    #[schema(value_type = Option<String>)]
    pub action: Option<FieldValue>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ControlDeviceResponse {
    pub success: bool,
    pub message: String,
    pub device: Device,
    pub status: bool,
}

// ---------------------------------------------------------------------------
// Dashboards
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorReadingDto {
    pub id: i64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<SensorReading> for SensorReadingDto {
    fn from(r: SensorReading) -> Self {
        Self {
            id: r.id,
            temperature: r.temperature,
            humidity: r.humidity,
            recorded_at: r.recorded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceControlDto {
    pub device: Device,
    pub is_on: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<DeviceControl> for DeviceControlDto {
    fn from(d: DeviceControl) -> Self {
        Self {
            device: d.device,
            is_on: d.is_on,
            last_updated: d.last_updated,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetpointDto {
    /// Degrees Celsius
    pub setpoint_temperature: f64,
    /// Admin who last changed it; `null` once that account is deleted
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TemperatureSetpoint> for SetpointDto {
    fn from(s: TemperatureSetpoint) -> Self {
        Self {
            setpoint_temperature: s.setpoint_temperature,
            owner_id: s.owner_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Everything either dashboard shows.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub latest_sensor: Option<SensorReadingDto>,
    pub devices: Vec<DeviceControlDto>,
    pub setpoint: Option<SetpointDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    /// Kept as text: non-integer values fall back to page 1.
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub page: i64,
    pub num_pages: i64,
    pub page_size: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub readings: Vec<SensorReadingDto>,
}

impl From<HistoryPage> for HistoryResponse {
    fn from(p: HistoryPage) -> Self {
        Self {
            page: p.window.number,
            num_pages: p.window.num_pages,
            page_size: p.window.page_size,
            total: p.window.total,
            has_next: p.window.has_next(),
            has_previous: p.window.has_previous(),
            readings: p.readings.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_accepts_numbers_and_numeric_strings() {
        let body: SensorDataRequest =
            serde_json::from_str(r#"{"temperature": 25.5, "humidity": " 60 ", "api_key": "k"}"#)
                .unwrap();
        assert_eq!(body.temperature.unwrap().as_f64(), Some(25.5));
        assert_eq!(body.humidity.unwrap().as_f64(), Some(60.0));
        assert_eq!(body.api_key.unwrap().as_str(), Some("k"));
    }

    #[test]
    fn field_value_tolerates_odd_shapes() {
        let body: SensorDataRequest =
            serde_json::from_str(r#"{"temperature": {"c": 1}, "humidity": true, "api_key": 5}"#)
                .unwrap();
        assert_eq!(body.temperature.unwrap().as_f64(), None);
        assert_eq!(body.humidity.unwrap().as_f64(), None);
        assert_eq!(body.api_key.unwrap().as_str(), None);
    }

    #[test]
    fn explicit_null_is_treated_as_missing() {
        let body: SensorDataRequest =
            serde_json::from_str(r#"{"temperature": null, "humidity": 1}"#).unwrap();
        assert!(body.temperature.is_none());
    }

    #[test]
    fn missing_setpoint_row_maps_to_default() {
        let dto = SetpointResponse::from(None);
        assert_eq!(dto.setpoint_temperature, DEFAULT_SETPOINT_CELSIUS);
        assert!(dto.updated_at.is_none());
    }

    #[test]
    fn missing_device_row_maps_to_off() {
        let dto = DeviceStatusDto::from(None);
        assert!(!dto.is_on);
        assert!(dto.last_updated.is_none());
    }
}
