use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Actuators the admin can switch. Stored as lowercase text in
/// `device_controls.device`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
    ToSchema,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Fan,
    Heater,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Fan => "fan",
            Device::Heater => "heater",
        }
    }

    /// Capitalised name used in human-readable messages.
    pub fn label(self) -> &'static str {
        match self {
            Device::Fan => "Fan",
            Device::Heater => "Heater",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = UnknownDevice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fan" => Ok(Self::Fan),
            "heater" => Ok(Self::Heater),
            other => Err(UnknownDevice(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown device: {0:?}")]
pub struct UnknownDevice(pub String);

/// One temperature/humidity sample pushed by the sensor device.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeviceControl {
    pub id: i64,
    pub device: Device,
    pub is_on: bool,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TemperatureSetpoint {
    pub id: i64,
    /// Degrees Celsius
    pub setpoint_temperature: f64,
    /// `None` once the admin who set it has been deleted.
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
