use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    api::errors::AppError,
    db::models::{Device, DeviceControl, TemperatureSetpoint},
};

/// Setpoint reported while no admin has set one yet.
pub const DEFAULT_SETPOINT_CELSIUS: f64 = 25.0;

/// Singleton control state: one row per actuator and one active setpoint.
///
/// Every write is a single `INSERT .. ON CONFLICT .. DO UPDATE` against a
/// unique key, so concurrent writers can never create a second row.
#[derive(Clone)]
pub struct ControlService {
    pool: SqlitePool,
}

impl ControlService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Devices
    // -----------------------------------------------------------------------

    /// Switch `device` on or off, creating its row on first use.
    pub async fn set_device_state(
        &self,
        device: Device,
        is_on: bool,
    ) -> Result<DeviceControl, AppError> {
        let row = sqlx::query_as::<_, DeviceControl>(
            r#"
            INSERT INTO device_controls (device, is_on, last_updated)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (device) DO UPDATE
                SET is_on = excluded.is_on,
                    last_updated = excluded.last_updated
            RETURNING id, device, is_on, last_updated
            "#,
        )
        .bind(device)
        .bind(is_on)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(device = %row.device, is_on = row.is_on, "Device state updated");
        Ok(row)
    }

    /// Current row for `device`, or `None` if it was never switched.
    pub async fn device_status(&self, device: Device) -> Result<Option<DeviceControl>, AppError> {
        let row = sqlx::query_as::<_, DeviceControl>(
            "SELECT id, device, is_on, last_updated FROM device_controls WHERE device = ?1",
        )
        .bind(device)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// All device rows that exist so far, ordered by device name.
    pub async fn list_devices(&self) -> Result<Vec<DeviceControl>, AppError> {
        let rows = sqlx::query_as::<_, DeviceControl>(
            "SELECT id, device, is_on, last_updated FROM device_controls ORDER BY device",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Setpoint
    // -----------------------------------------------------------------------

    /// Set the target temperature, overwriting the active setpoint in place
    /// or creating it if none exists. `created_at` survives updates.
    pub async fn set_active_setpoint(
        &self,
        temperature: f64,
        owner_id: Option<i64>,
    ) -> Result<TemperatureSetpoint, AppError> {
        if !temperature.is_finite() {
            return Err(AppError::Validation(
                "setpoint must be a finite number".to_owned(),
            ));
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, TemperatureSetpoint>(
            r#"
            INSERT INTO temperature_setpoints
                (setpoint_temperature, owner_id, created_at, updated_at, is_active)
            VALUES (?1, ?2, ?3, ?3, 1)
            ON CONFLICT (is_active) WHERE is_active = 1 DO UPDATE
                SET setpoint_temperature = excluded.setpoint_temperature,
                    owner_id = excluded.owner_id,
                    updated_at = excluded.updated_at
            RETURNING id, setpoint_temperature, owner_id, created_at, updated_at, is_active
            "#,
        )
        .bind(temperature)
        .bind(owner_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(
            setpoint_id = row.id,
            setpoint = row.setpoint_temperature,
            owner_id = ?row.owner_id,
            "Temperature setpoint updated"
        );
        Ok(row)
    }

    /// The active setpoint, or `None` if none was ever set. Callers apply
    /// [`DEFAULT_SETPOINT_CELSIUS`] themselves; nothing is written here.
    pub async fn active_setpoint(&self) -> Result<Option<TemperatureSetpoint>, AppError> {
        let row = sqlx::query_as::<_, TemperatureSetpoint>(
            r#"
            SELECT id, setpoint_temperature, owner_id, created_at, updated_at, is_active
            FROM temperature_setpoints
            WHERE is_active = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }

    // -----------------------------------------------------------------------
    // Devices
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn device_status_is_none_before_first_write(pool: SqlitePool) {
        let service = ControlService::new(pool);
        assert!(service.device_status(Device::Fan).await.unwrap().is_none());
        assert!(service.list_devices().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn set_device_state_twice_keeps_one_row(pool: SqlitePool) {
        let service = ControlService::new(pool.clone());

        let first = service.set_device_state(Device::Fan, true).await.unwrap();
        let second = service.set_device_state(Device::Fan, true).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.last_updated >= first.last_updated);

        let status = service.device_status(Device::Fan).await.unwrap().unwrap();
        assert!(status.is_on);
        assert_eq!(
            count(&pool, "SELECT COUNT(*) FROM device_controls WHERE device = 'fan'").await,
            1
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn set_device_state_flips_in_place(pool: SqlitePool) {
        let service = ControlService::new(pool.clone());

        let on = service.set_device_state(Device::Heater, true).await.unwrap();
        let off = service.set_device_state(Device::Heater, false).await.unwrap();
        assert_eq!(on.id, off.id);
        assert!(!off.is_on);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM device_controls").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn devices_are_independent(pool: SqlitePool) {
        let service = ControlService::new(pool);

        service.set_device_state(Device::Heater, true).await.unwrap();
        service.set_device_state(Device::Fan, false).await.unwrap();

        let devices = service.list_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device, Device::Fan);
        assert!(!devices[0].is_on);
        assert_eq!(devices[1].device, Device::Heater);
        assert!(devices[1].is_on);
    }

    // -----------------------------------------------------------------------
    // Setpoint
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "./migrations")]
    async fn active_setpoint_read_does_not_persist(pool: SqlitePool) {
        let service = ControlService::new(pool.clone());
        assert!(service.active_setpoint().await.unwrap().is_none());
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM temperature_setpoints").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn setpoint_is_created_then_updated_in_place(pool: SqlitePool) {
        let service = ControlService::new(pool.clone());

        let created = service.set_active_setpoint(27.5, None).await.unwrap();
        assert_eq!(created.setpoint_temperature, 27.5);
        assert!(created.is_active);

        let updated = service.set_active_setpoint(30.0, None).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.setpoint_temperature, 30.0);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        assert_eq!(
            count(&pool, "SELECT COUNT(*) FROM temperature_setpoints WHERE is_active = 1").await,
            1
        );
        let active = service.active_setpoint().await.unwrap().unwrap();
        assert_eq!(active.setpoint_temperature, 30.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn second_active_row_is_rejected_by_schema(pool: SqlitePool) {
        let service = ControlService::new(pool.clone());
        service.set_active_setpoint(26.0, None).await.unwrap();

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO temperature_setpoints \
             (setpoint_temperature, created_at, updated_at, is_active) VALUES (?1, ?2, ?2, 1)",
        )
        .bind(20.0)
        .bind(now)
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn setpoint_owner_is_recorded_and_nulled_on_delete(pool: SqlitePool) {
        let owner_id: i64 = sqlx::query_scalar(
            "INSERT INTO admin_users (username, password_hash, created_at) \
             VALUES ('keeper', 'x', ?1) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(&pool)
        .await
        .unwrap();

        let service = ControlService::new(pool.clone());
        let row = service.set_active_setpoint(24.0, Some(owner_id)).await.unwrap();
        assert_eq!(row.owner_id, Some(owner_id));

        sqlx::query("DELETE FROM admin_users WHERE id = ?1")
            .bind(owner_id)
            .execute(&pool)
            .await
            .unwrap();

        let active = service.active_setpoint().await.unwrap().unwrap();
        assert_eq!(active.owner_id, None);
        assert_eq!(active.setpoint_temperature, 24.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn non_finite_setpoint_is_rejected(pool: SqlitePool) {
        let service = ControlService::new(pool);
        let err = service.set_active_setpoint(f64::NAN, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.active_setpoint().await.unwrap().is_none());
    }
}
