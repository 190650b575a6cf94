use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::history::{HistoryPage, PageWindow};
use crate::{api::errors::AppError, db::models::SensorReading};

/// Append-only log of readings pushed by the sensor device.
#[derive(Clone)]
pub struct SensorService {
    pool: SqlitePool,
}

impl SensorService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one reading stamped with the current server time.
    pub async fn record_reading(
        &self,
        temperature: f64,
        humidity: f64,
    ) -> Result<SensorReading, AppError> {
        if !temperature.is_finite() || !humidity.is_finite() {
            return Err(AppError::Validation(
                "temperature and humidity must be finite numbers".to_owned(),
            ));
        }

        let reading = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (temperature, humidity, recorded_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, temperature, humidity, recorded_at
            "#,
        )
        .bind(temperature)
        .bind(humidity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(
            reading_id = reading.id,
            temperature = reading.temperature,
            humidity = reading.humidity,
            "Sensor reading recorded"
        );
        Ok(reading)
    }

    /// The most recent reading, or `None` while the log is empty.
    pub async fn latest_reading(&self) -> Result<Option<SensorReading>, AppError> {
        let row = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, temperature, humidity, recorded_at
            FROM sensor_readings
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sensor_readings")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// One page of the log, newest first. `requested` is the raw `?page=`
    /// value; see [`PageWindow::resolve`] for how odd values are handled.
    pub async fn history_page(
        &self,
        requested: Option<&str>,
        page_size: i64,
    ) -> Result<HistoryPage, AppError> {
        let total = self.count().await?;
        let window = PageWindow::resolve(requested, total, page_size);

        let readings = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, temperature, humidity, recorded_at
            FROM sensor_readings
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(window.page_size)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(HistoryPage { window, readings })
    }
}
