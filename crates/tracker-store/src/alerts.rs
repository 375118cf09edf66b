use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{Alert, NewAlert};
use crate::store::Store;

pub const DEFAULT_SEVERITY: &str = "info";

const ALERT_COLUMNS: &str = "id, detection_id, type, message, severity, acknowledged, created_at";

impl Store {
    pub async fn create_alert(&self, new: &NewAlert) -> Result<Alert> {
        if new.detection_id.trim().is_empty() || new.alert_type.trim().is_empty() || new.message.trim().is_empty() {
            return Err(StoreError::Invalid("detection_id, type and message are required".to_string()));
        }
        let severity = new.severity.as_deref().unwrap_or(DEFAULT_SEVERITY);

        let result = sqlx::query("INSERT INTO alerts (detection_id, type, message, severity) VALUES (?, ?, ?, ?)")
            .bind(&new.detection_id)
            .bind(&new.alert_type)
            .bind(&new.message)
            .bind(severity)
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::from_write(e, "Alert already exists", "Unknown detection"))?;

        let id = result.last_insert_rowid();
        let alert = sqlx::query_as::<_, Alert>(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?"))
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        info!(alert_id = id, detection_id = %alert.detection_id, severity = %alert.severity, "Alert stored");
        Ok(alert)
    }

    /// Most recent alerts first
    pub async fn list_alerts(&self, limit: i64) -> Result<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(alerts)
    }
}
