use sqlx::{QueryBuilder, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{Camera, CameraPatch, CameraStats, NewCamera};
use crate::store::Store;

const CAMERA_COLUMNS: &str =
    "id, name, location_lat, location_lng, status, address, description, created_at, updated_at";

fn camera_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("CAM_{}", hex[..8].to_uppercase())
}

impl Store {
    pub async fn list_cameras(&self) -> Result<Vec<Camera>> {
        let cameras = sqlx::query_as::<_, Camera>(&format!(
            "SELECT {CAMERA_COLUMNS} FROM cameras ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(cameras)
    }

    pub async fn get_camera(&self, id: &str) -> Result<Camera> {
        sqlx::query_as::<_, Camera>(&format!("SELECT {CAMERA_COLUMNS} FROM cameras WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StoreError::NotFound("Camera not found".to_string()))
    }

    pub async fn create_camera(&self, new: NewCamera) -> Result<Camera> {
        let (Some(lat), Some(lng)) = (new.location_lat, new.location_lng) else {
            return Err(StoreError::Invalid("Name and location are required".to_string()));
        };
        if new.name.trim().is_empty() {
            return Err(StoreError::Invalid("Name and location are required".to_string()));
        }

        let id = camera_id();
        sqlx::query(
            "INSERT INTO cameras (id, name, location_lat, location_lng, address, description) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new.name)
        .bind(lat)
        .bind(lng)
        .bind(&new.address)
        .bind(&new.description)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::from_write(e, "Camera already exists", "Invalid camera"))?;

        info!(camera_id = %id, name = %new.name, "Camera created");
        self.get_camera(&id).await
    }

    /// Apply only the fields present in `patch`
    pub async fn update_camera(&self, id: &str, patch: CameraPatch) -> Result<Camera> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE cameras SET ");
        let mut fields = builder.separated(", ");
        let mut changed = false;

        if let Some(name) = patch.name {
            fields.push("name = ").push_bind_unseparated(name);
            changed = true;
        }
        if let Some(lat) = patch.location_lat {
            fields.push("location_lat = ").push_bind_unseparated(lat);
            changed = true;
        }
        if let Some(lng) = patch.location_lng {
            fields.push("location_lng = ").push_bind_unseparated(lng);
            changed = true;
        }
        if let Some(status) = patch.status {
            fields.push("status = ").push_bind_unseparated(status);
            changed = true;
        }
        if let Some(address) = patch.address {
            fields.push("address = ").push_bind_unseparated(address);
            changed = true;
        }
        if let Some(description) = patch.description {
            fields.push("description = ").push_bind_unseparated(description);
            changed = true;
        }

        if !changed {
            return Err(StoreError::Invalid("No fields to update".to_string()));
        }
        fields.push("updated_at = CURRENT_TIMESTAMP");
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(self.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Camera not found".to_string()));
        }
        self.get_camera(id).await
    }

    /// Cameras that detections point at cannot be removed
    pub async fn delete_camera(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM cameras WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| match StoreError::from_write(e, "Camera already exists", "Camera has detections") {
                StoreError::InvalidReference(msg) => StoreError::Conflict(msg),
                other => other,
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Camera not found".to_string()));
        }
        info!(camera_id = %id, "Camera deleted");
        Ok(())
    }

    pub async fn camera_stats(&self, id: &str) -> Result<CameraStats> {
        let stats = sqlx::query_as::<_, CameraStats>(
            "SELECT COUNT(*) AS total_detections, AVG(confidence) AS avg_confidence, \
             MIN(timestamp) AS first_detection, MAX(timestamp) AS last_detection \
             FROM detections WHERE camera_id = ?",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        Ok(stats)
    }

    /// Any camera, used by the detection simulator
    pub async fn random_camera(&self) -> Result<Option<Camera>> {
        let camera = sqlx::query_as::<_, Camera>(&format!(
            "SELECT {CAMERA_COLUMNS} FROM cameras ORDER BY RANDOM() LIMIT 1"
        ))
        .fetch_optional(self.pool())
        .await?;
        Ok(camera)
    }
}
