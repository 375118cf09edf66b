use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{
    DetectionDetail, DetectionDetailRow, DetectionInput, DetectionQuery, DetectionRecord, DetectionRow,
    DetectionSummary,
};
use crate::store::Store;

const ENRICHED_SELECT: &str = "SELECT d.id, d.search_id, d.camera_id, d.timestamp, d.confidence, \
     d.location_lat, d.location_lng, d.image_url, d.metadata, \
     c.name AS camera_name, c.address AS camera_address \
     FROM detections d JOIN cameras c ON d.camera_id = c.id";

const DETAIL_SELECT: &str = "SELECT d.id, d.search_id, d.camera_id, d.timestamp, d.confidence, \
     d.location_lat, d.location_lng, d.image_url, d.metadata, \
     c.name AS camera_name, c.address AS camera_address, \
     s.license_plate, s.make, s.model, s.color \
     FROM detections d \
     JOIN cameras c ON d.camera_id = c.id \
     JOIN searches s ON d.search_id = s.id";

impl Store {
    /// Insert a validated detection and return its new id
    pub async fn insert_detection(&self, input: &DetectionInput) -> Result<String> {
        input.validate()?;
        let metadata = input.metadata.as_ref().map(serde_json::to_string).transpose()?;

        let id = format!("DET_{}", Uuid::new_v4());
        sqlx::query(
            "INSERT INTO detections (id, search_id, camera_id, confidence, location_lat, location_lng, image_url, metadata) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&input.search_id)
        .bind(&input.camera_id)
        .bind(input.confidence)
        .bind(input.location_lat)
        .bind(input.location_lng)
        .bind(&input.image_url)
        .bind(metadata)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::from_write(e, "Detection already exists", "Unknown search or camera"))?;

        debug!(detection_id = %id, search_id = %input.search_id, camera_id = %input.camera_id, "Detection stored");
        Ok(id)
    }

    /// Detection joined with its camera's name and address
    pub async fn enriched_detection(&self, id: &str) -> Result<Option<DetectionRecord>> {
        let row = sqlx::query_as::<_, DetectionRow>(&format!("{ENRICHED_SELECT} WHERE d.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(DetectionRecord::from))
    }

    pub async fn detection_with_search(&self, id: &str) -> Result<DetectionDetail> {
        sqlx::query_as::<_, DetectionDetailRow>(&format!("{DETAIL_SELECT} WHERE d.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(DetectionDetail::from)
            .ok_or_else(|| StoreError::NotFound("Detection not found".to_string()))
    }

    /// All detections of one search, newest first
    pub async fn detections_for_search(&self, search_id: &str) -> Result<Vec<DetectionRecord>> {
        let rows = sqlx::query_as::<_, DetectionRow>(&format!(
            "{ENRICHED_SELECT} WHERE d.search_id = ? ORDER BY d.timestamp DESC, d.rowid DESC"
        ))
        .bind(search_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(DetectionRecord::from).collect())
    }

    pub async fn detection_summary(&self, query: DetectionQuery) -> Result<DetectionSummary> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) AS total_detections, AVG(confidence) AS avg_confidence, \
             COUNT(DISTINCT camera_id) AS cameras_used, COUNT(DISTINCT search_id) AS searches_detected, \
             MIN(timestamp) AS first_detection, MAX(timestamp) AS last_detection \
             FROM detections WHERE 1=1",
        );
        if let Some(search_id) = query.search_id {
            builder.push(" AND search_id = ").push_bind(search_id);
        }
        if let Some(start) = query.start_date {
            builder.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            builder.push(" AND timestamp <= ").push_bind(end);
        }

        let summary = builder
            .build_query_as::<DetectionSummary>()
            .fetch_one(self.pool())
            .await?;
        Ok(summary)
    }
}
