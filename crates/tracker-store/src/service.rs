//! Case/detection service: persistence followed by real-time fan-out

use std::sync::Arc;

use rand::Rng;
use tracing::{error, info, warn};
use tracker_hub::{AlertSink, BroadcastHub, DetectionSink};

use crate::error::{Result, StoreError};
use crate::models::{Alert, DetectionInput, DetectionRecord, NewAlert, NewDetection};
use crate::store::Store;

/// Confidence range used by the simulator, upper bound exclusive
pub const SIMULATED_CONFIDENCE: std::ops::Range<f64> = 0.75..0.99;

#[derive(Clone)]
pub struct CaseService {
    store: Store,
    detections: Arc<dyn DetectionSink<DetectionRecord>>,
    alerts: Arc<dyn AlertSink<Alert>>,
}

impl CaseService {
    pub fn new(
        store: Store,
        detections: Arc<dyn DetectionSink<DetectionRecord>>,
        alerts: Arc<dyn AlertSink<Alert>>,
    ) -> Self {
        Self { store, detections, alerts }
    }

    /// Wire both sinks to one hub
    pub fn with_hub(store: Store, hub: BroadcastHub) -> Self {
        let hub = Arc::new(hub);
        Self::new(store, hub.clone(), hub)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Validate, persist, then notify the sink exactly once.
    ///
    /// Returns `Ok(None)` when the row was committed but could not be read
    /// back with its camera; nothing is broadcast in that case.
    pub async fn record_detection(&self, new: NewDetection) -> Result<Option<DetectionRecord>> {
        let input = DetectionInput::try_from(new)?;
        self.persist_and_notify(input).await
    }

    /// Fabricate a detection for `search_id` at a random camera
    pub async fn simulate_detection(&self, search_id: &str) -> Result<Option<DetectionRecord>> {
        let camera = self
            .store
            .random_camera()
            .await?
            .ok_or_else(|| StoreError::NotFound("No cameras available".to_string()))?;

        let confidence = rand::thread_rng().gen_range(SIMULATED_CONFIDENCE);
        let input = DetectionInput {
            search_id: search_id.to_string(),
            camera_id: camera.id,
            confidence,
            location_lat: camera.location_lat,
            location_lng: camera.location_lng,
            image_url: None,
            metadata: Some(serde_json::json!({ "simulated": true })),
        };
        self.persist_and_notify(input).await
    }

    /// Persist an alert and push it to every connection
    pub async fn raise_alert(&self, new: NewAlert) -> Result<Alert> {
        let alert = self.store.create_alert(&new).await?;
        self.alerts.on_alert_raised(&alert);
        info!(alert_id = alert.id, alert_type = %alert.alert_type, "Alert raised");
        Ok(alert)
    }

    async fn persist_and_notify(&self, input: DetectionInput) -> Result<Option<DetectionRecord>> {
        let id = self.store.insert_detection(&input).await?;

        match self.store.enriched_detection(&id).await {
            Ok(Some(record)) => {
                self.detections.on_detection_persisted(&record);
                info!(
                    detection_id = %record.id,
                    search_id = %record.search_id,
                    camera_id = %record.camera_id,
                    confidence = record.confidence,
                    "Detection recorded"
                );
                Ok(Some(record))
            }
            Ok(None) => {
                warn!(detection_id = %id, "Stored detection missing on read-back, not broadcast");
                Ok(None)
            }
            Err(e) => {
                error!(detection_id = %id, error = %e, "Failed to read back detection, not broadcast");
                Ok(None)
            }
        }
    }
}
