//! Row types and write inputs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracker_hub::SearchScoped;

use crate::error::{Result, StoreError};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Who is asking. Non-admin callers only see their own searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Caller {
    /// Owner filter for search queries; `None` for admins
    pub(crate) fn owner_filter(&self) -> Option<i64> {
        (!self.is_admin).then_some(self.user_id)
    }
}

// ============== Users ==============

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

// ============== Cameras ==============

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Camera {
    pub id: String,
    pub name: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub status: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCamera {
    #[serde(default)]
    pub name: String,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraPatch {
    pub name: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, PartialEq)]
pub struct CameraStats {
    pub total_detections: i64,
    pub avg_confidence: Option<f64>,
    pub first_detection: Option<String>,
    pub last_detection: Option<String>,
}

// ============== Searches ==============

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Search {
    pub id: String,
    pub user_id: Option<i64>,
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<String>,
    pub status: String,
    pub priority: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSearch {
    #[serde(default)]
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPatch {
    pub license_plate: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
}

// ============== Detections ==============

/// A detection joined with its camera's display fields.
///
/// This is the shape pushed to sockets and returned by the insert API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionRecord {
    pub id: String,
    pub search_id: String,
    pub camera_id: String,
    pub timestamp: String,
    pub confidence: f64,
    pub location_lat: f64,
    pub location_lng: f64,
    pub image_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub camera_name: String,
    pub camera_address: Option<String>,
}

impl SearchScoped for DetectionRecord {
    fn search_id(&self) -> &str {
        &self.search_id
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct DetectionRow {
    id: String,
    search_id: String,
    camera_id: String,
    timestamp: String,
    confidence: f64,
    location_lat: f64,
    location_lng: f64,
    image_url: Option<String>,
    metadata: Option<String>,
    camera_name: String,
    camera_address: Option<String>,
}

impl From<DetectionRow> for DetectionRecord {
    fn from(row: DetectionRow) -> Self {
        // Metadata is free-form; keep text that isn't JSON as a plain string
        let metadata = row.metadata.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        });
        Self {
            id: row.id,
            search_id: row.search_id,
            camera_id: row.camera_id,
            timestamp: row.timestamp,
            confidence: row.confidence,
            location_lat: row.location_lat,
            location_lng: row.location_lng,
            image_url: row.image_url,
            metadata: metadata.filter(|m| !m.is_null()),
            camera_name: row.camera_name,
            camera_address: row.camera_address,
        }
    }
}

/// A detection with the searched vehicle's description
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetectionDetail {
    #[serde(flatten)]
    pub detection: DetectionRecord,
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, FromRow)]
pub(crate) struct DetectionDetailRow {
    #[sqlx(flatten)]
    pub detection: DetectionRow,
    pub license_plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
}

impl From<DetectionDetailRow> for DetectionDetail {
    fn from(row: DetectionDetailRow) -> Self {
        Self {
            detection: row.detection.into(),
            license_plate: row.license_plate,
            make: row.make,
            model: row.model,
            color: row.color,
        }
    }
}

/// Detection as posted by a caller; every field is checked before use
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDetection {
    pub search_id: Option<String>,
    pub camera_id: Option<String>,
    pub confidence: Option<f64>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub image_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A complete detection ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionInput {
    pub search_id: String,
    pub camera_id: String,
    pub confidence: f64,
    pub location_lat: f64,
    pub location_lng: f64,
    pub image_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl DetectionInput {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(StoreError::Invalid(
                "Confidence must be between 0 and 1".to_string(),
            ));
        }
        let lat_ok = self.location_lat.is_finite() && (-90.0..=90.0).contains(&self.location_lat);
        let lng_ok = self.location_lng.is_finite() && (-180.0..=180.0).contains(&self.location_lng);
        if !lat_ok || !lng_ok {
            return Err(StoreError::Invalid("Invalid coordinates".to_string()));
        }
        Ok(())
    }
}

impl TryFrom<NewDetection> for DetectionInput {
    type Error = StoreError;

    fn try_from(new: NewDetection) -> Result<Self> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        match (
            non_empty(new.search_id),
            non_empty(new.camera_id),
            new.confidence,
            new.location_lat,
            new.location_lng,
        ) {
            (Some(search_id), Some(camera_id), Some(confidence), Some(location_lat), Some(location_lng)) => {
                let input = DetectionInput {
                    search_id,
                    camera_id,
                    confidence,
                    location_lat,
                    location_lng,
                    image_url: new.image_url,
                    metadata: new.metadata,
                };
                input.validate()?;
                Ok(input)
            }
            _ => Err(StoreError::Invalid("Missing required fields".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionQuery {
    pub search_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, PartialEq)]
pub struct DetectionSummary {
    pub total_detections: i64,
    pub avg_confidence: Option<f64>,
    pub cameras_used: i64,
    pub searches_detected: i64,
    pub first_detection: Option<String>,
    pub last_detection: Option<String>,
}

// ============== Alerts ==============

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub detection_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub acknowledged: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAlert {
    #[serde(default)]
    pub detection_id: String,
    #[serde(rename = "type", default)]
    pub alert_type: String,
    #[serde(default)]
    pub message: String,
    pub severity: Option<String>,
}

// ============== Analytics ==============

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_searches: i64,
    pub active_searches: i64,
    pub total_detections: i64,
    pub active_cameras: i64,
    pub today_detections: i64,
    pub avg_confidence: Option<f64>,
}

/// Bucket size and look-back window for detection trends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrendPeriod {
    /// Hourly buckets over the last day
    Day,
    /// Daily buckets over the last week
    #[default]
    Week,
    /// Daily buckets over the last month
    Month,
    /// Monthly buckets over the last year
    Year,
}

impl TrendPeriod {
    /// Parse a `period` query value; anything unknown falls back to a week
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("24h") => TrendPeriod::Day,
            Some("30d") => TrendPeriod::Month,
            Some("1y") => TrendPeriod::Year,
            _ => TrendPeriod::Week,
        }
    }

    pub(crate) fn bucket_expr(&self) -> &'static str {
        match self {
            TrendPeriod::Day => "strftime('%Y-%m-%d %H:00', timestamp)",
            TrendPeriod::Week | TrendPeriod::Month => "DATE(timestamp)",
            TrendPeriod::Year => "strftime('%Y-%m', timestamp)",
        }
    }

    pub(crate) fn window_expr(&self) -> &'static str {
        match self {
            TrendPeriod::Day => "timestamp >= datetime('now', '-24 hours')",
            TrendPeriod::Week => "timestamp >= datetime('now', '-7 days')",
            TrendPeriod::Month => "timestamp >= datetime('now', '-30 days')",
            TrendPeriod::Year => "timestamp >= datetime('now', '-1 year')",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct TrendPoint {
    pub period: String,
    pub count: i64,
    pub avg_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct CameraActivity {
    pub id: String,
    pub name: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub detection_count: i64,
    pub avg_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct HeatPoint {
    pub location_lat: f64,
    pub location_lng: f64,
    pub intensity: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRate {
    pub total_searches: i64,
    pub successful_searches: i64,
    pub failed_searches: i64,
    /// Percentage with two decimals, e.g. `"66.67"`
    pub success_rate: String,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub id: String,
    pub timestamp: String,
    pub camera_id: String,
    pub camera_name: String,
    pub license_plate: String,
    pub confidence: f64,
}
