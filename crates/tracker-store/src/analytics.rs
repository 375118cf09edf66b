//! Read-only aggregations for the dashboard

use sqlx::{QueryBuilder, Sqlite};

use crate::error::Result;
use crate::models::{ActivityItem, CameraActivity, DashboardStats, HeatPoint, SuccessRate, TrendPeriod, TrendPoint};
use crate::store::Store;

impl Store {
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let (total_searches, active_searches): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) FROM searches",
        )
        .fetch_one(self.pool())
        .await?;

        let (total_detections, today_detections, avg_confidence): (i64, i64, Option<f64>) = sqlx::query_as(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN DATE(timestamp) = DATE('now') THEN 1 ELSE 0 END), 0), \
             AVG(confidence) FROM detections",
        )
        .fetch_one(self.pool())
        .await?;

        let active_cameras: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cameras WHERE status = 'active'")
            .fetch_one(self.pool())
            .await?;

        Ok(DashboardStats {
            total_searches,
            active_searches,
            total_detections,
            active_cameras,
            today_detections,
            avg_confidence,
        })
    }

    pub async fn detection_trends(&self, period: TrendPeriod) -> Result<Vec<TrendPoint>> {
        let sql = format!(
            "SELECT {} AS period, COUNT(*) AS count, AVG(confidence) AS avg_confidence \
             FROM detections WHERE {} GROUP BY period ORDER BY period ASC",
            period.bucket_expr(),
            period.window_expr(),
        );
        let trends = sqlx::query_as::<_, TrendPoint>(&sql).fetch_all(self.pool()).await?;
        Ok(trends)
    }

    /// Cameras ranked by detection count, including cameras with none
    pub async fn top_cameras(&self, limit: i64) -> Result<Vec<CameraActivity>> {
        let cameras = sqlx::query_as::<_, CameraActivity>(
            "SELECT c.id, c.name, c.location_lat, c.location_lng, \
             COUNT(d.id) AS detection_count, AVG(d.confidence) AS avg_confidence \
             FROM cameras c LEFT JOIN detections d ON c.id = d.camera_id \
             GROUP BY c.id ORDER BY detection_count DESC, c.id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(cameras)
    }

    pub async fn heatmap(&self, start: Option<String>, end: Option<String>) -> Result<Vec<HeatPoint>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT location_lat, location_lng, COUNT(*) AS intensity FROM detections WHERE 1=1",
        );
        if let Some(start) = start {
            builder.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = end {
            builder.push(" AND timestamp <= ").push_bind(end);
        }
        builder.push(" GROUP BY location_lat, location_lng");

        let points = builder.build_query_as::<HeatPoint>().fetch_all(self.pool()).await?;
        Ok(points)
    }

    /// A search succeeds once it has at least one detection
    pub async fn search_success_rate(&self) -> Result<SuccessRate> {
        let (total_searches, successful_searches): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN EXISTS \
             (SELECT 1 FROM detections d WHERE d.search_id = s.id) THEN 1 ELSE 0 END), 0) \
             FROM searches s",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(SuccessRate {
            total_searches,
            successful_searches,
            failed_searches: total_searches - successful_searches,
            success_rate: format_rate(successful_searches, total_searches),
        })
    }

    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityItem>> {
        let items = sqlx::query_as::<_, ActivityItem>(
            "SELECT 'detection' AS type, d.id, d.timestamp, d.camera_id, c.name AS camera_name, \
             s.license_plate, d.confidence \
             FROM detections d \
             JOIN cameras c ON d.camera_id = c.id \
             JOIN searches s ON d.search_id = s.id \
             ORDER BY d.timestamp DESC, d.rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(items)
    }
}

fn format_rate(successful: i64, total: i64) -> String {
    let rate = if total > 0 {
        successful as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    format!("{rate:.2}")
}
