//! Table definitions and seed data

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::Result;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        last_login TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cameras (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        location_lat REAL NOT NULL,
        location_lng REAL NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        address TEXT,
        description TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS searches (
        id TEXT PRIMARY KEY,
        user_id INTEGER,
        license_plate TEXT NOT NULL,
        make TEXT,
        model TEXT,
        color TEXT,
        year TEXT,
        status TEXT NOT NULL DEFAULT 'active',
        priority TEXT NOT NULL DEFAULT 'normal',
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS detections (
        id TEXT PRIMARY KEY,
        search_id TEXT NOT NULL,
        camera_id TEXT NOT NULL,
        timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        confidence REAL NOT NULL,
        location_lat REAL NOT NULL,
        location_lng REAL NOT NULL,
        image_url TEXT,
        metadata TEXT,
        FOREIGN KEY (search_id) REFERENCES searches(id),
        FOREIGN KEY (camera_id) REFERENCES cameras(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        detection_id TEXT NOT NULL,
        type TEXT NOT NULL,
        message TEXT NOT NULL,
        severity TEXT NOT NULL DEFAULT 'info',
        acknowledged BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (detection_id) REFERENCES detections(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS analytics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        search_id TEXT,
        metric_type TEXT NOT NULL,
        metric_value REAL NOT NULL,
        timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (search_id) REFERENCES searches(id)
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_detections_search ON detections(search_id)",
    "CREATE INDEX IF NOT EXISTS idx_detections_camera ON detections(camera_id)",
    "CREATE INDEX IF NOT EXISTS idx_detections_timestamp ON detections(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_searches_user ON searches(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_searches_status ON searches(status)",
];

/// (id, name, lat, lng, address)
pub const SAMPLE_CAMERAS: &[(&str, &str, f64, f64, &str)] = &[
    ("CAM_001", "Market St & 5th", 37.7749, -122.4194, "5th St & Market St, San Francisco, CA"),
    ("CAM_002", "Mission St & 6th", 37.7750, -122.4180, "6th St & Mission St, San Francisco, CA"),
    ("CAM_003", "Howard St & 4th", 37.7760, -122.4190, "4th St & Howard St, San Francisco, CA"),
    ("CAM_004", "Folsom St & 7th", 37.7740, -122.4200, "7th St & Folsom St, San Francisco, CA"),
    ("CAM_005", "Bryant St & 3rd", 37.7770, -122.4170, "3rd St & Bryant St, San Francisco, CA"),
];

/// Create tables and indexes if missing, then seed the sample cameras
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for ddl in TABLES.iter().chain(INDEXES) {
        sqlx::query(ddl).execute(pool).await?;
    }

    let mut seeded = 0;
    for (id, name, lat, lng, address) in SAMPLE_CAMERAS {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO cameras (id, name, location_lat, location_lng, status, address) \
             VALUES (?, ?, ?, ?, 'active', ?)",
        )
        .bind(id)
        .bind(name)
        .bind(lat)
        .bind(lng)
        .bind(address)
        .execute(pool)
        .await?;
        seeded += result.rows_affected();
    }

    if seeded > 0 {
        info!(cameras = seeded, "Seeded sample cameras");
    } else {
        debug!("Schema already initialized");
    }
    Ok(())
}
