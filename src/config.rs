use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub hub: HubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL, e.g. "sqlite://data/vehicle_tracker.db" or "sqlite::memory:"
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Key for signing session tokens. Required outside test mode.
    #[serde(default)]
    pub token_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Password for the seeded `admin` account
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Outbound frames queued per socket before it counts as stalled
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_database_url() -> String {
    "sqlite://data/vehicle_tracker.db".to_string()
}

fn default_token_ttl() -> u64 {
    24 * 60 * 60
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_send_buffer() -> usize {
    tracker_hub::DEFAULT_SEND_BUFFER
}

fn default_cleanup_interval() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            admin_password: default_admin_password(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            send_buffer: default_send_buffer(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config: AppConfig = if Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::defaults()
        };

        // Environment wins over the file
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(secret) = std::env::var("TOKEN_SECRET") {
            config.auth.token_secret = secret;
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            config.auth.admin_password = password;
        }

        if config.auth.token_secret.is_empty() {
            anyhow::bail!("TOKEN_SECRET environment variable (or auth.token_secret) is required");
        }

        Ok(config)
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            hub: HubConfig::default(),
        }
    }

    /// In-memory database, fixed secret, ephemeral port
    pub fn test_config() -> Self {
        Self {
            server: ServerConfig {
                port: std::env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(0),
                host: "127.0.0.1".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: AuthConfig {
                token_secret: "test-secret".to_string(),
                ..AuthConfig::default()
            },
            hub: HubConfig::default(),
        }
    }
}
