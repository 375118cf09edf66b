use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use tracker_hub::BroadcastHub;
use tracker_store::{CaseService, Store};

use crate::auth::{BcryptHasher, PasswordHasher, TokenAuthority};
use crate::config::AppConfig;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub hub: BroadcastHub,
    pub service: CaseService,
    pub tokens: Arc<TokenAuthority>,
    pub passwords: Arc<dyn PasswordHasher>,
    pub started_at: Instant,
}

impl AppState {
    /// Open the database, make sure the admin account exists and wire the hub
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let store = Store::connect(&config.database.url).await?;

        let passwords: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::default());
        let admin = store
            .ensure_admin(&passwords.hash(&config.auth.admin_password)?)
            .await?;
        tracing::info!(user_id = admin.id, "Admin account ready");

        let hub = BroadcastHub::new(config.hub.send_buffer);
        let service = CaseService::with_hub(store, hub.clone());

        Ok(Self {
            hub,
            service,
            tokens: Arc::new(TokenAuthority::new(&config.auth.token_secret, config.auth.token_ttl_secs)),
            passwords,
            started_at: Instant::now(),
        })
    }

    pub fn store(&self) -> &Store {
        self.service.store()
    }
}
