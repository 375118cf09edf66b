use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{User, ROLE_ADMIN, ROLE_USER};
use crate::store::Store;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@vehicletracker.com";

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, last_login";

impl Store {
    /// Insert a regular user. The password must already be hashed.
    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        self.insert_user(username, email, password_hash, ROLE_USER).await
    }

    async fn insert_user(&self, username: &str, email: &str, password_hash: &str, role: &str) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::from_write(e, "Username or email already exists", "Invalid user"))?;

        let id = result.last_insert_rowid();
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        info!(user_id = id, username = %username, role = %role, "User created");
        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    pub async fn touch_last_login(&self, user_id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Create the `admin` account if it does not exist yet.
    /// An existing admin keeps its password.
    pub async fn ensure_admin(&self, password_hash: &str) -> Result<User> {
        if let Some(user) = self.find_user_by_username(ADMIN_USERNAME).await? {
            return Ok(user);
        }
        self.insert_user(ADMIN_USERNAME, ADMIN_EMAIL, password_hash, ROLE_ADMIN).await
    }
}
