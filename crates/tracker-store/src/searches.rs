use sqlx::{QueryBuilder, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{Caller, NewSearch, Search, SearchFilter, SearchPatch};
use crate::store::Store;

const SEARCH_COLUMNS: &str = "id, user_id, license_plate, make, model, color, year, status, \
                              priority, notes, created_at, updated_at";

pub const DEFAULT_PRIORITY: &str = "normal";

fn not_found() -> StoreError {
    StoreError::NotFound("Search not found".to_string())
}

impl Store {
    /// Searches visible to `caller`, newest first
    pub async fn list_searches(&self, caller: Caller, filter: SearchFilter) -> Result<Vec<Search>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SEARCH_COLUMNS} FROM searches WHERE 1=1"));

        if let Some(owner) = caller.owner_filter() {
            builder.push(" AND user_id = ").push_bind(owner);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ").push_bind(priority);
        }
        builder.push(" ORDER BY created_at DESC, rowid DESC");

        let searches = builder.build_query_as::<Search>().fetch_all(self.pool()).await?;
        Ok(searches)
    }

    /// Fetch one search; another user's search reads as not found
    pub async fn get_search(&self, caller: Caller, id: &str) -> Result<Search> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SEARCH_COLUMNS} FROM searches WHERE id = "));
        builder.push_bind(id.to_string());
        if let Some(owner) = caller.owner_filter() {
            builder.push(" AND user_id = ").push_bind(owner);
        }

        builder
            .build_query_as::<Search>()
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create_search(&self, caller: Caller, new: NewSearch) -> Result<Search> {
        let plate = new.license_plate.trim();
        if plate.is_empty() {
            return Err(StoreError::Invalid("License plate is required".to_string()));
        }

        let id = format!("SEARCH_{}", Uuid::new_v4());
        let priority = new.priority.as_deref().unwrap_or(DEFAULT_PRIORITY);
        sqlx::query(
            "INSERT INTO searches (id, user_id, license_plate, make, model, color, year, priority, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(caller.user_id)
        .bind(plate)
        .bind(&new.make)
        .bind(&new.model)
        .bind(&new.color)
        .bind(&new.year)
        .bind(priority)
        .bind(&new.notes)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::from_write(e, "Search already exists", "Unknown user"))?;

        info!(search_id = %id, license_plate = %plate, user_id = caller.user_id, "Search created");
        self.get_search(caller, &id).await
    }

    pub async fn update_search(&self, caller: Caller, id: &str, patch: SearchPatch) -> Result<Search> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE searches SET ");
        let mut fields = builder.separated(", ");
        let mut changed = false;

        let columns = [
            ("license_plate", patch.license_plate),
            ("make", patch.make),
            ("model", patch.model),
            ("color", patch.color),
            ("year", patch.year),
            ("status", patch.status),
            ("priority", patch.priority),
            ("notes", patch.notes),
        ];
        for (column, value) in columns {
            if let Some(value) = value {
                fields.push(format!("{column} = ")).push_bind_unseparated(value);
                changed = true;
            }
        }

        if !changed {
            return Err(StoreError::Invalid("No fields to update".to_string()));
        }
        fields.push("updated_at = CURRENT_TIMESTAMP");
        builder.push(" WHERE id = ").push_bind(id.to_string());
        if let Some(owner) = caller.owner_filter() {
            builder.push(" AND user_id = ").push_bind(owner);
        }

        let result = builder.build().execute(self.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        self.get_search(caller, id).await
    }

    /// Remove a search together with its detections, their alerts and its analytics rows
    pub async fn delete_search(&self, caller: Caller, id: &str) -> Result<()> {
        // Visibility check doubles as the ownership check
        self.get_search(caller, id).await?;

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            "DELETE FROM alerts WHERE detection_id IN (SELECT id FROM detections WHERE search_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let detections = sqlx::query("DELETE FROM detections WHERE search_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM analytics WHERE search_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM searches WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(search_id = %id, detections, "Search deleted");
        Ok(())
    }
}
