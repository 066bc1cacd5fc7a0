//! Persistence for [`User`] accounts and [`ApiKeyRecord`]s (§6 `users`,
//! `api_keys` tables), following the same narrow-trait-plus-backends shape
//! as [`crate::workflow::store`].

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::ApiKeyRecord;
use crate::rbac::{Role, User};

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user {0} not found")]
    NotFound(String),
    #[error("username {0} already registered")]
    DuplicateUsername(String),
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: User) -> Result<(), UserStoreError>;
    async fn get(&self, id: &str) -> Result<User, UserStoreError>;
    async fn get_by_username(&self, username: &str) -> Result<User, UserStoreError>;
    async fn list(&self) -> Result<Vec<User>, UserStoreError>;
    async fn set_active(&self, id: &str, active: bool) -> Result<(), UserStoreError>;
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn create(&self, record: ApiKeyRecord) -> Result<(), UserStoreError>;
    async fn list_active(&self) -> Result<Vec<ApiKeyRecord>, UserStoreError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>, UserStoreError>;
    async fn revoke(&self, id: &str) -> Result<(), UserStoreError>;
}

/// In-memory reference store, used by tests and standalone demos.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(UserStoreError::DuplicateUsername(user.username));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<User, UserStoreError> {
        self.users.read().await.get(id).cloned().ok_or_else(|| UserStoreError::NotFound(id.to_string()))
    }

    async fn get_by_username(&self, username: &str) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| UserStoreError::NotFound(username.to_string()))
    }

    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or_else(|| UserStoreError::NotFound(id.to_string()))?;
        user.active = active;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryApiKeyStore {
    keys: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl InMemoryApiKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn create(&self, record: ApiKeyRecord) -> Result<(), UserStoreError> {
        self.keys.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<ApiKeyRecord>, UserStoreError> {
        Ok(self.keys.read().await.values().filter(|k| !k.revoked).cloned().collect())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>, UserStoreError> {
        Ok(self.keys.read().await.values().filter(|k| k.user_id == user_id).cloned().collect())
    }

    async fn revoke(&self, id: &str) -> Result<(), UserStoreError> {
        let mut keys = self.keys.write().await;
        let record = keys.get_mut(id).ok_or_else(|| UserStoreError::NotFound(id.to_string()))?;
        record.revoked = true;
        Ok(())
    }
}

fn roles_to_json(roles: &[Role]) -> String {
    serde_json::to_string(roles).unwrap_or_else(|_| "[]".to_string())
}

fn roles_from_json(raw: &str) -> Result<Vec<Role>, UserStoreError> {
    serde_json::from_str(raw).map_err(|e| UserStoreError::Store(e.to_string()))
}

/// SQLite-backed `users` table.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Opens (and migrates) a SQLite-backed user store at `url`.
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().max_connections(4).connect(url).await?;
        sqlx::query(
            "create table if not exists users (
                id text primary key,
                username text not null unique,
                roles text not null,
                extra_permissions text not null,
                active integer not null
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, UserStoreError> {
        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            roles: roles_from_json(&row.get::<String, _>("roles"))?,
            extra_permissions: serde_json::from_str(&row.get::<String, _>("extra_permissions"))
                .map_err(|e| UserStoreError::Store(e.to_string()))?,
            active: row.get::<i64, _>("active") != 0,
        })
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, user: User) -> Result<(), UserStoreError> {
        let extra = serde_json::to_string(&user.extra_permissions).map_err(|e| UserStoreError::Store(e.to_string()))?;
        sqlx::query("insert into users (id, username, roles, extra_permissions, active) values (?1, ?2, ?3, ?4, ?5)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(roles_to_json(&user.roles))
            .bind(extra)
            .bind(user.active as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE") {
                    UserStoreError::DuplicateUsername(user.username.clone())
                } else {
                    UserStoreError::Store(e.to_string())
                }
            })?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<User, UserStoreError> {
        let row = sqlx::query("select * from users where id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?
            .ok_or_else(|| UserStoreError::NotFound(id.to_string()))?;
        Self::row_to_user(&row)
    }

    async fn get_by_username(&self, username: &str) -> Result<User, UserStoreError> {
        let row = sqlx::query("select * from users where username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?
            .ok_or_else(|| UserStoreError::NotFound(username.to_string()))?;
        Self::row_to_user(&row)
    }

    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        let rows =
            sqlx::query("select * from users").fetch_all(&self.pool).await.map_err(|e| UserStoreError::Store(e.to_string()))?;
        rows.iter().map(Self::row_to_user).collect()
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<(), UserStoreError> {
        let result = sqlx::query("update users set active = ?1 where id = ?2")
            .bind(active as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// SQLite-backed `api_keys` table.
pub struct SqliteApiKeyStore {
    pool: SqlitePool,
}

impl SqliteApiKeyStore {
    /// Opens (and migrates) a SQLite-backed API key store at `url`.
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().max_connections(4).connect(url).await?;
        sqlx::query(
            "create table if not exists api_keys (
                id text primary key,
                user_id text not null,
                key_hash text not null,
                roles text not null,
                revoked integer not null
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ApiKeyRecord, UserStoreError> {
        Ok(ApiKeyRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            key_hash: row.get("key_hash"),
            roles: roles_from_json(&row.get::<String, _>("roles"))?,
            revoked: row.get::<i64, _>("revoked") != 0,
        })
    }
}

#[async_trait]
impl ApiKeyStore for SqliteApiKeyStore {
    async fn create(&self, record: ApiKeyRecord) -> Result<(), UserStoreError> {
        sqlx::query("insert into api_keys (id, user_id, key_hash, roles, revoked) values (?1, ?2, ?3, ?4, ?5)")
            .bind(&record.id)
            .bind(&record.user_id)
            .bind(&record.key_hash)
            .bind(roles_to_json(&record.roles))
            .bind(record.revoked as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<ApiKeyRecord>, UserStoreError> {
        let rows = sqlx::query("select * from api_keys where revoked = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?;
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>, UserStoreError> {
        let rows = sqlx::query("select * from api_keys where user_id = ?1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?;
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn revoke(&self, id: &str) -> Result<(), UserStoreError> {
        let result = sqlx::query("update api_keys set revoked = 1 where id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| UserStoreError::Store(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
