use crate::settings::Database;
use crate::store::{ChildStore, ParentStore};
use crate::transactions::{self, Transaction};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::str::FromStr;
use tracing::{info, instrument};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS parents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        street TEXT NOT NULL,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        zip_code TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS children (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        parent_id INTEGER NOT NULL REFERENCES parents (id) ON DELETE RESTRICT
    )",
    "CREATE INDEX IF NOT EXISTS children_parent_id ON children (parent_id)",
    "CREATE TABLE IF NOT EXISTS transactions (
        id BLOB PRIMARY KEY,
        data_type TEXT NOT NULL,
        action TEXT NOT NULL,
        entity_id INTEGER NOT NULL,
        timestamp INTEGER NOT NULL
    )",
];

pub struct StorageManager {
    pool: SqlitePool,
    parents: ParentStore,
    children: ChildStore,
}

impl StorageManager {
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn new(config: &Database) -> Result<Self, anyhow::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Single connection that never idles out, otherwise the database vanishes.
    pub async fn in_memory() -> Result<Self, anyhow::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, anyhow::Error> {
        for statement in SCHEMA {
            pool.execute(statement).await?;
        }

        info!("database schema ready");

        let parents = ParentStore::new(pool.clone());
        let children = ChildStore::new(pool.clone(), parents.clone());

        Ok(Self {
            pool,
            parents,
            children,
        })
    }

    pub fn parents(&self) -> &ParentStore {
        &self.parents
    }

    pub fn children(&self) -> &ChildStore {
        &self.children
    }

    #[instrument(skip(self))]
    pub async fn transactions_list(&self) -> Result<Vec<Transaction>, anyhow::Error> {
        transactions::list(&self.pool).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{body, parent_body};
    use crate::transactions::{Action, DataType};
    use serde_json::json;

    #[tokio::test]
    async fn every_mutation_is_logged_once() {
        let storage = StorageManager::in_memory().await.unwrap();
        let parent = storage.parents().create(&parent_body()).await.unwrap();
        let child = storage
            .children()
            .create(&body(json!({ "first_name": "Johnny", "last_name": "Sakib", "parent": parent.id })))
            .await
            .unwrap();
        storage.parents().update(parent.id, &body(json!({ "city": "Khulna" }))).await.unwrap();
        storage.children().delete(child.id).await.unwrap();
        storage.parents().delete(parent.id).await.unwrap();

        let log: Vec<(DataType, Action, i64)> = storage
            .transactions_list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.data_type, t.action, t.entity_id))
            .collect();

        assert_eq!(
            log,
            vec![
                (DataType::Parent, Action::Add, parent.id),
                (DataType::Child, Action::Add, child.id),
                (DataType::Parent, Action::Edit, parent.id),
                (DataType::Child, Action::Delete, child.id),
                (DataType::Parent, Action::Delete, parent.id),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_mutations_leave_no_log() {
        let storage = StorageManager::in_memory().await.unwrap();
        let parent = storage.parents().create(&parent_body()).await.unwrap();
        storage
            .children()
            .create(&body(json!({ "first_name": "Johnny", "last_name": "Sakib", "parent": parent.id })))
            .await
            .unwrap();

        assert!(storage.parents().delete(parent.id).await.is_err());
        assert!(storage.children().create(&body(json!({}))).await.is_err());

        assert_eq!(storage.transactions_list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn foreign_key_rejects_orphans_at_the_schema_level() {
        let storage = StorageManager::in_memory().await.unwrap();

        let res = sqlx::query("INSERT INTO children (first_name, last_name, parent_id) VALUES ('a', 'b', 42)")
            .execute(&storage.pool)
            .await;

        assert!(res.is_err());
    }
}
