use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::fmt::{Display, Formatter};
use tracing::info;
use uuid::Uuid;

pub const TRANSACTION_TABLE: &str = "transactions";

impl Transaction {
    pub fn new(data_type: DataType, action: Action, entity_id: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_type,
            action,
            entity_id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn describe(&self) -> String {
        format!("{} {} {} ({})", self.action, self.data_type, self.entity_id, self.id)
    }
}

/// Appends to the log on the caller's connection so the row commits with the change.
pub async fn record(conn: &mut SqliteConnection, transaction: Transaction) -> Result<(), sqlx::Error> {
    let desc = transaction.describe();

    sqlx::query(&format!(
        "INSERT INTO {TRANSACTION_TABLE} (id, data_type, action, entity_id, timestamp) VALUES (?, ?, ?, ?, ?)"
    ))
    .bind(transaction.id)
    .bind(transaction.data_type)
    .bind(transaction.action)
    .bind(transaction.entity_id)
    .bind(transaction.timestamp)
    .execute(conn)
    .await?;

    info!("{}", desc);

    Ok(())
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        "SELECT id, data_type, action, entity_id, timestamp FROM {TRANSACTION_TABLE} ORDER BY rowid"
    ))
    .fetch_all(pool)
    .await
}

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub data_type: DataType,
    pub action: Action,
    pub entity_id: i64,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DataType {
    Parent,
    Child,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Action {
    Add,
    Edit,
    Delete,
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Parent => write!(f, "parent"),
            DataType::Child => write!(f, "child"),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Add => write!(f, "add"),
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
        }
    }
}
