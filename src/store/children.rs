use super::{ParentStore, CHILDREN_TABLE, CHILD_COLUMNS};
use crate::datatypes::{read_changes, read_parent_id, require, Body, Child, CHILD_FIELDS, PARENT_KEY};
use crate::error::{Entity, StoreError, ValidationError};
use crate::transactions::{self, Action, DataType, Transaction};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::instrument;

#[derive(Clone)]
pub struct ChildStore {
    pool: SqlitePool,
    parents: ParentStore,
}

impl ChildStore {
    pub fn new(pool: SqlitePool, parents: ParentStore) -> Self {
        Self { pool, parents }
    }

    async fn resolve_parent(&self, id: i64) -> Result<i64, StoreError> {
        match self.parents.get(id).await {
            Ok(parent) => Ok(parent.id),
            Err(StoreError::NotFound(_)) => Err(ValidationError::ParentNotFound.into()),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, fields))]
    pub async fn create(&self, fields: &Body) -> Result<Child, StoreError> {
        require(fields, &["first_name", "last_name", PARENT_KEY])?;

        let parent_id = match read_parent_id(fields)? {
            Some(id) => self.resolve_parent(id).await?,
            None => return Err(ValidationError::MissingFields(vec![PARENT_KEY]).into()),
        };

        let values: HashMap<&'static str, String> = read_changes(fields, &CHILD_FIELDS)?
            .into_iter()
            .collect();
        let first_name = values.get("first_name").cloned().unwrap_or_default();
        let last_name = values.get("last_name").cloned().unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(&format!(
            "INSERT INTO {CHILDREN_TABLE} (first_name, last_name, parent_id) VALUES (?, ?, ?)"
        ))
        .bind(first_name.clone())
        .bind(last_name.clone())
        .bind(parent_id)
        .execute(&mut *tx)
        .await
        .map_err(parent_gone)?
        .last_insert_rowid();

        transactions::record(&mut *tx, Transaction::new(DataType::Child, Action::Add, id)).await?;
        tx.commit().await?;

        Ok(Child {
            id,
            first_name,
            last_name,
            parent: parent_id,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Child, StoreError> {
        sqlx::query_as::<_, Child>(&format!(
            "SELECT {CHILD_COLUMNS} FROM {CHILDREN_TABLE} WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(Entity::Child))
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Child>, StoreError> {
        sqlx::query_as::<_, Child>(&format!(
            "SELECT {CHILD_COLUMNS} FROM {CHILDREN_TABLE} ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// A parent that can't be resolved aborts the whole update.
    /// A body with nothing to change is not logged.
    #[instrument(skip(self, fields))]
    pub async fn update(&self, id: i64, fields: &Body) -> Result<Child, StoreError> {
        let current = self.get(id).await?;

        let parent_id = match read_parent_id(fields)? {
            Some(parent_id) => Some(self.resolve_parent(parent_id).await?),
            None => None,
        };

        let changes = read_changes(fields, &CHILD_FIELDS)?;
        if changes.is_empty() && parent_id.is_none() {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await?;

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("UPDATE {CHILDREN_TABLE} SET "));

        let mut assignments = query_builder.separated(", ");
        for (column, value) in changes {
            assignments.push(format!("{column} = "));
            assignments.push_bind_unseparated(value);
        }
        if let Some(parent_id) = parent_id {
            assignments.push("parent_id = ");
            assignments.push_bind_unseparated(parent_id);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);

        let affected = query_builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(parent_gone)?
            .rows_affected();

        if affected == 0 {
            return Err(StoreError::NotFound(Entity::Child));
        }

        transactions::record(&mut *tx, Transaction::new(DataType::Child, Action::Edit, id)).await?;
        tx.commit().await?;

        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(&format!("DELETE FROM {CHILDREN_TABLE} WHERE id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(StoreError::NotFound(Entity::Child));
        }

        transactions::record(&mut *tx, Transaction::new(DataType::Child, Action::Delete, id)).await?;
        tx.commit().await?;

        Ok(())
    }
}

/// The parent was removed between the lookup and the write.
fn parent_gone(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return ValidationError::ParentNotFound.into();
        }
    }

    err.into()
}
