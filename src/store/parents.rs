use super::{CHILDREN_TABLE, CHILD_COLUMNS, PARENTS_TABLE, PARENT_COLUMNS};
use crate::datatypes::{read_changes, require, Body, Child, Parent, PARENT_FIELDS};
use crate::error::{Entity, StoreError};
use crate::transactions::{self, Action, DataType, Transaction};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{instrument, warn};

#[derive(Clone)]
pub struct ParentStore {
    pool: SqlitePool,
}

impl ParentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, fields))]
    pub async fn create(&self, fields: &Body) -> Result<Parent, StoreError> {
        let names: Vec<&'static str> = PARENT_FIELDS.iter().map(|f| f.name).collect();
        require(fields, &names)?;

        let values: HashMap<&'static str, String> = read_changes(fields, &PARENT_FIELDS)?
            .into_iter()
            .collect();
        let value = |name: &str| values.get(name).cloned().unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(&format!(
            "INSERT INTO {PARENTS_TABLE} (first_name, last_name, street, city, state, zip_code) VALUES (?, ?, ?, ?, ?, ?)"
        ))
        .bind(value("first_name"))
        .bind(value("last_name"))
        .bind(value("street"))
        .bind(value("city"))
        .bind(value("state"))
        .bind(value("zip_code"))
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        transactions::record(&mut *tx, Transaction::new(DataType::Parent, Action::Add, id)).await?;
        tx.commit().await?;

        Ok(Parent {
            id,
            first_name: value("first_name"),
            last_name: value("last_name"),
            street: value("street"),
            city: value("city"),
            state: value("state"),
            zip_code: value("zip_code"),
            children: Vec::new(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Parent, StoreError> {
        let mut parent = sqlx::query_as::<_, Parent>(&format!(
            "SELECT {PARENT_COLUMNS} FROM {PARENTS_TABLE} WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(Entity::Parent))?;

        parent.children = sqlx::query_as::<_, Child>(&format!(
            "SELECT {CHILD_COLUMNS} FROM {CHILDREN_TABLE} WHERE parent_id = ? ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(parent)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Parent>, StoreError> {
        let mut parents = sqlx::query_as::<_, Parent>(&format!(
            "SELECT {PARENT_COLUMNS} FROM {PARENTS_TABLE} ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let children = sqlx::query_as::<_, Child>(&format!(
            "SELECT {CHILD_COLUMNS} FROM {CHILDREN_TABLE} ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_parent: HashMap<i64, Vec<Child>> = HashMap::new();
        for child in children {
            by_parent.entry(child.parent).or_default().push(child);
        }

        for parent in parents.iter_mut() {
            parent.children = by_parent.remove(&parent.id).unwrap_or_default();
        }

        Ok(parents)
    }

    /// Only the supplied fields change; an unknown id wins over a bad body.
    /// A body with nothing to change is not logged.
    #[instrument(skip(self, fields))]
    pub async fn update(&self, id: i64, fields: &Body) -> Result<Parent, StoreError> {
        let current = self.get(id).await?;

        let changes = read_changes(fields, &PARENT_FIELDS)?;
        if changes.is_empty() {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await?;

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("UPDATE {PARENTS_TABLE} SET "));

        let mut assignments = query_builder.separated(", ");
        for (column, value) in changes {
            assignments.push(format!("{column} = "));
            assignments.push_bind_unseparated(value);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);

        if query_builder.build().execute(&mut *tx).await?.rows_affected() == 0 {
            return Err(StoreError::NotFound(Entity::Parent));
        }

        transactions::record(&mut *tx, Transaction::new(DataType::Parent, Action::Edit, id)).await?;
        tx.commit().await?;

        self.get(id).await
    }

    /// Refuses while any child still points here.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // The first statement writes, so the write lock is taken before anything is read.
        let deleted = sqlx::query(&format!(
            "DELETE FROM {PARENTS_TABLE} WHERE id = ? AND NOT EXISTS (SELECT 1 FROM {CHILDREN_TABLE} WHERE parent_id = ?)"
        ))
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(children_remain)?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(self.refusal(id).await);
        }

        transactions::record(&mut *tx, Transaction::new(DataType::Parent, Action::Delete, id)).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Why a delete matched no row: the parent is gone or it still has children.
    async fn refusal(&self, id: i64) -> StoreError {
        match self.get(id).await {
            Ok(parent) => {
                warn!(children = parent.children.len(), "refusing to delete parent {id}");
                StoreError::HasChildren
            }
            Err(err) => err,
        }
    }
}

fn children_remain(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return StoreError::HasChildren;
        }
    }

    err.into()
}
