use crate::datatypes::Child;
use crate::error::{StoreError, ValidationError};
use crate::misc::{error_response, internal_error, json_object, message_response};
use crate::storage_manager::StorageManager;
use crate::store::parse_id;
use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, instrument};

pub const NOT_FOUND: &str = "Child not found.";
pub const DELETED: &str = "Child deleted successfully.";

#[instrument(skip(storage_manager))]
pub async fn list_children(storage_manager: Extension<Arc<StorageManager>>) -> ChildrenResponse {
    match storage_manager.children().list().await {
        Ok(l) => ChildrenResponse::List(l),
        Err(err) => err.into(),
    }
}

#[instrument(skip(storage_manager, body))]
pub async fn add_child(
    storage_manager: Extension<Arc<StorageManager>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ChildrenResponse {
    let fields = match json_object(body) {
        Ok(fields) => fields,
        Err(err) => return ChildrenResponse::Invalid(err),
    };

    match storage_manager.children().create(&fields).await {
        Ok(c) => ChildrenResponse::Created(c),
        Err(err) => err.into(),
    }
}

#[instrument(skip(storage_manager))]
pub async fn get_child(
    Path(id): Path<String>,
    storage_manager: Extension<Arc<StorageManager>>,
) -> ChildrenResponse {
    let Some(id) = parse_id(&id) else {
        return ChildrenResponse::NotFound;
    };

    match storage_manager.children().get(id).await {
        Ok(c) => ChildrenResponse::Child(c),
        Err(err) => err.into(),
    }
}

/// An unknown id is reported before a bad body.
#[instrument(skip(storage_manager, body))]
pub async fn edit_child(
    Path(id): Path<String>,
    storage_manager: Extension<Arc<StorageManager>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ChildrenResponse {
    let Some(id) = parse_id(&id) else {
        return ChildrenResponse::NotFound;
    };

    let fields = match json_object(body) {
        Ok(fields) => fields,
        Err(invalid) => {
            return match storage_manager.children().get(id).await {
                Ok(_) => ChildrenResponse::Invalid(invalid),
                Err(err) => err.into(),
            }
        }
    };

    match storage_manager.children().update(id, &fields).await {
        Ok(c) => ChildrenResponse::Child(c),
        Err(err) => err.into(),
    }
}

#[instrument(skip(storage_manager))]
pub async fn delete_child(
    Path(id): Path<String>,
    storage_manager: Extension<Arc<StorageManager>>,
) -> ChildrenResponse {
    let Some(id) = parse_id(&id) else {
        return ChildrenResponse::NotFound;
    };

    match storage_manager.children().delete(id).await {
        Ok(_) => ChildrenResponse::Deleted,
        Err(err) => err.into(),
    }
}

#[derive(Debug)]
pub enum ChildrenResponse {
    Created(Child),
    Child(Child),
    List(Vec<Child>),
    Deleted,
    NotFound,
    Invalid(ValidationError),
    Internal,
}

impl From<StoreError> for ChildrenResponse {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(err) => ChildrenResponse::Invalid(err),
            StoreError::NotFound(_) => ChildrenResponse::NotFound,
            // Only parent deletes refuse on children.
            err @ StoreError::HasChildren => {
                error!("unexpected child storage error: {err}");
                ChildrenResponse::Internal
            }
            StoreError::Database(err) => {
                error!("child storage failed: {err}");
                ChildrenResponse::Internal
            }
        }
    }
}

impl IntoResponse for ChildrenResponse {
    fn into_response(self) -> Response {
        match self {
            ChildrenResponse::Created(c) => (StatusCode::CREATED, Json(c)).into_response(),
            ChildrenResponse::Child(c) => (StatusCode::OK, Json(c)).into_response(),
            ChildrenResponse::List(l) => (StatusCode::OK, Json(l)).into_response(),
            ChildrenResponse::Deleted => message_response(DELETED),
            ChildrenResponse::NotFound => error_response(StatusCode::NOT_FOUND, NOT_FOUND),
            ChildrenResponse::Invalid(err) => (StatusCode::BAD_REQUEST, Json(err.body())).into_response(),
            ChildrenResponse::Internal => internal_error(),
        }
    }
}
