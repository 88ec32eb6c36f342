use crate::datatypes::Parent;
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

pub const NOT_FOUND: &str = "Parent not found.";
pub const NOT_FOUND_ON_UPDATE: &str = "Parent not found. Please create the parent first.";
pub const DELETED: &str = "Parent deleted successfully.";

#[instrument(skip(storage_manager))]
pub async fn list_parents(storage_manager: Extension<Arc<StorageManager>>) -> ParentsResponse {
    match storage_manager.parents().list().await {
        Ok(l) => ParentsResponse::List(l),
        Err(err) => err.into(),
    }
}

#[instrument(skip(storage_manager, body))]
pub async fn add_parent(
    storage_manager: Extension<Arc<StorageManager>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ParentsResponse {
    let fields = match json_object(body) {
        Ok(fields) => fields,
        Err(err) => return ParentsResponse::Invalid(err),
    };

    match storage_manager.parents().create(&fields).await {
        Ok(p) => ParentsResponse::Created(p),
        Err(err) => err.into(),
    }
}

#[instrument(skip(storage_manager))]
pub async fn get_parent(
    Path(id): Path<String>,
    storage_manager: Extension<Arc<StorageManager>>,
) -> ParentsResponse {
    let Some(id) = parse_id(&id) else {
        return ParentsResponse::NotFound(NOT_FOUND);
    };

    match storage_manager.parents().get(id).await {
        Ok(p) => ParentsResponse::Parent(p),
        Err(err) => err.into(),
    }
}

/// Serves both PATCH and PUT; either way only supplied fields change.
/// An unknown id is reported before a bad body.
#[instrument(skip(storage_manager, body))]
pub async fn edit_parent(
    Path(id): Path<String>,
    storage_manager: Extension<Arc<StorageManager>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ParentsResponse {
    let Some(id) = parse_id(&id) else {
        return ParentsResponse::NotFound(NOT_FOUND_ON_UPDATE);
    };

    let fields = match json_object(body) {
        Ok(fields) => fields,
        Err(invalid) => {
            return match storage_manager.parents().get(id).await {
                Ok(_) => ParentsResponse::Invalid(invalid),
                Err(StoreError::NotFound(_)) => ParentsResponse::NotFound(NOT_FOUND_ON_UPDATE),
                Err(err) => err.into(),
            }
        }
    };

    match storage_manager.parents().update(id, &fields).await {
        Ok(p) => ParentsResponse::Parent(p),
        Err(StoreError::NotFound(_)) => ParentsResponse::NotFound(NOT_FOUND_ON_UPDATE),
        Err(err) => err.into(),
    }
}

#[instrument(skip(storage_manager))]
pub async fn delete_parent(
    Path(id): Path<String>,
    storage_manager: Extension<Arc<StorageManager>>,
) -> ParentsResponse {
    let Some(id) = parse_id(&id) else {
        return ParentsResponse::NotFound(NOT_FOUND);
    };

    match storage_manager.parents().delete(id).await {
        Ok(_) => ParentsResponse::Deleted,
        Err(err) => err.into(),
    }
}

#[derive(Debug)]
pub enum ParentsResponse {
    Created(Parent),
    Parent(Parent),
    List(Vec<Parent>),
    Deleted,
    NotFound(&'static str),
    Invalid(ValidationError),
    HasChildren,
    Internal,
}

impl From<StoreError> for ParentsResponse {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(err) => ParentsResponse::Invalid(err),
            StoreError::NotFound(_) => ParentsResponse::NotFound(NOT_FOUND),
            StoreError::HasChildren => ParentsResponse::HasChildren,
            StoreError::Database(err) => {
                error!("parent storage failed: {err}");
                ParentsResponse::Internal
            }
        }
    }
}

impl IntoResponse for ParentsResponse {
    fn into_response(self) -> Response {
        match self {
            ParentsResponse::Created(p) => (StatusCode::CREATED, Json(p)).into_response(),
            ParentsResponse::Parent(p) => (StatusCode::OK, Json(p)).into_response(),
            ParentsResponse::List(l) => (StatusCode::OK, Json(l)).into_response(),
            ParentsResponse::Deleted => message_response(DELETED),
            ParentsResponse::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
            ParentsResponse::Invalid(err) => (StatusCode::BAD_REQUEST, Json(err.body())).into_response(),
            ParentsResponse::HasChildren => {
                error_response(StatusCode::BAD_REQUEST, StoreError::HasChildren.to_string())
            }
            ParentsResponse::Internal => internal_error(),
        }
    }
}
