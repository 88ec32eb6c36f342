use crate::datatypes::{json_kind, Body};
use crate::error::ValidationError;
use crate::storage_manager::StorageManager;
use crate::transactions::Transaction;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: error.into() })).into_response()
}

pub fn message_response(message: impl Into<String>) -> Response {
    (StatusCode::OK, Json(MessageBody { message: message.into() })).into_response()
}

pub fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
}

/// Request bodies must be JSON objects.
pub fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Body, ValidationError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(other)) => Err(ValidationError::field(
            "non_field_errors",
            format!("Invalid data. Expected a dictionary, but got {}.", json_kind(&other)),
        )),
        Err(rejection) => Err(ValidationError::Malformed(rejection.body_text())),
    }
}

pub async fn status() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found.")
}

#[instrument(skip(storage_manager))]
pub async fn list_transactions(storage_manager: Extension<Arc<StorageManager>>) -> TransactionsResponse {
    match storage_manager.transactions_list().await {
        Ok(list) => TransactionsResponse::List(list),
        Err(err) => {
            error!("failed to read transaction log: {err:#}");
            TransactionsResponse::FailedToRead
        }
    }
}

#[derive(Debug)]
pub enum TransactionsResponse {
    List(Vec<Transaction>),
    FailedToRead,
}

impl IntoResponse for TransactionsResponse {
    fn into_response(self) -> Response {
        match self {
            TransactionsResponse::List(l) => (StatusCode::OK, Json(l)).into_response(),
            TransactionsResponse::FailedToRead => internal_error(),
        }
    }
}
