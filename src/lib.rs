pub mod children;
pub mod datatypes;
pub mod error;
pub mod misc;
pub mod parents;
pub mod settings;
pub mod storage_manager;
pub mod store;
pub mod transactions;

use crate::storage_manager::StorageManager;
use axum::http::{header, Method};
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Collection and item routes for both resources, each with and without a trailing slash.
pub fn router(storage_manager: Arc<StorageManager>) -> Router {
    let parent_collection = get(parents::list_parents).post(parents::add_parent);
    let parent_item = get(parents::get_parent)
        .patch(parents::edit_parent)
        .put(parents::edit_parent)
        .delete(parents::delete_parent);
    let child_collection = get(children::list_children).post(children::add_child);
    let child_item = get(children::get_child)
        .patch(children::edit_child)
        .put(children::edit_child)
        .delete(children::delete_child);

    Router::new()
        .route("/status", get(misc::status))
        .route("/transactions", get(misc::list_transactions))
        .route("/parents", parent_collection.clone())
        .route("/parents/", parent_collection)
        .route("/parents/:id", parent_item.clone())
        .route("/parents/:id/", parent_item)
        .route("/children", child_collection.clone())
        .route("/children/", child_collection)
        .route("/children/:id", child_item.clone())
        .route("/children/:id/", child_item)
        .fallback(misc::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors())
                .layer(Extension(storage_manager)),
        )
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
