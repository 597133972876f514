use std::sync::Arc;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{Value, json};
use tracing::{event, Level};

use crate::{dtos::{ApiError, CreateProductRequest, UpdateProductRequest}, errors::ProductError, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(get_all_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .with_state(state)
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn get_all_products(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.product_service.list_products().await {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(e) => error_response(e)
    }
}

pub async fn get_product(Path(id): Path<i64>, State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.product_service.get_product(id).await {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(e) => error_response(e)
    }
}

pub async fn create_product(State(state): State<Arc<AppState>>, Json(request): Json<CreateProductRequest>) -> (StatusCode, Json<Value>) {
    match state.product_service.create_product(request).await {
        Ok(response) => (StatusCode::CREATED, Json(json!(response))),
        Err(e) => error_response(e)
    }
}

pub async fn update_product(Path(id): Path<i64>, State(state): State<Arc<AppState>>, Json(request): Json<UpdateProductRequest>) -> (StatusCode, Json<Value>) {
    match state.product_service.update_product(id, request).await {
        Ok(response) => (StatusCode::OK, Json(json!(response))),
        Err(e) => error_response(e)
    }
}

pub async fn delete_product(Path(id): Path<i64>, State(state): State<Arc<AppState>>) -> Response {
    match state.product_service.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response()
    }
}

fn error_response(e: ProductError) -> (StatusCode, Json<Value>) {
    let status = e.status_code();
    event!(Level::DEBUG, "Responding {} to caller: {}", status, e);
    (status, Json(json!(ApiError::new(e.to_string()))))
}
