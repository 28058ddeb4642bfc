//! Axum routes for the sales API.
//!
//! - `GET /` - welcome message
//! - `GET /nacional/ventas` - every sale
//! - `POST /nacional/ventas` - create a sale
//! - `GET /nacional/ventas/:id` - one sale
//! - `PUT /nacional/ventas/:id` - coalescing update
//! - `DELETE /nacional/ventas/:id` - delete a sale

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use super::error::ApiError;
use crate::model::{SaleChanges, SaleRecord};
use crate::storage::SalesStore;

const WELCOME: &str = "Bienvenido a la API de las ventas nacionales";

/// State shared by every handler.
pub struct AppState {
    pub store: SalesStore,
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/nacional/ventas", get(list_sales).post(create_sale))
        .route(
            "/nacional/ventas/:id",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "mensaje": WELCOME })))
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SaleRecord>>, ApiError> {
    Ok(Json(state.store.list_all()?))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SaleRecord>, ApiError> {
    let id = parse_id(&id)?;
    let sale = state.store.get_by_id(id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(sale))
}

async fn create_sale(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaleChanges>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = read_body(body)?
        .into_new_sale()
        .ok_or(ApiError::MissingFields)?;

    let id = state.store.insert(&sale)?;
    tracing::debug!(id, modelo = %sale.modelo, "Sale created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "mensaje": "Venta creada", "id": id })),
    ))
}

async fn update_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    // The body is only decoded once the sale is known to exist.
    if state.store.get_by_id(id)?.is_none() {
        return Err(ApiError::NotFound);
    }
    let changes = read_changes(&body)?;
    state.store.update(id, changes)?;

    Ok(Json(json!({ "mensaje": "Venta actualizada correctamente" })))
}

async fn delete_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    if state.store.get_by_id(id)?.is_none() {
        return Err(ApiError::NotFound);
    }
    state.store.delete(id)?;

    Ok(Json(json!({ "mensaje": "Venta eliminada correctamente" })))
}

// A non-numeric id can never match a row.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

fn read_body(body: Result<Json<SaleChanges>, JsonRejection>) -> Result<SaleChanges, ApiError> {
    body.map(|Json(changes)| changes)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

// An empty update body changes nothing.
fn read_changes(body: &[u8]) -> Result<SaleChanges, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SaleChanges::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}
