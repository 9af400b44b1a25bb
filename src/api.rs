//! HTTP surface for the products catalog.
//!
//! - `GET /products` – List every product in ascending id order.
//! - `POST /products` – Create a product from `{name, price}`; responds `201` with the record.
//! - `GET /products/{id}` – Fetch one product.
//! - `PUT /products/{id}` – Replace a product's name and price.
//! - `DELETE /products/{id}` – Remove a product; responds `204`.
//! - `GET /metrics` – Mutation counters and the current record count.
//!
//! Failures are returned as plain text: `400` for a malformed id or body, `404` for an unknown
//! id or path, and `405` for an unsupported method on a known path. Everything after
//! `/products/` is treated as the id, so `/products/1/2` is a malformed id rather than an
//! unknown path.

use crate::metrics::MetricsSnapshot;
use crate::store::{Catalog, CatalogError, Product, ProductInput};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use std::sync::Arc;
use thiserror::Error;

/// Build the HTTP router over a shared catalog.
pub fn create_router<S>(catalog: Arc<S>) -> Router
where
    S: Catalog + 'static,
{
    Router::new()
        .route(
            "/products",
            get(list_products::<S>)
                .head(method_not_allowed)
                .post(create_product::<S>)
                .fallback(method_not_allowed),
        )
        // the catch-all never matches an empty suffix, so `/products/` is routed on its own
        .route("/products/", item_routes::<S>())
        .route("/products/*id", item_routes::<S>())
        .route("/metrics", get(get_metrics::<S>))
        .fallback(not_found)
        .with_state(catalog)
}

/// Method router shared by every path under `/products/`. `get` would also answer HEAD, so
/// HEAD is claimed explicitly.
fn item_routes<S>() -> MethodRouter<Arc<S>>
where
    S: Catalog + 'static,
{
    get(get_product::<S>)
        .head(method_not_allowed)
        .put(update_product::<S>)
        .delete(delete_product::<S>)
        .fallback(method_not_allowed)
}

/// Create a product under the next free id.
async fn create_product<S>(
    State(catalog): State<Arc<S>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Product>), ApiError>
where
    S: Catalog,
{
    let input = parse_body(&body)?;
    let product = catalog.create(input);
    tracing::info!(
        id = product.id,
        name = %product.name,
        price = product.price,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product<S>(
    State(catalog): State<Arc<S>>,
    uri: Uri,
) -> Result<Json<Product>, ApiError>
where
    S: Catalog,
{
    let id = parse_id(item_suffix(&uri))?;
    Ok(Json(catalog.get(id)?))
}

/// Replace the product at `id`. The path id always wins over any id in the body.
async fn update_product<S>(
    State(catalog): State<Arc<S>>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Product>, ApiError>
where
    S: Catalog,
{
    let id = parse_id(item_suffix(&uri))?;
    let input = parse_body(&body)?;
    let product = catalog.update(id, input)?;
    tracing::info!(
        id = product.id,
        name = %product.name,
        price = product.price,
        "Product updated"
    );
    Ok(Json(product))
}

async fn delete_product<S>(
    State(catalog): State<Arc<S>>,
    uri: Uri,
) -> Result<StatusCode, ApiError>
where
    S: Catalog,
{
    let id = parse_id(item_suffix(&uri))?;
    catalog.delete(id)?;
    tracing::info!(id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products<S>(State(catalog): State<Arc<S>>) -> Json<Vec<Product>>
where
    S: Catalog,
{
    Json(catalog.list())
}

async fn get_metrics<S>(State(catalog): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: Catalog,
{
    Json(catalog.metrics_snapshot())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// Everything after `/products/`, slashes included.
fn item_suffix(uri: &Uri) -> &str {
    uri.path().strip_prefix("/products/").unwrap_or_default()
}

/// Parse the item suffix as a positive product id.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    match raw.parse::<u64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::InvalidId),
    }
}

/// Decode a `{name, price}` body. The content type is not checked.
///
/// Only the first JSON value is read; anything after it is ignored. A literal `null` yields an
/// input with zero values.
fn parse_body(body: &[u8]) -> Result<ProductInput, ApiError> {
    let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<ProductInput>>();
    match values.next() {
        Some(Ok(input)) => Ok(input.unwrap_or_default()),
        Some(Err(err)) => Err(ApiError::InvalidBody(err)),
        None => Err(ApiError::EmptyBody),
    }
}

/// Request failures, all reported to the caller as plain text.
#[derive(Debug, Error)]
enum ApiError {
    #[error("Invalid product ID")]
    InvalidId,
    #[error("Error parsing request body")]
    InvalidBody(#[source] serde_json::Error),
    #[error("Error parsing request body")]
    EmptyBody,
    #[error("Product not found")]
    NotFound(u64),
    #[error("Invalid request method")]
    MethodNotAllowed,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId | Self::InvalidBody(_) | Self::EmptyBody => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidBody(source) => {
                tracing::debug!(error = %source, "Rejected request body")
            }
            Self::NotFound(id) => tracing::debug!(id, "Product lookup missed"),
            _ => tracing::debug!(error = %self, "Rejected request"),
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(inner: CatalogError) -> Self {
        match inner {
            CatalogError::NotFound(id) => Self::NotFound(id),
        }
    }
}
