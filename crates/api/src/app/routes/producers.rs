use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_producer).get(list_producers))
        .route("/:name", get(get_producer))
        .route("/:name/products", get(list_producer_products))
}

pub async fn create_producer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProducerRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let row = body.into_new_producer();

    // Write-through does file IO under the catalog lock.
    let catalog = services.catalog.clone();
    match tokio::task::spawn_blocking(move || catalog.add_producer(row)).await {
        Ok(Ok(producer)) => {
            (StatusCode::CREATED, Json(dto::producer_to_json(&producer))).into_response()
        }
        Ok(Err(e)) => errors::catalog_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

pub async fn list_producers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let producers = match services.catalog.list_producers() {
        Ok(p) => p,
        Err(e) => return errors::catalog_error_to_response(e),
    };
    let items = producers.iter().map(dto::producer_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_producer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match services.catalog.producer(&name) {
        Ok(producer) => (StatusCode::OK, Json(dto::producer_to_json(&producer))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_producer_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    // Unknown producers are a 404, not an empty list.
    if let Err(e) = services.catalog.producer(&name) {
        return errors::catalog_error_to_response(e);
    }
    let products = match services.catalog.products_by_producer(&name) {
        Ok(p) => p,
        Err(e) => return errors::catalog_error_to_response(e),
    };
    let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
    (
        StatusCode::OK,
        Json(serde_json::json!({ "producer": name, "items": items })),
    )
        .into_response()
}
