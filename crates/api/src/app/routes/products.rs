use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(create_product).get(list_products))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let row = match body.into_new_product() {
        Ok(row) => row,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let catalog = services.catalog.clone();
    match tokio::task::spawn_blocking(move || catalog.add_product(row)).await {
        Ok(Ok(product)) => {
            (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
        }
        Ok(Err(e)) => errors::catalog_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = match services.catalog.list_products() {
        Ok(p) => p,
        Err(e) => return errors::catalog_error_to_response(e),
    };
    let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}
