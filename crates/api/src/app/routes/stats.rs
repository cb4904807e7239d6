use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/certifications", get(certifications))
        .route("/seasons", get(seasons))
        .route("/seasonal", get(seasonal))
        .route("/price-categories", get(price_categories))
        .route("/local", get(local_producers))
        .route("/average-distance", get(average_distance))
        .route("/summary", get(summary))
}

pub async fn certifications(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.certification_histogram() {
        Ok(h) => (StatusCode::OK, Json(dto::histogram_to_json(&h))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn seasons(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.season_histogram() {
        Ok(h) => (StatusCode::OK, Json(dto::histogram_to_json(&h))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn seasonal(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::SeasonalQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let Some(label) = query.label else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_label",
            "label query parameter is required",
        );
    };
    let products = match services.catalog.seasonal_products(&label) {
        Ok(p) => p,
        Err(e) => return errors::catalog_error_to_response(e),
    };
    let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
    (
        StatusCode::OK,
        Json(serde_json::json!({ "label": label, "items": items })),
    )
        .into_response()
}

pub async fn price_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.price_categories() {
        Ok(t) => (StatusCode::OK, Json(dto::price_tertiles_to_json(&t))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn local_producers(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::LocalQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let threshold = query.threshold.unwrap_or(services.local_threshold_miles);
    match services.catalog.local_producer_count(threshold) {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({ "threshold_miles": threshold, "count": count })),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn average_distance(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.average_distance() {
        Ok(avg) => (
            StatusCode::OK,
            Json(serde_json::json!({ "average_distance_miles": avg })),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.summary(services.local_threshold_miles) {
        Ok(s) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "producer_count": s.producer_count,
                "product_count": s.product_count,
                "average_distance_miles": s.average_distance_miles,
                "local_threshold_miles": s.local_threshold_miles,
                "local_producer_count": s.local_producer_count,
                "generated_at": Utc::now().to_rfc3339(),
            })),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
