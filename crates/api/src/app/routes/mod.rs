use axum::Router;

pub mod producers;
pub mod products;
pub mod stats;
pub mod system;

/// Router for all catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/producers", producers::router())
        .nest("/products", products::router())
        .nest("/stats", stats::router())
}
