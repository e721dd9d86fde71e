use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod middleware;
pub mod reconcile;
pub mod store;

pub use store::AppState;

/// Build the full router. `main` feeds this a Postgres-backed state;
/// integration tests feed it a memory-backed one.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/data", get(handlers::data::list).post(handlers::data::create))
        .route(
            "/data/:id",
            put(handlers::data::update).delete(handlers::data::remove),
        )
        .route_layer(axum::middleware::from_fn(middleware::auth::bearer_auth));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .merge(protected)
        // Detailed polygons run to megabytes of coordinates; the framework
        // default of 2 MB cuts them off
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
