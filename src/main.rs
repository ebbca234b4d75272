use axum::{middleware, routing::get, routing::post, routing::put, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use leasehold_api::config;
use leasehold_api::database::manager::DatabaseManager;
use leasehold_api::handlers::{admin, auth, lease, period};
use leasehold_api::middleware::{jwt_auth_middleware, require_admin_roles, require_sub_admin};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, ACCESS_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Leasehold API in {:?} mode", config.environment);

    // Apply pending schema migrations; a failure here is fatal only for the
    // data paths, so the server still comes up and reports via /health.
    if let Err(e) = DatabaseManager::migrate().await {
        tracing::error!("Migration failed: {}", e);
    }

    let app = app();

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Leasehold API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Resources
        .merge(lease_routes())
        .merge(period_routes())
        .merge(user_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn lease_routes() -> Router {
    Router::new()
        .route("/api/v1/lease", get(lease::lease_get).post(lease::lease_post))
        .route("/api/v1/lease/movement", get(lease::lease_movement))
        .route("/api/v1/lease/modify/:id", put(lease::lease_modify))
        .route(
            "/api/v1/lease/:id",
            put(lease::lease_put).delete(lease::lease_delete),
        )
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn period_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/period",
            get(period::period_get).post(period::period_post),
        )
        .route(
            "/api/v1/period/:id",
            put(period::period_put).delete(period::period_delete),
        )
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn user_routes() -> Router {
    // MASTER and ADMIN manage the admin tier
    let admin_tier = Router::new()
        .route(
            "/api/user/admin",
            get(admin::accounts_get).post(admin::admin_post),
        )
        .route(
            "/api/user/admin/:id",
            put(admin::account_put).delete(admin::account_delete),
        )
        .layer(middleware::from_fn(require_admin_roles));

    // SUB_ADMIN manages the user tier
    let user_tier = Router::new()
        .route(
            "/api/user/user",
            get(admin::accounts_get).post(admin::user_post),
        )
        .route(
            "/api/user/user/:id",
            put(admin::account_put).delete(admin::account_delete),
        )
        .layer(middleware::from_fn(require_sub_admin));

    Router::new()
        .route("/api/user/login", post(auth::login_post))
        .route("/api/user/logout", get(auth::logout_get))
        .merge(admin_tier)
        .merge(user_tier)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Leasehold API",
            "version": version,
            "description": "Lease agreement management backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "login": "/api/user/login (public - token acquisition)",
                "lease": "/api/v1/lease[/:id], /api/v1/lease/modify/:id, /api/v1/lease/movement (bearer token)",
                "period": "/api/v1/period[/:id] (bearer token)",
                "admin": "/api/user/admin[/:id] (MASTER, ADMIN)",
                "user": "/api/user/user[/:id] (SUB_ADMIN)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
