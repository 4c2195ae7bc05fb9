//! Food Catalog Admin Backend
//!
//! REST backend for curating a product catalog: sanitizing loosely shaped
//! product JSON, cursor-paged browsing with search, bulk import of
//! category-organized source files and a small category taxonomy.

mod api;
mod auth;
mod categories;
mod config;
mod db;
mod errors;
mod import;
mod models;
mod pagination;
mod sanitize;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use categories::CategoryRegistry;
use config::{Config, StoreKind};
use db::{DocumentStore, MemoryStore, Repository, SqliteStore};
use import::Importer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub importer: Arc<Importer>,
    pub categories: Arc<CategoryRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every component to the one store client.
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        let repo = Arc::new(Repository::new(store));
        let importer = Arc::new(Importer::new(
            repo.clone(),
            config.data_dir.clone(),
            config.error_sample,
        ));
        let categories = Arc::new(CategoryRegistry::new(repo.clone()));

        Self {
            repo,
            importer,
            categories,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Food Catalog Admin Backend");
    tracing::info!("Store backend: {:?}", config.store);
    tracing::info!("Import source: {:?}", config.data_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the admin key is not configured
    if config.admin_key.is_none() {
        tracing::warn!("No admin key configured (CATALOG_ADMIN_KEY). Authentication is disabled!");
    }

    // Construct the store client once
    let store: Arc<dyn DocumentStore> = match config.store {
        StoreKind::Sqlite => {
            tracing::info!("Database path: {:?}", config.db_path);
            let pool = db::init_database(&config.db_path).await?;
            Arc::new(SqliteStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let bind_addr = config.bind_addr;
    let state = AppState::new(store, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the admin key for the auth layer
    let admin_key = state.config.admin_key.clone();

    // API routes
    let api_routes = Router::new()
        // Products
        .route("/products", get(api::list_products).post(api::create_product))
        .route("/products/sanitize", post(api::sanitize_product))
        .route("/products/brands", get(api::list_brands))
        .route(
            "/products/{id}",
            get(api::get_product)
                .put(api::update_product)
                .delete(api::delete_product),
        )
        // Preferences
        .route(
            "/preferences",
            get(api::list_preferences).post(api::create_preference),
        )
        .route(
            "/preferences/{id}",
            get(api::get_preference)
                .put(api::update_preference)
                .delete(api::delete_preference),
        )
        // Categories
        .route(
            "/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route("/categories/overview", get(api::category_overview))
        .route(
            "/categories/{id}",
            put(api::update_category).delete(api::delete_category),
        )
        // Import
        .route("/import/all", post(api::import_all))
        .route("/import/test", post(api::test_import))
        // Apply admin auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_auth_layer(admin_key.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
