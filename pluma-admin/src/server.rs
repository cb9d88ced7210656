use crate::handlers;
use crate::middleware::api_key_auth;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use pluma_core::config::AdminConfig;
use pluma_registry::PluginService;
use pluma_store::PluginCache;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Base path of the plugin API.
pub const PLUGIN_API_BASE: &str = "/api/chat/plugin";

/// Shared state for the Admin API.
pub struct AdminState {
    pub service: Arc<PluginService>,
    /// Event-synced mirror, reported by the health endpoint.
    pub cache: PluginCache,
    /// Required `x-api-key` value; `None` leaves the API open.
    pub api_key: Option<String>,
    /// Snapshot file backing the store, if any.
    pub state_file: Option<PathBuf>,
}

/// Build the Axum router with all admin routes.
pub fn build_admin_router(state: Arc<AdminState>) -> Router {
    let plugin_api = Router::new()
        .route(
            PLUGIN_API_BASE,
            get(handlers::plugins::list_plugins).post(handlers::plugins::create_plugin),
        )
        .route(
            &format!("{PLUGIN_API_BASE}/query"),
            post(handlers::plugins::query_plugins),
        )
        .route(
            &format!("{PLUGIN_API_BASE}/search"),
            get(handlers::plugins::search_plugins),
        )
        .route(
            &format!("{PLUGIN_API_BASE}/name/{{name}}"),
            get(handlers::plugins::get_plugin_by_name),
        )
        .route(
            &format!("{PLUGIN_API_BASE}/{{id}}"),
            get(handlers::plugins::get_plugin)
                .put(handlers::plugins::update_plugin)
                .delete(handlers::plugins::delete_plugin),
        )
        .route_layer(from_fn_with_state(Arc::clone(&state), api_key_auth));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(plugin_api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the admin API until the process shuts down.
pub async fn start_admin(config: AdminConfig, state: Arc<AdminState>) -> anyhow::Result<()> {
    if !config.enabled {
        info!("Admin API disabled");
        return Ok(());
    }

    let app = build_admin_router(state);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!(addr = %config.addr, "Starting Admin API server");
    axum::serve(listener, app).await?;
    Ok(())
}
