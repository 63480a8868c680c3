//! HTTP API.
//!
//! Catalog endpoints refresh the mirror before every read, so the blocking
//! git work and directory listing run on tokio's blocking pool. `/` and
//! `/status` never touch the network.

mod error;
mod responses;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use rand::seq::SliceRandom;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::catalog::{Catalog, Wallpaper};
use crate::config::{STATIC_PREFIX, ServerConfig};
use crate::mirror::Mirror;
use crate::status::StatusTracker;

pub use error::ApiError;
pub use responses::StatusResponse;
use responses::{CategoriesResponse, CategoryQuery, WallpaperListResponse, WallpaperResponse};

/// Shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub status: Arc<StatusTracker>,
    pub mirror: Arc<Mirror>,
    pub catalog: Arc<Catalog>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        status: Arc<StatusTracker>,
        mirror: Mirror,
        catalog: Catalog,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            status,
            mirror: Arc::new(mirror),
            catalog: Arc::new(catalog),
            static_dir: static_dir.into(),
        }
    }

    /// Wire up the git-backed mirror described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let status = Arc::new(StatusTracker::new());
        let mirror = Mirror::from_config(config, Arc::clone(&status));
        let catalog = Catalog::new(&config.mirror_dir, &config.raw_base_url);
        Self::new(status, mirror, catalog, &config.static_dir)
    }

    fn index_path(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }

    /// Refresh the mirror, then run `f` against the catalog, off the async runtime.
    async fn with_fresh_mirror<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Catalog) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            state.mirror.ensure_fresh()?;
            f(&state.catalog)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("refresh task failed: {}", e)))?
    }
}

/// Build the router with every route mounted.
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/status/", get(status))
        .route("/categories", get(list_categories))
        .route("/categories/", get(list_categories))
        .route("/get-wallpaper", get(get_wallpaper))
        .route("/get-wallpaper/", get(get_wallpaper))
        .route("/list-wallpapers", get(list_wallpapers))
        .route("/list-wallpapers/", get(list_wallpapers))
        .nest_service(STATIC_PREFIX, assets)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.socket_addr()` and serve until Ctrl-C.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = AppState::from_config(&config);
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    log::info!(
        "Mirroring {} into {}",
        config.repo_url,
        config.mirror_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    tokio::fs::read_to_string(state.index_path())
        .await
        .map(Html)
        .map_err(ApiError::Index)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.status.read().into())
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state
        .with_fresh_mirror(|catalog| Ok(catalog.list_categories()?))
        .await?;

    Ok(Json(CategoriesResponse {
        total: categories.len(),
        categories,
    }))
}

async fn get_wallpaper(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<WallpaperResponse>, ApiError> {
    let category = query.category;
    log::debug!("random wallpaper requested from {:?}", category);

    let response = state
        .with_fresh_mirror(move |catalog| {
            let wallpapers = wallpapers_in(catalog, &category)?;
            let total = wallpapers.len();
            let chosen = wallpapers
                .choose(&mut rand::thread_rng())
                .cloned()
                .ok_or_else(|| ApiError::EmptyCategory(category.clone()))?;
            log::debug!("picked {}", chosen.relative_path);

            Ok(WallpaperResponse {
                category,
                filename: chosen.filename,
                wallpaper_url: chosen.url,
                total_wallpapers_in_category: total,
            })
        })
        .await?;

    Ok(Json(response))
}

async fn list_wallpapers(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<WallpaperListResponse>, ApiError> {
    let category = query.category;

    let response = state
        .with_fresh_mirror(move |catalog| {
            let wallpapers = wallpapers_in(catalog, &category)?;
            Ok(WallpaperListResponse {
                category,
                total: wallpapers.len(),
                wallpapers: wallpapers.into_iter().map(|w| w.filename).collect(),
            })
        })
        .await?;

    Ok(Json(response))
}

/// Non-empty wallpaper list for a known category, or the matching 404.
fn wallpapers_in(catalog: &Catalog, category: &str) -> Result<Vec<Wallpaper>, ApiError> {
    let available = catalog.list_categories()?;
    if !available.iter().any(|c| c == category) {
        return Err(ApiError::CategoryNotFound {
            category: category.to_string(),
            available,
        });
    }

    match catalog.list_wallpapers(category)? {
        Some(wallpapers) if !wallpapers.is_empty() => Ok(wallpapers),
        Some(_) => Err(ApiError::EmptyCategory(category.to_string())),
        // Removed between the two listings.
        None => Err(ApiError::CategoryNotFound {
            category: category.to_string(),
            available: catalog.list_categories()?,
        }),
    }
}
