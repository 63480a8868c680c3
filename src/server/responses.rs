use serde::{Deserialize, Serialize};

use crate::status::{MirrorState, StatusRecord};

/// `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: MirrorState,
    pub message: String,
    /// Unix seconds of the last status change.
    pub timestamp: f64,
}

impl From<StatusRecord> for StatusResponse {
    fn from(record: StatusRecord) -> Self {
        Self {
            status: record.state,
            message: record.message,
            timestamp: record.last_updated,
        }
    }
}

/// `GET /categories/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub total: usize,
}

/// `GET /get-wallpaper/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallpaperResponse {
    pub category: String,
    pub filename: String,
    pub wallpaper_url: String,
    pub total_wallpapers_in_category: usize,
}

/// `GET /list-wallpapers/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallpaperListResponse {
    pub category: String,
    pub wallpapers: Vec<String>,
    pub total: usize,
}

/// Error envelope; `detail` is either a message or a structured object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody<T> {
    pub detail: T,
}

/// `detail` of a 404 for an unknown category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNotFound {
    pub error: String,
    pub available_categories: Vec<String>,
}

/// Query string shared by the wallpaper endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryQuery {
    #[serde(default = "default_category")]
    pub category: String,
}

pub const DEFAULT_CATEGORY: &str = "default";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}
