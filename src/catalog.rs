//! Read-only view of the wallpapers inside the mirrored working copy.
//!
//! ```text
//! <mirror>/
//! └── category/
//!     ├── nature/
//!     │   ├── a.jpg
//!     │   └── b.PNG
//!     └── space/
//! ```
//!
//! Nothing here is cached; every call lists the directories again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::CategoryName;

/// Directory under the mirror root that holds one subdirectory per category.
pub const CATEGORY_DIR: &str = "category";

/// Extensions served as wallpapers, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One image file in a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallpaper {
    pub filename: String,
    /// `category/<name>/<file>`, always `/`-separated.
    pub relative_path: String,
    /// Public raw-content URL. Not checked for reachability.
    pub url: String,
}

pub struct Catalog {
    root: PathBuf,
    raw_base_url: String,
}

fn is_supported(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn read_dir(path: &Path) -> Result<Option<fs::ReadDir>, CatalogError> {
    match fs::read_dir(path) {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>, raw_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            raw_base_url: raw_base_url.into(),
        }
    }

    /// `<root>/category`
    pub fn categories_dir(&self) -> PathBuf {
        self.root.join(CATEGORY_DIR)
    }

    /// Names of the directories directly under `category/`, sorted.
    ///
    /// Only names that parse as a [`CategoryName`] are listed, so everything
    /// returned here is also accepted by [`Catalog::list_wallpapers`]. A
    /// missing `category/` directory is an empty catalog, not an error.
    pub fn list_categories(&self) -> Result<Vec<String>, CatalogError> {
        let dir = self.categories_dir();
        let Some(entries) = read_dir(&dir)? else {
            return Ok(Vec::new());
        };

        let mut categories = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: dir.clone(),
                source,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            // Non-UTF-8 names cannot be requested over HTTP anyway.
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.parse::<CategoryName>().is_ok() {
                categories.push(name);
            }
        }

        categories.sort();
        Ok(categories)
    }

    /// Image files in one category, sorted by filename.
    ///
    /// Returns `None` when the category directory does not exist (or the
    /// name could never be a category), and `Some(vec![])` when it exists
    /// but holds no supported images.
    pub fn list_wallpapers(&self, category: &str) -> Result<Option<Vec<Wallpaper>>, CatalogError> {
        let Ok(name) = category.parse::<CategoryName>() else {
            return Ok(None);
        };

        let dir = self.categories_dir().join(name.as_str());
        if !dir.is_dir() {
            return Ok(None);
        }
        let Some(entries) = read_dir(&dir)? else {
            return Ok(None);
        };

        let mut wallpapers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: dir.clone(),
                source,
            })?;
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !is_supported(&filename) || !entry.path().is_file() {
                continue;
            }
            wallpapers.push(self.wallpaper(&name, filename));
        }

        wallpapers.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(Some(wallpapers))
    }

    fn wallpaper(&self, category: &CategoryName, filename: String) -> Wallpaper {
        let relative_path = format!("{}/{}/{}", CATEGORY_DIR, category, filename);
        let url = format!(
            "{}/{}",
            self.raw_base_url.trim_end_matches('/'),
            relative_path
        );
        Wallpaper {
            filename,
            relative_path,
            url,
        }
    }
}
