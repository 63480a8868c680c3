//! The one place where failures become HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::responses::{CategoryNotFound, ErrorBody};
use crate::catalog::CatalogError;
use crate::mirror::MirrorError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Clone or pull failed.
    #[error(transparent)]
    Mirror(#[from] MirrorError),
    /// Listing the working copy failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Category \"{category}\" not found")]
    CategoryNotFound {
        category: String,
        available: Vec<String>,
    },
    #[error("No wallpapers found in category: {0}")]
    EmptyCategory(String),
    #[error("Error reading HTML file: {0}")]
    Index(#[source] std::io::Error),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CategoryNotFound { .. } | Self::EmptyCategory(_) => StatusCode::NOT_FOUND,
            Self::Mirror(_) | Self::Catalog(_) | Self::Index(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            Self::CategoryNotFound { available, .. } => {
                log::debug!("{}", message);
                let body = ErrorBody {
                    detail: CategoryNotFound {
                        error: message,
                        available_categories: available,
                    },
                };
                (status, Json(body)).into_response()
            }
            Self::EmptyCategory(_) => {
                log::debug!("{}", message);
                (status, Json(ErrorBody { detail: message })).into_response()
            }
            _ => {
                // The raw message reaches the client; keep the server log in step.
                log::error!("request failed: {}", message);
                (status, Json(ErrorBody { detail: message })).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::GitError;

    #[test]
    fn not_found_kinds_map_to_404() {
        let err = ApiError::CategoryNotFound {
            category: "x".to_string(),
            available: vec![],
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Category \"x\" not found");
        assert_eq!(
            ApiError::EmptyCategory("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn mirror_errors_map_to_500_with_raw_text() {
        let err = ApiError::from(MirrorError::from(GitError::PullError(
            "fatal: unable to access".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "pull failed: fatal: unable to access");
    }

    #[test]
    fn index_errors_are_prefixed() {
        let err = ApiError::Index(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Error reading HTML file: No such file or directory"
        );
    }
}
