use std::time::Duration;

use thiserror::Error;

use crate::server::StatusResponse;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing is listening at the server URL.
    #[error("server is not running at {0}")]
    NotRunning(String),
    /// The server answered with a non-2xx status.
    #[error("HTTP {code}: {body}")]
    Http { code: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Blocking client for a running wallsync server.
pub struct Client {
    base_url: String,
    agent: ureq::Agent,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("wallsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_text(&self, path: &str) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        match self.agent.get(&url).call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| ClientError::InvalidResponse(e.to_string())),
            Err(ureq::Error::Status(code, response)) => Err(ClientError::Http {
                code,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(t)) if matches!(t.kind(), ureq::ErrorKind::ConnectionFailed) => {
                Err(ClientError::NotRunning(self.base_url.clone()))
            }
            Err(ureq::Error::Transport(t)) => Err(ClientError::Transport(t.to_string())),
        }
    }

    /// `GET /status`
    pub fn status(&self) -> Result<StatusResponse, ClientError> {
        let body = self.get_text("/status")?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}
