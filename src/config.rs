//! Server configuration.
//!
//! Every value has a default that reproduces the fixed deployment: listen on
//! `0.0.0.0:8080`, mirror `Sandesh2007/wall_bank` into
//! `<temp dir>/wallpapers`, serve assets from `./static`. Command-line flags
//! override individual values.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REPO_URL: &str = "https://github.com/Sandesh2007/wall_bank";
pub const DEFAULT_RAW_BASE_URL: &str =
    "https://raw.githubusercontent.com/sandesh2007/wall_bank/master";
/// Name of the working copy directory inside the temp dir.
pub const MIRROR_DIR_NAME: &str = "wallpapers";
pub const DEFAULT_STATIC_DIR: &str = "static";
/// URL prefix the static directory is mounted under.
pub const STATIC_PREFIX: &str = "/static";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub repo_url: String,
    pub raw_base_url: String,
    pub mirror_dir: PathBuf,
    pub static_dir: PathBuf,
    /// How long a refresh waits for another process's mirror lock.
    /// `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            repo_url: DEFAULT_REPO_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            mirror_dir: std::env::temp_dir().join(MIRROR_DIR_NAME),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            lock_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// The page served at `/`.
    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

/// Flags describing which repository to mirror and where.
#[derive(Debug, Clone, Default, Args)]
pub struct MirrorArgs {
    /// Remote repository to mirror
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Base URL that wallpaper paths are appended to
    #[arg(long)]
    pub raw_base_url: Option<String>,

    /// Local working copy [default: <temp dir>/wallpapers]
    #[arg(long)]
    pub mirror_dir: Option<PathBuf>,

    /// Seconds to wait for another process's mirror lock [default: no limit]
    #[arg(long, value_name = "SECS")]
    pub lock_timeout: Option<u64>,
}

/// Flags for `serve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on [default: 0.0.0.0]
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Port to listen on [default: 8080]
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Directory served under /static and holding index.html [default: static]
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    #[command(flatten)]
    pub mirror: MirrorArgs,
}

impl MirrorArgs {
    /// Apply these flags on top of `config`.
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(url) = self.repo_url {
            config.repo_url = url;
        }
        if let Some(url) = self.raw_base_url {
            config.raw_base_url = url;
        }
        if let Some(dir) = self.mirror_dir {
            config.mirror_dir = dir;
        }
        if let Some(secs) = self.lock_timeout {
            config.lock_timeout = Some(Duration::from_secs(secs));
        }
    }

    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        self.apply(&mut config);
        config
    }
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = self.static_dir {
            config.static_dir = dir;
        }
        self.mirror.apply(&mut config);
        config
    }
}
