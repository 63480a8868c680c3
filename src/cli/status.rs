//! Text-based status and doctor commands.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cli::{Client, ClientError};
use crate::config::ServerConfig;
use crate::mirror::{GitCli, open_repository, repository_exists, resolve_head, short_sha};

/// Print the status of a running server.
pub fn print_status(client: &Client) -> Result<(), ClientError> {
    let status = client.status()?;

    println!("Wallsync Server Status");
    println!("  Server:  {}", client.base_url());
    println!("  State:   {}", status.status.as_str());
    println!("  Message: {}", status.message);
    println!("  Updated: {}", format_age(status.timestamp));

    Ok(())
}

/// Check the local prerequisites for serving. Returns false if any check failed.
pub fn print_doctor(config: &ServerConfig) -> bool {
    println!("Wallsync System Check\n");

    let git_version = GitCli::new().version();
    report(
        git_version.is_some(),
        "git",
        git_version.as_deref().unwrap_or("not found"),
    );

    let mirror = &config.mirror_dir;
    let mirror_detail = if !mirror.exists() {
        format!("{} (not cloned yet)", mirror.display())
    } else if !repository_exists(mirror) {
        format!("{} (exists but is not a git repository)", mirror.display())
    } else {
        match open_repository(mirror).and_then(|repo| resolve_head(&repo)) {
            Ok((branch, commit)) => {
                format!("{} ({}@{})", mirror.display(), branch, short_sha(&commit))
            }
            Err(e) => format!("{} ({})", mirror.display(), e),
        }
    };
    let mirror_ok = !mirror.exists() || repository_exists(mirror);
    report(mirror_ok, "Mirror", &mirror_detail);

    let index = config.index_path();
    report(index.is_file(), "Index page", &index.display().to_string());

    git_version.is_some() && mirror_ok
}

fn report(ok: bool, label: &str, detail: &str) {
    println!("[{}] {}: {}", if ok { "OK" } else { "FAIL" }, label, detail);
}

/// Describe a Unix timestamp relative to now.
fn format_age(timestamp: f64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(timestamp);
    let secs = (now - timestamp).max(0.0) as u64;

    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}
