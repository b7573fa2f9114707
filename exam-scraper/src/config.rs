use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::retry::RetryPolicy;

/// Name of the output directory created under the user's home.
pub const ROOT_DIR_NAME: &str = "Exams";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    /// Deadline for the whole request once connected.
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: format!("exam-scraper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `~/Exams`, the default root of the download tree.
pub fn default_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(ROOT_DIR_NAME))
}
