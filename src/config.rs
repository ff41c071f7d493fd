use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream REST API base URL
    pub api_base: String,
    /// Same-origin relay base URL. Off unless configured.
    pub proxy_base: Option<String>,
    /// Prefer the relay and fall back to the upstream API
    pub use_proxy: bool,
    /// Personal access token attached to direct requests
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Directory holding the local storage file
    pub data_dir: PathBuf,
    /// User agent sent on every request
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            proxy_base: None,
            use_proxy: false,
            token: None,
            data_dir: PathBuf::from(".repo-scout"),
            user_agent: "repo-scout".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.trim().is_empty() {
                config.token = Some(token);
            }
        }
        if let Ok(base) = std::env::var("REPO_SCOUT_API_BASE") {
            config.api_base = base;
        }
        if let Ok(base) = std::env::var("REPO_SCOUT_PROXY_BASE") {
            // Only a non-empty value turns the relay on
            config.proxy_base = Some(base).filter(|b| !b.trim().is_empty());
        }
        if let Ok(val) = std::env::var("REPO_SCOUT_USE_PROXY") {
            config.use_proxy = parse_flag(&val);
        }
        if let Ok(dir) = std::env::var("REPO_SCOUT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(agent) = std::env::var("REPO_SCOUT_USER_AGENT") {
            config.user_agent = agent;
        }

        config
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
