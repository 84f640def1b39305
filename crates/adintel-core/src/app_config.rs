use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub tuning_path: PathBuf,
    /// Explicit browser binary; `None` means auto-detect.
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    pub nav_timeout_secs: u64,
    /// Upper bound on concurrently open browser contexts.
    pub max_contexts: usize,
    pub country: String,
    pub output_dir: PathBuf,
}

impl AppConfig {
    #[must_use]
    pub fn nav_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.nav_timeout_secs)
    }
}
