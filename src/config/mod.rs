mod settings;

pub use settings::{ApiSettings, Config, PdfSettings, ReportSettings, DEFAULT_API_BASE};

use crate::error::{Result, SettlementError};
use directories::ProjectDirs;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the report API base URL
pub const API_URL_ENV: &str = "SETTLEMENT_API_URL";

/// Get the config directory path (~/.settlement/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "settlement") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.settlement/
    let home = dirs_home().ok_or_else(|| {
        SettlementError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".settlement"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the PDF output directory; relative paths live under the config directory
pub fn resolve_output_dir(output_dir: &str, cfg_dir: &Path) -> PathBuf {
    let expanded = expand_path(output_dir);
    if expanded.is_absolute() {
        expanded
    } else {
        cfg_dir.join(expanded)
    }
}

/// Load config.toml. A missing file yields the defaults.
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config.toml, using defaults");
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| SettlementError::ConfigParse { path, source: e })
}

/// Load `.env` files from the working directory and the config directory.
/// Variables already present in the process environment are never overwritten.
pub fn load_env(config_dir: &Path) {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
    let cfg_env = config_dir.join(".env");
    if cfg_env.exists() {
        match dotenvy::from_path(&cfg_env) {
            Ok(()) => tracing::debug!(path = %cfg_env.display(), "loaded .env"),
            Err(e) => tracing::warn!(path = %cfg_env.display(), error = %e, "ignoring unreadable .env"),
        }
    }
}

/// Where the effective API base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Flag,
    Environment,
    ConfigFile,
    Fallback,
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlSource::Flag => write!(f, "--api-url"),
            UrlSource::Environment => write!(f, "{}", API_URL_ENV),
            UrlSource::ConfigFile => write!(f, "config.toml"),
            UrlSource::Fallback => write!(f, "built-in default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub source: UrlSource,
}

/// Pick the API base URL: flag, then environment, then config.toml, then the fallback.
/// Blank values are skipped and a trailing slash is dropped.
pub fn resolve_api_base(flag: Option<&str>, env: Option<&str>, config: &Config) -> ApiEndpoint {
    let candidates = [
        (flag, UrlSource::Flag),
        (env, UrlSource::Environment),
        (config.api.base_url.as_deref(), UrlSource::ConfigFile),
    ];

    let (base_url, source) = candidates
        .into_iter()
        .find_map(|(value, source)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (v, source))
        })
        .unwrap_or((DEFAULT_API_BASE, UrlSource::Fallback));

    ApiEndpoint {
        base_url: base_url.trim_end_matches('/').to_string(),
        source,
    }
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[api]
# Report service base URL. SETTLEMENT_API_URL and --api-url take precedence.
base_url = "https://report-backend.azurewebsites.net/api"
timeout_secs = 15

[report]
currency_symbol = "Bs. "

[pdf]
output_dir = "output"   # relative paths live under this config directory
"#;
