use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming the config file.
pub const CONF_PATH_ENV: &str = "MINDLY_CONF_PATH";

/// Contents of `config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindlyConfig {
    /// Directory holding `mindly.index` and the document files. A leading
    /// `~` is expanded to the home directory.
    pub mindly_data_dir: Option<String>,
}

impl MindlyConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The configured data directory with `~` expanded.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.mindly_data_dir.as_deref().map(expand_tilde)
    }
}

/// Config file location: `env_value` (the `MINDLY_CONF_PATH` value) when
/// set and non-empty, else `~/.config/mindly/config.toml`.
pub fn config_path(env_value: Option<&str>) -> Option<PathBuf> {
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(path) => Some(expand_tilde(path)),
        None => dirs::home_dir().map(|home| home.join(".config/mindly/config.toml")),
    }
}

/// Expand a leading `~` or `~/` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Pick the data directory: the `--data-dir` flag wins, then the config
/// file.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    let env_value = std::env::var(CONF_PATH_ENV).ok();
    let Some(path) = config_path(env_value.as_deref()) else {
        bail!("no home directory; set {CONF_PATH_ENV} or pass --data-dir");
    };
    debug!(path = %path.display(), "loading config");
    let config = MindlyConfig::load(&path)?;
    config
        .data_dir()
        .with_context(|| format!("{} does not set mindly_data_dir", path.display()))
}
