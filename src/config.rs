//! Viewer configuration
//!
//! Layers, highest priority first: CLI flags, environment
//! (`PIPEVIZ_API_URL`, `PIPEVIZ_INTERVAL_MS`), YAML config file, defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::classify::DEFAULT_SEARCH_DEPTH;
use crate::error::{PipevizError, Result};
use crate::playback::{clamp_interval_ms, DEFAULT_INTERVAL_MS};
use crate::tui::widgets::tree_view::{DEFAULT_MAX_RENDER_DEPTH, DEFAULT_STAGGER_MS};

/// Public demo deployment of the question-answering service
pub const DEFAULT_API_URL: &str = "https://duke0503-cs229-demo.hf.space";

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "pipeviz.yaml";

pub const ENV_API_URL: &str = "PIPEVIZ_API_URL";
pub const ENV_INTERVAL_MS: &str = "PIPEVIZ_INTERVAL_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub api_url: String,
    /// Auto-advance interval; clamped to 1000..=10000
    pub advance_interval_ms: u64,
    pub speed_step_ms: u64,
    pub request_timeout_secs: u64,
    /// Depth guard for functor detection
    pub functor_search_depth: usize,
    pub max_render_depth: usize,
    /// Tree entrance stagger per row, 0 disables it
    pub tree_stagger_ms: u64,
    /// Log destination while the dashboard owns the terminal
    pub log_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            advance_interval_ms: DEFAULT_INTERVAL_MS,
            speed_step_ms: 500,
            request_timeout_secs: 60,
            functor_search_depth: DEFAULT_SEARCH_DEPTH,
            max_render_depth: DEFAULT_MAX_RENDER_DEPTH,
            tree_stagger_ms: DEFAULT_STAGGER_MS,
            log_file: None,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub interval_ms: Option<u64>,
}

impl ViewerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Resolve all layers against the real environment
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve all layers with an injectable environment lookup
    pub fn resolve_with(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match &overrides.config_path {
            Some(path) => Self::load_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::load_file(local)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(url) = env(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_url = url;
        }
        if let Some(raw) = env(ENV_INTERVAL_MS).filter(|v| !v.trim().is_empty()) {
            config.advance_interval_ms = raw.trim().parse().map_err(|_| {
                PipevizError::Config(format!("{} must be milliseconds, got '{}'", ENV_INTERVAL_MS, raw))
            })?;
        }

        if let Some(url) = &overrides.api_url {
            config.api_url = url.clone();
        }
        if let Some(ms) = overrides.interval_ms {
            config.advance_interval_ms = ms;
        }

        config.validate()
    }

    /// Normalise and check the final values
    pub fn validate(mut self) -> Result<Self> {
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        self.base_url()?;
        self.advance_interval_ms = clamp_interval_ms(self.advance_interval_ms);
        if self.speed_step_ms == 0 {
            return Err(PipevizError::Config("speed_step_ms must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(PipevizError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Parsed service URL (absolute http or https)
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_url).map_err(|source| PipevizError::InvalidUrl {
            url: self.api_url.clone(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(PipevizError::Config(format!(
                "API URL must use http or https, got '{}'",
                other
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tree_stagger(&self) -> Duration {
        Duration::from_millis(self.tree_stagger_ms)
    }
}
