use cue_types::ui::UiOptions;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Default reveal threshold for scroll-driven content.
pub const DEFAULT_REVEAL_THRESHOLD: u8 = 95;
/// Roughly one animation frame.
pub const DEFAULT_SCROLL_SAMPLE_INTERVAL_MS: u64 = 16;
pub const DEFAULT_NOTICE_TTL_MS: u64 = 2500;

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

/// Contents of `~/.cue/config.toml`.
///
/// ```toml
/// [engagement]
/// reveal_threshold_percent = 95
/// scroll_sample_interval_ms = 16
/// allow_early_step_advance = true
/// notice_ttl_ms = 2500
///
/// [catalog]
/// path = "${HOME}/content/catalog.json"
///
/// [ui]
/// ascii_only = false
/// high_contrast = false
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CueConfig {
    pub engagement: Option<EngagementConfig>,
    pub catalog: Option<CatalogConfig>,
    pub ui: Option<UiConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EngagementConfig {
    /// Scroll percentage at which an article reveals its Truth Layer. Default: 95.
    pub reveal_threshold_percent: Option<u8>,
    /// Minimum spacing between applied scroll samples. Default: 16.
    pub scroll_sample_interval_ms: Option<u64>,
    /// Let practice steps advance before their duration elapses. Default: true.
    #[serde(default = "default_true")]
    pub allow_early_step_advance: bool,
    /// Lifetime of transient notices. Default: 2500.
    pub notice_ttl_ms: Option<u64>,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            reveal_threshold_percent: None,
            scroll_sample_interval_ms: None,
            allow_early_step_advance: true,
            notice_ttl_ms: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    /// Catalog JSON file. `${VAR}` references are expanded.
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UiConfig {
    /// Use ASCII-only glyphs for markers and badges.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
}

impl CueConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Catalog path from `[catalog] path`, with environment references expanded.
    #[must_use]
    pub fn catalog_path(&self) -> Option<PathBuf> {
        let raw = self.catalog.as_ref()?.path.as_deref()?;
        let expanded = expand_env_vars(raw.trim());
        if expanded.is_empty() {
            None
        } else {
            Some(PathBuf::from(expanded))
        }
    }
}

/// Display options from `[ui]`, all off when absent.
#[must_use]
pub fn ui_options(config: Option<&CueConfig>) -> UiOptions {
    config
        .and_then(|cfg| cfg.ui.as_ref())
        .map(|ui| UiOptions {
            ascii_only: ui.ascii_only,
            high_contrast: ui.high_contrast,
        })
        .unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cue").join("config.toml"))
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Resolved engagement tuning, with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementSettings {
    pub reveal_threshold: u8,
    pub scroll_sample_interval: Duration,
    pub allow_early_step_advance: bool,
    pub notice_ttl: Duration,
}

impl Default for EngagementSettings {
    fn default() -> Self {
        Self {
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
            scroll_sample_interval: Duration::from_millis(DEFAULT_SCROLL_SAMPLE_INTERVAL_MS),
            allow_early_step_advance: true,
            notice_ttl: Duration::from_millis(DEFAULT_NOTICE_TTL_MS),
        }
    }
}

impl EngagementSettings {
    #[must_use]
    pub fn from_config(config: Option<&CueConfig>) -> Self {
        let defaults = Self::default();
        let Some(engagement) = config.and_then(|cfg| cfg.engagement.as_ref()) else {
            return defaults;
        };

        let reveal_threshold = match engagement.reveal_threshold_percent {
            Some(raw @ 1..=100) => raw,
            Some(raw) => {
                let clamped = raw.clamp(1, 100);
                tracing::warn!(
                    "reveal_threshold_percent {raw} out of range, using {clamped}"
                );
                clamped
            }
            None => defaults.reveal_threshold,
        };

        Self {
            reveal_threshold,
            scroll_sample_interval: engagement
                .scroll_sample_interval_ms
                .map_or(defaults.scroll_sample_interval, Duration::from_millis),
            allow_early_step_advance: engagement.allow_early_step_advance,
            notice_ttl: engagement
                .notice_ttl_ms
                .map_or(defaults.notice_ttl, Duration::from_millis),
        }
    }
}
