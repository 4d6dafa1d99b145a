use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::{file_selection::MAX_FILE_BYTES, visualization::VisualizationTimings};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000/";
pub const DEFAULT_CONFIG_FILE: &str = "client.toml";
pub const RSA_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Per-character reveal pace of the visualization.
    pub typing_pace: Duration,
    pub elapsed_tick: Duration,
    pub progress_tick: Duration,
    pub progress_hide_after: Duration,
    pub toast_visible_for: Duration,
    pub auth_toast_visible_for: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            typing_pace: Duration::from_millis(20),
            elapsed_tick: Duration::from_millis(100),
            progress_tick: Duration::from_millis(300),
            progress_hide_after: Duration::from_millis(1000),
            toast_visible_for: Duration::from_millis(4000),
            auth_toast_visible_for: Duration::from_millis(3000),
        }
    }
}

impl Timings {
    pub fn visualization(&self) -> VisualizationTimings {
        VisualizationTimings {
            char_pace: self.typing_pace,
            elapsed_tick: self.elapsed_tick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub max_file_bytes: u64,
    pub rsa_max_chars: usize,
    /// Fixes the progress and illustrative-IV randomness when set.
    pub rng_seed: Option<u64>,
    pub timings: Timings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            max_file_bytes: MAX_FILE_BYTES,
            rsa_max_chars: RSA_MAX_CHARS,
            rng_seed: None,
            timings: Timings::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    max_file_bytes: Option<u64>,
    rsa_max_chars: Option<usize>,
    rng_seed: Option<u64>,
    typing_pace_ms: Option<u64>,
    progress_tick_ms: Option<u64>,
}

impl ClientConfig {
    /// Defaults, then `path` when it exists, then `APP__*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();

        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            config = Self::from_toml_str(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let file: FileConfig = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(v) = file.server_url {
            config.server_url = v;
        }
        if let Some(v) = file.max_file_bytes {
            config.max_file_bytes = v;
        }
        if let Some(v) = file.rsa_max_chars {
            config.rsa_max_chars = v;
        }
        if let Some(v) = file.typing_pace_ms {
            config.timings.typing_pace = Duration::from_millis(v);
        }
        if let Some(v) = file.progress_tick_ms {
            config.timings.progress_tick = Duration::from_millis(v);
        }
        config.rng_seed = file.rng_seed;
        Ok(config)
    }

    /// Unparseable numeric values are ignored and leave the current setting.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CIPHERVIZ_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = v;
        }

        if let Some(v) = parsed::<u64>(&lookup, "APP__MAX_FILE_BYTES") {
            self.max_file_bytes = v;
        }
        if let Some(v) = parsed::<usize>(&lookup, "APP__RSA_MAX_CHARS") {
            self.rsa_max_chars = v;
        }
        if let Some(v) = parsed::<u64>(&lookup, "APP__TYPING_PACE_MS") {
            self.timings.typing_pace = Duration::from_millis(v);
        }
        if let Some(v) = parsed::<u64>(&lookup, "APP__PROGRESS_TICK_MS") {
            self.timings.progress_tick = Duration::from_millis(v);
        }
        if let Some(v) = parsed::<u64>(&lookup, "APP__RNG_SEED") {
            self.rng_seed = Some(v);
        }
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}

/// Loads `client.toml` from the working directory plus the environment.
pub fn load_config() -> anyhow::Result<ClientConfig> {
    ClientConfig::load(DEFAULT_CONFIG_FILE)
}
