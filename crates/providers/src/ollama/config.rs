use anyhow::{bail, Context};
use directories::BaseDirs;
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tracing::warn;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct OllamaFileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Model to select at startup if the server has it.
    pub model: Option<String>,
    /// Whole-request timeout. `None` leaves the HTTP client default (no timeout).
    pub timeout: Option<Duration>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: None,
            timeout: None,
        }
    }
}

impl OllamaConfig {
    /// Defaults, then the config file, then `OLLAMA_BASE_URL` / `OLLA_MODEL` /
    /// `OLLA_TIMEOUT_MS`.
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        let file_cfg = Self::config_path()
            .filter(|p| p.exists())
            .and_then(|p| match Self::load_file(&p) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(target: "providers::ollama", "ignoring config file: {:#}", e);
                    None
                }
            });
        Self::resolve(file_cfg, |k| env::var(k).ok())
    }

    pub fn load_file(path: &Path) -> anyhow::Result<OllamaFileConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse config file: {}", path.display()))
    }

    pub fn resolve(
        file_cfg: Option<OllamaFileConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut cfg = OllamaConfig::default();
        if let Some(f) = file_cfg {
            if let Some(u) = f.base_url {
                cfg.base_url = u;
            }
            if f.model.is_some() {
                cfg.model = f.model;
            }
            if let Some(t) = f.timeout_ms {
                cfg.timeout = Some(Duration::from_millis(t));
            }
        }
        if let Some(u) = env("OLLAMA_BASE_URL") {
            cfg.base_url = u;
        }
        if let Some(m) = env("OLLA_MODEL") {
            cfg.model = Some(m);
        }
        if let Some(t) = env("OLLA_TIMEOUT_MS") {
            let ms: u64 = t
                .trim()
                .parse()
                .with_context(|| format!("OLLA_TIMEOUT_MS is not a number: {t}"))?;
            cfg.timeout = Some(Duration::from_millis(ms));
        }
        cfg.base_url = normalize_base_url(&cfg.base_url)?;
        Ok(cfg)
    }

    /// Apply command-line overrides on top of the resolved values.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        model: Option<String>,
    ) -> anyhow::Result<Self> {
        if let Some(u) = base_url {
            self.base_url = normalize_base_url(&u)?;
        }
        if model.is_some() {
            self.model = model;
        }
        Ok(self)
    }

    pub fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".olla").join("config.toml")
        } else {
            base.config_dir().join("olla").join("config.toml")
        };
        Some(p)
    }
}

fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).with_context(|| format!("invalid base URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("base URL must use http or https: {raw}");
    }
    Ok(trimmed.to_string())
}
