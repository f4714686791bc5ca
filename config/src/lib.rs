//! `~/.hunkrank/config.toml` loading.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hunkrank_diff::Options;
use hunkrank_lsp::{Language, LanguageRegistry};
use serde::Deserialize;

/// Overrides the config file location when set to a non-empty path.
pub const CONFIG_ENV: &str = "HUNKRANK_CONFIG";

const fn default_true() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
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
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HunkrankConfig {
    pub prioritize: Option<PrioritizeConfig>,
    pub lsp: Option<LspConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PrioritizeConfig {
    pub max_high_priority_lines: Option<usize>,
    pub include_summary: Option<bool>,
    pub lsp_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LspConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Consulted before the builtin table. `command` and `args` may use `${VAR}`.
    #[serde(default)]
    pub servers: Vec<Language>,
}

impl Default for LspConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            servers: Vec::new(),
        }
    }
}

/// Replace `${VAR}` with the variable's value; unset variables become empty.
/// An unterminated `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl HunkrankConfig {
    /// Load from [`config_path`]. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load an explicit file. A missing file is a [`ConfigError::Read`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
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

    /// Configured values layered over [`Options::default`].
    #[must_use]
    pub fn options(&self, work_dir: Option<PathBuf>) -> Options {
        let mut options = Options {
            work_dir,
            ..Options::default()
        };
        if let Some(prioritize) = &self.prioritize {
            if let Some(lines) = prioritize.max_high_priority_lines {
                options.max_high_priority_lines = lines;
            }
            if let Some(include) = prioritize.include_summary {
                options.include_summary = include;
            }
            if let Some(ms) = prioritize.lsp_timeout_ms {
                options.lsp_timeout = Duration::from_millis(ms);
            }
        }
        options
    }

    #[must_use]
    pub fn lsp_enabled(&self) -> bool {
        self.lsp.as_ref().is_none_or(|lsp| lsp.enabled)
    }

    /// User servers ahead of the builtin table, or nothing when LSP is off.
    #[must_use]
    pub fn registry(&self) -> LanguageRegistry {
        if !self.lsp_enabled() {
            return LanguageRegistry::empty();
        }
        let servers = self.lsp.iter().flat_map(|lsp| &lsp.servers).map(|server| Language {
            command: expand_env_vars(&server.command),
            args: server.args.iter().map(|arg| expand_env_vars(arg)).collect(),
            ..server.clone()
        });
        LanguageRegistry::with_overrides(servers)
    }
}

/// `$HUNKRANK_CONFIG` if set, else `~/.hunkrank/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(env::var_os(CONFIG_ENV), dirs::home_dir())
}

fn resolve_config_path(from_env: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match from_env {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => home.map(|home| home.join(".hunkrank").join("config.toml")),
    }
}
