//! # Configuration
//!
//! Resolves the issuing authority and the state directory.
//!
//! ## Precedence
//!
//! 1. Command-line flags (`--authority`, `--state-dir`).
//! 2. Environment (`CRYPTONIA_AUTHORITY`, `CRYPTONIA_STATE_DIR`).
//! 3. The YAML config file (`--config`, else `./cryptonia.yaml` if present).
//!
//! ```yaml
//! authority: "0x5df89f7727e663842b5f4582776BAfb62686955c"
//! state_dir: ".cryptonia"
//! ```
//!
//! The authority is mandatory. It is fixed for the lifetime of the process.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cryptonia_core::Identity;
use cryptonia_state::AuthorityConfig;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "cryptonia.yaml";

/// State directory used when nothing else names one.
pub const DEFAULT_STATE_DIR: &str = ".cryptonia";

/// Environment variable overriding the authority.
pub const ENV_AUTHORITY: &str = "CRYPTONIA_AUTHORITY";

/// Environment variable overriding the state directory.
pub const ENV_STATE_DIR: &str = "CRYPTONIA_STATE_DIR";

/// Contents of the YAML config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Issuing authority identity.
    pub authority: Option<String>,
    /// Directory holding the registry snapshot and audit log.
    pub state_dir: Option<PathBuf>,
}

/// One configuration layer (flags or environment).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Authority override.
    pub authority: Option<String>,
    /// State directory override.
    pub state_dir: Option<PathBuf>,
}

impl Overrides {
    /// Read the `CRYPTONIA_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            authority: std::env::var(ENV_AUTHORITY).ok().filter(|v| !v.is_empty()),
            state_dir: std::env::var_os(ENV_STATE_DIR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Fully resolved CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// The issuing authority.
    pub authority: Identity,
    /// Directory holding persisted state.
    pub state_dir: PathBuf,
}

impl CliConfig {
    /// Load the file layer, read the environment, and resolve.
    pub fn load(config_path: Option<&Path>, flags: Overrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => read_file_config(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    read_file_config(default)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::resolve(file, Overrides::from_env(), flags)
    }

    /// Merge layers: `flags` over `env` over `file`.
    pub fn resolve(file: FileConfig, env: Overrides, flags: Overrides) -> Result<Self> {
        let authority = flags
            .authority
            .or(env.authority)
            .or(file.authority)
            .with_context(|| {
                format!(
                    "no issuing authority configured: pass --authority, set {ENV_AUTHORITY}, or add `authority` to {DEFAULT_CONFIG_FILE}"
                )
            })?;
        let authority = Identity::new(authority).context("invalid authority identity")?;
        let state_dir = flags
            .state_dir
            .or(env.state_dir)
            .or(file.state_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
        Ok(Self {
            authority,
            state_dir,
        })
    }

    /// The authority configuration handed to the lifecycle service.
    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig {
            authority: self.authority.clone(),
        }
    }
}

/// Parse a YAML config file.
pub fn read_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
