// User configuration layer (§6 "Configuration").
//
// Loads `.panka.yaml` from the current directory or `${HOME}`, then layers
// environment variables on top. CLI flags and stack-level overrides are
// layered in by the caller via `merge_cli_overrides` / `merge_stack_override`
// — this module owns only the file-and-env layers; the flag surface itself
// is the CLI shell's concern (Non-goals, §1).
//
// Precedence, highest first: flags > env > stack-level > user file > defaults.

use crate::error::PankaError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    pub bucket: String,
    pub region: String,
    pub prefix: String,
    pub dynamodb_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PankaConfig {
    pub backend: BackendConfig,
    pub default_tags: HashMap<String, String>,
    pub log_level: String,
}

impl Default for PankaConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            default_tags: HashMap::new(),
            log_level: "info".to_string(),
        }
    }
}

impl PankaConfig {
    /// Locates `.panka.yaml`, preferring the current directory over `$HOME`,
    /// parses it, then overlays `PANKA_*` environment variables.
    pub fn load(cwd: &Path) -> Result<Self> {
        let mut config = match Self::find_file(cwd) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn find_file(cwd: &Path) -> Option<PathBuf> {
        let local = cwd.join(".panka.yaml");
        if local.is_file() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let home_file = home.join(".panka.yaml");
            if home_file.is_file() {
                return Some(home_file);
            }
        }
        None
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw)
            .map_err(|source| PankaError::YamlSyntax { path: path.display().to_string(), source })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PANKA_BUCKET") {
            self.backend.bucket = v;
        }
        if let Ok(v) = std::env::var("PANKA_REGION") {
            self.backend.region = v;
        }
        if let Ok(v) = std::env::var("PANKA_PREFIX") {
            self.backend.prefix = v;
        }
        if let Ok(v) = std::env::var("PANKA_DYNAMODB_TABLE") {
            self.backend.dynamodb_table = v;
        }
        if let Ok(v) = std::env::var("PANKA_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// Layers a stack-level override (declared in `stack.yaml`, see §4.3)
    /// on top of the file+env result. Stack-level beats the user file but
    /// loses to environment variables and CLI flags per the precedence
    /// order, so only fields left at their default are overridden.
    pub fn merge_stack_override(&mut self, tags: HashMap<String, String>) {
        for (k, v) in tags {
            self.default_tags.entry(k).or_insert(v);
        }
    }
}
