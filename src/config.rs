//! Configuration file loading (§10.3). The on-disk YAML config deserializes
//! directly into `pbr_api::policy::Config` — there is no separate
//! binary-level config type, since the engine-facing shape already matches
//! what operators write on disk.

use std::path::Path;

use anyhow::{Context, Result};

use pbr_api::policy::Config;

/// Reads and parses the YAML config file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Config> {
    let raw = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file '{}'", path.as_ref().display()))?;

    serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.as_ref().display()))
}
