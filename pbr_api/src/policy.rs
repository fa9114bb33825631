use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the backup archive is stored; determines whether the Orchestrator
/// needs to mount anything before the restore flow can read facts (§4.8).
/// Non-core concerns (archive transport itself) are out of scope (§1); only
/// enough shape survives here to drive the mount-or-not decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupLocationType {
    Rsync,
    Iso,
    Usb,
    Cifs,
    Nfs,
}

/// Engine-facing configuration (§10.3): exclusion policy plus the handful
/// of location facts the Orchestrator needs. Parsed by the binary's
/// `config` module from a YAML file and passed in already-parsed — the
/// engine itself never reads files or environment variables for policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub bk_location_type: Option<BackupLocationType>,
    #[serde(default)]
    pub bk_mount: Option<PathBuf>,
    #[serde(default)]
    pub bk_mount_opts: Vec<String>,
    #[serde(default)]
    pub bk_exclude_paths: Vec<PathBuf>,
    #[serde(default)]
    pub bk_exclude_vgs: Vec<String>,
    #[serde(default)]
    pub bk_exclude_disks: Vec<String>,
    #[serde(default)]
    pub rc_exclude_disks: Vec<String>,
    #[serde(default)]
    pub rc_exclude_vgs: Vec<String>,
    #[serde(default)]
    pub bk_archive_prefix: Option<String>,
    /// Overrides the default staging root (`/mnt/rootfs`, see GLOSSARY).
    #[serde(default)]
    pub staging_root: Option<PathBuf>,
}

impl Config {
    pub fn staging_root(&self) -> PathBuf {
        self.staging_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("/mnt/rootfs"))
    }
}
