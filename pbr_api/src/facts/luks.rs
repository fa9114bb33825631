use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// What a LUKS container sits directly on top of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LuksBackingKind {
    Part,
    Lvm,
}

/// A LUKS container, keyed by its backing path (the partition or LV it sits
/// on) in the owning `FactSet`. The corresponding header-backup blob lives
/// alongside the facts as `luks/<basename>.backup` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LuksContainer {
    pub uuid: Uuid,
    pub version: u32,
    pub backing_kind: LuksBackingKind,
}

impl LuksContainer {
    /// Name of the mapper device this container opens to, matching Stage 3/5
    /// of the reconstructor (§4.7): `luks-<uuid>`.
    pub fn mapper_name(&self) -> String {
        format!("luks-{}", self.uuid)
    }

    /// Sidecar filename for the header backup, e.g. `sdb1.backup`.
    pub fn backup_filename(basename: &str) -> String {
        format!("{basename}.backup")
    }
}
