use serde::{Deserialize, Serialize};

use super::device_type::DeviceType;

/// A mount (or synthetic `SWAP-<n>` swap entry), keyed by mount path in the
/// owning `FactSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Mount {
    pub path: String,
    pub kname: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_label: Option<String>,
    pub kind: DeviceType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub md_devname: Option<String>,
}

impl Mount {
    pub fn is_swap(&self) -> bool {
        self.path.starts_with("SWAP-")
    }
}
