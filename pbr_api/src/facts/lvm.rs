use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::device_type::DeviceType;

/// An LVM physical volume report row, enriched per §4.2 with the classified
/// device type, MD-backed flag, and parent block device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Pv {
    pub pv_name: String,
    pub pv_uuid: Uuid,
    pub vg_name: String,
    pub pv_size: u64,
    pub d_type: DeviceType,
    /// True when the backing node is an MD array; `pv_name` has already
    /// been rewritten to the stable `/dev/md/<name>` form in that case.
    pub md_dev: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,
}

/// An LVM volume group report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Vg {
    pub name: String,
    pub pv_count: u32,
    pub lv_count: u32,
}

/// An LVM logical volume report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Lv {
    pub vg_name: String,
    pub lv_name: String,
    pub lv_size: u64,
}

/// The LVM report: `pvs`/`vgs`/`lvs --reportformat json` output, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct LvmReport {
    #[serde(rename = "PVS", default)]
    pub pvs: Vec<Pv>,
    #[serde(rename = "VGS", default)]
    pub vgs: Vec<Vg>,
    #[serde(rename = "LVS", default)]
    pub lvs: Vec<Lv>,
}

impl LvmReport {
    /// Invariant from §3: every LV references a Vg present in the report;
    /// every Vg has at least one Pv.
    pub fn is_well_formed(&self) -> bool {
        let vg_names: std::collections::HashSet<&str> =
            self.vgs.iter().map(|vg| vg.name.as_str()).collect();
        if !self.lvs.iter().all(|lv| vg_names.contains(lv.vg_name.as_str())) {
            return false;
        }
        self.vgs.iter().all(|vg| {
            self.pvs
                .iter()
                .any(|pv| pv.vg_name == vg.name)
        })
    }

    /// `(lv_name, lv_size)` tuples for a VG, used by the Layout Comparator
    /// and Stage 4 of the Reconstructor to decide whether a VG needs
    /// restoring (§4.4/§4.7).
    pub fn lv_tuples(&self, vg_name: &str) -> Vec<(String, u64)> {
        self.lvs
            .iter()
            .filter(|lv| lv.vg_name == vg_name)
            .map(|lv| (lv.lv_name.clone(), lv.lv_size))
            .collect()
    }

    pub fn pvs_for_vg(&self, vg_name: &str) -> Vec<&Pv> {
        self.pvs.iter().filter(|pv| pv.vg_name == vg_name).collect()
    }
}
