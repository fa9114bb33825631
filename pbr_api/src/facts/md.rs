use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A software-RAID array, keyed by its stable name (`md_devname` from udev,
/// falling back to the kernel device name, e.g. `md0`) in the owning
/// `FactSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MdArray {
    /// Sorted ascending by kernel name (§3 invariant).
    pub member_kernel_names: Vec<String>,
    pub raid_level: String,
    pub metadata_version: String,
    pub uuid: Uuid,
}

impl MdArray {
    pub fn is_well_formed(&self) -> bool {
        self.member_kernel_names
            .windows(2)
            .all(|pair| pair[0] <= pair[1])
    }

    pub fn sort_members(&mut self) {
        self.member_kernel_names.sort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_unsorted_members() {
        let md = MdArray {
            member_kernel_names: vec!["sdb1".into(), "sda1".into()],
            raid_level: "raid1".into(),
            metadata_version: "1.2".into(),
            uuid: Uuid::nil(),
        };
        assert!(!md.is_well_formed());
    }
}
