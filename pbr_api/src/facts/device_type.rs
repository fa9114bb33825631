use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Classification of a block device, derived from its udev attributes.
///
/// `classify()` in the device-probe module (`probe::classify`) only ever
/// produces `Disk`, `Part`, `PartOnMpath`, `Mpath`, `PartRaid`, `MdArray`,
/// `Lvm`, or `Crypt` directly from a single device's attributes, exactly as
/// described by the dispatch rule below. `MdMember` and `Loop` are assigned
/// contextually: `MdMember` is applied by the fact collector to a partition
/// or disk once it has confirmed that device appears in some array's member
/// list, and `Loop` devices never reach classification because the probe's
/// enumeration filter rejects `/dev/loop*` outright.
///
/// Dispatch rule: if `DM_UUID` is present, its prefix selects `Lvm` (`LVM-`),
/// `Mpath` (`mpath-`), `PartOnMpath` (`part*-mpath-`), or `Crypt`
/// (`CRYPT-LUKS`). Otherwise, if `MD_LEVEL` is present, `PARTN` selects
/// between `PartRaid` and `MdArray`. Otherwise `DEVTYPE` selects `Disk` or
/// `Part`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeviceType {
    Disk,
    Part,
    PartOnMpath,
    Mpath,
    MdMember,
    MdArray,
    PartRaid,
    Lvm,
    Crypt,
    Loop,
}

impl DeviceType {
    /// Whether this kind can own a `Partition` map (§3's "disk" concept,
    /// which includes multipath targets).
    pub fn is_disk_like(self) -> bool {
        matches!(self, DeviceType::Disk | DeviceType::Mpath)
    }

    /// Whether this kind is partition-shaped, i.e. a leaf under a disk.
    pub fn is_partition_like(self) -> bool {
        matches!(
            self,
            DeviceType::Part | DeviceType::PartOnMpath | DeviceType::PartRaid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&DeviceType::PartOnMpath).unwrap();
        assert_eq!(json, "\"part-on-mpath\"");
        assert_eq!(
            serde_json::from_str::<DeviceType>(&json).unwrap(),
            DeviceType::PartOnMpath
        );
    }

    #[test]
    fn display_matches_serde_rename() {
        assert_eq!(DeviceType::MdArray.to_string(), "md-array");
    }
}
