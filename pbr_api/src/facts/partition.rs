use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Partition table types recognized on a `Disk`.
///
/// `Loop` and `None` both describe a disk with no addressable partition map:
/// `Loop` is a disk carrying the `loop` pseudo-label parted reports for
/// loop-backed devices, `None` is a disk with no recognizable table at all.
/// Both are treated as leaf disks carrying a single filesystem record per
/// the design notes (§9).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PartitionTableType {
    Msdos,
    Gpt,
    Loop,
    #[default]
    None,
}

/// A partition's role within an (extended) msdos table, or `Normal` for a
/// GPT partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PartitionKind {
    Normal,
    Logical,
    Extended,
}

/// Flags carried on a partition entry. Subset of the flags the partition
/// editor understands; semantics must round-trip through re-creation (§3).
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionFlag {
    Boot,
    Lvm,
    Swap,
    Raid,
    BiosGrub,
    Esp,
    Prep,
}

pub type PartitionFlagSet = BitFlags<PartitionFlag>;

/// A single partition entry, keyed by its 1-based number inside its owning
/// `Disk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub struct Partition {
    pub number: u32,
    pub start: u64,
    pub end: u64,
    #[serde(rename = "type")]
    pub kind: PartitionKind,
    pub flags: PartitionFlagSet,
    /// GPT-only partition name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_label: Option<String>,
}

impl Partition {
    /// Invariant from §3: `start < end`.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_requires_start_before_end() {
        let mut p = Partition {
            number: 1,
            start: 2048,
            end: 100,
            kind: PartitionKind::Normal,
            flags: PartitionFlagSet::empty(),
            name: None,
            fs_type: None,
            fs_uuid: None,
            fs_label: None,
        };
        assert!(!p.is_well_formed());
        p.end = 4096;
        assert!(p.is_well_formed());
    }

    #[test]
    fn flag_set_serializes_as_array() {
        let flags = PartitionFlag::Boot | PartitionFlag::Lvm;
        let json = serde_json::to_string(&flags).unwrap();
        let parsed: PartitionFlagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flags);
    }
}
