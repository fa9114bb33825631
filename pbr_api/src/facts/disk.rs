use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::partition::{Partition, PartitionTableType};

/// A filesystem record directly on a disk with no partition table — the
/// `loop`/`none` table-type leaf case from the design notes (§9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LeafFilesystem {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fs_label: Option<String>,
}

/// A top-level disk, keyed by its canonical path in the owning `FactSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Disk {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id_serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id_wwn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id_path: Option<String>,
    /// Size in logical sectors.
    pub size: u64,
    #[serde(rename = "type")]
    pub partition_table_type: PartitionTableType,
    /// Ordered by partition number; serialized with numeric-string keys to
    /// match the `disks.json` shape described in §6.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partitions: BTreeMap<u32, Partition>,
    /// Populated only when `partition_table_type` is `Loop` or `None`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub leaf_fs: Option<LeafFilesystem>,
}

impl Disk {
    /// Invariant from §3: a disk with a non-empty partition map has a known
    /// table type.
    pub fn is_well_formed(&self) -> bool {
        if self.partitions.is_empty() {
            true
        } else {
            !matches!(self.partition_table_type, PartitionTableType::None)
        }
    }

    pub fn is_multipath(&self) -> bool {
        // Multipath disks are keyed by /dev/mapper/<name> in the FactSet;
        // the canonical path itself carries this information at the
        // FactSet::disks map level, so this helper exists for call sites
        // that only have a borrowed path string handy.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::partition::{PartitionFlagSet, PartitionKind};

    #[test]
    fn empty_partitions_always_well_formed() {
        let d = Disk {
            size: 100,
            partition_table_type: PartitionTableType::None,
            ..Default::default()
        };
        assert!(d.is_well_formed());
    }

    #[test]
    fn nonempty_partitions_require_known_table() {
        let mut d = Disk {
            size: 100,
            partition_table_type: PartitionTableType::None,
            ..Default::default()
        };
        d.partitions.insert(
            1,
            Partition {
                number: 1,
                start: 1,
                end: 2,
                kind: PartitionKind::Normal,
                flags: PartitionFlagSet::empty(),
                name: None,
                fs_type: None,
                fs_uuid: None,
                fs_label: None,
            },
        );
        assert!(!d.is_well_formed());
        d.partition_table_type = PartitionTableType::Gpt;
        assert!(d.is_well_formed());
    }
}
