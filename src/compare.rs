//! Layout comparison (C6, §4.6).
//!
//! Decides, per disk, whether the live partition table already matches what
//! was captured closely enough to skip repartitioning. Start-sector
//! equality stands in for "table is already correct": size mismatches are
//! already ruled out by the Disk Matcher (C4), and end-sector follows from
//! start for an unchanged filesystem.

use pbr_api::facts::disk::Disk;

/// Returns `true` when `live` must be repartitioned to match `captured`.
pub fn needs_repartition(captured: &Disk, live: &Disk) -> bool {
    if captured.partitions.is_empty() {
        return match (&captured.leaf_fs, &live.leaf_fs) {
            (Some(captured_fs), Some(live_fs)) => captured_fs.fs_type != live_fs.fs_type,
            (None, _) => false,
            (Some(_), None) => true,
        };
    }

    for (number, captured_partition) in &captured.partitions {
        match live.partitions.get(number) {
            Some(live_partition) if live_partition.start == captured_partition.start => {}
            _ => return true,
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pbr_api::facts::{
        disk::LeafFilesystem,
        partition::{Partition, PartitionFlagSet, PartitionKind, PartitionTableType},
    };

    use super::*;

    fn disk(partitions: BTreeMap<u32, Partition>) -> Disk {
        Disk {
            id_serial: None,
            id_wwn: None,
            id_path: None,
            size: 1000,
            partition_table_type: PartitionTableType::Gpt,
            partitions,
            leaf_fs: None,
        }
    }

    fn partition(number: u32, start: u64) -> Partition {
        Partition {
            number,
            start,
            end: start + 100,
            kind: PartitionKind::Normal,
            flags: PartitionFlagSet::empty(),
            name: None,
            fs_type: None,
            fs_uuid: None,
            fs_label: None,
        }
    }

    #[test]
    fn identical_start_sectors_need_no_repartition() {
        let mut parts = BTreeMap::new();
        parts.insert(1, partition(1, 2048));
        let captured = disk(parts.clone());
        let live = disk(parts);
        assert!(!needs_repartition(&captured, &live));
    }

    #[test]
    fn shifted_start_sector_forces_repartition() {
        let mut captured_parts = BTreeMap::new();
        captured_parts.insert(1, partition(1, 2048));
        let mut live_parts = BTreeMap::new();
        live_parts.insert(1, partition(1, 4096));

        assert!(needs_repartition(&disk(captured_parts), &disk(live_parts)));
    }

    #[test]
    fn missing_partition_forces_repartition() {
        let mut captured_parts = BTreeMap::new();
        captured_parts.insert(1, partition(1, 2048));
        captured_parts.insert(2, partition(2, 4096));
        let mut live_parts = BTreeMap::new();
        live_parts.insert(1, partition(1, 2048));

        assert!(needs_repartition(&disk(captured_parts), &disk(live_parts)));
    }

    #[test]
    fn leafless_disks_match_on_compatible_filesystem() {
        let mut captured = disk(BTreeMap::new());
        captured.leaf_fs = Some(LeafFilesystem {
            fs_type: Some("ext4".to_string()),
            fs_uuid: None,
            fs_label: None,
        });
        let mut live = disk(BTreeMap::new());
        live.leaf_fs = Some(LeafFilesystem {
            fs_type: Some("ext4".to_string()),
            fs_uuid: None,
            fs_label: None,
        });
        assert!(!needs_repartition(&captured, &live));

        live.leaf_fs.as_mut().unwrap().fs_type = Some("xfs".to_string());
        assert!(needs_repartition(&captured, &live));
    }

    #[test]
    fn monotonicity_extra_live_partitions_do_not_force_repartition() {
        let mut captured_parts = BTreeMap::new();
        captured_parts.insert(1, partition(1, 2048));
        let mut live_parts = BTreeMap::new();
        live_parts.insert(1, partition(1, 2048));
        live_parts.insert(2, partition(2, 4096));

        assert!(!needs_repartition(&disk(captured_parts), &disk(live_parts)));
    }
}
