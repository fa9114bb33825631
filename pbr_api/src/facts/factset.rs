use std::collections::BTreeMap;

use anyhow::{Context, Result};

use super::{disk::Disk, lvm::LvmReport, misc::Misc, mount::Mount};

/// The four persisted document names making up a `FactSet`, in the order
/// `chk_bk_settings`/check-facts byte-compares them (§4.2, §6).
pub const FACT_FILES: [&str; 4] = ["disks", "lvm", "mnts", "misc"];

/// The complete serializable description of a system's storage (§3).
/// Probed in full at backup start, persisted, reloaded immutably at restore
/// start, and progressively transformed by the Fact Rewriter before being
/// consumed read-only by the Reconstructor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactSet {
    pub disks: BTreeMap<String, Disk>,
    pub lvm: LvmReport,
    pub mounts: BTreeMap<String, Mount>,
    pub misc: Misc,
}

/// The four on-disk JSON documents making up a persisted `FactSet`.
pub struct FactDocuments {
    pub disks: String,
    pub lvm: String,
    pub mnts: String,
    pub misc: String,
}

impl FactSet {
    /// Serializes to the four pretty-printed JSON documents described in
    /// §6. Used both to persist a fresh backup and, in check-facts mode, to
    /// render a scratch copy for byte-comparison against the reference.
    pub fn to_documents(&self) -> Result<FactDocuments> {
        Ok(FactDocuments {
            disks: serde_json::to_string_pretty(&self.disks)
                .context("failed to serialize disks.json")?,
            lvm: serde_json::to_string_pretty(&self.lvm).context("failed to serialize lvm.json")?,
            mnts: serde_json::to_string_pretty(&self.mounts)
                .context("failed to serialize mnts.json")?,
            misc: serde_json::to_string_pretty(&self.misc)
                .context("failed to serialize misc.json")?,
        })
    }

    pub fn from_documents(docs: &FactDocuments) -> Result<Self> {
        Ok(FactSet {
            disks: serde_json::from_str(&docs.disks).context("failed to parse disks.json")?,
            lvm: serde_json::from_str(&docs.lvm).context("failed to parse lvm.json")?,
            mounts: serde_json::from_str(&docs.mnts).context("failed to parse mnts.json")?,
            misc: serde_json::from_str(&docs.misc).context("failed to parse misc.json")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::facts::{
        device_type::DeviceType,
        partition::{PartitionFlagSet, PartitionKind, PartitionTableType},
    };

    fn sample() -> FactSet {
        let mut disks = BTreeMap::new();
        let mut partitions = BTreeMap::new();
        partitions.insert(
            1,
            super::super::partition::Partition {
                number: 1,
                start: 2048,
                end: 2099199,
                kind: PartitionKind::Normal,
                flags: PartitionFlagSet::empty(),
                name: None,
                fs_type: Some("ext4".into()),
                fs_uuid: Some(Uuid::nil().to_string()),
                fs_label: None,
            },
        );
        disks.insert(
            "/dev/sda".to_string(),
            Disk {
                id_serial: Some("S1".into()),
                id_wwn: None,
                id_path: None,
                size: 200000,
                partition_table_type: PartitionTableType::Msdos,
                partitions,
                leaf_fs: None,
            },
        );

        let mut mounts = BTreeMap::new();
        mounts.insert(
            "/boot".to_string(),
            Mount {
                path: "/boot".into(),
                kname: "/dev/sda1".into(),
                fs_type: Some("ext4".into()),
                fs_uuid: Some(Uuid::nil().to_string()),
                fs_label: None,
                kind: DeviceType::Part,
                vg: None,
                parent: Some("/dev/sda".into()),
                md_devname: None,
            },
        );

        FactSet {
            disks,
            lvm: LvmReport::default(),
            mounts,
            misc: Misc {
                arch: "x86_64".into(),
                hostname: "host1".into(),
                distro: "fedora".into(),
                distro_pretty: "Fedora Linux 40".into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn round_trips_through_json_documents() {
        let original = sample();
        let docs = original.to_documents().unwrap();
        let reparsed = FactSet::from_documents(&docs).unwrap();
        assert_eq!(original, reparsed);
    }
}
