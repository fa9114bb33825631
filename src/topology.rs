//! Topology filtering (C3, §4.3).
//!
//! Narrows a freshly collected `FactSet` down to what the backup policy
//! actually wants archived: volume groups are resolved first (an excluded
//! VG, or one rooted entirely on excluded disks, drops out), then disks are
//! pruned down to only those still referenced by a surviving mount, MD
//! member, or PV. Order matters — pruning disks before resolving VGs would
//! strand PVs that still needed their disk.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use pbr_api::facts::factset::FactSet;
use pbr_api::policy::Config;

/// Applies the backup policy's exclusion lists to a collected `FactSet`,
/// returning the subset that should be archived.
pub fn filter(facts: &FactSet, config: &Config) -> FactSet {
    let mut out = facts.clone();

    let excluded_disks: HashSet<&str> = config.bk_exclude_disks.iter().map(String::as_str).collect();

    // Path exclusion happens before VG/disk resolution so a mount dropped
    // for being under an excluded path (e.g. the scratch-directory
    // mountpoint, §4.8) can still strand its VG or disk the same way an
    // explicitly excluded one would.
    out.mounts.retain(|_, mount| !under_excluded_path(Path::new(&mount.path), &config.bk_exclude_paths));

    let surviving_vgs = resolve_surviving_vgs(&out, config, &excluded_disks);

    out.lvm.vgs.retain(|vg| surviving_vgs.contains(vg.name.as_str()));
    out.lvm.pvs.retain(|pv| surviving_vgs.contains(pv.vg_name.as_str()));
    out.lvm.lvs.retain(|lv| surviving_vgs.contains(lv.vg_name.as_str()));

    let referenced_disks = referenced_disks(&out);
    out.disks.retain(|path, _| {
        !excluded_disks.contains(path.as_str()) && referenced_disks.contains(path.as_str())
    });

    out.mounts.retain(|_, mount| {
        mount
            .vg
            .as_deref()
            .map(|vg| surviving_vgs.contains(vg))
            .unwrap_or(true)
            && mount
                .parent
                .as_deref()
                .map(|parent| !excluded_disks.contains(parent))
                .unwrap_or(true)
    });

    out.misc.bk_vgs = surviving_vgs.into_iter().map(str::to_string).collect::<BTreeSet<_>>().into_iter().collect();

    out
}

/// True when `path` is, or falls under, one of the configured exclusion
/// roots.
fn under_excluded_path(path: &Path, excluded: &[std::path::PathBuf]) -> bool {
    excluded.iter().any(|root| path.starts_with(root))
}

/// VG determination (§4.3): starting from every root mount (kind `lvm` or
/// `crypt`, no parent) whose VG is named, a VG survives unless it is named
/// directly in `bk_exclude_vgs`, or any of its PVs is rooted on (or, for a
/// raw-disk PV, itself is) an excluded disk. Returned in discovery order
/// with duplicates removed, as a `BTreeSet` for deterministic iteration.
fn resolve_surviving_vgs<'a>(
    facts: &'a FactSet,
    config: &Config,
    excluded_disks: &HashSet<&str>,
) -> BTreeSet<&'a str> {
    use pbr_api::facts::device_type::DeviceType;

    let excluded_vgs: HashSet<&str> = config.bk_exclude_vgs.iter().map(String::as_str).collect();

    facts
        .mounts
        .values()
        .filter(|mount| {
            matches!(mount.kind, DeviceType::Lvm | DeviceType::Crypt) && mount.parent.is_none()
        })
        .filter_map(|mount| mount.vg.as_deref())
        .filter(|vg_name| !excluded_vgs.contains(vg_name))
        .filter(|vg_name| {
            let pvs = facts.lvm.pvs_for_vg(vg_name);
            pvs.iter().all(|pv| {
                let root_disk = pv.parent.as_deref().unwrap_or(pv.pv_name.as_str());
                !excluded_disks.contains(root_disk)
            })
        })
        .collect()
}

/// Disks still referenced by a surviving mount, MD member, or PV after VG
/// resolution (§4.3: disk pruning happens after VG resolution).
fn referenced_disks(facts: &FactSet) -> HashSet<&str> {
    let mut referenced = HashSet::new();

    for mount in facts.mounts.values() {
        if let Some(parent) = &mount.parent {
            referenced.insert(parent.as_str());
        } else {
            referenced.insert(mount.kname.as_str());
        }
    }

    for array in facts.misc.md_info.values() {
        for member in &array.member_kernel_names {
            referenced.insert(member.as_str());
        }
    }

    for pv in &facts.lvm.pvs {
        let root_disk = pv.parent.as_deref().unwrap_or(pv.pv_name.as_str());
        referenced.insert(root_disk);
    }

    referenced
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pbr_api::facts::{
        device_type::DeviceType,
        disk::Disk,
        lvm::{Lv, LvmReport, Pv, Vg},
        mount::Mount,
        partition::PartitionTableType,
    };
    use uuid::Uuid;

    use super::*;

    fn disk(size: u64) -> Disk {
        Disk {
            id_serial: None,
            id_wwn: None,
            id_path: None,
            size,
            partition_table_type: PartitionTableType::None,
            partitions: BTreeMap::new(),
            leaf_fs: None,
        }
    }

    fn base_facts() -> FactSet {
        let mut disks = BTreeMap::new();
        disks.insert("/dev/sda".to_string(), disk(1000));
        disks.insert("/dev/sdb".to_string(), disk(1000));

        let mut mounts = BTreeMap::new();
        mounts.insert(
            "/boot".to_string(),
            Mount {
                path: "/boot".into(),
                kname: "/dev/sda1".into(),
                fs_type: Some("ext4".into()),
                fs_uuid: None,
                fs_label: None,
                kind: DeviceType::Part,
                vg: None,
                parent: Some("/dev/sda".into()),
                md_devname: None,
            },
        );
        mounts.insert(
            "/".to_string(),
            Mount {
                path: "/".into(),
                kname: "/dev/vg0/lv0".into(),
                fs_type: Some("ext4".into()),
                fs_uuid: None,
                fs_label: None,
                kind: DeviceType::Lvm,
                vg: Some("vg0".into()),
                parent: None,
                md_devname: None,
            },
        );

        FactSet {
            disks,
            lvm: LvmReport {
                pvs: vec![Pv {
                    pv_name: "/dev/sdb".into(),
                    pv_uuid: Uuid::nil(),
                    vg_name: "vg0".into(),
                    pv_size: 500,
                    d_type: DeviceType::Disk,
                    md_dev: false,
                    parent: None,
                }],
                vgs: vec![Vg {
                    name: "vg0".into(),
                    pv_count: 1,
                    lv_count: 1,
                }],
                lvs: vec![Lv {
                    vg_name: "vg0".into(),
                    lv_name: "lv0".into(),
                    lv_size: 100,
                }],
            },
            mounts,
            misc: Default::default(),
        }
    }

    #[test]
    fn keeps_everything_when_nothing_is_excluded() {
        let facts = base_facts();
        let filtered = filter(&facts, &Config::default());
        assert_eq!(filtered.disks.len(), 2);
        assert_eq!(filtered.lvm.vgs.len(), 1);
    }

    #[test]
    fn excluding_a_vg_drops_its_disk_and_mounts() {
        let facts = base_facts();
        let config = Config {
            bk_exclude_vgs: vec!["vg0".to_string()],
            ..Default::default()
        };
        let filtered = filter(&facts, &config);
        assert!(filtered.lvm.vgs.is_empty());
        assert!(filtered.lvm.pvs.is_empty());
        assert!(!filtered.disks.contains_key("/dev/sdb"));
        assert!(filtered.disks.contains_key("/dev/sda"));
    }

    #[test]
    fn excluding_a_disk_drops_the_vg_rooted_on_it() {
        let facts = base_facts();
        let config = Config {
            bk_exclude_disks: vec!["/dev/sdb".to_string()],
            ..Default::default()
        };
        let filtered = filter(&facts, &config);
        assert!(filtered.lvm.vgs.is_empty());
        assert!(!filtered.disks.contains_key("/dev/sdb"));
    }

    #[test]
    fn excluding_a_path_drops_its_mount_and_stranded_vg() {
        let mut facts = base_facts();
        let mut root_mount = facts.mounts.remove("/").unwrap();
        root_mount.path = "/mnt/scratch-1234/rootfs".to_string();
        facts.mounts.insert(root_mount.path.clone(), root_mount);

        let config = Config {
            bk_exclude_paths: vec!["/mnt/scratch-1234".into()],
            ..Default::default()
        };
        let filtered = filter(&facts, &config);
        assert!(!filtered.mounts.contains_key("/mnt/scratch-1234/rootfs"));
        assert!(filtered.mounts.contains_key("/boot"));
        assert!(filtered.lvm.vgs.is_empty());
        assert!(!filtered.disks.contains_key("/dev/sdb"));
    }
}
