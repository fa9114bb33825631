//! Reconstruction (C7, §4.7).
//!
//! Executes the destructive rebuild of a captured storage topology onto the
//! matched, rewritten live hardware, in seven strict stages. Failure at any
//! stage is fatal and bubbles straight to the Orchestrator (§7) — there is
//! no local rollback.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use log::{info, warn};
use uuid::Uuid;

use osutils::{
    block_devices, cryptsetup, findmnt, lvm as os_lvm, mdadm, mkfs, mkswap, mount as os_mount,
    sfdisk, udevadm, wipefs,
};
use pbr_api::facts::{
    disk::Disk,
    factset::FactSet,
    luks::{LuksBackingKind, LuksContainer},
    partition::{Partition, PartitionFlag, PartitionTableType},
};

use crate::compare::needs_repartition;

/// Injectable source for LUKS unlock passphrases (§4.7 Stages 3 and 5).
/// Production reads from the environment; tests supply a fixed passphrase.
pub trait LuksKeySource {
    fn passphrase(&self, container: &LuksContainer) -> Result<String>;
}

/// Reads `PBR_LUKS_PASSPHRASE` from the environment for every container.
/// There is exactly one passphrase per restore run: the tool targets a
/// single operator-supplied recovery passphrase, not per-volume secrets.
pub struct EnvLuksKeySource;

impl LuksKeySource for EnvLuksKeySource {
    fn passphrase(&self, container: &LuksContainer) -> Result<String> {
        std::env::var("PBR_LUKS_PASSPHRASE").with_context(|| {
            format!(
                "PBR_LUKS_PASSPHRASE is not set; cannot unlock LUKS container '{}'",
                container.mapper_name()
            )
        })
    }
}

/// Deterministic test double returning a fixed passphrase.
pub struct FixedLuksKeySource(pub String);

impl LuksKeySource for FixedLuksKeySource {
    fn passphrase(&self, _container: &LuksContainer) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// GPT partition type GUIDs for the flags the fact model can carry (§9's
/// bespoke mapping — `osutils::partition_types::DiscoverablePartitionType`
/// doesn't cover msdos two-digit codes, so this table lives here instead).
fn gpt_type_guid(flags: pbr_api::facts::partition::PartitionFlagSet) -> &'static str {
    if flags.contains(PartitionFlag::Esp) {
        "c12a7328-f81f-11d2-ba4b-00a0c93ec93b"
    } else if flags.contains(PartitionFlag::BiosGrub) {
        "21686148-6449-6e6f-744e-656564454649"
    } else if flags.contains(PartitionFlag::Swap) {
        "0657fd6d-a4ab-43c4-84e5-0933c84b4f4f"
    } else if flags.contains(PartitionFlag::Lvm) {
        "e6d6d379-f507-44c2-a23c-238f2a3df928"
    } else if flags.contains(PartitionFlag::Raid) {
        "a19d880f-05fc-4d3b-a006-743f0f84911e"
    } else if flags.contains(PartitionFlag::Prep) {
        "9e1a2d38-c612-4316-aa26-8b49521e5a8b"
    } else {
        "0fc63daf-8483-4772-8e79-3d69d8477de4"
    }
}

/// msdos two-digit hex partition type codes for the same flag set.
fn msdos_type_code(flags: pbr_api::facts::partition::PartitionFlagSet) -> &'static str {
    if flags.contains(PartitionFlag::Esp) {
        "ef"
    } else if flags.contains(PartitionFlag::Swap) {
        "82"
    } else if flags.contains(PartitionFlag::Lvm) {
        "8e"
    } else if flags.contains(PartitionFlag::Raid) {
        "fd"
    } else {
        "83"
    }
}

fn partition_type_code(table: PartitionTableType, flags: pbr_api::facts::partition::PartitionFlagSet) -> String {
    match table {
        PartitionTableType::Msdos => msdos_type_code(flags).to_string(),
        _ => gpt_type_guid(flags).to_string(),
    }
}

/// Stage 1: wipes and recreates every disk's partition table flagged by the
/// Layout Comparator (C6).
#[tracing::instrument(skip_all)]
fn stage1_partition_tables(
    captured_disks: &BTreeMap<String, Disk>,
    live_disks: &BTreeMap<String, Disk>,
) -> Result<()> {
    for (path, captured) in captured_disks {
        let live = live_disks
            .get(path)
            .with_context(|| format!("Live disk '{path}' missing at reconstruction time"))?;

        if !needs_repartition(captured, live) {
            info!("Disk '{path}' layout already matches captured facts, skipping repartition");
            continue;
        }

        info!("Repartitioning disk '{path}'");
        wipefs::all(path).with_context(|| format!("Failed to wipe signatures on '{path}'"))?;

        let label = match captured.partition_table_type {
            PartitionTableType::Gpt => "gpt",
            PartitionTableType::Msdos => "dos",
            PartitionTableType::Loop | PartitionTableType::None => {
                info!("Disk '{path}' has no partition table to recreate");
                continue;
            }
        };

        let specs: Vec<sfdisk::PartitionSpec> = captured
            .partitions
            .values()
            .map(|p| sfdisk::PartitionSpec {
                start_sectors: Some(p.start),
                size_sectors: p.end - p.start,
                type_code: partition_type_code(captured.partition_table_type, p.flags),
                name: p.name.clone(),
            })
            .collect();

        if let Err(e) = sfdisk::SfDisk::write_layout(path, label, &specs) {
            warn!("Failed to write partition table for '{path}': {e:#}");
            continue;
        }

        udevadm::settle().context("udevadm settle failed after partitioning")?;
        if let Err(e) = block_devices::partx_update(path) {
            warn!("Failed to re-read partition table for '{path}': {e:#}");
        }
        udevadm::settle().context("udevadm settle failed after partition re-read")?;
    }

    Ok(())
}

/// Stage 2: assembles or recreates every captured MD array.
#[tracing::instrument(skip_all)]
fn stage2_md_arrays(md_info: &BTreeMap<String, pbr_api::facts::md::MdArray>) -> Result<()> {
    if md_info.is_empty() {
        return Ok(());
    }

    let _ = mdadm::assemble_scan();
    udevadm::settle().context("udevadm settle failed after assemble --scan")?;

    for (name, array) in md_info {
        let raid_path = PathBuf::from(format!("/dev/md/{name}"));

        let live_detail = mdadm::detail(&raid_path).ok();
        let live_members: Vec<String> = live_detail
            .as_ref()
            .map(|d| {
                d.devices
                    .iter()
                    .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        let captured_set: std::collections::BTreeSet<&String> =
            array.member_kernel_names.iter().collect();
        let live_set: std::collections::BTreeSet<&String> = live_members.iter().collect();

        if live_detail.is_some() && captured_set == live_set {
            info!("MD array '{name}' already present with matching members");
            continue;
        }

        if live_detail.is_some() && live_set.is_subset(&captured_set) {
            info!("MD array '{name}' present with a member subset, re-adding the rest");
            for member in captured_set.difference(&live_set) {
                let member_path = PathBuf::from("/dev").join(member);
                if let Err(e) = mdadm::add(&raid_path, &member_path) {
                    warn!("Failed to re-add '{member}' to '{name}': {e:#}, trying add directly");
                    mdadm::add(&raid_path, &member_path).with_context(|| {
                        format!("Failed to add member '{member}' to array '{name}'")
                    })?;
                }
            }
            continue;
        }

        info!("MD array '{name}' absent or mismatched, recreating");
        let _ = mdadm::stop(&raid_path);
        let member_paths: Vec<PathBuf> = array
            .member_kernel_names
            .iter()
            .map(|m| PathBuf::from("/dev").join(m))
            .collect();
        for member in &member_paths {
            if let Err(e) = mdadm::zero_superblock(member) {
                warn!("Failed to zero superblock on '{}': {e:#}", member.display());
            }
        }

        mdadm::create_exact(
            &raid_path,
            &array.raid_level,
            &array.metadata_version,
            array.uuid,
            &member_paths,
        )
        .with_context(|| format!("Failed to create MD array '{name}'"))?;

        udevadm::settle().context("udevadm settle failed after mdadm create")?;
    }

    Ok(())
}

/// Shared logic for Stages 3 and 5: opens or restores+opens a LUKS
/// container, independent of what it backs onto.
fn open_luks_container(
    backing_path: &Path,
    container: &LuksContainer,
    facts_dir: &Path,
    key_source: &dyn LuksKeySource,
) -> Result<PathBuf> {
    let mapper_name = container.mapper_name();
    let mapper_path = PathBuf::from("/dev/mapper").join(&mapper_name);

    let live_uuid = cryptsetup::luks_uuid(backing_path).ok();
    if live_uuid != Some(container.uuid) {
        let basename = backing_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let header_file = facts_dir
            .join("luks")
            .join(LuksContainer::backup_filename(&basename));
        cryptsetup::luks_header_restore(backing_path, &header_file).with_context(|| {
            format!(
                "Failed to restore LUKS header for '{}' from '{}'",
                backing_path.display(),
                header_file.display()
            )
        })?;
    }

    let passphrase = key_source.passphrase(container)?;
    cryptsetup::luks_open(backing_path, &mapper_name, &passphrase)
        .with_context(|| format!("Failed to open LUKS container on '{}'", backing_path.display()))?;

    Ok(mapper_path)
}

/// Stage 3: opens every LUKS container backed directly by a partition.
#[tracing::instrument(skip_all)]
fn stage3_luks_on_partitions(
    luks: &BTreeMap<String, LuksContainer>,
    facts_dir: &Path,
    key_source: &dyn LuksKeySource,
) -> Result<()> {
    for (path, container) in luks.iter().filter(|(_, c)| c.backing_kind == LuksBackingKind::Part) {
        open_luks_container(Path::new(path), container, facts_dir, key_source)
            .with_context(|| format!("Stage 3 LUKS open failed for '{path}'"))?;
    }
    Ok(())
}

/// Stage 5: opens every LUKS container backed by a logical volume.
#[tracing::instrument(skip_all)]
fn stage5_luks_on_lvs(
    luks: &BTreeMap<String, LuksContainer>,
    facts_dir: &Path,
    key_source: &dyn LuksKeySource,
) -> Result<()> {
    for (path, container) in luks.iter().filter(|(_, c)| c.backing_kind == LuksBackingKind::Lvm) {
        open_luks_container(Path::new(path), container, facts_dir, key_source)
            .with_context(|| format!("Stage 5 LUKS open failed for '{path}'"))?;
    }
    Ok(())
}

/// Stage 4: restores every captured volume group whose current LV set
/// doesn't already match.
#[tracing::instrument(skip_all)]
fn stage4_lvm(lvm: &pbr_api::facts::lvm::LvmReport, facts_dir: &Path) -> Result<()> {
    for vg in &lvm.vgs {
        if let Err(e) = os_lvm::vgchange_activate(&vg.name, false) {
            // A VG that was never active in the first place fails here;
            // that's expected, not fatal (§7).
            info!("vgchange deactivate on '{}' reported: {e:#}", vg.name);
        }
    }

    for vg in &lvm.vgs {
        let captured_lvs = lvm.lv_tuples(&vg.name);
        let live_lvs = os_lvm::lvs()
            .ok()
            .map(|rows| {
                rows.into_iter()
                    .filter(|r| r.vg_name == vg.name)
                    .filter_map(|r| r.lv_size.trim().parse::<u64>().ok().map(|size| (r.lv_name, size)))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let pvs = lvm.pvs_for_vg(&vg.name);
        let has_unknown_pv = pvs.iter().any(|pv| pv.pv_name.is_empty());

        if !has_unknown_pv && live_lvs == captured_lvs {
            info!("VG '{}' already matches captured logical volumes", vg.name);
            continue;
        }

        for pv in &pvs {
            let backup_file = facts_dir.join("vgcfg").join(&vg.name);
            let _ = os_lvm::pvremove(&pv.pv_name);
            os_lvm::pvcreate_restore(&pv.pv_name, &pv.pv_uuid.to_string(), &backup_file)
                .with_context(|| format!("Failed to recreate PV '{}' for VG '{}'", pv.pv_name, vg.name))?;
        }

        let backup_file = facts_dir.join("vgcfg").join(&vg.name);
        os_lvm::vgcfgrestore(&vg.name, &backup_file)
            .with_context(|| format!("Failed to restore VG '{}' metadata", vg.name))?;
        os_lvm::vgchange_activate(&vg.name, true)
            .with_context(|| format!("Failed to activate VG '{}'", vg.name))?;

        let restored_lvs = os_lvm::lvs()
            .context("Failed to list logical volumes after restore")?
            .into_iter()
            .filter(|r| r.vg_name == vg.name)
            .filter_map(|r| r.lv_size.trim().parse::<u64>().ok().map(|size| (r.lv_name, size)))
            .collect::<Vec<_>>();

        ensure!(
            restored_lvs == captured_lvs,
            "VG '{}' restore produced logical volumes that do not match the captured set",
            vg.name
        );
    }

    Ok(())
}

/// SELinux context assigned to each well-known mount path (§4.7 Stage 7).
fn selinux_context_for(path: &str) -> Option<&'static str> {
    match path {
        "/boot" => Some("system_u:object_r:boot_t:s0"),
        "/home" => Some("system_u:object_r:home_root_t:s0"),
        "/mnt" => Some("system_u:object_r:mnt_t:s0"),
        "/opt" => Some("system_u:object_r:usr_t:s0"),
        "/tmp" => Some("system_u:object_r:tmp_t:s0"),
        "/usr" => Some("system_u:object_r:usr_t:s0"),
        "/var" => Some("system_u:object_r:var_t:s0"),
        _ => None,
    }
}

/// Stage 6: formats every mount's target filesystem with the captured
/// identity. A device already mounted at format time is fatal.
#[tracing::instrument(skip_all)]
fn stage6_filesystems(mounts: &BTreeMap<String, pbr_api::facts::mount::Mount>) -> Result<()> {
    for mount in mounts.values() {
        if mount.is_swap() {
            ensure_unmounted(&mount.kname)?;
            mkswap::run_with_identity(
                Path::new(&mount.kname),
                mount.fs_uuid.as_deref(),
                mount.fs_label.as_deref(),
            )
            .with_context(|| format!("Failed to format swap device '{}'", mount.kname))?;
            continue;
        }

        let Some(fs_type) = mount.fs_type.as_deref() else {
            bail!("Mount '{}' has no captured filesystem type", mount.path);
        };

        ensure_unmounted(&mount.kname)?;

        use osutils::filesystems::MkfsFileSystemType as Fs;
        let fs = match fs_type {
            "ext2" => Fs::Ext2,
            "ext3" => Fs::Ext3,
            "ext4" => Fs::Ext4,
            "xfs" => Fs::Xfs,
            "vfat" | "msdos" => Fs::Vfat,
            other => bail!("Unknown filesystem type '{other}' for mount '{}'", mount.path),
        };

        mkfs::run_with_identity(
            Path::new(&mount.kname),
            fs,
            mount.fs_uuid.as_deref(),
            mount.fs_label.as_deref(),
        )
        .with_context(|| format!("Failed to format '{}' for mount '{}'", mount.kname, mount.path))?;
    }

    Ok(())
}

fn ensure_unmounted(device: &str) -> Result<()> {
    let already_mounted = findmnt::list()
        .context("Failed to list mounted filesystems")?
        .into_iter()
        .any(|entry| entry.source.as_deref() == Some(Path::new(device)));

    ensure!(
        !already_mounted,
        "Device '{device}' is mounted and cannot be formatted"
    );
    Ok(())
}

/// Stage 7: builds the staging-root mount tree.
#[tracing::instrument(skip_all)]
fn stage7_mount_tree(
    mounts: &BTreeMap<String, pbr_api::facts::mount::Mount>,
    staging_root: &Path,
    selinux_enabled: bool,
) -> Result<()> {
    os_mount::ensure_mount_directory(staging_root)
        .with_context(|| format!("Failed to prepare staging root '{}'", staging_root.display()))?;

    let mut non_swap: Vec<&pbr_api::facts::mount::Mount> =
        mounts.values().filter(|m| !m.is_swap()).collect();
    non_swap.sort_by(|a, b| a.path.cmp(&b.path));

    use osutils::filesystems::MountFileSystemType as MFs;
    for mount in non_swap {
        let target = staging_root.join(mount.path.trim_start_matches('/'));
        if !target.exists() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create mount directory '{}'", target.display()))?;
        }

        if selinux_enabled {
            if let Some(context) = selinux_context_for(&mount.path) {
                apply_selinux_context(&target, context)?;
            }
        }

        let device_path = preferred_mount_source(mount);
        let fs = match mount.fs_type.as_deref() {
            Some("ext2") => MFs::Ext2,
            Some("ext3") => MFs::Ext3,
            Some("ext4") => MFs::Ext4,
            Some("xfs") => MFs::Xfs,
            Some("vfat") | Some("msdos") => MFs::Vfat,
            _ => MFs::Auto,
        };

        os_mount::mount(&device_path, &target, fs, &[]).with_context(|| {
            format!("Failed to mount '{}' at '{}'", device_path.display(), target.display())
        })?;
    }

    if selinux_enabled {
        std::fs::write(staging_root.join(".autorelabel"), b"")
            .context("Failed to create .autorelabel marker")?;
    }

    Ok(())
}

/// Stable MD path is preferred over the raw kernel device when both are
/// plausible mount sources (§4.7 Stage 7).
fn preferred_mount_source(mount: &pbr_api::facts::mount::Mount) -> PathBuf {
    if let Some(md_devname) = &mount.md_devname {
        PathBuf::from(format!("/dev/md/{md_devname}"))
    } else {
        PathBuf::from(&mount.kname)
    }
}

fn apply_selinux_context(path: &Path, context: &str) -> Result<()> {
    std::process::Command::new("chcon")
        .arg(context)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run chcon on '{}'", path.display()))
        .and_then(|status| {
            ensure!(status.success(), "chcon exited with {status}");
            Ok(())
        })
}

/// Runs all seven reconstruction stages in order against the rewritten
/// captured facts and the live disk map produced by the Disk Matcher.
#[tracing::instrument(skip_all)]
pub fn reconstruct(
    facts: &FactSet,
    live_disks: &BTreeMap<String, Disk>,
    facts_dir: &Path,
    staging_root: &Path,
    key_source: &dyn LuksKeySource,
) -> Result<()> {
    stage1_partition_tables(&facts.disks, live_disks).context("Stage 1 (partition tables) failed")?;
    stage2_md_arrays(&facts.misc.md_info).context("Stage 2 (MD arrays) failed")?;
    stage3_luks_on_partitions(&facts.misc.luks, facts_dir, key_source)
        .context("Stage 3 (LUKS on partitions) failed")?;
    stage4_lvm(&facts.lvm, facts_dir).context("Stage 4 (LVM) failed")?;
    stage5_luks_on_lvs(&facts.misc.luks, facts_dir, key_source)
        .context("Stage 5 (LUKS on logical volumes) failed")?;
    stage6_filesystems(&facts.mounts).context("Stage 6 (filesystems) failed")?;
    stage7_mount_tree(&facts.mounts, staging_root, facts.misc.selinux_enabled)
        .context("Stage 7 (mount tree) failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pbr_api::facts::partition::{PartitionFlag, PartitionFlagSet};

    use super::*;

    #[test]
    fn gpt_esp_and_lvm_type_codes() {
        assert_eq!(
            partition_type_code(PartitionTableType::Gpt, PartitionFlag::Esp.into()),
            "c12a7328-f81f-11d2-ba4b-00a0c93ec93b"
        );
        assert_eq!(
            partition_type_code(PartitionTableType::Gpt, PartitionFlag::Lvm.into()),
            "e6d6d379-f507-44c2-a23c-238f2a3df928"
        );
        assert_eq!(
            partition_type_code(PartitionTableType::Gpt, PartitionFlagSet::empty()),
            "0fc63daf-8483-4772-8e79-3d69d8477de4"
        );
    }

    #[test]
    fn msdos_swap_and_lvm_type_codes() {
        assert_eq!(partition_type_code(PartitionTableType::Msdos, PartitionFlag::Swap.into()), "82");
        assert_eq!(partition_type_code(PartitionTableType::Msdos, PartitionFlag::Lvm.into()), "8e");
        assert_eq!(partition_type_code(PartitionTableType::Msdos, PartitionFlagSet::empty()), "83");
    }

    #[test]
    fn selinux_table_covers_fixed_paths() {
        assert_eq!(selinux_context_for("/boot"), Some("system_u:object_r:boot_t:s0"));
        assert_eq!(selinux_context_for("/srv"), None);
    }

    #[test]
    fn fixed_luks_key_source_returns_its_passphrase() {
        let container = LuksContainer {
            uuid: Uuid::nil(),
            version: 2,
            backing_kind: LuksBackingKind::Part,
        };
        let source = FixedLuksKeySource("secret".to_string());
        assert_eq!(source.passphrase(&container).unwrap(), "secret");
    }
}
