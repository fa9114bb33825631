//! Fact collection (C2).
//!
//! Builds a complete `FactSet` describing the running system's storage:
//! per-disk partition layouts, MD arrays, LUKS containers (with header
//! backups), the LVM stack, the mount table, and the scalar `Misc` record.
//! Collection is all-or-nothing (§4.2): any single probe failure aborts the
//! whole pass rather than producing a partial fact set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};

use osutils::{blkid, cryptsetup, findmnt, lvm as os_lvm, mdadm, osrelease::OsRelease, sfdisk};
use pbr_api::constants::FACTS_DIR;
use pbr_api::facts::{
    device_type::DeviceType,
    disk::{Disk, LeafFilesystem},
    factset::FactSet,
    luks::{LuksBackingKind, LuksContainer},
    lvm::{Lv, LvmReport, Pv, Vg},
    md::MdArray,
    misc::{EfiInfo, Misc},
    mount::Mount,
    partition::{Partition, PartitionFlag, PartitionFlagSet, PartitionKind, PartitionTableType},
};

use crate::probe::{self, ProbedDevice};

/// Collects a full `FactSet` from the running system's storage stack.
pub fn collect_facts() -> Result<FactSet> {
    let devices = probe::enumerate().context("Device probe failed")?;

    let disks = collect_disks(&devices).context("Failed to collect disk layouts")?;
    let lvm = collect_lvm(&devices).context("Failed to collect LVM report")?;
    let luks = collect_luks(&devices).context("Failed to collect LUKS containers")?;
    let md_info = collect_md(&devices).context("Failed to collect MD arrays")?;
    let mounts = collect_mounts(&devices, &lvm).context("Failed to collect mount table")?;
    let mut misc = collect_misc().context("Failed to collect scalar system facts")?;
    misc.md_info = md_info;
    misc.luks = luks;

    Ok(FactSet {
        disks,
        lvm,
        mounts,
        misc,
    })
}

pub fn collect_disks(devices: &[ProbedDevice]) -> Result<BTreeMap<String, Disk>> {
    let mut disks = BTreeMap::new();

    for dev in devices.iter().filter(|d| d.device_type.is_disk_like()) {
        let path = dev.device_path.clone();
        let sf = sfdisk::SfDisk::get_info(&path);

        let (partition_table_type, partitions) = match sf {
            Ok(sf) => {
                let table_type = match sf.label {
                    sfdisk::SfDiskLabel::Gpt => PartitionTableType::Gpt,
                    sfdisk::SfDiskLabel::Dos => PartitionTableType::Msdos,
                };
                let mut partitions = BTreeMap::new();
                for (idx, part) in sf.partitions.iter().enumerate() {
                    let number = (idx + 1) as u32;
                    let (fs_type, fs_uuid, fs_label) = filesystem_fields(&part.node);
                    let mut flags = flags_from_partition_type(table_type, &part.partition_type);
                    if part.bootable {
                        flags |= PartitionFlag::Boot;
                    }
                    partitions.insert(
                        number,
                        Partition {
                            number,
                            start: part.start,
                            end: part.start + part.size_sectors,
                            kind: kind_from_partition_type(table_type, number, &part.partition_type),
                            flags,
                            name: part.name.clone(),
                            fs_type,
                            fs_uuid,
                            fs_label,
                        },
                    );
                }
                (table_type, partitions)
            }
            Err(_) => (PartitionTableType::None, BTreeMap::new()),
        };

        let leaf_fs = if partitions.is_empty() {
            let (fs_type, fs_uuid, fs_label) = filesystem_fields(&path);
            if fs_type.is_some() {
                Some(LeafFilesystem {
                    fs_type,
                    fs_uuid,
                    fs_label,
                })
            } else {
                None
            }
        } else {
            None
        };

        let disk = Disk {
            id_serial: dev.attrs.get("ID_SERIAL_SHORT").cloned(),
            id_wwn: dev.attrs.get("ID_WWN").cloned(),
            id_path: dev.attrs.get("ID_PATH").cloned(),
            size: dev.block_device.size,
            partition_table_type,
            partitions,
            leaf_fs,
        };

        disks.insert(path.to_string_lossy().into_owned(), disk);
    }

    Ok(disks)
}

fn filesystem_fields(device: &Path) -> (Option<String>, Option<String>, Option<String>) {
    let fs_uuid = blkid::get_filesystem_uuid(device).ok().map(|u| u.to_string());
    let fs_label = blkid::get_partition_label(device).ok();
    (None, fs_uuid, fs_label)
}

/// Maps `sfdisk`'s raw partition type string (a GPT GUID or an msdos two-digit
/// hex code, see `osutils::sfdisk::SfPartition::partition_type`) back to the
/// flag set the Reconstructor's Stage 1 (`gpt_type_guid`/`msdos_type_code`)
/// derives the same type code from. Kept as the inverse of those tables so
/// the round trip through a backup/restore cycle is exact (§3).
fn flags_from_partition_type(table: PartitionTableType, raw_type: &str) -> PartitionFlagSet {
    match table {
        PartitionTableType::Msdos => match raw_type.to_ascii_lowercase().as_str() {
            "ef" => PartitionFlag::Esp.into(),
            "82" => PartitionFlag::Swap.into(),
            "8e" => PartitionFlag::Lvm.into(),
            "fd" => PartitionFlag::Raid.into(),
            "41" => PartitionFlag::Prep.into(),
            _ => PartitionFlagSet::empty(),
        },
        PartitionTableType::Gpt => match raw_type.to_ascii_lowercase().as_str() {
            "c12a7328-f81f-11d2-ba4b-00a0c93ec93b" => PartitionFlag::Esp.into(),
            "21686148-6449-6e6f-744e-656564454649" => PartitionFlag::BiosGrub.into(),
            "0657fd6d-a4ab-43c4-84e5-0933c84b4f4f" => PartitionFlag::Swap.into(),
            "e6d6d379-f507-44c2-a23c-238f2a3df928" => PartitionFlag::Lvm.into(),
            "a19d880f-05fc-4d3b-a006-743f0f84911e" => PartitionFlag::Raid.into(),
            "9e1a2d38-c612-4316-aa26-8b49521e5a8b" => PartitionFlag::Prep.into(),
            _ => PartitionFlagSet::empty(),
        },
        PartitionTableType::Loop | PartitionTableType::None => PartitionFlagSet::empty(),
    }
}

/// An msdos partition is `Extended` if its type code is the classic extended
/// marker, `Logical` if it's numbered past the four primary slots, `Normal`
/// otherwise. GPT carries no such distinction.
fn kind_from_partition_type(table: PartitionTableType, number: u32, raw_type: &str) -> PartitionKind {
    if table != PartitionTableType::Msdos {
        return PartitionKind::Normal;
    }
    match raw_type.to_ascii_lowercase().as_str() {
        "5" | "0f" | "85" => PartitionKind::Extended,
        _ if number > 4 => PartitionKind::Logical,
        _ => PartitionKind::Normal,
    }
}

fn collect_lvm(devices: &[ProbedDevice]) -> Result<LvmReport> {
    let pv_rows = os_lvm::pvs().context("Failed to list physical volumes")?;
    let vg_rows = os_lvm::vgs().context("Failed to list volume groups")?;
    let lv_rows = os_lvm::lvs().context("Failed to list logical volumes")?;

    let mut pvs = Vec::new();
    for row in pv_rows {
        let pv_path = PathBuf::from(&row.pv_name);
        let matching = devices.iter().find(|d| d.device_path == pv_path);

        let d_type = matching.map(|d| d.device_type).unwrap_or(DeviceType::Disk);
        let md_dev = matching
            .map(|d| d.device_type == DeviceType::MdArray)
            .unwrap_or(false);
        let parent = matching.and_then(|d| {
            d.block_device
                .parent_kernel_name
                .as_ref()
                .map(|p| format!("/dev/{}", p.display()))
        });

        // When the PV is backed by an MD array, stamp the stable
        // /dev/md/<name> alias so the rewriter doesn't have to guess it
        // back out from the raw kernel name later (§4.2).
        let pv_name = if md_dev {
            matching
                .and_then(|d| d.attrs.get("MD_DEVNAME"))
                .map(|name| format!("/dev/md/{name}"))
                .unwrap_or(row.pv_name.clone())
        } else {
            row.pv_name.clone()
        };

        pvs.push(Pv {
            pv_name,
            pv_uuid: row.pv_uuid.parse().with_context(|| {
                format!("Failed to parse PV uuid '{}' for '{}'", row.pv_uuid, row.pv_name)
            })?,
            vg_name: row.vg_name,
            pv_size: 0,
            d_type,
            md_dev,
            parent,
        });
    }

    let vgs = vg_rows
        .into_iter()
        .map(|row| Vg {
            pv_count: pvs.iter().filter(|p| p.vg_name == row.vg_name).count() as u32,
            lv_count: lv_rows.iter().filter(|l| l.vg_name == row.vg_name).count() as u32,
            name: row.vg_name,
        })
        .collect();

    // Required, not best-effort (§4.2): without this file Stage 4 of the
    // Reconstructor has nothing to feed `vgcfgrestore`, and the restore is
    // unrecoverable for every LVM-backed volume group.
    let vgcfg_dir = Path::new(FACTS_DIR).join("vgcfg");
    std::fs::create_dir_all(&vgcfg_dir).context("Failed to create LVM metadata backup directory")?;
    for vg in &vgs {
        os_lvm::vgcfgbackup(&vg.name, vgcfg_dir.join(&vg.name)).with_context(|| {
            format!("Failed to back up LVM metadata for volume group '{}'", vg.name)
        })?;
    }

    let lvs = lv_rows
        .into_iter()
        .map(|row| {
            Ok(Lv {
                vg_name: row.vg_name,
                lv_name: row.lv_name,
                lv_size: row
                    .lv_size
                    .trim()
                    .parse()
                    .with_context(|| format!("Failed to parse LV size '{}'", row.lv_size))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LvmReport { pvs, vgs, lvs })
}

fn collect_luks(devices: &[ProbedDevice]) -> Result<BTreeMap<String, LuksContainer>> {
    std::fs::create_dir_all(Path::new(FACTS_DIR).join("luks"))
        .context("Failed to create LUKS sidecar directory")?;

    let mut containers = BTreeMap::new();
    for dev in devices {
        if dev.attrs.get("ID_FS_TYPE").map(String::as_str) != Some("crypto_LUKS") {
            continue;
        }

        let uuid = cryptsetup::luks_uuid(&dev.device_path).with_context(|| {
            format!("Failed to read LUKS uuid for '{}'", dev.device_path.display())
        })?;

        let backing_kind = match dev.device_type {
            DeviceType::Lvm => LuksBackingKind::Lvm,
            _ => LuksBackingKind::Part,
        };

        let basename = dev
            .device_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dev.kernel_name.clone());
        let backup_file =
            Path::new(FACTS_DIR).join("luks").join(LuksContainer::backup_filename(&basename));
        cryptsetup::luks_header_backup(&dev.device_path, &backup_file).with_context(|| {
            format!("Failed to back up LUKS header for '{}'", dev.device_path.display())
        })?;

        containers.insert(
            dev.device_path.to_string_lossy().into_owned(),
            LuksContainer {
                uuid,
                version: 2,
                backing_kind,
            },
        );
    }

    Ok(containers)
}

fn collect_md(devices: &[ProbedDevice]) -> Result<BTreeMap<String, MdArray>> {
    let mut arrays = BTreeMap::new();

    for dev in devices.iter().filter(|d| d.device_type == DeviceType::MdArray) {
        let devlinks = dev.attrs.get("DEVLINKS").cloned().unwrap_or_default();
        if !devlinks.contains("/dev/disk/by-id/md-uuid") {
            continue;
        }

        let name = dev
            .attrs
            .get("MD_DEVNAME")
            .cloned()
            .unwrap_or_else(|| dev.kernel_name.clone());

        let detail = mdadm::detail(&dev.device_path).with_context(|| {
            format!("Failed to read mdadm detail for '{}'", dev.device_path.display())
        })?;

        let mut members: Vec<String> = detail
            .devices
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        members.sort();

        arrays.insert(
            name,
            MdArray {
                member_kernel_names: members,
                raid_level: detail.level,
                metadata_version: mdadm::METADATA_VERSION.to_string(),
                uuid: detail.uuid.parse().with_context(|| {
                    format!("Failed to parse mdadm uuid '{}'", detail.uuid)
                })?,
            },
        );
    }

    Ok(arrays)
}

fn collect_mounts(devices: &[ProbedDevice], lvm: &LvmReport) -> Result<BTreeMap<String, Mount>> {
    let mut mounts = BTreeMap::new();
    let mut swap_index = 0u32;

    for entry in findmnt::list().context("Failed to list mounted filesystems")? {
        let Some(source) = entry.source.clone() else {
            continue;
        };
        let Some(dev) = devices.iter().find(|d| d.device_path == source) else {
            debug!("Skipping mount '{}': source '{}' not a tracked device", entry.target.display(), source.display());
            continue;
        };

        let vg = lvm
            .pvs
            .iter()
            .find(|pv| dev.device_type == DeviceType::Lvm && pv.pv_name == source.to_string_lossy())
            .map(|pv| pv.vg_name.clone())
            .or_else(|| {
                lvm.lvs
                    .iter()
                    .find(|lv| source.to_string_lossy().ends_with(&lv.lv_name))
                    .map(|lv| lv.vg_name.clone())
            });

        let parent = dev
            .block_device
            .parent_kernel_name
            .as_ref()
            .map(|p| format!("/dev/{}", p.display()));

        let md_devname = dev.attrs.get("MD_DEVNAME").cloned();

        mounts.insert(
            entry.target.to_string_lossy().into_owned(),
            Mount {
                path: entry.target.to_string_lossy().into_owned(),
                kname: source.to_string_lossy().into_owned(),
                fs_type: entry.fstype.clone(),
                fs_uuid: dev.attrs.get("ID_FS_UUID").cloned(),
                fs_label: dev.attrs.get("ID_FS_LABEL").cloned(),
                kind: dev.device_type,
                vg,
                parent,
                md_devname,
            },
        );
    }

    for dev in devices {
        if dev.attrs.get("ID_FS_TYPE").map(String::as_str) != Some("swap") {
            continue;
        }
        let key = format!("SWAP-{swap_index}");
        swap_index += 1;
        mounts.insert(
            key.clone(),
            Mount {
                path: key,
                kname: dev.device_path.to_string_lossy().into_owned(),
                fs_type: Some("swap".to_string()),
                fs_uuid: dev.attrs.get("ID_FS_UUID").cloned(),
                fs_label: dev.attrs.get("ID_FS_LABEL").cloned(),
                kind: dev.device_type,
                vg: None,
                parent: dev
                    .block_device
                    .parent_kernel_name
                    .as_ref()
                    .map(|p| format!("/dev/{}", p.display())),
                md_devname: dev.attrs.get("MD_DEVNAME").cloned(),
            },
        );
    }

    Ok(mounts)
}

fn collect_misc() -> Result<Misc> {
    let os_release = OsRelease::read().unwrap_or_default();
    let arch = osutils::arch::SystemArchitecture::current();
    let arch_name = match arch {
        osutils::arch::SystemArchitecture::X86 => "x86",
        osutils::arch::SystemArchitecture::Amd64 => "x86_64",
        osutils::arch::SystemArchitecture::Arm => "arm",
        osutils::arch::SystemArchitecture::Aarch64 => "aarch64",
        osutils::arch::SystemArchitecture::Other => "other",
    }
    .to_string();

    let hostname = std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|e| {
            warn!("Failed to read hostname: {e:#}");
            String::new()
        });
    let kernel_release = osutils::uname::kernel_release().unwrap_or_default();

    let uefi = Path::new("/sys/firmware/efi").exists();
    let secure_boot = uefi && is_secure_boot_enabled();

    let selinux_enabled = Path::new("/etc/selinux/config").exists();
    let selinux_enforcing = if selinux_enabled {
        std::fs::read_to_string("/sys/fs/selinux/enforce")
            .ok()
            .map(|v| v.trim() == "1")
    } else {
        None
    };

    let grub_prefix = which::which("grub2-mkimage").is_ok() || which::which("grub-mkimage").is_ok();

    let efi = if uefi {
        Some(EfiInfo {
            efi_distro: os_release.id.clone().unwrap_or_default(),
            efi_file: "shimx64.efi".to_string(),
        })
    } else {
        None
    };

    Ok(Misc {
        arch: arch_name,
        hostname,
        distro: os_release.name.unwrap_or_default(),
        distro_pretty: os_release.pretty_name.unwrap_or_default(),
        distro_codename: os_release.version_codename.unwrap_or_default(),
        distro_id: os_release.id.clone().unwrap_or_default(),
        distro_like: os_release.id_like.unwrap_or_default(),
        kernel_release,
        uefi,
        efi,
        secure_boot,
        selinux_enabled,
        selinux_enforcing,
        grub_prefix,
        recovery_mode: Path::new(pbr_api::constants::RESCUE_FACTS_DIR).exists(),
        bk_vgs: Vec::new(),
        md_info: BTreeMap::new(),
        luks: BTreeMap::new(),
    })
}

fn is_secure_boot_enabled() -> bool {
    glob::glob("/sys/firmware/efi/efivars/SecureBoot-*")
        .ok()
        .and_then(|mut paths| paths.next())
        .and_then(|p| p.ok())
        .and_then(|path| std::fs::read(path).ok())
        .map(|bytes| bytes.last().copied() == Some(1))
        .unwrap_or(false)
}

/// Checks freshly collected facts against the reference set written at
/// backup time (§4.2, Testable Property 7). Never overwrites the
/// reference; returns `true` when every document matches byte-for-byte.
pub fn check_facts(reference_dir: &Path) -> Result<bool> {
    let collected = collect_facts().context("Failed to collect facts for comparison")?;
    let docs = collected.to_documents().context("Failed to serialize collected facts")?;

    let pairs = [
        ("disks.json", &docs.disks),
        ("lvm.json", &docs.lvm),
        ("mnts.json", &docs.mnts),
        ("misc.json", &docs.misc),
    ];

    for (filename, content) in pairs {
        let reference_path = reference_dir.join(filename);
        let reference = std::fs::read_to_string(&reference_path)
            .with_context(|| format!("Failed to read reference fact '{}'", reference_path.display()))?;
        if reference.trim_end() != content.trim_end() {
            debug!("Fact mismatch in '{filename}'");
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_fields_defaults_to_none_on_missing_device() {
        let (fs_type, fs_uuid, fs_label) = filesystem_fields(Path::new("/dev/does-not-exist"));
        assert!(fs_type.is_none());
        assert!(fs_uuid.is_none());
        assert!(fs_label.is_none());
    }

    #[test]
    fn maps_gpt_esp_and_lvm_guids_to_flags() {
        assert_eq!(
            flags_from_partition_type(PartitionTableType::Gpt, "C12A7328-F81F-11D2-BA4B-00A0C93EC93B"),
            PartitionFlag::Esp.into()
        );
        assert_eq!(
            flags_from_partition_type(PartitionTableType::Gpt, "e6d6d379-f507-44c2-a23c-238f2a3df928"),
            PartitionFlag::Lvm.into()
        );
        assert_eq!(
            flags_from_partition_type(PartitionTableType::Gpt, "0fc63daf-8483-4772-8e79-3d69d8477de4"),
            PartitionFlagSet::empty()
        );
    }

    #[test]
    fn maps_msdos_swap_and_lvm_codes_to_flags() {
        assert_eq!(flags_from_partition_type(PartitionTableType::Msdos, "82"), PartitionFlag::Swap.into());
        assert_eq!(flags_from_partition_type(PartitionTableType::Msdos, "8E"), PartitionFlag::Lvm.into());
        assert_eq!(flags_from_partition_type(PartitionTableType::Msdos, "83"), PartitionFlagSet::empty());
    }

    #[test]
    fn msdos_kind_follows_extended_code_and_numbering() {
        assert_eq!(kind_from_partition_type(PartitionTableType::Msdos, 1, "83"), PartitionKind::Normal);
        assert_eq!(kind_from_partition_type(PartitionTableType::Msdos, 2, "5"), PartitionKind::Extended);
        assert_eq!(kind_from_partition_type(PartitionTableType::Msdos, 5, "83"), PartitionKind::Logical);
        assert_eq!(kind_from_partition_type(PartitionTableType::Gpt, 5, "83"), PartitionKind::Normal);
    }
}
