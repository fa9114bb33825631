//! Device enumeration and classification (C1).
//!
//! Walks the block device tree via `lsblk`, pulls udev properties for each
//! candidate, and classifies every surviving device into the taxonomy that
//! the fact collector builds its `FactSet` from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use osutils::{lsblk::BlockDevice, udevadm};
use pbr_api::facts::device_type::DeviceType;

/// The subset of udev properties the probe cares about, keyed by property
/// name exactly as `udevadm info -q property` prints them.
pub type DeviceAttrs = BTreeMap<String, String>;

/// Reads udev properties for a device node given by its absolute path.
pub fn from_path(path: &Path) -> Result<DeviceAttrs> {
    udevadm::properties(path)
        .with_context(|| format!("Failed to read udev properties for '{}'", path.display()))
}

/// Reads udev properties for a device given by kernel name (e.g. "sda1").
pub fn from_kernel_name(name: &str) -> Result<DeviceAttrs> {
    from_path(&PathBuf::from("/dev").join(name))
}

/// Classifies a device from its udev attributes per the dispatch rule: dm
/// devices are told apart by `DM_UUID`'s prefix, MD members/arrays by
/// `MD_LEVEL` plus whether the device itself is partitioned, and everything
/// else by `DEVTYPE`.
pub fn classify(attrs: &DeviceAttrs) -> DeviceType {
    if let Some(dm_uuid) = attrs.get("DM_UUID") {
        if dm_uuid.starts_with("LVM-") {
            return DeviceType::Lvm;
        }
        if dm_uuid.starts_with("CRYPT-") {
            return DeviceType::Crypt;
        }
        if dm_uuid.starts_with("mpath-") {
            return match attrs.get("DEVTYPE").map(String::as_str) {
                Some("partition") => DeviceType::PartOnMpath,
                _ => DeviceType::Mpath,
            };
        }
    }

    if attrs.contains_key("MD_LEVEL") {
        return match attrs.get("DEVTYPE").map(String::as_str) {
            Some("partition") => DeviceType::PartRaid,
            _ => DeviceType::MdArray,
        };
    }

    if attrs.get("MD_UUID").is_some() && attrs.get("DEVTYPE").map(String::as_str) != Some("disk") {
        return DeviceType::MdMember;
    }

    match attrs.get("DEVTYPE").map(String::as_str) {
        Some("partition") => DeviceType::Part,
        _ => DeviceType::Disk,
    }
}

/// Returns true if a device should be dropped from consideration entirely,
/// before any classification takes place.
fn is_excluded(name: &str, attrs: &DeviceAttrs) -> bool {
    if name.starts_with("loop") {
        return true;
    }

    if attrs.contains_key("MD_NAME") && attrs.get("DEVTYPE").map(String::as_str) == Some("disk") {
        // MD member disks surface their own MD_NAME; the array itself is
        // represented by its own top-level device, not this one.
        return attrs.get("MD_LEVEL").is_none();
    }

    if attrs
        .get("ID_TYPE")
        .map(|t| t.contains("cd"))
        .unwrap_or(false)
    {
        return true;
    }

    if attrs.get("ID_BUS").map(String::as_str) == Some("usb") {
        return true;
    }

    let is_multipath_member = attrs
        .get("DM_MULTIPATH_DEVICE_PATH")
        .map(|v| v == "1")
        .unwrap_or(false)
        || has_mpath_holder(name);
    if is_multipath_member {
        let is_mpath_itself = attrs
            .get("DM_UUID")
            .map(|u| u.starts_with("mpath-"))
            .unwrap_or(false);
        if !is_mpath_itself {
            return true;
        }
    }

    false
}

/// Checks `/sys/block/<name>/holders/*/dm/uuid` for an `mpath-`-prefixed
/// holder. This is the authoritative multipath-membership signal: the
/// `DM_MULTIPATH_DEVICE_PATH` udev attribute can be stale or absent
/// depending on when multipathd last ran, but a live `mpath-` holder means
/// the kernel itself has claimed this device as a path member.
fn has_mpath_holder(name: &str) -> bool {
    let pattern = format!("/sys/block/{name}/holders/*/dm/uuid");
    glob::glob(&pattern)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|uuid| uuid.trim().starts_with("mpath-"))
}

/// A single probed device: its attributes plus the classification derived
/// from them.
#[derive(Debug, Clone)]
pub struct ProbedDevice {
    pub kernel_name: String,
    pub device_path: PathBuf,
    pub attrs: DeviceAttrs,
    pub device_type: DeviceType,
    pub block_device: BlockDevice,
}

/// Enumerates every block device in the system and returns the subset that
/// survives the exclusion rules, each tagged with its classification.
pub fn enumerate() -> Result<Vec<ProbedDevice>> {
    let block_devices = osutils::lsblk::find(|_| true)
        .context("Failed to list block devices via lsblk")?;

    let mut probed = Vec::new();
    for block_device in block_devices {
        let name = block_device.name.clone();
        let device_path = PathBuf::from("/dev").join(&name);

        let attrs = from_kernel_name(&name)
            .with_context(|| format!("Failed to probe device '{name}'"))?;

        if is_excluded(&name, &attrs) {
            debug!("Excluding device '{name}' from fact collection");
            continue;
        }

        let device_type = classify(&attrs);
        probed.push(ProbedDevice {
            kernel_name: name,
            device_path,
            attrs,
            device_type,
            block_device,
        });
    }

    Ok(probed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> DeviceAttrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn classifies_plain_disk() {
        let a = attrs(&[("DEVTYPE", "disk")]);
        assert_eq!(classify(&a), DeviceType::Disk);
    }

    #[test]
    fn classifies_plain_partition() {
        let a = attrs(&[("DEVTYPE", "partition")]);
        assert_eq!(classify(&a), DeviceType::Part);
    }

    #[test]
    fn classifies_lvm_logical_volume() {
        let a = attrs(&[
            ("DEVTYPE", "disk"),
            ("DM_UUID", "LVM-abcdef0123456789"),
        ]);
        assert_eq!(classify(&a), DeviceType::Lvm);
    }

    #[test]
    fn classifies_luks_mapping() {
        let a = attrs(&[("DEVTYPE", "disk"), ("DM_UUID", "CRYPT-LUKS2-abcd-luks-abcd")]);
        assert_eq!(classify(&a), DeviceType::Crypt);
    }

    #[test]
    fn classifies_multipath_device_and_partition() {
        let disk = attrs(&[("DEVTYPE", "disk"), ("DM_UUID", "mpath-36000000000000001")]);
        assert_eq!(classify(&disk), DeviceType::Mpath);

        let part = attrs(&[
            ("DEVTYPE", "partition"),
            ("DM_UUID", "mpath-36000000000000001"),
        ]);
        assert_eq!(classify(&part), DeviceType::PartOnMpath);
    }

    #[test]
    fn classifies_md_array_and_raid_partition() {
        let array = attrs(&[("DEVTYPE", "disk"), ("MD_LEVEL", "raid1")]);
        assert_eq!(classify(&array), DeviceType::MdArray);

        let part = attrs(&[("DEVTYPE", "partition"), ("MD_LEVEL", "raid1")]);
        assert_eq!(classify(&part), DeviceType::PartRaid);
    }

    #[test]
    fn classifies_md_member() {
        let a = attrs(&[("DEVTYPE", "disk"), ("MD_UUID", "12345678:90abcdef")]);
        assert_eq!(classify(&a), DeviceType::MdMember);
    }

    #[test]
    fn excludes_loop_devices() {
        assert!(is_excluded("loop0", &attrs(&[("DEVTYPE", "disk")])));
    }

    #[test]
    fn excludes_optical_and_usb_devices() {
        assert!(is_excluded(
            "sr0",
            &attrs(&[("DEVTYPE", "disk"), ("ID_TYPE", "cd")])
        ));
        assert!(is_excluded(
            "sdz",
            &attrs(&[("DEVTYPE", "disk"), ("ID_BUS", "usb")])
        ));
    }

    #[test]
    fn excludes_multipath_member_but_keeps_multipath_device() {
        assert!(is_excluded(
            "sdb",
            &attrs(&[("DEVTYPE", "disk"), ("DM_MULTIPATH_DEVICE_PATH", "1")])
        ));
        assert!(!is_excluded(
            "dm-3",
            &attrs(&[
                ("DEVTYPE", "disk"),
                ("DM_MULTIPATH_DEVICE_PATH", "1"),
                ("DM_UUID", "mpath-36000000000000001"),
            ])
        ));
    }

    #[test]
    fn keeps_md_array_disk_with_md_name_set() {
        assert!(!is_excluded(
            "md0",
            &attrs(&[
                ("DEVTYPE", "disk"),
                ("MD_NAME", "localhost:0"),
                ("MD_LEVEL", "raid1"),
            ])
        ));
    }
}
