//! Fact rewriting (C5, §4.5).
//!
//! Applies the Disk Matcher's rename map to a captured `FactSet`,
//! left-to-right with an accumulator, so that a later rewrite never
//! clobbers one applied earlier. Must be idempotent under the empty map and
//! must preserve every structural invariant from §3.

use pbr_api::facts::{device_type::DeviceType, factset::FactSet};

use crate::matcher::RenameMap;

/// Applies `renames` to `facts`, returning a new `FactSet` with every disk
/// path, mount reference, MD member, PV, and LUKS key updated.
pub fn apply_rename_map(facts: &FactSet, renames: &RenameMap) -> FactSet {
    let mut out = facts.clone();

    for (old, new) in renames {
        out = apply_single_rename(&out, old, new);
    }

    out
}

fn apply_single_rename(facts: &FactSet, old: &str, new: &str) -> FactSet {
    let mut out = facts.clone();

    if let Some(disk) = out.disks.remove(old) {
        out.disks.insert(new.to_string(), disk);
    }

    for mount in out.mounts.values_mut() {
        if matches!(
            mount.kind,
            DeviceType::Part | DeviceType::PartOnMpath | DeviceType::Mpath | DeviceType::Disk
        ) {
            mount.path = rewrite_device_path(&mount.path, old, new, mount.kind);
            mount.kname = rewrite_device_path(&mount.kname, old, new, mount.kind);
            if let Some(parent) = &mount.parent {
                if parent == old {
                    mount.parent = Some(new.to_string());
                }
            }
        }
    }

    for array in out.misc.md_info.values_mut() {
        let old_base = basename(old);
        let new_base = basename(new);
        for member in array.member_kernel_names.iter_mut() {
            if alphabetic_prefix(member) == old_base {
                *member = format!("{new_base}{}", numeric_suffix(member));
            }
        }
        array.sort_members();
    }

    for pv in out.lvm.pvs.iter_mut() {
        if pv.parent.as_deref() == Some(old) {
            pv.parent = Some(new.to_string());
            pv.pv_name = insert_p_if_partitioned(&pv.pv_name, old, new);
        } else if pv.pv_name == old {
            pv.pv_name = new.to_string();
        }
    }

    out.misc.luks = out
        .misc
        .luks
        .clone()
        .into_iter()
        .map(|(key, container)| {
            let old_base = basename(old);
            if alphabetic_prefix(&basename(&key)) == old_base {
                let new_key = format!(
                    "{}{}",
                    basename(new),
                    numeric_suffix(&basename(&key))
                );
                let new_path = key.rsplit_once('/').map(|(dir, _)| format!("{dir}/{new_key}")).unwrap_or(new_key);
                (new_path, container)
            } else {
                (key, container)
            }
        })
        .collect();

    out
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn alphabetic_prefix(name: &str) -> String {
    name.chars().take_while(|c| c.is_ascii_alphabetic()).collect()
}

fn numeric_suffix(name: &str) -> String {
    name.chars().skip_while(|c| c.is_ascii_alphabetic()).collect()
}

fn ends_in_digit(path: &str) -> bool {
    basename(path).chars().last().map(char::is_numeric).unwrap_or(false)
}

/// Rewrites `path` from `old` to `new`, inserting a `p` separator when the
/// new disk's kernel name ends in a digit and the device is partition-like
/// (kernel convention for numerically-named disks, e.g. `nvme0n1p1`).
fn rewrite_device_path(path: &str, old: &str, new: &str, kind: DeviceType) -> String {
    if kind.is_partition_like() {
        insert_p_if_partitioned(path, old, new)
    } else if path == old {
        new.to_string()
    } else {
        path.to_string()
    }
}

fn insert_p_if_partitioned(path: &str, old: &str, new: &str) -> String {
    if let Some(rest) = path.strip_prefix(old) {
        if ends_in_digit(new) && !rest.is_empty() {
            format!("{new}p{}", rest.trim_start_matches('p'))
        } else {
            format!("{new}{rest}")
        }
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pbr_api::facts::factset::FactSet;

    use super::*;

    #[test]
    fn empty_rename_map_is_a_no_op() {
        let facts = FactSet::default();
        let rewritten = apply_rename_map(&facts, &Vec::new());
        assert_eq!(facts, rewritten);
    }

    #[test]
    fn inserts_p_separator_for_numerically_named_disk() {
        assert_eq!(insert_p_if_partitioned("/dev/sda1", "/dev/sda", "/dev/nvme0n1"), "/dev/nvme0n1p1");
        assert_eq!(insert_p_if_partitioned("/dev/sda1", "/dev/sda", "/dev/sdz"), "/dev/sdz1");
        assert_eq!(insert_p_if_partitioned("/dev/sda", "/dev/sda", "/dev/sdz"), "/dev/sdz");
    }

    #[test]
    fn alphabetic_prefix_and_numeric_suffix_split_kernel_names() {
        assert_eq!(alphabetic_prefix("sda1"), "sda");
        assert_eq!(numeric_suffix("sda1"), "1");
        assert_eq!(alphabetic_prefix("nvme0n1p1"), "nvme");
    }
}
