use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{luks::LuksContainer, md::MdArray};

/// EFI-specific facts, only present when `uefi` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EfiInfo {
    pub efi_distro: String,
    pub efi_file: String,
}

/// The scalar record carried alongside the graph-shaped facts (§3, §3.1).
/// Maps 1:1 onto `misc.json` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Misc {
    pub arch: String,
    pub hostname: String,
    pub distro: String,
    pub distro_pretty: String,
    #[serde(default)]
    pub distro_codename: String,
    #[serde(default)]
    pub distro_id: String,
    #[serde(default)]
    pub distro_like: String,
    #[serde(default)]
    pub kernel_release: String,
    pub uefi: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none", default)]
    pub efi: Option<EfiInfo>,
    pub secure_boot: bool,
    pub selinux_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selinux_enforcing: Option<bool>,
    /// Boolean-shaped fact: whether a grub-mkimage-equivalent tool is
    /// present on `$PATH` (§3.1), not a filesystem path.
    pub grub_prefix: bool,
    /// Whether facts are being collected from inside the rescue medium
    /// itself (§3.1); gates modules/selinux-enforce-state/secure-boot/efi
    /// probes at collection time.
    #[serde(default)]
    pub recovery_mode: bool,
    /// Computed by the Topology Filter (§4.3) before embedding.
    pub bk_vgs: Vec<String>,
    pub md_info: BTreeMap<String, MdArray>,
    pub luks: BTreeMap<String, LuksContainer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efi_fields_flatten_into_misc_json() {
        let misc = Misc {
            arch: "x86_64".into(),
            hostname: "host".into(),
            distro: "fedora".into(),
            distro_pretty: "Fedora Linux 40".into(),
            uefi: true,
            efi: Some(EfiInfo {
                efi_distro: "fedora".into(),
                efi_file: "shimx64.efi".into(),
            }),
            secure_boot: false,
            selinux_enabled: false,
            grub_prefix: true,
            bk_vgs: vec![],
            md_info: BTreeMap::new(),
            luks: BTreeMap::new(),
            ..Default::default()
        };
        let json = serde_json::to_value(&misc).unwrap();
        assert_eq!(json["efi_distro"], "fedora");
        assert_eq!(json["efi_file"], "shimx64.efi");
    }
}
