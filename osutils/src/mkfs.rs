use std::path::Path;

use anyhow::{Context, Error};

use crate::{dependencies::Dependency, filesystems::MkfsFileSystemType};

pub fn run(device_path: &Path, filesystem: MkfsFileSystemType) -> Result<(), Error> {
    Dependency::Mkfs
        .cmd()
        .arg("--type")
        .arg(filesystem.name())
        .arg(device_path)
        .run_and_check()
        .context("Failed to execute mkfs")
}

/// Formats a device, stamping the reference UUID/label captured at backup
/// time (§4.7 Stage 6) so the recreated filesystem is indistinguishable from
/// the original to anything that looks it up by UUID or label. Each
/// filesystem family takes its identity flags differently: ext2/3/4 take
/// `-U`/`-L` directly, xfs takes `-m uuid=` and `-L`, and vfat takes a
/// hyphen-stripped volume ID via `-i` plus `-n` for the label.
pub fn run_with_identity(
    device_path: &Path,
    filesystem: MkfsFileSystemType,
    uuid: Option<&str>,
    label: Option<&str>,
) -> Result<(), Error> {
    let mut cmd = Dependency::Mkfs.cmd();
    cmd.arg("--type").arg(filesystem.name());

    match filesystem {
        MkfsFileSystemType::Ext2 | MkfsFileSystemType::Ext3 | MkfsFileSystemType::Ext4 => {
            if let Some(uuid) = uuid {
                cmd.arg("-U").arg(uuid);
            }
            if let Some(label) = label {
                cmd.arg("-L").arg(label);
            }
        }
        MkfsFileSystemType::Xfs => {
            if let Some(uuid) = uuid {
                cmd.arg("-m").arg(format!("uuid={uuid}"));
            }
            if let Some(label) = label {
                cmd.arg("-L").arg(label);
            }
        }
        MkfsFileSystemType::Vfat => {
            cmd.arg("-F").arg("16");
            if let Some(uuid) = uuid {
                cmd.arg("-i").arg(uuid.replace('-', ""));
            }
            if let Some(label) = label {
                cmd.arg("-n").arg(label);
            }
        }
    }

    cmd.arg(device_path)
        .run_and_check()
        .context("Failed to execute mkfs")
}

#[cfg(feature = "functional-test")]
#[cfg_attr(not(test), allow(unused_imports, dead_code))]
/// Helper function to create a filesystem that is smaller than the full device size
pub(super) fn run_blocks(
    device_path: &Path,
    filesystem: MkfsFileSystemType,
    blocks: u64,
) -> Result<(), Error> {
    Dependency::Mkfs
        .cmd()
        .arg("--type")
        .arg(filesystem.name())
        .arg(device_path)
        .arg(format!("{blocks}"))
        .run_and_check()
        .context("Failed to execute mkfs")
}

#[cfg(feature = "functional-test")]
#[cfg_attr(not(test), allow(unused_imports, dead_code))]
mod functional_test {
    use super::*;

    use sys_mount::{MountFlags, UnmountFlags};

    use pytest_gen::functional_test;

    const TEST_DISK_DEVICE_PATH: &str = "/dev/sdb";

    /// This function wipes the /dev/sdb device and ensures the /mnt
    /// directory exists.
    fn setup_test() {
        Dependency::Wipefs
            .cmd()
            .arg("--all")
            .arg(TEST_DISK_DEVICE_PATH)
            .run_and_check()
            .unwrap();
        if !Path::new("/mnt").exists() {
            Dependency::Mkdir.cmd().arg("/mnt").run_and_check().unwrap();
        }
    }

    fn test_filesystem(filesystem: MkfsFileSystemType) {
        let block_device_path = Path::new(TEST_DISK_DEVICE_PATH);

        super::run(block_device_path, filesystem).unwrap();

        let mount_point = tempfile::tempdir()
            .context("Failed to create temporary mount point")
            .unwrap();
        let _mount = sys_mount::Mount::builder()
            .flags(MountFlags::RDONLY)
            .mount_autodrop(block_device_path, mount_point.path(), UnmountFlags::DETACH);
    }

    #[functional_test(feature = "helpers")]
    fn test_supported_filesystems() {
        test_filesystem(MkfsFileSystemType::Ext2);
        test_filesystem(MkfsFileSystemType::Ext3);
        test_filesystem(MkfsFileSystemType::Ext4);
        test_filesystem(MkfsFileSystemType::Vfat);
    }

    #[functional_test(feature = "helpers")]
    fn test_run_pass() {
        setup_test();

        // run() on a zeroed block device should format it with the
        // specified filesystem. It should be mountable and writable.
        super::run(Path::new(TEST_DISK_DEVICE_PATH), MkfsFileSystemType::Ext4).unwrap();
        assert_eq!(
            Dependency::Lsblk
                .cmd()
                .arg("-no")
                .arg("FSTYPE")
                .arg(TEST_DISK_DEVICE_PATH)
                .output_and_check()
                .unwrap(),
            "ext4\n"
        );
        Dependency::Mount
            .cmd()
            .arg(TEST_DISK_DEVICE_PATH)
            .arg("/mnt")
            .run_and_check()
            .unwrap();
        Dependency::Touch
            .cmd()
            .arg("/mnt/test")
            .run_and_check()
            .unwrap();
        Dependency::Umount
            .cmd()
            .arg("/mnt")
            .run_and_check()
            .unwrap();

        // run() on a formatted block device with a different filesystem
        // should format it with the new filesystem and clear the device
        // contents.
        super::run(Path::new(TEST_DISK_DEVICE_PATH), MkfsFileSystemType::Ext3).unwrap();
        assert_eq!(
            Dependency::Lsblk
                .cmd()
                .arg("-no")
                .arg("FSTYPE")
                .arg(TEST_DISK_DEVICE_PATH)
                .output_and_check()
                .unwrap(),
            "ext3\n"
        );
        Dependency::Mount
            .cmd()
            .arg(TEST_DISK_DEVICE_PATH)
            .arg("/mnt")
            .run_and_check()
            .unwrap();
        assert!(!Path::new("/mnt/test").exists());
        Dependency::Touch
            .cmd()
            .arg("/mnt/test")
            .run_and_check()
            .unwrap();
        Dependency::Umount
            .cmd()
            .arg("/mnt")
            .run_and_check()
            .unwrap();

        // run() on a formatted block device with the same filesystem
        // should not change the filesystem but should again clear the
        // device contents.
        super::run(Path::new(TEST_DISK_DEVICE_PATH), MkfsFileSystemType::Ext3).unwrap();
        assert_eq!(
            Dependency::Lsblk
                .cmd()
                .arg("-no")
                .arg("FSTYPE")
                .arg(TEST_DISK_DEVICE_PATH)
                .output_and_check()
                .unwrap(),
            "ext3\n"
        );
        Dependency::Mount
            .cmd()
            .arg(TEST_DISK_DEVICE_PATH)
            .arg("/mnt")
            .run_and_check()
            .unwrap();
        assert!(!Path::new("/mnt/test").exists());
        Dependency::Touch
            .cmd()
            .arg("/mnt/test")
            .run_and_check()
            .unwrap();
        Dependency::Umount
            .cmd()
            .arg("/mnt")
            .run_and_check()
            .unwrap();
    }

    #[functional_test(feature = "helpers", negative = true)]
    fn test_run_fail() {
        setup_test();

        // Create a file on the block device to ensure it's not empty.
        super::run(Path::new(TEST_DISK_DEVICE_PATH), MkfsFileSystemType::Ext4).unwrap();
        Dependency::Mount
            .cmd()
            .arg(TEST_DISK_DEVICE_PATH)
            .arg("/mnt")
            .run_and_check()
            .unwrap();
        Dependency::Touch
            .cmd()
            .arg("/mnt/test")
            .run_and_check()
            .unwrap();
        Dependency::Umount
            .cmd()
            .arg("/mnt")
            .run_and_check()
            .unwrap();

        // run() using device '/dev/foo' that doesn't exist should also
        // fail and again not clear the device contents.
        assert!(super::run(Path::new("/dev/foo"), MkfsFileSystemType::Ext3).is_err());
        Dependency::Mount
            .cmd()
            .arg(TEST_DISK_DEVICE_PATH)
            .arg("/mnt")
            .run_and_check()
            .unwrap();
        assert!(Path::new("/mnt/test").exists());
        Dependency::Umount
            .cmd()
            .arg("/mnt")
            .run_and_check()
            .unwrap();
    }

}
