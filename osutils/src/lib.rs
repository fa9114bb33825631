pub mod arch;
pub mod blkid;
pub mod block_devices;
pub mod chroot;
pub mod cryptsetup;
pub mod dependencies;
pub mod e2fsck;
pub mod exe;
pub mod files;
pub mod filesystems;
pub mod findmnt;
pub mod hashing_reader;
pub mod lsblk;
pub mod lsof;
pub mod lvm;
pub mod mdadm;
pub mod mkfs;
pub mod mkswap;
pub mod mount;
pub mod mountpoint;
pub mod osrelease;
pub mod partition_types;
pub mod path;
pub mod resize2fs;
pub mod scripts;
pub mod sfdisk;
pub mod tune2fs;
pub mod udevadm;
pub mod uname;
pub mod wipefs;

#[cfg(any(test, feature = "test-utilities"))]
pub mod testutils;

pub(crate) mod crate_private {
    pub trait Sealed {}
}
