use anyhow::bail;

/// Filesystem type names as they appear in `disks.json`/`mnts.json`
/// (§3: `Partition::fs_type`, `Mount::fs_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FsTypeName {
    Auto,
    Ext4,
    Xfs,
    Vfat,
    Iso9660,
    Tmpfs,
    Overlay,
    Swap,
}

/// File system types for `mount`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountFileSystemType {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Vfat,
    Iso9660,
    Tmpfs,
    Auto,
    Overlay,
}

/// File system types for `mkfs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MkfsFileSystemType {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Vfat,
}

/// File system types for fstab file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabFileSystemType {
    Auto,
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Vfat,
    Iso9660,
    Tmpfs,
    Swap,
    Overlay,
}

impl MountFileSystemType {
    pub fn name(self) -> &'static str {
        match self {
            MountFileSystemType::Ext2 => "ext2",
            MountFileSystemType::Ext3 => "ext3",
            MountFileSystemType::Ext4 => "ext4",
            MountFileSystemType::Xfs => "xfs",
            MountFileSystemType::Vfat => "vfat",
            MountFileSystemType::Iso9660 => "iso9660",
            MountFileSystemType::Tmpfs => "tmpfs",
            MountFileSystemType::Auto => "auto",
            MountFileSystemType::Overlay => "overlay",
        }
    }

    pub fn from_api_type(api_type: FsTypeName) -> Result<Self, anyhow::Error> {
        Ok(match api_type {
            FsTypeName::Auto => MountFileSystemType::Auto,
            FsTypeName::Ext4 => MountFileSystemType::Ext4,
            FsTypeName::Xfs => MountFileSystemType::Xfs,
            FsTypeName::Vfat => MountFileSystemType::Vfat,
            FsTypeName::Iso9660 => MountFileSystemType::Iso9660,
            FsTypeName::Tmpfs => MountFileSystemType::Tmpfs,
            FsTypeName::Overlay => MountFileSystemType::Overlay,
            FsTypeName::Swap => {
                bail!("'swap' FS type cannot be used for mounting")
            }
        })
    }
}

impl std::fmt::Display for MountFileSystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Provides a conversion from `MountFileSystemType` to `sys_mount::FilesystemType`
impl From<MountFileSystemType> for sys_mount::FilesystemType<'static> {
    fn from(s: MountFileSystemType) -> Self {
        sys_mount::FilesystemType::Manual(s.name())
    }
}

impl MkfsFileSystemType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Xfs => "xfs",
            Self::Vfat => "vfat",
        }
    }

    pub fn from_api_type(api_type: FsTypeName) -> Result<Self, anyhow::Error> {
        Ok(match api_type {
            FsTypeName::Ext4 => Self::Ext4,
            FsTypeName::Xfs => Self::Xfs,
            FsTypeName::Vfat => Self::Vfat,
            FsTypeName::Swap
            | FsTypeName::Iso9660
            | FsTypeName::Tmpfs
            | FsTypeName::Overlay
            | FsTypeName::Auto => {
                bail!(
                    "'{}' filesystem type cannot be used for creating new filesystems",
                    api_type
                )
            }
        })
    }
}

impl std::fmt::Display for MkfsFileSystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TabFileSystemType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Xfs => "xfs",
            Self::Vfat => "vfat",
            Self::Iso9660 => "iso9660",
            Self::Tmpfs => "tmpfs",
            Self::Overlay => "overlay",
            TabFileSystemType::Swap => "swap",
        }
    }

    pub fn from_api_type(api_type: FsTypeName) -> Self {
        match api_type {
            FsTypeName::Ext4 => Self::Ext4,
            FsTypeName::Xfs => Self::Xfs,
            FsTypeName::Vfat => Self::Vfat,
            FsTypeName::Iso9660 => Self::Iso9660,
            FsTypeName::Tmpfs => Self::Tmpfs,
            FsTypeName::Overlay => Self::Overlay,
            FsTypeName::Swap => Self::Swap,
            FsTypeName::Auto => Self::Auto,
        }
    }
}
