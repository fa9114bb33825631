use std::time::Duration;

/// On-host reference copy of the last saved `FactSet`, used by check-facts
/// (§3, §4.2).
pub const FACTS_DIR: &str = "/var/lib/pbr/facts";

/// Location of the four fact documents inside the rescue medium payload
/// (§6).
pub const RESCUE_FACTS_DIR: &str = "/facts";

/// Default staging root under which the reconstructed mount tree is
/// assembled (GLOSSARY).
pub const DEFAULT_STAGING_ROOT: &str = "/mnt/rootfs";

/// Name of the swap pseudo-filesystem type.
pub const SWAP_FILESYSTEM: &str = "swap";

/// Minimum timeout attached to LVM commands (§5).
pub const LVM_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimum timeout attached to mount/umount (§5).
pub const MOUNT_TIMEOUT: Duration = Duration::from_secs(10);
