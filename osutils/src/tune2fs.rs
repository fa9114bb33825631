use std::path::Path;

use anyhow::{Context, Error};
use uuid::Uuid;

use crate::dependencies::Dependency;

/// Sets the UUID of an ext2/3/4 filesystem. Used by the Fact Rewriter
/// (§4.7 Stage 5) to stamp a recreated filesystem with the UUID recorded in
/// the reference facts, so stale `/etc/fstab`/kernel-cmdline UUID
/// references keep resolving.
pub fn set_uuid(device: impl AsRef<Path>, uuid: Uuid) -> Result<(), Error> {
    Dependency::Tune2fs
        .cmd()
        .arg("-U")
        .arg(uuid.to_string())
        .arg(device.as_ref())
        .run_and_check()
        .with_context(|| {
            format!(
                "Failed to set UUID '{}' on '{}'",
                uuid,
                device.as_ref().display()
            )
        })
}

/// Sets the volume label of an ext2/3/4 filesystem (§4.7 Stage 5).
pub fn set_label(device: impl AsRef<Path>, label: &str) -> Result<(), Error> {
    Dependency::Tune2fs
        .cmd()
        .arg("-L")
        .arg(label)
        .arg(device.as_ref())
        .run_and_check()
        .with_context(|| {
            format!(
                "Failed to set label '{}' on '{}'",
                label,
                device.as_ref().display()
            )
        })
}

#[cfg(feature = "functional-test")]
#[cfg_attr(not(test), allow(unused_imports, dead_code))]
mod functional_test {
    use super::*;

    use pytest_gen::functional_test;

    const TEST_DISK_DEVICE_PATH: &str = "/dev/sdb1";

    #[functional_test(feature = "helpers")]
    fn test_set_uuid() {
        let uuid = Uuid::new_v4();
        set_uuid(Path::new(TEST_DISK_DEVICE_PATH), uuid).unwrap();
    }

    #[functional_test(feature = "helpers")]
    fn test_set_label() {
        set_label(Path::new(TEST_DISK_DEVICE_PATH), "pbr-root").unwrap();
    }
}
