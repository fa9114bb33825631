use std::path::Path;

use anyhow::{Context, Error};
use duct::cmd;
use uuid::Uuid;

use crate::dependencies::Dependency;

/// Backs up a LUKS header to a file (§4.2 — captured alongside the device's
/// other facts so the header can be replayed verbatim at restore time,
/// without re-deriving key slots).
pub fn luks_header_backup(device: impl AsRef<Path>, header_file: impl AsRef<Path>) -> Result<(), Error> {
    Dependency::Cryptsetup
        .cmd()
        .arg("luksHeaderBackup")
        .arg(device.as_ref())
        .arg("--header-backup-file")
        .arg(header_file.as_ref())
        .run_and_check()
        .with_context(|| {
            format!(
                "Failed to back up LUKS header for '{}'",
                device.as_ref().display()
            )
        })
}

/// Restores a LUKS header onto a recreated partition (§4.7 Stage 4 — LUKS
/// containers are reopened before the filesystem inside them is recreated).
pub fn luks_header_restore(device: impl AsRef<Path>, header_file: impl AsRef<Path>) -> Result<(), Error> {
    Dependency::Cryptsetup
        .cmd()
        .arg("luksHeaderRestore")
        .arg(device.as_ref())
        .arg("--header-backup-file")
        .arg(header_file.as_ref())
        .run_and_check()
        .with_context(|| {
            format!(
                "Failed to restore LUKS header onto '{}'",
                device.as_ref().display()
            )
        })
}

/// Opens a LUKS container with a passphrase supplied on stdin, mapping it to
/// `/dev/mapper/<name>`. Uses `duct` directly (like `sfdisk::write_layout`)
/// since the `Dependency` wrapper doesn't pipe stdin.
pub fn luks_open(device: impl AsRef<Path>, name: &str, passphrase: &str) -> Result<(), Error> {
    cmd!(
        "cryptsetup",
        "luksOpen",
        device.as_ref(),
        name,
        "--key-file",
        "-"
    )
    .stdin_bytes(passphrase.as_bytes())
    .stderr_to_stdout()
    .read()
    .with_context(|| {
        format!(
            "Failed to open LUKS container '{}' as '{name}'",
            device.as_ref().display()
        )
    })?;
    Ok(())
}

/// Closes a previously opened LUKS mapping.
pub fn luks_close(name: &str) -> Result<(), Error> {
    Dependency::Cryptsetup
        .cmd()
        .arg("luksClose")
        .arg(name)
        .run_and_check()
        .with_context(|| format!("Failed to close LUKS mapping '{name}'"))
}

/// Reads the LUKS UUID of a container via `cryptsetup luksUUID`, used by the
/// Fact Collector to populate `LuksContainer::uuid` (§3, §4.1).
pub fn luks_uuid(device: impl AsRef<Path>) -> Result<Uuid, Error> {
    let output = Dependency::Cryptsetup
        .cmd()
        .arg("luksUUID")
        .arg(device.as_ref())
        .output_and_check()
        .with_context(|| {
            format!(
                "Failed to read LUKS UUID for '{}'",
                device.as_ref().display()
            )
        })?;

    output
        .trim()
        .parse()
        .with_context(|| format!("Malformed LUKS UUID '{}'", output.trim()))
}

/// Returns whether a device carries a LUKS header at all, via
/// `cryptsetup isLuks` (exit 0 = is LUKS, exit 1 = isn't).
pub fn is_luks(device: impl AsRef<Path>) -> Result<bool, Error> {
    let output = Dependency::Cryptsetup
        .cmd()
        .arg("isLuks")
        .arg(device.as_ref())
        .output()
        .with_context(|| {
            format!(
                "Failed to execute cryptsetup isLuks on '{}'",
                device.as_ref().display()
            )
        })?;

    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(anyhow::anyhow!(
            "cryptsetup isLuks on '{}' exited abnormally",
            device.as_ref().display()
        )),
    }
}

#[cfg(feature = "functional-test")]
#[cfg_attr(not(test), allow(unused_imports, dead_code))]
mod functional_test {
    use super::*;

    use pytest_gen::functional_test;

    const TEST_DISK_DEVICE_PATH: &str = "/dev/sdb1";

    #[functional_test(feature = "helpers")]
    fn test_is_luks_false_on_plain_partition() {
        assert!(!is_luks(Path::new(TEST_DISK_DEVICE_PATH)).unwrap());
    }
}
