use std::{
    collections::BTreeMap,
    path::Path,
    process::Command,
};

use anyhow::{Context, Error};

use crate::exe::RunAndCheck;

pub fn settle() -> Result<(), Error> {
    Command::new("udevadm")
        .arg("settle")
        .run_and_check()
        .context("Failed settle udev setup")
}

pub fn trigger() -> Result<(), Error> {
    Command::new("udevadm")
        .arg("trigger")
        .run_and_check()
        .context("Failed trigger udev")
}

/// Runs `udevadm info -q property -n <device>` and parses the flat
/// `KEY=value` output into a map. This is how the Device Probe (§4.1)
/// reads `ID_SERIAL`, `ID_WWN`, `ID_PATH`, `ID_FS_TYPE`, `ID_FS_UUID`, and
/// similar udev-populated attributes without linking against a udev client
/// library.
pub fn properties(device: impl AsRef<Path>) -> Result<BTreeMap<String, String>, Error> {
    let output = Command::new("udevadm")
        .arg("info")
        .arg("-q")
        .arg("property")
        .arg("-n")
        .arg(device.as_ref())
        .output_and_check()
        .with_context(|| {
            format!(
                "Failed to query udev properties for '{}'",
                device.as_ref().display()
            )
        })?;

    Ok(parse_properties(&output))
}

fn parse_properties(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_properties() {
        let output = "DEVNAME=/dev/sda1\nID_FS_TYPE=ext4\nID_FS_UUID=abc-123\nMALFORMED\n";
        let props = parse_properties(output);
        assert_eq!(props.get("DEVNAME").unwrap(), "/dev/sda1");
        assert_eq!(props.get("ID_FS_TYPE").unwrap(), "ext4");
        assert_eq!(props.get("ID_FS_UUID").unwrap(), "abc-123");
        assert_eq!(props.len(), 3);
    }
}

#[cfg(all(test, feature = "functional-tests"))]
mod functional_tests {
    use super::*;

    #[test]
    fn test() {
        settle().unwrap();
        trigger().unwrap();
    }

    #[test]
    fn test_properties() {
        let props = properties("/dev/sda").unwrap();
        assert!(props.contains_key("DEVNAME"));
    }
}
