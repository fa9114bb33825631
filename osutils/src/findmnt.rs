use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use serde::Deserialize;

use crate::dependencies::Dependency;

#[derive(Debug, Deserialize)]
struct FindmntOutput {
    filesystems: Vec<FindmntEntry>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FindmntEntry {
    pub target: PathBuf,
    pub source: Option<PathBuf>,
    pub fstype: Option<String>,
    pub options: Option<String>,
}

/// Lists the live mount table via `findmnt --json`, used as a cross-check
/// against `/proc/mounts` when collecting mount facts (§3: `Mount`).
pub fn list() -> Result<Vec<FindmntEntry>, Error> {
    let output = Dependency::Findmnt
        .cmd()
        .arg("--json")
        .output_and_check()
        .context("Failed to execute findmnt")?;

    let parsed: FindmntOutput =
        serde_json::from_str(&output).context("Failed to parse findmnt output")?;

    Ok(parsed.filesystems)
}

/// Returns the mount table entry whose target is exactly `path`, if mounted.
pub fn find_by_target(path: impl AsRef<Path>) -> Result<Option<FindmntEntry>, Error> {
    Ok(list()?.into_iter().find(|e| e.target == path.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_findmnt_json() {
        let output = indoc::indoc! {r#"
            {
               "filesystems": [
                  {
                     "target": "/boot",
                     "source": "/dev/sda1",
                     "fstype": "ext4",
                     "options": "rw,relatime"
                  }
               ]
            }
        "#};

        let parsed: FindmntOutput = serde_json::from_str(output).unwrap();
        assert_eq!(parsed.filesystems.len(), 1);
        assert_eq!(parsed.filesystems[0].target, Path::new("/boot"));
        assert_eq!(
            parsed.filesystems[0].source,
            Some(PathBuf::from("/dev/sda1"))
        );
    }
}

#[cfg(feature = "functional-test")]
#[cfg_attr(not(test), allow(unused_imports, dead_code))]
mod functional_test {
    use super::*;

    use pytest_gen::functional_test;

    #[functional_test(feature = "helpers")]
    fn test_find_by_target_root() {
        let entry = find_by_target(Path::new("/")).unwrap();
        assert!(entry.is_some());
    }
}
