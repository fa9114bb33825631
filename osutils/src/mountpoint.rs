use std::path::Path;

use anyhow::{Context, Error};

use crate::{dependencies::Dependency, exe::OutputChecker};

/// `mountpoint` exits 0 if the path is a mount point, 1 if it plainly isn't,
/// and anything else (missing path, bad permissions) is a real error.
pub fn check_is_mountpoint(path: impl AsRef<Path>) -> Result<bool, Error> {
    let output = Dependency::Mountpoint
        .cmd()
        .arg(path.as_ref())
        .output()
        .with_context(|| {
            format!(
                "Failed to execute mountpoint for '{}'",
                path.as_ref().display()
            )
        })?;

    match output.exit_code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(anyhow::anyhow!(output.output_report())).with_context(|| {
            format!(
                "Failed to determine if '{}' is a mount point",
                path.as_ref().display()
            )
        }),
    }
}

#[cfg(feature = "functional-test")]
#[cfg_attr(not(test), allow(unused_imports, dead_code))]
mod functional_test {
    use super::*;

    use pytest_gen::functional_test;

    #[functional_test(feature = "helpers")]
    fn test_check_is_mountpoint() {
        assert!(!super::check_is_mountpoint(Path::new("/dev/sda1")).unwrap());

        assert!(super::check_is_mountpoint(Path::new("/")).unwrap());

        assert!(!super::check_is_mountpoint(Path::new("/etc")).unwrap());

        assert!(!super::check_is_mountpoint(Path::new("/does-not-exist")).unwrap());
    }
}
