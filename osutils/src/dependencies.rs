//! Binaries this crate shells out to, wrapped so a failure always reports
//! which tool was invoked and with what arguments (§7: every fatal error
//! logs the exact command line, stderr, and a human sentence).

use std::process::{Command, Output};

use log::trace;
use thiserror::Error;

use crate::exe::RunAndCheck;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Lsblk,
    Blkid,
    Udevadm,
    Sfdisk,
    Partx,
    Blockdev,
    Mkfs,
    Mkswap,
    Wipefs,
    Mdadm,
    Cryptsetup,
    Mount,
    Umount,
    Mountpoint,
    Mkdir,
    Touch,
    Findmnt,
    Tune2fs,
    E2fsck,
    Resize2fs,
    Uname,
}

impl Dependency {
    pub fn binary_name(self) -> &'static str {
        match self {
            Dependency::Lsblk => "lsblk",
            Dependency::Blkid => "blkid",
            Dependency::Udevadm => "udevadm",
            Dependency::Sfdisk => "sfdisk",
            Dependency::Partx => "partx",
            Dependency::Blockdev => "blockdev",
            Dependency::Mkfs => "mkfs",
            Dependency::Mkswap => "mkswap",
            Dependency::Wipefs => "wipefs",
            Dependency::Mdadm => "mdadm",
            Dependency::Cryptsetup => "cryptsetup",
            Dependency::Mount => "mount",
            Dependency::Umount => "umount",
            Dependency::Mountpoint => "mountpoint",
            Dependency::Mkdir => "mkdir",
            Dependency::Touch => "touch",
            Dependency::Findmnt => "findmnt",
            Dependency::Tune2fs => "tune2fs",
            Dependency::E2fsck => "e2fsck",
            Dependency::Resize2fs => "resize2fs",
            Dependency::Uname => "uname",
        }
    }

    pub fn cmd(self) -> DependencyCommand {
        DependencyCommand {
            dependency: self,
            command: Command::new(self.binary_name()),
        }
    }
}

/// A `std::process::Command` tagged with the `Dependency` that built it, so
/// failures can be reported per-tool instead of generically.
pub struct DependencyCommand {
    dependency: Dependency,
    command: Command,
}

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("{dependency} is not installed or not on PATH")]
    NotFound { dependency: Dependency },

    #[error("{dependency} failed: {source:#}")]
    ExecutionFailed {
        dependency: Dependency,
        #[source]
        source: anyhow::Error,
    },
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.binary_name())
    }
}

impl DependencyCommand {
    pub fn arg(&mut self, arg: impl AsRef<std::ffi::OsStr>) -> &mut Self {
        self.command.arg(arg);
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.command.args(args);
        self
    }

    fn to_dependency_error(&self, source: anyhow::Error) -> Box<DependencyError> {
        Box::new(if which::which(self.dependency.binary_name()).is_err() {
            DependencyError::NotFound {
                dependency: self.dependency,
            }
        } else {
            DependencyError::ExecutionFailed {
                dependency: self.dependency,
                source,
            }
        })
    }

    pub fn run_and_check(&mut self) -> Result<(), Box<DependencyError>> {
        trace!("Executing '{}'", self.command.render_command());
        self.command
            .run_and_check()
            .map_err(|e| self.to_dependency_error(e))
    }

    pub fn output_and_check(&mut self) -> Result<String, Box<DependencyError>> {
        trace!("Executing '{}'", self.command.render_command());
        self.command
            .output_and_check()
            .map_err(|e| self.to_dependency_error(e))
    }

    /// Runs the command without checking its exit status, for callers that
    /// need to interpret specific non-zero codes themselves (e.g.
    /// `mountpoint`'s "not a mount point" exit code).
    pub fn output(&mut self) -> std::io::Result<Output> {
        self.command.output()
    }

    pub fn raw_output_and_check(&mut self) -> Result<Output, Box<DependencyError>> {
        trace!("Executing '{}'", self.command.render_command());
        self.command
            .raw_output_and_check()
            .map_err(|e| self.to_dependency_error(e))
    }
}
