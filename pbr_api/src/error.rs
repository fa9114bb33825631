use std::path::PathBuf;

/// Error taxonomy for the storage-reconstruction engine.
///
/// Every fatal condition the engine raises belongs to exactly one of these
/// four kinds. Component functions return `anyhow::Result<T>`, attaching a
/// `PbrError` at the point a contract is violated and `anyhow::Context` at
/// every external-command call site above it, so the final error message
/// carries both the command line that failed and the human sentence
/// describing which stage produced it.
#[derive(Debug, thiserror::Error)]
pub enum PbrError {
    /// A required device, file, or directory is missing, or the operator
    /// selected something absent from the presented candidate list.
    #[error("{0} does not exist")]
    Exists(String),

    /// `mount`/`umount` failed or timed out.
    #[error("mount operation failed: {0}")]
    Mount(String),

    /// Any other external command exited nonzero or timed out.
    #[error("command failed: {0}")]
    RunCmd(String),

    /// A contract violation inside the core itself.
    #[error("{0}")]
    General(String),
}

impl PbrError {
    pub fn missing_device(path: impl Into<PathBuf>) -> Self {
        PbrError::Exists(path.into().display().to_string())
    }
}
