use thiserror::Error;
use std::fmt;
use std::path::PathBuf;

/// Remote filesystem operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    ReadDir,
    Mkdir,
    Rmdir,
    Unlink,
    Upload,
    Stat,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOp::ReadDir => "readdir",
            RemoteOp::Mkdir => "mkdir",
            RemoteOp::Rmdir => "rmdir",
            RemoteOp::Unlink => "unlink",
            RemoteOp::Upload => "upload",
            RemoteOp::Stat => "stat",
        };
        f.write_str(name)
    }
}

/// Classification used by the idempotent delete/create rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFsErrorKind {
    NotFound,
    AlreadyExists,
    Other,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Raspberry Pi password not configured")]
    MissingCredential,

    #[error("SSH connection failed: {0}")]
    Connection(String),

    #[error("SFTP channel failed: {0}")]
    Channel(String),

    #[error("Remote {op} failed for {path:?}: {message}")]
    RemoteFs {
        op: RemoteOp,
        path: PathBuf,
        kind: RemoteFsErrorKind,
        message: String,
    },

    #[error("Remote command failed: {0}")]
    RemoteCommand(String),

    #[error("Sync failed at {path:?}: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: Box<DeployError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl DeployError {
    pub fn remote_fs(
        op: RemoteOp,
        path: impl Into<PathBuf>,
        kind: RemoteFsErrorKind,
        message: impl Into<String>,
    ) -> Self {
        DeployError::RemoteFs {
            op,
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn remote_kind(&self) -> Option<RemoteFsErrorKind> {
        match self {
            DeployError::RemoteFs { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.remote_kind() == Some(RemoteFsErrorKind::NotFound)
    }

    pub fn is_already_exists(&self) -> bool {
        self.remote_kind() == Some(RemoteFsErrorKind::AlreadyExists)
    }

    /// Missing credential or other invalid settings, detected before connecting.
    pub fn is_config(&self) -> bool {
        matches!(self, DeployError::Config(_) | DeployError::MissingCredential)
    }
}
