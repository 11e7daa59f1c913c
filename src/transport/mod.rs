use crate::Result;
use std::ffi::OsString;
use std::path::Path;

pub mod ssh;

pub use ssh::{SshConnector, SshTarget};

/// Directory entry returned by [`RemoteFs::read_dir`]. Never `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: OsString,
    pub is_dir: bool,
}

/// Opens authenticated sessions. One session per deploy run.
pub trait Connector: Send + Sync {
    fn connect(&self, target: &SshTarget) -> Result<Box<dyn RemoteSession>>;
}

pub trait RemoteSession: Send {
    /// Open the file-transfer sub-channel.
    fn open_sftp(&self) -> Result<Box<dyn RemoteFs>>;
    /// Run a command, handing every chunk of (merged) output to `output`.
    /// Returns once the output stream closes.
    fn exec(&self, command: &str, output: &mut dyn FnMut(&str)) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// File-transfer operations. Shared across the deletion workers.
pub trait RemoteFs: Send + Sync {
    /// List entries in a remote directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<RemoteEntry>>;
    /// Create a single directory (parents are not created).
    fn mkdir(&self, path: &Path) -> Result<()>;
    fn rmdir(&self, path: &Path) -> Result<()>;
    fn unlink(&self, path: &Path) -> Result<()>;
    /// Copy a local file to `remote`, replacing any existing file.
    fn upload(&self, local: &Path, remote: &Path) -> Result<()>;
    /// `Some(true)` for a directory, `Some(false)` for anything else, `None` when missing.
    fn stat_is_dir(&self, path: &Path) -> Result<Option<bool>>;
    fn close(&mut self) -> Result<()>;
}
