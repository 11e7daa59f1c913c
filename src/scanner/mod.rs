use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

pub mod local;

pub use local::LocalScanner;

/// One entry of the local tree that gets uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryNode {
    File {
        /// File name (last path component), as stored on disk
        name: OsString,
        /// Absolute local path
        path: PathBuf,
        /// File size (bytes)
        size: u64,
    },
    Directory {
        name: OsString,
        path: PathBuf,
        /// Children sorted by file name
        children: Vec<DirectoryNode>,
    },
}

impl DirectoryNode {
    pub fn name(&self) -> &OsStr {
        match self {
            DirectoryNode::File { name, .. } | DirectoryNode::Directory { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DirectoryNode::File { path, .. } | DirectoryNode::Directory { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, DirectoryNode::Directory { .. })
    }

    pub fn children(&self) -> &[DirectoryNode] {
        match self {
            DirectoryNode::Directory { children, .. } => children,
            DirectoryNode::File { .. } => &[],
        }
    }

    /// Number of regular files below (or at) this node.
    pub fn file_count(&self) -> u64 {
        match self {
            DirectoryNode::File { .. } => 1,
            DirectoryNode::Directory { children, .. } => children.iter().map(|c| c.file_count()).sum(),
        }
    }

    /// Total size of all files below (or at) this node.
    pub fn total_size(&self) -> u64 {
        match self {
            DirectoryNode::File { size, .. } => *size,
            DirectoryNode::Directory { children, .. } => children.iter().map(|c| c.total_size()).sum(),
        }
    }
}
