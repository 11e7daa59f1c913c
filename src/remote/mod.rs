//! Operations against the remote target directory, built on the
//! [`RemoteFs`](crate::transport::RemoteFs) and
//! [`RemoteSession`](crate::transport::RemoteSession) traits.

pub mod command;
pub mod tree;
pub mod upload;

pub use command::{remote_command_line, run_command};
pub use tree::{create_dir, remove_dir_recursive};
pub use upload::sync_files;
