use crate::transport::RemoteSession;
use crate::Result;
use std::path::Path;
use tracing::{error, info};

/// `cd '<remote_dir>' && <command>`
pub fn remote_command_line(remote_dir: &Path, command: &str) -> String {
    let dir = escape_posix_literal(&remote_dir.to_string_lossy());
    format!("cd '{}' && {}", dir, command)
}

/// Run `command` inside `remote_dir` and log its output until the stream closes.
pub fn run_command(session: &dyn RemoteSession, remote_dir: &Path, command: &str) -> Result<()> {
    info!("Running '{}' on remote...", command);
    let line = remote_command_line(remote_dir, command);

    let mut forward = |chunk: &str| {
        for out in chunk.lines().filter(|l| !l.trim().is_empty()) {
            info!("[{}] {}", command, out);
        }
    };

    session.exec(&line, &mut forward).map_err(|e| {
        error!("Error running '{}': {}", command, e);
        e
    })?;

    info!("'{}' completed", command);
    Ok(())
}

fn escape_posix_literal(value: &str) -> String {
    value.replace('\'', "'\\''")
}
