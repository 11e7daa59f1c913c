use crate::error::{RemoteFsErrorKind, RemoteOp};
use crate::transport::{Connector, RemoteEntry, RemoteFs, RemoteSession};
use crate::{DeployError, Result};
use ssh2::{ErrorCode, ExtendedData, Session, Sftp};
use std::fmt;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, warn};

// SFTP status codes (draft-ietf-secsh-filexfer-02 / libssh2).
const FX_NO_SUCH_FILE: i32 = 2;
const FX_FILE_ALREADY_EXISTS: i32 = 11;

#[derive(Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Password-authenticated SSH over a plain TCP connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshConnector;

impl Connector for SshConnector {
    fn connect(&self, target: &SshTarget) -> Result<Box<dyn RemoteSession>> {
        Ok(Box::new(SshConnection::connect(target)?))
    }
}

pub struct SshConnection {
    session: Session,
    _tcp: TcpStream,
}

impl SshConnection {
    pub fn connect(target: &SshTarget) -> Result<Self> {
        let tcp = TcpStream::connect((target.host.as_str(), target.port))
            .map_err(|e| DeployError::Connection(format!("Failed to connect to {}:{}: {}", target.host, target.port, e)))?;

        let mut session = Session::new()
            .map_err(|e| DeployError::Connection(e.to_string()))?;

        session.set_tcp_stream(tcp.try_clone()?);
        session.handshake()
            .map_err(|e| DeployError::Connection(format!("Handshake failed: {}", e)))?;

        session.userauth_password(&target.user, &target.password)
            .map_err(|e| DeployError::Connection(format!("Password auth failed for {}: {}", target.user, e)))?;

        if !session.authenticated() {
            return Err(DeployError::Connection(format!("Authentication failed for {}", target.user)));
        }

        Ok(Self { session, _tcp: tcp })
    }
}

impl RemoteSession for SshConnection {
    fn open_sftp(&self) -> Result<Box<dyn RemoteFs>> {
        let sftp = self.session.sftp()
            .map_err(|e| DeployError::Channel(format!("SFTP init failed: {}", e)))?;
        Ok(Box::new(SftpFs { sftp }))
    }

    fn exec(&self, command: &str, output: &mut dyn FnMut(&str)) -> Result<()> {
        let mut channel = self.session.channel_session()
            .map_err(|e| DeployError::RemoteCommand(format!("Channel open failed: {}", e)))?;
        channel.handle_extended_data(ExtendedData::Merge)
            .map_err(|e| DeployError::RemoteCommand(format!("Failed to merge stderr: {}", e)))?;
        channel.exec(command)
            .map_err(|e| DeployError::RemoteCommand(format!("Exec failed: {}", e)))?;

        let mut buf = [0u8; 8192];
        let mut lines = LineBuffer::default();
        loop {
            let n = channel.read(&mut buf)
                .map_err(|e| DeployError::RemoteCommand(format!("Output stream of '{}' failed: {}", command, e)))?;
            if n == 0 {
                break;
            }
            lines.push(&buf[..n], output);
        }
        lines.finish(output);

        channel.wait_close()
            .map_err(|e| DeployError::RemoteCommand(format!("Channel close failed: {}", e)))?;

        // Exit status is informational only.
        match channel.exit_status() {
            Ok(0) => debug!("Command '{}' exited with code 0", command),
            Ok(code) => warn!("Command '{}' exited with code {}", command, code),
            Err(e) => debug!("No exit status for '{}': {}", command, e),
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.session.disconnect(None, "pisync finished", None)
            .map_err(|e| DeployError::Connection(format!("Disconnect failed: {}", e)))
    }
}

/// Holds back a partial line (or a split UTF-8 sequence) until the rest arrives.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8], output: &mut dyn FnMut(&str)) {
        self.pending.extend_from_slice(bytes);
        if let Some(last) = self.pending.iter().rposition(|b| *b == b'\n') {
            let complete: Vec<u8> = self.pending.drain(..=last).collect();
            output(&String::from_utf8_lossy(&complete));
        }
    }

    fn finish(self, output: &mut dyn FnMut(&str)) {
        if !self.pending.is_empty() {
            output(&String::from_utf8_lossy(&self.pending));
        }
    }
}

pub struct SftpFs {
    sftp: Sftp,
}

fn remote_error(op: RemoteOp, path: &Path, e: ssh2::Error) -> DeployError {
    let kind = match e.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE) => RemoteFsErrorKind::NotFound,
        ErrorCode::SFTP(FX_FILE_ALREADY_EXISTS) => RemoteFsErrorKind::AlreadyExists,
        _ => RemoteFsErrorKind::Other,
    };
    DeployError::remote_fs(op, path, kind, e.to_string())
}

impl RemoteFs for SftpFs {
    fn read_dir(&self, path: &Path) -> Result<Vec<RemoteEntry>> {
        let items = self.sftp.readdir(path)
            .map_err(|e| remote_error(RemoteOp::ReadDir, path, e))?;

        let mut entries = Vec::new();
        for (pb, stat) in items {
            let name = match pb.file_name() {
                Some(name) if name != "." && name != ".." => name,
                _ => continue,
            };
            entries.push(RemoteEntry {
                name: name.to_os_string(),
                is_dir: stat.is_dir(),
            });
        }
        Ok(entries)
    }

    fn mkdir(&self, path: &Path) -> Result<()> {
        match self.sftp.mkdir(path, 0o755) {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = remote_error(RemoteOp::Mkdir, path, e);
                if err.is_already_exists() {
                    return Err(err);
                }
                // OpenSSH reports EEXIST as a generic failure.
                if let Ok(Some(true)) = self.stat_is_dir(path) {
                    if let DeployError::RemoteFs { message, .. } = err {
                        return Err(DeployError::remote_fs(RemoteOp::Mkdir, path, RemoteFsErrorKind::AlreadyExists, message));
                    }
                }
                Err(err)
            }
        }
    }

    fn rmdir(&self, path: &Path) -> Result<()> {
        self.sftp.rmdir(path).map_err(|e| remote_error(RemoteOp::Rmdir, path, e))
    }

    fn unlink(&self, path: &Path) -> Result<()> {
        self.sftp.unlink(path).map_err(|e| remote_error(RemoteOp::Unlink, path, e))
    }

    fn upload(&self, local: &Path, remote: &Path) -> Result<()> {
        let mut local_file = std::fs::File::open(local)?;

        let mut remote_file = self.sftp.create(remote)
            .map_err(|e| remote_error(RemoteOp::Upload, remote, e))?;

        std::io::copy(&mut local_file, &mut remote_file).map_err(|e| {
            DeployError::remote_fs(RemoteOp::Upload, remote, RemoteFsErrorKind::Other, e.to_string())
        })?;

        Ok(())
    }

    fn stat_is_dir(&self, path: &Path) -> Result<Option<bool>> {
        match self.sftp.stat(path) {
            Ok(stat) => Ok(Some(stat.is_dir())),
            Err(e) => {
                let err = remote_error(RemoteOp::Stat, path, e);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.sftp.shutdown()
            .map_err(|e| DeployError::Channel(format!("SFTP shutdown failed: {}", e)))
    }
}
