#![allow(dead_code)]

use pisync::config::DeployConfig;
use pisync::error::{RemoteFsErrorKind, RemoteOp};
use pisync::transport::{Connector, RemoteEntry, RemoteFs, RemoteSession, SshTarget};
use pisync::{DeployError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

/// In-memory remote host: a flat map of absolute paths plus a call log.
pub struct MockRemote {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
    calls: Mutex<Vec<String>>,
    pub connects: AtomicUsize,
    pub sftp_closed: AtomicBool,
    pub session_closed: AtomicBool,
    pub fail_unlink: Mutex<Option<PathBuf>>,
    pub fail_upload: Mutex<Option<PathBuf>>,
    pub fail_exec: Mutex<Option<String>>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        let remote = Self {
            nodes: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            sftp_closed: AtomicBool::new(false),
            session_closed: AtomicBool::new(false),
            fail_unlink: Mutex::new(None),
            fail_upload: Mutex::new(None),
            fail_exec: Mutex::new(None),
        };
        for dir in ["/", "/home", "/home/pi"] {
            remote.add_dir(dir);
        }
        Arc::new(remote)
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.nodes.lock().unwrap().insert(path.into(), Node::Dir);
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: &str) {
        self.nodes.lock().unwrap().insert(path.into(), Node::File(content.as_bytes().to_vec()));
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.nodes.lock().unwrap().contains_key(path.as_ref())
    }

    /// Files below `root`, keyed by relative path.
    pub fn files_under(&self, root: impl AsRef<Path>) -> BTreeMap<String, String> {
        let root = root.as_ref();
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(path, node)| match node {
                Node::File(bytes) => path.strip_prefix(root).ok().map(|rel| {
                    (rel.to_string_lossy().to_string(), String::from_utf8_lossy(bytes).to_string())
                }),
                Node::Dir => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn node(&self, path: &Path) -> Option<Node> {
        self.nodes.lock().unwrap().get(path).cloned()
    }

    fn has_children(&self, path: &Path) -> bool {
        self.nodes.lock().unwrap().keys().any(|p| p.parent() == Some(path))
    }
}

pub struct MockConnector(pub Arc<MockRemote>);

impl Connector for MockConnector {
    fn connect(&self, target: &SshTarget) -> Result<Box<dyn RemoteSession>> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        self.0.record(format!("connect {}@{}", target.user, target.host));
        Ok(Box::new(MockSession(self.0.clone())))
    }
}

struct MockSession(Arc<MockRemote>);

impl RemoteSession for MockSession {
    fn open_sftp(&self) -> Result<Box<dyn RemoteFs>> {
        self.0.record("open_sftp".into());
        Ok(Box::new(MockFs(self.0.clone())))
    }

    fn exec(&self, command: &str, output: &mut dyn FnMut(&str)) -> Result<()> {
        self.0.record(format!("exec {}", command));
        let failing = self.0.fail_exec.lock().unwrap().clone();
        if let Some(pattern) = failing {
            if command.contains(&pattern) {
                output("partial output\n");
                return Err(DeployError::RemoteCommand("stream reset".into()));
            }
        }
        output("done\n");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.0.record("close_session".into());
        self.0.session_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct MockFs(Arc<MockRemote>);

fn fs_err(op: RemoteOp, path: &Path, kind: RemoteFsErrorKind, message: &str) -> DeployError {
    DeployError::remote_fs(op, path, kind, message)
}

impl RemoteFs for MockFs {
    fn read_dir(&self, path: &Path) -> Result<Vec<RemoteEntry>> {
        self.0.record(format!("read_dir {}", path.display()));
        match self.0.node(path) {
            None => Err(fs_err(RemoteOp::ReadDir, path, RemoteFsErrorKind::NotFound, "no such file")),
            Some(Node::File(_)) => Err(fs_err(RemoteOp::ReadDir, path, RemoteFsErrorKind::Other, "not a directory")),
            Some(Node::Dir) => Ok(self
                .0
                .nodes
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p.parent() == Some(path) && p.as_path() != path)
                .map(|(p, node)| RemoteEntry {
                    name: p.file_name().unwrap().to_os_string(),
                    is_dir: *node == Node::Dir,
                })
                .collect()),
        }
    }

    fn mkdir(&self, path: &Path) -> Result<()> {
        self.0.record(format!("mkdir {}", path.display()));
        if self.0.exists(path) {
            return Err(fs_err(RemoteOp::Mkdir, path, RemoteFsErrorKind::AlreadyExists, "exists"));
        }
        match path.parent().and_then(|p| self.0.node(p)) {
            Some(Node::Dir) => {
                self.0.add_dir(path);
                Ok(())
            }
            _ => Err(fs_err(RemoteOp::Mkdir, path, RemoteFsErrorKind::NotFound, "no such file")),
        }
    }

    fn rmdir(&self, path: &Path) -> Result<()> {
        self.0.record(format!("rmdir {}", path.display()));
        if self.0.node(path) != Some(Node::Dir) || self.0.has_children(path) {
            return Err(fs_err(RemoteOp::Rmdir, path, RemoteFsErrorKind::Other, "failure"));
        }
        self.0.nodes.lock().unwrap().remove(path);
        Ok(())
    }

    fn unlink(&self, path: &Path) -> Result<()> {
        self.0.record(format!("unlink {}", path.display()));
        if self.0.fail_unlink.lock().unwrap().as_deref() == Some(path) {
            return Err(fs_err(RemoteOp::Unlink, path, RemoteFsErrorKind::Other, "permission denied"));
        }
        match self.0.node(path) {
            Some(Node::File(_)) => {
                self.0.nodes.lock().unwrap().remove(path);
                Ok(())
            }
            _ => Err(fs_err(RemoteOp::Unlink, path, RemoteFsErrorKind::NotFound, "no such file")),
        }
    }

    fn upload(&self, local: &Path, remote: &Path) -> Result<()> {
        self.0.record(format!("upload {}", remote.display()));
        if self.0.fail_upload.lock().unwrap().as_deref() == Some(remote) {
            return Err(fs_err(RemoteOp::Upload, remote, RemoteFsErrorKind::Other, "disk full"));
        }
        if remote.parent().and_then(|p| self.0.node(p)) != Some(Node::Dir) {
            return Err(fs_err(RemoteOp::Upload, remote, RemoteFsErrorKind::NotFound, "no such file"));
        }
        let bytes = std::fs::read(local)?;
        self.0.nodes.lock().unwrap().insert(remote.to_path_buf(), Node::File(bytes));
        Ok(())
    }

    fn stat_is_dir(&self, path: &Path) -> Result<Option<bool>> {
        Ok(self.0.node(path).map(|n| n == Node::Dir))
    }

    fn close(&mut self) -> Result<()> {
        self.0.record("close_sftp".into());
        self.0.sftp_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn deploy_config(local_dir: &Path, remote_dir: &str) -> DeployConfig {
    DeployConfig {
        host: "raspberrypi.local".into(),
        port: 22,
        username: "pi".into(),
        password: Some("raspberry".into()),
        local_dir: local_dir.to_path_buf(),
        remote_dir: remote_dir.into(),
        commands: vec!["npm install".into(), "npm run start".into()],
        excludes: vec![],
        create_parents: false,
        parallel: 4,
        progress: false,
    }
}

/// Write `files` (relative path, content) under `root`, creating folders.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}
