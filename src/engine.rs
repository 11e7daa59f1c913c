use crate::config::DeployConfig;
use crate::remote::{create_dir, remove_dir_recursive, run_command, sync_files};
use crate::scanner::{DirectoryNode, LocalScanner};
use crate::transport::{Connector, RemoteFs, RemoteSession};
use crate::{DeployError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};

/// Wipe-and-reupload deploy of one local directory to one remote host.
pub struct DeployEngine<'a> {
    config: &'a DeployConfig,
    connector: &'a dyn Connector,
}

impl<'a> DeployEngine<'a> {
    pub fn new(config: &'a DeployConfig, connector: &'a dyn Connector) -> Self {
        Self { config, connector }
    }

    pub fn run(&self) -> Result<()> {
        // 1. Validate before touching the network
        let target = self.config.ssh_target()?;

        info!("Scanning local directory: {:?}", self.config.local_dir);
        let scanner = LocalScanner::new(&self.config.excludes)?;
        let tree = scanner.scan(&self.config.local_dir)?;
        info!("Found {} local files ({} bytes).", tree.file_count(), tree.total_size());

        // 2. Connect
        info!("Connecting to {}@{}...", target.user, target.host);
        let mut session = self.connector.connect(&target)?;
        info!("Connected.");

        let result = self.run_with_session(session.as_ref(), &tree);

        info!("Closing SSH connection...");
        if let Err(e) = session.close() {
            warn!("Failed to close SSH connection: {}", e);
        }

        match &result {
            Ok(()) => info!("Deploy completed successfully."),
            Err(e) => tracing::error!("Deploy failed: {}", e),
        }
        result
    }

    fn run_with_session(&self, session: &dyn RemoteSession, tree: &DirectoryNode) -> Result<()> {
        info!("Establishing SFTP connection...");
        let mut sftp = session.open_sftp()?;
        info!("SFTP connection established.");

        let result = self
            .mirror(sftp.as_ref(), tree)
            .and_then(|()| self.run_commands(session));

        info!("Closing SFTP connection...");
        if let Err(e) = sftp.close() {
            warn!("Failed to close SFTP channel: {}", e);
        }
        result
    }

    fn mirror(&self, sftp: &dyn RemoteFs, tree: &DirectoryNode) -> Result<()> {
        let remote_dir = self.config.remote_dir.as_path();

        // 3. Remove existing copy
        info!("Removing existing remote directory: {:?}", remote_dir);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallel)
            .build()
            .map_err(|e| {
                let reason = format!("Failed to build thread pool: {}", e);
                DeployError::Io(std::io::Error::new(std::io::ErrorKind::Other, reason))
            })?;
        pool.install(|| remove_dir_recursive(sftp, remote_dir))?;

        // 4. Recreate it
        info!("Creating remote directory: {:?}", remote_dir);
        create_dir(sftp, remote_dir, self.config.create_parents)?;

        // 5. Upload
        info!("Starting file synchronization...");
        let pb = self.progress_bar(tree.file_count());
        sync_files(sftp, tree, remote_dir, Path::new(""), pb.as_ref())?;
        if let Some(pb) = &pb {
            pb.finish_with_message("Done");
        }
        info!("File synchronization completed.");
        Ok(())
    }

    // 6. Install, then start
    fn run_commands(&self, session: &dyn RemoteSession) -> Result<()> {
        for command in &self.config.commands {
            run_command(session, &self.config.remote_dir, command)?;
        }
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.config.progress {
            return None;
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            pb.set_style(style);
        }
        Some(pb)
    }
}
