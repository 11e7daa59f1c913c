use crate::remote::tree::create_dir;
use crate::scanner::DirectoryNode;
use crate::transport::RemoteFs;
use crate::{DeployError, Result};
use indicatif::ProgressBar;
use std::path::Path;
use tracing::{debug, error};

/// Upload the children of `node` into `remote_dir`, one entry at a time.
///
/// `rel` is the path of `node` relative to the sync root and is what a
/// failure reports.
pub fn sync_files(
    fs: &dyn RemoteFs,
    node: &DirectoryNode,
    remote_dir: &Path,
    rel: &Path,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    debug!("Scanning directory: {:?} ({} items)", rel, node.children().len());

    for child in node.children() {
        let rel_path = rel.join(child.name());
        let remote_path = remote_dir.join(child.name());

        let wrap = |e: DeployError| {
            error!("Sync error for {:?}: {}", rel_path, e);
            DeployError::Sync { path: rel_path.clone(), source: Box::new(e) }
        };

        match child {
            DirectoryNode::Directory { .. } => {
                debug!("Creating directory: {:?}", rel_path);
                create_dir(fs, &remote_path, false).map_err(wrap)?;
                sync_files(fs, child, &remote_path, &rel_path, pb)?;
            }
            DirectoryNode::File { size, .. } => {
                if let Some(pb) = pb {
                    pb.set_message(format!("Uploading {}", rel_path.display()));
                }
                debug!("Uploading file: {:?} ({} bytes)", rel_path, size);
                fs.upload(child.path(), &remote_path).map_err(wrap)?;
                if let Some(pb) = pb {
                    pb.inc(1);
                }
            }
        }
    }
    Ok(())
}
