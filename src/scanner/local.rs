use crate::scanner::DirectoryNode;
use crate::{DeployError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

pub struct LocalScanner {
    excludes: GlobSet,
}

impl LocalScanner {
    /// Patterns are matched against entry names only, so `node_modules`
    /// skips that folder at any depth.
    pub fn new(excludes: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excludes {
            let glob = Glob::new(pattern)
                .map_err(|e| DeployError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e)))?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .map_err(|e| DeployError::Config(e.to_string()))?;
        Ok(Self { excludes })
    }

    pub fn is_excluded(&self, name: impl AsRef<Path>) -> bool {
        self.excludes.is_match(name)
    }

    pub fn scan(&self, path: &Path) -> Result<DirectoryNode> {
        let root = path.canonicalize()?;
        if !root.is_dir() {
            return Err(DeployError::Config(format!("Source is not a directory: {:?}", path)));
        }

        let name = root
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let children = self.scan_dir(&root)?;

        Ok(DirectoryNode::Directory { name, path: root, children })
    }

    fn scan_dir(&self, dir: &Path) -> Result<Vec<DirectoryNode>> {
        let mut nodes = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            let name = entry.file_name().to_os_string();

            if self.is_excluded(&name) {
                tracing::debug!("Skipping excluded entry {:?}", entry.path());
                continue;
            }

            let p = entry.path().to_path_buf();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let children = self.scan_dir(&p)?;
                nodes.push(DirectoryNode::Directory { name, path: p, children });
            } else if file_type.is_file() {
                let size = entry.metadata()?.len();
                nodes.push(DirectoryNode::File { name, path: p, size });
            } else if file_type.is_symlink() {
                // Linked files are uploaded by content; linked directories are not walked.
                match std::fs::metadata(&p) {
                    Ok(meta) if meta.is_file() => {
                        nodes.push(DirectoryNode::File { name, path: p, size: meta.len() });
                    }
                    Ok(_) => tracing::warn!("Skipping symlinked directory {:?}", p),
                    Err(e) => tracing::warn!("Skipping broken symlink {:?}: {}", p, e),
                }
            }
        }

        Ok(nodes)
    }
}
