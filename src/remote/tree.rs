use crate::transport::RemoteFs;
use crate::Result;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, error, info};

/// Remove `dir` and everything below it.
///
/// A missing directory counts as already removed. Entries of one directory
/// are removed in parallel on the current rayon pool; the directory itself
/// is removed once all of them are gone. The first error aborts the walk.
pub fn remove_dir_recursive(fs: &dyn RemoteFs, dir: &Path) -> Result<()> {
    debug!("Checking directory: {:?}", dir);

    let entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => {
            info!("Directory not found, nothing to remove: {:?}", dir);
            return Ok(());
        }
        Err(e) => {
            error!("Failed to list {:?}: {}", dir, e);
            return Err(e);
        }
    };

    entries.par_iter().try_for_each(|entry| {
        let child = dir.join(&entry.name);
        if entry.is_dir {
            remove_dir_recursive(fs, &child)
        } else {
            debug!("Removing file: {:?}", child);
            fs.unlink(&child).map_err(|e| {
                error!("Error removing file {:?}: {}", child, e);
                e
            })
        }
    })?;

    fs.rmdir(dir).map_err(|e| {
        error!("Error removing directory {:?}: {}", dir, e);
        e
    })?;
    debug!("Removed directory: {:?}", dir);
    Ok(())
}

/// Create `path`; an existing directory is fine.
///
/// With `create_parents` missing ancestors are created first, otherwise
/// they must already exist.
pub fn create_dir(fs: &dyn RemoteFs, path: &Path, create_parents: bool) -> Result<()> {
    if create_parents {
        if let Some(parent) = path.parent() {
            // Avoid infinite recursion at the root
            if parent != path && !parent.as_os_str().is_empty() && fs.stat_is_dir(parent)?.is_none() {
                create_dir(fs, parent, true)?;
            }
        }
    }

    match fs.mkdir(path) {
        Ok(()) => {
            debug!("Created directory: {:?}", path);
            Ok(())
        }
        Err(e) if e.is_already_exists() => {
            debug!("Directory already exists: {:?}", path);
            Ok(())
        }
        Err(e) => {
            error!("Error creating directory {:?}: {}", path, e);
            Err(e)
        }
    }
}
