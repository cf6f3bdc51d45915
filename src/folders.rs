//! Per-todo folders
//!
//! Every todo owns a directory under the folders base directory where the user
//! keeps related files. Deletion is restricted to paths inside that base.

use crate::todo::Todo;
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(windows)]
const MAX_PATH_LENGTH: usize = 260;
#[cfg(not(windows))]
const MAX_PATH_LENGTH: usize = 4096;

pub struct FolderService {
    base: PathBuf,
}

/// Absolute form of `path`, resolving symlinks when it exists
fn resolve(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(_) => std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display())),
    }
}

#[cfg(unix)]
fn make_writable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o700);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_writable(path: &Path) -> std::io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}

/// Clear read-only flags on a directory tree so it can be removed
fn make_tree_writable(path: &Path) -> std::io::Result<()> {
    make_writable(path)?;
    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            make_tree_writable(&entry?.path())?;
        }
    }
    Ok(())
}

impl FolderService {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn ensure_base_folder(&self) -> Result<()> {
        fs::create_dir_all(&self.base)
            .with_context(|| format!("Failed to create folder {}", self.base.display()))
    }

    pub fn todo_folder_path(&self, todo: &Todo) -> PathBuf {
        self.base.join(todo.folder_name())
    }

    /// Create the todo's folder and return its path
    ///
    /// Creating a folder that already exists succeeds.
    pub fn create_todo_folder(&self, todo: &Todo) -> Result<PathBuf> {
        let path = self.todo_folder_path(todo);

        let length = path.to_string_lossy().chars().count();
        if length > MAX_PATH_LENGTH {
            bail!(
                "Folder path is too long ({} > {}): {}",
                length,
                MAX_PATH_LENGTH,
                path.display()
            );
        }

        if path.exists() && !path.is_dir() {
            bail!("A file with the same name already exists: {}", path.display());
        }

        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create folder {}", path.display()))?;
        log::debug!("Created todo folder {}", path.display());
        Ok(path)
    }

    /// Remove a todo folder and everything in it
    ///
    /// Only directories strictly inside the base directory are removed.
    pub fn delete_todo_folder(&self, folder_path: &str) -> Result<()> {
        if folder_path.trim().is_empty() {
            bail!("Folder path is empty");
        }
        let path = Path::new(folder_path);

        let base = resolve(&self.base)?;
        let target = resolve(path)?;
        if !target.starts_with(&base) || target == base {
            bail!(
                "Refusing to delete {} outside of {}",
                path.display(),
                self.base.display()
            );
        }

        if !path.exists() {
            bail!("Folder does not exist: {}", path.display());
        }
        if !path.is_dir() {
            bail!("Not a folder: {}", path.display());
        }

        match fs::remove_dir_all(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                log::debug!("Clearing read-only flags under {}", path.display());
                make_tree_writable(path)
                    .and_then(|_| fs::remove_dir_all(path))
                    .with_context(|| format!("Failed to delete folder {}", path.display()))?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to delete folder {}", path.display()));
            }
        }

        log::debug!("Deleted todo folder {}", path.display());
        Ok(())
    }

    /// Open a folder in the platform file browser
    pub fn open_todo_folder(&self, folder_path: &str) -> Result<()> {
        if !self.folder_exists(folder_path) {
            bail!("Folder does not exist: {}", folder_path);
        }

        let opener = if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };

        let status = Command::new(opener)
            .arg(folder_path)
            .status()
            .with_context(|| format!("Failed to run {}", opener))?;

        // explorer.exe reports a non-zero status even when it succeeds
        if !status.success() && !cfg!(target_os = "windows") {
            bail!("{} exited with {}", opener, status);
        }
        Ok(())
    }

    pub fn folder_exists(&self, folder_path: &str) -> bool {
        !folder_path.is_empty() && Path::new(folder_path).is_dir()
    }
}
