//! JSON persistence for todos
//!
//! Writes go to `<file>.tmp` first and are renamed over the data file, after the
//! previous version has been rotated into `<file>.backup`, `<file>.backup.1`,
//! ... `<file>.backup.N`. A damaged data file is recovered from the newest
//! readable backup.

use crate::git_ops::GitSync;
use crate::todo::{Todo, TodoFile};
use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Data files larger than this are treated as damaged
const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

pub const DEFAULT_BACKUP_COUNT: usize = 5;

pub struct Storage {
    file_path: PathBuf,
    backup_count: usize,
    git: GitSync,
    last_hash: Option<String>,
}

impl Storage {
    pub fn new(file_path: impl AsRef<Path>, backup_count: usize, sync_git: bool) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let git = if sync_git {
            GitSync::discover(&file_path)
        } else {
            GitSync::disabled()
        };
        if sync_git && !git.is_git_managed() {
            log::warn!(
                "Git sync requested but {} is not inside a git repository",
                file_path.display()
            );
        }

        Self {
            file_path,
            backup_count,
            git,
            last_hash: None,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// `<file><suffix>`, e.g. `todos.json.backup`
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.file_path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn primary_backup(&self) -> PathBuf {
        self.sibling(".backup")
    }

    fn numbered_backup(&self, n: usize) -> PathBuf {
        self.sibling(&format!(".backup.{}", n))
    }

    /// Every backup location, newest first
    fn backup_paths(&self) -> Vec<PathBuf> {
        if self.backup_count == 0 {
            return Vec::new();
        }
        std::iter::once(self.primary_backup())
            .chain((1..=self.backup_count).map(|n| self.numbered_backup(n)))
            .collect()
    }

    /// Backups that currently exist, newest first
    pub fn list_backups(&self) -> Vec<PathBuf> {
        self.backup_paths()
            .into_iter()
            .filter(|p| p.is_file())
            .collect()
    }

    pub fn ensure_data_directory(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        Ok(())
    }

    pub fn file_exists(&self) -> bool {
        self.file_path.is_file()
    }

    /// Write a document with no todos
    pub fn create_empty_file(&mut self) -> Result<()> {
        self.write_document(&TodoFile::empty())
    }

    fn rotate_backups(&self) -> Result<()> {
        if self.backup_count == 0 || !self.file_exists() {
            return Ok(());
        }

        let oldest = self.numbered_backup(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.backup_count).rev() {
            let from = self.numbered_backup(n);
            if from.exists() {
                fs::rename(&from, self.numbered_backup(n + 1))?;
            }
        }

        let primary = self.primary_backup();
        if primary.exists() {
            fs::rename(&primary, self.numbered_backup(1))?;
        }
        fs::copy(&self.file_path, &primary)?;
        Ok(())
    }

    fn write_document(&mut self, file: &TodoFile) -> Result<()> {
        self.ensure_data_directory()?;
        let content = file.to_json_string()?;

        if let Err(e) = self.rotate_backups() {
            log::warn!("Failed to rotate backups: {}", e);
        }

        let tmp = self.sibling(".tmp");
        let written = fs::write(&tmp, &content).and_then(|_| fs::rename(&tmp, &self.file_path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e)
                .with_context(|| format!("Failed to write {}", self.file_path.display()));
        }

        self.last_hash = Some(Self::data_hash(&file.todos)?);
        Ok(())
    }

    /// Save all todos, then commit the file when git sync is on
    pub fn save(&mut self, todos: &[Todo]) -> Result<()> {
        self.save_with_message(todos, "Update todos")
    }

    pub fn save_with_message(&mut self, todos: &[Todo], message: &str) -> Result<()> {
        self.write_document(&TodoFile::from_todos(todos.to_vec()))?;
        log::debug!("Saved {} todo(s) to {}", todos.len(), self.file_path.display());

        if self.git.is_git_managed()
            && let Err(e) = self.git.commit(&self.file_path, message)
        {
            log::warn!("Git commit failed: {:#}", e);
        }
        Ok(())
    }

    /// Save only when `todos` differ from what was last read or written
    ///
    /// Returns whether the file was written.
    pub fn save_if_changed(&mut self, todos: &[Todo]) -> Result<bool> {
        let hash = Self::data_hash(todos)?;
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            return Ok(false);
        }
        self.save(todos)?;
        Ok(true)
    }

    /// SHA-256 of the serialised todos, as lowercase hex
    pub fn data_hash(todos: &[Todo]) -> Result<String> {
        let json = serde_json::to_vec(todos).context("Failed to serialize todos")?;
        let digest = Sha256::digest(&json);
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Load all todos, recovering from damage where possible
    ///
    /// A missing or empty file is replaced with an empty document. Documents
    /// that were migrated or repaired while reading are written back.
    pub fn load(&mut self) -> Result<Vec<Todo>> {
        if self.git.is_git_managed()
            && let Err(e) = self.git.pull()
        {
            log::warn!("Git pull failed: {:#}", e);
        }

        if !self.file_exists() {
            if let Err(e) = self.create_empty_file() {
                log::warn!("Failed to create data file, working in memory only: {:#}", e);
            }
            return Ok(Vec::new());
        }

        let size = match fs::metadata(&self.file_path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("Failed to inspect {}: {}", self.file_path.display(), e);
                return self.restore_from_backup();
            }
        };
        if size == 0 {
            log::warn!("Data file is empty, creating a new one");
            self.create_empty_file()?;
            return Ok(Vec::new());
        }
        if size > MAX_FILE_SIZE {
            log::warn!("Data file is too large ({} bytes), restoring from backup", size);
            return self.restore_from_backup();
        }

        match Self::read_document(&self.file_path) {
            Ok((file, report)) => {
                if report.needs_save() {
                    if let Err(e) = self.save_with_message(&file.todos, "Upgrade todo data") {
                        log::warn!("Failed to write upgraded data file: {:#}", e);
                    }
                } else {
                    self.last_hash = Some(Self::data_hash(&file.todos)?);
                }
                Ok(file.todos)
            }
            Err(e) => {
                log::warn!("Data file is damaged ({:#}), restoring from backup", e);
                self.restore_from_backup()
            }
        }
    }

    fn read_document(path: &Path) -> Result<(TodoFile, crate::todo::LoadReport)> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        TodoFile::from_json_str(&content)
    }

    /// Replace the data file with the newest readable backup
    ///
    /// Writes an empty document when no backup can be read.
    pub fn restore_from_backup(&mut self) -> Result<Vec<Todo>> {
        for backup in self.list_backups() {
            match Self::read_document(&backup) {
                Ok((file, report)) => {
                    fs::copy(&backup, &self.file_path).with_context(|| {
                        format!("Failed to restore {}", self.file_path.display())
                    })?;
                    log::warn!("Restored todos from {}", backup.display());
                    if report.needs_save() {
                        self.save(&file.todos)?;
                    } else {
                        self.last_hash = Some(Self::data_hash(&file.todos)?);
                    }
                    return Ok(file.todos);
                }
                Err(e) => {
                    log::debug!("Backup {} is unusable: {:#}", backup.display(), e);
                }
            }
        }

        log::warn!("No usable backup found, starting with an empty todo list");
        self.create_empty_file()?;
        Ok(Vec::new())
    }

    fn stored_counter(&self, key: &str) -> Option<u32> {
        let content = fs::read_to_string(&self.file_path).ok()?;
        let value: Value = serde_json::from_str(&content).ok()?;
        Some(
            value
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(1),
        )
    }

    /// Next todo id recorded in the data file
    ///
    /// Falls back to the largest loaded id + 1 when the file cannot be read.
    pub fn next_id(&mut self) -> Result<u32> {
        if !self.file_exists() {
            return Ok(1);
        }
        match self.stored_counter("next_id") {
            Some(id) => Ok(id),
            None => {
                let todos = self.load()?;
                Ok(todos.iter().map(|t| t.id).max().unwrap_or(0).saturating_add(1))
            }
        }
    }

    /// Next subtask id recorded in the data file
    pub fn next_subtask_id(&mut self) -> Result<u32> {
        if !self.file_exists() {
            return Ok(1);
        }
        match self.stored_counter("next_subtask_id") {
            Some(id) => Ok(id),
            None => {
                let todos = self.load()?;
                Ok(todos
                    .iter()
                    .flat_map(|t| t.subtasks.iter().map(|s| s.id))
                    .max()
                    .unwrap_or(0)
                    .saturating_add(1))
            }
        }
    }

    /// Push committed changes before exit
    pub fn shutdown(&self) -> Result<()> {
        if self.git.is_git_managed() {
            self.git.push().context("Failed to push todo data")?;
        }
        Ok(())
    }
}
