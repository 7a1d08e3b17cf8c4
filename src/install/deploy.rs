//! Application file deployment and removal

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::config::{FileEntry, SetupConfig};
use crate::error::{Result, SetupError};

/// Places the application's files and removes them again
pub trait Deployment {
    /// Copy every file into place; returns how many were copied
    fn deploy(&self) -> Result<usize>;

    /// Remove the whole installation directory tree
    fn remove(&self) -> Result<()>;
}

/// Copies (and renames) payload files into subdirectories of the install directory
#[derive(Debug, Clone)]
pub struct FileDeployer {
    payload_dir: PathBuf,
    install_dir: PathBuf,
    files: Vec<FileEntry>,
}

impl FileDeployer {
    pub fn new(payload_dir: impl Into<PathBuf>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            payload_dir: payload_dir.into(),
            install_dir: install_dir.into(),
            files: Vec::new(),
        }
    }

    pub fn from_config(config: &SetupConfig) -> Self {
        Self::new(config.payload_dir(), &config.install_dir).with_files(config.files.iter().cloned())
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = FileEntry>) -> Self {
        self.files.extend(files);
        self
    }

    /// Also copy `source` (absolute or payload-relative) to `target`
    pub fn with_file(mut self, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.files.push(FileEntry {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    fn copy_entry(&self, entry: &FileEntry) -> Result<()> {
        let from = self.payload_dir.join(&entry.source);
        let to = self.install_dir.join(&entry.target);

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &to).map_err(|source| SetupError::Copy {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        debug!("Copied {} -> {}", from.display(), to.display());
        Ok(())
    }
}

impl Deployment for FileDeployer {
    fn deploy(&self) -> Result<usize> {
        fs::create_dir_all(&self.install_dir)?;

        let mut copied = 0;
        let mut first_error = None;
        for entry in &self.files {
            match self.copy_entry(entry) {
                Ok(()) => copied += 1,
                Err(e) => {
                    warn!("{e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(
            "Deployed {copied}/{} files to {}",
            self.files.len(),
            self.install_dir.display()
        );
        match first_error {
            Some(e) => Err(e),
            None => Ok(copied),
        }
    }

    fn remove(&self) -> Result<()> {
        // never recurse from a filesystem root
        if self.install_dir.parent().is_none() {
            return Err(SetupError::Config(format!(
                "Refusing to remove {}",
                self.install_dir.display()
            )));
        }
        if !self.install_dir.exists() {
            info!("{} already removed", self.install_dir.display());
            return Ok(());
        }
        fs::remove_dir_all(&self.install_dir)?;
        info!("Removed directory: {}", self.install_dir.display());
        Ok(())
    }
}
