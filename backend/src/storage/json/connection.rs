use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// JsonConnection manages the data directory and the registrations file path
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Create a new connection, creating the data directory if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Path of the single file holding the registration collection
    pub fn registrations_file_path(&self) -> PathBuf {
        self.base_directory.join("registrations.json")
    }

    /// Ensure the registrations file exists as a valid empty collection
    pub fn ensure_registrations_file_exists(&self) -> Result<()> {
        let file_path = self.registrations_file_path();

        if !file_path.exists() {
            fs::write(&file_path, "[]\n")?;
        }

        Ok(())
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }
}
