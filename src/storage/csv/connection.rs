use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// CsvConnection manages the data directory that holds one CSV file per
/// record collection plus the YAML settings documents.
///
/// The connection itself holds no file handles; repositories resolve their
/// collection paths through it and open files per operation.
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {:?}", base_path);
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a new CSV connection in the default data directory,
    /// `Documents/Cattery Tracker` (falling back to the home directory when
    /// no Documents folder exists on this platform).
    pub fn new_default() -> Result<Self> {
        let parent = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory"))?;

        Self::new(parent.join("Cattery Tracker"))
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Get the path of one collection file inside the data directory
    pub fn collection_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }
}
