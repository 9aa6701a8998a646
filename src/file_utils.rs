use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Lowercased extension of a file name, without the dot
    pub fn extension_of(file_name: &str) -> String {
        Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Whether `name` is a bare file name that cannot escape its directory
    pub fn is_plain_file_name(name: &str) -> bool {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return false;
        }
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }

    /// Resolve a downloadable file inside `dir`, or `None` if it is absent or unsafe
    pub fn resolve_in_dir<P: AsRef<Path>>(dir: P, name: &str) -> Option<PathBuf> {
        if !Self::is_plain_file_name(name) {
            return None;
        }
        let path = dir.as_ref().join(name);
        Self::file_exists(&path).then_some(path)
    }
}
