use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{Datelike, Utc};

use super::BlobStore;
use crate::error::StorageError;

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Stores blobs as files below a root directory, bucketed by date:
/// `{root}/{prefix}/YYYY/MM/DD/{name}`. References are the path relative
/// to the root, always with `/` separators.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a reference back to a path inside the root, refusing anything
    /// absolute or containing `..`.
    fn resolve(&self, blob_ref: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(blob_ref);
        let clean = !blob_ref.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(StorageError::InvalidRef(blob_ref.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Creates the file with `create_new`, appending `_2`, `_3`, ... to the
    /// stem until a free name is found. Returns the chosen file name.
    fn create_exclusive(
        &self,
        dir: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<String, StorageError> {
        let (stem, ext) = match filename.rfind('.') {
            Some(dot) if dot > 0 => (&filename[..dot], Some(&filename[dot..])),
            _ => (filename, None),
        };

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let candidate = match (counter, ext) {
                (1, _) => filename.to_string(),
                (n, Some(ext)) => format!("{}_{}{}", stem, n, ext),
                (n, None) => format!("{}_{}", stem, n),
            };
            let path = dir.join(&candidate);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: path.clone(),
                            source: e,
                        })?;
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::WriteFile { path, source: e }),
            }
        }

        Err(StorageError::NameExhausted(dir.join(filename)))
    }
}

/// Keeps only the final path component and replaces characters that are
/// awkward in file names.
fn safe_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "blob".to_string()
    } else {
        trimmed.to_string()
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, blob_ref: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(blob_ref)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadBlob {
            blob: blob_ref.to_string(),
            source: e,
        })
    }

    fn write(&self, prefix: &str, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let now = Utc::now();
        let bucket = format!(
            "{}/{:04}/{:02}/{:02}",
            prefix.trim_matches('/'),
            now.year(),
            now.month(),
            now.day()
        );
        let dir = self.resolve(&bucket)?;
        self.ensure_directory(&dir)?;

        let stored = self.create_exclusive(&dir, &safe_file_name(name), bytes)?;
        let blob_ref = format!("{}/{}", bucket, stored);
        log::debug!("Stored blob {} ({} bytes)", blob_ref, bytes.len());
        Ok(blob_ref)
    }

    fn delete(&self, blob_ref: &str) -> Result<(), StorageError> {
        let path = self.resolve(blob_ref)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Deleted blob {}", blob_ref);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteBlob {
                blob: blob_ref.to_string(),
                source: e,
            }),
        }
    }
}
