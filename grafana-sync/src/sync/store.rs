use std::io;
use std::path::{Path, PathBuf};

use grafana_sync_core::Dashboard;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid dashboard json in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} already exists and is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Filesystem side of a sync pass: a root directory holding loose
/// dashboard files and one level of folder directories.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Immediate children of `path`, sorted by name so staging order is
    /// deterministic across filesystems.
    pub async fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, StoreError> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut entries = Vec::new();
        loop {
            let entry = reader.next_entry().await.map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let file_type = entry.file_type().await.map_err(|source| StoreError::Io {
                path: entry.path(),
                source,
            })?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub async fn ensure_directory(&self, path: &Path) -> Result<(), StoreError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::NotADirectory {
                path: path.to_path_buf(),
            }),
            Err(_) => tokio::fs::create_dir_all(path)
                .await
                .map_err(|source| StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                }),
        }
    }

    pub async fn load_document(&self, path: &Path) -> Result<Dashboard, StoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub async fn save_document(&self, path: &Path, dashboard: &Dashboard) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(dashboard).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
