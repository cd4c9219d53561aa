use std::future::Future;
use std::path::PathBuf;

use grafana_sync_core::{
    Dashboard, DashboardWrite, GrafanaClient, GrafanaError, RewriteError, set_panel_datasources,
};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::folders::{FolderCache, resolve_folder};
use super::store::{LocalStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("api error: {0}")]
    Api(#[from] GrafanaError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to rewrite datasources in {}: {source}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: RewriteError,
    },
    #[error("directory {entry} nested inside folder {folder}")]
    NestedDirectory { folder: String, entry: String },
    #[error("sync cancelled")]
    Cancelled,
}

struct StagedDashboard {
    path: PathBuf,
    folder_id: i64,
    dashboard: Dashboard,
}

pub struct SyncEngine {
    client: GrafanaClient,
    store: LocalStore,
    cancel: CancellationToken,
}

impl SyncEngine {
    pub fn new(client: GrafanaClient, store: LocalStore, cancel: CancellationToken) -> Self {
        Self {
            client,
            store,
            cancel,
        }
    }

    /// Mirrors every remote dashboard into `root/<folder>/<title>.json`,
    /// one directory per remote folder. A non-empty `sync_folders` list
    /// restricts the pass to those folder titles.
    pub async fn pull(&self, sync_folders: &[String]) -> Result<usize, EngineError> {
        let refs = self.remote(self.client.list_dashboard_refs()).await?;

        let mut written = 0;
        for dashboard_ref in refs {
            if !sync_folders.is_empty() && !sync_folders.contains(&dashboard_ref.folder_title) {
                eprintln!(
                    "[grafana-sync] not syncing folder {:?}",
                    dashboard_ref.folder_title
                );
                continue;
            }

            // Folderless dashboards carry an empty title and land in the
            // root itself.
            let folder_dir = self.store.root().join(&dashboard_ref.folder_title);
            self.store.ensure_directory(&folder_dir).await?;

            let mut dashboard = self
                .remote(self.client.get_dashboard(&dashboard_ref.uid))
                .await?;
            // A pushed copy must create-or-update by title, not collide on
            // the remote identity it was fetched under.
            dashboard.insert("id".to_string(), Value::Null);

            let target = folder_dir.join(format!("{}.json", dashboard_ref.title));
            self.store.save_document(&target, &dashboard).await?;
            written += 1;
        }

        Ok(written)
    }

    /// Publishes the local tree: loose files at folder id 0 first, then
    /// each folder directory after resolving (or creating) its remote
    /// folder. With a datasource override every staged document is
    /// rewritten before the first upload.
    pub async fn push(&self, datasource: Option<&str>) -> Result<usize, EngineError> {
        let entries = self.store.list_entries(self.store.root()).await?;
        let folders = self.remote(self.client.list_folders()).await?;
        let mut cache = FolderCache::new(folders);
        let mut staged = Vec::new();

        for entry in entries.iter().filter(|entry| !entry.is_dir) {
            let path = self.store.root().join(&entry.name);
            let dashboard = self.store.load_document(&path).await?;
            staged.push(StagedDashboard {
                path,
                folder_id: 0,
                dashboard,
            });
        }

        for entry in entries.iter().filter(|entry| entry.is_dir) {
            let folder = self
                .remote(resolve_folder(&self.client, &mut cache, &entry.name))
                .await?;
            let folder_dir = self.store.root().join(&entry.name);
            for child in self.store.list_entries(&folder_dir).await? {
                if child.is_dir {
                    return Err(EngineError::NestedDirectory {
                        folder: entry.name.clone(),
                        entry: child.name,
                    });
                }
                let path = folder_dir.join(&child.name);
                let dashboard = self.store.load_document(&path).await?;
                staged.push(StagedDashboard {
                    path,
                    folder_id: folder.id,
                    dashboard,
                });
            }
        }

        if let Some(datasource) = datasource {
            for item in staged.iter_mut() {
                set_panel_datasources(&mut item.dashboard, datasource).map_err(|source| {
                    EngineError::Rewrite {
                        path: item.path.clone(),
                        source,
                    }
                })?;
            }
        }

        let uploaded = staged.len();
        for item in staged {
            let entry = DashboardWrite {
                overwrite: true,
                folder_id: item.folder_id,
                dashboard: item.dashboard,
            };
            self.remote(self.client.create_or_update_dashboard(&entry))
                .await?;
        }

        Ok(uploaded)
    }

    async fn remote<T, E, F>(&self, call: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, E>>,
        EngineError: From<E>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            result = call => Ok(result?),
        }
    }
}
