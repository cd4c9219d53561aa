use std::collections::HashMap;

use grafana_sync_core::{Folder, GrafanaClient, GrafanaError};

/// Folder titles resolved so far in this push pass. Folder creation is not
/// idempotent on the Grafana side (a second create yields a duplicate with
/// the same title), so the cache seeded from the initial listing is the
/// only guard against creating a folder twice within a run.
#[derive(Debug, Default)]
pub struct FolderCache {
    by_title: HashMap<String, Folder>,
}

impl FolderCache {
    pub fn new(folders: Vec<Folder>) -> Self {
        Self {
            by_title: folders
                .into_iter()
                .map(|folder| (folder.title.clone(), folder))
                .collect(),
        }
    }

    pub fn get(&self, title: &str) -> Option<&Folder> {
        self.by_title.get(title)
    }

    pub fn insert(&mut self, folder: Folder) {
        self.by_title.insert(folder.title.clone(), folder);
    }
}

/// Cache hit returns without a remote call; a miss creates the folder and
/// remembers it for the rest of the pass.
pub async fn resolve_folder(
    client: &GrafanaClient,
    cache: &mut FolderCache,
    title: &str,
) -> Result<Folder, GrafanaError> {
    if let Some(folder) = cache.get(title) {
        return Ok(folder.clone());
    }
    let folder = client.create_folder(title).await?;
    cache.insert(folder.clone());
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_sync_core::Auth;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GrafanaClient {
        GrafanaClient::new(&server.uri(), Auth::Anonymous).unwrap()
    }

    #[tokio::test]
    async fn seeded_title_resolves_without_remote_call() {
        let server = MockServer::start().await;
        let mut cache = FolderCache::new(vec![Folder {
            id: 3,
            title: "Ops".into(),
            uid: "f-ops".into(),
        }]);

        let folder = resolve_folder(&client(&server), &mut cache, "Ops")
            .await
            .unwrap();

        assert_eq!(folder.id, 3);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_title_is_created_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/folders"))
            .and(body_json(json!({ "title": "Ops" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9, "title": "Ops", "uid": "f-ops"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let mut cache = FolderCache::new(Vec::new());

        let first = resolve_folder(&client, &mut cache, "Ops").await.unwrap();
        let second = resolve_folder(&client, &mut cache, "Ops").await.unwrap();

        assert_eq!(first.id, 9);
        assert_eq!(second.id, 9);
    }

    #[tokio::test]
    async fn creation_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/folders"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let mut cache = FolderCache::new(Vec::new());
        let err = resolve_folder(&client(&server), &mut cache, "Ops")
            .await
            .expect_err("expected api error");

        assert!(matches!(err, GrafanaError::Api { status, .. } if status.as_u16() == 403));
        assert!(cache.get("Ops").is_none());
    }
}
