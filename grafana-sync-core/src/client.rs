use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::dashboard::Dashboard;

const SEARCH_API: &str = "/api/search";
const DASHBOARDS_API: &str = "/api/dashboards/db";
const DASHBOARD_BY_UID_API: &str = "/api/dashboards/uid";
const FOLDERS_API: &str = "/api/folders";

const FOLDER_LIST_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum GrafanaError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("failed to decode api response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api response missing dashboard body")]
    MissingDashboard,
}

#[derive(Debug, Clone, Default)]
pub enum Auth {
    #[default]
    Anonymous,
    Token(String),
    Basic { username: String, password: String },
}

#[derive(Clone)]
pub struct GrafanaClient {
    http: Client,
    base_url: Url,
    auth: Auth,
    verbose: bool,
}

impl GrafanaClient {
    pub fn new(address: &str, auth: Auth) -> Result<Self, GrafanaError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(address)?,
            auth,
            verbose: false,
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>, GrafanaError> {
        let mut url = self.endpoint(FOLDERS_API)?;
        url.query_pairs_mut()
            .append_pair("limit", &FOLDER_LIST_LIMIT.to_string());
        let response = self.execute(self.http.get(url)).await?;
        self.handle_response(response).await
    }

    pub async fn create_folder(&self, title: &str) -> Result<Folder, GrafanaError> {
        let url = self.endpoint(FOLDERS_API)?;
        let body = CreateFolderRequest { title };
        let response = self.execute(self.http.post(url).json(&body)).await?;
        self.handle_response(response).await
    }

    pub async fn list_dashboard_refs(&self) -> Result<Vec<DashboardRef>, GrafanaError> {
        let mut url = self.endpoint(SEARCH_API)?;
        url.query_pairs_mut().append_pair("type", "dash-db");
        let response = self.execute(self.http.get(url)).await?;
        self.handle_response(response).await
    }

    pub async fn get_dashboard(&self, uid: &str) -> Result<Dashboard, GrafanaError> {
        let url = self.endpoint(&format!("{DASHBOARD_BY_UID_API}/{uid}"))?;
        let response = self.execute(self.http.get(url)).await?;
        let envelope: DashboardEnvelope = self.handle_response(response).await?;
        envelope.dashboard.ok_or(GrafanaError::MissingDashboard)
    }

    pub async fn create_or_update_dashboard(
        &self,
        entry: &DashboardWrite,
    ) -> Result<(), GrafanaError> {
        let url = self.endpoint(DASHBOARDS_API)?;
        let response = self.execute(self.http.post(url).json(entry)).await?;
        self.check_status(response).await?;
        Ok(())
    }

    fn apply_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Anonymous => builder,
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, GrafanaError> {
        Ok(self.base_url.join(path)?)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, GrafanaError> {
        let request = self.apply_auth(builder).build()?;
        if self.verbose {
            let body = request
                .body()
                .and_then(|body| body.as_bytes())
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            eprintln!("[grafana] > {} {} {}", request.method(), request.url(), body);
        }
        Ok(self.http.execute(request).await?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, GrafanaError> {
        let body = self.check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn check_status(&self, response: Response) -> Result<String, GrafanaError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            if self.verbose {
                eprintln!("[grafana] < {status} {body}");
            }
            Ok(body)
        } else {
            let body = response.text().await.unwrap_or_default();
            if self.verbose {
                eprintln!("[grafana] < {status} {body}");
            }
            Err(GrafanaError::Api { status, body })
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Folder {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub uid: String,
}

// Search results omit folderTitle for dashboards outside any folder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardRef {
    pub uid: String,
    pub title: String,
    #[serde(default, rename = "folderTitle")]
    pub folder_title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardWrite {
    pub overwrite: bool,
    pub folder_id: i64,
    pub dashboard: Dashboard,
}

#[derive(Serialize)]
struct CreateFolderRequest<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct DashboardEnvelope {
    dashboard: Option<Dashboard>,
}
