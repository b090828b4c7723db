//! Synapse REST client.

use super::*;
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use std::time::Duration;
use synprov_model::keys::PROJECT_TYPE;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://repo-prod.prod.sagebase.org/repo/v1";

const VERSION_PAGE_SIZE: usize = 100;
const FILE_TYPE: &str = "file";
const FOLDER_TYPE: &str = "folder";

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct SynapseConfig {
    pub base_url: String,
    /// Personal access token; anonymous access when absent.
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SynapseConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout_secs: 60,
        }
    }
}

impl SynapseConfig {
    /// `SYNAPSE_BASE_URL` and `SYNAPSE_AUTH_TOKEN`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SYNAPSE_BASE_URL") {
            config.base_url = url;
        }
        config.auth_token = std::env::var("SYNAPSE_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        config
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.auth_token = token;
        }
        self
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct SynapseClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl SynapseClient {
    pub fn new(config: SynapseConfig) -> Result<Self, RepoError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| RepoError::Config(format!("base url `{}`: {e}", config.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RepoError::Config(format!(
                "base url `{}` must be http(s)",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RepoError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            auth_token: config.auth_token,
        })
    }

    /// Confirm the configured token is accepted. Anonymous clients skip the
    /// check.
    pub async fn verify(&self) -> Result<(), RepoError> {
        if self.auth_token.is_none() {
            return Ok(());
        }
        self.request(Method::GET, "/userProfile", &[], None).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, RepoError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "synapse request");

        let mut request = self.client.request(method, &url).query(query);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => RepoError::NotFound(path.to_string()),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    RepoError::Forbidden(path.to_string())
                }
                _ => RepoError::Http {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| RepoError::InvalidResponse(format!("{path}: {e}")))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, RepoError> {
        self.request(Method::GET, path, query, None).await
    }

    async fn children_page(
        &self,
        parent_id: &str,
        next_page_token: Option<&str>,
    ) -> Result<Value, RepoError> {
        let mut body = json!({
            "parentId": parent_id,
            "includeTypes": [FILE_TYPE, FOLDER_TYPE],
        });
        if let Some(token) = next_page_token {
            body["nextPageToken"] = json!(token);
        }
        self.request(Method::POST, "/entity/children", &[], Some(&body))
            .await
    }

    fn entity_path(id: &str, version: Option<i64>) -> String {
        match version {
            Some(v) => format!("/entity/{id}/version/{v}"),
            None => format!("/entity/{id}"),
        }
    }

    /// Merge `annotations2` values into the record's top level without
    /// shadowing native fields.
    async fn merge_annotations(&self, id: &str, version: Option<i64>, record: &mut Value) {
        let path = format!("{}/annotations2", Self::entity_path(id, version));
        let annotations = match self.get(&path, &[]).await {
            Ok(value) => value,
            Err(e) => {
                warn!(entity = id, error = %e, "annotations unavailable");
                return;
            }
        };
        let (Some(target), Some(values)) = (
            record.as_object_mut(),
            annotations.get("annotations").and_then(Value::as_object),
        ) else {
            return;
        };
        for (key, annotation) in values {
            if target.contains_key(key) {
                debug!(entity = id, key = %key, "annotation shadows a native field; skipped");
                continue;
            }
            let value = annotation.get("value").cloned().unwrap_or(Value::Null);
            target.insert(key.clone(), value);
        }
    }
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Children headers carry either the short type (`file`) or the full class
/// name (`org.sagebionetworks.repo.model.FileEntity`).
fn is_type(header: &Value, short: &str) -> bool {
    let Some(kind) = header.get("type").and_then(Value::as_str) else {
        return false;
    };
    let kind = kind.to_ascii_lowercase();
    let class = kind.rsplit('.').next().unwrap_or(&kind);
    class == short || class.strip_suffix("entity") == Some(short)
}

#[async_trait]
impl RepositoryClient for SynapseClient {
    async fn list_projects(&self) -> Result<Vec<String>, RepoError> {
        let mut projects = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let query: Vec<(&str, String)> = token
                .iter()
                .map(|t| ("nextPageToken", t.clone()))
                .collect();
            let page = self.get("/projects", &query).await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| RepoError::InvalidResponse("/projects: missing results".into()))?;
            projects.extend(results.iter().filter_map(|p| string_field(p, "id")));

            token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            if token.is_none() {
                break;
            }
        }
        Ok(projects)
    }

    async fn list_entities(&self, project_id: &str) -> Result<Vec<EntitySummary>, RepoError> {
        let mut entities = Vec::new();
        let mut containers = vec![project_id.to_string()];

        while let Some(parent) = containers.pop() {
            let mut token: Option<String> = None;
            loop {
                let page = self.children_page(&parent, token.as_deref()).await?;
                let headers = page.get("page").and_then(Value::as_array).ok_or_else(|| {
                    RepoError::InvalidResponse(format!("/entity/children of {parent}: missing page"))
                })?;
                for header in headers {
                    let Some(id) = string_field(header, "id") else {
                        continue;
                    };
                    if is_type(header, FOLDER_TYPE) {
                        containers.push(id);
                    } else if is_type(header, FILE_TYPE) {
                        entities.push(EntitySummary {
                            id,
                            benefactor_id: string_field(header, "benefactorId")
                                .map(|b| if b.starts_with("syn") { b } else { format!("syn{b}") }),
                        });
                    }
                }
                token = page
                    .get("nextPageToken")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if token.is_none() {
                    break;
                }
            }
        }
        Ok(entities)
    }

    async fn list_versions(&self, entity_id: &str) -> Result<Vec<VersionInfo>, RepoError> {
        let path = format!("/entity/{entity_id}/version");
        let mut versions = Vec::new();
        let mut offset = 0usize;
        loop {
            let page = self
                .get(
                    &path,
                    &[
                        ("offset", offset.to_string()),
                        ("limit", VERSION_PAGE_SIZE.to_string()),
                    ],
                )
                .await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| RepoError::InvalidResponse(format!("{path}: missing results")))?;
            for result in results {
                let info: VersionInfo = serde_json::from_value(result.clone())
                    .map_err(|e| RepoError::InvalidResponse(format!("{path}: {e}")))?;
                versions.push(info);
            }
            if results.len() < VERSION_PAGE_SIZE {
                break;
            }
            offset += results.len();
        }
        Ok(versions)
    }

    async fn get_entity(&self, id: &str, version: Option<i64>) -> Result<Value, RepoError> {
        let mut record = self.get(&Self::entity_path(id, version), &[]).await?;
        let resolved_version = version.or_else(|| record.get("versionNumber").and_then(Value::as_i64));
        self.merge_annotations(id, resolved_version, &mut record).await;
        Ok(record)
    }

    async fn get_provenance(&self, id: &str, version: i64) -> Result<Value, RepoError> {
        self.get(&format!("/entity/{id}/version/{version}/generatedBy"), &[])
            .await
    }

    async fn get_project_id(&self, id: &str) -> Result<String, RepoError> {
        let path = format!("/entity/{id}/path");
        let value = self.get(&path, &[]).await?;
        value
            .get("path")
            .and_then(Value::as_array)
            .and_then(|headers| {
                headers.iter().find(|h| {
                    h.get("type").and_then(Value::as_str) == Some(PROJECT_TYPE)
                })
            })
            .and_then(|h| string_field(h, "id"))
            .ok_or_else(|| RepoError::InvalidResponse(format!("{path}: no project in path")))
    }

    async fn get_benefactor_id(&self, id: &str) -> Result<String, RepoError> {
        let path = format!("/entity/{id}/benefactor");
        let value = self.get(&path, &[]).await?;
        string_field(&value, "id")
            .ok_or_else(|| RepoError::InvalidResponse(format!("{path}: missing id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_url() {
        let config = SynapseConfig {
            base_url: "ftp://example.org".into(),
            ..SynapseConfig::default()
        };
        assert!(matches!(SynapseClient::new(config), Err(RepoError::Config(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = SynapseConfig {
            base_url: "https://repo.example.org/repo/v1/".into(),
            ..SynapseConfig::default()
        };
        let client = SynapseClient::new(config).unwrap();
        assert_eq!(client.base_url, "https://repo.example.org/repo/v1");
    }

    #[test]
    fn header_type_matching() {
        let file = json!({"type": "org.sagebionetworks.repo.model.FileEntity"});
        let folder = json!({"type": "org.sagebionetworks.repo.model.Folder"});
        assert!(is_type(&file, FILE_TYPE));
        assert!(!is_type(&file, FOLDER_TYPE));
        assert!(is_type(&folder, FOLDER_TYPE));
        assert!(is_type(&json!({"type": "file"}), FILE_TYPE));
    }

    #[test]
    fn entity_paths() {
        assert_eq!(SynapseClient::entity_path("syn1", Some(2)), "/entity/syn1/version/2");
        assert_eq!(SynapseClient::entity_path("syn1", None), "/entity/syn1");
    }

    #[test]
    fn absent_errors() {
        assert!(RepoError::NotFound("x".into()).is_absent());
        assert!(RepoError::Forbidden("x".into()).is_absent());
        assert!(!RepoError::Network("x".into()).is_absent());
    }
}
