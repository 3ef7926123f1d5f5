use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{error, info};
use url::Url;

/// Error types for platform API calls.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status} - {detail}")]
    Upstream { status: u16, detail: String },
    #[error("invalid JSON from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("invalid access token: {0}")]
    InvalidToken(String),
    #[error("invalid API base URL '{base}': {reason}")]
    InvalidBase { base: String, reason: String },
}

/// Authenticated client for the Seqera Platform REST API.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    api_base: Url,
    headers: HeaderMap,
}

impl PlatformClient {
    /// Build a client bound to one API base and bearer token.
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        access_token: &str,
    ) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| PlatformError::InvalidToken(e.to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let invalid_base = |reason: String| PlatformError::InvalidBase {
            base: api_base.to_string(),
            reason,
        };
        let parsed = Url::parse(api_base.trim()).map_err(|e| invalid_base(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid_base("cannot carry a path".to_string()));
        }
        Ok(PlatformClient {
            http,
            api_base: parsed,
            headers,
        })
    }

    /// URL of the action launch endpoint, `workspaceId` form-encoded into the query.
    pub fn launch_url(&self, action_id: &str, workspace_id: &str) -> Url {
        let mut url = self.endpoint(&["actions", action_id, "launch"]);
        url.query_pairs_mut().append_pair("workspaceId", workspace_id);
        url
    }

    /// URL of the workflow details endpoint.
    pub fn workflow_url(&self, workflow_id: &str) -> Url {
        self.endpoint(&["workflow", workflow_id])
    }

    /// Append path segments to the API base, escaping each one (`/` and `%` included).
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Trigger an action with an empty payload and return the decoded response body.
    ///
    /// Any status other than 200 is reported as [`PlatformError::Upstream`], with the
    /// body's `message` field preferred over the raw text.
    pub async fn launch_action(
        &self,
        action_id: &str,
        workspace_id: &str,
    ) -> Result<Value, PlatformError> {
        let url = self.launch_url(action_id, workspace_id);
        let resp = self
            .http
            .post(url.clone())
            .headers(self.headers.clone())
            .json(&json!({}))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;

        info!("Request URL: {}", url);
        info!("Response Status: {}", status.as_u16());
        info!("Response Content: {}", text);

        if status != StatusCode::OK {
            return Err(PlatformError::Upstream {
                status: status.as_u16(),
                detail: upstream_detail(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| PlatformError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch the details document for a launched workflow.
    pub async fn workflow_details(&self, workflow_id: &str) -> Result<Value, PlatformError> {
        let url = self.workflow_url(workflow_id);
        let resp = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Upstream {
                status: status.as_u16(),
                detail: upstream_detail(&text),
            });
        }
        let details: Value = resp.json().await?;
        info!(
            "Workflow Details Response: {}",
            serde_json::to_string_pretty(&details).unwrap_or_default()
        );
        Ok(details)
    }

    /// Like [`Self::workflow_details`] but logs and swallows failures.
    pub async fn try_workflow_details(&self, workflow_id: &str) -> Option<Value> {
        match self.workflow_details(workflow_id).await {
            Ok(details) => Some(details),
            Err(err) => {
                error!("Error getting workflow details: {}", err);
                None
            }
        }
    }
}

fn upstream_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .map(|message| match message {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or_else(|| body.to_string())
}
