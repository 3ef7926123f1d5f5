//! Launching a Seqera Action and resolving the viewer URL of the resulting run.

#![allow(clippy::result_large_err)]

use crate::core::config::LaunchSettings;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::platform::{PlatformClient, PlatformError};
use serde_json::Value;
use tracing::info;

/// Result of a successful launch call.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOutcome {
    /// Launch response body, passed through untouched.
    pub data: Value,
    pub run_url: Option<String>,
}

/// Organization and workspace names used in the viewer URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceNames {
    pub org_name: Option<String>,
    pub workspace_name: Option<String>,
}

/// Launch the configured action and try to build a link to the run.
///
/// Missing configuration fails before any network traffic. Failure to fetch
/// workflow details never fails the launch; it only leaves names to the
/// configured fallbacks.
pub async fn launch_pipeline(
    settings: &LaunchSettings,
    http: &reqwest::Client,
) -> Result<LaunchOutcome, AppError> {
    let target = settings.require()?;
    let web_base = settings.web_base.as_deref();
    info!("Using web base URL: {}", web_base.unwrap_or(""));

    let client = PlatformClient::new(http.clone(), &target.api_base, &target.access_token)
        .map_err(launch_error)?;
    let data = client
        .launch_action(&target.action_id, &target.workspace_id)
        .await
        .map_err(launch_error)?;
    info!(
        "Response Data: {}",
        serde_json::to_string_pretty(&data).unwrap_or_default()
    );

    let Some(workflow_id) = extract_workflow_id(&data) else {
        info!("No workflowId found in response");
        return Ok(LaunchOutcome {
            data,
            run_url: None,
        });
    };
    info!("Found workflowId: {}", workflow_id);

    let details = client.try_workflow_details(&workflow_id).await;
    let names = resolve_names(details.as_ref(), settings);
    let run_url = compose_run_url(
        web_base,
        names.org_name.as_deref(),
        names.workspace_name.as_deref(),
        Some(&workflow_id),
    );
    match &run_url {
        Some(url) => info!("Constructed run URL: {}", url),
        None => info!(
            "Missing components for URL: workflow_id={}, org_name={}, workspace_name={}, seqera_web_base={}",
            workflow_id,
            names.org_name.as_deref().unwrap_or(""),
            names.workspace_name.as_deref().unwrap_or(""),
            web_base.unwrap_or("")
        ),
    }

    Ok(LaunchOutcome { data, run_url })
}

/// Read `workflowId` from a launch response. Null or blank counts as absent.
pub fn extract_workflow_id(data: &Value) -> Option<String> {
    match data.get("workflowId")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Extract `data.workspaceRef.{orgName,workspaceName}` from workflow details.
pub fn workspace_ref_names(details: &Value) -> WorkspaceNames {
    let Some(workspace_ref) = details.get("data").and_then(|data| data.get("workspaceRef")) else {
        return WorkspaceNames::default();
    };
    info!("Found workspaceRef in workflow details: {}", workspace_ref);

    let field = |key: &str| {
        workspace_ref
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    };
    let names = WorkspaceNames {
        org_name: field("orgName"),
        workspace_name: field("workspaceName"),
    };
    if let Some(org) = &names.org_name {
        info!("Found orgName in workflow details: {}", org);
    }
    if let Some(workspace) = &names.workspace_name {
        info!("Found workspaceName in workflow details: {}", workspace);
    }
    names
}

/// Names from workflow details, each falling back to configuration independently.
pub fn resolve_names(details: Option<&Value>, settings: &LaunchSettings) -> WorkspaceNames {
    let found = details.map(workspace_ref_names).unwrap_or_default();
    let org_name = found.org_name.or_else(|| {
        info!(
            "Using fallback orgName from environment: {}",
            settings.org_name.as_deref().unwrap_or("")
        );
        settings.org_name.clone()
    });
    let workspace_name = found.workspace_name.or_else(|| {
        info!(
            "Using fallback workspaceName from environment: {}",
            settings.workspace_name.as_deref().unwrap_or("")
        );
        settings.workspace_name.clone()
    });
    WorkspaceNames {
        org_name,
        workspace_name,
    }
}

/// `{web}/orgs/{org}/workspaces/{workspace}/watch/{workflow}` when every part is present.
pub fn compose_run_url(
    web_base: Option<&str>,
    org_name: Option<&str>,
    workspace_name: Option<&str>,
    workflow_id: Option<&str>,
) -> Option<String> {
    fn present(part: Option<&str>) -> Option<&str> {
        part.filter(|value| !value.is_empty())
    }
    let web_base = present(web_base)?;
    let org_name = present(org_name)?;
    let workspace_name = present(workspace_name)?;
    let workflow_id = present(workflow_id)?;
    Some(format!(
        "{}/orgs/{}/workspaces/{}/watch/{}",
        web_base, org_name, workspace_name, workflow_id
    ))
}

fn launch_error(err: PlatformError) -> AppError {
    match err {
        PlatformError::Upstream { status, detail } => AppError::new(
            ErrorCategory::UpstreamError,
            format!("Error from Seqera API: {} - {}", status, detail),
        )
        .with_code(format!("LAUNCH-UPSTREAM-{}", status)),
        PlatformError::InvalidToken(reason) => AppError::new(
            ErrorCategory::ConfigurationError,
            format!("Invalid SEQERA_ACCESS_TOKEN: {}", reason),
        )
        .with_code("LAUNCH-CONFIG-400"),
        other => {
            let message = format!("Error launching pipeline: {}", other);
            tracing::error!("Exception details: {}", other);
            AppError::with_source(ErrorCategory::TransportError, message, Box::new(other))
                .with_code("LAUNCH-TRANSPORT-500")
        }
    }
}
