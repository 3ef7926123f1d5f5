use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use studio_launch::core::config::SettingsSource;
use studio_launch::core::types::LaunchEnvelope;
use studio_launch::core::AppError;
use studio_launch::server::{self, ServerState};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const ACTION_ID: &str = "act-1";
const WORKSPACE_ID: &str = "42";
const WEB_BASE: &str = "https://cloud.example.org";

async fn spawn_server(
    settings: SettingsSource,
) -> Result<(SocketAddr, JoinHandle<Result<(), AppError>>)> {
    let (addr_tx, addr_rx) = oneshot::channel();
    let bind: SocketAddr = "127.0.0.1:0".parse()?;
    let handle = tokio::spawn(async move {
        server::serve_with_ready_notifier(bind, ServerState::new(settings), addr_tx).await
    });
    let addr = addr_rx.await?;
    Ok((addr, handle))
}

fn settings_for(api_base: &str, extra: &[(&str, &str)]) -> SettingsSource {
    let mut pairs = vec![
        ("SEQERA_ACCESS_TOKEN".to_string(), TOKEN.to_string()),
        ("SEQERA_ACTION_ID".to_string(), ACTION_ID.to_string()),
        ("SEQERA_WORKSPACE_ID".to_string(), WORKSPACE_ID.to_string()),
        ("SEQERA_API_BASE".to_string(), api_base.to_string()),
        ("SEQERA_WEB_BASE".to_string(), WEB_BASE.to_string()),
    ];
    for (key, value) in extra {
        pairs.retain(|(existing, _)| existing.as_str() != *key);
        pairs.push((key.to_string(), value.to_string()));
    }
    SettingsSource::from_pairs(pairs)
}

async fn mount_launch(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/actions/{}/launch", ACTION_ID)))
        .and(query_param("workspaceId", WORKSPACE_ID))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({})))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, workflow_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/workflow/{}", workflow_id)))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn post_launch(addr: SocketAddr) -> Result<(StatusCode, Value)> {
    let resp = reqwest::Client::new()
        .post(format!("http://{}/launch", addr))
        .send()
        .await?;
    let status = resp.status();
    let body: Value = resp.json().await?;
    Ok((status, body))
}

#[tokio::test]
async fn launch_without_configuration_returns_bad_request() -> Result<()> {
    let (addr, _handle) = spawn_server(SettingsSource::from_pairs([(
        "SEQERA_ACTION_ID",
        ACTION_ID,
    )]))
    .await?;
    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["message"],
        json!("Missing required environment variables: SEQERA_ACCESS_TOKEN, SEQERA_WORKSPACE_ID")
    );
    Ok(())
}

#[tokio::test]
async fn upstream_error_embeds_status_and_message() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})),
    )
    .await;
    let (addr, _handle) = spawn_server(settings_for(&platform.uri(), &[])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Error from Seqera API: 403 - Forbidden"));
    assert!(body.get("data").is_none());
    Ok(())
}

#[tokio::test]
async fn upstream_error_without_json_uses_raw_body() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(502).set_body_string("Bad Gateway"),
    )
    .await;
    let (addr, _handle) = spawn_server(settings_for(&platform.uri(), &[])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("Error from Seqera API: 502 - Bad Gateway"));
    Ok(())
}

#[tokio::test]
async fn successful_launch_builds_run_url_from_workflow_details() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(200).set_body_json(json!({"workflowId": "3xKbQ"})),
    )
    .await;
    mount_details(
        &platform,
        "3xKbQ",
        ResponseTemplate::new(200).set_body_json(json!({
            "workflow": {"id": "3xKbQ"},
            "data": {"workspaceRef": {"orgName": "acme", "workspaceName": "showcase"}}
        })),
    )
    .await;
    let (addr, _handle) = spawn_server(settings_for(
        &platform.uri(),
        &[("SEQERA_ORG_NAME", "env-org"), ("SEQERA_WORKSPACE_NAME", "env-ws")],
    ))
    .await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::OK);
    let envelope: LaunchEnvelope = serde_json::from_value(body.clone())?;
    assert!(envelope.success);
    assert_eq!(
        envelope.message,
        "Pipeline launched successfully via Seqera Action"
    );
    assert_eq!(body["data"], json!({"workflowId": "3xKbQ"}));
    assert_eq!(
        body["runUrl"],
        json!("https://cloud.example.org/orgs/acme/workspaces/showcase/watch/3xKbQ")
    );
    assert_eq!(
        envelope.run_url.url(),
        Some("https://cloud.example.org/orgs/acme/workspaces/showcase/watch/3xKbQ")
    );
    Ok(())
}

#[tokio::test]
async fn failed_details_fall_back_to_configured_names() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(200).set_body_json(json!({"workflowId": "wf-9"})),
    )
    .await;
    mount_details(&platform, "wf-9", ResponseTemplate::new(404)).await;
    let (addr, _handle) = spawn_server(settings_for(
        &platform.uri(),
        &[("SEQERA_ORG_NAME", "env-org"), ("SEQERA_WORKSPACE_NAME", "env-ws")],
    ))
    .await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["runUrl"],
        json!("https://cloud.example.org/orgs/env-org/workspaces/env-ws/watch/wf-9")
    );
    Ok(())
}

#[tokio::test]
async fn missing_workspace_name_leaves_run_url_null() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(200).set_body_json(json!({"workflowId": "wf-1"})),
    )
    .await;
    mount_details(
        &platform,
        "wf-1",
        ResponseTemplate::new(200)
            .set_body_json(json!({"data": {"workspaceRef": {"orgName": "acme"}}})),
    )
    .await;
    let (addr, _handle) = spawn_server(settings_for(&platform.uri(), &[])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body.as_object().unwrap().contains_key("runUrl"));
    assert!(body["runUrl"].is_null());
    Ok(())
}

#[tokio::test]
async fn empty_web_base_leaves_run_url_null() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(200).set_body_json(json!({"workflowId": "wf-2"})),
    )
    .await;
    mount_details(
        &platform,
        "wf-2",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {"workspaceRef": {"orgName": "acme", "workspaceName": "showcase"}}
        })),
    )
    .await;
    let (addr, _handle) =
        spawn_server(settings_for(&platform.uri(), &[("SEQERA_WEB_BASE", "")])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["runUrl"].is_null());
    Ok(())
}

#[tokio::test]
async fn response_without_workflow_id_skips_details_lookup() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(
        &platform,
        ResponseTemplate::new(200).set_body_json(json!({"status": "SUBMITTED"})),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&platform)
        .await;
    let (addr, _handle) = spawn_server(settings_for(
        &platform.uri(),
        &[("SEQERA_ORG_NAME", "acme"), ("SEQERA_WORKSPACE_NAME", "showcase")],
    ))
    .await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"status": "SUBMITTED"}));
    assert!(body["runUrl"].is_null());
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_reported_as_server_error() -> Result<()> {
    // reserve a port, then release it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let dead_addr = listener.local_addr()?;
    drop(listener);

    let api_base = format!("http://{}", dead_addr);
    let (addr, _handle) = spawn_server(settings_for(&api_base, &[])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    let message = body["message"].as_str().unwrap_or_default();
    assert!(
        message.starts_with("Error launching pipeline: "),
        "unexpected message: {}",
        message
    );
    assert!(message.len() > "Error launching pipeline: ".len());
    Ok(())
}

#[tokio::test]
async fn undecodable_launch_body_is_reported_as_server_error() -> Result<()> {
    let platform = MockServer::start().await;
    mount_launch(&platform, ResponseTemplate::new(200).set_body_string("<html>")).await;
    let (addr, _handle) = spawn_server(settings_for(&platform.uri(), &[])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Error launching pipeline: invalid JSON"));
    Ok(())
}

#[tokio::test]
async fn identifiers_are_escaped_in_upstream_urls() -> Result<()> {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/actions/a%2Fb%25c/launch"))
        .and(query_param("workspaceId", "1&admin=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"workflowId": "wf/1%2"})))
        .expect(1)
        .mount(&platform)
        .await;
    mount_details(
        &platform,
        "wf%2F1%252",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {"workspaceRef": {"orgName": "acme", "workspaceName": "showcase"}}
        })),
    )
    .await;
    let (addr, _handle) = spawn_server(settings_for(
        &platform.uri(),
        &[
            ("SEQERA_ACTION_ID", "a/b%c"),
            ("SEQERA_WORKSPACE_ID", "1&admin=true"),
        ],
    ))
    .await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["data"], json!({"workflowId": "wf/1%2"}));

    let requests = platform.received_requests().await.unwrap_or_default();
    let launch = requests
        .iter()
        .find(|request| request.method.as_str() == "POST")
        .expect("launch request recorded");
    assert_eq!(launch.url.query_pairs().count(), 1);
    Ok(())
}

#[tokio::test]
async fn blank_api_base_is_reported_as_server_error() -> Result<()> {
    let (addr, _handle) = spawn_server(settings_for("", &[])).await?;

    let (status, body) = post_launch(addr).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Error launching pipeline: invalid API base URL"));
    Ok(())
}
