// Shared test helpers: a mock Nexus REST API and configs pointing at it

#![allow(dead_code)]

use nexus_exporter::config::NexusConfig;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER: &str = "admin";
pub const PASS: &str = "s3cret";

pub fn nexus_config(server: &MockServer) -> NexusConfig {
    NexusConfig {
        url: Some(server.uri()),
        username: Some(USER.into()),
        password: Some(PASS.into()),
        request_timeout_secs: 5,
        ..NexusConfig::default()
    }
}

/// Mounts `GET {api_path}` answering 200 with `body`.
pub async fn mount_json(server: &MockServer, api_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, api_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn asset(repository: &str, size: u64, last_downloaded: Option<&str>) -> Value {
    let mut v = serde_json::json!({
        "repository": repository,
        "size": size,
        "path": format!("{repository}/artifact-{size}.jar"),
    });
    if let Some(ts) = last_downloaded {
        v["lastDownloaded"] = Value::String(ts.into());
    }
    v
}
