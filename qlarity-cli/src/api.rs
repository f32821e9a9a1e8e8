//! HTTP client for the Qlarity server.

use crate::CliResult;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub(crate) const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Stored upload as listed by the server.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerReport {
    pub(crate) id: String,
    pub(crate) repository: String,
    #[serde(default)]
    pub(crate) filename: String,
    pub(crate) data: Value,
}

#[derive(Debug, Deserialize)]
struct ReportListResponse {
    #[serde(default)]
    reports: Vec<ServerReport>,
}

/// Confirmation returned after an upload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct UploadResponse {
    pub(crate) id: String,
    pub(crate) filename: String,
    pub(crate) repository: String,
    #[serde(default)]
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Filters for listing uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportQuery {
    pub(crate) repository: Option<String>,
    pub(crate) limit: i64,
}

/// A validated file ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadPayload {
    pub(crate) file_name: String,
    pub(crate) contents: Vec<u8>,
    pub(crate) repository: String,
}

/// Trim whitespace and trailing slashes from a server URL.
pub(crate) fn normalize_server_url(server_url: &str) -> CliResult<String> {
    let trimmed = server_url.trim();
    if trimmed.is_empty() {
        return Err("server url is required".into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// HTTP client abstraction for the report endpoints.
pub(crate) trait CoverageApi {
    fn fetch_reports<'a>(
        &'a self,
        server_url: &'a str,
        query: &'a ReportQuery,
    ) -> Pin<Box<dyn Future<Output = CliResult<Vec<ServerReport>>> + Send + 'a>>;

    fn upload<'a>(
        &'a self,
        server_url: &'a str,
        payload: UploadPayload,
    ) -> Pin<Box<dyn Future<Output = CliResult<UploadResponse>> + Send + 'a>>;
}

/// Reqwest-backed API client.
pub(crate) struct ReqwestCoverageApi {
    client: Client,
}

impl ReqwestCoverageApi {
    /// Build a new reqwest API client.
    pub(crate) fn new() -> CliResult<Self> {
        let client = Client::builder().user_agent("qlarity-cli").build()?;
        Ok(Self { client })
    }
}

impl CoverageApi for ReqwestCoverageApi {
    fn fetch_reports<'a>(
        &'a self,
        server_url: &'a str,
        query: &'a ReportQuery,
    ) -> Pin<Box<dyn Future<Output = CliResult<Vec<ServerReport>>> + Send + 'a>> {
        Box::pin(fetch_reports(&self.client, server_url, query))
    }

    fn upload<'a>(
        &'a self,
        server_url: &'a str,
        payload: UploadPayload,
    ) -> Pin<Box<dyn Future<Output = CliResult<UploadResponse>> + Send + 'a>> {
        Box::pin(upload_report(&self.client, server_url, payload))
    }
}

/// Fetch recent uploads, newest first.
async fn fetch_reports(
    client: &Client,
    server_url: &str,
    query: &ReportQuery,
) -> CliResult<Vec<ServerReport>> {
    let mut params = vec![("limit", query.limit.to_string())];
    if let Some(repository) = &query.repository {
        params.push(("repository", repository.clone()));
    }
    let response = client
        .get(format!("{server_url}/api/coverage-reports"))
        .query(&params)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json::<ReportListResponse>().await?.reports)
}

/// Post one report file as a multipart form.
async fn upload_report(
    client: &Client,
    server_url: &str,
    payload: UploadPayload,
) -> CliResult<UploadResponse> {
    let part = Part::bytes(payload.contents)
        .file_name(payload.file_name)
        .mime_str("application/json")?;
    let form = Form::new()
        .text("repository", payload.repository)
        .part("file", part);
    let response = client
        .post(format!("{server_url}/api/upload-coverage"))
        .multipart(form)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        return Err(format!("upload rejected ({status}): {message}").into());
    }
    Ok(response.json::<UploadResponse>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    #[test]
    fn normalize_server_url_trims_trailing_slash() {
        let url = normalize_server_url("http://localhost:8080/").expect("url");
        assert_eq!(url, "http://localhost:8080");
    }

    #[test]
    fn normalize_server_url_rejects_empty() {
        let err = normalize_server_url("   ").unwrap_err();
        assert!(err.to_string().contains("server url"));
    }

    #[tokio::test]
    async fn fetch_reports_sends_filters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/coverage-reports")
                    .query_param("limit", "3")
                    .query_param("repository", "web");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"{"success":true,"reports":[{"id":"r1","repository":"web","filename":"web.json","data":{"context":{"repository":"web"}},"uploadedAt":"2025-05-01T12:00:00"}]}"#,
                    );
            })
            .await;

        let api = ReqwestCoverageApi::new().expect("client");
        let query = ReportQuery {
            repository: Some("web".to_string()),
            limit: 3,
        };
        let reports = api
            .fetch_reports(&server.base_url(), &query)
            .await
            .expect("reports");

        mock.assert_async().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, "r1");
        assert_eq!(reports[0].data["context"]["repository"], "web");
    }

    #[tokio::test]
    async fn fetch_reports_fails_on_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/coverage-reports");
                then.status(500).body(r#"{"error":"boom"}"#);
            })
            .await;

        let api = ReqwestCoverageApi::new().expect("client");
        let query = ReportQuery {
            repository: None,
            limit: 10,
        };
        assert!(api.fetch_reports(&server.base_url(), &query).await.is_err());
    }

    #[tokio::test]
    async fn upload_posts_multipart_form() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/upload-coverage")
                    .body_contains("name=\"repository\"")
                    .body_contains("filename=\"report.json\"");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"{"success":true,"id":"abc","filename":"web.json","repository":"web","data":{},"message":"Coverage report uploaded"}"#,
                    );
            })
            .await;

        let api = ReqwestCoverageApi::new().expect("client");
        let payload = UploadPayload {
            file_name: "report.json".to_string(),
            contents: br#"{"context":{"repository":"web"}}"#.to_vec(),
            repository: "web".to_string(),
        };
        let response = api
            .upload(&server.base_url(), payload)
            .await
            .expect("upload");

        mock.assert_async().await;
        assert_eq!(response.id, "abc");
        assert_eq!(response.filename, "web.json");
    }

    #[tokio::test]
    async fn upload_surfaces_server_error_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload-coverage");
                then.status(400)
                    .header("content-type", "application/json")
                    .body(r#"{"error":"Only JSON files are allowed"}"#);
            })
            .await;

        let api = ReqwestCoverageApi::new().expect("client");
        let payload = UploadPayload {
            file_name: "report.json".to_string(),
            contents: b"{}".to_vec(),
            repository: "web".to_string(),
        };
        let err = api
            .upload(&server.base_url(), payload)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("400"));
        assert!(err.contains("Only JSON files are allowed"));
    }
}
