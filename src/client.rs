use anyhow::Context;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ArmError, Result};
use crate::timerange::TimeRange;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated HTTP access to the ARM Live Data web service.
///
/// Holds one `reqwest::Client` plus the immutable [`Config`]; cloning is
/// cheap and concurrent use needs no locking. Every operation is a single
/// attempt with no retry; callers re-invoke on transient failure.
#[derive(Debug, Clone)]
pub struct ArmClient {
    config: Config,
    http: HttpClient,
}

impl ArmClient {
    /// Creates a client with the default 60 s request timeout.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit request timeout.
    pub fn with_timeout(config: Config, timeout: Duration) -> anyhow::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("arm-livedata/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("arm-livedata")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { config, http })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Queries the archive for a datastream's metadata and file listing over
    /// `range`. Returns the JSON response unchanged; its shape belongs to the
    /// archive, not to this crate.
    pub async fn query(&self, datastream: &str, range: &TimeRange) -> Result<Value> {
        let datastream = datastream.trim();
        if datastream.is_empty() {
            return Err(ArmError::Validation(
                "datastream must not be empty".to_string(),
            ));
        }

        let url = format!("{}/query", self.config.url);
        let start = range.start_param();
        let end = range.end_param();
        info!(
            datastream,
            start = %start,
            end = %end,
            user = %self.config.username,
            "querying live data"
        );

        // `user` must be the first query parameter, and `wt=json` selects the
        // JSON response format.
        let params = [
            ("user", self.user_param()),
            ("ds", datastream.to_string()),
            ("start", start),
            ("end", end),
            ("wt", "json".to_string()),
        ];

        let resp = self.http.get(&url).query(&params).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "query response");

        if !status.is_success() {
            return Err(status_error(status, &url, &text));
        }

        serde_json::from_str::<Value>(&text).map_err(|e| {
            ArmError::Remote(format!(
                "failed to parse API JSON (url={url}, status={status}): {e}"
            ))
        })
    }

    /// Downloads one archive file's bytes via the `saveData` endpoint.
    pub async fn save_data(&self, file: &str) -> Result<Vec<u8>> {
        let file = file.trim();
        if file.is_empty() {
            return Err(ArmError::Validation(
                "cdf_file must not be empty".to_string(),
            ));
        }

        let url = format!("{}/saveData", self.config.url);
        info!(file, "downloading archive file");

        let params = [("user", self.user_param()), ("file", file.to_string())];

        let resp = self.http.get(&url).query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &url, &text));
        }

        let bytes = resp.bytes().await?;
        info!(file, bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    fn user_param(&self) -> String {
        format!("{}:{}", self.config.username, self.config.token)
    }
}

fn status_error(status: StatusCode, url: &str, body: &str) -> ArmError {
    if status == StatusCode::UNAUTHORIZED {
        return ArmError::Remote(format!(
            "authentication failed (HTTP 401); check that ARM_USERNAME and ARM_API_TOKEN hold a valid account and access token\n{body}"
        ));
    }
    ArmError::Remote(format!(
        "API request failed: HTTP {status} for url ({url})\n{body}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    fn test_config(url: &str) -> Config {
        Config {
            url: url.trim_end_matches('/').to_string(),
            username: "alice".to_string(),
            token: "abc123".to_string(),
            container: false,
        }
    }

    fn client_for(url: &str) -> ArmClient {
        ArmClient::with_timeout(test_config(url), Duration::from_secs(5)).unwrap()
    }

    /// One-shot HTTP server: answers the first connection with a canned
    /// response and hands back the request head it saw.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = sock.read(&mut buf).await.unwrap_or(0);
                let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());

                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });

        (format!("http://{addr}"), rx)
    }

    fn some_range() -> TimeRange {
        TimeRange::resolve_at(Some("2020-01-01"), Some("2020-01-02"), chrono::Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn empty_datastream_fails_before_any_network_call() {
        // An unroutable base URL: touching the network would yield a
        // RemoteError, so seeing Validation proves no I/O happened.
        let client = client_for("http://127.0.0.1:1");
        let err = client.query("   ", &some_range()).await.unwrap_err();
        assert!(matches!(err, ArmError::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_file_name_fails_before_any_network_call() {
        let client = client_for("http://127.0.0.1:1");
        let err = client.save_data("").await.unwrap_err();
        assert!(matches!(err, ArmError::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn connection_failure_surfaces_as_remote_error_with_cause() {
        let client = client_for("http://127.0.0.1:1");
        let err = client
            .query("sgpmetE11.b1", &some_range())
            .await
            .unwrap_err();
        match err {
            ArmError::Remote(msg) => {
                // The transport-level cause must survive into the message.
                assert!(!msg.is_empty());
                assert!(msg.contains(':'), "{msg}");
            }
            other => panic!("expected RemoteError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_passes_response_json_through_unchanged() {
        let (url, rx) = serve_once("200 OK", r#"{"files":["a.cdf"],"status":"success"}"#).await;
        let client = client_for(&url);

        let value = client.query("sgpmetE11.b1", &some_range()).await.unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["files"][0], "a.cdf");

        let request = rx.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default().to_string();
        assert!(request_line.starts_with("GET /query?"), "{request_line}");
        // `user` first, credentials joined by a colon (percent-encoded).
        assert!(
            request_line.contains("query?user=alice%3Aabc123"),
            "{request_line}"
        );
        assert!(request_line.contains("ds=sgpmetE11.b1"), "{request_line}");
        assert!(
            request_line.contains("start=2020-01-01T00%3A00%3A00"),
            "{request_line}"
        );
        assert!(
            request_line.contains("end=2020-01-02T00%3A00%3A00"),
            "{request_line}"
        );
        assert!(request_line.contains("wt=json"), "{request_line}");
    }

    #[tokio::test]
    async fn server_error_status_is_a_remote_error_with_body() {
        let (url, _rx) = serve_once("500 Internal Server Error", "datastream offline").await;
        let client = client_for(&url);

        let err = client
            .query("sgpmetE11.b1", &some_range())
            .await
            .unwrap_err();
        match err {
            ArmError::Remote(msg) => {
                assert!(msg.contains("500"), "{msg}");
                assert!(msg.contains("datastream offline"), "{msg}");
            }
            other => panic!("expected RemoteError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_mentions_the_credential_variables() {
        let (url, _rx) = serve_once("401 Unauthorized", "bad token").await;
        let client = client_for(&url);

        let err = client
            .query("sgpmetE11.b1", &some_range())
            .await
            .unwrap_err();
        match err {
            ArmError::Remote(msg) => {
                assert!(msg.contains("ARM_USERNAME"), "{msg}");
                assert!(msg.contains("bad token"), "{msg}");
            }
            other => panic!("expected RemoteError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_success_body_is_a_remote_error() {
        let (url, _rx) = serve_once("200 OK", "<html>not json</html>").await;
        let client = client_for(&url);

        let err = client
            .query("sgpmetE11.b1", &some_range())
            .await
            .unwrap_err();
        match err {
            ArmError::Remote(msg) => assert!(msg.contains("parse"), "{msg}"),
            other => panic!("expected RemoteError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_data_returns_the_raw_bytes() {
        let (url, rx) = serve_once("200 OK", "raw-bytes-here").await;
        let client = client_for(&url);

        let bytes = client.save_data("nsametC1.b1.20200101.000000.cdf").await.unwrap();
        assert_eq!(bytes, b"raw-bytes-here");

        let request = rx.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default().to_string();
        assert!(request_line.starts_with("GET /saveData?"), "{request_line}");
        assert!(
            request_line.contains("file=nsametC1.b1.20200101.000000.cdf"),
            "{request_line}"
        );
    }

    #[tokio::test]
    async fn save_data_failure_keeps_status_and_body() {
        let (url, _rx) = serve_once("404 Not Found", "no such file").await;
        let client = client_for(&url);

        let err = client.save_data("missing.cdf").await.unwrap_err();
        match err {
            ArmError::Remote(msg) => {
                assert!(msg.contains("404"), "{msg}");
                assert!(msg.contains("no such file"), "{msg}");
            }
            other => panic!("expected RemoteError, got {other:?}"),
        }
    }
}
