//! Handler factory and the HTTP transport to the SiYuan kernel.
//!
//! `create_handler(path)` turns an endpoint path into a command handler. The
//! handler sends one [`BackendRequest`] through a [`Transport`] and unwraps the
//! SiYuan `{code, msg, data}` envelope. [`SiyuanClient`] is the reqwest-backed
//! transport used in production.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::descriptor::{CommandHandler, HandlerFuture, Invocation, RequestKind};
use super::error::CommandError;
use super::schema::ValidatedParams;

/// How requests are mapped onto HTTP. Fixed once per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStyle {
    /// WRITE commands POST a JSON body, READ-only commands GET with query params.
    #[default]
    ByMode,
    /// Every command POSTs a JSON body.
    PostAll,
}

impl RequestStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "by-mode" | "bymode" => Some(Self::ByMode),
            "post-all" | "postall" | "post" => Some(Self::PostAll),
            _ => None,
        }
    }
}

/// One outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub path: String,
    pub kind: RequestKind,
    pub params: ValidatedParams,
}

/// Seam between command handlers and the network.
///
/// Returns the parsed JSON body; envelope interpretation is the handler's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &BackendRequest) -> Result<Value, CommandError>;
}

/// Build a handler that forwards validated params to `path`.
pub fn create_handler(path: &'static str) -> CommandHandler {
    Arc::new(move |inv: Invocation| -> HandlerFuture {
        let request = BackendRequest {
            path: path.to_string(),
            kind: inv.kind,
            params: inv.params,
        };
        let transport = inv.transport;
        Box::pin(async move {
            debug!("[SiYuan] -> {} ({:?})", request.path, request.kind);
            let body = transport.send(&request).await?;
            unwrap_envelope(body)
        })
    })
}

/// Interpret a SiYuan response body.
///
/// - `{code: 0, data}` resolves with `data` (`null` when absent)
/// - `{code: n, msg}` with `n != 0` fails with `Backend`
/// - a non-integer `code` is a malformed response
/// - anything without a `code` field is returned verbatim
pub fn unwrap_envelope(body: Value) -> Result<Value, CommandError> {
    let mut map = match body {
        Value::Object(map) => map,
        other => return Ok(other),
    };
    let code = match map.get("code") {
        Some(code) => code.as_i64().ok_or_else(|| {
            CommandError::Transport(format!("Malformed response: non-integer code {}", code))
        })?,
        None => return Ok(Value::Object(map)),
    };

    if code == 0 {
        Ok(map.remove("data").unwrap_or(Value::Null))
    } else {
        let msg = map
            .get("msg")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        Err(CommandError::Backend { code, msg })
    }
}

/// reqwest-backed transport to a SiYuan kernel.
pub struct SiyuanClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    style: RequestStyle,
}

impl SiyuanClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        style: RequestStyle,
        timeout: Duration,
    ) -> Result<Self, CommandError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CommandError::Transport(format!("Invalid base URL {}: {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CommandError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.is_empty()),
            style,
        })
    }

    /// `<baseUrl><path>`; a trailing slash on the base URL is tolerated.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn uses_get(&self, kind: RequestKind) -> bool {
        self.style == RequestStyle::ByMode && kind == RequestKind::Read
    }
}

#[async_trait]
impl Transport for SiyuanClient {
    async fn send(&self, request: &BackendRequest) -> Result<Value, CommandError> {
        let url = self.endpoint(&request.path);

        let mut req_builder = if self.uses_get(request.kind) {
            self.http.get(&url).query(&request.params.to_query_pairs())
        } else {
            self.http.post(&url).json(&request.params.to_value())
        };
        if let Some(token) = &self.token {
            req_builder = req_builder.header("Authorization", format!("Token {}", token));
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| CommandError::from_reqwest(&e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CommandError::Transport(format!("Failed to read response: {}", e)))?;

        debug!("[SiYuan] <- {} {} ({} bytes)", url, status.as_u16(), text.len());

        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        match parsed {
            Some(body) if status.is_success() => Ok(body),
            // Non-2xx with a SiYuan failure envelope still carries the backend's error
            Some(body) if is_failure_envelope(&body) => Ok(body),
            _ if status.is_success() => Err(CommandError::Transport(format!(
                "Malformed response from {}: not JSON",
                request.path
            ))),
            _ => Err(CommandError::Transport(format!(
                "HTTP {} - {}",
                status.as_u16(),
                text.trim()
            ))),
        }
    }
}

/// An envelope whose `code` is present and not `0`.
fn is_failure_envelope(body: &Value) -> bool {
    match body.get("code") {
        Some(code) => code.as_i64() != Some(0),
        None => false,
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::testing::RecordingTransport;
    use super::*;
    use crate::mcp::schema::{ParamSchema, ParamType};

    fn push_msg_params() -> ValidatedParams {
        ParamSchema::empty()
            .required("msg", ParamType::String, "Message content")
            .optional("timeout", ParamType::Number, "Timeout")
            .validate(&json!({ "msg": "Hello World", "timeout": 7000 }))
            .unwrap()
    }

    async fn invoke(
        transport: Arc<RecordingTransport>,
        path: &'static str,
        kind: RequestKind,
    ) -> Result<Value, CommandError> {
        let handler = create_handler(path);
        handler(Invocation {
            transport,
            kind,
            params: push_msg_params(),
        })
        .await
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let body = json!({ "code": 0, "msg": "", "data": { "version": "2.8.8" } });
        assert_eq!(unwrap_envelope(body).unwrap(), json!({ "version": "2.8.8" }));

        let body = json!({ "code": 0, "msg": "" });
        assert_eq!(unwrap_envelope(body).unwrap(), Value::Null);
    }

    #[test]
    fn test_unwrap_envelope_without_code_is_verbatim() {
        assert_eq!(unwrap_envelope(json!({})).unwrap(), json!({}));
        assert_eq!(unwrap_envelope(json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_unwrap_envelope_failure() {
        let err = unwrap_envelope(json!({ "code": 1, "msg": "error" })).unwrap_err();
        assert_eq!(
            err,
            CommandError::Backend {
                code: 1,
                msg: "error".into()
            }
        );
    }

    #[test]
    fn test_unwrap_envelope_malformed_code() {
        let err = unwrap_envelope(json!({ "code": "zero" })).unwrap_err();
        assert_eq!(err.kind(), "transport_error");
    }

    #[tokio::test]
    async fn test_handler_sends_one_request_and_unwraps() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let result = invoke(transport.clone(), "/api/notification/pushMsg", RequestKind::Write)
            .await
            .unwrap();
        assert_eq!(result, json!({}));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/notification/pushMsg");
        assert_eq!(requests[0].kind, RequestKind::Write);
        assert_eq!(
            requests[0].params.to_value(),
            json!({ "msg": "Hello World", "timeout": 7000 })
        );
    }

    #[tokio::test]
    async fn test_handler_backend_failure_not_retried() {
        let transport = RecordingTransport::replying(Ok(json!({ "code": 1, "msg": "error" })));
        let err = invoke(transport.clone(), "/api/notification/pushMsg", RequestKind::Write)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(1));
        assert_eq!(err.to_string(), "SiYuan API error 1: error");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_handler_transport_failure_not_retried() {
        let transport =
            RecordingTransport::replying(Err(CommandError::Transport("refused".into())));
        let err = invoke(transport.clone(), "/api/system/version", RequestKind::Read)
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::Transport("refused".into()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_request_style_parse() {
        assert_eq!(RequestStyle::parse("by-mode"), Some(RequestStyle::ByMode));
        assert_eq!(RequestStyle::parse("POST-ALL"), Some(RequestStyle::PostAll));
        assert_eq!(RequestStyle::parse("sometimes"), None);
    }

    #[test]
    fn test_endpoint_join() {
        let client = SiyuanClient::new(
            "http://127.0.0.1:6806/",
            None,
            RequestStyle::ByMode,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("/api/system/version"),
            "http://127.0.0.1:6806/api/system/version"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = SiyuanClient::new("not a url", None, RequestStyle::ByMode, Duration::from_secs(5))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "transport_error");
    }

    /// Accept one HTTP request, answer with `body`, and hand back the raw request.
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        serve_once_with_status("200 OK", body).await
    }

    async fn serve_once_with_status(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_siyuan_client_posts_json_body_with_token() {
        let (base_url, server) = serve_once(r#"{"code":0,"msg":"","data":{"id":"abc"}}"#).await;
        let client = SiyuanClient::new(
            &base_url,
            Some("secret".into()),
            RequestStyle::ByMode,
            Duration::from_secs(5),
        )
        .unwrap();

        let request = BackendRequest {
            path: "/api/notification/pushMsg".into(),
            kind: RequestKind::Write,
            params: push_msg_params(),
        };
        let body = client.send(&request).await.unwrap();
        assert_eq!(unwrap_envelope(body).unwrap(), json!({ "id": "abc" }));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/notification/pushMsg "));
        assert!(raw.to_ascii_lowercase().contains("authorization: token secret"));
        assert!(raw.contains(r#""msg":"Hello World""#));
        assert!(raw.contains(r#""timeout":7000"#));
    }

    #[tokio::test]
    async fn test_siyuan_client_reads_with_get() {
        let (base_url, server) = serve_once(r#"{"code":0,"msg":"","data":"2.8.8"}"#).await;
        let client =
            SiyuanClient::new(&base_url, None, RequestStyle::ByMode, Duration::from_secs(5))
                .unwrap();

        let request = BackendRequest {
            path: "/api/system/version".into(),
            kind: RequestKind::Read,
            params: ParamSchema::empty().validate(&json!({})).unwrap(),
        };
        let body = client.send(&request).await.unwrap();
        assert_eq!(unwrap_envelope(body).unwrap(), json!("2.8.8"));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/system/version "));
        assert!(!raw.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_siyuan_client_post_all_style() {
        let (base_url, server) = serve_once(r#"{"code":0,"msg":"","data":null}"#).await;
        let client =
            SiyuanClient::new(&base_url, None, RequestStyle::PostAll, Duration::from_secs(5))
                .unwrap();

        let request = BackendRequest {
            path: "/api/system/currentTime".into(),
            kind: RequestKind::Read,
            params: ParamSchema::empty().validate(&json!({})).unwrap(),
        };
        client.send(&request).await.unwrap();

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/system/currentTime "));
    }

    fn version_request() -> BackendRequest {
        BackendRequest {
            path: "/api/system/version".into(),
            kind: RequestKind::Read,
            params: ParamSchema::empty().validate(&json!({})).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_siyuan_client_error_status_with_failure_envelope() {
        let (base_url, server) =
            serve_once_with_status("500 Internal Server Error", r#"{"code":-1,"msg":"boom"}"#)
                .await;
        let client =
            SiyuanClient::new(&base_url, None, RequestStyle::ByMode, Duration::from_secs(5))
                .unwrap();

        let body = client.send(&version_request()).await.unwrap();
        assert_eq!(
            unwrap_envelope(body).unwrap_err(),
            CommandError::Backend {
                code: -1,
                msg: "boom".into()
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_siyuan_client_error_status_never_succeeds() {
        let (base_url, server) = serve_once_with_status(
            "502 Bad Gateway",
            r#"{"code":0,"msg":"","data":{"id":"abc"}}"#,
        )
        .await;
        let client =
            SiyuanClient::new(&base_url, None, RequestStyle::ByMode, Duration::from_secs(5))
                .unwrap();

        let err = client.send(&version_request()).await.unwrap_err();
        assert_eq!(err.kind(), "transport_error");
        assert!(err.to_string().contains("502"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_siyuan_client_malformed_body() {
        let (base_url, server) = serve_once("<html>oops</html>").await;
        let client =
            SiyuanClient::new(&base_url, None, RequestStyle::PostAll, Duration::from_secs(5))
                .unwrap();

        let request = BackendRequest {
            path: "/api/system/version".into(),
            kind: RequestKind::Read,
            params: ParamSchema::empty().validate(&json!({})).unwrap(),
        };
        let err = client.send(&request).await.unwrap_err();
        assert_eq!(err.kind(), "transport_error");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_siyuan_client_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = SiyuanClient::new(
            &format!("http://{}", addr),
            None,
            RequestStyle::ByMode,
            Duration::from_secs(5),
        )
        .unwrap();
        let request = BackendRequest {
            path: "/api/system/version".into(),
            kind: RequestKind::Read,
            params: ParamSchema::empty().validate(&json!({})).unwrap(),
        };
        let err = client.send(&request).await.unwrap_err();
        assert_eq!(err.kind(), "transport_error");
    }
}
