//! Minimal HTTP client for JSON APIs with safe logging and bearer auth.
//!
//! - Request options: headers, bearer `Auth`, query params
//! - Redacts sensitive query params and never logs secret values
//! - Any status other than `200 OK` is an [`HttpError::Api`] carrying the status
//!   and the response body exactly as received
//! - Optional *raw* request/response logging via `HARVEST_HTTP_RAW=1`
//!
//! There are no retries: a failed call fails once and the caller decides what
//! to do with it.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), harvest_http::HttpError> {
//! let client = harvest_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", harvest_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::env;
use thiserror::Error;

const RAW_ENV: &str = "HARVEST_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if key.eq_ignore_ascii_case("authorization") {
                "Bearer <redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {body}")]
    Api {
        status: StatusCode,
        body: String,
        request_id: String,
    },
}

impl HttpError {
    /// Status code of an API error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Authentication strategies supported by the client.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
}

/// Per-request knobs. Requests carry no client-side timeout.
///
/// ```
/// use harvest_http::{Auth, RequestOpts};
///
/// let opts = RequestOpts {
///     auth: Some(Auth::Bearer("demo")),
///     query: Some(vec![("q", "term".into())]),
///     ..Default::default()
/// };
///
/// assert!(matches!(opts.auth, Some(Auth::Bearer("demo"))));
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. Relative paths passed to
    /// [`get_json`](Self::get_json) are joined onto it.
    ///
    /// ```
    /// use harvest_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("http://127.0.0.1:9000/api")?;
    /// assert_eq!(client.base().as_str(), "http://127.0.0.1:9000/api/");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { base, inner })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options (headers/query/auth).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::GET, path, opts).await
    }

    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let mut rb = self.inner.request(method.clone(), url.clone());

        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_bearer(tok)?;
                rb = rb.bearer_auth(tok);
                "bearer"
            }
            None => "none",
        };

        let redacted_q: Vec<(String, String)> = opts
            .query
            .as_ref()
            .map(|q| {
                q.iter()
                    .map(|(k, v)| {
                        let shown = if is_secret_param(k) {
                            "<redacted>".to_string()
                        } else {
                            v.as_ref().to_string()
                        };
                        ((*k).to_string(), shown)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let req_id = uuid::Uuid::new_v4().simple().to_string();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redacted_q,
            auth_kind,
            "http.request.start"
        );

        if raw_enabled() {
            let hdrs = opts.headers.as_ref().map(redact_headers).unwrap_or_default();
            tracing::debug!(target: "http.raw", %req_id, %method, url=%redact_url(&url), headers=?hdrs, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.send");
            HttpError::Network(err.to_string())
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.body");
            HttpError::Network(err.to_string())
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let x_request_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-transaction-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let remain = header_str(&headers, "x-rate-limit-remaining");
        let reset = header_str(&headers, "x-rate-limit-reset");

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%x_request_id,
            rate_limit.remaining=?remain,
            rate_limit.reset=?reset,
            "http.response.headers"
        );

        if raw_enabled() {
            let truncated = bytes.len() > RAW_MAX_BODY;
            let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?redact_headers(&headers),
                body=%String::from_utf8_lossy(shown),
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status != StatusCode::OK {
            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%extract_error_message(&bytes),
                x_request_id=%x_request_id,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
                request_id: x_request_id,
            });
        }

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            tracing::warn!(
                req_id=%req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e,
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Pull a human readable message out of an error body for logs.
///
/// Understands Twitter's `{"errors":[{"message"|"detail"|"title"}]}` and the flat
/// `{"message"|"detail"|"title"}` shapes; falls back to a body snippet.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize, Default)]
    struct Problem {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        title: String,
    }

    #[derive(Deserialize)]
    struct Problems {
        errors: Vec<Problem>,
    }

    fn first_non_empty(p: Problem) -> Option<String> {
        [p.message, p.detail, p.title]
            .into_iter()
            .find(|s| !s.is_empty())
    }

    if let Ok(list) = serde_json::from_slice::<Problems>(body) {
        if let Some(msg) = list.errors.into_iter().next().and_then(first_non_empty) {
            return msg;
        }
    }
    if let Ok(single) = serde_json::from_slice::<Problem>(body) {
        if let Some(msg) = first_non_empty(single) {
            return msg;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn redact_url(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("bearer token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "bearer token contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_bearer("  \"ab c\n\" ").unwrap(), "abc");
        assert!(sanitize_bearer("tök").is_err());
    }

    #[test]
    fn error_message_prefers_twitter_shape() {
        let body = br#"{"errors":[{"title":"Too Many Requests","detail":"slow down"}]}"#;
        assert_eq!(extract_error_message(body), "slow down");
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }

    #[test]
    fn redact_url_hides_secret_params() {
        let url = Url::parse("https://x.test/a?query=foo&token=abc").unwrap();
        let shown = redact_url(&url);
        assert!(shown.contains("query=foo"));
        assert!(!shown.contains("abc"));
    }

    #[tokio::test]
    async fn get_json_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/things"))
            .and(header("authorization", "Bearer secret"))
            .and(query_param("q", "term"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let got: serde_json::Value = client
            .get_json(
                "2/things",
                RequestOpts {
                    auth: Some(Auth::Bearer("secret")),
                    query: Some(vec![("q", "term".into())]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(got, json!({"ok": true}));
    }

    #[tokio::test]
    async fn default_opts_send_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2/things"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let got: serde_json::Value = client
            .get_json("2/things", RequestOpts::default())
            .await
            .unwrap();
        assert_eq!(got, json!({"ok": true}));
    }

    #[tokio::test]
    async fn non_200_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created-but-not-ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<serde_json::Value>("2/things", RequestOpts::default())
            .await
            .unwrap_err();

        match err {
            HttpError::Api { status, body, .. } => {
                assert_eq!(status, StatusCode::CREATED);
                assert_eq!(body, "created-but-not-ok");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<serde_json::Value>("x", RequestOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode(_, _)));
    }
}
