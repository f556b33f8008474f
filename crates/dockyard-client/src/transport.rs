//! HTTP transport for the control service REST API
//!
//! Every call is a single request: the body is sent as JSON, the response
//! code is checked against the endpoint's success codes and its table of
//! rejection codes, and anything else surfaces as
//! [`Error::UnexpectedResponse`]. Nothing is retried here.

use dockyard_common::{ClientConfig, Error, Rejection, Result};
use reqwest::{Certificate, Identity, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::{Instrument, Span, debug, field, info_span, warn};
use uuid::Uuid;

/// Header carrying the correlation ID of a request
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Status codes an endpoint reports rejections with
pub type ErrorCodes = &'static [(StatusCode, Rejection)];

/// Sends requests relative to the API base URL
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Build a transport from client configuration
    ///
    /// Idle connections are never kept, so each request opens its own.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);

        if let Some(tls) = &config.tls {
            let ca = Certificate::from_pem(&read_pem(&tls.ca_cluster_path)?)
                .map_err(|e| Error::configuration(format!("invalid cluster CA: {e}")))?;

            let mut identity_pem = read_pem(&tls.cert_path)?;
            identity_pem.push(b'\n');
            identity_pem.extend(read_pem(&tls.key_path)?);
            let identity = Identity::from_pem(&identity_pem)
                .map_err(|e| Error::configuration(format!("invalid client certificate: {e}")))?;

            builder = builder
                .add_root_certificate(ca)
                .identity(identity)
                .https_only(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::configuration(e.to_string()))?;

        Ok(Self::with_http_client(config.base_url(), http))
    }

    /// Use an already configured HTTP client
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL request paths are appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and decode the JSON response
    ///
    /// A response code in `success` is decoded into `T`. A code listed in
    /// `errors` becomes that rejection carrying the response body; any other
    /// code becomes [`Error::UnexpectedResponse`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        success: &[StatusCode],
        errors: ErrorCodes,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let trace_id = Uuid::new_v4();
        let span = info_span!(
            "http_request",
            method = %method,
            url = %url,
            trace_id = %trace_id,
            request_body = field::Empty,
            response_code = field::Empty,
            response_body = field::Empty,
        );
        if let Some(body) = &body {
            span.record("request_body", field::display(body));
        }

        self.send(method, url, trace_id, body, success, errors)
            .instrument(span)
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        trace_id: Uuid,
        body: Option<Value>,
        success: &[StatusCode],
        errors: ErrorCodes,
    ) -> Result<T> {
        let mut request = self
            .http
            .request(method, &url)
            .header(TRACE_ID_HEADER, trace_id.to_string());
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{url}: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{url}: {e}")))?;

        let span = Span::current();
        span.record("response_code", status.as_u16());
        span.record("response_body", text.as_str());

        if success.contains(&status) {
            debug!("request succeeded");
            return serde_json::from_str(&text).map_err(|e| Error::Decode(format!("{e}: {text}")));
        }

        warn!("request rejected with {}", status);
        Err(classify(status, text, errors))
    }
}

/// Map a non-success response to an error using the endpoint's table
fn classify(status: StatusCode, body: String, errors: ErrorCodes) -> Error {
    match errors.iter().find(|(code, _)| *code == status) {
        Some((_, rejection)) => rejection.into_error(body),
        None => Error::UnexpectedResponse {
            code: status.as_u16(),
            body,
        },
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::configuration(format!("failed to read {}: {}", path.display(), e)))
}
