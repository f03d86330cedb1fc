//! HTTP transport for talking to chat completion APIs.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{ClientError, Transport};
use crate::options::TransportOptions;

/// Build the pooled client for a set of transport options.
///
/// Extra headers become client defaults. A proxy URL or header that does not
/// parse fails the build instead of silently falling back to a direct
/// connection.
pub fn build_http_client(options: &TransportOptions) -> Result<Client, ClientError> {
    let TransportOptions::Http {
        timeout,
        proxy,
        headers,
    } = options;

    let mut builder = Client::builder();

    if let Some(t) = timeout {
        builder = builder.timeout(*t);
    }
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| config_error(format!("Invalid proxy {:?}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }
    if let Some(extra) = headers {
        builder = builder.default_headers(header_map(extra.iter())?);
    }

    Ok(builder.build()?)
}

fn header_map<'a>(
    headers: impl Iterator<Item = (&'a String, &'a String)>,
) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| config_error(format!("Invalid header name {:?}: {}", key, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| config_error(format!("Invalid value for header {:?}: {}", key, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn config_error(message: String) -> ClientError {
    ClientError::Transport {
        status: None,
        message,
    }
}

/// Body handling for chat completion responses, with debug logging.
#[async_trait]
trait ResponseExt {
    /// Decode a success body as JSON.
    async fn into_json(self) -> Result<Value, ClientError>;

    /// Turn a failed response into a transport error.
    async fn into_error(self) -> ClientError;
}

#[async_trait]
impl ResponseExt for reqwest::Response {
    async fn into_json(self) -> Result<Value, ClientError> {
        let text = self.text().await?;
        debug!("API response ({} bytes):\n{}", text.len(), text);

        serde_json::from_str(&text).map_err(|e| ClientError::ResponseParse(e.to_string()))
    }

    async fn into_error(self) -> ClientError {
        let status = self.status();
        match self.text().await {
            Ok(body) => {
                debug!("API error response ({} bytes):\n{}", body.len(), body);
                error_from_response(status, &body)
            }
            Err(e) => {
                debug!("Could not read body of HTTP {} response: {}", status, e);
                error_from_response(status, "")
            }
        }
    }
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    options: TransportOptions,
}

impl HttpTransport {
    pub fn new(options: TransportOptions) -> Result<Self, ClientError> {
        let http = build_http_client(&options)?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> Result<Value, ClientError> {
        let mut req = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .headers(header_map(headers.iter().map(|(k, v)| (k, v)))?);

        if let Ok(pretty) = serde_json::to_string_pretty(body) {
            debug!("API request body ({} bytes):\n{}", pretty.len(), pretty);
        }
        req = req.json(body);

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let err = response.into_error().await;
            warn!("Request to {} failed: {}", url, err);
            return Err(err);
        }

        response.into_json().await
    }
}

/// Turn a non-success response into a transport error, keeping the
/// provider's own message when the body carries one.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Nested { error }) | Ok(ErrorBody::Flat(error)) => match error.error_type {
            Some(kind) => format!("API error ({}): {}", kind, error.message),
            None => format!("API error: {}", error.message),
        },
        Ok(ErrorBody::Detail { detail }) => match detail {
            Value::String(s) => format!("API error: {}", s),
            other => format!("API error: {}", other),
        },
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => body.to_string(),
    };

    ClientError::Transport {
        status: Some(status.as_u16()),
        message,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Nested { error: ErrorDetail },
    Flat(ErrorDetail),
    Detail { detail: Value },
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
