//! HTTP transport for GraphQL requests

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Server returned error: {status} - {message}")]
    ServerError { status: u16, message: String },
    #[error("Invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Body of a GraphQL POST
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: Map<String, Value>,
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>, variables: Map<String, Value>) -> Self {
        Self {
            query: query.into(),
            variables,
            operation_name: None,
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Sends one GraphQL request and returns the decoded response body
pub trait GraphQLTransport {
    fn execute(
        &self,
        request: &GraphQLRequest,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

impl<T: GraphQLTransport + Sync> GraphQLTransport for &T {
    fn execute(
        &self,
        request: &GraphQLRequest,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send {
        (**self).execute(request)
    }
}

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub auth_token: Option<String>,
    pub cookies: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            auth_token: None,
            cookies: Vec::new(),
            headers: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url, options: &TransportOptions) -> Result<Self, ClientError> {
        let client = Client::builder()
            .default_headers(build_headers(options)?)
            .timeout(options.timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Get the endpoint URL for this transport
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST a JSON body to the endpoint and decode the JSON response
    pub async fn post<T>(&self, data: &T) -> Result<Value, ClientError>
    where
        T: Serialize + Sync,
    {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::ServerError { status, message });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl GraphQLTransport for HttpTransport {
    async fn execute(&self, request: &GraphQLRequest) -> Result<Value, ClientError> {
        self.post(request).await
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn build_headers(options: &TransportOptions) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = &options.auth_token {
        let value = header_value("Authorization", &format!("Bearer {token}"))?;
        headers.insert(AUTHORIZATION, value);
    }

    if !options.cookies.is_empty() {
        let cookie = options
            .cookies
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert(COOKIE, header_value("Cookie", &cookie)?);
    }

    for (name, value) in &options.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        headers.insert(header_name, header_value(name, value)?);
    }

    Ok(headers)
}
