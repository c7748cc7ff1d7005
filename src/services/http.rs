//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single file sent as the `file` part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// GET with a bearer token
    async fn get(&self, url: &str, bearer: &str) -> Result<HttpResponse>;

    /// PUT a JSON body with a bearer token
    async fn put_json(&self, url: &str, bearer: &str, body: &serde_json::Value)
    -> Result<HttpResponse>;

    /// POST a multipart form holding one file plus text fields
    async fn post_multipart(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        fields: &[(&str, &str)],
        upload: FileUpload,
    ) -> Result<HttpResponse>;
}

pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn finish(method: &str, url: &str, response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Reading response body: {e}")))?;

        debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, bearer: &str) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("GET {url} failed: {e}")))?;
        Self::finish("GET", url, response).await
    }

    async fn put_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        debug!("PUT {}", url);
        let response = self
            .client
            .put(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("PUT {url} failed: {e}")))?;
        Self::finish("PUT", url, response).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        fields: &[(&str, &str)],
        upload: FileUpload,
    ) -> Result<HttpResponse> {
        debug!("POST {} ({}, {} bytes)", url, upload.file_name, upload.bytes.len());
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime)
            .map_err(|e| ApiError::Network(format!("Invalid upload mime type: {e}")))?;

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        form = form.part("file", part);

        let mut request = self.client.post(url).multipart(form);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("POST {url} failed: {e}")))?;
        Self::finish("POST", url, response).await
    }
}
