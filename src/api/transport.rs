use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};

use crate::error::{AdminError, Result};

/// 一次发往配置服务的请求
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub base_url: String,
    /// 路径段，未编码；发送时逐段做百分号编码
    pub path: Vec<String>,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, base_url: &str, path: &[&str]) -> Self {
        Self {
            method,
            base_url: base_url.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
            bearer: None,
            body: None,
        }
    }

    pub fn path_display(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    /// base URL + 编码后的路径段
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AdminError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AdminError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().extend(self.path.iter());
        }
        Ok(url)
    }
}

/// 原始响应：状态码 + 响应体文本，解析策略由客户端决定
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 请求传输层
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// 基于 reqwest 的 HTTP 传输
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = request.url()?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}
