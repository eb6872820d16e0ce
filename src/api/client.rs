use std::collections::BTreeMap;

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::transport::{ApiRequest, Transport};
use crate::error::{AdminError, Result};
use crate::models::{ConfigMap, ConfigValue};
use crate::session::{SessionSlot, SessionStore};

/// 规范化 API 地址：去掉首尾空白和末尾的斜杠
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// 配置服务客户端：负责鉴权请求和会话（API 地址 + token）持久化
pub struct ApiClient<S, T> {
    store: S,
    transport: T,
}

impl<S: SessionStore, T: Transport> ApiClient<S, T> {
    pub fn new(store: S, transport: T) -> Self {
        Self { store, transport }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 已持久化的 API 地址，未设置时为空串
    pub fn base_url(&self) -> String {
        self.store.get(SessionSlot::ApiUrl).unwrap_or_default()
    }

    /// 规范化并持久化 API 地址，不校验 scheme
    pub fn set_base_url(&mut self, raw: &str) -> Result<String> {
        let normalized = normalize_base_url(raw);
        self.store.set(SessionSlot::ApiUrl, &normalized)?;
        Ok(normalized)
    }

    pub fn clear_base_url(&mut self) -> Result<()> {
        self.store.clear(SessionSlot::ApiUrl)
    }

    pub fn token(&self) -> Option<String> {
        self.store
            .get(SessionSlot::Token)
            .filter(|t| !t.is_empty())
    }

    pub fn set_token(&mut self, token: &str) -> Result<()> {
        self.store.set(SessionSlot::Token, token)
    }

    pub fn clear_token(&mut self) -> Result<()> {
        self.store.clear(SessionSlot::Token)
    }

    /// 发送请求并解析 JSON 响应体。
    /// 响应体无法解析时视为空对象；非 2xx 转为 Api 错误。
    async fn request(
        &self,
        method: Method,
        path: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let base_url = self.base_url();
        if base_url.is_empty() {
            return Err(AdminError::MissingApiUrl);
        }

        let mut request = ApiRequest::new(method, &base_url, path);
        request.bearer = self.token();
        request.body = body;

        let response = self.transport.send(&request).await?;
        tracing::debug!(
            method = %request.method,
            path = %request.path_display(),
            status = response.status,
            "api request"
        );

        let data: serde_json::Value =
            serde_json::from_str(&response.body).unwrap_or_else(|_| json!({}));

        if !response.is_success() {
            let message = data
                .get("error")
                .and_then(|e| e.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error {}", response.status));
            return Err(AdminError::Api {
                status: response.status,
                message,
            });
        }

        Ok(data)
    }

    /// POST /auth/login，成功返回 token（不在这里持久化）
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let data = self
            .request(
                Method::POST,
                &["auth", "login"],
                Some(json!({ "username": username, "password": password })),
            )
            .await?;
        let parsed: LoginResponse = serde_json::from_value(data).unwrap_or(LoginResponse { token: None });
        parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AdminError::UnexpectedResponse("login response did not contain a token".to_string())
            })
    }

    /// GET /auth/me
    pub async fn me(&self) -> Result<serde_json::Value> {
        self.request(Method::GET, &["auth", "me"], None).await
    }

    /// GET /config，完整键值表
    pub async fn get_config(&self) -> Result<ConfigMap> {
        match self.request(Method::GET, &["config"], None).await? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(AdminError::UnexpectedResponse(format!(
                "config is not an object: {}",
                other
            ))),
        }
    }

    /// POST /config/{key}，键已存在时由服务端拒绝
    pub async fn create_key(&self, key: &str, value: &ConfigValue) -> Result<()> {
        self.request(
            Method::POST,
            &["config", key],
            Some(json!({ "value": value.to_json() })),
        )
        .await?;
        Ok(())
    }

    /// PATCH /config，只影响参数中出现的 key
    pub async fn patch_config(&self, partial: &BTreeMap<String, ConfigValue>) -> Result<()> {
        let body: serde_json::Map<String, serde_json::Value> = partial
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        self.request(Method::PATCH, &["config"], Some(serde_json::Value::Object(body)))
            .await?;
        Ok(())
    }

    /// DELETE /config/{key}
    pub async fn delete_key(&self, key: &str) -> Result<()> {
        self.request(Method::DELETE, &["config", key], None).await?;
        Ok(())
    }
}
