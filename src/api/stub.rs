//! 测试用的内存配置服务：StubBackend 持有服务端状态，
//! StubTransport 直接在进程内分发请求，stub_server 则通过 axum 暴露同一份逻辑。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{json, Value};

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::Result;

pub const STUB_USER: &str = "admin";
pub const STUB_PASSWORD: &str = "secret";

#[derive(Debug)]
pub struct StubError {
    pub status: u16,
    pub message: String,
}

impl StubError {
    fn new(status: u16, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

/// 服务端状态：用户、已签发 token、配置表
pub struct StubBackend {
    users: HashMap<String, String>,
    tokens: HashMap<String, String>,
    config: serde_json::Map<String, Value>,
    issued: u32,
}

impl StubBackend {
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(STUB_USER.to_string(), STUB_PASSWORD.to_string());
        Self {
            users,
            tokens: HashMap::new(),
            config: serde_json::Map::new(),
            issued: 0,
        }
    }

    pub fn seed(&mut self, key: &str, value: Value) {
        self.config.insert(key.to_string(), value);
    }

    pub fn config(&self) -> &serde_json::Map<String, Value> {
        &self.config
    }

    /// 作废所有已签发的 token，模拟会话过期
    pub fn revoke_tokens(&mut self) {
        self.tokens.clear();
    }

    pub fn login(&mut self, body: Option<&Value>) -> std::result::Result<Value, StubError> {
        let body = body.ok_or_else(|| StubError::new(400, "missing body"))?;
        let username = body["username"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        match self.users.get(username) {
            Some(expected) if expected == password => {
                self.issued += 1;
                let token = format!("stub-token-{}", self.issued);
                self.tokens.insert(token.clone(), username.to_string());
                Ok(json!({ "token": token }))
            }
            _ => Err(StubError::new(401, "bad credentials")),
        }
    }

    /// 校验 Bearer token，返回对应用户名
    pub fn authorize(&self, bearer: Option<&str>) -> std::result::Result<String, StubError> {
        let token = bearer.ok_or_else(|| StubError::new(401, "missing token"))?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| StubError::new(401, "invalid token"))
    }

    pub fn me(&self, username: &str) -> Value {
        json!({ "username": username })
    }

    pub fn get_config(&self) -> Value {
        Value::Object(self.config.clone())
    }

    pub fn patch_config(&mut self, body: Option<&Value>) -> std::result::Result<Value, StubError> {
        let patch = body
            .and_then(Value::as_object)
            .ok_or_else(|| StubError::new(400, "patch must be an object"))?;
        for (k, v) in patch {
            self.config.insert(k.clone(), v.clone());
        }
        Ok(self.get_config())
    }

    pub fn create_key(
        &mut self,
        key: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, StubError> {
        if self.config.contains_key(key) {
            return Err(StubError::new(409, "key already exists"));
        }
        let value = body
            .and_then(|b| b.get("value"))
            .cloned()
            .ok_or_else(|| StubError::new(400, "missing value"))?;
        self.config.insert(key.to_string(), value.clone());
        let mut created = serde_json::Map::new();
        created.insert(key.to_string(), value);
        Ok(Value::Object(created))
    }

    pub fn delete_key(&mut self, key: &str) -> std::result::Result<Value, StubError> {
        match self.config.remove(key) {
            Some(_) => Ok(json!({ "ok": true })),
            None => Err(StubError::new(404, "key not found")),
        }
    }

    /// 按 method + 路径分发，除登录外都要求有效 token
    pub fn dispatch(
        &mut self,
        method: &str,
        path: &[&str],
        bearer: Option<&str>,
        body: Option<&Value>,
    ) -> std::result::Result<Value, StubError> {
        if let ("POST", ["auth", "login"]) = (method, path) {
            return self.login(body);
        }
        let username = self.authorize(bearer)?;
        match (method, path) {
            ("GET", ["auth", "me"]) => Ok(self.me(&username)),
            ("GET", ["config"]) => Ok(self.get_config()),
            ("PATCH", ["config"]) => self.patch_config(body),
            ("POST", ["config", key]) => self.create_key(key, body),
            ("DELETE", ["config", key]) => self.delete_key(key),
            _ => Err(StubError::new(404, "not found")),
        }
    }
}

/// 进程内传输：记录每个请求，可预置下一次的原始响应
pub struct StubTransport {
    backend: Mutex<StubBackend>,
    requests: Mutex<Vec<ApiRequest>>,
    scripted: Mutex<VecDeque<ApiResponse>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            backend: Mutex::new(StubBackend::new()),
            requests: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn seed(&self, key: &str, value: Value) {
        self.backend.lock().unwrap().seed(key, value);
    }

    pub fn server_config(&self) -> serde_json::Map<String, Value> {
        self.backend.lock().unwrap().config().clone()
    }

    pub fn revoke_tokens(&self) {
        self.backend.lock().unwrap().revoke_tokens();
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// 下一次请求直接返回给定的状态码和响应体
    pub fn respond_next(&self, status: u16, body: &str) {
        self.scripted.lock().unwrap().push_back(ApiResponse {
            status,
            body: body.to_string(),
        });
    }
}

impl Transport for StubTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(scripted) = self.scripted.lock().unwrap().pop_front() {
            return Ok(scripted);
        }

        let path: Vec<&str> = request.path.iter().map(String::as_str).collect();
        let result = self.backend.lock().unwrap().dispatch(
            request.method.as_str(),
            &path,
            request.bearer.as_deref(),
            request.body.as_ref(),
        );
        Ok(match result {
            Ok(value) => ApiResponse {
                status: 200,
                body: value.to_string(),
            },
            Err(e) => ApiResponse {
                status: e.status,
                body: json!({ "error": e.message }).to_string(),
            },
        })
    }
}
