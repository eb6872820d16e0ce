//! 通过 axum 在回环地址上暴露 StubBackend，用来验证真实的 HttpTransport。

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::stub::{StubBackend, StubError};

pub type ServerState = Arc<RwLock<StubBackend>>;

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn bearer_token(request: &Request<axum::body::Body>) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// 认证中间件：校验 Authorization: Bearer <token>
async fn auth_middleware(
    State(backend): State<ServerState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StubError> {
    let token = bearer_token(&request);
    let username = backend.read().await.authorize(token.as_deref())?;

    let mut request = request;
    request.extensions_mut().insert(username);
    Ok(next.run(request).await)
}

async fn login(
    State(backend): State<ServerState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StubError> {
    backend.write().await.login(Some(&body)).map(Json)
}

async fn me(
    State(backend): State<ServerState>,
    axum::Extension(username): axum::Extension<String>,
) -> Json<Value> {
    Json(backend.read().await.me(&username))
}

async fn get_config(State(backend): State<ServerState>) -> Json<Value> {
    Json(backend.read().await.get_config())
}

async fn patch_config(
    State(backend): State<ServerState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StubError> {
    backend.write().await.patch_config(Some(&body)).map(Json)
}

async fn create_key(
    State(backend): State<ServerState>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StubError> {
    backend.write().await.create_key(&key, Some(&body)).map(Json)
}

async fn delete_key(
    State(backend): State<ServerState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, StubError> {
    backend.write().await.delete_key(&key).map(Json)
}

/// /auth/login 不经过认证中间件
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/config", get(get_config).patch(patch_config))
        .route("/config/{key}", post(create_key).delete(delete_key))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .route("/auth/login", post(login))
        .with_state(state)
}

/// 在随机端口启动服务，返回 base URL
pub async fn spawn(state: ServerState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiClient;
    use crate::api::stub::{STUB_PASSWORD, STUB_USER};
    use crate::api::transport::HttpTransport;
    use crate::error::AdminError;
    use crate::models::ConfigValue;
    use crate::session::MemorySessionStore;
    use std::collections::BTreeMap;

    async fn http_client() -> (ApiClient<MemorySessionStore, HttpTransport>, ServerState) {
        let state: ServerState = Arc::new(RwLock::new(StubBackend::new()));
        let base_url = spawn(state.clone()).await;
        let mut client = ApiClient::new(MemorySessionStore::new(), HttpTransport::new());
        // 末尾斜杠应被去掉
        client.set_base_url(&format!("{}/", base_url)).unwrap();
        (client, state)
    }

    #[tokio::test]
    async fn test_http_login_bad_credentials() {
        let (client, _) = http_client().await;
        let err = client.login(STUB_USER, "nope").await.unwrap_err();
        assert!(matches!(err, AdminError::Api { status: 401, .. }));
        assert_eq!(err.to_string(), "bad credentials");
    }

    #[tokio::test]
    async fn test_http_requires_bearer() {
        let (client, _) = http_client().await;
        let err = client.get_config().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "missing token");
    }

    #[tokio::test]
    async fn test_http_full_cycle() {
        let (mut client, state) = http_client().await;
        let token = client.login(STUB_USER, STUB_PASSWORD).await.unwrap();
        client.set_token(&token).unwrap();

        let me = client.me().await.unwrap();
        assert_eq!(me["username"], json!(STUB_USER));

        client
            .create_key("db_port", &ConfigValue::Number(5432.0))
            .await
            .unwrap();
        client
            .create_key("debug", &ConfigValue::Boolean(false))
            .await
            .unwrap();

        let mut partial = BTreeMap::new();
        partial.insert("debug".to_string(), ConfigValue::Boolean(true));
        client.patch_config(&partial).await.unwrap();

        let config = client.get_config().await.unwrap();
        assert_eq!(config["db_port"], json!(5432));
        assert_eq!(config["debug"], json!(true));

        client.delete_key("db_port").await.unwrap();
        assert!(!state.read().await.config().contains_key("db_port"));
    }

    #[tokio::test]
    async fn test_http_key_is_path_encoded() {
        let (mut client, state) = http_client().await;
        let token = client.login(STUB_USER, STUB_PASSWORD).await.unwrap();
        client.set_token(&token).unwrap();

        client
            .create_key("odd key/1", &ConfigValue::String("v".into()))
            .await
            .unwrap();
        assert_eq!(state.read().await.config()["odd key/1"], json!("v"));

        client.delete_key("odd key/1").await.unwrap();
        assert!(state.read().await.config().is_empty());
    }

    #[tokio::test]
    async fn test_http_delete_missing_key() {
        let (mut client, _) = http_client().await;
        let token = client.login(STUB_USER, STUB_PASSWORD).await.unwrap();
        client.set_token(&token).unwrap();

        let err = client.delete_key("missing").await.unwrap_err();
        assert!(matches!(err, AdminError::Api { status: 404, .. }));
        assert_eq!(err.to_string(), "key not found");
    }
}
