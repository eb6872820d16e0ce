#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("missing API URL")]
    MissingApiUrl,

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// 服务端返回非 2xx，message 取自响应体的 error 字段
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("key cannot be empty")]
    EmptyKey,

    #[error("key may only contain letters, digits, _ or -: {0}")]
    InvalidKey(String),

    #[error("key already exists: {0}")]
    DuplicateKey(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("API URL must start with http:// or https://")]
    InvalidApiUrl,

    #[error("nothing to save for key: {0}")]
    NothingToSave(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// 服务端拒绝了当前会话（token 过期或无效）
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminError::Api { status: 401, .. })
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
