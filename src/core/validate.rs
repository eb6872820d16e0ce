use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AdminError, Result};

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid key pattern"));

static API_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://.+").expect("valid url pattern"));

/// 校验新 key：去掉首尾空白后非空，且只包含字母、数字、_、-
pub fn validate_key(raw: &str) -> Result<String> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(AdminError::EmptyKey);
    }
    if !KEY_PATTERN.is_match(key) {
        return Err(AdminError::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

/// API 地址必须以 http:// 或 https:// 开头
pub fn validate_api_url(url: &str) -> Result<()> {
    if API_URL_PATTERN.is_match(url) {
        Ok(())
    } else {
        Err(AdminError::InvalidApiUrl)
    }
}
