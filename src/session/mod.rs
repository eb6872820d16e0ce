mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 会话存储中的两个具名槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSlot {
    ApiUrl,
    Token,
}

/// 持久化的会话数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SessionData {
    pub fn get(&self, slot: SessionSlot) -> Option<&str> {
        match slot {
            SessionSlot::ApiUrl => self.api_url.as_deref(),
            SessionSlot::Token => self.token.as_deref(),
        }
    }

    fn slot_mut(&mut self, slot: SessionSlot) -> &mut Option<String> {
        match slot {
            SessionSlot::ApiUrl => &mut self.api_url,
            SessionSlot::Token => &mut self.token,
        }
    }
}

/// 会话存储能力：API 地址和 token 的读写清除。
/// 写入即持久化，重启后仍然有效，直到显式清除。
pub trait SessionStore {
    fn get(&self, slot: SessionSlot) -> Option<String>;

    fn set(&mut self, slot: SessionSlot, value: &str) -> Result<()>;

    fn clear(&mut self, slot: SessionSlot) -> Result<()>;
}
