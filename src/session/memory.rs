use super::{SessionData, SessionSlot, SessionStore};
use crate::error::Result;

/// 纯内存会话存储，进程退出即丢失
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    data: SessionData,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: SessionData) -> Self {
        Self { data }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, slot: SessionSlot) -> Option<String> {
        self.data.get(slot).map(str::to_string)
    }

    fn set(&mut self, slot: SessionSlot, value: &str) -> Result<()> {
        *self.data.slot_mut(slot) = Some(value.to_string());
        Ok(())
    }

    fn clear(&mut self, slot: SessionSlot) -> Result<()> {
        *self.data.slot_mut(slot) = None;
        Ok(())
    }
}
