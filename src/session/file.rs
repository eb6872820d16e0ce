use std::path::{Path, PathBuf};

use super::{SessionData, SessionSlot, SessionStore};
use crate::error::Result;

/// 会话存储：内存状态 + JSON 文件持久化
pub struct FileSessionStore {
    data: SessionData,
    file_path: PathBuf,
}

impl FileSessionStore {
    /// 从 JSON 文件加载会话。文件不存在则为空会话，文件损坏则记录警告并从空会话开始。
    pub fn load(file_path: &Path) -> Result<Self> {
        let data = if file_path.exists() {
            match std::fs::read_to_string(file_path) {
                Ok(content) if content.trim().is_empty() => SessionData::default(),
                Ok(content) => match serde_json::from_str::<SessionData>(&content) {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::warn!("session file is corrupt, starting empty: {}", e);
                        SessionData::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("cannot read session file, starting empty: {}", e);
                    SessionData::default()
                }
            }
        } else {
            SessionData::default()
        };

        tracing::debug!(path = %file_path.display(), "session loaded");
        Ok(Self {
            data,
            file_path: file_path.to_path_buf(),
        })
    }

    /// 将会话序列化写入文件
    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;

        // 确保父目录存在
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.file_path, json)?;
        Ok(())
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, slot: SessionSlot) -> Option<String> {
        self.data.get(slot).map(str::to_string)
    }

    /// 写时持久化，失败回滚
    fn set(&mut self, slot: SessionSlot, value: &str) -> Result<()> {
        let old = self.data.slot_mut(slot).replace(value.to_string());
        if let Err(e) = self.save() {
            *self.data.slot_mut(slot) = old;
            return Err(e);
        }
        Ok(())
    }

    fn clear(&mut self, slot: SessionSlot) -> Result<()> {
        let old = self.data.slot_mut(slot).take();
        if old.is_none() {
            return Ok(());
        }
        if let Err(e) = self.save() {
            *self.data.slot_mut(slot) = old;
            return Err(e);
        }
        Ok(())
    }
}
