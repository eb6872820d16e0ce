pub mod coerce;
pub mod draft;
pub mod validate;

use std::collections::BTreeMap;

pub use draft::{Draft, DraftState, NewEntryDraft, ValueEditor};

use crate::api::{ApiClient, Transport};
use crate::error::{AdminError, Result};
use crate::models::{ConfigMap, ConfigValue, ValueType};
use crate::session::SessionStore;
use validate::{validate_api_url, validate_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

/// 唯一的用户可见提示，新提示覆盖旧提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// 配置编辑器：登录状态机 + 快照 + 每个 key 的草稿
pub struct ConfigEditor<S, T> {
    client: ApiClient<S, T>,
    snapshot: Option<ConfigMap>,
    drafts: BTreeMap<String, Draft>,
    new_row: Option<NewEntryDraft>,
    loading: bool,
    notice: Option<Notice>,
}

impl<S: SessionStore, T: Transport> ConfigEditor<S, T> {
    pub fn new(client: ApiClient<S, T>) -> Self {
        Self {
            client,
            snapshot: None,
            drafts: BTreeMap::new(),
            new_row: None,
            loading: false,
            notice: None,
        }
    }

    pub fn client(&self) -> &ApiClient<S, T> {
        &self.client
    }

    pub fn session_state(&self) -> SessionState {
        if self.client.token().is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_state() == SessionState::LoggedIn
    }

    pub fn api_url(&self) -> String {
        self.client.base_url()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.notice {
            Some(Notice::Error(msg)) => Some(msg),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&ConfigMap> {
        self.snapshot.as_ref()
    }

    /// 快照中的 key，已排序
    pub fn keys(&self) -> Vec<&str> {
        self.snapshot
            .as_ref()
            .map(|s| s.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn drafts(&self) -> &BTreeMap<String, Draft> {
        &self.drafts
    }

    pub fn draft(&self, key: &str) -> Option<&Draft> {
        self.drafts.get(key)
    }

    pub fn draft_state(&self, key: &str) -> Option<DraftState> {
        let draft = self.drafts.get(key)?;
        let loaded = self
            .snapshot
            .as_ref()
            .and_then(|s| s.get(key))
            .and_then(ConfigValue::from_json);
        if loaded.as_ref() == Some(draft.value()) {
            Some(DraftState::Clean)
        } else {
            Some(DraftState::Dirty)
        }
    }

    // ---- 本地草稿编辑，不触发网络请求 ----

    pub fn set_draft_value(&mut self, key: &str, value: ConfigValue) -> bool {
        match self.drafts.get_mut(key) {
            Some(draft) => {
                draft.set_value(value);
                true
            }
            None => false,
        }
    }

    pub fn set_draft_type(&mut self, key: &str, value_type: ValueType) -> bool {
        match self.drafts.get_mut(key) {
            Some(draft) => {
                draft.set_type(value_type);
                true
            }
            None => false,
        }
    }

    pub fn cycle_draft_type(&mut self, key: &str) -> Option<ValueType> {
        let draft = self.drafts.get_mut(key)?;
        let next = draft.value_type().next();
        draft.set_type(next);
        Some(next)
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    // ---- 新增行 ----

    pub fn is_new_row_open(&self) -> bool {
        self.new_row.is_some()
    }

    /// 已打开时不做任何事
    pub fn open_new_row(&mut self) {
        if self.new_row.is_none() {
            self.new_row = Some(NewEntryDraft::default());
        }
    }

    pub fn cancel_new_row(&mut self) {
        self.new_row = None;
    }

    pub fn new_row(&self) -> Option<&NewEntryDraft> {
        self.new_row.as_ref()
    }

    pub fn new_row_mut(&mut self) -> Option<&mut NewEntryDraft> {
        self.new_row.as_mut()
    }

    // ---- 会话 ----

    /// 清除 token 和内存中的配置，回到 LoggedOut
    pub fn logout(&mut self) {
        self.reset_state();
        if let Err(e) = self.client.clear_token() {
            tracing::error!("failed to clear token: {}", e);
            self.notice = Some(Notice::Error(e.to_string()));
            return;
        }
        tracing::info!("logged out");
    }

    /// 清除 API 地址和 token
    pub fn reset_api_url(&mut self) {
        self.reset_state();
        let result = self
            .client
            .clear_token()
            .and_then(|_| self.client.clear_base_url());
        if let Err(e) = result {
            tracing::error!("failed to reset session: {}", e);
            self.notice = Some(Notice::Error(e.to_string()));
            return;
        }
        tracing::info!("api url and session cleared");
    }

    fn reset_state(&mut self) {
        self.snapshot = None;
        self.drafts.clear();
        self.new_row = None;
        self.notice = None;
    }

    // ---- 网络操作：先清提示并置 loading，结束时无论成败都清 loading ----

    fn begin(&mut self) {
        self.notice = None;
        self.loading = true;
    }

    fn finish(&mut self, result: Result<Option<String>>) -> bool {
        self.loading = false;
        match result {
            Ok(info) => {
                self.notice = info.map(Notice::Info);
                true
            }
            Err(e) if e.is_unauthorized() && self.is_logged_in() => {
                tracing::warn!("session rejected by server, logging out: {}", e);
                self.reset_state();
                if let Err(clear_err) = self.client.clear_token() {
                    tracing::error!("failed to clear token: {}", clear_err);
                }
                self.notice = Some(Notice::Error(format!("session expired: {}", e)));
                false
            }
            Err(e) => {
                tracing::warn!("operation failed: {}", e);
                self.notice = Some(Notice::Error(e.to_string()));
                false
            }
        }
    }

    pub async fn login(&mut self, api_url: &str, username: &str, password: &str) -> bool {
        self.begin();
        let result = self.try_login(api_url, username, password).await;
        self.finish(result.map(|_| None))
    }

    async fn try_login(&mut self, api_url: &str, username: &str, password: &str) -> Result<()> {
        let normalized = self.client.set_base_url(api_url)?;
        validate_api_url(&normalized)?;
        let token = self.client.login(username, password).await?;
        self.client.set_token(&token)?;
        tracing::info!(api_url = %normalized, username, "logged in");
        self.load_snapshot().await
    }

    /// 重新拉取完整配置并重建全部草稿，未保存的修改全部丢弃
    pub async fn reload(&mut self) -> bool {
        self.begin();
        let result = self.load_snapshot().await;
        self.finish(result.map(|_| None))
    }

    async fn load_snapshot(&mut self) -> Result<()> {
        match self.client.get_config().await {
            Ok(config) => {
                self.drafts = config
                    .iter()
                    .filter_map(|(k, v)| {
                        ConfigValue::from_json(v).map(|value| (k.clone(), Draft::from_value(value)))
                    })
                    .collect();
                tracing::info!(keys = config.len(), "config loaded");
                self.snapshot = Some(config);
                Ok(())
            }
            Err(e) => {
                self.snapshot = None;
                self.drafts.clear();
                Err(e)
            }
        }
    }

    /// 只 PATCH 这一个 key 的草稿值，然后整体重新加载
    pub async fn save_key(&mut self, key: &str) -> bool {
        self.begin();
        let result = self.try_save_key(key).await;
        self.finish(result.map(|_| Some(format!("Saved '{}'", key))))
    }

    async fn try_save_key(&mut self, key: &str) -> Result<()> {
        let draft = self
            .drafts
            .get(key)
            .ok_or_else(|| AdminError::NothingToSave(key.to_string()))?;
        let mut partial = BTreeMap::new();
        partial.insert(key.to_string(), draft.value().clone());
        self.client.patch_config(&partial).await?;
        tracing::info!(key, "config key saved");
        self.load_snapshot().await
    }

    pub async fn delete_key(&mut self, key: &str) -> bool {
        self.begin();
        let result = self.try_delete_key(key).await;
        self.finish(result.map(|_| Some(format!("Deleted '{}'", key))))
    }

    async fn try_delete_key(&mut self, key: &str) -> Result<()> {
        self.client.delete_key(key).await?;
        tracing::info!(key, "config key deleted");
        self.load_snapshot().await
    }

    /// 校验并创建新增行中的 key，成功后关闭新增行并重新加载。
    /// 新增行未打开时返回 false。
    pub async fn create_new_key(&mut self) -> bool {
        let Some(row) = self.new_row.clone() else {
            return false;
        };
        self.begin();
        let result = self.try_create(&row).await;
        self.finish(result.map(|key| Some(format!("Created '{}'", key))))
    }

    async fn try_create(&mut self, row: &NewEntryDraft) -> Result<String> {
        let key = validate_key(&row.key)?;
        if self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.contains_key(&key))
        {
            return Err(AdminError::DuplicateKey(key));
        }
        let value = row.value()?;

        self.client.create_key(&key, &value).await?;
        tracing::info!(key = %key, value_type = %value.value_type(), "config key created");
        self.new_row = None;
        self.load_snapshot().await?;
        Ok(key)
    }
}
