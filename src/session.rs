//! 会话管理：按需创建、TTL 过期与显式结束。

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::DEFAULT_SESSION_TTL_SECS;
use crate::error::UploadAuthError;

/// Process-wide session registry with on-demand creation and fixed TTL expiry.
#[derive(Debug)]
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Arc<SessionInner>>>,
    session_ttl: Duration,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    expires_at: Instant,
    ended: bool,
    values: HashMap<String, Value>,
}

/// 显式传递的会话上下文句柄，可廉价克隆。
///
/// 会话被结束或过期后，句柄上的所有操作返回 `SessionUnavailable`。
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// 使用默认 TTL 创建会话管理器。
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }

    /// 使用指定 TTL 创建会话管理器。过期时刻在会话创建时确定，不随访问刷新。
    pub fn with_ttl(session_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            session_ttl,
        }
    }

    /// 打开指定标识的会话：不存在或已过期时新建一代。
    pub async fn open(&self, id: &str) -> Session {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(id) {
            let mut state = existing.state.lock().await;
            if !state.ended && Instant::now() < state.expires_at {
                drop(state);
                return Session {
                    inner: Arc::clone(existing),
                };
            }
            // 旧一代已过期：标记后整体替换。
            state.ended = true;
        }

        let inner = Arc::new(SessionInner {
            id: id.to_string(),
            state: Mutex::new(SessionState {
                expires_at: Instant::now() + self.session_ttl,
                ended: false,
                values: HashMap::new(),
            }),
        });
        sessions.insert(id.to_string(), Arc::clone(&inner));
        debug!(session = id, "session started");
        Session { inner }
    }

    /// 显式结束会话（登出时调用）；未命中时静默返回。
    pub async fn end(&self, id: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(inner) = sessions.remove(id) {
            inner.state.lock().await.ended = true;
            info!(session = id, "session ended");
        }
    }

    /// 清理已过期的会话。
    pub async fn prune_expired(&self) {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let mut expired = Vec::new();
        for (id, inner) in sessions.iter() {
            let mut state = inner.state.lock().await;
            if state.ended || state.expires_at <= now {
                state.ended = true;
                expired.push(id.clone());
            }
        }
        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "pruned expired sessions");
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// 返回会话标识。
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// 读取指定键的值（克隆返回）。
    pub async fn get(&self, key: &str) -> Result<Option<Value>, UploadAuthError> {
        self.read(|values| values.get(key).cloned()).await
    }

    /// 写入指定键的值，覆盖旧值。
    pub async fn insert(&self, key: &str, value: Value) -> Result<(), UploadAuthError> {
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
        .await
    }

    /// 在会话数据上执行只读访问。
    pub async fn read<R>(
        &self,
        reader: impl FnOnce(&HashMap<String, Value>) -> R,
    ) -> Result<R, UploadAuthError> {
        let state = self.inner.state.lock().await;
        self.ensure_live(&state)?;
        Ok(reader(&state.values))
    }

    /// 在会话锁内执行读改写，保证并发调用间互不丢失写入。
    pub async fn update<R>(
        &self,
        updater: impl FnOnce(&mut HashMap<String, Value>) -> R,
    ) -> Result<R, UploadAuthError> {
        let mut state = self.inner.state.lock().await;
        self.ensure_live(&state)?;
        Ok(updater(&mut state.values))
    }

    fn ensure_live(&self, state: &SessionState) -> Result<(), UploadAuthError> {
        if state.ended || state.expires_at <= Instant::now() {
            return Err(UploadAuthError::SessionUnavailable(self.inner.id.clone()));
        }
        Ok(())
    }
}
