//! 过期会话清理的后台任务。

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::SESSION_PRUNE_INTERVAL_SECS;
use crate::session::SessionManager;

/// 启动会话清理任务，按固定间隔移除过期会话。
///
/// 返回任务句柄，嵌入方停机时可以 `abort`。
pub fn spawn_session_pruner(manager: Arc<SessionManager>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SESSION_PRUNE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            manager.prune_expired().await;
        }
    })
}
