//! 统一的库错误类型。

/// 注册表操作可能出现的错误。
///
/// 两种错误都属于可恢复的局部条件：`SessionUnavailable` 应使外层请求以
/// 服务端错误中止，`TokenNotFound` 应使接收端直接拒绝本次上传。
#[derive(Debug, thiserror::Error)]
pub enum UploadAuthError {
    /// 会话已过期或已结束，无法读写会话存储。
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
    /// 令牌不存在或已被消费。
    #[error("upload token not found: {0}")]
    TokenNotFound(String),
}
