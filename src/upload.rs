//! 上传授权注册表：令牌签发、查询与消费。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AUTHORIZED_UPLOADS_KEY, TOKEN_TIMESTAMP_FORMAT};
use crate::error::UploadAuthError;
use crate::session::Session;

/// 与单个上传令牌关联的授权记录。
///
/// 令牌本身是记录在会话桶内的键，不重复存放在记录中。各字段在此不做
/// 任何格式或安全校验，路径提示的语义由外部接收端负责。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRecord {
    /// 上传文件预期写入位置的提示。
    pub destination_path_hint: String,
    /// 调用方提供的关联标识，供外部监听方关联应用状态。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// 签发该记录的组件实例标识。
    pub widget_identity: String,
    /// 调用方提供的任意可序列化数据，按原样存取。
    pub extra_params: Value,
}

/// 签发授权时的入参。
#[derive(Clone, Debug)]
pub struct IssueParams {
    pub destination_path_hint: String,
    pub correlation_id: Option<String>,
    pub widget_identity: String,
    pub extra_params: Value,
}

/// 签发一次性上传授权并写入会话，返回令牌。
///
/// 会话不可用时返回 `SessionUnavailable`。令牌在会话生命周期内不会重复；
/// 同一会话的并发签发在会话锁上串行化，写入互不丢失。
pub async fn issue(session: &Session, params: IssueParams) -> Result<String, UploadAuthError> {
    let token = mint_token();
    let record = AuthorizationRecord {
        destination_path_hint: params.destination_path_hint,
        correlation_id: params.correlation_id,
        widget_identity: params.widget_identity,
        extra_params: params.extra_params,
    };
    let encoded = encode_record(&record);
    session
        .update(|values| bucket_insert(values, &token, encoded))
        .await?;

    info!(
        token,
        widget = record.widget_identity,
        destination = record.destination_path_hint,
        "issued upload authorization"
    );
    Ok(token)
}

/// 查询令牌对应的授权记录，不移除记录。
///
/// 令牌不存在、已被消费或记录无法解码时返回 `TokenNotFound`。
pub async fn lookup(session: &Session, token: &str) -> Result<AuthorizationRecord, UploadAuthError> {
    let found = session
        .read(|values| {
            values
                .get(AUTHORIZED_UPLOADS_KEY)
                .and_then(Value::as_object)
                .and_then(|bucket| bucket.get(token).cloned())
        })
        .await?;

    let Some(encoded) = found else {
        warn!(token, "unknown upload token");
        return Err(UploadAuthError::TokenNotFound(token.to_string()));
    };
    let record = decode_record(token, encoded)?;
    debug!(token, "upload authorization found");
    Ok(record)
}

/// 消费令牌：移除并返回授权记录（单次有效）。
///
/// 接收端应使用本操作而非 `lookup`，以保证每个令牌至多授权一次上传。
/// 无法解码的条目按未命中处理并一并移除。
pub async fn consume(
    session: &Session,
    token: &str,
) -> Result<AuthorizationRecord, UploadAuthError> {
    let removed = session
        .update(|values| {
            values
                .get_mut(AUTHORIZED_UPLOADS_KEY)
                .and_then(Value::as_object_mut)
                .and_then(|bucket| bucket.remove(token))
        })
        .await?;

    let Some(encoded) = removed else {
        warn!(token, "unknown upload token");
        return Err(UploadAuthError::TokenNotFound(token.to_string()));
    };
    let record = decode_record(token, encoded)?;
    info!(
        token,
        widget = record.widget_identity,
        "upload authorization consumed"
    );
    Ok(record)
}

/// 生成令牌：UTC 时间戳前缀加 v4 UUID 后缀。
fn mint_token() -> String {
    let timestamp = Utc::now().format(TOKEN_TIMESTAMP_FORMAT);
    format!("{timestamp}-{}", Uuid::new_v4().simple())
}

fn encode_record(record: &AuthorizationRecord) -> Value {
    let mut map = Map::new();
    map.insert(
        "destinationPathHint".to_string(),
        Value::String(record.destination_path_hint.clone()),
    );
    if let Some(correlation_id) = &record.correlation_id {
        map.insert(
            "correlationId".to_string(),
            Value::String(correlation_id.clone()),
        );
    }
    map.insert(
        "widgetIdentity".to_string(),
        Value::String(record.widget_identity.clone()),
    );
    map.insert("extraParams".to_string(), record.extra_params.clone());
    Value::Object(map)
}

fn decode_record(token: &str, encoded: Value) -> Result<AuthorizationRecord, UploadAuthError> {
    serde_json::from_value(encoded).map_err(|err| {
        warn!(token, error = %err, "authorization record malformed");
        UploadAuthError::TokenNotFound(token.to_string())
    })
}

fn bucket_insert(values: &mut HashMap<String, Value>, token: &str, record: Value) {
    let slot = values
        .entry(AUTHORIZED_UPLOADS_KEY.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(bucket) = slot {
        bucket.insert(token.to_string(), record);
    } else {
        // 保留键被非对象数据占用：按空桶覆盖，后写胜出。
        let mut bucket = Map::new();
        bucket.insert(token.to_string(), record);
        *slot = Value::Object(bucket);
    }
}
