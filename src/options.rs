//! 客户端上传组件的选项模型与扁平化序列化。

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// 上传字段名：单个字段或字段名数组。
///
/// 序列化为裸字符串或字符串数组，与客户端插件的 `paramName` 取值一致。
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamName {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for ParamName {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for ParamName {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<Vec<String>> for ParamName {
    fn from(names: Vec<String>) -> Self {
        Self::Multiple(names)
    }
}

/// 客户端上传插件识别的选项集合。
///
/// 每个选项都是可选的：未显式设置的选项不出现在序列化结果中，字段之间
/// 不做任何交叉校验。键名与客户端插件的选项名一一对应。
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_name: Option<ParamName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_accept_charset: Option<String>,
    /// 拖放目标选择器。`None` 表示禁用拖放，选项不输出。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_zone_css_selector: Option<String>,
    /// 粘贴目标选择器。`None` 表示禁用粘贴，选项不输出。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paste_zone_css_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_uploads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_concurrent_uploads: Option<u32>,
    /// 进度事件最小间隔，毫秒。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_interval: Option<u64>,
    /// 速率计算最小间隔，毫秒。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_interval: Option<u64>,
    /// 随每次上传附带的额外表单字段。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<HashMap<String, String>>,
    /// 允许的文件类型，正则源串。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_file_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_number_of_files: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_validation: Option<bool>,
    /// 上传端点地址。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl UploadOptions {
    /// 序列化为扁平的键值对象，只含已显式设置的选项。
    pub fn to_map(&self) -> Map<String, Value> {
        // 结构体只含 JSON 安全类型，序列化不会失败。
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
