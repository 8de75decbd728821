//! 上传组件：选项装配、令牌签发与渲染产物。

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{
    DEFAULT_DROP_ZONE_CSS_SELECTOR, DEFAULT_PASTE_ZONE_CSS_SELECTOR, ELEMENT_ID_PREFIX,
};
use crate::error::UploadAuthError;
use crate::options::{ParamName, UploadOptions};
use crate::session::Session;
use crate::upload::{self, IssueParams};

/// 服务端上传组件实例。
///
/// 持有客户端插件的选项与授权入参，`render` 时签发令牌并产出渲染数据。
/// 把渲染数据嵌进页面是外部渲染方的职责。
#[derive(Clone, Debug)]
pub struct FileUploadWidget {
    identity: String,
    options: UploadOptions,
    destination_path_hint: String,
    correlation_id: Option<String>,
    extra_params: Value,
}

impl FileUploadWidget {
    /// 创建组件实例。拖放与粘贴目标默认指向 `body`。
    pub fn new(identity: impl Into<String>, upload_url: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            options: UploadOptions {
                drop_zone_css_selector: Some(DEFAULT_DROP_ZONE_CSS_SELECTOR.to_string()),
                paste_zone_css_selector: Some(DEFAULT_PASTE_ZONE_CSS_SELECTOR.to_string()),
                url: Some(upload_url.into()),
                ..Default::default()
            },
            destination_path_hint: String::new(),
            correlation_id: None,
            extra_params: Value::Null,
        }
    }

    /// 上传字段名，接受单个字段或字段名数组。
    pub fn param_name(mut self, name: impl Into<ParamName>) -> Self {
        self.options.param_name = Some(name.into());
        self
    }

    pub fn form_accept_charset(mut self, charset: impl Into<String>) -> Self {
        self.options.form_accept_charset = Some(charset.into());
        self
    }

    /// 拖放目标选择器，`None` 禁用拖放。
    pub fn drop_zone_css_selector(mut self, selector: Option<String>) -> Self {
        self.options.drop_zone_css_selector = selector;
        self
    }

    /// 粘贴目标选择器，`None` 禁用粘贴。
    pub fn paste_zone_css_selector(mut self, selector: Option<String>) -> Self {
        self.options.paste_zone_css_selector = selector;
        self
    }

    pub fn sequential_uploads(mut self, sequential: bool) -> Self {
        self.options.sequential_uploads = Some(sequential);
        self
    }

    pub fn limit_concurrent_uploads(mut self, limit: u32) -> Self {
        self.options.limit_concurrent_uploads = Some(limit);
        self
    }

    pub fn progress_interval(mut self, millis: u64) -> Self {
        self.options.progress_interval = Some(millis);
        self
    }

    pub fn bitrate_interval(mut self, millis: u64) -> Self {
        self.options.bitrate_interval = Some(millis);
        self
    }

    /// 随每次上传附带的额外表单字段。
    pub fn form_data(mut self, data: HashMap<String, String>) -> Self {
        self.options.form_data = Some(data);
        self
    }

    pub fn accept_file_types(mut self, pattern: impl Into<String>) -> Self {
        self.options.accept_file_types = Some(pattern.into());
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.options.max_file_size = Some(bytes);
        self
    }

    pub fn min_file_size(mut self, bytes: u64) -> Self {
        self.options.min_file_size = Some(bytes);
        self
    }

    pub fn max_number_of_files(mut self, count: u32) -> Self {
        self.options.max_number_of_files = Some(count);
        self
    }

    pub fn disable_validation(mut self, disable: bool) -> Self {
        self.options.disable_validation = Some(disable);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.options.url = Some(url.into());
        self
    }

    /// 上传文件预期写入位置的提示，原样存入授权记录。
    pub fn destination_path_hint(mut self, hint: impl Into<String>) -> Self {
        self.destination_path_hint = hint.into();
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn extra_params(mut self, params: Value) -> Self {
        self.extra_params = params;
        self
    }

    /// 渲染一次组件：签发上传授权并返回嵌入页面所需的数据。
    ///
    /// `render_seq` 由渲染方持有并单调递增，仅用于派生 DOM 元素 id，
    /// 同一页面多次渲染时保证 id 不冲突。
    pub async fn render(
        &self,
        session: &Session,
        render_seq: u64,
    ) -> Result<RenderedWidget, UploadAuthError> {
        let token = upload::issue(
            session,
            IssueParams {
                destination_path_hint: self.destination_path_hint.clone(),
                correlation_id: self.correlation_id.clone(),
                widget_identity: self.identity.clone(),
                extra_params: self.extra_params.clone(),
            },
        )
        .await?;

        Ok(RenderedWidget {
            element_id: format!("{ELEMENT_ID_PREFIX}{render_seq}"),
            token,
            options: self.options.to_map(),
        })
    }
}

/// 一次渲染的产物：元素 id、上传令牌与选项对象。
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedWidget {
    pub element_id: String,
    pub token: String,
    pub options: Map<String, Value>,
}

/// 渲染序号分配器，由渲染方持有。首次 `next` 返回 1。
#[derive(Debug, Default)]
pub struct RenderSequence(AtomicU64);

impl RenderSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionManager;
    use serde_json::json;

    async fn open_session() -> Session {
        SessionManager::new().open("alice").await
    }

    #[tokio::test]
    async fn render_issues_token_and_marshals_options() {
        let session = open_session().await;
        let widget = FileUploadWidget::new("gallery", "/files/upload")
            .param_name("photos")
            .max_file_size(5 * 1024 * 1024)
            .destination_path_hint("uploads/gallery")
            .correlation_id("album-7")
            .extra_params(json!({"owner": "alice"}));

        let rendered = widget.render(&session, 7).await.expect("render");
        assert_eq!(rendered.element_id, "drop-gate-upload-7");

        assert_eq!(
            Value::Object(rendered.options.clone()),
            json!({
                "paramName": "photos",
                "dropZoneCssSelector": "body",
                "pasteZoneCssSelector": "body",
                "maxFileSize": 5 * 1024 * 1024,
                "url": "/files/upload",
            })
        );

        let record = upload::lookup(&session, &rendered.token)
            .await
            .expect("lookup");
        assert_eq!(record.destination_path_hint, "uploads/gallery");
        assert_eq!(record.correlation_id, Some("album-7".to_string()));
        assert_eq!(record.widget_identity, "gallery");
        assert_eq!(record.extra_params, json!({"owner": "alice"}));

        let encoded = serde_json::to_value(&rendered).expect("encode");
        assert!(encoded.get("elementId").is_some());
        assert!(encoded.get("token").is_some());
    }

    #[tokio::test]
    async fn disabled_zones_are_absent_from_options() {
        let session = open_session().await;
        let widget = FileUploadWidget::new("plain", "/upload")
            .drop_zone_css_selector(None)
            .paste_zone_css_selector(Some("#paste".to_string()));

        let rendered = widget.render(&session, 1).await.expect("render");
        assert!(!rendered.options.contains_key("dropZoneCssSelector"));
        assert_eq!(
            rendered.options.get("pasteZoneCssSelector"),
            Some(&json!("#paste"))
        );
    }

    #[tokio::test]
    async fn render_defaults_store_null_extra_params() {
        let session = open_session().await;
        let rendered = FileUploadWidget::new("bare", "/upload")
            .render(&session, 1)
            .await
            .expect("render");

        let record = upload::lookup(&session, &rendered.token)
            .await
            .expect("lookup");
        assert_eq!(record.destination_path_hint, "");
        assert_eq!(record.correlation_id, None);
        assert_eq!(record.extra_params, Value::Null);
    }

    #[tokio::test]
    async fn each_render_issues_a_fresh_token() {
        let session = open_session().await;
        let widget = FileUploadWidget::new("gallery", "/upload");

        let first = widget.render(&session, 1).await.expect("first render");
        let second = widget.render(&session, 2).await.expect("second render");
        assert_ne!(first.token, second.token);
        assert_ne!(first.element_id, second.element_id);

        upload::lookup(&session, &first.token)
            .await
            .expect("first lookup");
        upload::lookup(&session, &second.token)
            .await
            .expect("second lookup");
    }

    #[tokio::test]
    async fn render_fails_on_expired_session() {
        let manager = SessionManager::with_ttl(std::time::Duration::ZERO);
        let session = manager.open("alice").await;

        let result = FileUploadWidget::new("gallery", "/upload")
            .render(&session, 1)
            .await;
        assert!(matches!(
            result,
            Err(UploadAuthError::SessionUnavailable(_))
        ));
    }

    #[test]
    fn render_sequence_is_monotonic() {
        let seq = RenderSequence::new();
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.next(), 3);
    }
}
