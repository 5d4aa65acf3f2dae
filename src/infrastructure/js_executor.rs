//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{DriverError, DriverResult};

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力，每次执行都受超时约束
/// - 不认识记录 / 关键词
pub struct JsExecutor {
    page: Page,
    op_timeout: Duration,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, op_timeout: Duration) -> Self {
        Self { page, op_timeout }
    }

    /// 获取 page 的引用（用于导航等非脚本操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> DriverResult<JsonValue> {
        let js_code = js_code.into();
        let evaluation = tokio::time::timeout(self.op_timeout, self.page.evaluate(js_code))
            .await
            .map_err(|_| {
                debug!("脚本执行超时 ({:?})", self.op_timeout);
                DriverError::Timeout {
                    what: "脚本执行".to_string(),
                    timeout_ms: self.op_timeout.as_millis() as u64,
                }
            })??;
        let json_value = evaluation.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> DriverResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 当前页面 URL
    pub async fn current_url(&self) -> DriverResult<String> {
        let url = tokio::time::timeout(self.op_timeout, self.page.url())
            .await
            .map_err(|_| DriverError::Timeout {
                what: "读取 URL".to_string(),
                timeout_ms: self.op_timeout.as_millis() as u64,
            })??;
        Ok(url.unwrap_or_default())
    }
}
