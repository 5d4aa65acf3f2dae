//! 搜索页复位 - 业务能力层
//!
//! 每条记录处理完后把界面带回搜索页。这里的任何失败都不会向上抛出，
//! 下一条记录填写输入框时会重新校验页面是否可用

use std::time::Duration;

use crate::channel::EventReporter;
use crate::error::DriverResult;
use crate::infrastructure::{ElementState, PageDriver, WaitPolicy};
use crate::models::PortalLayout;

/// 复位走的路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPath {
    /// 通过"Buscar expedientes"链接返回
    Primary,
    /// 链接返回失败，整页重新加载基础地址
    Fallback,
    /// 重新加载也失败了（已记录警告）
    Unrecovered,
}

/// 搜索页复位
pub struct SearchReset {
    layout: PortalLayout,
    base_url: String,
    timeout: Duration,
}

impl SearchReset {
    pub fn new(layout: PortalLayout, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            layout,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// 复位到搜索页，永不返回错误
    pub async fn reset(&self, driver: &dyn PageDriver, reporter: &EventReporter) -> ResetPath {
        match self.back_to_search(driver).await {
            Ok(()) => {
                reporter.info("🔄 搜索页已复位");
                ResetPath::Primary
            }
            Err(e) => {
                reporter.warning(format!("⚠️ 复位搜索页时出现问题: {}，重新加载页面", e));
                match driver
                    .navigate(&self.base_url, WaitPolicy::DomContentLoaded)
                    .await
                {
                    Ok(()) => ResetPath::Fallback,
                    Err(e) => {
                        reporter.warning(format!("⚠️ 重新加载搜索页失败: {}", e));
                        ResetPath::Unrecovered
                    }
                }
            }
        }
    }

    async fn back_to_search(&self, driver: &dyn PageDriver) -> DriverResult<()> {
        driver.click(&self.layout.reset_link).await?;
        driver
            .wait_for_url(&self.layout.search_route_pattern, self.timeout)
            .await?;
        driver
            .wait_for(&self.layout.search_field, ElementState::Visible, self.timeout)
            .await
    }
}
