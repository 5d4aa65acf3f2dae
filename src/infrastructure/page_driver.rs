//! 页面能力接口
//!
//! 流程层和恢复逻辑只依赖这里的 `PageDriver`，不认识任何具体的浏览器引擎。
//! 生产环境由 `ChromiumDriver` 实现，测试中由脚本化的假驱动实现。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DriverResult;

/// 元素定位器
///
/// 定位器本身就是"元素句柄"：每次操作时才在页面上重新解析，
/// 因此页面重新渲染后依然有效
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// 第一个匹配 CSS 的元素
    Css(String),
    /// 第一个匹配 CSS 且文本包含 `text` 的元素
    CssHasText { css: String, text: String },
    /// 在 `scope` 内部查找第一个匹配 CSS 的元素
    Within { scope: Box<Locator>, css: String },
    /// 按角色和可访问名称（不区分大小写的正则）查找
    Role { role: String, name_pattern: String },
    /// 文本匹配正则（不区分大小写）的叶子元素
    Text { pattern: String },
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "{}", css),
            Locator::CssHasText { css, text } => write!(f, "{}:has-text(\"{}\")", css, text),
            Locator::Within { scope, css } => write!(f, "{} >> {}", scope, css),
            Locator::Role { role, name_pattern } => {
                write!(f, "role={}[name=/{}/i]", role, name_pattern)
            }
            Locator::Text { pattern } => write!(f, "text=/{}/i", pattern),
        }
    }
}

/// 等待的元素状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// 存在于 DOM 中
    Attached,
    /// 存在且可见
    Visible,
    /// 不存在或不可见
    Hidden,
}

/// 导航完成条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// 请求发出即返回
    Commit,
    /// DOMContentLoaded
    DomContentLoaded,
    /// load 事件
    Load,
}

/// 页面操作能力
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定 URL
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> DriverResult<()>;

    /// 清空输入框
    async fn clear(&self, target: &Locator) -> DriverResult<()>;

    /// 向输入框写入文本（替换原有内容）
    async fn fill(&self, target: &Locator, text: &str) -> DriverResult<()>;

    /// 读取输入框当前值
    async fn read_value(&self, target: &Locator) -> DriverResult<String>;

    async fn click(&self, target: &Locator) -> DriverResult<()>;

    /// 元素当前是否可见（不存在视为不可见）
    async fn is_visible(&self, target: &Locator) -> DriverResult<bool>;

    /// 等待元素进入指定状态
    async fn wait_for(
        &self,
        target: &Locator,
        state: ElementState,
        timeout: Duration,
    ) -> DriverResult<()>;

    /// 等待当前 URL 匹配正则
    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> DriverResult<()>;

    /// 等待网络空闲
    async fn wait_for_network_idle(&self, timeout: Duration) -> DriverResult<()>;

    /// 所有匹配 CSS 的元素的 value（无 value 时取文本）
    async fn extract_values(&self, css: &str) -> DriverResult<Vec<String>>;

    /// 整个 body 的文本
    async fn body_text(&self) -> DriverResult<String>;
}
