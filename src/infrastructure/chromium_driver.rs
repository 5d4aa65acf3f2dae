//! 基于 chromiumoxide 的页面驱动
//!
//! 所有 DOM 操作都翻译成一段 JS 交给 `JsExecutor` 执行，
//! 等待类操作在 Rust 侧轮询，整体受调用方给出的超时约束

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use regex::Regex;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::page_driver::{ElementState, Locator, PageDriver, WaitPolicy};
use crate::infrastructure::JsExecutor;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 资源数量保持不变多久视为网络空闲
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// chromiumoxide 页面驱动
pub struct ChromiumDriver {
    executor: JsExecutor,
}

impl ChromiumDriver {
    pub fn new(page: Page, op_timeout: Duration) -> Self {
        Self {
            executor: JsExecutor::new(page, op_timeout),
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    /// 在超时内反复执行 `check`，直到返回 true
    ///
    /// 单次检查失败（例如页面正在跳转导致上下文销毁）不算失败，继续轮询
    async fn poll_until<F, Fut>(&self, what: String, timeout: Duration, mut check: F) -> DriverResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<bool>>,
    {
        let polling = async {
            loop {
                match check().await {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(e) => debug!("轮询 {} 出错，继续等待: {}", what, e),
                }
                sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, polling)
            .await
            .map_err(|_| DriverError::Timeout {
                what,
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn ready_state(&self) -> DriverResult<String> {
        self.executor.eval_as("document.readyState").await
    }

    async fn element_exists(&self, target: &Locator) -> DriverResult<bool> {
        self.executor
            .eval_as(format!("!!({})", locate_js(target)))
            .await
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> DriverResult<()> {
        // 导航允许两倍的操作超时
        let nav_timeout = self.executor.op_timeout() * 2;
        debug!("导航到: {} ({:?})", url, wait);

        tokio::time::timeout(nav_timeout, self.executor.page().goto(url))
            .await
            .map_err(|_| DriverError::Navigation {
                url: url.to_string(),
                message: format!("超过 {}ms 未完成", nav_timeout.as_millis()),
            })?
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let accepted: &[&str] = match wait {
            WaitPolicy::Commit => return Ok(()),
            WaitPolicy::DomContentLoaded => &["interactive", "complete"],
            WaitPolicy::Load => &["complete"],
        };

        self.poll_until(format!("{} 加载", url), nav_timeout, move || async move {
            let state = self.ready_state().await?;
            Ok(accepted.contains(&state.as_str()))
        })
        .await
        .map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn clear(&self, target: &Locator) -> DriverResult<()> {
        self.fill(target, "").await
    }

    async fn fill(&self, target: &Locator, text: &str) -> DriverResult<()> {
        // 走原生 setter 并派发 input/change，保证前端框架能感知到变化
        let js = format!(
            r#"
            ((el, text) => {{
                if (!el) return false;
                el.focus();
                const proto = Object.getPrototypeOf(el);
                const desc = Object.getOwnPropertyDescriptor(proto, 'value');
                if (desc && desc.set) {{ desc.set.call(el, text); }} else {{ el.value = text; }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})({}, {})
            "#,
            locate_js(target),
            js_str(text)
        );

        if self.executor.eval_as::<bool>(js).await? {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound {
                locator: target.to_string(),
            })
        }
    }

    async fn read_value(&self, target: &Locator) -> DriverResult<String> {
        let js = format!(
            "((el) => el ? String(el.value ?? '') : null)({})",
            locate_js(target)
        );
        self.executor
            .eval_as::<Option<String>>(js)
            .await?
            .ok_or_else(|| DriverError::ElementNotFound {
                locator: target.to_string(),
            })
    }

    async fn click(&self, target: &Locator) -> DriverResult<()> {
        let js = format!(
            r#"
            ((el) => {{
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                el.click();
                return true;
            }})({})
            "#,
            locate_js(target)
        );

        if self.executor.eval_as::<bool>(js).await? {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound {
                locator: target.to_string(),
            })
        }
    }

    async fn is_visible(&self, target: &Locator) -> DriverResult<bool> {
        self.executor.eval_as(visible_js(target)).await
    }

    async fn wait_for(
        &self,
        target: &Locator,
        state: ElementState,
        timeout: Duration,
    ) -> DriverResult<()> {
        let what = format!("{} ({:?})", target, state);
        self.poll_until(what, timeout, move || async move {
            match state {
                ElementState::Attached => self.element_exists(target).await,
                ElementState::Visible => self.is_visible(target).await,
                ElementState::Hidden => Ok(!self.is_visible(target).await?),
            }
        })
        .await
    }

    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> DriverResult<()> {
        let re = Regex::new(pattern).map_err(|e| DriverError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let re = &re;

        self.poll_until(format!("URL 匹配 {}", pattern), timeout, move || async move {
            let url = self.executor.current_url().await?;
            Ok(re.is_match(&url))
        })
        .await
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> DriverResult<()> {
        let idle = async {
            let mut last_count: Option<u64> = None;
            let mut quiet_since = Instant::now();
            loop {
                let snapshot: DriverResult<JsonValue> = self
                    .executor
                    .eval("[document.readyState, performance.getEntriesByType('resource').length]")
                    .await;

                if let Ok(JsonValue::Array(values)) = snapshot {
                    let complete = values.first().and_then(|v| v.as_str()) == Some("complete");
                    let count = values.get(1).and_then(|v| v.as_u64());
                    if count != last_count || !complete {
                        last_count = count;
                        quiet_since = Instant::now();
                    } else if quiet_since.elapsed() >= NETWORK_QUIET_WINDOW {
                        return;
                    }
                }
                sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, idle)
            .await
            .map_err(|_| DriverError::Timeout {
                what: "网络空闲".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn extract_values(&self, css: &str) -> DriverResult<Vec<String>> {
        let js = format!(
            "Array.from(document.querySelectorAll({})).map(e => String((e.value !== undefined ? e.value : e.textContent) || ''))",
            js_str(css)
        );
        self.executor.eval_as(js).await
    }

    async fn body_text(&self) -> DriverResult<String> {
        self.executor
            .eval_as("document.body ? (document.body.textContent || '') : ''")
            .await
    }
}

// ========== 定位器 → JS ==========

/// 把字符串转成 JS 字面量
fn js_str(s: &str) -> String {
    JsonValue::String(s.to_string()).to_string()
}

/// 角色对应的候选选择器
fn role_selector(role: &str) -> String {
    match role {
        "button" => {
            "button, [role=\"button\"], input[type=\"button\"], input[type=\"submit\"]".to_string()
        }
        "link" => "a[href], [role=\"link\"]".to_string(),
        "textbox" => "input:not([type]), input[type=\"text\"], textarea, [role=\"textbox\"]".to_string(),
        other => format!("[role=\"{}\"]", other),
    }
}

/// 生成一个求值为元素或 null 的 JS 表达式
pub(crate) fn locate_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(css) => format!("document.querySelector({})", js_str(css)),
        Locator::CssHasText { css, text } => format!(
            "(Array.from(document.querySelectorAll({})).find(e => (e.textContent || '').includes({})) || null)",
            js_str(css),
            js_str(text)
        ),
        Locator::Within { scope, css } => format!(
            "((s) => s ? s.querySelector({}) : null)({})",
            js_str(css),
            locate_js(scope)
        ),
        Locator::Role { role, name_pattern } => format!(
            "(Array.from(document.querySelectorAll({})).find(e => new RegExp({}, 'i').test((e.getAttribute('aria-label') || e.textContent || e.value || '').trim())) || null)",
            js_str(&role_selector(role)),
            js_str(name_pattern)
        ),
        Locator::Text { pattern } => format!(
            "(Array.from(document.body ? document.body.querySelectorAll('*') : []).find(e => e.children.length === 0 && new RegExp({}, 'i').test(e.textContent || '')) || null)",
            js_str(pattern)
        ),
    }
}

fn visible_js(locator: &Locator) -> String {
    format!(
        r#"
        ((el) => {{
            if (!el) return false;
            const rect = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            return rect.width > 0 && rect.height > 0
                && style.visibility !== 'hidden' && style.display !== 'none';
        }})({})
        "#,
        locate_js(locator)
    )
}
