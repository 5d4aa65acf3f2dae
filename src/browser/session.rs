//! 浏览器会话
//!
//! 一轮运行独占一个会话，运行结束（无论成功与否）都要调用 `close`

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::browser::{connect_to_browser_and_page, launch_browser};
use crate::config::Config;
use crate::infrastructure::{ChromiumDriver, PageDriver};

/// 一个活动的浏览器会话
#[async_trait]
pub trait Session: Send + Sync {
    fn driver(&self) -> &dyn PageDriver;

    /// 释放会话占用的浏览器资源
    async fn close(self: Box<Self>);
}

/// 会话工厂，每轮运行开始时调用一次
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>>;
}

/// chromiumoxide 会话
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    driver: ChromiumDriver,
    /// 浏览器是否由本程序启动（连接到外部浏览器时只关闭页面）
    owns_browser: bool,
}

#[async_trait]
impl Session for ChromiumSession {
    fn driver(&self) -> &dyn PageDriver {
        &self.driver
    }

    async fn close(self: Box<Self>) {
        let mut this = *self;
        if this.owns_browser {
            if let Err(e) = this.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = this.browser.wait().await {
                warn!("等待浏览器退出失败: {}", e);
            }
        } else if let Err(e) = this.driver.executor().page().clone().close().await {
            warn!("关闭页面失败: {}", e);
        }
        this.handler_task.abort();
        info!("🧹 浏览器会话已关闭");
    }
}

/// 按配置连接或启动浏览器
pub struct ChromiumSessionFactory {
    target_url: String,
    debug_port: Option<u16>,
    headless: bool,
    executable: Option<String>,
    op_timeout: Duration,
}

impl ChromiumSessionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            target_url: config.target_url.clone(),
            debug_port: config.browser_debug_port,
            headless: config.headless,
            executable: config.chrome_executable.clone(),
            op_timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let (browser, page, handler_task, owns_browser) = match self.debug_port {
            Some(port) => {
                let (browser, page, task) = connect_to_browser_and_page(port, &self.target_url)
                    .await
                    .with_context(|| format!("无法连接到调试端口 {} 上的浏览器", port))?;
                (browser, page, task, false)
            }
            None => {
                let (browser, page, task) =
                    launch_browser(self.headless, self.executable.as_deref())
                        .await
                        .context("无法启动浏览器")?;
                (browser, page, task, true)
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            handler_task,
            driver: ChromiumDriver::new(page, self.op_timeout),
            owns_browser,
        }))
    }
}
