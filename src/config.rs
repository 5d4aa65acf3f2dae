use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{KeywordSet, PortalLayout, RecordFields};

/// 程序配置文件
///
/// 读取顺序：默认值 → TOML 文件（`PORTAL_CONFIG`，默认 `config.toml`）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 门户搜索页地址
    pub target_url: String,
    /// 搜索页路由（正则）
    pub search_route_pattern: String,
    /// 每个页面等待的超时（毫秒）
    pub timeout_ms: u64,
    /// 详情加载后的固定缓冲时间（毫秒）
    pub settle_delay_ms: u64,
    /// 每批保存的行数
    pub batch_size: usize,
    /// Google 表格 ID
    pub spreadsheet_id: Option<String>,
    /// 编码列
    pub key_field: String,
    /// 结果列
    pub result_field: String,
    /// 浏览器调试端口；设置后连接已有浏览器，否则自行启动
    pub browser_debug_port: Option<u16>,
    /// 自行启动时是否无头
    pub headless: bool,
    /// 浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 服务账号 JSON 文件
    pub credentials_path: Option<String>,
    /// 预先签发的访问令牌
    pub access_token: Option<String>,
    /// Sheets API 地址
    pub sheets_api_base: String,
    /// 覆盖内置关键词
    pub keywords: Option<Vec<String>>,
    /// 结果为错误标记的行是否重新处理
    pub retry_errors: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://www.mortgage.onesait.com/frontend#/search".to_string(),
            search_route_pattern: ".*#/search".to_string(),
            timeout_ms: 10_000,
            settle_delay_ms: 500,
            batch_size: 10,
            spreadsheet_id: None,
            key_field: "Codigo".to_string(),
            result_field: "Resultado".to_string(),
            browser_debug_port: None,
            headless: true,
            chrome_executable: None,
            credentials_path: None,
            access_token: None,
            sheets_api_base: "https://sheets.googleapis.com/v4".to_string(),
            keywords: None,
            retry_errors: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置文件并叠加环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("PORTAL_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let base = Self::from_file(Path::new(&path))?.unwrap_or_default();
        Ok(base.with_env())
    }

    /// 读取 TOML 配置文件；文件不存在时返回 None
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 仅使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 用环境变量覆盖当前值
    pub fn with_env(self) -> Self {
        Self {
            target_url: env_or("TARGET_URL", self.target_url),
            search_route_pattern: env_or("SEARCH_ROUTE_PATTERN", self.search_route_pattern),
            timeout_ms: env_parse("TIMEOUT_MS").unwrap_or(self.timeout_ms),
            settle_delay_ms: env_parse("SETTLE_DELAY_MS").unwrap_or(self.settle_delay_ms),
            batch_size: env_parse("BATCH_SAVE_SIZE").unwrap_or(self.batch_size),
            spreadsheet_id: std::env::var("SPREADSHEET_ID").ok().or(self.spreadsheet_id),
            key_field: env_or("KEY_FIELD", self.key_field),
            result_field: env_or("RESULT_FIELD", self.result_field),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            credentials_path: std::env::var("CREDENTIALS_PATH").ok().or(self.credentials_path),
            access_token: std::env::var("GOOGLE_ACCESS_TOKEN").ok().or(self.access_token),
            sheets_api_base: env_or("SHEETS_API_BASE", self.sheets_api_base),
            keywords: self.keywords,
            retry_errors: env_parse("RETRY_ERRORS").unwrap_or(self.retry_errors),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// 批大小至少为 1
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    pub fn record_fields(&self) -> RecordFields {
        RecordFields {
            key_field: self.key_field.clone(),
            result_field: self.result_field.clone(),
            retry_errors: self.retry_errors,
        }
    }

    pub fn portal_layout(&self) -> PortalLayout {
        PortalLayout {
            search_route_pattern: self.search_route_pattern.clone(),
            ..PortalLayout::default()
        }
    }

    pub fn keyword_set(&self) -> Result<KeywordSet> {
        let set = match &self.keywords {
            Some(list) => KeywordSet::new(list)?,
            None => KeywordSet::builtin()?,
        };
        if set.is_empty() {
            anyhow::bail!("关键词列表为空");
        }
        Ok(set)
    }
}

fn env_or(name: &str, fallback: String) -> String {
    std::env::var(name).unwrap_or(fallback)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
