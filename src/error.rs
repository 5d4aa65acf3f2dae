use thiserror::Error;

use crate::workflow::FlowStage;

/// 页面驱动错误
///
/// 所有等待类操作都有超时上限，超时一律表现为 `Timeout`，不会静默挂起
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// 等待超时
    #[error("等待 {what} 超时 ({timeout_ms}ms)")]
    Timeout { what: String, timeout_ms: u64 },
    /// 元素不存在
    #[error("未找到元素: {locator}")]
    ElementNotFound { locator: String },
    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },
    /// URL 匹配规则无效
    #[error("无效的匹配规则 '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// CDP / 脚本执行失败
    #[error("浏览器脚本执行失败: {0}")]
    Cdp(String),
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Cdp(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Cdp(format!("脚本返回值解析失败: {}", err))
    }
}

/// 单条记录处理错误（只影响当前记录，不中断整轮运行）
#[derive(Debug, Error)]
pub enum ProcessError {
    /// 回读的输入框内容与编码不一致
    #[error("输入值不一致: 期望 \"{expected}\", 实际 \"{actual}\"")]
    Validation { expected: String, actual: String },
    /// 搜索结果迟迟未出现，且页面没有"无结果"提示
    #[error("搜索结果 {code} 未出现 ({timeout_ms}ms)")]
    LookupTimeout { code: String, timeout_ms: u64 },
    /// 某个阶段的页面操作失败
    #[error("{stage} 阶段失败: {source}")]
    Driver {
        stage: FlowStage,
        #[source]
        source: DriverError,
    },
}

/// 数据表（记录存储）错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 获取访问令牌失败
    #[error("身份认证失败: {0}")]
    Auth(String),
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 接口返回非成功状态
    #[error("接口返回错误 ({status}): {body}")]
    BadResponse { status: u16, body: String },
    /// 表格中没有工作表
    #[error("表格 {spreadsheet_id} 中没有工作表")]
    MissingSheet { spreadsheet_id: String },
    /// 表头中缺少需要的列
    #[error("表头中缺少列: {0}")]
    MissingColumn(String),
    /// 后台保存任务异常退出
    #[error("保存任务异常退出: {0}")]
    Join(String),
}

/// 整轮运行的致命错误（会触发 fatalError 事件）
#[derive(Debug, Error)]
pub enum RunError {
    #[error("认证失败: {0}")]
    Auth(String),
    #[error("读取数据表失败: {0}")]
    Store(#[from] StoreError),
    #[error("浏览器会话失败: {0}")]
    Session(String),
    #[error("流程已被操作员取消")]
    Cancelled,
}

/// 控制指令错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("已有任务正在运行")]
    Busy,
    #[error("未提供凭据，且配置中也没有凭据文件")]
    MissingCredentials,
    #[error("未指定数据表 ID")]
    MissingStoreId,
}

// ========== Result 类型别名 ==========

pub type DriverResult<T> = Result<T, DriverError>;
