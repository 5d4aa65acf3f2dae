//! 记录处理上下文
//!
//! 封装"我正在处理第几行的哪个编码"这一信息

use std::fmt::Display;

/// 记录处理上下文
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 记录编码（搜索关键字）
    pub code: String,

    /// 行位置（从1开始，仅用于日志显示）
    pub position: usize,

    /// 总行数
    pub total: usize,
}

impl RecordCtx {
    pub fn new(code: impl Into<String>, position: usize, total: usize) -> Self {
        Self {
            code: code.into(),
            position,
            total,
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{} {}]", self.position, self.total, self.code)
    }
}
