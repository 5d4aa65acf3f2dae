use serde::{Deserialize, Serialize};

/// 写回数据表的错误标记
pub const ERROR_RESULT_TEXT: &str = "⚠️ Error - Reintentar";
pub const NOT_FOUND_RESULT_TEXT: &str = "❌ No encontrado";
pub const NO_RESULTS_RESULT_TEXT: &str = "⚠️ Sin resultados en la búsqueda";

/// 单条记录的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// 命中的关键词（按关键词集合顺序）
    Matched(Vec<String>),
    /// 详情页中没有任何关键词
    NotFound,
    /// 门户搜索无结果
    NoResultsInSearch,
    /// 处理失败
    Error(String),
}

impl Outcome {
    /// 写入结果列的文本
    pub fn result_text(&self) -> String {
        match self {
            Outcome::Matched(phrases) => format!("✅ {}", phrases.join(", ")),
            Outcome::NotFound => NOT_FOUND_RESULT_TEXT.to_string(),
            Outcome::NoResultsInSearch => NO_RESULTS_RESULT_TEXT.to_string(),
            Outcome::Error(_) => ERROR_RESULT_TEXT.to_string(),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Matched(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}
