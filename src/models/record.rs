use serde::{Deserialize, Serialize};

use crate::models::outcome::ERROR_RESULT_TEXT;

/// 数据表中的一行
///
/// `index` 是数据行（不含表头）从 0 开始的位置；`fields` 保持表头顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub index: usize,
    pub fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: Vec::new(),
        }
    }

    /// 链式追加字段（主要用于测试和构造）
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(&name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 设置字段值，字段不存在时追加到末尾
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }
}

/// 待处理的一条记录（以编码为标识）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub code: String,
    pub result: Option<String>,
}

/// 从行里读取记录时使用的列名
#[derive(Debug, Clone)]
pub struct RecordFields {
    pub key_field: String,
    pub result_field: String,
    /// 为 true 时，结果为错误标记的行视为未处理
    pub retry_errors: bool,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            key_field: "Codigo".to_string(),
            result_field: "Resultado".to_string(),
            retry_errors: false,
        }
    }
}

impl Record {
    /// 从一行解析记录；编码为空时返回 None
    pub fn from_row(row: &Row, fields: &RecordFields) -> Option<Self> {
        let code = row.get(&fields.key_field)?.trim();
        if code.is_empty() {
            return None;
        }
        let result = row
            .get(&fields.result_field)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Some(Self {
            code: code.to_string(),
            result,
        })
    }

    /// 是否已经有结果（续跑时跳过）
    pub fn is_resolved(&self, fields: &RecordFields) -> bool {
        match &self.result {
            None => false,
            Some(text) if fields.retry_errors => text != ERROR_RESULT_TEXT,
            Some(_) => true,
        }
    }
}

/// 一轮运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub errored: usize,
    pub skipped: usize,
    pub batches_flushed: usize,
}
