//! 批量保存队列 - 业务能力层
//!
//! 入队即开始保存（后台任务），到达批大小时统一等待。
//! 单个保存失败只记录日志，不影响同批其他行，也不中断整轮运行

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::channel::EventReporter;
use crate::error::StoreError;
use crate::models::Row;
use crate::services::RecordStore;

/// 一次批量等待的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub saved: usize,
    pub failed: usize,
}

struct PendingSave {
    row_index: usize,
    handle: JoinHandle<Result<(), StoreError>>,
}

/// 批量保存队列
pub struct SaveQueue {
    store: Arc<dyn RecordStore>,
    batch_size: usize,
    pending: Vec<PendingSave>,
    flushes: usize,
}

impl SaveQueue {
    /// `batch_size` 为 0 时按 1 处理
    pub fn new(store: Arc<dyn RecordStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            pending: Vec::new(),
            flushes: 0,
        }
    }

    /// 立即在后台开始保存这一行
    pub fn enqueue(&mut self, row: Row) {
        let store = self.store.clone();
        let row_index = row.index;
        let handle = tokio::spawn(async move { store.save(&row).await });
        self.pending.push(PendingSave { row_index, handle });
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// 已完成的批次数
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// 待保存数量达到批大小时等待整批完成
    pub async fn maybe_flush(&mut self, reporter: &EventReporter) -> Option<FlushReport> {
        if self.pending.len() < self.batch_size {
            return None;
        }
        reporter.info(format!("💾 正在保存一批 {} 行...", self.pending.len()));
        Some(self.settle_all(reporter).await)
    }

    /// 无条件等待剩余的保存（运行结束或被取消时调用）
    pub async fn flush_all(&mut self, reporter: &EventReporter) -> Option<FlushReport> {
        if self.pending.is_empty() {
            return None;
        }
        reporter.info(format!("💾 正在保存最后 {} 行...", self.pending.len()));
        Some(self.settle_all(reporter).await)
    }

    async fn settle_all(&mut self, reporter: &EventReporter) -> FlushReport {
        let batch = std::mem::take(&mut self.pending);
        let (indexes, handles): (Vec<usize>, Vec<_>) =
            batch.into_iter().map(|p| (p.row_index, p.handle)).unzip();

        let mut report = FlushReport::default();
        for (row_index, joined) in indexes.into_iter().zip(join_all(handles).await) {
            let result = joined.unwrap_or_else(|e| Err(StoreError::Join(e.to_string())));
            match result {
                Ok(()) => report.saved += 1,
                Err(e) => {
                    report.failed += 1;
                    reporter.error(format!("保存第 {} 行失败: {}", row_index + 2, e));
                }
            }
        }

        self.flushes += 1;
        report
    }
}
