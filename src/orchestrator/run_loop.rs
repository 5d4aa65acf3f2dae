//! 单轮运行 - 编排层
//!
//! ## 职责
//!
//! 按表格顺序处理一轮记录，是记录级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **准备**：读取所有行 → 打开门户 → 等待操作员确认登录
//! 2. **遍历记录**：跳过空编码 / 已有结果 / 重复编码
//! 3. **流程调度**：委托 `RecordFlow` 处理单条记录，之后总是复位搜索页
//! 4. **批量保存**：结果写回行内，交给 `SaveQueue`
//! 5. **统计输出**：汇总并发送 `completed`

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::oneshot;

use crate::channel::EventReporter;
use crate::error::RunError;
use crate::infrastructure::{PageDriver, WaitPolicy};
use crate::models::{Outcome, Record, RecordFields, RunSummary};
use crate::services::{RecordStore, SaveQueue, SearchReset};
use crate::utils::logging::print_final_stats;
use crate::workflow::{RecordCtx, RecordFlow};

/// 一轮运行的固定参数
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: String,
    pub batch_size: usize,
    pub fields: RecordFields,
}

/// 运行方持有的控制端
pub struct RunControl {
    stop: Arc<AtomicBool>,
    confirm: oneshot::Receiver<()>,
}

/// 操作员持有的控制端
pub struct RunHandle {
    stop: Arc<AtomicBool>,
    confirm: Option<oneshot::Sender<()>>,
}

/// 创建一对控制端
pub fn run_control() -> (RunHandle, RunControl) {
    let stop = Arc::new(AtomicBool::new(false));
    let (tx, rx) = oneshot::channel();
    (
        RunHandle {
            stop: stop.clone(),
            confirm: Some(tx),
        },
        RunControl { stop, confirm: rx },
    )
}

impl RunHandle {
    /// 确认登录，只有第一次有效
    pub fn confirm(&mut self) -> bool {
        match self.confirm.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// 请求停止；还在等待确认时直接取消
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.confirm.take();
    }
}

/// 单轮运行编排器
pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    flow: Arc<RecordFlow>,
    reset: Arc<SearchReset>,
    settings: RunSettings,
    reporter: EventReporter,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        flow: Arc<RecordFlow>,
        reset: Arc<SearchReset>,
        settings: RunSettings,
        reporter: EventReporter,
    ) -> Self {
        Self {
            store,
            flow,
            reset,
            settings,
            reporter,
        }
    }

    pub async fn run(
        &self,
        driver: &dyn PageDriver,
        control: RunControl,
    ) -> Result<RunSummary, RunError> {
        let reporter = &self.reporter;
        let fields = &self.settings.fields;

        // ========== 准备 ==========
        let rows = self.store.list_rows().await?;
        reporter.info(format!("📋 读取到 {} 行数据", rows.len()));

        driver
            .navigate(&self.settings.base_url, WaitPolicy::DomContentLoaded)
            .await
            .map_err(|e| RunError::Session(e.to_string()))?;

        reporter.info("🔐 请在浏览器中完成登录，然后确认继续");
        reporter.waiting_for_confirmation();
        let RunControl { stop, confirm } = control;
        if confirm.await.is_err() {
            reporter.warning("⏹️ 等待确认时流程被取消");
            return Err(RunError::Cancelled);
        }
        reporter.success("✓ 已确认登录，开始处理");

        // ========== 遍历记录 ==========
        let total = rows.len();
        let mut queue = SaveQueue::new(self.store.clone(), self.settings.batch_size);
        let mut seen = HashSet::new();
        let mut summary = RunSummary::default();

        for (i, mut row) in rows.into_iter().enumerate() {
            if stop.load(Ordering::SeqCst) {
                reporter.warning("⏹️ 收到停止指令，结束本轮处理");
                break;
            }

            let record = match Record::from_row(&row, fields) {
                Some(record) => record,
                None => {
                    reporter.info(format!("第 {} 行没有编码，跳过", row.index + 2));
                    summary.skipped += 1;
                    continue;
                }
            };
            if record.is_resolved(fields) {
                reporter.info(format!("{} 已有结果，跳过", record.code));
                summary.skipped += 1;
                continue;
            }
            if !seen.insert(record.code.clone()) {
                reporter.info(format!("{} 重复出现，跳过", record.code));
                summary.skipped += 1;
                continue;
            }

            let ctx = RecordCtx::new(record.code, i + 1, total);
            reporter.progress(i + 1, total);
            reporter.processing(format!("{} 🔍 开始处理", ctx));

            let outcome = self.process_one(driver, &ctx).await;
            self.reset.reset(driver, reporter).await;

            row.set(&fields.result_field, outcome.result_text());
            queue.enqueue(row);
            queue.maybe_flush(reporter).await;

            summary.processed += 1;
            if outcome.is_match() {
                summary.succeeded += 1;
            } else if outcome.is_error() {
                summary.errored += 1;
            }
        }

        // ========== 收尾 ==========
        queue.flush_all(reporter).await;
        summary.batches_flushed = queue.flushes();

        print_final_stats(&summary);
        reporter.success(format!(
            "🏁 处理完成: 成功 {}, 错误 {}, 总计 {}",
            summary.succeeded, summary.errored, summary.processed
        ));
        reporter.completed(summary);
        Ok(summary)
    }

    /// 处理单条记录，错误和 panic 都折叠成 `Outcome::Error`
    async fn process_one(&self, driver: &dyn PageDriver, ctx: &RecordCtx) -> Outcome {
        let reporter = &self.reporter;
        let result = AssertUnwindSafe(self.flow.run(driver, ctx))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(outcome)) => {
                match &outcome {
                    Outcome::Matched(_) => {
                        reporter.success(format!("{} ✅ {}", ctx, outcome.result_text()))
                    }
                    Outcome::NotFound => reporter.info(format!("{} 未匹配到关键词", ctx)),
                    Outcome::NoResultsInSearch => {
                        reporter.warning(format!("{} ⚠️ 搜索无结果", ctx))
                    }
                    Outcome::Error(_) => {}
                }
                outcome
            }
            Ok(Err(e)) => {
                reporter.error(format!("{} ❌ 处理失败: {}", ctx, e));
                Outcome::Error(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                reporter.error(format!("{} ❌ 处理时发生异常: {}", ctx, message));
                Outcome::Error(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_stop_drops_pending_confirmation() {
        let (mut handle, mut control) = run_control();
        handle.stop();
        assert!(control.stop.load(Ordering::SeqCst));
        assert!(control.confirm.try_recv().is_err());
        assert!(!handle.confirm());
    }

    #[test]
    fn test_confirm_only_once() {
        let (mut handle, mut control) = run_control();
        assert!(handle.confirm());
        assert!(!handle.confirm());
        assert!(control.confirm.try_recv().is_ok());
    }
}
