//! 事件汇报器
//!
//! 基于 `tokio::sync::broadcast`，同时把日志事件镜像到 tracing

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::channel::events::{LogLevel, RunEvent};
use crate::models::RunSummary;

/// 事件缓冲区大小
const EVENT_BUFFER: usize = 256;

/// 事件汇报器（可克隆，所有克隆共享同一个通道）
#[derive(Debug, Clone)]
pub struct EventReporter {
    tx: broadcast::Sender<RunEvent>,
}

impl Default for EventReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventReporter {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }

    /// 发送事件；没有订阅者时直接丢弃
    pub fn emit(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Error => error!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Info | LogLevel::Success | LogLevel::Processing => info!("{}", message),
        }
        self.emit(RunEvent::Log {
            level,
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn processing(&self, message: impl Into<String>) {
        self.log(LogLevel::Processing, message);
    }

    pub fn progress(&self, current: usize, total: usize) {
        self.emit(RunEvent::Progress { current, total });
    }

    pub fn waiting_for_confirmation(&self) {
        self.emit(RunEvent::WaitingForConfirmation);
    }

    pub fn completed(&self, summary: RunSummary) {
        self.emit(RunEvent::Completed(summary));
    }

    pub fn fatal(&self, message: impl Into<String>) {
        let message = message.into();
        self.error(format!("❌ 致命错误: {}", message));
        self.emit(RunEvent::FatalError { message });
    }

    pub fn rejected(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("指令被拒绝: {}", message);
        self.emit(RunEvent::Rejected { message });
    }
}
