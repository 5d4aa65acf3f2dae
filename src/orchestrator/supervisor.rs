//! 运行监督器 - 编排层
//!
//! ## 职责
//!
//! 把操作员指令翻译成运行，是整个应用的"总开关"。
//!
//! ## 核心功能
//!
//! 1. **单实例**：`running` 标志保证同一时间只有一轮运行
//! 2. **资源管理**：每轮运行打开存储和浏览器会话，结束后总是关闭会话
//! 3. **指令转发**：确认登录 / 停止 交给当前运行的 `RunHandle`

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::browser::SessionFactory;
use crate::channel::{EventReporter, OperatorCommand};
use crate::clients::Credentials;
use crate::config::Config;
use crate::error::{ControlError, RunError, StoreError};
use crate::models::{KeywordSet, RunSummary};
use crate::orchestrator::run_loop::{run_control, Orchestrator, RunControl, RunHandle, RunSettings};
use crate::services::{SearchReset, StoreFactory};
use crate::workflow::RecordFlow;

struct ActiveRun {
    handle: RunHandle,
    task: Option<JoinHandle<()>>,
}

/// 运行监督器
pub struct Supervisor {
    settings: RunSettings,
    flow: Arc<RecordFlow>,
    reset: Arc<SearchReset>,
    credentials_path: Option<String>,
    session_factory: Arc<dyn SessionFactory>,
    store_factory: Arc<dyn StoreFactory>,
    reporter: EventReporter,
    running: Arc<AtomicBool>,
    active: Mutex<Option<ActiveRun>>,
}

impl Supervisor {
    pub fn new(
        config: &Config,
        keywords: KeywordSet,
        session_factory: Arc<dyn SessionFactory>,
        store_factory: Arc<dyn StoreFactory>,
        reporter: EventReporter,
    ) -> Self {
        let layout = config.portal_layout();
        let flow = RecordFlow::new(
            layout.clone(),
            keywords,
            config.timeout(),
            config.settle_delay(),
        );
        let reset = SearchReset::new(layout, config.target_url.clone(), config.timeout());

        Self {
            settings: RunSettings {
                base_url: config.target_url.clone(),
                batch_size: config.effective_batch_size(),
                fields: config.record_fields(),
            },
            flow: Arc::new(flow),
            reset: Arc::new(reset),
            credentials_path: config.credentials_path.clone(),
            session_factory,
            store_factory,
            reporter,
            running: Arc::new(AtomicBool::new(false)),
            active: Mutex::new(None),
        }
    }

    pub fn reporter(&self) -> &EventReporter {
        &self.reporter
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn handle(&self, command: OperatorCommand) -> Result<(), ControlError> {
        match command {
            OperatorCommand::Start {
                store_id,
                credentials,
            } => self.start(store_id, credentials).await,
            OperatorCommand::ConfirmLogin => {
                let mut active = self.active.lock().await;
                if let Some(run) = active.as_mut() {
                    if run.handle.confirm() {
                        info!("✓ 操作员已确认登录");
                    }
                }
                Ok(())
            }
            OperatorCommand::Stop => {
                let mut active = self.active.lock().await;
                if let Some(run) = active.as_mut() {
                    self.reporter.warning("⏹️ 已请求停止");
                    run.handle.stop();
                }
                Ok(())
            }
        }
    }

    /// 等待当前运行结束（没有运行时立即返回）
    pub async fn wait_idle(&self) {
        let task = self
            .active
            .lock()
            .await
            .as_mut()
            .and_then(|run| run.task.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                debug!("运行任务异常结束: {}", e);
            }
        }
    }

    async fn start(
        &self,
        store_id: String,
        credentials: Option<Credentials>,
    ) -> Result<(), ControlError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.reporter.rejected("already running");
            return Err(ControlError::Busy);
        }

        let prepared = self.prepare(store_id, credentials);
        let (store_id, credentials) = match prepared {
            Ok(v) => v,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.reporter.rejected(e.to_string());
                return Err(e);
            }
        };

        let (handle, control) = run_control();
        let job = RunJob {
            store_id,
            credentials,
            settings: self.settings.clone(),
            flow: self.flow.clone(),
            reset: self.reset.clone(),
            session_factory: self.session_factory.clone(),
            store_factory: self.store_factory.clone(),
            reporter: self.reporter.clone(),
        };
        let running = self.running.clone();
        let reporter = self.reporter.clone();

        let task = tokio::spawn(async move {
            match job.execute(control).await {
                Ok(_) => {}
                Err(RunError::Cancelled) => reporter.warning("⏹️ 本轮运行已取消"),
                Err(e) => reporter.fatal(e.to_string()),
            }
            running.store(false, Ordering::SeqCst);
        });

        *self.active.lock().await = Some(ActiveRun {
            handle,
            task: Some(task),
        });
        Ok(())
    }

    fn prepare(
        &self,
        store_id: String,
        credentials: Option<Credentials>,
    ) -> Result<(String, Credentials), ControlError> {
        let store_id = store_id.trim().to_string();
        if store_id.is_empty() {
            return Err(ControlError::MissingStoreId);
        }

        let credentials = match credentials {
            Some(c) => c,
            None => {
                let path = self
                    .credentials_path
                    .as_deref()
                    .ok_or(ControlError::MissingCredentials)?;
                Credentials::from_file(Path::new(path)).map_err(|e| {
                    debug!("读取凭据文件失败: {:#}", e);
                    ControlError::MissingCredentials
                })?
            }
        };
        Ok((store_id, credentials))
    }
}

/// 一轮运行所需的全部资源
struct RunJob {
    store_id: String,
    credentials: Credentials,
    settings: RunSettings,
    flow: Arc<RecordFlow>,
    reset: Arc<SearchReset>,
    session_factory: Arc<dyn SessionFactory>,
    store_factory: Arc<dyn StoreFactory>,
    reporter: EventReporter,
}

impl RunJob {
    async fn execute(self, control: RunControl) -> Result<RunSummary, RunError> {
        self.reporter.info(format!("📊 正在打开数据表 {}", self.store_id));
        let store = self
            .store_factory
            .open(&self.store_id, &self.credentials)
            .await
            .map_err(|e| match e {
                StoreError::Auth(message) => RunError::Auth(message),
                other => RunError::Store(other),
            })?;

        self.reporter.info("🌐 正在打开浏览器会话...");
        let session = self
            .session_factory
            .open()
            .await
            .map_err(|e| RunError::Session(format!("{:#}", e)))?;

        let orchestrator = Orchestrator::new(
            store,
            self.flow,
            self.reset,
            self.settings,
            self.reporter.clone(),
        );
        let result = orchestrator.run(session.driver(), control).await;
        session.close().await;
        result
    }
}
