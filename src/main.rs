use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use expediente_scanner::browser::ChromiumSessionFactory;
use expediente_scanner::clients::{Credentials, StaticTokenProvider};
use expediente_scanner::services::SheetsStoreFactory;
use expediente_scanner::utils::logging;
use expediente_scanner::{Config, EventReporter, OperatorCommand, RunEvent, Supervisor};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let keywords = config.keyword_set()?;
    let store_id = config
        .spreadsheet_id
        .clone()
        .context("未配置数据表 ID (SPREADSHEET_ID)")?;

    // 没有凭据文件时，直接用访问令牌
    let credentials = match (&config.credentials_path, &config.access_token) {
        (None, Some(_)) => Some(Credentials {
            identity: "GOOGLE_ACCESS_TOKEN".to_string(),
            private_key: String::new(),
        }),
        _ => None,
    };

    let identity = Arc::new(StaticTokenProvider::new(config.access_token.clone()));
    let store_factory = Arc::new(SheetsStoreFactory::new(
        config.sheets_api_base.clone(),
        identity,
        config.record_fields(),
    ));
    let session_factory = Arc::new(ChromiumSessionFactory::new(&config));

    let reporter = EventReporter::new();
    let supervisor = Arc::new(Supervisor::new(
        &config,
        keywords,
        session_factory,
        store_factory,
        reporter.clone(),
    ));

    // 终端即操作员：等待确认时读取回车
    let mut events = reporter.subscribe();
    let operator = supervisor.clone();
    tokio::spawn(async move {
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match events.recv().await {
                Ok(RunEvent::WaitingForConfirmation) => {
                    info!("👉 登录完成后按回车继续...");
                    if let Ok(Some(_)) = stdin.next_line().await {
                        let _ = operator.handle(OperatorCommand::ConfirmLogin).await;
                    }
                }
                Ok(RunEvent::Completed(_)) | Ok(RunEvent::FatalError { .. }) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!("事件接收落后，丢弃 {} 条", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Ctrl+C → 停止
    let stopper = supervisor.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stopper.handle(OperatorCommand::Stop).await;
        }
    });

    supervisor
        .handle(OperatorCommand::Start {
            store_id,
            credentials,
        })
        .await?;
    supervisor.wait_idle().await;

    Ok(())
}
