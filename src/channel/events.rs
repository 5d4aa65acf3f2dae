//! 控制 / 汇报通道的事件约定
//!
//! 只定义事件本身，传输方式（WebSocket、终端……）由上层决定

use serde::{Deserialize, Serialize};

use crate::clients::Credentials;
use crate::models::RunSummary;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Processing,
}

/// 编排器 → 操作员
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RunEvent {
    Log {
        level: LogLevel,
        message: String,
        timestamp: String,
    },
    Progress {
        current: usize,
        total: usize,
    },
    /// 浏览器已就绪，等待操作员确认登录
    WaitingForConfirmation,
    Completed(RunSummary),
    FatalError {
        message: String,
    },
    /// 指令被拒绝（例如已有任务在运行）
    Rejected {
        message: String,
    },
}

/// 操作员 → 编排器
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OperatorCommand {
    Start {
        store_id: String,
        credentials: Option<Credentials>,
    },
    ConfirmLogin,
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_wire_format() {
        let json = serde_json::to_value(RunEvent::Progress { current: 2, total: 5 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "progress", "data": { "current": 2, "total": 5 } })
        );
    }

    #[test]
    fn test_command_from_json() {
        let cmd: OperatorCommand =
            serde_json::from_str(r#"{ "type": "confirm_login" }"#).unwrap();
        assert!(matches!(cmd, OperatorCommand::ConfirmLogin));

        let cmd: OperatorCommand = serde_json::from_str(
            r#"{ "type": "start", "data": { "store_id": "abc", "credentials": null } }"#,
        )
        .unwrap();
        match cmd {
            OperatorCommand::Start {
                store_id,
                credentials,
            } => {
                assert_eq!(store_id, "abc");
                assert!(credentials.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
