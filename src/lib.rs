//! # Expediente Scanner
//!
//! 在政府案卷门户上逐条查询案卷编号，扫描详情中的关键词，并把结果写回 Google 表格
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力接口（填写 / 点击 / 等待 / 提取）
//! - `ChromiumDriver` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `RecordStore` - 读行 / 写行能力（Google 表格）
//! - `SaveQueue` - 批量保存能力
//! - `SearchReset` - 复位搜索页能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条记录"的完整处理流程
//! - `RecordCtx` - 上下文封装（编码 + 位置）
//! - `RecordFlow` - 流程编排（填写 → 筛选 → 详情 → 分类）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/supervisor` - 运行监督器，管理指令和资源
//! - `orchestrator/run_loop` - 单轮运行，遍历表格行
//!
//! ## 模块结构

pub mod browser;
pub mod channel;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use channel::{EventReporter, OperatorCommand, RunEvent};
pub use config::Config;
pub use error::{ControlError, DriverError, ProcessError, RunError, StoreError};
pub use infrastructure::{ChromiumDriver, Locator, PageDriver};
pub use models::{KeywordSet, Outcome, Record, RunSummary};
pub use orchestrator::{Orchestrator, Supervisor};
pub use workflow::{RecordCtx, RecordFlow};
