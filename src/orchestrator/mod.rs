//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责运行调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `supervisor` - 运行监督器
//! - 接收操作员指令（开始 / 确认登录 / 停止）
//! - 保证同一时间只有一轮运行（原子标志）
//! - 管理资源（存储、浏览器会话）的打开与关闭
//! - 把致命错误汇报给操作员
//!
//! ### `run_loop` - 单轮运行
//! - 遍历表格中的所有行（Vec<Row>）
//! - 复用 RecordFlow 处理每条记录
//! - 每条记录后复位搜索页
//! - 批量保存结果
//! - 输出本轮统计信息
//!
//! ## 层次关系
//!
//! ```text
//! supervisor (处理 OperatorCommand)
//!     ↓
//! run_loop (处理 Vec<Row>)
//!     ↓
//! workflow::RecordFlow (处理单条 Record)
//!     ↓
//! services (能力层：store / save_queue / reset)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：supervisor 管生命周期，run_loop 管一轮记录
//! 2. **资源隔离**：只有编排层持有浏览器会话
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体页面判断

pub mod run_loop;
pub mod supervisor;

// 重新导出主要类型
pub use run_loop::{run_control, Orchestrator, RunControl, RunHandle, RunSettings};
pub use supervisor::Supervisor;
