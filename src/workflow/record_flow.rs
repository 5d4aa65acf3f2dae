//! 记录处理流程 - 流程层
//!
//! 核心职责：定义"一条记录"在门户上的完整处理流程
//!
//! 流程顺序：
//! 1. 填写编码并回读校验
//! 2. 应用筛选 → 等待结果按钮（超时则检查"无结果"提示）
//! 3. 打开结果 → 等待详情（文本框出现 / 网络空闲，先到先得）
//! 4. 提取页面文本 → 关键词分类

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::{DriverError, ProcessError};
use crate::infrastructure::{ElementState, PageDriver};
use crate::models::{KeywordSet, Outcome, PortalLayout};
use crate::utils::logging::truncate_text;
use crate::workflow::record_ctx::RecordCtx;

/// 流程阶段
///
/// 失败时记录"停在哪个阶段"，便于定位是哪一步的页面操作出了问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    FieldFilled,
    FiltersApplied,
    ResultSelected,
    DetailLoaded,
    Classified,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStage::Idle => "填写编码",
            FlowStage::FieldFilled => "应用筛选",
            FlowStage::FiltersApplied => "打开结果",
            FlowStage::ResultSelected => "等待详情",
            FlowStage::DetailLoaded => "提取文本",
            FlowStage::Classified => "分类完成",
        };
        write!(f, "{}", name)
    }
}

fn at(stage: FlowStage) -> impl FnOnce(DriverError) -> ProcessError {
    move |source| ProcessError::Driver { stage, source }
}

/// 记录处理流程
///
/// - 不持有任何资源（page 由调用方传入）
/// - 不做持久化
/// - 每一次等待都有超时
pub struct RecordFlow {
    layout: PortalLayout,
    keywords: KeywordSet,
    timeout: Duration,
    settle_delay: Duration,
}

impl RecordFlow {
    pub fn new(
        layout: PortalLayout,
        keywords: KeywordSet,
        timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            layout,
            keywords,
            timeout,
            settle_delay,
        }
    }

    pub async fn run(
        &self,
        driver: &dyn PageDriver,
        ctx: &RecordCtx,
    ) -> Result<Outcome, ProcessError> {
        let code = ctx.code.as_str();

        // ========== 1. 填写并校验 ==========
        let field = &self.layout.search_field;
        driver.clear(field).await.map_err(at(FlowStage::Idle))?;
        driver.fill(field, code).await.map_err(at(FlowStage::Idle))?;

        let written = driver.read_value(field).await.map_err(at(FlowStage::Idle))?;
        if written != code {
            return Err(ProcessError::Validation {
                expected: code.to_string(),
                actual: written,
            });
        }
        debug!("{} 编码已写入", ctx);

        // ========== 2. 筛选并等待结果 ==========
        driver
            .click(&self.layout.apply_filters)
            .await
            .map_err(at(FlowStage::FieldFilled))?;

        let result_button = self.layout.result_button(code);
        if let Err(e) = driver
            .wait_for(&result_button, ElementState::Visible, self.timeout)
            .await
        {
            if !e.is_timeout() {
                return Err(at(FlowStage::FiltersApplied)(e));
            }
            debug!("{} 结果未出现: {}", ctx, e);
            let no_results = driver
                .is_visible(&self.layout.no_results)
                .await
                .unwrap_or(false);
            if no_results {
                return Ok(Outcome::NoResultsInSearch);
            }
            return Err(ProcessError::LookupTimeout {
                code: code.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            });
        }

        // ========== 3. 打开详情 ==========
        driver
            .click(&result_button)
            .await
            .map_err(at(FlowStage::FiltersApplied))?;

        let detail_areas = self.layout.detail_areas();
        let settled = tokio::select! {
            r = driver.wait_for(&detail_areas, ElementState::Attached, self.timeout) => r,
            r = driver.wait_for_network_idle(self.timeout) => r,
        };
        settled.map_err(at(FlowStage::ResultSelected))?;

        // 部分内容在详情出现后才渲染
        sleep(self.settle_delay).await;

        // ========== 4. 提取 & 分类 ==========
        let (areas, body) = tokio::join!(
            driver.extract_values(&self.layout.detail_textareas),
            driver.body_text()
        );
        let areas = areas.map_err(at(FlowStage::DetailLoaded))?;
        let body = body.map_err(at(FlowStage::DetailLoaded))?;

        let full_text = format!("{} {}", body, areas.join(" ")).to_uppercase();
        debug!("{} 详情文本: {}", ctx, truncate_text(&full_text, 120));

        let matches = self.keywords.classify(&full_text);
        if matches.is_empty() {
            Ok(Outcome::NotFound)
        } else {
            Ok(Outcome::Matched(matches))
        }
    }
}
