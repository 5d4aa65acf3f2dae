/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunSummary;

/// 初始化 tracing 日志
///
/// 设置了 `RUST_LOG` 时以它为准，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("expediente_scanner={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 案卷关键词扫描");
    info!("🌐 门户地址: {}", config.target_url);
    info!("⏱️ 超时: {} ms", config.timeout_ms);
    info!("📦 批量保存: 每 {} 行", config.effective_batch_size());
    match config.browser_debug_port {
        Some(port) => info!("🔌 连接已有浏览器，调试端口: {}", port),
        None => info!("🖥️ 启动新浏览器 (headless: {})", config.headless),
    }
    info!("{}", "=".repeat(60));
}

/// 打印一轮运行的最终统计
pub fn print_final_stats(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 找到关键词: {}/{}", summary.succeeded, summary.processed);
    info!("❌ 出错: {}", summary.errored);
    info!("⏭️ 跳过: {}", summary.skipped);
    info!("💾 保存批次: {}", summary.batches_flushed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
