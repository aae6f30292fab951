/// 日志工具模块
///
/// 提供日志初始化、日志文件写入和统计输出的辅助函数
use crate::config::Config;
use crate::models::event::LogLevel;
use crate::orchestrator::RunSummary;
use crate::services::RepairStats;
use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 输出
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加一行日志到日志文件
pub fn append_log_line(log_file_path: &str, level: LogLevel, message: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "[{}] [{}] {}",
        chrono::Local::now().format("%H:%M:%S"),
        level,
        message
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量题目生成模式");
    info!("🌐 生成服务: {}", config.server_url);
    info!(
        "📋 内容类型: {} | 每批 {} 页 | 请求间隔 {}s",
        config.content_kind.label(),
        config.pages_per_batch,
        config.delay_seconds
    );
    info!(
        "🔄 会话重置: 每 {} 次请求",
        if config.premium_model { 10 } else { 20 }
    );
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
pub fn log_documents_loaded(total: usize, selected: usize) {
    info!("✓ 找到 {} 个文档，本次处理 {} 个", total, selected);
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, repair: &RepairStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.successful, summary.total_documents);
    info!("❌ 失败: {}", summary.failed);
    info!("💾 已保存记录: {}", summary.records_saved);
    info!(
        "🔧 修复统计: 直接 {} | 快速 {} | 截断 {} | 结构 {} | 抽取 {} | 失败 {} | 丢弃条目 {}",
        repair.fast_path,
        repair.quick_fix,
        repair.trimmed,
        repair.structural_repair,
        repair.partial_extract,
        repair.failures,
        repair.dropped_records
    );
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
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
