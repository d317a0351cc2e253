/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug / info。
/// 重复调用不会报错（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答题会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str, submit_retries: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题会话模式");
    info!("🌐 API 地址: {}", api_base_url);
    if submit_retries == 0 {
        info!("📮 成绩提交: 至多一次");
    } else {
        info!("📮 成绩提交: 失败后最多重试 {} 次", submit_retries);
    }
    info!("{}", "=".repeat(60));
}

/// 打印会话统计信息
///
/// # 参数
/// - `user`: 用户名
/// - `score`: 答对数量
/// - `total`: 题目总数
/// - `log_file_path`: 日志文件路径
pub fn log_session_summary(user: &str, score: u32, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 答题完成统计 - {}", user);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 得分: {}/{}", score, total);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
