//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::portal::Lecture;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `base_url`: 门户地址
/// - `known_version`: 已知兼容的门户版本
pub fn log_startup(base_url: &str, known_version: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - EST 提交客户端");
    info!("🌐 门户地址: {}", base_url);
    info!("🏷️ 兼容版本: {}", known_version);
    info!("{}", "=".repeat(60));
}

/// 记录课程列表
pub fn log_lectures(lectures: &[Lecture]) {
    info!("📚 共 {} 门课程", lectures.len());
    for lecture in lectures {
        info!("  {}", lecture);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功步骤数
/// - `failed`: 失败步骤数
pub fn print_final_stats(success: usize, failed: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + failed);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("kurz", 10), "kurz");
        assert_eq!(truncate_text("Übungsblatt", 4), "Übun...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
