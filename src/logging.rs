//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 控制台日志固定输出到 stderr（stdout 用于数据输出），
//! 配置了 `log_dir` 时额外输出到按天滚动的日志文件。

use crate::config::LogConfig;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
    #[error("日志配置错误: {0}")]
    Config(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

/// 初始化日志系统
///
/// - 环境变量 `RUST_LOG` 优先，否则使用配置的级别
/// - 控制台输出到 stderr
/// - 配置 `log_dir` 时按天滚动写入 `<log_dir>/csvlog.<日期>`
///
/// 返回文件日志的 guard，调用方需持有到进程结束，否则缓冲的日志会丢失。
/// 重复初始化不是错误，会被安静地忽略。
///
/// # Examples
///
/// ```no_run
/// use csvlog_analysis::config::LogConfig;
/// use csvlog_analysis::logging::init_logging;
///
/// let _guard = init_logging(&LogConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LogConfig) -> LogResult<Option<WorkerGuard>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| LogError::Config(e.to_string()))?,
    };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(SystemTime)
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(false);

    let (file_layer, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "csvlog");
            let (non_blocking, guard) =
                tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_timer(SystemTime)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_ansi(false); // 文件中不使用颜色
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // 已经初始化过了，这不是错误
    if subscriber.try_init().is_ok() {
        tracing::debug!("日志系统初始化完成, 级别: {}", config.level);
    }
    Ok(guard)
}

/// 使用默认配置初始化日志系统
pub fn init_default_logging() -> LogResult<Option<WorkerGuard>> {
    init_logging(&LogConfig::default())
}
