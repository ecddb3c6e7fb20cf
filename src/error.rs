//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。
//! 内容级错误（单条记录格式错误、引号未闭合）在处理流程中就地恢复，
//! 只有输出写入失败被视为致命错误。

use crate::csvlog::canonicalize::CanonicalizeError;
use std::path::PathBuf;

/// csvlog 处理的结果类型
pub type Result<T> = std::result::Result<T, CsvlogError>;

/// csvlog 处理错误类型
#[derive(Debug, thiserror::Error)]
pub enum CsvlogError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// csv 解码错误
    #[error("CSV错误: {0}")]
    Csv(#[from] csv::Error),

    /// 无法打开输入文件
    #[error("无法打开文件 {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 记录格式错误（字段数不符等）
    #[error("记录格式错误 (第{record}条记录, 行{line}): {message}")]
    Decode { record: usize, line: u64, message: String },

    /// 时间戳解析错误
    #[error("时间戳解析错误: '{value}': {message}")]
    Timestamp { value: String, message: String },

    /// SQL 归一化错误
    #[error("SQL归一化错误: {0}")]
    Canonicalize(#[from] CanonicalizeError),

    /// 输出写入错误
    #[error("写入输出失败: {0}")]
    Write(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 配置文件解析错误
    #[error("配置文件解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON 序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),

    /// 其他错误
    #[error("未知错误: {0}")]
    Other(String),
}

impl CsvlogError {
    /// 创建一个记录格式错误
    pub fn decode_error<S: Into<String>>(
        record: usize,
        line: u64,
        message: S,
    ) -> Self {
        Self::Decode { record, line, message: message.into() }
    }

    /// 创建一个时间戳解析错误
    pub fn timestamp_error<S: Into<String>>(value: &str, message: S) -> Self {
        Self::Timestamp { value: value.to_string(), message: message.into() }
    }

    /// 创建一个输出写入错误
    pub fn write_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        tracing::error!("写入输出失败: {}", message);
        Self::Write(message)
    }

    /// 创建一个配置错误
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        tracing::error!("配置错误: {}", message);
        Self::Config(message)
    }

    /// 创建一个其他类型错误
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }

    /// 是否应终止整个运行
    ///
    /// 输出一旦写入失败便不可信，其余错误都只影响单条记录或单个文件。
    pub fn is_fatal(&self) -> bool {
        matches!(self, CsvlogError::Write(_))
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, CsvlogError::Io(_) | CsvlogError::Open { .. })
    }

    /// 检查是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(self, CsvlogError::Config(_) | CsvlogError::Toml(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let decode_err = CsvlogError::decode_error(3, 7, "字段数为 5");
        assert!(!decode_err.is_fatal());
        assert!(decode_err.to_string().contains("第3条记录"));

        let write_err = CsvlogError::write_error("broken pipe");
        assert!(write_err.is_fatal());

        let config_err = CsvlogError::config_error("线程数不能为0");
        assert!(config_err.is_config_error());
        assert!(!config_err.is_io_error());
    }

    #[test]
    fn test_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: CsvlogError = io_err.into();
        assert!(err.is_io_error());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_open_error_display() {
        let err = CsvlogError::Open {
            path: PathBuf::from("/tmp/missing.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let display = err.to_string();
        assert!(display.contains("/tmp/missing.csv"));
        assert!(display.contains("no such file"));
        assert!(err.is_io_error());
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CsvlogError = json_err.into();
        assert!(matches!(err, CsvlogError::Json(_)));
        assert!(err.to_string().starts_with("JSON错误"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_canonicalize_error_is_not_fatal() {
        let err: CsvlogError = CanonicalizeError::UnterminatedQuote {
            partial: "select ?".to_string(),
        }
        .into();
        assert!(!err.is_fatal());
    }
}
