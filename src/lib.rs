//! PostgreSQL csvlog 处理库
//!
//! 读取 csvlog（可为 gzip 压缩），把同一会话中分成两行记录的语句与耗时
//! 合并为一条，按需展开或归一化 SQL 文本，再以 csv/tsv 输出。多个文件
//! 由固定数量的工作线程并发处理，共享同一个输出。

pub mod cli;
pub mod config;
pub mod csvlog;
pub mod error;
pub mod error_writer;
pub mod exporter;

#[cfg(feature = "logging")]
pub mod logging;

pub use config::{Config, CsvlogConfig, OutputFormat, QueryTransform};
pub use error::{CsvlogError, Result};
