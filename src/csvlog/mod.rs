//! PostgreSQL csvlog 处理
//!
//! - [`io`]：打开文件并逐条扫描记录
//! - [`parser`]：字段解码与时间戳解析
//! - [`correlator`]：同一会话的语句与耗时记录合并
//! - [`canonicalize`]：SQL 文本展开与归一化
//! - [`pipeline`]：单文件处理流水线
//! - [`concurrent`]：多文件并发处理

pub mod canonicalize;
pub mod concurrent;
pub mod correlator;
pub mod io;
pub mod parser;
pub mod pipeline;
pub mod types;

pub use canonicalize::{CanonicalizeError, unfold_query};
pub use concurrent::{ConcurrentProcessor, RunSummary};
pub use correlator::SessionCorrelator;
pub use io::CsvlogReader;
pub use parser::parse_log_timestamp;
pub use pipeline::{FileSummary, PipelineOptions, process_file};
pub use types::{CsvLog, LogTimestamp};
