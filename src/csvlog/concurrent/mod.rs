//! 并发处理模块
//!
//! 提供按文件划分的多线程处理：一个分发线程、固定数量的工作线程。

mod file_workers;
pub mod types;

pub mod concurrent_processor;

// 重新导出主要类型和接口
pub use concurrent_processor::ConcurrentProcessor;
pub use types::{FailedFile, FileTask, RunSummary};
