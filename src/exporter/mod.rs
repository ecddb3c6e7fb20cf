//! 数据导出模块
//!
//! 所有工作线程共享同一个导出器，导出器自己负责串行化写入，
//! 保证每条记录作为完整的一行输出。

pub mod delimited;
pub mod debug;
pub mod stats;

pub use delimited::SharedCsvWriter;
pub use debug::TracingExporter;
pub use stats::ExportStats;

use crate::csvlog::types::CsvLog;
use crate::error::Result;

/// 同步数据导出器的统一接口
pub trait SyncExporter: Send + Sync {
    /// 导出器名称
    fn name(&self) -> &str;

    /// 导出单个记录
    fn export_record(&self, record: &CsvLog) -> Result<()>;

    /// 批量导出记录
    fn export_batch(&self, records: &[CsvLog]) -> Result<()> {
        for record in records {
            self.export_record(record)?;
        }
        Ok(())
    }

    /// 完成导出，刷新缓冲
    fn finalize(&self) -> Result<()> {
        Ok(())
    }

    /// 获取导出统计信息
    fn get_stats(&self) -> ExportStats {
        ExportStats::default()
    }
}
