//! 调试导出器：通过日志打印每条记录的全部字段

use super::SyncExporter;
use crate::csvlog::types::CsvLog;
use crate::error::Result;
use crate::exporter::ExportStats;
use std::sync::Mutex;

/// 以 `info` 级别逐条打印记录，不产生分隔文本输出
#[derive(Debug, Default)]
pub struct TracingExporter {
    stats: Mutex<ExportStats>,
}

impl TracingExporter {
    pub fn new() -> Self {
        Self { stats: Mutex::new(ExportStats::new()) }
    }
}

impl SyncExporter for TracingExporter {
    fn name(&self) -> &str {
        "DEBUG"
    }

    fn export_record(&self, record: &CsvLog) -> Result<()> {
        tracing::info!(?record, "记录");
        if let Ok(mut stats) = self.stats.lock() {
            stats.exported_records += 1;
        }
        Ok(())
    }

    fn finalize(&self) -> Result<()> {
        if let Ok(mut stats) = self.stats.lock() {
            stats.finish();
        }
        Ok(())
    }

    fn get_stats(&self) -> ExportStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}
