//! 导出统计信息模块

use std::time::{Duration, Instant};

/// 导出统计信息
#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    /// 已导出的记录数
    pub exported_records: usize,
    /// 导出开始时间
    pub start_time: Option<Instant>,
    /// 导出完成时间
    pub end_time: Option<Instant>,
}

impl ExportStats {
    /// 创建新的统计信息，记录开始时间
    pub fn new() -> Self {
        Self { start_time: Some(Instant::now()), ..Default::default() }
    }

    /// 标记导出完成，记录结束时间
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// 导出持续时间
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// 每秒导出记录数
    pub fn records_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            if d.as_secs_f64() > 0.0 {
                self.exported_records as f64 / d.as_secs_f64()
            } else {
                0.0
            }
        })
    }
}

impl std::fmt::Display for ExportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "导出: {} 条", self.exported_records)?;

        if let Some(duration) = self.duration() {
            write!(f, ", 耗时: {:.2}s", duration.as_secs_f64())?;

            if let Some(rps) = self.records_per_second() {
                write!(f, ", 速度: {:.2} 记录/秒", rps)?;
            }
        }
        Ok(())
    }
}
