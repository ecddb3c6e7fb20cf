//! 集成测试公共模块

use csvlog_analysis::csvlog::CsvLog;
use csvlog_analysis::error::{CsvlogError, Result};
use csvlog_analysis::exporter::{ExportStats, SyncExporter};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// 生成一行 23 列的 csvlog 记录
pub fn csvlog_line(session: &str, line_num: usize, message: &str) -> String {
    let line_num = line_num.to_string();
    let mut fields = vec![""; 23];
    fields[0] = "2024-01-15 10:00:00.123 UTC";
    fields[1] = "postgres";
    fields[2] = "app";
    fields[3] = "1234";
    fields[4] = "127.0.0.1:5000";
    fields[5] = session;
    fields[6] = &line_num;
    fields[7] = "SELECT";
    fields[8] = "2024-01-15 09:59:00 UTC";
    fields[11] = "LOG";
    fields[12] = "00000";
    fields[13] = message;
    fields[22] = "psql";

    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    w.write_record(&fields).expect("写入测试记录失败");
    String::from_utf8(w.into_inner().expect("刷新测试记录失败"))
        .expect("测试记录不是 UTF-8")
}

/// 在临时目录中创建测试日志文件
pub fn create_test_csvlog(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 创建 gzip 压缩的测试日志文件
#[allow(dead_code)]
pub fn create_gz_csvlog(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).expect("压缩失败");
    let file_path = dir.path().join(filename);
    fs::write(&file_path, encoder.finish().expect("压缩失败"))
        .expect("Failed to write test file");
    file_path
}

/// 创建多个测试文件，第 i 个文件有 `records_per_file` 条记录，会话 ID 为 `S<i>`
#[allow(dead_code)]
pub fn create_multiple_test_files(
    dir: &TempDir,
    count: usize,
    records_per_file: usize,
) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let session = format!("S{i}");
            let content: String = (0..records_per_file)
                .map(|n| csvlog_line(&session, n + 1, &format!("statement: SELECT {n}")))
                .collect();
            create_test_csvlog(dir, &format!("postgresql-{i}.csv"), &content)
        })
        .collect()
}

/// 把记录收集到内存中的导出器
#[derive(Default)]
#[allow(dead_code)]
pub struct CollectingExporter {
    records: Mutex<Vec<CsvLog>>,
    finalized: Mutex<bool>,
}

#[allow(dead_code)]
impl CollectingExporter {
    pub fn records(&self) -> Vec<CsvLog> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn is_finalized(&self) -> bool {
        *self.finalized.lock().unwrap()
    }
}

impl SyncExporter for CollectingExporter {
    fn name(&self) -> &str {
        "collect"
    }

    fn export_record(&self, record: &CsvLog) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn finalize(&self) -> Result<()> {
        *self.finalized.lock().unwrap() = true;
        Ok(())
    }

    fn get_stats(&self) -> ExportStats {
        ExportStats {
            exported_records: self.records.lock().unwrap().len(),
            ..Default::default()
        }
    }
}

/// 写入若干条后开始失败的导出器
#[allow(dead_code)]
pub struct FailingExporter {
    pub fail_after: usize,
    written: Mutex<usize>,
    finalized: Mutex<bool>,
}

#[allow(dead_code)]
impl FailingExporter {
    pub fn new(fail_after: usize) -> Self {
        Self { fail_after, written: Mutex::new(0), finalized: Mutex::new(false) }
    }

    pub fn written(&self) -> usize {
        *self.written.lock().unwrap()
    }

    pub fn is_finalized(&self) -> bool {
        *self.finalized.lock().unwrap()
    }
}

impl SyncExporter for FailingExporter {
    fn name(&self) -> &str {
        "failing"
    }

    fn export_record(&self, _record: &CsvLog) -> Result<()> {
        let mut written = self.written.lock().unwrap();
        if *written >= self.fail_after {
            return Err(CsvlogError::write_error("磁盘已满"));
        }
        *written += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<()> {
        *self.finalized.lock().unwrap() = true;
        Ok(())
    }
}
