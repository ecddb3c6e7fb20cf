use anyhow::{Context, Result};
use csvlog_analysis::{
    cli::Cli,
    config::Config,
    csvlog::{ConcurrentProcessor, RunSummary},
    exporter::{SharedCsvWriter, SyncExporter, TracingExporter},
};
use std::sync::Arc;

pub fn run(cli: &Cli, config: &Config) -> Result<RunSummary> {
    let processor = ConcurrentProcessor::new(config.csvlog.clone());

    let summary = if config.csvlog.debug_print {
        processor.process_files(&cli.files, Arc::new(TracingExporter::new()))?
    } else {
        let writer = SharedCsvWriter::from_config(&config.csvlog)
            .context("无法创建输出")?;
        let writer: Arc<dyn SyncExporter> = Arc::new(writer);
        processor.process_files(&cli.files, writer)?
    };

    for failed in &summary.failed {
        tracing::error!("文件处理失败 {}: {}", failed.path.display(), failed.error);
    }
    Ok(summary)
}
