mod app;

use clap::Parser;
use csvlog_analysis::cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    #[cfg(feature = "logging")]
    let _guard = match csvlog_analysis::logging::init_logging(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("日志初始化失败: {e}");
            return ExitCode::from(2);
        }
    };

    match app::run(&cli, &config) {
        Ok(summary) if summary.has_failures() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
