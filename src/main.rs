// ============================================================
// CSVMEND ENTRY POINT
// ============================================================
// Parse the CLI, dispatch single-file or bulk processing, map the
// outcome to an exit code

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use csvmend::application::{BulkProcessor, CsvRepairer, FsArchiveService, FsFolderSource};
use csvmend::domain::{AppError, ArchiveService, Result, RunStatus};
use csvmend::interfaces::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match run(&cli) {
        Ok(RunStatus::Clean) => ExitCode::SUCCESS,
        Ok(RunStatus::IssuesFound) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<RunStatus> {
    let options = cli.to_options();

    if let Some(folder) = &cli.bulk {
        let processor = BulkProcessor::new(options)
            .with_output_folder(cli.output_folder.clone())
            .with_subfolders(!cli.no_subfolders);
        let archiver = FsArchiveService;
        let archiver_ref: Option<&dyn ArchiveService> =
            if cli.archive { Some(&archiver) } else { None };

        let summary = processor.process_folder(folder, &FsFolderSource, archiver_ref)?;
        if summary.failed > 0 {
            return Err(AppError::Internal(format!(
                "{} of {} file(s) failed",
                summary.failed, summary.total_files
            )));
        }
        if summary.total_issues == 0 {
            Ok(RunStatus::Clean)
        } else {
            Ok(RunStatus::IssuesFound)
        }
    } else {
        let input = cli
            .input
            .as_ref()
            .ok_or_else(|| AppError::Internal("No input file given".to_string()))?;
        let report = CsvRepairer::new(options).process(input)?;
        Ok(report.status())
    }
}
