mod progress;
mod settings;

use bearexport_core::{spawn_export, ExportRun, ExportSummary};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Export Bear notes and attachments to JSON", long_about = None)]
struct Cli {
    /// Directory that receives `<id>.json` files and attachments
    destination: PathBuf,
    /// Bear's data directory (defaults to Bear's group container)
    #[arg(long)]
    source: Option<PathBuf>,
    /// Also export notes in Bear's trash
    #[arg(long)]
    include_trashed: bool,
    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let options = match settings::build_options(cli.source, cli.destination, cli.include_trashed)
    {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let run = Arc::new(ExportRun::new());
    let worker = match spawn_export(options, Arc::clone(&run)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    if !cli.json {
        if let Err(e) = progress::watch(&run, &mut std::io::stderr(), || worker.is_finished()) {
            log::warn!("Progress output failed: {e}");
        }
    }

    let summary = match worker.join() {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            log::debug!("Worker returned {e:?}");
            run.snapshot()
        }
        Err(_) => {
            eprintln!("Export worker panicked");
            return ExitCode::FAILURE;
        }
    };

    print_summary(&summary, cli.json);
    if summary.fatal_error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_summary(summary: &ExportSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Failed to serialize summary: {e}"),
        }
        return;
    }
    for line in progress::report_lines(summary) {
        println!("{line}");
    }
}
