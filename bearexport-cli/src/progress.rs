//! Text rendering of a run's progress and final report.

use bearexport_core::{ExportRun, ExportSummary};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Formats a duration as zero-padded `MM:SS`.
pub fn human_duration(duration: chrono::Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// `Exporting <processed>/<total>` for the live line.
pub fn progress_line(run: &ExportRun) -> String {
    format!("Exporting {}/{}", run.processed_notes(), run.total_notes())
}

/// Redraws the progress line on `out` until the run is done or the worker exits.
pub fn watch(
    run: &ExportRun,
    out: &mut impl Write,
    worker_exited: impl Fn() -> bool,
) -> io::Result<()> {
    while !run.is_done() && !worker_exited() {
        write!(out, "\r{}", progress_line(run))?;
        out.flush()?;
        thread::sleep(POLL_INTERVAL);
    }
    writeln!(out, "\r{}", progress_line(run))?;
    Ok(())
}

/// The lines shown once a run has finished.
pub fn report_lines(summary: &ExportSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(fatal) = &summary.fatal_error {
        lines.push(format!("Export failed: {fatal}"));
    } else {
        lines.push(format!(
            "Processed {} notes in {}",
            summary.total_notes,
            human_duration(summary.elapsed())
        ));
        if summary.files_copied > 0 {
            lines.push(format!("{} files copied", summary.files_copied));
        }
    }
    lines.extend(summary.errors.iter().cloned());
    lines
}
