//! The two-phase export pipeline.
//!
//! Phase one walks every note row, writes `<id>.json` into the destination
//! and collects the attachments the note bodies reference. Phase two copies
//! those attachments once the whole query has been consumed. Both phases run
//! sequentially on a single worker and report through a shared [`ExportRun`].

use crate::core::access::{AccessGuard, SourceAccess, UnscopedAccess};
use crate::{
    references, AttachmentResolver, ExportError, ExportRun, ExportSummary, NoteRecord, Result,
    SourceDatabase,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// The invocation inputs for one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Bear's data directory, the one containing `Application Data`.
    pub source_root: PathBuf,
    /// Existing directory that receives the JSON files and attachments.
    pub destination_root: PathBuf,
    pub include_trashed: bool,
}

impl ExportOptions {
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        include_trashed: bool,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            include_trashed,
        }
    }

    /// Checks that the source holds a Bear database and the destination is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::SourceNotFound`] or
    /// [`ExportError::DestinationNotDirectory`]. Write permission is not
    /// checked here; an unwritable destination fails on the first note with
    /// [`ExportError::WriteNote`].
    pub fn validate(&self) -> Result<()> {
        let database = crate::database_path(&self.source_root);
        if !database.is_file() {
            return Err(ExportError::SourceNotFound(database));
        }
        if !self.destination_root.is_dir() {
            return Err(ExportError::DestinationNotDirectory(
                self.destination_root.clone(),
            ));
        }
        Ok(())
    }
}

/// Deduplicated attachment copies, keyed by destination path.
///
/// Inserting a second source for the same destination replaces the first.
#[derive(Debug, Default)]
pub struct CopyPlan {
    tasks: HashMap<PathBuf, PathBuf>,
    rejected: Vec<String>,
}

impl CopyPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `source -> destination`, returning the source it replaced.
    pub fn insert(&mut self, source: PathBuf, destination: PathBuf) -> Option<PathBuf> {
        self.tasks.insert(destination, source)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Records an attachment name that cannot be placed under the roots.
    pub fn reject(&mut self, name: &str) {
        self.rejected.push(name.to_string());
    }

    /// Rejected names, in the order they were found.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    #[cfg(test)]
    pub(crate) fn source_for(&self, destination: &Path) -> Option<&Path> {
        self.tasks.get(destination).map(PathBuf::as_path)
    }

    /// `(source, destination)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.tasks
            .iter()
            .map(|(destination, source)| (source.as_path(), destination.as_path()))
    }
}

/// Adds every attachment `note` references to `plan`.
///
/// Notes without the image or file flag are not scanned at all. Names that
/// would climb out of the roots are rejected instead of planned.
pub fn plan_note_attachments(note: &NoteRecord, resolver: &AttachmentResolver, plan: &mut CopyPlan) {
    if !note.may_reference_attachments() {
        return;
    }
    for reference in references(&note.text) {
        let Some(resolved) = resolver.resolve(&reference) else {
            log::warn!(
                "Note {} references unusable attachment name {:?}",
                note.id,
                reference.name
            );
            plan.reject(&reference.name);
            continue;
        };
        if let Some(previous) = plan.insert(resolved.source.clone(), resolved.destination.clone()) {
            if previous != resolved.source {
                log::debug!(
                    "{} now copies from {} instead of {}",
                    resolved.destination.display(),
                    resolved.source.display(),
                    previous.display()
                );
            }
        }
    }
}

/// Writes `note` as pretty-printed JSON to `<destination_root>/<id>.json`.
pub fn write_note(note: &NoteRecord, destination_root: &Path) -> Result<PathBuf> {
    let path = destination_root.join(format!("{}.json", note.id));
    let json = serde_json::to_string_pretty(note)?;
    fs::write(&path, json).map_err(|source| ExportError::WriteNote {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Runs an export with plain filesystem access. See [`export_notes_with_access`].
pub fn export_notes(options: &ExportOptions, run: &ExportRun) -> Result<ExportSummary> {
    export_notes_with_access(options, run, &UnscopedAccess)
}

/// Runs both phases to completion on the calling thread.
///
/// Source access is held for the whole run and released on every return.
/// A fatal error is recorded on `run` before it is returned.
///
/// # Errors
///
/// Any [`ExportError`] from opening the source, reading a row, or writing a
/// note's JSON. Missing attachments are not errors; they are listed in
/// [`ExportRun::errors`].
pub fn export_notes_with_access(
    options: &ExportOptions,
    run: &ExportRun,
    access: &dyn SourceAccess,
) -> Result<ExportSummary> {
    let _guard = AccessGuard::acquire(access, &options.source_root);
    match run_pipeline(options, run) {
        Ok(()) => Ok(run.snapshot()),
        Err(e) => {
            log::error!("Export aborted: {e}");
            run.abort(e.user_message());
            Err(e)
        }
    }
}

/// Starts the export on a background worker thread.
///
/// `run` is shared with the caller, who can poll it while the worker runs.
pub fn spawn_export(
    options: ExportOptions,
    run: Arc<ExportRun>,
) -> Result<JoinHandle<Result<ExportSummary>>> {
    spawn_export_with_access(options, run, Arc::new(UnscopedAccess))
}

pub fn spawn_export_with_access(
    options: ExportOptions,
    run: Arc<ExportRun>,
    access: Arc<dyn SourceAccess>,
) -> Result<JoinHandle<Result<ExportSummary>>> {
    let handle = thread::Builder::new()
        .name("bear-export".to_string())
        .spawn(move || export_notes_with_access(&options, &run, access.as_ref()))?;
    Ok(handle)
}

fn run_pipeline(options: &ExportOptions, run: &ExportRun) -> Result<()> {
    options.validate()?;
    let db = SourceDatabase::open(&options.source_root)?;
    let resolver = AttachmentResolver::new(&options.source_root, &options.destination_root);

    let total = db.count_notes(options.include_trashed)?;
    run.set_total_notes(total);
    log::info!(
        "Exporting {total} notes to {}",
        options.destination_root.display()
    );

    let mut plan = CopyPlan::new();
    db.for_each_note(options.include_trashed, |note| {
        plan_note_attachments(&note, &resolver, &mut plan);
        let path = write_note(&note, &options.destination_root)?;
        log::debug!("Wrote {}", path.display());
        run.note_processed();
        Ok(())
    })?;

    log::info!("Copying {} attachments", plan.len());
    copy_attachments(&plan, &resolver, run);

    run.finish();
    log::info!(
        "Export finished: {} notes, {} files, {} errors",
        run.processed_notes(),
        run.files_copied(),
        run.errors().len()
    );
    Ok(())
}

fn copy_attachments(plan: &CopyPlan, resolver: &AttachmentResolver, run: &ExportRun) {
    for name in plan.rejected() {
        run.push_error(format!("{name} is not a valid attachment name"));
    }
    for (source, destination) in plan.iter() {
        if !source.exists() {
            run.push_error(format!(
                "{} could not be found",
                resolver.display_path(source)
            ));
            continue;
        }
        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Could not create {}: {e}", parent.display());
            }
        }
        match fs::copy(source, destination) {
            Ok(_) => run.file_copied(),
            Err(e) => log::warn!(
                "Could not copy {} to {}: {e}",
                source.display(),
                destination.display()
            ),
        }
    }
}
