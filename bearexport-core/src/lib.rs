//! Core library for Bear Export — copies notes out of Bear's local database.
//!
//! The primary entry points are [`export_notes`] (run on the calling thread)
//! and [`spawn_export`] (run on a background worker). Both report progress
//! through a shared [`ExportRun`] and write one `<id>.json` per note plus the
//! image and file attachments the notes reference.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    access::{AccessGuard, SourceAccess, UnscopedAccess},
    attachment::{
        database_path, local_files_dir, references, AttachmentKind, AttachmentReference,
        AttachmentResolver, References, ResolvedAttachment,
    },
    error::{ExportError, Result},
    export::{
        export_notes, export_notes_with_access, plan_note_attachments, spawn_export,
        spawn_export_with_access, write_note, CopyPlan, ExportOptions,
    },
    note::{date_from_reference_seconds, NoteRecord},
    run::{ExportRun, ExportSummary},
    storage::{SourceDatabase, NOTE_COLUMNS},
};
