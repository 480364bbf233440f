//! The exported note record and Bear's timestamp conversion.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Unix timestamp of 2001-01-01T00:00:00Z, the zero point of Bear's dates.
pub const REFERENCE_EPOCH_UNIX: i64 = 978_307_200;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// One note as written to `<id>.json`.
///
/// Field names serialize in camelCase (`hasImages`, `creationDate`, ...) and
/// timestamps as RFC 3339 in UTC with fractional seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub text: String,
    pub has_images: bool,
    pub has_files: bool,
    pub trashed: bool,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
    pub pinned: bool,
}

impl NoteRecord {
    /// Builds a record from a row selected with [`crate::NOTE_COLUMNS`].
    ///
    /// Integer flags are `true` only when equal to 1. An unrepresentable
    /// creation date falls back to the current time; an unrepresentable
    /// modification date is a conversion error.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created: f64 = row.get(5)?;
        let modified: f64 = row.get(6)?;

        let creation_date = date_from_reference_seconds(created).unwrap_or_else(|| {
            log::warn!("Creation date {created} is not representable, using current time");
            Utc::now()
        });
        let modification_date = date_from_reference_seconds(modified).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                Type::Real,
                format!("modification date {modified} is not representable").into(),
            )
        })?;

        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            has_images: flag(row.get(2)?),
            has_files: flag(row.get(3)?),
            trashed: flag(row.get(4)?),
            creation_date,
            modification_date,
            pinned: flag(row.get(7)?),
        })
    }

    /// Whether the note body should be scanned for attachment references.
    pub fn may_reference_attachments(&self) -> bool {
        self.has_images || self.has_files
    }
}

fn flag(value: i64) -> bool {
    value == 1
}

/// Converts seconds since 2001-01-01T00:00:00Z to an absolute instant.
///
/// Keeps sub-second precision down to the nanosecond. Returns `None` for NaN,
/// infinities, and values outside chrono's range.
pub fn date_from_reference_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let mut whole = seconds.floor();
    let mut nanos = ((seconds - whole) * NANOS_PER_SECOND).round();
    if nanos >= NANOS_PER_SECOND {
        whole += 1.0;
        nanos = 0.0;
    }
    if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return None;
    }
    let unix = (whole as i64).checked_add(REFERENCE_EPOCH_UNIX)?;
    DateTime::<Utc>::from_timestamp(unix, nanos as u32)
}
