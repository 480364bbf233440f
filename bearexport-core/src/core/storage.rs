use crate::{database_path, ExportError, NoteRecord, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// Columns read for every note, in the order [`NoteRecord::from_row`] expects.
pub const NOTE_COLUMNS: &str = "ZUNIQUEIDENTIFIER, ZTEXT, ZHASIMAGES, ZHASFILES, ZTRASHED, \
     ZCREATIONDATE, ZMODIFICATIONDATE, ZPINNED";

const NOTES_TABLE: &str = "ZSFNOTE";

/// Read-only handle on Bear's `database.sqlite`.
pub struct SourceDatabase {
    conn: Connection,
}

impl SourceDatabase {
    /// Opens the database under `source_root` without write access.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::SourceNotFound`] if the file is missing,
    /// [`ExportError::InvalidSource`] if the notes table or one of its columns
    /// is absent, or [`ExportError::Database`] if SQLite cannot open it.
    pub fn open(source_root: &Path) -> Result<Self> {
        let path = database_path(source_root);
        if !path.is_file() {
            return Err(ExportError::SourceNotFound(path));
        }
        Self::open_file(&path)
    }

    /// Opens a database file directly.
    pub fn open_file(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let db = Self { conn };
        db.validate()?;
        Ok(db)
    }

    fn validate(&self) -> Result<()> {
        let table_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
            [NOTES_TABLE],
            |row| row.get(0),
        )?;
        if table_count != 1 {
            return Err(ExportError::InvalidSource(format!(
                "missing {NOTES_TABLE} table"
            )));
        }

        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1)")?;
        let columns: Vec<String> = stmt
            .query_map([NOTES_TABLE], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        for wanted in NOTE_COLUMNS.split(',').map(str::trim) {
            if !columns.iter().any(|c| c == wanted) {
                return Err(ExportError::InvalidSource(format!(
                    "{NOTES_TABLE} has no {wanted} column"
                )));
            }
        }
        Ok(())
    }

    /// Number of notes the row query will return.
    pub fn count_notes(&self, include_trashed: bool) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {NOTES_TABLE}{}",
            where_clause(include_trashed)
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Streams every note to `visit` in the order SQLite delivers them.
    ///
    /// Stops at the first row that fails to decode or the first error
    /// returned by `visit`.
    pub fn for_each_note<F>(&self, include_trashed: bool, mut visit: F) -> Result<()>
    where
        F: FnMut(NoteRecord) -> Result<()>,
    {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM {NOTES_TABLE}{}",
            where_clause(include_trashed)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let notes = stmt.query_map([], |row| NoteRecord::from_row(row))?;
        for note in notes {
            visit(note?)?;
        }
        Ok(())
    }
}

fn where_clause(include_trashed: bool) -> &'static str {
    if include_trashed {
        ""
    } else {
        " WHERE ZTRASHED = 0"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    /// Creates an empty `ZSFNOTE` table shaped like Bear's; used to build fixtures.
    pub(crate) fn create_source_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "CREATE TABLE ZSFNOTE (
                Z_PK INTEGER PRIMARY KEY,
                ZUNIQUEIDENTIFIER VARCHAR,
                ZTITLE VARCHAR,
                ZTEXT VARCHAR,
                ZHASIMAGES INTEGER,
                ZHASFILES INTEGER,
                ZTRASHED INTEGER,
                ZPINNED INTEGER,
                ZCREATIONDATE TIMESTAMP,
                ZMODIFICATIONDATE TIMESTAMP
            );",
        )
    }

    fn insert(conn: &Connection, id: &str, trashed: i64) {
        conn.execute(
            "INSERT INTO ZSFNOTE (ZUNIQUEIDENTIFIER, ZTEXT, ZHASIMAGES, ZHASFILES, ZTRASHED,
                                  ZPINNED, ZCREATIONDATE, ZMODIFICATIONDATE)
             VALUES (?1, 'body', 0, 0, ?2, 0, 613733400.25, 613733500.5)",
            rusqlite::params![id, trashed],
        )
        .unwrap();
    }

    fn fixture() -> NamedTempFile {
        let temp = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp.path()).unwrap();
        create_source_schema(&conn).unwrap();
        for (i, trashed) in [0, 1, 0, 1, 0].iter().enumerate() {
            insert(&conn, &format!("note-{i}"), *trashed);
        }
        temp
    }

    #[test]
    fn test_count_respects_trashed_filter() {
        let temp = fixture();
        let db = SourceDatabase::open_file(temp.path()).unwrap();
        assert_eq!(db.count_notes(false).unwrap(), 3);
        assert_eq!(db.count_notes(true).unwrap(), 5);
    }

    #[test]
    fn test_row_query_matches_count() {
        let temp = fixture();
        let db = SourceDatabase::open_file(temp.path()).unwrap();
        let mut seen = Vec::new();
        db.for_each_note(false, |note| {
            assert!(!note.trashed);
            seen.push(note.id);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["note-0", "note-2", "note-4"]);
    }

    #[test]
    fn test_visit_error_stops_scan() {
        let temp = fixture();
        let db = SourceDatabase::open_file(temp.path()).unwrap();
        let mut visited = 0;
        let result = db.for_each_note(true, |_| {
            visited += 1;
            Err(ExportError::InvalidSource("stop".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_undecodable_row_is_an_error() {
        let temp = fixture();
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute(
                "UPDATE ZSFNOTE SET ZTEXT = NULL WHERE ZUNIQUEIDENTIFIER = 'note-2'",
                [],
            )
            .unwrap();
        }
        let db = SourceDatabase::open_file(temp.path()).unwrap();
        let result = db.for_each_note(false, |_| Ok(()));
        assert!(matches!(result, Err(ExportError::Database(_))));
    }

    #[test]
    fn test_missing_database_file() {
        let dir = TempDir::new().unwrap();
        let result = SourceDatabase::open(dir.path());
        assert!(matches!(result, Err(ExportError::SourceNotFound(_))));
    }

    #[test]
    fn test_open_rejects_foreign_database() {
        let temp = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute("CREATE TABLE notes (id TEXT PRIMARY KEY)", [])
                .unwrap();
        }
        let result = SourceDatabase::open_file(temp.path());
        assert!(matches!(result, Err(ExportError::InvalidSource(_))));
    }

    #[test]
    fn test_open_rejects_not_a_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();
        assert!(SourceDatabase::open_file(temp.path()).is_err());
    }

    #[test]
    fn test_connection_is_read_only() {
        let temp = fixture();
        let db = SourceDatabase::open_file(temp.path()).unwrap();
        let result = db.conn.execute("DELETE FROM ZSFNOTE", []);
        assert!(result.is_err());
    }
}
