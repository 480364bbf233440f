//! Attachment references embedded in note text and their on-disk locations.
//!
//! Bear writes attachments into the note body as `[image:NAME]` or
//! `[file:NAME]`. [`references`] extracts them in order of appearance and
//! [`AttachmentResolver`] maps each one to the file under Bear's
//! `Local Files` directory and to its flattened place in the destination.

use regex::{CaptureMatches, Regex};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Directory under the source root that holds Bear's database and attachments.
pub const APPLICATION_DATA_DIR: &str = "Application Data";
/// Database location relative to the source root.
pub const DATABASE_FILE: &str = "database.sqlite";
/// Attachment root relative to [`APPLICATION_DATA_DIR`].
pub const LOCAL_FILES_DIR: &str = "Local Files";
/// Subdirectory of [`LOCAL_FILES_DIR`] for `[file:...]` references.
pub const NOTE_FILES_DIR: &str = "Note Files";
/// Subdirectory of [`LOCAL_FILES_DIR`] for `[image:...]` references.
pub const NOTE_IMAGES_DIR: &str = "Note Images";

// Non-greedy by construction: NAME stops at the first `]`.
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(image|file):([^\]]+)\]").unwrap());

/// The two kinds of attachment Bear stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    File,
}

impl AttachmentKind {
    /// The `Local Files` subdirectory this kind lives in.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Image => NOTE_IMAGES_DIR,
            Self::File => NOTE_FILES_DIR,
        }
    }

    /// The keyword used inside the bracketed tag.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::File => "file",
        }
    }

    /// Parses a tag keyword; matching is case-sensitive.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        [Self::Image, Self::File]
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
    }
}

/// One `[kind:name]` tag found in a note body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentReference {
    pub kind: AttachmentKind,
    /// The filename exactly as it appears in the text.
    pub name: String,
}

/// Lazy iterator over the attachment references in a note body.
///
/// Call [`references`] again on the same text to restart the scan.
pub struct References<'t> {
    captures: CaptureMatches<'static, 't>,
}

impl Iterator for References<'_> {
    type Item = AttachmentReference;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        // The pattern only admits the two keywords.
        let kind = AttachmentKind::from_keyword(&caps[1])?;
        Some(AttachmentReference {
            kind,
            name: caps[2].to_string(),
        })
    }
}

/// Scans `text` for attachment tags, in order, duplicates included.
///
/// Keywords are case-sensitive. A tag with no closing bracket or an empty name
/// is skipped.
pub fn references(text: &str) -> References<'_> {
    References {
        captures: REFERENCE_RE.captures_iter(text),
    }
}

/// A resolved attachment: where to read it and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Pure path arithmetic from references to source and destination files.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    local_files: PathBuf,
    destination_root: PathBuf,
}

impl AttachmentResolver {
    pub fn new(source_root: &Path, destination_root: &Path) -> Self {
        Self {
            local_files: local_files_dir(source_root),
            destination_root: destination_root.to_path_buf(),
        }
    }

    /// Maps `reference` to `Local Files/<kind dir>/<name>` and `<destination>/<name>`.
    ///
    /// The destination ignores the kind, so an image and a file with the same
    /// name land on the same destination path. The name is always appended
    /// below both roots: a leading `/` is dropped. Returns `None` when the
    /// name contains `..` or has nothing left to append.
    pub fn resolve(&self, reference: &AttachmentReference) -> Option<ResolvedAttachment> {
        let relative = relative_name(&reference.name)?;
        Some(ResolvedAttachment {
            source: self
                .local_files
                .join(reference.kind.directory())
                .join(&relative),
            destination: self.destination_root.join(&relative),
        })
    }

    /// Strips the `Local Files` prefix from `path` for display.
    pub fn display_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.local_files) {
            Ok(relative) => format!("/{}", relative.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

/// Keeps only the normal components of `name`, refusing any `..`.
fn relative_name(name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

/// `<source_root>/Application Data/database.sqlite`.
pub fn database_path(source_root: &Path) -> PathBuf {
    source_root.join(APPLICATION_DATA_DIR).join(DATABASE_FILE)
}

/// `<source_root>/Application Data/Local Files`.
pub fn local_files_dir(source_root: &Path) -> PathBuf {
    source_root.join(APPLICATION_DATA_DIR).join(LOCAL_FILES_DIR)
}
