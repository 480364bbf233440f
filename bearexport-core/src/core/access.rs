//! Scoped read access to the source directory.
//!
//! Sandboxed platforms hand out read permission on a user-selected directory
//! that must be given back when the export stops. [`AccessGuard`] holds that
//! permission for the whole run and returns it on drop, so the release
//! happens on every exit path including an early fatal error.

use std::path::{Path, PathBuf};

/// Grants and revokes read access to a source root.
pub trait SourceAccess: Send + Sync {
    /// Requests access. Returns `true` if a grant was taken that must be released.
    fn start_accessing(&self, root: &Path) -> bool;

    /// Releases a grant previously returned by [`start_accessing`](Self::start_accessing).
    fn stop_accessing(&self, root: &Path);
}

/// Plain filesystem access; nothing to acquire.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnscopedAccess;

impl SourceAccess for UnscopedAccess {
    fn start_accessing(&self, _root: &Path) -> bool {
        false
    }

    fn stop_accessing(&self, _root: &Path) {}
}

/// Holds a source-access grant until dropped.
pub struct AccessGuard<'a> {
    access: &'a dyn SourceAccess,
    root: PathBuf,
    held: bool,
}

impl<'a> AccessGuard<'a> {
    pub fn acquire(access: &'a dyn SourceAccess, root: &Path) -> Self {
        let held = access.start_accessing(root);
        if held {
            log::debug!("Acquired scoped access to {}", root.display());
        }
        Self {
            access,
            root: root.to_path_buf(),
            held,
        }
    }
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            self.access.stop_accessing(&self.root);
            log::debug!("Released scoped access to {}", self.root.display());
        }
    }
}
