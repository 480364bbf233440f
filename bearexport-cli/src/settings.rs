//! Default locations and argument validation for the command-line front end.
//!
//! Nothing is persisted between runs; every value comes from the command line
//! or from the platform defaults computed here.

use bearexport_core::ExportOptions;
use std::path::PathBuf;

/// Bear's group-container identifier on macOS.
pub const BEAR_GROUP_CONTAINER: &str = "9K33E3U3T4.net.shinyfrog.bear";

/// Returns the directory Bear keeps its data in:
/// `~/Library/Group Containers/9K33E3U3T4.net.shinyfrog.bear`.
pub fn default_source_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Library")
        .join("Group Containers")
        .join(BEAR_GROUP_CONTAINER)
}

/// Builds export options, falling back to the default Bear directory.
///
/// Validation failures are returned as display-ready strings.
pub fn build_options(
    source: Option<PathBuf>,
    destination: PathBuf,
    include_trashed: bool,
) -> Result<ExportOptions, String> {
    let source = source.unwrap_or_else(default_source_directory);
    let options = ExportOptions::new(source, destination, include_trashed);
    options.validate().map_err(|e| e.user_message())?;
    Ok(options)
}
