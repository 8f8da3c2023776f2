//! Helper assets (stylesheet, icons) shared by every rendered chat.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ASSETS_DIR_NAME;
use crate::error::{ChatHtmlError, Result};

/// Copies `source` recursively to `<output_dir>/Library` unless that
/// directory already exists.
///
/// Returns `true` if anything was copied.
pub fn copy_assets_once(source: &Path, output_dir: &Path) -> Result<bool> {
    let target = output_dir.join(ASSETS_DIR_NAME);
    if target.exists() {
        debug!(target = %target.display(), "assets already present");
        return Ok(false);
    }
    if !source.is_dir() {
        return Err(ChatHtmlError::missing_assets(source));
    }

    let mut files = 0usize;
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => ChatHtmlError::Io(io),
            None => ChatHtmlError::missing_assets(source),
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
            files += 1;
        }
    }

    info!(files, target = %target.display(), "copied helper assets");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_tree_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("assets");
        fs::create_dir_all(source.join("icons")).unwrap();
        fs::write(source.join("styles.css"), "body{}").unwrap();
        fs::write(source.join("icons/favicon.ico"), [0u8, 1, 2]).unwrap();
        let output = dir.path().join("out");
        fs::create_dir_all(&output).unwrap();

        assert!(copy_assets_once(&source, &output).unwrap());
        assert_eq!(
            fs::read_to_string(output.join("Library/styles.css")).unwrap(),
            "body{}"
        );
        assert!(output.join("Library/icons/favicon.ico").is_file());

        // Second run leaves the existing copy alone
        fs::write(source.join("styles.css"), "changed").unwrap();
        assert!(!copy_assets_once(&source, &output).unwrap());
        assert_eq!(
            fs::read_to_string(output.join("Library/styles.css")).unwrap(),
            "body{}"
        );
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_assets_once(&dir.path().join("nope"), dir.path()).unwrap_err();
        assert!(err.is_missing_assets());
        assert!(!err.is_missing_media());
        assert!(!dir.path().join("Library").exists());
    }
}
