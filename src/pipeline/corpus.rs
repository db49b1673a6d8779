//! Corpus discovery and per-file loading.

use crate::extract::{self, DocumentFormat, ExtractedDocument};
use crate::pipeline::types::PassError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerate every file under `root`, depth-first in name-sorted order.
///
/// The sort makes discovery order (and therefore progress sequences and
/// aggregation order) reproducible across platforms. A missing or unreadable
/// root is the one hard failure a pass can have; unreadable entries below it
/// are logged and skipped.
pub(crate) fn discover_files(root: &Path) -> Result<Vec<PathBuf>, PassError> {
    std::fs::read_dir(root).map_err(|source| PassError::RootUnreadable {
        path: root.display().to_string(),
        source,
    })?;

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::warn!(%error, "Skipping unreadable corpus entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    Ok(files)
}

/// Classify and extract one corpus file.
pub(crate) fn load_document(path: &Path) -> ExtractedDocument {
    let format = extract::classify(path);
    if format == DocumentFormat::Unsupported {
        tracing::info!(file = %path.display(), "Skipping unsupported file");
    }
    extract::extract_document(path, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_files_in_sorted_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("c.txt"), "c").expect("write");
        std::fs::write(dir.path().join("a.txt"), "a").expect("write");
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");
        std::fs::write(dir.path().join("nested").join("b.txt"), "b").expect("write");

        let files = discover_files(dir.path()).expect("files");
        let names: Vec<String> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "c.txt", "b.txt"]);
    }

    #[test]
    fn missing_root_is_a_pass_error() {
        let error = discover_files(Path::new("/no/such/corpus")).expect_err("missing root");
        assert!(matches!(error, PassError::RootUnreadable { .. }));
    }
}
