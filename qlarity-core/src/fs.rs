//! Filesystem access for bundled and local report files.

use std::path::{Path, PathBuf};

use crate::domain::StoredReport;
use crate::error::Result;
use crate::ingest::parse_reports;
use crate::selection::records_from_reports;

/// Well-known location of the bundled fallback dataset.
pub const DEFAULT_FALLBACK_PATH: &str = "data/test-coverage-data.json";

/// Abstraction over filesystem access for testability.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    /// Read a file into a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone)]
pub struct StdFileSystem;

impl StdFileSystem {
    /// Create a new standard filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Load the bundled dataset as records with `default-N` ids.
pub fn load_bundled<F: FileSystem>(fs: &F, path: &Path) -> Result<Vec<StoredReport>> {
    load_report_files(fs, &[path.to_path_buf()])
}

/// Load several local report files; ids are numbered across all files.
///
/// The first file that cannot be read or recognized aborts the whole load.
pub fn load_report_files<F: FileSystem>(fs: &F, paths: &[PathBuf]) -> Result<Vec<StoredReport>> {
    let mut reports = Vec::new();
    for path in paths {
        let contents = fs.read_to_string(path)?;
        reports.extend(parse_reports(&contents)?);
    }
    Ok(records_from_reports(reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QlarityError;

    #[test]
    fn std_filesystem_reads_files() {
        let root = std::env::temp_dir().join(unique_dir_name());
        std::fs::create_dir_all(&root).expect("create temp dir");
        let file_path = root.join("report.json");
        std::fs::write(&file_path, r#"{"context":{"repository":"web"}}"#).expect("write");

        let fs = StdFileSystem::new();
        let records = load_bundled(&fs, &file_path).expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "default-0");
        assert_eq!(records[0].repository, "web");

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[test]
    fn load_report_files_numbers_across_files() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("a.json"))
            .returning(|_| {
                Ok(r#"{"contexts":[{"context":{"repository":"web"}},{"context":{"repository":"api"}}]}"#
                    .to_string())
            });
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("b.json"))
            .returning(|_| Ok(r#"{"reports":[{"name":"jobs","data":{"context":{}}}]}"#.to_string()));

        let records =
            load_report_files(&fs, &[PathBuf::from("a.json"), PathBuf::from("b.json")])
                .expect("records");
        let summary: Vec<_> = records
            .iter()
            .map(|record| (record.id.as_str(), record.repository.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("default-0", "web"), ("default-1", "api"), ("default-2", "jobs")]
        );
    }

    #[test]
    fn load_bundled_propagates_format_errors() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok("[1, 2, 3]".to_string()));

        let error = load_bundled(&fs, Path::new("bundle.json")).unwrap_err();
        assert!(matches!(error, QlarityError::UnrecognizedFormat(_)));
    }

    #[test]
    fn load_bundled_propagates_io_errors() {
        let fs = StdFileSystem::new();
        let missing = std::env::temp_dir()
            .join(unique_dir_name())
            .join("missing.json");
        let error = load_bundled(&fs, &missing).unwrap_err();
        assert!(matches!(error, QlarityError::Io(_)));
    }

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        PathBuf::from(format!("qlarity_core_test_{nanos}"))
    }
}
