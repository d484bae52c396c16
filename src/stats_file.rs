/// Loading the simulator statistics dump.
///
/// The whole file is read into memory up front; a stats report is bounded
/// by the number of simulated objects, not by run length.
use std::path::{Path, PathBuf};

/// Errors produced while reading the statistics file.
#[derive(Debug)]
pub enum StatsFileError {
    /// The statistics file does not exist.
    NotFound { path: PathBuf },
    /// The file exists but could not be read (permissions, invalid UTF-8, ...).
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for StatsFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFileError::NotFound { path } => write!(f, "File {} not found", path.display()),
            StatsFileError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for StatsFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatsFileError::NotFound { .. } => None,
            StatsFileError::Read { source, .. } => Some(source),
        }
    }
}

/// Read a statistics file into memory.
pub fn read_stats(path: &Path) -> Result<String, StatsFileError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!(
                path = %path.display(),
                bytes = contents.len(),
                "loaded statistics file"
            );
            Ok(contents)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StatsFileError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(StatsFileError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_stats_returns_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(&path, "system.cpu.ipc 1.5\n").unwrap();
        assert_eq!(read_stats(&path).unwrap(), "system.cpu.ipc 1.5\n");
    }

    #[test]
    fn test_read_stats_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = read_stats(&path).unwrap_err();
        assert!(matches!(err, StatsFileError::NotFound { .. }));
        assert_eq!(err.to_string(), format!("File {} not found", path.display()));
    }

    #[test]
    fn test_read_stats_directory_is_read_error() {
        let dir = tempdir().unwrap();
        let err = read_stats(dir.path()).unwrap_err();
        assert!(matches!(err, StatsFileError::Read { .. }));
    }

    #[test]
    fn test_read_stats_invalid_utf8_is_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = read_stats(&path).unwrap_err();
        assert!(matches!(err, StatsFileError::Read { .. }));
    }
}
