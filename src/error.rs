//! Error handling for EAIP import and query operations.
//!
//! Every failure is tagged with an [`ErrorClass`] so the import pipeline can
//! turn it into a single cause-classified message for the user, instead of
//! surfacing a raw low-level error string.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure taxonomy used when reporting an import outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Archive missing, corrupt, empty, encrypted with an unknown password,
    /// or carrying an unreadable manifest. Retrying with a valid archive fixes it.
    Input,
    /// Disk full or permission problems while writing.
    Resource,
    /// Undetectable period/vendor directory, missing manifest or chart file.
    /// Never fatal; the pipeline falls back and keeps going.
    StructuralWarning,
    /// A single file, airport or merge failed. Logged and excluded from totals.
    PerUnit,
}

#[derive(Error, Debug)]
pub enum EaipError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive not found at path: {path}")]
    NotFound { path: PathBuf },

    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("Archive {path} needs a valid password: {reason}")]
    InvalidPassword { path: PathBuf, reason: String },

    #[error("Not enough disk space to extract into {path}: {reason}")]
    DiskFull { path: PathBuf, reason: String },

    #[error("Archive {path} has no top-level folder")]
    EmptyArchive { path: PathBuf },

    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Manifest not found: {path}")]
    ManifestMissing { path: PathBuf },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PDF error in {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    #[error("Chart not found: {what}")]
    ChartNotFound { what: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Background task failed: {reason}")]
    TaskFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, EaipError>;

impl EaipError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a chart lookup error
    pub fn chart_not_found(what: impl Into<String>) -> Self {
        Self::ChartNotFound { what: what.into() }
    }

    /// Classify the error into the import failure taxonomy
    pub fn class(&self) -> ErrorClass {
        match self {
            EaipError::NotFound { .. }
            | EaipError::CorruptArchive { .. }
            | EaipError::InvalidPassword { .. }
            | EaipError::EmptyArchive { .. }
            | EaipError::InvalidManifest { .. }
            | EaipError::Json(_) => ErrorClass::Input,
            EaipError::DiskFull { .. }
            | EaipError::Move { .. }
            | EaipError::Io(_)
            | EaipError::DirectoryTraversal(_)
            | EaipError::TaskFailed { .. }
            | EaipError::Configuration { .. } => ErrorClass::Resource,
            EaipError::ManifestMissing { .. } | EaipError::ChartNotFound { .. } => {
                ErrorClass::StructuralWarning
            }
            EaipError::Pdf { .. } => ErrorClass::PerUnit,
        }
    }

    /// True when the error means the disk ran out of space
    pub fn is_disk_full(&self) -> bool {
        match self {
            EaipError::DiskFull { .. } => true,
            EaipError::Io(e) => is_storage_full(e),
            EaipError::Move { source, .. } => is_storage_full(source),
            _ => false,
        }
    }

    /// User-facing message for the terminal import event.
    ///
    /// Distinguishes "file not found", "disk full", "corrupt archive" and a
    /// generic failure, always suggesting a full retry rather than a resume.
    pub fn user_message(&self) -> String {
        if self.is_disk_full() {
            return format!(
                "Disk full: not enough free space to import the archive. \
                 Free some space and run the whole import again. ({})",
                self
            );
        }

        match self {
            EaipError::NotFound { path } => {
                format!("File not found: {}", path.display())
            }
            EaipError::Io(e) if e.kind() == io::ErrorKind::NotFound => {
                format!("File not found: {}", e)
            }
            EaipError::CorruptArchive { reason, .. } => {
                format!("Corrupt archive: {}. Please check the file and retry.", reason)
            }
            EaipError::EmptyArchive { .. } => {
                "Corrupt archive: the archive does not contain an EAIP folder.".to_string()
            }
            EaipError::InvalidPassword { .. } => {
                "Corrupt archive: the archive is encrypted and the password is missing or wrong."
                    .to_string()
            }
            EaipError::InvalidManifest { path, reason } => format!(
                "Corrupt archive: chart manifest {} is invalid ({}).",
                path.display(),
                reason
            ),
            EaipError::Io(e) if e.kind() == io::ErrorKind::PermissionDenied => format!(
                "Import failed: permission denied ({}). Fix the permissions and run the whole import again.",
                e
            ),
            other => format!(
                "Import failed: {}. Please run the whole import again.",
                other
            ),
        }
    }
}

/// Check whether an I/O error reports exhausted storage
pub fn is_storage_full(error: &io::Error) -> bool {
    // 28 is ENOSPC on Linux and macOS
    error.kind() == io::ErrorKind::StorageFull || error.raw_os_error() == Some(28)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = EaipError::NotFound {
            path: PathBuf::from("/tmp/missing.zip"),
        };
        assert_eq!(err.class(), ErrorClass::Input);

        let err = EaipError::DiskFull {
            path: PathBuf::from("/tmp/out"),
            reason: "no space".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Resource);

        let err = EaipError::ManifestMissing {
            path: PathBuf::from("AD.JSON"),
        };
        assert_eq!(err.class(), ErrorClass::StructuralWarning);
    }

    #[test]
    fn test_user_messages_are_classified() {
        let not_found = EaipError::NotFound {
            path: PathBuf::from("/tmp/missing.zip"),
        };
        assert!(not_found.user_message().starts_with("File not found"));

        let corrupt = EaipError::CorruptArchive {
            path: PathBuf::from("a.zip"),
            reason: "invalid central directory".to_string(),
        };
        assert!(corrupt.user_message().starts_with("Corrupt archive"));

        let full = EaipError::Io(io::Error::from(io::ErrorKind::StorageFull));
        assert!(full.user_message().starts_with("Disk full"));

        let generic = EaipError::TaskFailed {
            reason: "panicked".to_string(),
        };
        let message = generic.user_message();
        assert!(message.starts_with("Import failed"));
        assert!(message.contains("whole import"));
    }
}
