//! Dump artifacts and their format classification.
//!
//! The format of an artifact is derived from its filename alone:
//!
//! ```text
//! *.sql      → SqlText       (restored with psql as a plain script)
//! anything   → CustomBinary  (restored with pg_restore --clean)
//! ```
//!
//! No content sniffing is performed. A mislabeled file is dispatched to the
//! wrong tool and the tool reports the failure.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix that marks a plain-text SQL script.
pub const SQL_SUFFIX: &str = ".sql";

/// Serialization format of a dump artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    /// Plain SQL script.
    SqlText,
    /// `pg_dump` custom archive (`-F c`).
    CustomBinary,
}

impl ArtifactFormat {
    /// Classify a filename by its suffix.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        if filename.ends_with(SQL_SUFFIX) {
            Self::SqlText
        } else {
            Self::CustomBinary
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SqlText => "sql_text",
            Self::CustomBinary => "custom_binary",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dump file on durable storage.
///
/// Artifacts are never recorded in the database; the file is the only record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub format: ArtifactFormat,
}

impl Artifact {
    /// Describe a file that already exists at `path`.
    ///
    /// The format is always derived from `filename`.
    #[must_use]
    pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let filename = filename.into();
        let format = ArtifactFormat::from_filename(&filename);
        Self {
            filename,
            path: path.into(),
            size_bytes,
            created_at: Utc::now(),
            format,
        }
    }

    /// Size in mebibytes, used for human-readable captions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("backup.sql", ArtifactFormat::SqlText)]
    #[case("restore_20250101_120000_backup.sql", ArtifactFormat::SqlText)]
    #[case("backup.dump", ArtifactFormat::CustomBinary)]
    #[case("backup.sql.gz", ArtifactFormat::CustomBinary)]
    #[case("backup.SQL", ArtifactFormat::CustomBinary)]
    #[case("backup", ArtifactFormat::CustomBinary)]
    fn format_follows_suffix(#[case] filename: &str, #[case] expected: ArtifactFormat) {
        assert_eq!(ArtifactFormat::from_filename(filename), expected);
    }

    #[test]
    fn artifact_derives_format_from_filename() {
        let artifact = Artifact::new("dump_20250101_120000.dump", "/tmp/x", 10);
        assert_eq!(artifact.format, ArtifactFormat::CustomBinary);

        let artifact = Artifact::new("seed.sql", "/tmp/seed.sql", 10);
        assert_eq!(artifact.format, ArtifactFormat::SqlText);
    }

    #[test]
    fn size_mb_converts_bytes() {
        let artifact = Artifact::new("a.dump", "/tmp/a.dump", 3 * 1024 * 1024 / 2);
        assert!((artifact.size_mb() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn format_serializes_snake_case() {
        let json = serde_json::to_string(&ArtifactFormat::CustomBinary).unwrap();
        assert_eq!(json, "\"custom_binary\"");
    }
}
