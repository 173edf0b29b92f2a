//! Filenames for dump artifacts and restore scratch files.

use chrono::{DateTime, TimeZone};

use crate::artifact::SQL_SUFFIX;

/// Timestamp layout shared by dump and scratch filenames (`20250131_235959`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Longest sanitized upload name kept in a scratch filename.
const MAX_UPLOAD_NAME_LEN: usize = 128;

/// Stem used for a `.sql` upload whose own stem sanitizes to nothing.
const FALLBACK_STEM: &str = "upload";

/// Format a timestamp the way artifact filenames expect it.
pub fn timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `dump_<YYYYMMDD_HHMMSS>.dump`, or `dump_<YYYYMMDD_HHMMSS>_<seq>.dump` for
/// `seq > 0` when an earlier dump already took the name.
pub fn dump_filename<Tz>(at: &DateTime<Tz>, seq: u32) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if seq == 0 {
        format!("dump_{}.dump", timestamp(at))
    } else {
        format!("dump_{}_{seq}.dump", timestamp(at))
    }
}

/// `restore_<YYYYMMDD_HHMMSS>_<name>`, with `_<seq>` after the timestamp for
/// `seq > 0`.
///
/// `name` must already have gone through [`sanitize_upload_name`].
pub fn scratch_filename<Tz>(at: &DateTime<Tz>, name: &str, seq: u32) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if seq == 0 {
        format!("restore_{}_{name}", timestamp(at))
    } else {
        format!("restore_{}_{seq}_{name}", timestamp(at))
    }
}

/// Reduce an untrusted upload filename to a safe single path segment.
///
/// Only the last path component is kept (either separator style). Every
/// character outside `[A-Za-z0-9._-]` folds into a single `_` and leading
/// dots are dropped. A `.sql` suffix always survives: the stem is capped
/// from the front, and a stem with nothing usable left becomes `upload`.
#[must_use]
pub fn sanitize_upload_name(original: &str) -> Option<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, suffix) = match base.strip_suffix(SQL_SUFFIX) {
        Some(stem) => (stem, SQL_SUFFIX),
        None => (base, ""),
    };

    let mut out = String::with_capacity(stem.len());
    let mut prev_underscore = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '_' {
            out.push(ch);
            prev_underscore = ch == '_';
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }

    let trimmed = match out.trim_start_matches(['.', '_']) {
        "" if suffix.is_empty() => return None,
        "" => FALLBACK_STEM,
        trimmed => trimmed,
    };

    let start = trimmed
        .len()
        .saturating_sub(MAX_UPLOAD_NAME_LEN - suffix.len());
    Some(format!("{}{suffix}", &trimmed[start..]))
}

/// Check that `name` is a plain file name with no directory components.
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixed() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn dump_filename_uses_timestamp() {
        assert_eq!(dump_filename(&fixed(), 0), "dump_20250307_090501.dump");
        assert_eq!(dump_filename(&fixed(), 2), "dump_20250307_090501_2.dump");
    }

    #[test]
    fn scratch_filename_keeps_original_suffix() {
        assert_eq!(
            scratch_filename(&fixed(), "backup.sql", 0),
            "restore_20250307_090501_backup.sql"
        );
        assert_eq!(
            scratch_filename(&fixed(), "backup.sql", 1),
            "restore_20250307_090501_1_backup.sql"
        );
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(
            sanitize_upload_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_upload_name(r"C:\Users\ops\nightly.dump").as_deref(),
            Some("nightly.dump")
        );
    }

    #[test]
    fn sanitize_folds_unsafe_characters() {
        assert_eq!(
            sanitize_upload_name("my backup (1).sql").as_deref(),
            Some("my_backup_1_.sql")
        );
    }

    #[test]
    fn sanitize_rejects_empty_and_dot_names() {
        assert_eq!(sanitize_upload_name(""), None);
        assert_eq!(sanitize_upload_name(".."), None);
        assert_eq!(sanitize_upload_name("dir/"), None);
        assert_eq!(sanitize_upload_name("###"), None);
    }

    #[test]
    fn sanitize_keeps_sql_suffix_of_unusable_stems() {
        assert_eq!(sanitize_upload_name(".sql").as_deref(), Some("upload.sql"));
        assert_eq!(sanitize_upload_name("бэкап.sql").as_deref(), Some("upload.sql"));
        assert_eq!(sanitize_upload_name("dir/..sql").as_deref(), Some("upload.sql"));
        assert_eq!(sanitize_upload_name("бэкап.dump").as_deref(), Some("dump"));
    }

    #[test]
    fn sanitize_drops_leading_dots() {
        assert_eq!(sanitize_upload_name(".env.sql").as_deref(), Some("env.sql"));
    }

    #[test]
    fn sanitize_caps_length_from_the_front() {
        let long = format!("{}.sql", "a".repeat(300));
        let sanitized = sanitize_upload_name(&long).unwrap();
        assert_eq!(sanitized.len(), MAX_UPLOAD_NAME_LEN);
        assert!(sanitized.ends_with(".sql"));
    }

    #[test]
    fn plain_file_name_checks() {
        assert!(is_plain_file_name("dump_20250307_090501.dump"));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("a\\b"));
    }
}
