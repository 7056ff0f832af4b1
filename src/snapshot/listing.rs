//! Remote listing parser.
//!
//! Turns captured output of a long-format directory listing into per-entry
//! metadata. The parser never executes commands; it is handed stdout lines
//! that were already collected over the session, which keeps it testable
//! against literal captured listings.
//!
//! Two dialects are supported. The full dialect carries the modification
//! time as a raw epoch-seconds column (`ls -l --time-style=+%s`). The
//! restricted dialect is plain `ls -l` as found on minimal NAS shells,
//! where the date is a month name, a day, and a time or year, in any of
//! three shapes: `Jan 5 10:22 2021`, `Jan 5 10:22`, `Jan 5 2021`.

use crate::error::SyncError;
use crate::snapshot::builder::{EntryKind, EntryMeta};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Listing dialect, selected on the build request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Machine-readable epoch timestamps; needs GNU-style `ls`.
    #[default]
    Full,
    /// Locale month-name dates; works on busybox and other minimal shells.
    Restricted,
}

/// Columns preceding the name field in the full dialect:
/// permissions, links, owner, group, size, epoch.
const FULL_FIXED_COLUMNS: usize = 6;

/// Columns preceding the date fields in the restricted dialect:
/// permissions, links, owner, group, size.
const RESTRICTED_FIXED_COLUMNS: usize = 5;

/// The one-shot command to list `path` under the given dialect.
pub fn listing_command(dialect: Dialect, path: &Path) -> String {
    let quoted = shell_quote(&path.to_string_lossy());
    match dialect {
        Dialect::Full => format!("ls -l --time-style=+%s {quoted}"),
        Dialect::Restricted => format!("ls -l {quoted}"),
    }
}

/// Parse the captured stdout of a listing command run against `dir`.
///
/// Header (`total ...`), blank lines, and `.`/`..` entries are skipped.
/// Any line that does not tokenize into the expected columns fails the
/// whole parse with [`SyncError::RemoteParse`] carrying the raw line.
pub fn parse_listing(
    dialect: Dialect,
    lines: &[String],
    dir: &Path,
) -> Result<Vec<EntryMeta>, SyncError> {
    let mut entries = Vec::new();
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() || is_header(line) {
            continue;
        }
        let entry = match dialect {
            Dialect::Full => parse_full_line(line, dir)?,
            Dialect::Restricted => parse_restricted_line(line, dir)?,
        };
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn is_header(line: &str) -> bool {
    line == "total" || line.starts_with("total ")
}

fn parse_full_line(line: &str, dir: &Path) -> Result<EntryMeta, SyncError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() <= FULL_FIXED_COLUMNS {
        return Err(malformed(line, dir));
    }
    let modified_at: i64 = tokens[FULL_FIXED_COLUMNS - 1]
        .parse()
        .map_err(|_| malformed(line, dir))?;
    let name = join_name(&tokens, FULL_FIXED_COLUMNS, tokens[0]);
    Ok(EntryMeta {
        kind: kind_from_permissions(tokens[0]),
        name,
        modified_at,
        content_hash: None,
    })
}

fn parse_restricted_line(line: &str, dir: &Path) -> Result<EntryMeta, SyncError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    // Minimum shape: five fixed columns, month, day, time-or-year, name.
    if tokens.len() < RESTRICTED_FIXED_COLUMNS + 4 {
        return Err(malformed(line, dir));
    }
    let month = tokens[RESTRICTED_FIXED_COLUMNS];
    let day = tokens[RESTRICTED_FIXED_COLUMNS + 1];
    let third = tokens[RESTRICTED_FIXED_COLUMNS + 2];

    let (modified_at, name_start) = if third.contains(':') {
        let next = tokens.get(RESTRICTED_FIXED_COLUMNS + 3).copied();
        match next.filter(|t| is_year(t)) {
            // Extended NAS style: month day time year.
            Some(year) if tokens.len() > RESTRICTED_FIXED_COLUMNS + 4 => (
                restricted_timestamp(month, day, year, Some(third))
                    .ok_or_else(|| malformed(line, dir))?,
                RESTRICTED_FIXED_COLUMNS + 4,
            ),
            // Recent entry: month day time, year inferred as current.
            _ => {
                let year = Utc::now().year().to_string();
                (
                    restricted_timestamp(month, day, &year, Some(third))
                        .ok_or_else(|| malformed(line, dir))?,
                    RESTRICTED_FIXED_COLUMNS + 3,
                )
            }
        }
    } else if is_year(third) {
        // Old entry: month day year, midnight.
        (
            restricted_timestamp(month, day, third, None).ok_or_else(|| malformed(line, dir))?,
            RESTRICTED_FIXED_COLUMNS + 3,
        )
    } else {
        return Err(malformed(line, dir));
    };

    if tokens.len() <= name_start {
        return Err(malformed(line, dir));
    }
    let name = join_name(&tokens, name_start, tokens[0]);
    Ok(EntryMeta {
        kind: kind_from_permissions(tokens[0]),
        name,
        modified_at,
        content_hash: None,
    })
}

/// Combine month name, day, year, and optional time into epoch seconds.
fn restricted_timestamp(month: &str, day: &str, year: &str, time: Option<&str>) -> Option<i64> {
    let datetime = match time {
        Some(time) => {
            let stamp = format!("{month} {day} {year} {time}");
            NaiveDateTime::parse_from_str(&stamp, "%b %e %Y %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(&stamp, "%b %e %Y %H:%M"))
                .ok()?
        }
        None => {
            let stamp = format!("{month} {day} {year}");
            NaiveDate::parse_from_str(&stamp, "%b %e %Y")
                .ok()?
                .and_hms_opt(0, 0, 0)?
        }
    };
    Some(datetime.and_utc().timestamp())
}

fn is_year(token: &str) -> bool {
    token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit())
}

fn kind_from_permissions(permissions: &str) -> EntryKind {
    if permissions.starts_with('d') {
        EntryKind::Directory
    } else {
        // Symlinks and specials transfer as plain files.
        EntryKind::File
    }
}

/// Rejoin a multi-word name from the trailing columns. Symlink lines carry
/// a `-> target` suffix, which is not part of the name.
fn join_name(tokens: &[&str], start: usize, permissions: &str) -> String {
    let name_tokens = &tokens[start..];
    let end = if permissions.starts_with('l') {
        name_tokens
            .iter()
            .position(|t| *t == "->")
            .unwrap_or(name_tokens.len())
    } else {
        name_tokens.len()
    };
    name_tokens[..end].join(" ")
}

fn malformed(line: &str, dir: &Path) -> SyncError {
    SyncError::RemoteParse {
        path: dir.to_path_buf(),
        line: line.to_string(),
    }
}

fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}
