use crate::error::{RecordKind, RepoplotError, Result};
use crate::model::LogData;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse a raw log dump into an entity graph.
///
/// The dump interleaves two record kinds: a line starting with a NUL byte is
/// a commit summary (`[unused, email, date, hash, summary]`, NUL-separated),
/// anything else is a per-file line-count record (`[adds, deletes, path]`,
/// tab-separated) belonging to the most recent summary. Blank lines are
/// ignored. Classification happens per line, not via a maintained parser
/// state.
///
/// `aliases` maps raw author identities to canonical ones and is applied
/// before author registration. Any malformed record aborts the whole parse;
/// the only tolerated defect is a non-numeric adds/deletes field (binary
/// diff markers), which counts as 0.
pub fn parse_log<R: BufRead>(reader: R, aliases: &HashMap<String, String>) -> Result<LogData> {
    let mut data = LogData::new();
    let mut current_commit = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_nr = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let kind = if line.starts_with('\0') {
            RecordKind::Summary
        } else {
            RecordKind::Loc
        };

        match kind {
            RecordKind::Summary => {
                let fields: Vec<&str> = line.split('\0').collect();
                if fields.len() < 5 {
                    return Err(RepoplotError::ingest(
                        line_nr,
                        kind,
                        format!("expected 5 NUL-separated fields, found {}", fields.len()),
                    ));
                }

                let mut mail = fields[1].trim();
                let date = parse_timestamp(fields[2].trim()).ok_or_else(|| {
                    RepoplotError::ingest(
                        line_nr,
                        kind,
                        format!("unparsable timestamp '{}'", fields[2].trim()),
                    )
                })?;
                let hash = fields[3].trim();
                let summary = fields[4].trim();

                if let Some(canonical) = aliases.get(mail) {
                    mail = canonical.as_str();
                }

                let commit_id = data.get_or_create_commit(hash);
                let author_id = data.get_or_create_author(mail);

                let commit = data.commit_mut(commit_id);
                commit.author = Some(author_id);
                commit.summary = summary.to_string();
                commit.timestamp = Some(date);

                current_commit = Some(commit_id);
            }
            RecordKind::Loc => {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() < 3 {
                    return Err(RepoplotError::ingest(
                        line_nr,
                        kind,
                        format!("expected 3 tab-separated fields, found {}", fields.len()),
                    ));
                }

                // "-" marks a binary diff; count it as zero lines.
                let adds: u32 = fields[0].trim().parse().unwrap_or(0);
                let deletes: u32 = fields[1].trim().parse().unwrap_or(0);

                let commit_id = current_commit.ok_or_else(|| {
                    RepoplotError::ingest(line_nr, kind, "loc record before any summary record")
                })?;

                let file_id = data.get_or_create_file(fields[2]);
                data.commit_mut(commit_id).add_change(file_id, adds, deletes);
            }
        }
    }

    Ok(data)
}

/// Open and parse the log dump at `path`, reporting progress on stderr.
pub fn load_log(path: &Path, aliases: &HashMap<String, String>) -> Result<LogData> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Parsing {}...", path.display()));

    let data = parse_log(reader, aliases)?;

    pb.finish_with_message(format!(
        "Parsed {} commits, {} files, {} authors",
        data.commit_count(),
        data.file_count(),
        data.author_count()
    ));
    Ok(data)
}

fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }

    // `git log --date=iso`
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }

    // git's default date format
    for fmt in ["%a %b %e %H:%M:%S %Y %z", "%a %b %d %H:%M:%S %Y %z"] {
        if let Ok(dt) = DateTime::parse_from_str(input, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}
