use crate::model::{FileId, LogData};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One named numeric array, positionally aligned to the cluster's category
/// axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub key: String,
    pub label: String,
    pub values: Vec<f64>,
}

/// Filter and window state a cluster is crunched against. The evaluation
/// instant is passed in rather than sampled, so selection is reproducible.
#[derive(Debug, Clone)]
pub struct CrunchOptions<'a> {
    pub exclude: &'a [String],
    pub include: &'a [String],
    pub days_past: f64,
    pub skip_commits: usize,
    pub now: DateTime<Utc>,
}

/// An aggregation strategy producing named metric series over a shared
/// category axis.
pub trait Cluster {
    fn crunch(&mut self, data: &LogData, opts: &CrunchOptions);
    fn labels(&self) -> &[String];
    fn series(&self, key: &str) -> Option<&Series>;
}

pub type ClusterCtor = fn() -> Box<dyn Cluster>;

/// Name-to-constructor map for the `bars <cluster>` draw body. Resolution is
/// by exact key.
pub fn cluster_registry() -> HashMap<&'static str, ClusterCtor> {
    let mut map: HashMap<&'static str, ClusterCtor> = HashMap::new();
    map.insert("author", by_author);
    map
}

fn by_author() -> Box<dyn Cluster> {
    Box::new(ByAuthor::new())
}

/// Per-author aggregation: one category per known author, five metric
/// series over that author's qualifying commits.
#[derive(Debug, Default)]
pub struct ByAuthor {
    labels: Vec<String>,
    stats: HashMap<String, Series>,
}

impl ByAuthor {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_series(&mut self, key: &str, label: &str, values: Vec<f64>) {
        self.stats.insert(
            key.to_string(),
            Series {
                key: key.to_string(),
                label: label.to_string(),
                values,
            },
        );
    }
}

impl Cluster for ByAuthor {
    fn crunch(&mut self, data: &LogData, opts: &CrunchOptions) {
        let valid_files = valid_file_set(data, opts);

        let authors = data.authors_by_name();
        self.labels = authors
            .iter()
            .map(|&id| display_name(&data.author(id).name))
            .collect();

        let window = Duration::milliseconds((opts.days_past * 86_400_000.0) as i64);

        let count = authors.len();
        let mut files_changed = vec![0.0; count];
        let mut commit_counts = vec![0.0; count];
        let mut lines_changed = vec![0.0; count];
        let mut lines_added = vec![0.0; count];
        let mut lines_deleted = vec![0.0; count];

        for (index, &author_id) in authors.iter().enumerate() {
            let mut commits: Vec<_> = data
                .commits()
                .map(|(_, commit)| commit)
                .filter(|c| c.author == Some(author_id))
                .filter(|c| !c.changes.is_empty())
                .filter(|c| c.changes.iter().any(|ch| valid_files.contains(&ch.file)))
                .filter(|c| matches!(c.timestamp, Some(ts) if ts + window > opts.now))
                .collect();
            commits.sort_by_key(|c| c.timestamp);

            // The oldest qualifying commits are dropped to discount bulk
            // imports.
            let commits: Vec<_> = commits.into_iter().skip(opts.skip_commits).collect();

            let changes: Vec<_> = commits
                .iter()
                .flat_map(|c| c.changes.iter())
                .filter(|ch| !data.file(ch.file).is_move())
                .filter(|ch| valid_files.contains(&ch.file))
                .collect();

            let distinct_files: HashSet<FileId> = changes.iter().map(|ch| ch.file).collect();

            files_changed[index] = distinct_files.len() as f64;
            commit_counts[index] = commits.len() as f64;
            lines_changed[index] = changes
                .iter()
                .map(|ch| (ch.adds + ch.deletes) as f64)
                .sum();
            lines_added[index] = changes.iter().map(|ch| ch.adds as f64).sum();
            lines_deleted[index] = changes.iter().map(|ch| ch.deletes as f64).sum();
        }

        self.add_series("files-changed", "Files changed", files_changed);
        self.add_series("commits", "Commits", commit_counts);
        self.add_series("lines-changed", "Lines changed", lines_changed);
        self.add_series("lines-added", "Lines added", lines_added);
        self.add_series("lines-deleted", "Lines removed", lines_deleted);
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn series(&self, key: &str) -> Option<&Series> {
        self.stats.get(key)
    }
}

/// Non-rename files passing the exclude filter, extended (never narrowed) by
/// the include filter: when the include list is non-empty, any non-rename
/// file whose path contains all include substrings is added back.
fn valid_file_set(data: &LogData, opts: &CrunchOptions) -> HashSet<FileId> {
    let mut valid: HashSet<FileId> = data
        .files()
        .filter(|(_, f)| !f.is_move())
        .filter(|(_, f)| opts.exclude.iter().all(|pat| !f.path.contains(pat.as_str())))
        .map(|(id, _)| id)
        .collect();

    if !opts.include.is_empty() {
        for (id, f) in data.files() {
            if !f.is_move() && opts.include.iter().all(|pat| f.path.contains(pat.as_str())) {
                valid.insert(id);
            }
        }
    }

    valid
}

/// Category tick label for an author: the identity up to the first `@`.
fn display_name(name: &str) -> String {
    name.split('@').next().unwrap_or(name).to_string()
}
