use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle into [`LogData`]'s author registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(usize);

/// Opaque handle into [`LogData`]'s file registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(usize);

/// Opaque handle into [`LogData`]'s commit registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
}

impl FileEntry {
    /// A path of the form `"old => new"` records a rename, not a real file.
    pub fn is_move(&self) -> bool {
        self.path.contains(" => ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub file: FileId,
    pub adds: u32,
    pub deletes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: Option<AuthorId>,
    pub timestamp: Option<DateTime<Utc>>,
    pub summary: String,
    pub changes: Vec<Change>,
}

impl Commit {
    fn new(hash: String) -> Self {
        Self {
            hash,
            author: None,
            timestamp: None,
            summary: String::new(),
            changes: Vec::new(),
        }
    }

    pub fn add_change(&mut self, file: FileId, adds: u32, deletes: u32) {
        self.changes.push(Change { file, adds, deletes });
    }
}

/// Entity graph built from one raw log dump.
///
/// Entities are registered once per identity string and addressed by index
/// handles thereafter; repeated `get_or_create_*` calls with the same key
/// return the same handle. Mutation requires `&mut self`, so the graph is
/// read-only for every phase after ingestion.
#[derive(Debug, Default)]
pub struct LogData {
    authors: Vec<Author>,
    files: Vec<FileEntry>,
    commits: Vec<Commit>,
    author_index: HashMap<String, AuthorId>,
    file_index: HashMap<String, FileId>,
    commit_index: HashMap<String, CommitId>,
}

impl LogData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_author(&mut self, name: &str) -> AuthorId {
        if let Some(&id) = self.author_index.get(name) {
            return id;
        }
        let id = AuthorId(self.authors.len());
        self.authors.push(Author { name: name.to_string() });
        self.author_index.insert(name.to_string(), id);
        id
    }

    pub fn get_or_create_file(&mut self, path: &str) -> FileId {
        if let Some(&id) = self.file_index.get(path) {
            return id;
        }
        let id = FileId(self.files.len());
        self.files.push(FileEntry { path: path.to_string() });
        self.file_index.insert(path.to_string(), id);
        id
    }

    pub fn get_or_create_commit(&mut self, hash: &str) -> CommitId {
        if let Some(&id) = self.commit_index.get(hash) {
            return id;
        }
        let id = CommitId(self.commits.len());
        self.commits.push(Commit::new(hash.to_string()));
        self.commit_index.insert(hash.to_string(), id);
        id
    }

    pub fn author(&self, id: AuthorId) -> &Author {
        &self.authors[id.0]
    }

    pub fn file(&self, id: FileId) -> &FileEntry {
        &self.files[id.0]
    }

    pub fn commit(&self, id: CommitId) -> &Commit {
        &self.commits[id.0]
    }

    pub fn commit_mut(&mut self, id: CommitId) -> &mut Commit {
        &mut self.commits[id.0]
    }

    /// All authors, ordered lexicographically ascending by canonical name.
    /// This is the category axis used by the aggregators.
    pub fn authors_by_name(&self) -> Vec<AuthorId> {
        let mut ids: Vec<AuthorId> = (0..self.authors.len()).map(AuthorId).collect();
        ids.sort_by(|a, b| self.authors[a.0].name.cmp(&self.authors[b.0].name));
        ids
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &FileEntry)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    pub fn commits(&self) -> impl Iterator<Item = (CommitId, &Commit)> {
        self.commits.iter().enumerate().map(|(i, c)| (CommitId(i), c))
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }
}
