use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepoplotError>;

/// Record kind active when an ingestion error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Summary,
    Loc,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Summary => write!(f, "summary"),
            RecordKind::Loc => write!(f, "loc"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RepoplotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Log parse error at line {line} ({kind} record): {message}")]
    Ingest {
        line: usize,
        kind: RecordKind,
        message: String,
    },
    #[error("Script error at line {line}: {message}")]
    Script { line: usize, message: String },
    #[error("Render error: {0}")]
    Render(String),
}

impl RepoplotError {
    pub fn ingest(line: usize, kind: RecordKind, message: impl Into<String>) -> Self {
        RepoplotError::Ingest {
            line,
            kind,
            message: message.into(),
        }
    }

    pub fn script(line: usize, message: impl Into<String>) -> Self {
        RepoplotError::Script {
            line,
            message: message.into(),
        }
    }
}
