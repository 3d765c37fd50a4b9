//! Leaderboard persisted as a pretty-printed JSON document.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    next_sequence, top_entries, trim_to_retention, validate, Leaderboard, LeaderboardError,
    ScoreEntry, ScoreSubmission, DEFAULT_RETENTION,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    entries: Vec<ScoreEntry>,
}

/// Leaderboard stored in a JSON file.
///
/// The file is read on every listing and replaced on every submission, so
/// several processes sharing a file see each other's scores. A missing file is
/// an empty leaderboard. Replacement goes through a temporary file in the same
/// directory that is renamed over the target, so readers never observe a
/// partially written document.
#[derive(Clone, Debug)]
pub struct JsonFileLeaderboard {
    path: PathBuf,
    retention: usize,
}

impl JsonFileLeaderboard {
    /// Creates a leaderboard backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Keeps at most `retention` entries per configuration key.
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    /// File the leaderboard reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, LeaderboardError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(Document::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&json).map_err(|source| LeaderboardError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&self, document: &Document) -> Result<(), LeaderboardError> {
        let json = serde_json::to_string_pretty(document).map_err(|source| {
            LeaderboardError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;

        let mut staged = NamedTempFile::new_in(parent).map_err(|source| self.io_error(source))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|source| self.io_error(source))?;
        staged
            .persist(&self.path)
            .map(drop)
            .map_err(|error| self.io_error(error.error))
    }

    fn io_error(&self, source: io::Error) -> LeaderboardError {
        LeaderboardError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Leaderboard for JsonFileLeaderboard {
    fn list_top_scores(
        &self,
        config_key: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        let document = self.load()?;
        Ok(top_entries(&document.entries, config_key, limit))
    }

    fn submit_score(&mut self, submission: ScoreSubmission) -> Result<(), LeaderboardError> {
        validate(&submission)?;
        let mut document = self.load()?;
        let sequence = next_sequence(&document.entries);
        let config_key = submission.config_key.clone();
        document
            .entries
            .push(ScoreEntry::from_submission(submission, sequence));
        trim_to_retention(&mut document.entries, &config_key, self.retention);
        self.store(&document)?;
        tracing::debug!(path = %self.path.display(), sequence, "score stored");
        Ok(())
    }
}
