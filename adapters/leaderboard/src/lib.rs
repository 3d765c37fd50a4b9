#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! High-score storage for finished runs.
//!
//! Entries are grouped by configuration key so that runs played under
//! different tunings never compete. Every listing is ordered by score, highest
//! first, with ties going to whoever submitted first.

mod file;

use std::{cmp::Reverse, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::JsonFileLeaderboard;

/// Entries kept per configuration key unless a store is told otherwise.
pub const DEFAULT_RETENTION: usize = 100;

/// Score offered for inclusion in a leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreSubmission {
    /// Name the player entered.
    pub player: String,
    /// Final score of the run.
    pub score: u64,
    /// Rounds the run cleared.
    pub rounds_cleared: u32,
    /// Configuration key the run was played under.
    pub config_key: String,
}

/// Stored leaderboard entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Name the player entered.
    pub player: String,
    /// Final score of the run.
    pub score: u64,
    /// Rounds the run cleared.
    pub rounds_cleared: u32,
    /// Configuration key the run was played under.
    pub config_key: String,
    /// Wall-clock time the score was accepted.
    pub submitted_at: DateTime<Utc>,
    /// Submission order within the store; breaks score ties.
    pub sequence: u64,
}

impl ScoreEntry {
    fn from_submission(submission: ScoreSubmission, sequence: u64) -> Self {
        Self {
            player: submission.player,
            score: submission.score,
            rounds_cleared: submission.rounds_cleared,
            config_key: submission.config_key,
            submitted_at: Utc::now(),
            sequence,
        }
    }
}

/// Failures raised by leaderboard backends.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// The backing file could not be read or written.
    #[error("leaderboard storage at {path} is unavailable")]
    Io {
        /// File the backend uses.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The backing file does not contain a valid leaderboard.
    #[error("leaderboard storage at {path} is corrupt")]
    Corrupt {
        /// File the backend uses.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The submission cannot be stored.
    #[error("invalid submission: {0}")]
    InvalidSubmission(&'static str),
}

/// Storage for submitted scores.
pub trait Leaderboard {
    /// Best `limit` entries recorded under `config_key`, best first.
    fn list_top_scores(
        &self,
        config_key: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, LeaderboardError>;

    /// Records a score.
    fn submit_score(&mut self, submission: ScoreSubmission) -> Result<(), LeaderboardError>;
}

/// Outcome of offering a finished run to a leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardStatus {
    /// The score was stored at the provided one-based rank.
    Submitted {
        /// Position the score took in the listing.
        rank: usize,
    },
    /// The score does not beat any of the listed entries.
    NotQualified,
    /// The leaderboard could not be reached; the run result is unaffected.
    Unavailable {
        /// Human-readable description of the failure.
        reason: String,
    },
}

/// Reports whether `score` earns a place among `top` entries.
///
/// A score qualifies while fewer than `limit` entries exist, or when it beats
/// at least one of them.
#[must_use]
pub fn qualifies(top: &[ScoreEntry], score: u64, limit: usize) -> bool {
    top.len() < limit || top.iter().any(|entry| score > entry.score)
}

/// Submits `submission` if it qualifies for the top `limit` of its key.
///
/// Backend failures are logged and reported as
/// [`LeaderboardStatus::Unavailable`] rather than propagated.
pub fn submit_if_qualified<L>(
    leaderboard: &mut L,
    submission: ScoreSubmission,
    limit: usize,
) -> LeaderboardStatus
where
    L: Leaderboard + ?Sized,
{
    let top = match leaderboard.list_top_scores(&submission.config_key, limit) {
        Ok(top) => top,
        Err(error) => return unavailable(&error),
    };
    if !qualifies(&top, submission.score, limit) {
        return LeaderboardStatus::NotQualified;
    }

    let rank = top
        .iter()
        .filter(|entry| entry.score >= submission.score)
        .count()
        + 1;
    match leaderboard.submit_score(submission) {
        Ok(()) => LeaderboardStatus::Submitted { rank },
        Err(error) => unavailable(&error),
    }
}

fn unavailable(error: &LeaderboardError) -> LeaderboardStatus {
    tracing::warn!(%error, "leaderboard unavailable");
    LeaderboardStatus::Unavailable {
        reason: error.to_string(),
    }
}

fn validate(submission: &ScoreSubmission) -> Result<(), LeaderboardError> {
    if submission.player.trim().is_empty() {
        return Err(LeaderboardError::InvalidSubmission("player name is empty"));
    }
    if submission.config_key.is_empty() {
        return Err(LeaderboardError::InvalidSubmission("config key is empty"));
    }
    Ok(())
}

fn top_entries(entries: &[ScoreEntry], config_key: &str, limit: usize) -> Vec<ScoreEntry> {
    let mut matching: Vec<ScoreEntry> = entries
        .iter()
        .filter(|entry| entry.config_key == config_key)
        .cloned()
        .collect();
    matching.sort_by_key(|entry| (Reverse(entry.score), entry.sequence));
    matching.truncate(limit);
    matching
}

fn trim_to_retention(entries: &mut Vec<ScoreEntry>, config_key: &str, retention: usize) {
    let kept: Vec<u64> = top_entries(entries, config_key, retention)
        .iter()
        .map(|entry| entry.sequence)
        .collect();
    let before = entries.len();
    entries.retain(|entry| entry.config_key != config_key || kept.contains(&entry.sequence));
    if entries.len() < before {
        tracing::trace!(config_key, dropped = before - entries.len(), "trimmed leaderboard");
    }
}

fn next_sequence(entries: &[ScoreEntry]) -> u64 {
    entries
        .iter()
        .map(|entry| entry.sequence.saturating_add(1))
        .max()
        .unwrap_or(0)
}

/// Leaderboard held in memory for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct InMemoryLeaderboard {
    entries: Vec<ScoreEntry>,
    retention: usize,
}

impl Default for InMemoryLeaderboard {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            retention: DEFAULT_RETENTION,
        }
    }
}

impl InMemoryLeaderboard {
    /// Creates an empty leaderboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `retention` entries per configuration key.
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    /// Number of stored entries across every key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing was stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Leaderboard for InMemoryLeaderboard {
    fn list_top_scores(
        &self,
        config_key: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        Ok(top_entries(&self.entries, config_key, limit))
    }

    fn submit_score(&mut self, submission: ScoreSubmission) -> Result<(), LeaderboardError> {
        validate(&submission)?;
        let sequence = next_sequence(&self.entries);
        let config_key = submission.config_key.clone();
        self.entries
            .push(ScoreEntry::from_submission(submission, sequence));
        trim_to_retention(&mut self.entries, &config_key, self.retention);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(player: &str, score: u64) -> ScoreSubmission {
        ScoreSubmission {
            player: player.to_owned(),
            score,
            rounds_cleared: 1,
            config_key: "classic".to_owned(),
        }
    }

    #[test]
    fn ties_go_to_the_earliest_submission() {
        let mut board = InMemoryLeaderboard::new();
        for (player, score) in [("ada", 300), ("bo", 500), ("cy", 300), ("di", 900)] {
            board.submit_score(submission(player, score)).expect("stored");
        }
        let names: Vec<_> = board
            .list_top_scores("classic", 10)
            .expect("listed")
            .into_iter()
            .map(|entry| entry.player)
            .collect();
        assert_eq!(names, vec!["di", "bo", "ada", "cy"]);
    }

    #[test]
    fn keys_do_not_mix() {
        let mut board = InMemoryLeaderboard::new();
        board.submit_score(submission("ada", 10)).expect("stored");
        let mut other = submission("bo", 20);
        other.config_key = "hard".to_owned();
        board.submit_score(other).expect("stored");

        assert_eq!(board.list_top_scores("classic", 10).expect("listed").len(), 1);
        assert_eq!(board.list_top_scores("hard", 10).expect("listed")[0].player, "bo");
        assert!(board.list_top_scores("zen", 10).expect("listed").is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut board = InMemoryLeaderboard::new();
        let error = board.submit_score(submission("  ", 10)).unwrap_err();
        assert!(matches!(error, LeaderboardError::InvalidSubmission(_)));
        assert!(board.is_empty());
    }

    #[test]
    fn qualification_needs_room_or_a_beaten_entry() {
        let mut board = InMemoryLeaderboard::new();
        for score in [100, 200, 300] {
            board.submit_score(submission("ada", score)).expect("stored");
        }
        let top = board.list_top_scores("classic", 3).expect("listed");
        assert!(qualifies(&top, 0, 4));
        assert!(!qualifies(&top, 100, 3));
        assert!(qualifies(&top, 101, 3));
    }

    #[test]
    fn each_key_keeps_only_its_best_entries() {
        let mut board = InMemoryLeaderboard::new().with_retention(2);
        for score in [10, 30, 20, 5] {
            board.submit_score(submission("ada", score)).expect("stored");
        }
        let mut other = submission("bo", 1);
        other.config_key = "hard".to_owned();
        board.submit_score(other).expect("stored");

        assert_eq!(board.len(), 3);
        let scores: Vec<_> = board
            .list_top_scores("classic", 10)
            .expect("listed")
            .into_iter()
            .map(|entry| entry.score)
            .collect();
        assert_eq!(scores, vec![30, 20]);
        assert_eq!(board.list_top_scores("hard", 10).expect("listed").len(), 1);
    }
}
