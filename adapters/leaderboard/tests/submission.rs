use std::fs;

use false_friends_leaderboard::{
    submit_if_qualified, InMemoryLeaderboard, JsonFileLeaderboard, Leaderboard,
    LeaderboardError, LeaderboardStatus, ScoreEntry, ScoreSubmission,
};

fn submission(player: &str, score: u64) -> ScoreSubmission {
    ScoreSubmission {
        player: player.to_owned(),
        score,
        rounds_cleared: 2,
        config_key: "classic".to_owned(),
    }
}

struct OfflineLeaderboard;

impl Leaderboard for OfflineLeaderboard {
    fn list_top_scores(
        &self,
        _config_key: &str,
        _limit: usize,
    ) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        Err(LeaderboardError::Io {
            path: "remote".into(),
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "no route"),
        })
    }

    fn submit_score(&mut self, _submission: ScoreSubmission) -> Result<(), LeaderboardError> {
        unreachable!("listing fails first")
    }
}

#[test]
fn a_full_board_only_admits_better_scores() {
    let mut board = InMemoryLeaderboard::new();
    for score in [50, 40, 30] {
        assert!(matches!(
            submit_if_qualified(&mut board, submission("ada", score), 3),
            LeaderboardStatus::Submitted { .. }
        ));
    }

    assert_eq!(
        submit_if_qualified(&mut board, submission("bo", 30), 3),
        LeaderboardStatus::NotQualified
    );
    assert_eq!(
        submit_if_qualified(&mut board, submission("bo", 45), 3),
        LeaderboardStatus::Submitted { rank: 2 }
    );
    assert_eq!(
        submit_if_qualified(&mut board, submission("cy", 50), 3),
        LeaderboardStatus::Submitted { rank: 2 }
    );

    let top: Vec<_> = board
        .list_top_scores("classic", 3)
        .expect("listed")
        .into_iter()
        .map(|entry| (entry.player, entry.score))
        .collect();
    assert_eq!(
        top,
        vec![
            ("ada".to_owned(), 50),
            ("cy".to_owned(), 50),
            ("bo".to_owned(), 45)
        ]
    );
}

#[test]
fn unreachable_backend_reports_unavailable() {
    let status = submit_if_qualified(&mut OfflineLeaderboard, submission("ada", 10), 10);
    match status {
        LeaderboardStatus::Unavailable { reason } => assert!(reason.contains("remote")),
        other => panic!("unexpected status {other:?}"),
    }
}

#[test]
fn file_board_persists_between_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scores").join("board.json");

    let mut board = JsonFileLeaderboard::new(&path);
    assert!(board.list_top_scores("classic", 10).expect("listed").is_empty());
    board.submit_score(submission("ada", 700)).expect("stored");
    board.submit_score(submission("bo", 900)).expect("stored");

    let reopened = JsonFileLeaderboard::new(&path);
    let top = reopened.list_top_scores("classic", 10).expect("listed");
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].player, "bo");
    assert_eq!(top[1].sequence, 0);
}

#[test]
fn corrupt_file_is_reported_not_overwritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.json");
    fs::write(&path, "{ not json").expect("write");

    let mut board = JsonFileLeaderboard::new(&path);
    let status = submit_if_qualified(&mut board, submission("ada", 10), 10);
    assert!(matches!(status, LeaderboardStatus::Unavailable { .. }));
    assert_eq!(fs::read_to_string(&path).expect("read"), "{ not json");
}

#[test]
fn file_board_trims_each_key_on_submission() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.json");

    let mut board = JsonFileLeaderboard::new(&path).with_retention(2);
    for (player, score) in [("ada", 300), ("bo", 100), ("cy", 200)] {
        board.submit_score(submission(player, score)).expect("stored");
    }

    let stored = fs::read_to_string(&path).expect("read");
    assert!(!stored.contains("\"bo\""));
    let top = JsonFileLeaderboard::new(&path)
        .list_top_scores("classic", 10)
        .expect("listed");
    let players: Vec<_> = top.into_iter().map(|entry| entry.player).collect();
    assert_eq!(players, vec!["ada", "cy"]);
}
