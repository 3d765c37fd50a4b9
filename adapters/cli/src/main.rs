#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless simulator for False Friends.
//!
//! Plays a run with a scripted player, prints the round-by-round log and a
//! summary, and optionally offers the result to a JSON leaderboard.

mod autopilot;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use false_friends_core::{DeathCause, Event, GameConfig, Phase};
use false_friends_leaderboard::{
    submit_if_qualified, JsonFileLeaderboard, Leaderboard, LeaderboardStatus, ScoreSubmission,
};
use false_friends_session::Session;
use false_friends_world::query;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::autopilot::Autopilot;

#[derive(Parser, Debug)]
#[command(
    name = "false-friends",
    version,
    about = "Simulate a False Friends run with a scripted player"
)]
struct Args {
    /// Base seed runs derive their rounds from
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// TOML file overriding the default game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name recorded on the leaderboard
    #[arg(long, default_value = "autopilot")]
    player: String,

    /// Milliseconds the player needs before judging a token
    #[arg(long, default_value_t = 350)]
    reaction_ms: u64,

    /// Probability of clicking a false friend once it has been judged
    #[arg(long, default_value_t = 0.02)]
    mistake_rate: f64,

    /// Stop after this many cleared rounds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    max_rounds: u32,

    /// Simulation step in milliseconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    step_ms: u64,

    /// JSON leaderboard file to submit the result to
    #[arg(long)]
    leaderboard: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Result of a simulated run.
#[derive(Debug, Serialize)]
struct Summary {
    player: String,
    config_key: String,
    score: u64,
    rounds_cleared: u32,
    outcome: String,
    friends_clicked: u32,
    friends_missed: u32,
    false_friends_dodged: u32,
    best_reaction_ms: Option<u64>,
    leaderboard: Option<String>,
}

/// Entry point for the False Friends command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut session = Session::with_seed(load_config(args.config.as_deref())?, args.seed)
        .context("invalid game configuration")?;
    let config = query::config(session.world());
    let visible = config.visible();
    let config_key = config.key.clone();
    let limit = config.leaderboard_limit;
    if !args.json {
        println!("{}", query::welcome_banner(session.world()));
    }

    let mut autopilot = Autopilot::new(
        Duration::from_millis(args.reaction_ms),
        args.mistake_rate,
        visible,
        args.seed,
    );
    let outcome = play(
        &mut session,
        &mut autopilot,
        &args,
        Duration::from_millis(args.step_ms),
    );

    let stats = query::stats(session.world());
    let mut summary = Summary {
        player: args.player.clone(),
        config_key,
        score: query::score(session.world()),
        rounds_cleared: query::rounds_cleared(session.world()),
        outcome,
        friends_clicked: stats.friends_clicked,
        friends_missed: stats.friends_missed,
        false_friends_dodged: stats.false_friends_dodged,
        best_reaction_ms: stats
            .best_reaction
            .map(|reaction| u64::try_from(reaction.as_millis()).unwrap_or(u64::MAX)),
        leaderboard: None,
    };

    let mut board = args.leaderboard.as_deref().map(JsonFileLeaderboard::new);
    if let Some(board) = board.as_mut() {
        let status = submit_if_qualified(
            board,
            ScoreSubmission {
                player: summary.player.clone(),
                score: summary.score,
                rounds_cleared: summary.rounds_cleared,
                config_key: summary.config_key.clone(),
            },
            limit,
        );
        summary.leaderboard = Some(describe_status(&status));
    }

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
        return Ok(());
    }

    print_summary(&summary);
    if let Some(board) = board.as_ref() {
        print_top_scores(board, &summary.config_key, limit);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn play(session: &mut Session, autopilot: &mut Autopilot, args: &Args, step: Duration) -> String {
    let verbose = !args.json;
    report(&session.start_run(), verbose);

    loop {
        let frame = session.frame();
        match frame.phase {
            Phase::Dead => {
                return match query::death_cause(session.world()) {
                    Some(cause) => describe_cause(&cause),
                    None => "ended".to_owned(),
                };
            }
            Phase::Idle => return "abandoned".to_owned(),
            Phase::Countdown | Phase::RuleCard | Phase::Playing => {}
        }
        if frame.rounds_cleared >= args.max_rounds {
            return format!("stopped after {} rounds", frame.rounds_cleared);
        }

        if let Some(token) = autopilot.choose(&frame) {
            report(&session.click(token), verbose);
        }
        report(&session.advance(step), verbose);
    }
}

fn report(events: &[Event], verbose: bool) {
    for event in events {
        tracing::trace!(?event, "event");
        if !verbose {
            continue;
        }
        match event {
            Event::RuleCardShown { round, .. } => {
                println!("round {}", round.get());
            }
            Event::RoundCleared {
                round, hits, bonus, ..
            } => {
                println!(
                    "  cleared round {} with {hits} hits (+{bonus})",
                    round.get()
                );
            }
            Event::FriendClicked {
                reaction, points, ..
            } => {
                println!("  friend after {} ms (+{points})", reaction.as_millis());
            }
            Event::RunEnded { cause, score, .. } => {
                println!("  run over: {} (score {score})", describe_cause(cause));
            }
            _ => {}
        }
    }
}

fn describe_cause(cause: &DeathCause) -> String {
    match cause {
        DeathCause::WrongClick { token } => format!("clicked false friend #{}", token.get()),
        DeathCause::QuotaMissed { hits, required } => {
            format!("caught {hits} of {required} required friends")
        }
    }
}

fn describe_status(status: &LeaderboardStatus) -> String {
    match status {
        LeaderboardStatus::Submitted { rank } => format!("ranked #{rank}"),
        LeaderboardStatus::NotQualified => "did not qualify".to_owned(),
        LeaderboardStatus::Unavailable { reason } => format!("unavailable: {reason}"),
    }
}

fn print_summary(summary: &Summary) {
    println!();
    println!("player          {}", summary.player);
    println!("score           {}", summary.score);
    println!("rounds cleared  {}", summary.rounds_cleared);
    println!("outcome         {}", summary.outcome);
    println!(
        "friends         {} clicked, {} missed",
        summary.friends_clicked, summary.friends_missed
    );
    println!("dodged          {}", summary.false_friends_dodged);
    if let Some(best) = summary.best_reaction_ms {
        println!("best reaction   {best} ms");
    }
    if let Some(status) = &summary.leaderboard {
        println!("leaderboard     {status}");
    }
}

fn print_top_scores(board: &JsonFileLeaderboard, config_key: &str, limit: usize) {
    match board.list_top_scores(config_key, limit) {
        Ok(entries) => {
            println!();
            println!("top scores ({config_key}, {})", board.path().display());
            for (rank, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}. {:<16} {:>8}  {} rounds  {}",
                    rank + 1,
                    entry.player,
                    entry.score,
                    entry.rounds_cleared,
                    entry.submitted_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Err(error) => tracing::warn!(%error, "could not list top scores"),
    }
}
