use std::time::Duration;

use false_friends_core::{Command, DeathCause, Event, GameConfig, Phase, RoundNumber, TokenId};
use false_friends_session::Session;
use false_friends_world::query;

const STEP: Duration = Duration::from_millis(10);
const STEP_LIMIT: usize = 100_000;

fn session(seed: u64) -> Session {
    Session::with_seed(GameConfig::default(), seed).expect("default config is valid")
}

fn advance_until(session: &mut Session, mut done: impl FnMut(&Session) -> bool) -> Vec<Event> {
    let mut log = Vec::new();
    for _ in 0..STEP_LIMIT {
        if done(session) {
            return log;
        }
        log.extend(session.advance(STEP));
    }
    panic!("condition not reached within {STEP_LIMIT} steps");
}

fn live_token(session: &Session, friend: bool) -> Option<TokenId> {
    query::token_view(session.world())
        .iter()
        .find(|snapshot| snapshot.is_friend == friend)
        .map(|snapshot| snapshot.id)
}

#[test]
fn one_instant_hit_clears_the_first_round() {
    let mut session = session(1);
    let _ = session.start_run();
    let _ = advance_until(&mut session, |session| {
        session.frame().phase == Phase::Playing
    });

    let mut clicked = false;
    let mut log = Vec::new();
    for _ in 0..STEP_LIMIT {
        if session.frame().phase != Phase::Playing {
            break;
        }
        if !clicked {
            if let Some(token) = live_token(&session, true) {
                log.extend(session.click(token));
                clicked = true;
            }
        }
        log.extend(session.advance(STEP));
    }

    let clicks: Vec<_> = log
        .iter()
        .filter_map(|event| match event {
            Event::FriendClicked {
                reaction, points, ..
            } => Some((*reaction, *points)),
            _ => None,
        })
        .collect();
    assert_eq!(clicks, vec![(Duration::ZERO, 2_000)]);

    let dodged = log
        .iter()
        .filter(|event| matches!(event, Event::TokenExpired { was_friend: false, bonus: 25, .. }))
        .count();
    assert_eq!(dodged, 16);

    let frame = session.frame();
    assert_eq!(frame.phase, Phase::RuleCard);
    assert_eq!(frame.round, RoundNumber::new(2));
    assert_eq!(frame.score, 2_000 + 16 * 25 + 500);
    assert_eq!(frame.rounds_cleared, 1);
}

#[test]
fn wrong_click_ends_the_run_immediately() {
    let mut session = session(2);
    let _ = session.start_run();
    let _ = advance_until(&mut session, |session| live_token(session, false).is_some());

    let decoy = live_token(&session, false).expect("false friend spawned");
    let events = session.click(decoy);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::RunEnded {
            cause: DeathCause::WrongClick { .. },
            ..
        }
    )));
    assert_eq!(session.frame().phase, Phase::Dead);
    assert_eq!(session.until_next_callback(), None);

    let later = session.advance(Duration::from_secs(30));
    assert_eq!(
        later,
        vec![Event::TimeAdvanced {
            dt: Duration::from_secs(30)
        }]
    );
    assert_eq!(session.frame().phase, Phase::Dead);
}

#[test]
fn ignoring_every_token_misses_the_quota() {
    let mut session = session(3);
    let _ = session.start_run();
    let log = advance_until(&mut session, |session| {
        session.frame().phase == Phase::Dead
    });

    assert!(log.iter().any(|event| matches!(
        event,
        Event::RunEnded {
            cause: DeathCause::QuotaMissed {
                hits: 0,
                required: 1
            },
            rounds_cleared: 0,
            ..
        }
    )));
    assert!(query::stats(session.world()).best_reaction.is_none());
}

#[test]
fn restart_mid_round_ignores_stale_callbacks() {
    let mut session = session(4);
    let _ = session.start_run();
    let _ = advance_until(&mut session, |session| session.frame().tokens.len() >= 3);
    let stale = query::generation(session.world());

    let _ = session.start_run();
    let fresh = session.frame();
    assert_eq!(fresh.phase, Phase::Countdown);
    assert_eq!(fresh.score, 0);
    assert!(fresh.tokens.is_empty());

    let events = session.submit(Command::SpawnToken {
        generation: stale,
        slot: 5,
        at: query::clock(session.world()),
    });
    assert!(events.is_empty());
    assert_eq!(session.frame(), fresh);

    let events = session.advance(Duration::from_millis(999));
    assert_eq!(
        events,
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(999)
        }]
    );
    assert_eq!(session.frame().countdown, Some(3));
}

#[test]
fn return_to_idle_silences_the_scheduler() {
    let mut session = session(5);
    let _ = session.start_run();
    let _ = advance_until(&mut session, |session| !session.frame().tokens.is_empty());

    let _ = session.return_to_idle();
    assert_eq!(session.frame().phase, Phase::Idle);
    assert_eq!(session.until_next_callback(), None);
    let events = session.advance(Duration::from_secs(10));
    assert_eq!(events.len(), 1);
}

#[test]
fn scripted_sessions_replay_identically() {
    fn replay(seed: u64) -> (Vec<Event>, query::Frame) {
        let mut session = session(seed);
        let mut log = session.start_run();
        let mut hits = 0;
        for _ in 0..4_000 {
            if hits < 2 {
                if let Some(token) = live_token(&session, true) {
                    log.extend(session.click(token));
                    hits += 1;
                }
            }
            log.extend(session.advance(Duration::from_millis(35)));
            if session.frame().phase == Phase::RuleCard && session.frame().round.get() == 2 {
                hits = 0;
            }
        }
        (log, session.frame())
    }

    let first = replay(42);
    assert_eq!(first, replay(42));
    assert_ne!(first.0, replay(43).0);
}
