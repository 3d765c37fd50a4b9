use std::time::Duration;

use false_friends_core::{Command, DeathCause, Event, GameConfig, Generation, Phase, RoundNumber};
use false_friends_world::{apply, query, World};

fn world(seed: u64) -> World {
    World::with_seed(GameConfig::default(), seed).expect("default config is valid")
}

fn submit(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

fn advance_phase(world: &mut World) -> Vec<Event> {
    let generation = query::generation(world);
    let at = query::clock(world);
    submit(world, Command::AdvancePhase { generation, at })
}

fn start_playing(world: &mut World) {
    let _ = submit(world, Command::StartRun);
    while query::phase(world) != Phase::Playing {
        let _ = advance_phase(world);
    }
}

fn spawn_all(world: &mut World) {
    let generation = query::generation(world);
    let total = query::round_progress(world).expect("round active").total;
    for slot in 0..total {
        let at = query::clock(world);
        let slot = u32::try_from(slot).expect("slot fits");
        let _ = submit(
            world,
            Command::SpawnToken {
                generation,
                slot,
                at,
            },
        );
    }
}

fn expire_all(world: &mut World) -> Vec<Event> {
    let generation = query::generation(world);
    let mut events = Vec::new();
    for snapshot in query::token_view(world).into_vec() {
        events.extend(submit(
            world,
            Command::ExpireToken {
                generation,
                token: snapshot.id,
                at: snapshot.expires_at,
            },
        ));
    }
    events
}

#[test]
fn draining_without_hits_ends_the_run() {
    let mut world = world(1);
    start_playing(&mut world);
    spawn_all(&mut world);
    let events = expire_all(&mut world);

    assert_eq!(query::phase(&world), Phase::Dead);
    let cause = DeathCause::QuotaMissed {
        hits: 0,
        required: 1,
    };
    assert_eq!(query::death_cause(&world), Some(cause));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::RunEnded {
            cause: DeathCause::QuotaMissed { .. },
            rounds_cleared: 0,
            ..
        }
    )));
    let stats = query::stats(&world);
    assert_eq!(stats.friends_missed, 4);
    assert_eq!(stats.false_friends_dodged, 16);
    assert_eq!(query::score(&world), 16 * 25);
}

#[test]
fn clicking_a_false_friend_is_fatal() {
    let mut world = world(2);
    start_playing(&mut world);
    spawn_all(&mut world);

    let decoy = query::token_view(&world)
        .iter()
        .find(|snapshot| !snapshot.is_friend)
        .map(|snapshot| snapshot.id)
        .expect("round has false friends");
    let events = submit(&mut world, Command::ClickToken { token: decoy });

    assert_eq!(query::phase(&world), Phase::Dead);
    assert_eq!(
        query::death_cause(&world),
        Some(DeathCause::WrongClick { token: decoy })
    );
    assert!(query::token_view(&world).is_empty());
    assert!(matches!(events.last(), Some(Event::RunEnded { .. })));

    let after = submit(&mut world, Command::ClickToken { token: decoy });
    assert!(after.is_empty());
}

#[test]
fn clearing_a_round_waits_for_the_transition() {
    let mut world = world(3);
    start_playing(&mut world);
    spawn_all(&mut world);

    let _ = submit(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(300),
        },
    );
    let friend = query::token_view(&world)
        .iter()
        .find(|snapshot| snapshot.is_friend)
        .map(|snapshot| snapshot.id)
        .expect("round has friends");
    let clicked = submit(&mut world, Command::ClickToken { token: friend });
    assert_eq!(
        clicked,
        vec![Event::FriendClicked {
            token: friend,
            reaction: Duration::from_millis(300),
            points: 1_700,
        }]
    );

    let events = expire_all(&mut world);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::RoundCleared { hits: 1, bonus: 500, .. })));
    assert_eq!(query::phase(&world), Phase::Playing);
    assert!(query::round_progress(&world).expect("round kept").resolved);
    assert_eq!(query::score(&world), 1_700 + 16 * 25 + 500);
    assert_eq!(query::rounds_cleared(&world), 1);

    let _ = advance_phase(&mut world);
    assert_eq!(query::phase(&world), Phase::RuleCard);
    assert_eq!(query::round(&world), RoundNumber::new(2));
    assert_eq!(
        query::stats(&world).best_reaction,
        Some(Duration::from_millis(300))
    );
}

#[test]
fn stale_callbacks_leave_the_new_run_untouched() {
    let mut world = world(4);
    start_playing(&mut world);
    let stale = query::generation(&world);
    let stale_seed = query::run_seed(&world);

    let restarted = submit(&mut world, Command::StartRun);
    let fresh = query::generation(&world);
    assert_eq!(fresh, stale.next());
    assert_eq!(query::phase(&world), Phase::Countdown);
    assert_ne!(query::run_seed(&world), stale_seed);
    assert!(restarted.contains(&Event::RunStarted {
        generation: fresh,
        seed: query::run_seed(&world),
    }));

    let ignored = [
        Command::SpawnToken {
            generation: stale,
            slot: 0,
            at: Duration::ZERO,
        },
        Command::AdvancePhase {
            generation: stale,
            at: Duration::ZERO,
        },
        Command::AdvancePhase {
            generation: Generation::new(fresh.get() + 5),
            at: Duration::ZERO,
        },
    ];
    for command in ignored {
        assert!(submit(&mut world, command).is_empty());
    }
    assert_eq!(query::phase(&world), Phase::Countdown);
    assert_eq!(query::frame(&world).countdown, Some(3));
    assert!(query::token_view(&world).is_empty());
}

#[test]
fn token_ids_are_never_reused_across_runs() {
    let mut world = world(5);
    start_playing(&mut world);
    spawn_all(&mut world);
    let first: Vec<_> = query::token_view(&world)
        .iter()
        .map(|snapshot| snapshot.id)
        .collect();

    start_playing(&mut world);
    spawn_all(&mut world);
    for snapshot in query::token_view(&world).iter() {
        assert!(!first.contains(&snapshot.id));
    }
}

#[test]
fn frames_report_remaining_visibility() {
    let mut world = world(6);
    start_playing(&mut world);
    spawn_all(&mut world);
    let _ = submit(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(1_250),
        },
    );

    let frame = query::frame(&world);
    assert_eq!(frame.phase, Phase::Playing);
    assert_eq!(frame.tokens.len(), 20);
    for token in &frame.tokens {
        assert_eq!(token.remaining, Duration::from_millis(750));
    }
}

#[test]
fn identical_scripts_replay_identically() {
    let script = |world: &mut World| {
        let mut log = Vec::new();
        log.extend(submit(world, Command::StartRun));
        while query::phase(world) != Phase::Playing {
            log.extend(advance_phase(world));
        }
        spawn_all(world);
        log.extend(expire_all(world));
        (log, query::frame(world))
    };

    let mut first = world(77);
    let mut second = world(77);
    assert_eq!(script(&mut first), script(&mut second));
}
