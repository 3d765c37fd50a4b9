use std::collections::HashSet;

use false_friends_core::{GameConfig, RoundNumber, RoundPlan, TokenRole};
use false_friends_system_content::{
    preview_friend,
    seeds::{derive_round_seed, derive_run_seed},
    ContentGenerator,
};
use false_friends_system_rules::rule_for_round;

const SEEDS: u64 = 200;

fn plan_for(seed: u64, round: RoundNumber) -> RoundPlan {
    let generator = ContentGenerator::new(&GameConfig::default());
    let rule = rule_for_round(round);
    generator.build_round(round, &rule, derive_round_seed(seed, round))
}

fn sampled_rounds() -> impl Iterator<Item = RoundNumber> {
    (1..=30).chain([75, 500, u32::MAX]).map(RoundNumber::new)
}

#[test]
fn every_round_has_exactly_the_configured_friends() {
    for seed in 0..SEEDS {
        for round in sampled_rounds() {
            let plan = plan_for(seed, round);
            assert_eq!(plan.slots().len(), 20);
            assert_eq!(plan.friend_count(), 4, "seed {seed} round {round:?}");
            for blueprint in plan.slots() {
                if blueprint.role.is_friend() {
                    assert_eq!(blueprint.attributes, plan.friend());
                }
            }
        }
    }
}

#[test]
fn no_false_friend_ever_satisfies_the_rule() {
    for seed in 0..SEEDS {
        for round in sampled_rounds() {
            let plan = plan_for(seed, round);
            let friend = plan.friend();
            for blueprint in plan.slots().iter().filter(|slot| !slot.role.is_friend()) {
                assert!(
                    !plan.rule().matches(&blueprint.attributes, &friend),
                    "seed {seed} round {round:?} produced a matching false friend"
                );
            }
        }
    }
}

#[test]
fn false_friend_roles_describe_their_mismatches() {
    for seed in 0..SEEDS {
        let round = RoundNumber::new(9);
        let plan = plan_for(seed, round);
        let friend = plan.friend();
        let active = plan.rule().active().len();
        for blueprint in plan.slots() {
            let mismatches: Vec<_> = plan
                .rule()
                .mismatches(&blueprint.attributes, &friend)
                .collect();
            match blueprint.role {
                TokenRole::Friend => assert!(mismatches.is_empty()),
                TokenRole::NearMiss { differs_on } => assert_eq!(mismatches, vec![differs_on]),
                TokenRole::FullMismatch => assert_eq!(mismatches.len(), active),
            }
        }
    }
}

#[test]
fn inactive_attributes_keep_the_fixed_value() {
    let round = RoundNumber::FIRST;
    let plan = plan_for(77, round);
    for blueprint in plan.slots() {
        for kind in false_friends_core::AttributeKind::ALL {
            if !plan.rule().active().contains(kind) {
                assert_eq!(blueprint.attributes.get(kind).get(), 0);
            }
        }
    }
}

#[test]
fn near_miss_share_grows_with_round_depth() {
    let near_miss_share = |round: RoundNumber| {
        let mut near = 0_u32;
        let mut total = 0_u32;
        for seed in 0..SEEDS {
            for blueprint in plan_for(seed, round).slots() {
                match blueprint.role {
                    TokenRole::Friend => {}
                    TokenRole::NearMiss { .. } => {
                        near += 1;
                        total += 1;
                    }
                    TokenRole::FullMismatch => total += 1,
                }
            }
        }
        f64::from(near) / f64::from(total)
    };

    let early = near_miss_share(RoundNumber::new(3));
    let late = near_miss_share(RoundNumber::new(13));
    let deep = near_miss_share(RoundNumber::new(400));
    assert!(early < late, "early {early} late {late}");
    assert!(late < 1.0);
    assert!(deep < 0.9, "deep rounds keep full mismatches: {deep}");
}

#[test]
fn friend_slots_are_spread_over_every_index() {
    let mut counts = [0_u32; 20];
    for seed in 0..1_000 {
        for (index, blueprint) in plan_for(seed, RoundNumber::FIRST).slots().iter().enumerate() {
            if blueprint.role.is_friend() {
                counts[index] += 1;
            }
        }
    }
    for (index, count) in counts.iter().enumerate() {
        assert!(
            (100..=300).contains(count),
            "slot {index} was a friend {count} times out of 1000"
        );
    }
}

#[test]
fn tokens_occupy_distinct_cells() {
    for seed in 0..SEEDS {
        let plan = plan_for(seed, RoundNumber::new(4));
        let cells: HashSet<_> = plan.slots().iter().map(|slot| slot.cell).collect();
        assert_eq!(cells.len(), plan.slots().len());
        for cell in cells {
            assert!(cell.column() < 6 && cell.row() < 5);
        }
    }
}

#[test]
fn preview_matches_the_built_round() {
    let run_seed = derive_run_seed(0xfeed, false_friends_core::Generation::new(1));
    for value in 1..=12 {
        let round = RoundNumber::new(value);
        let rule = rule_for_round(round);
        let seed = derive_round_seed(run_seed, round);
        let plan = ContentGenerator::new(&GameConfig::default()).build_round(round, &rule, seed);
        assert_eq!(preview_friend(&rule, seed), plan.friend());
    }
}

#[test]
fn same_seed_replays_the_same_round() {
    assert_eq!(
        plan_for(5, RoundNumber::new(7)),
        plan_for(5, RoundNumber::new(7))
    );
    assert_ne!(
        plan_for(5, RoundNumber::new(7)),
        plan_for(6, RoundNumber::new(7))
    );
}
