//! End-to-end match scenarios driven through the public API

use arcade_sports::polar_to_cartesian;
use arcade_sports::sim::collision::check_goal;
use arcade_sports::sim::{
    ActionKind, ActorId, ActorPosition, GameEvent, MatchPhase, MatchState, MoveCommand, PlayerId, Side,
    configure_match, move_actor, start_countdown, switch_rail, tick, trigger_action,
};
use arcade_sports::{CommandError, Difficulty, MatchConfig, MatchFormat};
use glam::Vec2;
use proptest::prelude::*;

const DT: f32 = 1.0 / 120.0;

fn kickoff(config: MatchConfig, players: usize, format: MatchFormat, seed: u64) -> (MatchState, f64) {
    let mut state = configure_match(config, players, format, Difficulty::Medium, seed).unwrap();
    assert!(start_countdown(&mut state));
    let mut now = 0.0;
    while state.phase != MatchPhase::Playing {
        tick(&mut state, 0.05, now);
        now += 0.05;
    }
    (state, now)
}

/// Drop the table ball into the far goal so the Player scores on the next tick
fn place_in_far_goal(state: &mut MatchState) {
    let ball = &mut state.projectiles[0];
    ball.in_play = true;
    ball.pos = Vec2::new(0.0, -230.0);
    ball.vel = Vec2::ZERO;
}

fn goal_events(state: &MatchState) -> usize {
    state
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::Goal { .. }))
        .count()
}

#[test]
fn far_goal_predicate_on_default_table() {
    let state = configure_match(MatchConfig::foosball(), 1, MatchFormat::FirstTo(5), Difficulty::Easy, 1).unwrap();
    let goal = check_goal(&state.goals, Vec2::new(0.0, -226.0)).expect("far goal");
    // Far goal is conceded by the Opponent, so the Player scores
    assert_eq!(goal.owner, Side::Opponent);
    assert!(check_goal(&state.goals, Vec2::new(0.0, -224.0)).is_none());
    assert!(check_goal(&state.goals, Vec2::new(60.0, -240.0)).is_none());
}

#[test]
fn first_to_five_ends_on_the_fifth_goal() {
    let (mut state, now) = kickoff(MatchConfig::foosball(), 1, MatchFormat::FirstTo(5), 11);
    state.scores = [3, 3];
    place_in_far_goal(&mut state);
    tick(&mut state, DT, now);
    assert_eq!(state.phase, MatchPhase::ScoreEvent(Side::Player));
    assert_eq!(state.scores, [4, 3]);

    arcade_sports::sim::resume_after_score(&mut state);
    place_in_far_goal(&mut state);
    tick(&mut state, DT, now + 2.0);
    assert_eq!(state.scores, [5, 3]);
    assert_eq!(state.phase, MatchPhase::GameOver(Side::Player));
}

#[test]
fn goal_scores_exactly_once_while_ball_stays_in_goal() {
    let mut config = MatchConfig::foosball();
    config.timing.celebration = 10.0;
    let (mut state, mut now) = kickoff(config, 1, MatchFormat::FirstTo(5), 3);
    place_in_far_goal(&mut state);

    let mut goals = 0;
    let mut phase_changes = 0;
    for _ in 0..120 {
        // Keep the ball parked inside the goal mouth
        state.projectiles[0].pos = Vec2::new(0.0, -230.0);
        tick(&mut state, DT, now);
        now += DT as f64;
        goals += goal_events(&state);
        phase_changes += state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PhaseChanged(MatchPhase::ScoreEvent(_))))
            .count();
    }
    assert_eq!(goals, 1);
    assert_eq!(phase_changes, 1);
    assert_eq!(state.scores, [1, 0]);
    assert_eq!(state.phase, MatchPhase::ScoreEvent(Side::Player));
}

#[test]
fn timed_tie_goes_to_sudden_death() {
    let (mut state, mut now) = kickoff(MatchConfig::foosball(), 1, MatchFormat::Timed { seconds: 1.0 }, 8);
    state.scores = [2, 2];
    // Take the ball out of play so only the clock matters
    state.projectiles[0].in_play = false;
    state.projectiles[0].vel = Vec2::ZERO;

    let mut sudden = 0;
    for _ in 0..150 {
        tick(&mut state, DT, now);
        now += DT as f64;
        sudden += state.events.iter().filter(|e| matches!(e, GameEvent::SuddenDeath)).count();
    }
    assert_eq!(sudden, 1);
    assert!(state.sudden_death);
    assert_eq!(state.time_remaining(), Some(0.0));
    assert_eq!(state.phase, MatchPhase::Playing);

    // Next goal decides it
    place_in_far_goal(&mut state);
    tick(&mut state, DT, now);
    assert_eq!(state.phase, MatchPhase::GameOver(Side::Player));
    assert_eq!(state.scores, [3, 2]);
}

#[test]
fn timed_match_goes_to_the_leader() {
    let (mut state, mut now) = kickoff(MatchConfig::foosball(), 0, MatchFormat::Timed { seconds: 0.5 }, 8);
    state.scores = [0, 1];
    state.projectiles[0].in_play = false;
    for _ in 0..80 {
        tick(&mut state, DT, now);
        now += DT as f64;
    }
    assert_eq!(state.phase, MatchPhase::GameOver(Side::Opponent));
}

#[test]
fn ring_goal_credits_the_other_side() {
    let (mut state, now) = kickoff(MatchConfig::horde_defense(), 1, MatchFormat::FirstTo(3), 21);
    let target = state.goals.iter().find(|g| g.owner == Side::Opponent).unwrap().clone();
    let arcade_sports::sim::GoalShape::Sector { center, .. } = target.shape else {
        panic!("ring goals are sectors");
    };
    for puck in &mut state.projectiles {
        puck.vel = Vec2::ZERO;
    }
    state.projectiles[0].pos = polar_to_cartesian(406.0, center);
    tick(&mut state, DT, now);
    assert_eq!(state.phase, MatchPhase::ScoreEvent(Side::Player));
    assert!(state.goals[target.index].recently_scored);
    assert!(!state.projectiles[0].in_play);
    // Other pucks are untouched by the goal
    assert!(state.projectiles[1..].iter().all(|p| p.in_play));
}

#[test]
fn same_seed_replays_identically() {
    let run = |seed: u64| {
        let (mut state, mut now) = kickoff(MatchConfig::foosball(), 0, MatchFormat::FirstTo(3), seed);
        let mut log = Vec::new();
        for _ in 0..2400 {
            tick(&mut state, DT, now);
            now += DT as f64;
            log.extend(state.events.iter().cloned());
        }
        (serde_json::to_value(state.snapshot()).unwrap(), log)
    };
    let (a, events_a) = run(77);
    let (b, events_b) = run(77);
    assert_eq!(a, b);
    assert_eq!(events_a, events_b);
}

#[test]
fn ring_demo_match_keeps_pucks_inside() {
    let (mut state, mut now) = kickoff(MatchConfig::horde_defense(), 0, MatchFormat::FirstTo(50), 5);
    let outer = state.rails.as_ref().unwrap().outer_radius();
    for _ in 0..3000 {
        tick(&mut state, DT, now);
        now += DT as f64;
        for puck in state.projectiles.iter().filter(|p| p.in_play) {
            assert!(puck.pos.length() <= outer + puck.radius + 1.0);
            assert!(puck.speed() <= state.config.physics.max_speed + 1e-2);
        }
        if matches!(state.phase, MatchPhase::GameOver(_)) {
            break;
        }
    }
}

#[test]
fn linked_paddles_move_and_strike_together() {
    let (mut state, _) = kickoff(MatchConfig::horde_defense(), 1, MatchFormat::FirstTo(3), 2);
    let paddles = state.player_actors(PlayerId(0)).unwrap().to_vec();
    assert_eq!(paddles.len(), 2);

    let angle_of = |state: &MatchState, id: ActorId| match state.actor(id).unwrap().position {
        ActorPosition::Rail(arcade_sports::sim::RailPosition::Ring { angle, .. }) => angle,
        other => panic!("unexpected {other:?}"),
    };
    let before: Vec<f32> = paddles.iter().map(|&id| angle_of(&state, id)).collect();
    move_actor(&mut state, paddles[0], MoveCommand::By(34.0)).unwrap();
    for (k, &id) in paddles.iter().enumerate() {
        let moved = arcade_sports::shortest_delta(before[k], angle_of(&state, id));
        // 34 units of arc on the 340 ring
        assert!((moved - 0.1).abs() < 1e-4, "paddle {id}: {moved}");
    }

    trigger_action(&mut state, paddles[1], ActionKind::Power).unwrap();
    assert!(paddles.iter().all(|&id| state.actor(id).unwrap().action.is_active()));
    assert_eq!(
        trigger_action(&mut state, paddles[0], ActionKind::Forward),
        Err(CommandError::ActionBusy(paddles[0]))
    );
}

#[test]
fn lone_guard_patrols_in_front_of_its_goals() {
    let mut config = MatchConfig::horde_defense();
    if let arcade_sports::config::ArenaConfig::Ring(ring) = &mut config.arena {
        ring.paddles_per_side = 1;
    }
    let amplitude = config.ai.patrol_amplitude;
    let (mut state, mut now) = kickoff(config, 0, MatchFormat::FirstTo(3), 6);
    for puck in &mut state.projectiles {
        puck.in_play = false;
        puck.vel = Vec2::ZERO;
    }

    let guard = ActorId(0);
    let first_goal = state.actor(guard).unwrap().ai.defended_goals[0];
    let arcade_sports::sim::GoalShape::Sector { center, .. } = state.goals[first_goal].shape else {
        panic!("ring goals are sectors");
    };
    let angle_of = |state: &MatchState| match state.actor(guard).unwrap().position {
        ActorPosition::Rail(arcade_sports::sim::RailPosition::Ring { angle, .. }) => angle,
        other => panic!("unexpected {other:?}"),
    };

    let start = angle_of(&state);
    let mut furthest = 0.0f32;
    for _ in 0..240 {
        tick(&mut state, DT, now);
        now += DT as f64;
        let angle = angle_of(&state);
        furthest = furthest.max(arcade_sports::shortest_delta(start, angle).abs());
        assert!(arcade_sports::shortest_delta(center, angle).abs() <= amplitude + 1e-3);
    }
    assert!(furthest > 0.01, "guard never moved from {start}");
}

#[derive(Debug, Clone)]
enum Op {
    Move(usize, f32),
    Set(usize, f32),
    Switch(usize, bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, -600.0f32..600.0).prop_map(|(a, d)| Op::Move(a, d)),
        (0..4usize, -20.0f32..20.0).prop_map(|(a, v)| Op::Set(a, v)),
        (0..4usize, any::<bool>()).prop_map(|(a, inward)| Op::Switch(a, inward)),
    ]
}

proptest! {
    #[test]
    fn rail_commands_keep_paddles_legal(ops in prop::collection::vec(op(), 1..60)) {
        let mut state = configure_match(MatchConfig::horde_defense(), 2, MatchFormat::FirstTo(3), Difficulty::Easy, 4).unwrap();
        start_countdown(&mut state);
        for op in ops {
            let _ = match op {
                Op::Move(a, d) => move_actor(&mut state, ActorId(a as u32), MoveCommand::By(d)),
                Op::Set(a, v) => move_actor(&mut state, ActorId(a as u32), MoveCommand::To(v)),
                Op::Switch(a, inward) => switch_rail(&mut state, ActorId(a as u32), inward),
            };
            let rails = state.rails.as_ref().unwrap();
            for actor in state.actors.iter() {
                let ActorPosition::Rail(pos) = actor.position else {
                    panic!("ring actors ride rails");
                };
                prop_assert!(rails.is_legal(pos), "{:?}", pos);
            }
        }
    }
}
