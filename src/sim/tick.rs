//! Fixed timestep simulation tick
//!
//! Advances a match deterministically. Within one tick the order is always:
//! action timers, physics substeps, goal and clock evaluation, then AI.

use glam::Vec2;
use rand::Rng;

use super::ai::{self, AiContext};
use super::collision::{ActorHit, apply_friction, check_goal, clamp_speed, integrate, resolve_actors, resolve_walls};
use super::entity::Side;
use super::state::{GameEvent, MatchPhase, MatchState};
use crate::config::ArenaConfig;
use crate::settings::MatchFormat;

/// Leave `Settings` and start counting down. Returns false in any other phase.
pub fn start_countdown(state: &mut MatchState) -> bool {
    if state.phase != MatchPhase::Settings {
        log::debug!("Countdown ignored in {:?}", state.phase);
        return false;
    }
    log::info!("Countdown from {}", state.config.timing.countdown_from);
    state.set_phase(MatchPhase::Countdown(state.config.timing.countdown_from));
    true
}

/// Advance the match by `dt` seconds; `now` is the caller's clock in seconds
///
/// Phase timers and the match clock use `dt` as given. Actions, physics,
/// stall detection and AI use `dt` capped at `physics.max_tick_delta`.
pub fn tick(state: &mut MatchState, dt: f32, now: f64) {
    state.events.clear();

    if !dt.is_finite() || dt <= 0.0 {
        return;
    }
    let max = state.config.physics.max_tick_delta;
    let step = if dt > max {
        log::warn!("Tick delta {dt:.4}s clamped to {max:.4}s for physics");
        max
    } else {
        dt
    };
    state.time_ticks += 1;

    for goal in &mut state.goals {
        goal.update_flash(dt);
    }

    match state.phase {
        MatchPhase::Settings | MatchPhase::GameOver(_) => return,
        MatchPhase::Countdown(n) => {
            update_actions(state, step);
            state.phase_timer += dt;
            if state.phase_timer >= state.config.timing.countdown_step {
                if n == 0 {
                    log::info!("Kickoff");
                    state.set_phase(MatchPhase::Playing);
                    serve_all(state);
                } else {
                    state.set_phase(MatchPhase::Countdown(n - 1));
                }
            }
            return;
        }
        MatchPhase::ScoreEvent(_) => {
            // Physics stays frozen until the celebration is over
            state.phase_timer += dt;
            if state.phase_timer >= state.config.timing.celebration {
                resume_after_score(state);
            }
            return;
        }
        MatchPhase::Playing => {}
    }

    update_actions(state, step);
    step_physics(state, step, now);
    evaluate_goals(state);
    if state.phase == MatchPhase::Playing {
        update_clock(state, dt);
    }
    if state.phase == MatchPhase::Playing {
        state.elapsed += step;
        update_stall(state, step);
        run_ai(state, step);
    }
}

/// End the celebration early: re-serve and go back to `Playing`
///
/// Returns false unless the match is in `ScoreEvent`.
pub fn resume_after_score(state: &mut MatchState) -> bool {
    if !matches!(state.phase, MatchPhase::ScoreEvent(_)) {
        return false;
    }
    let pending = std::mem::take(&mut state.pending_serves);
    for (id, toward) in pending {
        serve(state, id, toward);
    }
    state.set_phase(MatchPhase::Playing);
    true
}

/// Full restart back to `Settings`; only legal from `GameOver` or `Settings`
pub fn reset_game(state: &mut MatchState) -> bool {
    if !matches!(state.phase, MatchPhase::GameOver(_) | MatchPhase::Settings) {
        log::debug!("Reset ignored in {:?}", state.phase);
        return false;
    }
    log::info!("Match reset");
    state.populate();
    state.set_phase(MatchPhase::Settings);
    true
}

fn update_actions(state: &mut MatchState, dt: f32) {
    let config = &state.config.action;
    for actor in state.actors.iter_mut() {
        actor.action.update(dt, config);
    }
}

/// Substepped projectile physics for every live projectile
fn step_physics(state: &mut MatchState, dt: f32, now: f64) {
    let MatchState {
        config,
        actors,
        projectiles,
        rails,
        walls,
        bounds,
        rng,
        events,
        ..
    } = state;
    let physics = &config.physics;
    let substeps = physics.substeps.max(1);
    let h = dt / substeps as f32;

    for step in 0..substeps {
        let t = now + (h as f64) * step as f64;
        for projectile in projectiles.iter_mut().filter(|p| p.in_play) {
            integrate(projectile, h);

            if resolve_walls(projectile, walls, physics.wall_restitution) {
                events.push(GameEvent::WallBounce { projectile: projectile.id });
            }

            match resolve_actors(projectile, actors.iter(), config, rails.as_ref(), t, rng) {
                Some(ActorHit::Impulse { actor, speed }) => {
                    log::debug!("Projectile {} struck by {} at {:.0}", projectile.id, actor, speed);
                    events.push(GameEvent::ActorHit { actor, projectile: projectile.id, impulse: true });
                }
                Some(ActorHit::Bounce(actor)) => {
                    events.push(GameEvent::ActorHit { actor, projectile: projectile.id, impulse: false });
                }
                None => {}
            }

            bounds.contain(projectile);
            clamp_speed(projectile, physics);
            apply_friction(projectile, physics, h);
        }
    }
}

/// Score at most one goal per tick; the first projectile in id order wins
fn evaluate_goals(state: &mut MatchState) {
    if state.phase != MatchPhase::Playing {
        return;
    }

    let mut scored = None;
    for projectile in state.projectiles.iter_mut().filter(|p| p.in_play) {
        if let Some(goal) = check_goal(&state.goals, projectile.pos) {
            projectile.in_play = false;
            projectile.vel = Vec2::ZERO;
            scored = Some((goal.index, goal.owner, projectile.id));
            break;
        }
    }
    let Some((goal_index, conceding, projectile)) = scored else {
        return;
    };

    let scorer = conceding.other();
    state.scores[scorer.index()] += 1;
    if let Some(goal) = state.goals.get_mut(goal_index) {
        goal.flash(state.config.timing.goal_flash);
    }
    state.events.push(GameEvent::Goal { scorer, goal: goal_index, projectile });
    log::info!(
        "Goal for {:?} ({} - {})",
        scorer,
        state.scores[Side::Player.index()],
        state.scores[Side::Opponent.index()]
    );

    let target_reached = match state.settings.format {
        MatchFormat::FirstTo(target) => state.scores[scorer.index()] >= target,
        MatchFormat::Timed { .. } => state.sudden_death,
    };
    if target_reached {
        log::info!("Game over, {:?} wins", scorer);
        state.set_phase(MatchPhase::GameOver(scorer));
    } else {
        state.pending_serves.push((projectile, conceding));
        state.set_phase(MatchPhase::ScoreEvent(scorer));
    }
}

/// Count the match clock down; decide or go to sudden death at expiry
fn update_clock(state: &mut MatchState, dt: f32) {
    let Some(remaining) = state.time_remaining else {
        return;
    };
    if state.sudden_death {
        return;
    }
    let remaining = (remaining - dt).max(0.0);
    state.time_remaining = Some(remaining);
    if remaining > 0.0 {
        return;
    }

    let [player, opponent] = state.scores;
    if player == opponent {
        log::info!("Time up at {player} - {opponent}, sudden death");
        state.sudden_death = true;
        state.events.push(GameEvent::SuddenDeath);
    } else {
        let winner = if player > opponent { Side::Player } else { Side::Opponent };
        log::info!("Time up, {:?} wins {player} - {opponent}", winner);
        state.set_phase(MatchPhase::GameOver(winner));
    }
}

/// Re-serve live projectiles that have all been at rest for too long
fn update_stall(state: &mut MatchState, dt: f32) {
    let live: Vec<u32> = state.projectiles.iter().filter(|p| p.in_play).map(|p| p.id).collect();
    let resting = !live.is_empty()
        && state
            .projectiles
            .iter()
            .filter(|p| p.in_play)
            .all(|p| p.vel == Vec2::ZERO);
    if !resting {
        state.stall_timer = 0.0;
        return;
    }
    state.stall_timer += dt;
    if state.stall_timer >= state.config.timing.stall_timeout {
        log::info!("Stalled for {:.1}s, re-serving", state.stall_timer);
        state.stall_timer = 0.0;
        for id in live {
            let toward = random_side(state);
            serve(state, id, toward);
        }
    }
}

fn run_ai(state: &mut MatchState, dt: f32) {
    let profile = state.profile();
    let MatchState {
        config,
        actors,
        projectiles,
        goals,
        rails,
        elapsed,
        rng,
        events,
        ..
    } = state;
    let ctx = AiContext {
        config,
        profile,
        rails: rails.as_ref(),
        goals,
        projectiles,
        elapsed: *elapsed,
        dt,
    };
    for (actor, kind) in ai::update(actors, &ctx, rng) {
        events.push(GameEvent::ActionStarted { actor, kind });
    }
}

fn random_side(state: &mut MatchState) -> Side {
    if state.rng.random_bool(0.5) { Side::Player } else { Side::Opponent }
}

/// Serve every projectile at kickoff, each toward a random side
fn serve_all(state: &mut MatchState) {
    let ids: Vec<u32> = state.projectiles.iter().map(|p| p.id).collect();
    for id in ids {
        let toward = random_side(state);
        serve(state, id, toward);
    }
}

/// Put a projectile back at its spawn point heading toward `toward`'s goal,
/// within the serve cone
pub(crate) fn serve(state: &mut MatchState, id: u32, toward: Side) {
    let spawn = state.spawn_point(id);
    let aim = match &state.config.arena {
        // Player defends +y
        ArenaConfig::Table(_) => Vec2::new(0.0, -toward.attack_sign()),
        ArenaConfig::Ring(_) => state
            .goals
            .iter()
            .filter(|g| g.owner == toward)
            .map(|g| g.center_point() - spawn)
            .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
            .map(|v| v.normalize_or(Vec2::X))
            .unwrap_or(Vec2::X),
    };
    let cone = state.config.physics.serve_cone;
    let spread = if cone > 0.0 { state.rng.random_range(-cone..=cone) } else { 0.0 };
    let vel = Vec2::from_angle(spread).rotate(aim) * state.config.physics.serve_speed;

    if let Some(projectile) = state.projectiles.iter_mut().find(|p| p.id == id) {
        projectile.pos = spawn;
        projectile.vel = vel;
        projectile.last_hit = None;
        projectile.in_play = true;
        state.events.push(GameEvent::Served { projectile: id, toward });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::settings::Difficulty;
    use crate::sim::state::configure_match;

    const DT: f32 = 1.0 / 120.0;

    fn playing(format: MatchFormat) -> MatchState {
        let mut state = configure_match(MatchConfig::foosball(), 1, format, Difficulty::Medium, 42).unwrap();
        start_countdown(&mut state);
        let mut now = 0.0;
        while state.phase != MatchPhase::Playing {
            tick(&mut state, 0.05, now);
            now += 0.05;
        }
        state
    }

    #[test]
    fn test_countdown_sequence() {
        let mut state = configure_match(MatchConfig::foosball(), 1, MatchFormat::FirstTo(5), Difficulty::Easy, 1).unwrap();
        tick(&mut state, DT, 0.0);
        assert_eq!(state.phase, MatchPhase::Settings);

        assert!(start_countdown(&mut state));
        assert!(!start_countdown(&mut state));
        let mut seen = vec![state.phase];
        let mut now = 0.0;
        for _ in 0..200 {
            tick(&mut state, 0.05, now);
            now += 0.05;
            if seen.last() != Some(&state.phase) {
                seen.push(state.phase);
            }
            if state.phase == MatchPhase::Playing {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                MatchPhase::Countdown(3),
                MatchPhase::Countdown(2),
                MatchPhase::Countdown(1),
                MatchPhase::Countdown(0),
                MatchPhase::Playing,
            ]
        );
        // Kickoff serves the ball
        assert!(state.projectiles[0].speed() > 0.0);
    }

    #[test]
    fn test_long_frames_do_not_slow_countdown() {
        let mut state = configure_match(MatchConfig::foosball(), 1, MatchFormat::FirstTo(5), Difficulty::Easy, 1).unwrap();
        start_countdown(&mut state);
        let step = state.config.timing.countdown_step;
        // One tick per countdown step even though each exceeds the physics cap
        assert!(step > state.config.physics.max_tick_delta);
        for i in 0..4 {
            tick(&mut state, step, i as f64 * step as f64);
        }
        assert_eq!(state.phase, MatchPhase::Playing);
    }

    #[test]
    fn test_serve_heads_toward_conceding_side() {
        let mut state = playing(MatchFormat::FirstTo(5));
        serve(&mut state, 1, Side::Player);
        let ball = &state.projectiles[0];
        assert_eq!(ball.pos, Vec2::ZERO);
        assert!(ball.vel.y > 0.0);
        let cone = state.config.physics.serve_cone;
        assert!(ball.vel.x.abs() <= ball.speed() * cone.sin() + 1e-3);

        serve(&mut state, 1, Side::Opponent);
        assert!(state.projectiles[0].vel.y < 0.0);
    }

    #[test]
    fn test_goal_freezes_physics_until_resume() {
        let mut state = playing(MatchFormat::FirstTo(5));
        state.projectiles[0].pos = Vec2::new(0.0, -226.0);
        state.projectiles[0].vel = Vec2::new(0.0, -50.0);
        tick(&mut state, DT, 10.0);
        assert_eq!(state.phase, MatchPhase::ScoreEvent(Side::Player));
        assert_eq!(state.score(Side::Player), 1);
        assert!(state.goals[1].recently_scored);

        let frozen = state.projectiles[0].pos;
        tick(&mut state, DT, 10.01);
        assert_eq!(state.projectiles[0].pos, frozen);
        assert_eq!(state.score(Side::Player), 1);

        assert!(resume_after_score(&mut state));
        assert_eq!(state.phase, MatchPhase::Playing);
        assert!(state.projectiles[0].in_play);
        // Re-served toward the side that conceded
        assert!(state.projectiles[0].vel.y < 0.0);
        assert!(!resume_after_score(&mut state));
    }

    #[test]
    fn test_celebration_ends_inside_tick() {
        let mut state = playing(MatchFormat::FirstTo(5));
        state.projectiles[0].pos = Vec2::new(0.0, 230.0);
        tick(&mut state, DT, 0.0);
        assert_eq!(state.phase, MatchPhase::ScoreEvent(Side::Opponent));
        let steps = (state.config.timing.celebration / 0.05).ceil() as usize + 1;
        for i in 0..steps {
            tick(&mut state, 0.05, i as f64 * 0.05);
        }
        assert_eq!(state.phase, MatchPhase::Playing);
    }

    #[test]
    fn test_reset_only_from_terminal_phases() {
        let mut state = playing(MatchFormat::FirstTo(1));
        assert!(!reset_game(&mut state));
        state.projectiles[0].pos = Vec2::new(0.0, -230.0);
        tick(&mut state, DT, 0.0);
        assert_eq!(state.phase, MatchPhase::GameOver(Side::Player));

        // Terminal: ticks change nothing
        tick(&mut state, DT, 0.1);
        assert_eq!(state.phase, MatchPhase::GameOver(Side::Player));

        assert!(reset_game(&mut state));
        assert_eq!(state.phase, MatchPhase::Settings);
        assert_eq!(state.scores, [0, 0]);
        assert!(state.projectiles[0].in_play);
    }

    #[test]
    fn test_oversized_delta_clamps_physics_only() {
        let mut state = playing(MatchFormat::Timed { seconds: 30.0 });
        state.projectiles[0].pos = Vec2::ZERO;
        state.projectiles[0].vel = Vec2::new(0.0, 0.0);
        let before = state.time_remaining.unwrap();
        tick(&mut state, 5.0, 0.0);
        // The clock runs on wall time
        let spent = before - state.time_remaining.unwrap();
        assert!((spent - 5.0).abs() < 1e-4);
        // Gameplay time advances by the capped step
        assert!((state.elapsed - state.config.physics.max_tick_delta).abs() < 1e-4);
    }

    #[test]
    fn test_stalled_ball_is_reserved() {
        let mut state = playing(MatchFormat::FirstTo(5));
        // Park the ball between rods where nothing can reach it
        state.projectiles[0].pos = Vec2::new(130.0, 30.0);
        state.projectiles[0].vel = Vec2::ZERO;
        let mut now = 0.0;
        let mut served = false;
        for _ in 0..((state.config.timing.stall_timeout / 0.05) as usize + 2) {
            tick(&mut state, 0.05, now);
            now += 0.05;
            served |= state.events.iter().any(|e| matches!(e, GameEvent::Served { .. }));
        }
        assert!(served);
    }
}
