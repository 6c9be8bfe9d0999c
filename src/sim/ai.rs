//! Opponent AI
//!
//! Runs once per tick for every actor without a human controller. Each
//! actor is steered by a strategy picked from its [`Role`], then a separate
//! probability gate decides whether it strikes this tick.
//!
//! Table rods slide toward a target offset computed from the ball's current
//! or predicted crossing of the rod line. Ring paddles score every puck for
//! threat against the goals they guard and glide toward an intercept angle,
//! patrolling when nothing is dangerous.

use glam::Vec2;
use rand::Rng;

use super::action::ActionKind;
use super::entity::{Actor, ActorId, ActorPosition, ActorRegistry, Goal, GoalShape, Projectile, Role, Side};
use super::rails::{RailPosition, RailTopology};
use crate::config::{ArenaConfig, MatchConfig, TableConfig};
use crate::settings::DifficultyProfile;
use crate::{cartesian_to_polar, normalize_angle, shortest_delta};

/// Wobble oscillation speed (rad/s)
const WOBBLE_FREQUENCY: f32 = 2.3;
/// Sector slack when deciding a puck is already lined up with a goal
const SECTOR_MARGIN: f32 = 0.15;

/// Read-only view of the match the AI decides from
pub struct AiContext<'a> {
    pub config: &'a MatchConfig,
    pub profile: DifficultyProfile,
    pub rails: Option<&'a RailTopology>,
    pub goals: &'a [Goal],
    pub projectiles: &'a [Projectile],
    /// Seconds of play so far (drives wobble and patrol)
    pub elapsed: f32,
    pub dt: f32,
}

impl AiContext<'_> {
    fn live_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter().filter(|p| p.in_play)
    }
}

/// Move every AI actor and roll its strike gate
///
/// Returns the actions started this tick.
pub fn update(actors: &mut ActorRegistry, ctx: &AiContext, rng: &mut impl Rng) -> Vec<(ActorId, ActionKind)> {
    let mut started = Vec::new();
    for actor in actors.iter_mut().filter(|a| a.is_ai()) {
        if let Some(position) = steer(actor, ctx) {
            actor.position = position.clamped(ctx.rails);
        }
        if let Some(kind) = decide_action(actor, ctx, rng) {
            if actor.action.start(kind) {
                log::debug!("AI {} starts {:?}", actor.id, kind);
                started.push((actor.id, kind));
            }
        }
    }
    started
}

/// Next position for one actor, dispatched on its role
pub fn steer(actor: &Actor, ctx: &AiContext) -> Option<ActorPosition> {
    match (actor.role, &ctx.config.arena) {
        (Role::SectorGuard, ArenaConfig::Ring(_)) => steer_guard(actor, ctx),
        (Role::SectorGuard, ArenaConfig::Table(_)) => None,
        (role, ArenaConfig::Table(table)) => steer_rod(actor, role, table, ctx),
        (_, ArenaConfig::Ring(_)) => None,
    }
}

// ---------------------------------------------------------------------------
// Table rods
// ---------------------------------------------------------------------------

/// Where the ball will cross the line `y = line`, allowing one bounce off a
/// side wall. Falls back to the current x when the ball is not heading there.
pub fn predict_crossing_x(ball: &Projectile, line: f32, table: &TableConfig) -> f32 {
    if ball.vel.y.abs() < 1e-3 {
        return ball.pos.x;
    }
    let t = (line - ball.pos.y) / ball.vel.y;
    if t <= 0.0 {
        return ball.pos.x;
    }
    let limit = (table.half_width() - ball.radius).max(0.0);
    let mut x = ball.pos.x + ball.vel.x * t;
    if x.abs() > limit {
        x = x.signum() * 2.0 * limit - x;
    }
    x.clamp(-limit, limit)
}

/// Strategy target x for a rod, before wobble
pub fn rod_target_x(role: Role, side: Side, line: f32, ball: &Projectile, table: &TableConfig) -> f32 {
    // Positive when the ball is moving toward this side's own goal
    let incoming = ball.vel.y * side.attack_sign() < 0.0;
    let goal_half = table.goal_width / 2.0;
    match role {
        Role::Goalkeeper => {
            if incoming {
                predict_crossing_x(ball, line, table).clamp(-goal_half, goal_half)
            } else {
                (ball.pos.x * 0.5).clamp(-goal_half, goal_half)
            }
        }
        Role::Defender => {
            if incoming {
                predict_crossing_x(ball, line, table)
            } else {
                ball.pos.x
            }
        }
        Role::Midfielder => ball.pos.x,
        Role::Attacker => {
            // Meet the ball with the edge that bends the shot toward the middle
            if ball.pos.x.abs() > goal_half * 0.5 {
                ball.pos.x + ball.pos.x.signum() * table.figure_half_width * 0.5
            } else {
                ball.pos.x
            }
        }
        Role::SectorGuard => ball.pos.x,
    }
}

/// Rod offset that puts the best-placed figure closest to `target_x`
pub fn offset_for_target(figures: &[f32], current: f32, min: f32, max: f32, target_x: f32) -> f32 {
    let mut best = current;
    let mut best_key = (f32::INFINITY, f32::INFINITY);
    for &figure in figures {
        let offset = (target_x - figure).clamp(min, max);
        let miss = (target_x - (offset + figure)).abs();
        let travel = (offset - current).abs();
        if (miss, travel) < best_key {
            best_key = (miss, travel);
            best = offset;
        }
    }
    best
}

/// Wobble amplitude for an accuracy in (0, 1]
#[inline]
pub fn wobble_amplitude(base: f32, accuracy: f32) -> f32 {
    base * (1.0 / accuracy.max(0.05) - 1.0)
}

/// Fraction of the remaining gap closed this tick
#[inline]
fn closing_gain(dt: f32, reaction_delay: f32) -> f32 {
    (dt / reaction_delay.max(1e-3)).min(1.0)
}

fn steer_rod(actor: &Actor, role: Role, table: &TableConfig, ctx: &AiContext) -> Option<ActorPosition> {
    let ActorPosition::Linear { offset, min, max, line } = actor.position else {
        return None;
    };
    let ball = ctx
        .live_projectiles()
        .min_by(|a, b| (a.pos.y - line).abs().total_cmp(&(b.pos.y - line).abs()))?;

    let wobble = wobble_amplitude(ctx.config.ai.base_wobble, ctx.profile.accuracy)
        * (ctx.elapsed * WOBBLE_FREQUENCY + actor.ai.phase).sin();
    let target_x = rod_target_x(role, actor.side, line, ball, table) + wobble;
    let target = offset_for_target(&actor.figures, offset, min, max, target_x);

    let max_step = ctx.config.ai.rod_speed * ctx.dt;
    let step = ((target - offset) * closing_gain(ctx.dt, ctx.profile.reaction_delay)).clamp(-max_step, max_step);
    Some(ActorPosition::Linear {
        offset: offset + step,
        min,
        max,
        line,
    })
}

// ---------------------------------------------------------------------------
// Ring paddles
// ---------------------------------------------------------------------------

/// Smallest positive time at which `pos + vel * t` lies on the circle of
/// `radius` around the origin
pub fn circle_crossing(pos: Vec2, vel: Vec2, radius: f32) -> Option<f32> {
    let a = vel.length_squared();
    if a < 1e-8 {
        return None;
    }
    let b = 2.0 * pos.dot(vel);
    let c = pos.length_squared() - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let t0 = (-b - sqrt) / (2.0 * a);
    let t1 = (-b + sqrt) / (2.0 * a);
    [t0, t1].into_iter().filter(|t| *t > 0.0).reduce(f32::min)
}

/// Angle to meet a puck at: current angle blended toward the predicted one
///
/// The prediction is where the puck crosses `ring_radius` within `horizon`
/// seconds, or where it will be after `horizon` seconds otherwise.
pub fn intercept_angle(pos: Vec2, vel: Vec2, ring_radius: f32, horizon: f32, accuracy: f32) -> f32 {
    let (_, current) = cartesian_to_polar(pos);
    let t = circle_crossing(pos, vel, ring_radius)
        .filter(|t| *t <= horizon)
        .unwrap_or(horizon);
    let predicted_point = pos + vel * t;
    if predicted_point.length_squared() < 1e-6 {
        return current;
    }
    let (_, predicted) = cartesian_to_polar(predicted_point);
    normalize_angle(current + shortest_delta(current, predicted) * accuracy.clamp(0.0, 1.0))
}

/// Heuristic danger of one puck to one goal sector
pub fn threat_score(puck: &Projectile, goal: &Goal, ctx: &AiContext) -> f32 {
    let GoalShape::Sector { center, half_width, radius } = goal.shape else {
        return 0.0;
    };
    let hub = ctx.rails.map(|r| r.hub_radius()).unwrap_or(0.0);
    let (dist, theta) = cartesian_to_polar(puck.pos);

    let speed_term = (puck.speed() / ctx.config.physics.max_speed).min(1.0);
    let proximity = ((dist - hub) / (radius - hub).max(1.0)).clamp(0.0, 1.0);
    let outward = puck.vel.dot(puck.pos.normalize_or_zero()) > 0.0;

    let horizon = ctx.config.ai.prediction_horizon * ctx.profile.accuracy;
    let on_course = circle_crossing(puck.pos, puck.vel, radius)
        .filter(|t| *t <= horizon)
        .map(|t| {
            let (_, hit) = cartesian_to_polar(puck.pos + puck.vel * t);
            shortest_delta(center, hit).abs() <= half_width
        })
        .unwrap_or(false);
    let lined_up = shortest_delta(center, theta).abs() <= half_width + SECTOR_MARGIN;

    let heading = if on_course {
        2.0
    } else if lined_up {
        1.0
    } else {
        0.4
    };
    let direction = if outward { 1.0 } else { 0.5 };
    (0.35 * speed_term + 0.65 * proximity) * heading * direction
}

/// Circular mean of the guarded sectors' centres
///
/// Falls back to the first sector when the centres cancel out.
pub fn guard_center(defended: &[usize], goals: &[Goal]) -> Option<f32> {
    let centers: Vec<f32> = defended
        .iter()
        .filter_map(|&i| goals.get(i))
        .filter_map(|g| match g.shape {
            GoalShape::Sector { center, .. } => Some(center),
            GoalShape::Mouth { .. } => None,
        })
        .collect();
    let first = *centers.first()?;
    let sum = centers.iter().fold(Vec2::ZERO, |acc, &c| acc + Vec2::from_angle(c));
    if sum.length_squared() > 1e-6 {
        Some(normalize_angle(sum.to_angle()))
    } else {
        Some(normalize_angle(first))
    }
}

/// Angle a ring guard wants to be at this tick
pub fn guard_target_angle(actor: &Actor, ring_radius: f32, ctx: &AiContext) -> Option<f32> {
    let mut best: Option<(f32, &Projectile)> = None;
    for puck in ctx.live_projectiles() {
        for goal in actor.ai.defended_goals.iter().filter_map(|&i| ctx.goals.get(i)) {
            let score = threat_score(puck, goal, ctx);
            if score >= ctx.config.ai.threat_threshold && best.is_none_or(|(s, _)| score > s) {
                best = Some((score, puck));
            }
        }
    }

    if let Some((_, puck)) = best {
        let horizon = ctx.config.ai.prediction_horizon * ctx.profile.accuracy;
        return Some(intercept_angle(puck.pos, puck.vel, ring_radius, horizon, ctx.profile.accuracy));
    }

    let center = guard_center(&actor.ai.defended_goals, ctx.goals)?;
    let sway = ctx.config.ai.patrol_amplitude * (ctx.elapsed * ctx.config.ai.patrol_frequency + actor.ai.phase).sin();
    Some(normalize_angle(center + sway))
}

fn steer_guard(actor: &Actor, ctx: &AiContext) -> Option<ActorPosition> {
    let rails = ctx.rails?;
    let ActorPosition::Rail(pos) = actor.position else {
        return None;
    };
    let travel = ctx.config.ai.rail_speed * ctx.dt;

    match pos {
        RailPosition::Ring { ring, angle } => {
            let radius = rails.ring_radius(ring)?;
            let target = guard_target_angle(actor, radius, ctx)?;
            let gap = shortest_delta(angle, target) * radius;
            let distance = (gap * closing_gain(ctx.dt, ctx.profile.reaction_delay)).clamp(-travel, travel);
            Some(ActorPosition::Rail(rails.advance(pos, distance)))
        }
        // Finish any spoke transit outward before guarding again
        RailPosition::Spoke { .. } => Some(ActorPosition::Rail(rails.advance(pos, travel))),
    }
}

// ---------------------------------------------------------------------------
// Strike gate
// ---------------------------------------------------------------------------

fn role_eagerness(role: Role) -> f32 {
    match role {
        Role::Goalkeeper => 0.7,
        Role::Defender => 0.85,
        Role::Midfielder => 1.0,
        Role::Attacker => 1.2,
        Role::SectorGuard => 1.0,
    }
}

/// How far from a figure centre a projectile can be struck
fn strike_reach(config: &MatchConfig) -> f32 {
    match &config.arena {
        ArenaConfig::Table(t) => t.figure_half_width.max(t.figure_half_depth + t.leg_reach),
        ArenaConfig::Ring(r) => r.paddle_half_length.max(r.paddle_half_depth),
    }
}

/// Nearest live projectile distance from any of the actor's figures
pub fn nearest_projectile_distance(actor: &Actor, ctx: &AiContext) -> Option<f32> {
    let points = actor.hit_points(ctx.rails);
    ctx.live_projectiles()
        .flat_map(|p| points.iter().map(move |pt| pt.distance(p.pos) - p.radius))
        .reduce(f32::min)
}

/// Roll whether an idle actor strikes this tick, and with what
pub fn decide_action(actor: &Actor, ctx: &AiContext, rng: &mut impl Rng) -> Option<ActionKind> {
    if !actor.action.is_idle() {
        return None;
    }
    let distance = nearest_projectile_distance(actor, ctx)?;
    if distance > strike_reach(ctx.config) + ctx.config.ai.action_range {
        return None;
    }

    let rate = ctx.profile.action_probability * role_eagerness(actor.role);
    let chance = 1.0 - (-rate * ctx.dt).exp();
    if !rng.random_bool(chance.clamp(0.0, 1.0) as f64) {
        return None;
    }

    let can_power = matches!(actor.role, Role::Midfielder | Role::Attacker | Role::SectorGuard);
    let power_chance = (ctx.config.ai.power_chance * ctx.profile.accuracy).clamp(0.0, 1.0);
    if can_power && rng.random_bool(power_chance as f64) {
        Some(ActionKind::Power)
    } else {
        Some(ActionKind::Forward)
    }
}
