//! Match state and construction
//!
//! Everything one match owns lives in [`MatchState`]: configuration, actors,
//! projectiles, goals, phase, clocks and the seeded RNG. Nothing here is
//! global; two matches never share mutable state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::action::{ActionKind, ActionState};
use super::ai::guard_center;
use super::collision::ArenaBounds;
use super::entity::{
    Actor, ActorId, ActorPosition, ActorRegistry, Goal, GoalShape, PlayerAssignments, PlayerId, Projectile, Role,
    Side,
};
use super::rails::{RailElement, RailPosition, RailTopology, goal_center, table_walls};
use crate::config::{ArenaConfig, MatchConfig, RingConfig, TableConfig};
use crate::error::{CommandError, ConfigError};
use crate::polar_to_cartesian;
use crate::settings::{Difficulty, DifficultyProfile, MatchFormat, MatchSettings};

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Configured, waiting for the countdown to be started
    Settings,
    /// Counting down to kickoff; movement allowed, no strikes
    Countdown(u8),
    /// Live play
    Playing,
    /// A goal was just scored by this side; physics frozen
    ScoreEvent(Side),
    /// Match decided in favour of this side
    GameOver(Side),
}

/// Things that happened during the last tick, for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    PhaseChanged(MatchPhase),
    ActionStarted { actor: ActorId, kind: ActionKind },
    ActorHit { actor: ActorId, projectile: u32, impulse: bool },
    WallBounce { projectile: u32 },
    Goal { scorer: Side, goal: usize, projectile: u32 },
    Served { projectile: u32, toward: Side },
    SuddenDeath,
}

/// One match: the explicit simulation context passed to `tick` and commands
#[derive(Debug, Clone)]
pub struct MatchState {
    pub config: MatchConfig,
    pub settings: MatchSettings,
    pub phase: MatchPhase,
    /// Goals scored, indexed by `Side::index`
    pub scores: [u32; 2],
    pub actors: ActorRegistry,
    /// Sorted by id
    pub projectiles: Vec<Projectile>,
    pub goals: Vec<Goal>,
    pub assignments: PlayerAssignments,
    /// Ring/spoke graph (ring arena only)
    pub rails: Option<RailTopology>,
    /// Static rail elements the projectiles bounce off
    pub walls: Vec<RailElement>,
    pub bounds: ArenaBounds,
    /// Seconds spent in the current countdown step or celebration
    pub phase_timer: f32,
    /// Seconds of live play so far
    pub elapsed: f32,
    /// Clock for timed formats
    pub time_remaining: Option<f32>,
    /// Timed match ran out level; next goal wins
    pub sudden_death: bool,
    /// Seconds every live projectile has been at rest
    pub stall_timer: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events from the most recent tick
    pub events: Vec<GameEvent>,
    /// Projectiles waiting to be re-served, with the side they head toward
    pub(crate) pending_serves: Vec<(u32, Side)>,
    pub(crate) rng: Pcg32,
}

/// Build a match in the `Settings` phase
///
/// Fails if the configuration is invalid, the format is malformed, or more
/// players are requested than there are control groups.
pub fn configure_match(
    config: MatchConfig,
    player_count: usize,
    format: MatchFormat,
    difficulty: Difficulty,
    seed: u64,
) -> Result<MatchState, ConfigError> {
    let settings = MatchSettings {
        player_count,
        format,
        difficulty,
        seed,
    };
    MatchState::new(config, settings)
}

impl MatchState {
    /// Build a match seeded from `settings.seed`
    pub fn new(config: MatchConfig, settings: MatchSettings) -> Result<Self, ConfigError> {
        let rng = Pcg32::seed_from_u64(settings.seed);
        Self::with_rng(config, settings, rng)
    }

    /// Build a match drawing from an already-seeded generator
    pub fn with_rng(config: MatchConfig, settings: MatchSettings, rng: Pcg32) -> Result<Self, ConfigError> {
        config.validate()?;
        settings.format.validate()?;
        let max = config.control_groups();
        if settings.player_count > max {
            return Err(ConfigError::InvalidPlayerCount {
                count: settings.player_count,
                max,
            });
        }

        let (rails, walls) = match &config.arena {
            ArenaConfig::Table(table) => (None, table_walls(table)),
            ArenaConfig::Ring(ring) => {
                let topology = RailTopology::new(ring)?;
                let walls = topology.walls().to_vec();
                (Some(topology), walls)
            }
        };
        let bounds = ArenaBounds::from_config(&config);

        let mut state = Self {
            config,
            settings,
            phase: MatchPhase::Settings,
            scores: [0, 0],
            actors: ActorRegistry::new(),
            projectiles: Vec::new(),
            goals: Vec::new(),
            assignments: PlayerAssignments::default(),
            rails,
            walls,
            bounds,
            phase_timer: 0.0,
            elapsed: 0.0,
            time_remaining: None,
            sudden_death: false,
            stall_timer: 0.0,
            time_ticks: 0,
            events: Vec::new(),
            pending_serves: Vec::new(),
            rng,
        };
        state.populate();

        log::info!(
            "Match configured: {} players, {:?}, {}, {} actors, {} projectiles",
            state.settings.player_count,
            state.settings.format,
            state.settings.difficulty.as_str(),
            state.actors.len(),
            state.projectiles.len()
        );
        Ok(state)
    }

    /// (Re)create actors, projectiles, goals and assignments; zero scores and clocks
    pub(crate) fn populate(&mut self) {
        let config = self.config.clone();
        let (actors, groups) = match &config.arena {
            ArenaConfig::Table(table) => spawn_rods(table),
            ArenaConfig::Ring(ring) => spawn_paddles(ring, self.rails.as_ref()),
        };
        self.actors = actors;
        self.goals = match &config.arena {
            ArenaConfig::Table(table) => table_goals(table),
            ArenaConfig::Ring(ring) => ring_goals(ring),
        };
        if let ArenaConfig::Ring(_) = &config.arena {
            assign_defended_goals(&mut self.actors, &self.goals, self.rails.as_ref());
        }

        self.assignments = PlayerAssignments::derive(&groups, self.settings.player_count);
        link_players(&mut self.actors, &self.assignments);

        let count = match &config.arena {
            ArenaConfig::Table(_) => 1,
            ArenaConfig::Ring(ring) => ring.puck_count,
        };
        self.projectiles = (0..count)
            .map(|i| {
                let mut p = Projectile::new(i as u32 + 1, config.physics.projectile_radius);
                p.pos = self.spawn_point(i as u32 + 1);
                p
            })
            .collect();

        self.scores = [0, 0];
        self.phase_timer = 0.0;
        self.elapsed = 0.0;
        self.time_remaining = self.settings.format.duration();
        self.sudden_death = false;
        self.stall_timer = 0.0;
        self.pending_serves.clear();
    }

    /// Where a projectile with this id is placed before being served
    pub fn spawn_point(&self, projectile_id: u32) -> Vec2 {
        match &self.config.arena {
            ArenaConfig::Table(_) => Vec2::ZERO,
            ArenaConfig::Ring(ring) => {
                let count = ring.puck_count.max(1) as f32;
                let inner = ring.rings.first().copied().unwrap_or(ring.outer_radius);
                let radius = (ring.hub_radius + inner) / 2.0;
                let angle = projectile_id.saturating_sub(1) as f32 * TAU / count;
                polar_to_cartesian(radius, angle + ring.spoke_offset + TAU / 12.0)
            }
        }
    }

    #[inline]
    pub fn profile(&self) -> DifficultyProfile {
        self.settings.difficulty.profile()
    }

    #[inline]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[inline]
    pub fn score(&self, side: Side) -> u32 {
        self.scores[side.index()]
    }

    #[inline]
    pub fn time_remaining(&self) -> Option<f32> {
        self.time_remaining
    }

    /// Actors driven by a human player
    pub fn player_actors(&self, player: PlayerId) -> Result<&[ActorId], CommandError> {
        self.assignments
            .actors_of(player)
            .ok_or(CommandError::UnknownPlayer(player))
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn projectile(&self, id: u32) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    /// Render/network view of the whole match
    pub fn snapshot(&self) -> MatchSnapshot {
        let rails = self.rails.as_ref();
        MatchSnapshot {
            phase: self.phase,
            scores: self.scores,
            time_remaining: self.time_remaining,
            sudden_death: self.sudden_death,
            actors: self
                .actors
                .iter()
                .map(|a| ActorSnapshot {
                    id: a.id,
                    side: a.side,
                    role: a.role,
                    controller: a.controller,
                    position: a.position,
                    anchor: a.anchor(rails),
                    figures: a.hit_points(rails),
                    rotation: a.action.rotation(&self.config.action),
                    action: a.action,
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    pos: p.pos,
                    vel: p.vel,
                    in_play: p.in_play,
                })
                .collect(),
            goals: self.goals.clone(),
        }
    }

    /// Phase change with logging and an event
    pub(crate) fn set_phase(&mut self, phase: MatchPhase) {
        if self.phase != phase {
            log::debug!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.phase_timer = 0.0;
            self.events.push(GameEvent::PhaseChanged(phase));
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub side: Side,
    pub role: Role,
    pub controller: Option<PlayerId>,
    pub position: ActorPosition,
    pub anchor: Vec2,
    /// World-space figure centres
    pub figures: Vec<Vec2>,
    pub rotation: f32,
    pub action: ActionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileSnapshot {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub in_play: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub scores: [u32; 2],
    pub time_remaining: Option<f32>,
    pub sudden_death: bool,
    pub actors: Vec<ActorSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub goals: Vec<Goal>,
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Figure offsets for `count` figures `spacing` apart, centred on the rod
fn figure_offsets(count: usize, spacing: f32) -> Vec<f32> {
    let mid = (count as f32 - 1.0) / 2.0;
    (0..count).map(|k| (k as f32 - mid) * spacing).collect()
}

/// Four rods per side, Player first. Control groups are [GK, DEF] and [MID, ATT].
fn spawn_rods(table: &TableConfig) -> (ActorRegistry, Vec<Vec<ActorId>>) {
    let mut registry = ActorRegistry::new();
    let mut groups = vec![Vec::new(), Vec::new()];
    let mut next = 0u32;

    for side in Side::BOTH {
        // Player rods sit on the +y half near their own goal for the GK
        let line_sign = -side.attack_sign();
        for (i, role) in Role::TABLE_RODS.into_iter().enumerate() {
            let figures = figure_offsets(TableConfig::FIGURE_COUNTS[i], table.figure_spacing[i]);
            let widest = figures.iter().fold(0.0f32, |m, f| m.max(f.abs()));
            let travel = (table.half_width() - table.figure_half_width - widest).max(0.0);
            let position = ActorPosition::Linear {
                offset: 0.0,
                min: -travel,
                max: travel,
                line: line_sign * table.rod_lines[i] * table.half_length(),
            };
            let id = ActorId(next);
            next += 1;
            let mut actor = Actor::new(id, side, role, position, figures);
            actor.ai.phase = i as f32 * 1.7 + side.index() as f32 * 0.9;
            registry.insert(actor);
            if side == Side::Player {
                groups[i / 2].push(id);
            }
        }
    }
    (registry, groups)
}

/// `paddles_per_side` paddles per side on the outermost ring. Each Player
/// paddle is its own control group.
fn spawn_paddles(ring: &RingConfig, rails: Option<&RailTopology>) -> (ActorRegistry, Vec<Vec<ActorId>>) {
    let mut registry = ActorRegistry::new();
    let mut groups = Vec::new();
    let outer_ring = ring.rings.len().saturating_sub(1);
    let mut next = 0u32;

    for side in Side::BOTH {
        for k in 0..ring.paddles_per_side {
            let angle = (k as f32 + 0.5) * TAU / ring.paddles_per_side as f32
                + side.index() as f32 * TAU / (2 * ring.paddles_per_side) as f32;
            let mut position = ActorPosition::Rail(RailPosition::Ring {
                ring: outer_ring,
                angle,
            });
            position = position.clamped(rails);
            let id = ActorId(next);
            next += 1;
            let mut actor = Actor::new(id, side, Role::SectorGuard, position, vec![0.0]);
            actor.ai.phase = k as f32 * 2.1 + side.index() as f32 * 1.3;
            registry.insert(actor);
            if side == Side::Player {
                groups.push(vec![id]);
            }
        }
    }
    (registry, groups)
}

/// Goal 0 at the near (+y) end, conceded by Player; goal 1 at the far end
fn table_goals(table: &TableConfig) -> Vec<Goal> {
    let half_width = table.goal_width / 2.0;
    vec![
        Goal::new(
            0,
            Side::Player,
            GoalShape::Mouth {
                line: table.half_length(),
                half_width,
            },
        ),
        Goal::new(
            1,
            Side::Opponent,
            GoalShape::Mouth {
                line: -table.half_length(),
                half_width,
            },
        ),
    ]
}

/// Sectors alternate ownership starting with Player
fn ring_goals(ring: &RingConfig) -> Vec<Goal> {
    (0..ring.goal_count)
        .map(|i| {
            let owner = if i % 2 == 0 { Side::Player } else { Side::Opponent };
            Goal::new(
                i,
                owner,
                GoalShape::Sector {
                    center: goal_center(ring, i),
                    half_width: ring.goal_width / 2.0,
                    radius: ring.outer_radius,
                },
            )
        })
        .collect()
}

/// Deal a side's goals (in angular order) to its guards
///
/// Every guard gets one or two neighbouring sectors. With more guards than
/// sectors the sectors are shared round-robin; with more than two sectors
/// per guard the extras go unguarded.
pub(crate) fn split_goals(own: &[usize], guards: usize) -> Vec<Vec<usize>> {
    if own.is_empty() || guards == 0 {
        return vec![Vec::new(); guards];
    }
    if guards >= own.len() {
        return (0..guards).map(|k| vec![own[k % own.len()]]).collect();
    }
    let base = own.len() / guards;
    let extra = own.len() % guards;
    let mut start = 0;
    (0..guards)
        .map(|k| {
            let size = base + usize::from(k < extra);
            let chunk = own[start..start + size.min(2)].to_vec();
            start += size;
            chunk
        })
        .collect()
}

/// Split each side's own goals between its paddles and start each paddle
/// in front of what it guards
fn assign_defended_goals(actors: &mut ActorRegistry, goals: &[Goal], rails: Option<&RailTopology>) {
    for side in Side::BOTH {
        let own: Vec<usize> = goals.iter().filter(|g| g.owner == side).map(|g| g.index).collect();
        let mut guards: Vec<&mut Actor> = actors.iter_mut().filter(|a| a.side == side).collect();
        let shares = split_goals(&own, guards.len());
        for (actor, share) in guards.iter_mut().zip(shares) {
            actor.ai.defended_goals = share;
            let centre = guard_center(&actor.ai.defended_goals, goals);
            if let (ActorPosition::Rail(RailPosition::Ring { ring, .. }), Some(angle)) = (actor.position, centre) {
                actor.position = ActorPosition::Rail(RailPosition::Ring { ring, angle }).clamped(rails);
            }
        }
    }
}

/// Mark human-driven actors and link every actor of a player to the others
fn link_players(actors: &mut ActorRegistry, assignments: &PlayerAssignments) {
    for (player, ids) in assignments.players() {
        for &id in ids {
            if let Some(actor) = actors.get_mut(id) {
                actor.controller = Some(player);
                actor.linked_with = ids.iter().copied().filter(|other| *other != id).collect();
            }
        }
    }
}
