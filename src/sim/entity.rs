//! Entity model: actors, projectiles, goals and player assignments
//!
//! Actors live in an id-keyed registry so linked groups are resolved by id
//! rather than by reference. Iteration is always in id order.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::action::ActionState;
use super::rails::{RailPosition, RailTopology};
use crate::{cartesian_to_polar, shortest_delta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

/// The two teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Human side (AI-driven in demo mode)
    Player,
    /// Always AI-driven
    Opponent,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player, Side::Opponent];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    /// Sign of the y direction this side kicks toward on the table
    #[inline]
    pub fn attack_sign(self) -> f32 {
        match self {
            Side::Player => -1.0,
            Side::Opponent => 1.0,
        }
    }
}

/// What an actor is for; drives its AI strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
    /// Ring paddle guarding one or two goal sectors
    SectorGuard,
}

impl Role {
    /// Table rods in line order, same order as `TableConfig::rod_lines`
    pub const TABLE_RODS: [Role; 4] = [Role::Goalkeeper, Role::Defender, Role::Midfielder, Role::Attacker];
}

/// Where an actor is, in its variant's own coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActorPosition {
    /// Rod sliding across the table at a fixed y
    Linear { offset: f32, min: f32, max: f32, line: f32 },
    /// Paddle on the ring/spoke graph
    Rail(RailPosition),
}

impl ActorPosition {
    /// Same position forced back into its legal domain
    pub fn clamped(self, rails: Option<&RailTopology>) -> Self {
        match self {
            ActorPosition::Linear { offset, min, max, line } => ActorPosition::Linear {
                offset: if offset.is_finite() { offset.clamp(min, max) } else { 0.0f32.clamp(min, max) },
                min,
                max,
                line,
            },
            ActorPosition::Rail(pos) => match rails {
                Some(rails) => ActorPosition::Rail(rails.clamp(pos)),
                None => self,
            },
        }
    }
}

/// AI bookkeeping that persists between ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiMemory {
    /// Goal indices this actor guards (ring arena)
    pub defended_goals: Vec<usize>,
    /// Per-actor phase so wobble and patrol don't move in lockstep
    pub phase: f32,
}

/// A rod or a paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub side: Side,
    pub role: Role,
    pub position: ActorPosition,
    pub action: ActionState,
    /// Human in control; None means AI-driven
    pub controller: Option<PlayerId>,
    /// Actors that mirror this one's commands
    pub linked_with: Vec<ActorId>,
    /// Figure offsets along the rod (a paddle has a single figure at 0)
    pub figures: Vec<f32>,
    pub ai: AiMemory,
}

impl Actor {
    pub fn new(id: ActorId, side: Side, role: Role, position: ActorPosition, figures: Vec<f32>) -> Self {
        Self {
            id,
            side,
            role,
            position,
            action: ActionState::Idle,
            controller: None,
            linked_with: Vec::new(),
            figures,
            ai: AiMemory::default(),
        }
    }

    #[inline]
    pub fn is_ai(&self) -> bool {
        self.controller.is_none()
    }

    /// World-space centre of the rod or paddle
    pub fn anchor(&self, rails: Option<&RailTopology>) -> Vec2 {
        match self.position {
            ActorPosition::Linear { offset, line, .. } => Vec2::new(offset, line),
            ActorPosition::Rail(pos) => rails.map(|r| r.to_cartesian(pos)).unwrap_or(Vec2::ZERO),
        }
    }

    /// World-space centre of each figure
    pub fn hit_points(&self, rails: Option<&RailTopology>) -> Vec<Vec2> {
        match self.position {
            ActorPosition::Linear { offset, line, .. } => {
                self.figures.iter().map(|f| Vec2::new(offset + f, line)).collect()
            }
            ActorPosition::Rail(_) => vec![self.anchor(rails)],
        }
    }
}

/// Id-keyed actor arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorRegistry {
    actors: BTreeMap<ActorId, Actor>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Actors in id order
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.values_mut()
    }

    /// The actor followed by every actor linked to it (deduplicated)
    pub fn group_of(&self, id: ActorId) -> Vec<ActorId> {
        let mut group = vec![id];
        if let Some(actor) = self.actors.get(&id) {
            for linked in &actor.linked_with {
                if *linked != id && !group.contains(linked) && self.actors.contains_key(linked) {
                    group.push(*linked);
                }
            }
        }
        group
    }
}

/// Debounce entry: who last struck a projectile and when
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub actor: ActorId,
    pub at: f64,
}

/// A ball or puck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub last_hit: Option<HitRecord>,
    /// False once the projectile has entered a goal, until it is re-served
    pub in_play: bool,
}

impl Projectile {
    pub fn new(id: u32, radius: f32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius,
            last_hit: None,
            in_play: true,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// True when `actor` hit this projectile less than `window` seconds ago
    pub fn is_debounced(&self, actor: ActorId, now: f64, window: f32) -> bool {
        matches!(self.last_hit, Some(hit) if hit.actor == actor && now - hit.at < window as f64)
    }
}

/// Goal mouth geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GoalShape {
    /// Gap in a table end wall at `line` (signed y of the wall)
    Mouth { line: f32, half_width: f32 },
    /// Angular sector of the outer wall
    Sector { center: f32, half_width: f32, radius: f32 },
}

/// A goal and its presentation flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub index: usize,
    /// Side that concedes when this goal is entered
    pub owner: Side,
    pub shape: GoalShape,
    pub recently_scored: bool,
    pub flash_remaining: f32,
}

impl Goal {
    pub fn new(index: usize, owner: Side, shape: GoalShape) -> Self {
        Self {
            index,
            owner,
            shape,
            recently_scored: false,
            flash_remaining: 0.0,
        }
    }

    /// Whether a projectile centred at `pos` has gone in
    pub fn contains(&self, pos: Vec2) -> bool {
        match self.shape {
            GoalShape::Mouth { line, half_width } => {
                pos.x.abs() < half_width && if line > 0.0 { pos.y > line } else { pos.y < line }
            }
            GoalShape::Sector { center, half_width, radius } => {
                let (r, theta) = cartesian_to_polar(pos);
                r > radius && shortest_delta(center, theta).abs() <= half_width
            }
        }
    }

    /// A point in front of the goal, used as an aiming and serving reference
    pub fn center_point(&self) -> Vec2 {
        match self.shape {
            GoalShape::Mouth { line, .. } => Vec2::new(0.0, line),
            GoalShape::Sector { center, radius, .. } => crate::polar_to_cartesian(radius, center),
        }
    }

    /// Start the recently-scored flash
    pub fn flash(&mut self, seconds: f32) {
        self.recently_scored = true;
        self.flash_remaining = seconds;
    }

    /// Count the flash down; clears the flag when it runs out
    pub fn update_flash(&mut self, dt: f32) {
        if self.recently_scored {
            self.flash_remaining -= dt;
            if self.flash_remaining <= 0.0 {
                self.flash_remaining = 0.0;
                self.recently_scored = false;
            }
        }
    }
}

/// Which actors each human player drives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerAssignments {
    players: BTreeMap<PlayerId, Vec<ActorId>>,
}

impl PlayerAssignments {
    /// Deal control groups round-robin to `player_count` players
    ///
    /// Group `g` goes to player `g % player_count`; zero players leaves
    /// everything unassigned.
    pub fn derive(groups: &[Vec<ActorId>], player_count: usize) -> Self {
        let mut players: BTreeMap<PlayerId, Vec<ActorId>> = BTreeMap::new();
        if player_count == 0 {
            return Self { players };
        }
        for p in 0..player_count {
            players.insert(PlayerId(p as u32), Vec::new());
        }
        for (g, group) in groups.iter().enumerate() {
            let owner = PlayerId((g % player_count) as u32);
            players.entry(owner).or_default().extend(group.iter().copied());
        }
        Self { players }
    }

    pub fn actors_of(&self, player: PlayerId) -> Option<&[ActorId]> {
        self.players.get(&player).map(Vec::as_slice)
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &[ActorId])> {
        self.players.iter().map(|(p, a)| (*p, a.as_slice()))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_goal_predicate() {
        // 280 wide table, 90 wide goal, half length 225
        let far = Goal::new(1, Side::Opponent, GoalShape::Mouth { line: -225.0, half_width: 45.0 });
        let near = Goal::new(0, Side::Player, GoalShape::Mouth { line: 225.0, half_width: 45.0 });
        let pos = Vec2::new(0.0, -226.0);
        assert!(far.contains(pos));
        assert!(!near.contains(pos));
        // Wide of the mouth is not a goal
        assert!(!far.contains(Vec2::new(50.0, -240.0)));
        // Still on the table
        assert!(!far.contains(Vec2::new(0.0, -224.0)));
    }

    #[test]
    fn test_sector_goal_predicate() {
        let goal = Goal::new(0, Side::Player, GoalShape::Sector { center: 0.0, half_width: 0.3, radius: 400.0 });
        assert!(goal.contains(Vec2::new(401.0, 10.0)));
        assert!(goal.contains(crate::polar_to_cartesian(410.0, -0.2)));
        assert!(!goal.contains(Vec2::new(390.0, 0.0)));
        assert!(!goal.contains(crate::polar_to_cartesian(410.0, 0.5)));
    }

    #[test]
    fn test_goal_flash_expires() {
        let mut goal = Goal::new(0, Side::Player, GoalShape::Mouth { line: 225.0, half_width: 45.0 });
        goal.flash(0.5);
        goal.update_flash(0.3);
        assert!(goal.recently_scored);
        goal.update_flash(0.3);
        assert!(!goal.recently_scored);
    }

    #[test]
    fn test_assignments_round_robin() {
        let groups = vec![
            vec![ActorId(0), ActorId(1)],
            vec![ActorId(2), ActorId(3)],
        ];
        let solo = PlayerAssignments::derive(&groups, 1);
        assert_eq!(solo.actors_of(PlayerId(0)).unwrap().len(), 4);

        let duo = PlayerAssignments::derive(&groups, 2);
        assert_eq!(duo.actors_of(PlayerId(1)), Some(&[ActorId(2), ActorId(3)][..]));
        assert_eq!(duo.actors_of(PlayerId(0)), Some(&[ActorId(0), ActorId(1)][..]));

        let demo = PlayerAssignments::derive(&groups, 0);
        assert_eq!(demo.actors_of(PlayerId(0)), None);
    }

    #[test]
    fn test_debounce_window() {
        let mut ball = Projectile::new(1, 8.0);
        ball.last_hit = Some(HitRecord { actor: ActorId(3), at: 10.0 });
        assert!(ball.is_debounced(ActorId(3), 10.05, 0.1));
        assert!(!ball.is_debounced(ActorId(3), 10.2, 0.1));
        assert!(!ball.is_debounced(ActorId(4), 10.05, 0.1));
    }

    #[test]
    fn test_group_of_skips_unknown_links() {
        let mut registry = ActorRegistry::new();
        let pos = ActorPosition::Linear { offset: 0.0, min: -10.0, max: 10.0, line: 0.0 };
        let mut a = Actor::new(ActorId(0), Side::Player, Role::Defender, pos, vec![0.0]);
        a.linked_with = vec![ActorId(1), ActorId(9), ActorId(0)];
        registry.insert(a);
        registry.insert(Actor::new(ActorId(1), Side::Player, Role::Goalkeeper, pos, vec![0.0]));
        assert_eq!(registry.group_of(ActorId(0)), vec![ActorId(0), ActorId(1)]);
        assert_eq!(registry.group_of(ActorId(1)), vec![ActorId(1)]);
    }

    #[test]
    fn test_linear_clamp() {
        let pos = ActorPosition::Linear { offset: 50.0, min: -10.0, max: 10.0, line: 5.0 };
        match pos.clamped(None) {
            ActorPosition::Linear { offset, .. } => assert_eq!(offset, 10.0),
            other => panic!("unexpected {other:?}"),
        }
    }
}
