//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host supplies delta time; no platform timers
//! - Seeded RNG only, owned by the match
//! - Stable iteration order (actors by id, projectiles by id)
//! - No rendering, audio or I/O

pub mod action;
pub mod ai;
pub mod arc;
pub mod collision;
pub mod commands;
pub mod entity;
pub mod rails;
pub mod sdf;
pub mod state;
pub mod tick;

pub use action::{ActionKind, ActionState};
pub use arc::ArcSegment;
pub use collision::{ArenaBounds, CollisionResult, check_goal};
pub use commands::{MoveCommand, move_actor, switch_rail, trigger_action};
pub use entity::{Actor, ActorId, ActorPosition, Goal, GoalShape, PlayerId, Projectile, Role, Side};
pub use rails::{Junction, RailPosition, RailTopology};
pub use state::{GameEvent, MatchPhase, MatchSnapshot, MatchState, configure_match};
pub use tick::{reset_game, resume_after_score, start_countdown, tick};
