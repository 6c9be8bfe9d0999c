//! Error types
//!
//! Configuration problems are rejected when a match is built. Command errors
//! are local: an `Err` always means the match state was left untouched.

use thiserror::Error;

use crate::sim::entity::{ActorId, PlayerId};

/// Rejected match configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        range: &'static str,
    },

    #[error("ring arena needs at least one ring")]
    EmptyRings,

    #[error("ring radii must be strictly increasing and lie between hub ({hub}) and outer wall ({outer})")]
    UnsortedRings { hub: f32, outer: f32 },

    #[error("goal sectors overlap: {count} sectors of {width} rad do not fit")]
    OverlappingGoals { count: usize, width: f32 },

    #[error("player count {count} exceeds the {max} controllable groups")]
    InvalidPlayerCount { count: usize, max: usize },

    #[error("invalid match format: {0}")]
    InvalidFormat(&'static str),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected command; state is unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("match is not accepting this command in its current phase")]
    NotPlaying,

    #[error("actor {0} is already acting or cooling down")]
    ActionBusy(ActorId),

    #[error("actor {0} is not at a junction")]
    NotAtJunction(ActorId),

    #[error("actor {0} has no ring in that direction")]
    NoAdjacentRing(ActorId),

    #[error("actor {0} does not ride the ring/spoke rails")]
    NotOnRails(ActorId),
}
