//! Host commands
//!
//! Every command applies to the addressed actor and then to each actor
//! linked to it. An `Err` means nothing was changed.

use serde::{Deserialize, Serialize};

use super::action::ActionKind;
use super::entity::{ActorId, ActorPosition};
use super::rails::{RailPosition, SwitchError};
use super::state::{GameEvent, MatchPhase, MatchState};
use crate::error::CommandError;

/// How far to move an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MoveCommand {
    /// Absolute rod offset, ring angle or spoke progress
    To(f32),
    /// Relative rod offset or signed arc length along the current rail
    By(f32),
}

fn accepts_movement(phase: MatchPhase) -> bool {
    matches!(phase, MatchPhase::Countdown(_) | MatchPhase::Playing)
}

/// Move an actor and every actor linked to it
///
/// Targets outside an actor's legal range are clamped per actor.
pub fn move_actor(state: &mut MatchState, id: ActorId, command: MoveCommand) -> Result<(), CommandError> {
    if !state.actors.contains(id) {
        log::debug!("Move for unknown actor {id}");
        return Err(CommandError::UnknownActor(id));
    }
    if !accepts_movement(state.phase) {
        return Err(CommandError::NotPlaying);
    }

    let rails = state.rails.as_ref();
    for member in state.actors.group_of(id) {
        let Some(actor) = state.actors.get_mut(member) else {
            continue;
        };
        let moved = match (actor.position, command) {
            (ActorPosition::Linear { min, max, line, .. }, MoveCommand::To(target)) => {
                ActorPosition::Linear { offset: target, min, max, line }
            }
            (ActorPosition::Linear { offset, min, max, line }, MoveCommand::By(delta)) => {
                ActorPosition::Linear { offset: offset + delta, min, max, line }
            }
            (ActorPosition::Rail(RailPosition::Ring { ring, .. }), MoveCommand::To(angle)) => {
                ActorPosition::Rail(RailPosition::Ring { ring, angle })
            }
            (ActorPosition::Rail(RailPosition::Spoke { spoke, inner_ring, .. }), MoveCommand::To(progress)) => {
                ActorPosition::Rail(RailPosition::Spoke { spoke, inner_ring, progress })
            }
            (ActorPosition::Rail(pos), MoveCommand::By(distance)) => match rails {
                Some(rails) => ActorPosition::Rail(rails.advance(pos, distance)),
                None => actor.position,
            },
        };
        let clamped = moved.clamped(rails);
        if clamped != moved {
            log::warn!("{member} target {moved:?} clamped to {clamped:?}");
        }
        actor.position = clamped;
    }
    Ok(())
}

/// Start an action on an idle actor and on every idle actor linked to it
///
/// Busy linked actors are skipped. A busy primary rejects the whole command.
pub fn trigger_action(state: &mut MatchState, id: ActorId, kind: ActionKind) -> Result<(), CommandError> {
    let Some(primary) = state.actors.get(id) else {
        log::debug!("Action for unknown actor {id}");
        return Err(CommandError::UnknownActor(id));
    };
    if state.phase != MatchPhase::Playing {
        return Err(CommandError::NotPlaying);
    }
    if !primary.action.is_idle() {
        log::debug!("{id} busy, {kind:?} ignored");
        return Err(CommandError::ActionBusy(id));
    }

    for member in state.actors.group_of(id) {
        if let Some(actor) = state.actors.get_mut(member) {
            if actor.action.start(kind) {
                state.events.push(GameEvent::ActionStarted { actor: member, kind });
            }
        }
    }
    Ok(())
}

/// Step onto a spoke toward the next ring in or out
///
/// Only legal at a junction. Linked actors follow if they are at a junction
/// with a ring in that direction.
pub fn switch_rail(state: &mut MatchState, id: ActorId, inward: bool) -> Result<(), CommandError> {
    let Some(actor) = state.actors.get(id) else {
        log::debug!("Rail switch for unknown actor {id}");
        return Err(CommandError::UnknownActor(id));
    };
    if !accepts_movement(state.phase) {
        return Err(CommandError::NotPlaying);
    }
    let (ActorPosition::Rail(pos), Some(rails)) = (actor.position, state.rails.as_ref()) else {
        return Err(CommandError::NotOnRails(id));
    };
    let switched = rails.switch_rail(pos, inward).map_err(|err| match err {
        SwitchError::NotAtJunction => CommandError::NotAtJunction(id),
        SwitchError::NoAdjacentRing => CommandError::NoAdjacentRing(id),
    })?;

    for member in state.actors.group_of(id) {
        let Some(actor) = state.actors.get_mut(member) else {
            continue;
        };
        if member == id {
            actor.position = ActorPosition::Rail(switched);
            continue;
        }
        if let ActorPosition::Rail(linked) = actor.position {
            match rails.switch_rail(linked, inward) {
                Ok(next) => actor.position = ActorPosition::Rail(next),
                Err(err) => log::debug!("Linked {member} stays put: {err:?}"),
            }
        }
    }
    Ok(())
}
