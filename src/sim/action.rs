//! Kick/swing action state machine
//!
//! Idle → Active(kind, progress) → Cooldown(remaining) → Idle. The rotation
//! angle used for hit regions and rendering is a pure function of the state.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::config::ActionConfig;
use crate::consts::ACTION_EPSILON;

/// Which strike is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Quick forward sweep
    Forward,
    /// Pull back, then snap through past rest
    Power,
}

impl ActionKind {
    pub fn duration(self, config: &ActionConfig) -> f32 {
        match self {
            ActionKind::Forward => config.forward_duration,
            ActionKind::Power => config.power_duration,
        }
    }

    pub fn multiplier(self, config: &ActionConfig) -> f32 {
        match self {
            ActionKind::Forward => config.forward_multiplier,
            ActionKind::Power => config.power_multiplier,
        }
    }

    /// Angle the actor is left at when the action completes
    pub fn terminal_angle(self, config: &ActionConfig) -> f32 {
        match self {
            ActionKind::Forward => config.forward_sweep,
            ActionKind::Power => config.power_overshoot,
        }
    }

    /// Rotation at a given progress in [0, 1]
    pub fn angle_at(self, progress: f32, config: &ActionConfig) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            ActionKind::Forward => config.forward_sweep * p,
            ActionKind::Power => {
                let windup = config.power_windup;
                if p < windup {
                    -config.power_pullback * (p / windup)
                } else {
                    let snap = (p - windup) / (1.0 - windup);
                    -config.power_pullback + (config.power_overshoot + config.power_pullback) * snap
                }
            }
        }
    }
}

/// Per-actor action state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Idle,
    Active { kind: ActionKind, progress: f32 },
    /// Holds the kind so the terminal pose is kept through the cooldown
    Cooldown { kind: ActionKind, remaining: f32 },
}

impl ActionState {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, ActionState::Idle)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, ActionState::Active { .. })
    }

    /// Start an action; only legal from Idle. Returns whether it started.
    pub fn start(&mut self, kind: ActionKind) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = ActionState::Active { kind, progress: 0.0 };
        true
    }

    /// Advance timers by `dt` seconds
    pub fn update(&mut self, dt: f32, config: &ActionConfig) {
        match *self {
            ActionState::Idle => {}
            ActionState::Active { kind, progress } => {
                let progress = progress + dt / kind.duration(config);
                if progress >= 1.0 - ACTION_EPSILON {
                    *self = ActionState::Cooldown {
                        kind,
                        remaining: config.cooldown,
                    };
                } else {
                    *self = ActionState::Active { kind, progress };
                }
            }
            ActionState::Cooldown { kind, remaining } => {
                let remaining = remaining - dt;
                *self = if remaining <= 0.0 {
                    ActionState::Idle
                } else {
                    ActionState::Cooldown { kind, remaining }
                };
            }
        }
    }

    /// Current rotation (radians); zero at rest
    pub fn rotation(&self, config: &ActionConfig) -> f32 {
        match *self {
            ActionState::Idle => 0.0,
            ActionState::Active { kind, progress } => kind.angle_at(progress, config),
            ActionState::Cooldown { kind, .. } => kind.terminal_angle(config),
        }
    }

    /// Impulse speed if struck now, or None when not mid-action
    ///
    /// Follows a half sine over progress, peaking at the midpoint.
    pub fn impulse_power(&self, config: &ActionConfig) -> Option<f32> {
        match *self {
            ActionState::Active { kind, progress } => {
                let curve = (progress.clamp(0.0, 1.0) * PI).sin();
                let power = config.min_power + (config.max_power - config.min_power) * curve;
                Some(power * kind.multiplier(config))
            }
            _ => None,
        }
    }
}
