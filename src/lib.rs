//! Arcade Sports - deterministic core for table football and horde defense
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, rails, actions, AI, match flow)
//! - `config`: Data-driven match configuration
//! - `settings`: Match format, difficulty and player count
//! - `error`: Configuration and command errors

pub mod config;
pub mod error;
pub mod settings;
pub mod sim;

pub use config::MatchConfig;
pub use error::{CommandError, ConfigError};
pub use settings::{Difficulty, MatchFormat, MatchSettings};

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Driver constants
pub mod consts {
    /// Fixed simulation timestep used by the demo driver (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum fixed steps per frame to prevent spiral of death
    pub const MAX_STEPS_PER_FRAME: u32 = 8;
    /// Progress slack when deciding an action has finished
    pub const ACTION_EPSILON: f32 = 1e-5;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `from` to `to`, in [-π, π)
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    let mut delta = normalize_angle(to) - normalize_angle(from);
    if delta >= PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    delta
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta), theta in [0, 2π)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), normalize_angle(pos.y.atan2(pos.x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_range() {
        for raw in [-10.0, -TAU, -PI, -1e-9, 0.0, PI, TAU, 3.0 * TAU + 0.5] {
            let a = normalize_angle(raw);
            assert!((0.0..TAU).contains(&a), "{raw} -> {a}");
        }
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_shortest_delta_wraps() {
        let d = shortest_delta(TAU - 0.1, 0.1);
        assert!((d - 0.2).abs() < 1e-5);
        let d = shortest_delta(0.1, TAU - 0.1);
        assert!((d + 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_polar_round_trip() {
        let p = polar_to_cartesian(100.0, 1.0);
        let (r, theta) = cartesian_to_polar(p);
        assert!((r - 100.0).abs() < 1e-3);
        assert!((theta - 1.0).abs() < 1e-5);
    }
}
