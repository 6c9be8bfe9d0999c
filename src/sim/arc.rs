//! Arc segment geometry for curved walls and ring rails
//!
//! In polar coordinates, an arc segment is defined by:
//! - radius: distance from the arena centre
//! - thickness: radial extent (inner = radius - thickness/2, outer = radius + thickness/2)
//! - theta_start, span: angular extent, counter-clockwise from theta_start

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian, shortest_delta};

/// A thickened arc segment in polar space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    /// Centerline radius from arena centre
    pub radius: f32,
    /// Radial thickness (extends radius ± thickness/2)
    pub thickness: f32,
    /// Start angle (radians, normalized to [0, 2π))
    pub theta_start: f32,
    /// Counter-clockwise angular extent (radians, (0, 2π])
    pub span: f32,
}

impl ArcSegment {
    pub fn new(radius: f32, thickness: f32, theta_start: f32, span: f32) -> Self {
        Self {
            radius,
            thickness,
            theta_start: normalize_angle(theta_start),
            span: span.clamp(0.0, TAU),
        }
    }

    /// A closed ring
    pub fn full_circle(radius: f32, thickness: f32) -> Self {
        Self::new(radius, thickness, 0.0, TAU)
    }

    #[inline]
    pub fn is_full_circle(&self) -> bool {
        self.span >= TAU
    }

    /// End angle, normalized
    #[inline]
    pub fn theta_end(&self) -> f32 {
        normalize_angle(self.theta_start + self.span)
    }

    /// Check if an angle is within the arc's angular extent
    pub fn contains_angle(&self, theta: f32) -> bool {
        if self.is_full_circle() {
            return true;
        }
        let offset = normalize_angle(theta - self.theta_start);
        offset <= self.span
    }

    /// Nearest point on the centerline to `point`
    pub fn closest_centerline_point(&self, point: Vec2) -> Vec2 {
        let (_, theta) = cartesian_to_polar(point);
        if self.contains_angle(theta) {
            return polar_to_cartesian(self.radius, theta);
        }
        // Outside the span: whichever endpoint is angularly nearer
        let to_start = shortest_delta(theta, self.theta_start).abs();
        let to_end = shortest_delta(theta, self.theta_end()).abs();
        let cap = if to_start <= to_end { self.theta_start } else { self.theta_end() };
        polar_to_cartesian(self.radius, cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_arc_contains_angle_no_wrap() {
        let arc = ArcSegment::new(100.0, 10.0, 0.0, PI / 2.0);
        assert!(arc.contains_angle(0.1));
        assert!(arc.contains_angle(PI / 4.0));
        assert!(!arc.contains_angle(PI));
        assert!(!arc.contains_angle(-PI / 4.0));
    }

    #[test]
    fn test_arc_contains_angle_wraparound() {
        // Arc from 350° through 0° to 10°
        let arc = ArcSegment::new(100.0, 10.0, -10.0_f32.to_radians(), 20.0_f32.to_radians());
        assert!(arc.contains_angle(0.0));
        assert!(arc.contains_angle(TAU - 0.1));
        assert!(arc.contains_angle(-0.1));
        assert!(!arc.contains_angle(PI));
    }

    #[test]
    fn test_full_circle_contains_everything() {
        let hub = ArcSegment::full_circle(60.0, 8.0);
        assert!(hub.is_full_circle());
        assert!(hub.contains_angle(3.0));
    }

    #[test]
    fn test_closest_point_clamps_to_cap() {
        let arc = ArcSegment::new(100.0, 10.0, 0.0, PI / 2.0);
        // Just below the start cap
        let p = arc.closest_centerline_point(polar_to_cartesian(120.0, -0.2));
        assert!((p - Vec2::new(100.0, 0.0)).length() < 1e-3);
        // Inside the span projects radially
        let p = arc.closest_centerline_point(polar_to_cartesian(50.0, PI / 4.0));
        assert!((p - polar_to_cartesian(100.0, PI / 4.0)).length() < 1e-3);
    }
}
