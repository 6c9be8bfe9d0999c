//! Signed distance helpers
//!
//! Every rail, wall and hit region is reduced to "distance from a point,
//! negative inside" plus a closest feature point, which the collision code
//! turns into a contact normal.

use glam::Vec2;

use super::arc::ArcSegment;

/// Closest point on segment `a`-`b` to `p`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Signed distance to a segment thickened to `thickness` (a capsule)
#[inline]
pub fn sd_segment(p: Vec2, a: Vec2, b: Vec2, thickness: f32) -> f32 {
    (p - closest_point_on_segment(p, a, b)).length() - thickness * 0.5
}

/// Signed distance to an arc band (round caps at the ends)
#[inline]
pub fn sd_arc(p: Vec2, arc: &ArcSegment) -> f32 {
    (p - arc.closest_centerline_point(p)).length() - arc.thickness * 0.5
}

/// An oriented rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vec2,
    /// Half size along the box's local x (width) and y (depth) axes
    pub half_extents: Vec2,
    /// Unit vector of the local x axis in world space
    pub axis: Vec2,
}

impl OrientedBox {
    pub fn new(center: Vec2, half_extents: Vec2, rotation: f32) -> Self {
        Self {
            center,
            half_extents,
            axis: Vec2::from_angle(rotation),
        }
    }

    /// World point expressed in box-local coordinates
    #[inline]
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        let d = p - self.center;
        Vec2::new(d.dot(self.axis), d.dot(self.axis.perp()))
    }

    #[inline]
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.center + self.axis * local.x + self.axis.perp() * local.y
    }

    /// Closest point of the (solid) box to `p`; `p` itself when inside
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let local = self.to_local(p);
        self.to_world(local.clamp(-self.half_extents, self.half_extents))
    }

    /// Signed distance, negative inside
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        let local = self.to_local(p);
        let q = local.abs() - self.half_extents;
        q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0)
    }

    /// Outward normal of the face nearest to an interior point
    pub fn interior_normal(&self, p: Vec2) -> Vec2 {
        let local = self.to_local(p);
        let gap = self.half_extents - local.abs();
        if gap.x < gap.y {
            self.axis * local.x.signum()
        } else {
            self.axis.perp() * local.y.signum()
        }
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
