//! Collision detection and response
//!
//! Projectiles are circles. Walls are thick segments or arcs, actors are
//! oriented rectangles whose size and pose follow the current action angle.
//! Contact normals always point from the obstacle toward the projectile.

use glam::Vec2;
use rand::Rng;

use super::entity::{Actor, ActorId, ActorPosition, Goal, HitRecord, Projectile};
use super::rails::{RailElement, RailTopology};
use super::sdf::{OrientedBox, reflect};
use crate::config::{ActionConfig, ArenaConfig, MatchConfig, PhysicsConfig};
use crate::{cartesian_to_polar, shortest_delta};

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at contact (pointing toward the projectile centre)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a circle against a thick wall
pub fn wall_collision(pos: Vec2, radius: f32, wall: &RailElement) -> CollisionResult {
    let closest = wall.closest_point(pos);
    let offset = pos - closest;
    let dist = offset.length();
    let reach = radius + wall.thickness() / 2.0;
    if dist >= reach {
        return CollisionResult::miss();
    }

    let normal = if dist > 1e-6 {
        offset / dist
    } else {
        // Centre exactly on the centerline: push back toward the origin side
        -closest.normalize_or(Vec2::Y)
    };
    CollisionResult {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Bounce a projectile off the deepest overlapping wall
///
/// Reflects only when moving into the wall, always pushes back out to the
/// surface. Returns true when the velocity was reflected.
pub fn resolve_walls(projectile: &mut Projectile, walls: &[RailElement], restitution: f32) -> bool {
    let deepest = walls
        .iter()
        .map(|wall| wall_collision(projectile.pos, projectile.radius, wall))
        .filter(|c| c.hit)
        .max_by(|a, b| a.penetration.total_cmp(&b.penetration));

    let Some(contact) = deepest else {
        return false;
    };

    projectile.pos += contact.normal * contact.penetration;
    if projectile.vel.dot(contact.normal) < 0.0 {
        projectile.vel = reflect(projectile.vel, contact.normal) * restitution;
        true
    } else {
        false
    }
}

/// An actor's strike surface for this instant
#[derive(Debug, Clone, Copy)]
pub struct HitRegion {
    pub bounds: OrientedBox,
    /// Direction the actor shoots toward
    pub forward: Vec2,
}

/// Rectangles for every figure of an actor, posed by its action angle
pub fn hit_regions(actor: &Actor, config: &MatchConfig, rails: Option<&RailTopology>) -> Vec<HitRegion> {
    let angle = actor.action.rotation(&config.action);
    match (&config.arena, actor.position) {
        (ArenaConfig::Table(table), ActorPosition::Linear { .. }) => {
            // Seen from above, a swung foot stretches the figure toward (or
            // away from) the shot direction
            let forward = Vec2::new(0.0, actor.side.attack_sign());
            let reach = table.leg_reach * angle.sin();
            actor
                .hit_points(rails)
                .into_iter()
                .map(|point| HitRegion {
                    bounds: OrientedBox::new(
                        point + forward * reach * 0.5,
                        Vec2::new(table.figure_half_width, table.figure_half_depth + reach.abs() * 0.5),
                        0.0,
                    ),
                    forward,
                })
                .collect()
        }
        (ArenaConfig::Ring(ring), ActorPosition::Rail(_)) => {
            let anchor = actor.anchor(rails);
            let forward = -anchor.normalize_or(Vec2::X);
            let tangent = forward.perp();
            vec![HitRegion {
                bounds: OrientedBox::new(
                    anchor,
                    Vec2::new(ring.paddle_half_length, ring.paddle_half_depth),
                    tangent.to_angle() + angle,
                ),
                forward,
            }]
        }
        _ => Vec::new(),
    }
}

/// Where a projectile touches a hit region
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub normal: Vec2,
    pub penetration: f32,
    /// Strike position across the width, -1 (one edge) to 1 (other edge)
    pub edge: f32,
}

/// Circle vs oriented rectangle
pub fn region_contact(pos: Vec2, radius: f32, region: &HitRegion) -> Option<Contact> {
    let bounds = &region.bounds;
    let distance = bounds.signed_distance(pos);
    if distance >= radius {
        return None;
    }
    let normal = if distance > 0.0 {
        (pos - bounds.closest_point(pos)).normalize_or(region.forward)
    } else {
        bounds.interior_normal(pos)
    };
    let local = bounds.to_local(pos);
    Some(Contact {
        normal,
        penetration: radius - distance,
        edge: (local.x / bounds.half_extents.x).clamp(-1.0, 1.0),
    })
}

/// How an actor touch was resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActorHit {
    /// Idle actor acted as a wall
    Bounce(ActorId),
    /// Mid-action strike
    Impulse { actor: ActorId, speed: f32 },
}

/// Shot direction: forward, bent toward the struck edge, plus jitter
pub fn impulse_direction(
    forward: Vec2,
    width_axis: Vec2,
    edge: f32,
    config: &ActionConfig,
    rng: &mut impl Rng,
) -> Vec2 {
    let jitter = if config.jitter > 0.0 {
        rng.random_range(-config.jitter..=config.jitter)
    } else {
        0.0
    };
    // Orient the width axis so positive edge means "bend toward that edge"
    let angle = edge * config.edge_deflection + jitter;
    (forward * angle.cos() + width_axis * angle.sin()).normalize_or(forward)
}

/// Resolve at most one actor contact for a projectile
///
/// Actors are tried in registry order; the first overlapping, non-debounced
/// actor wins.
pub fn resolve_actors<'a>(
    projectile: &mut Projectile,
    actors: impl Iterator<Item = &'a Actor>,
    config: &MatchConfig,
    rails: Option<&RailTopology>,
    now: f64,
    rng: &mut impl Rng,
) -> Option<ActorHit> {
    for actor in actors {
        if projectile.is_debounced(actor.id, now, config.physics.debounce_window) {
            continue;
        }
        for region in hit_regions(actor, config, rails) {
            let Some(contact) = region_contact(projectile.pos, projectile.radius, &region) else {
                continue;
            };

            projectile.pos += contact.normal * contact.penetration;

            if let Some(power) = actor.action.impulse_power(&config.action) {
                let dir = impulse_direction(region.forward, region.bounds.axis, contact.edge, &config.action, rng);
                let speed = power.min(config.physics.max_speed);
                projectile.vel = dir * speed;
                projectile.last_hit = Some(HitRecord { actor: actor.id, at: now });
                return Some(ActorHit::Impulse { actor: actor.id, speed });
            }

            if projectile.vel.dot(contact.normal) < 0.0 {
                projectile.vel = reflect(projectile.vel, contact.normal) * config.physics.bounce_restitution;
            }
            return Some(ActorHit::Bounce(actor.id));
        }
    }
    None
}

/// Playing-field limits used to catch anything that slipped past a wall
#[derive(Debug, Clone)]
pub enum ArenaBounds {
    Table {
        half_width: f32,
        half_length: f32,
        goal_half_width: f32,
    },
    Ring {
        hub_radius: f32,
        outer_radius: f32,
        /// (centre angle, half width) of each goal gap
        gaps: Vec<(f32, f32)>,
    },
}

impl ArenaBounds {
    pub fn from_config(config: &MatchConfig) -> Self {
        match &config.arena {
            ArenaConfig::Table(table) => ArenaBounds::Table {
                half_width: table.half_width(),
                half_length: table.half_length(),
                goal_half_width: table.goal_width / 2.0,
            },
            ArenaConfig::Ring(ring) => ArenaBounds::Ring {
                hub_radius: ring.hub_radius,
                outer_radius: ring.outer_radius,
                gaps: (0..ring.goal_count)
                    .map(|i| (super::rails::goal_center(ring, i), ring.goal_width / 2.0))
                    .collect(),
            },
        }
    }

    /// Pull a tunnelled projectile back into the field. Goal mouths are open.
    /// Returns true if the projectile had to be moved.
    pub fn contain(&self, projectile: &mut Projectile) -> bool {
        let r = projectile.radius;
        match self {
            ArenaBounds::Table {
                half_width,
                half_length,
                goal_half_width,
            } => {
                let mut moved = false;
                let limit_x = half_width - r;
                if projectile.pos.x.abs() > limit_x {
                    let sign = projectile.pos.x.signum();
                    projectile.pos.x = sign * limit_x;
                    if projectile.vel.x * sign > 0.0 {
                        projectile.vel.x = -projectile.vel.x;
                    }
                    moved = true;
                }
                let in_mouth = projectile.pos.x.abs() < *goal_half_width;
                let limit_y = half_length - r;
                if !in_mouth && projectile.pos.y.abs() > limit_y {
                    let sign = projectile.pos.y.signum();
                    projectile.pos.y = sign * limit_y;
                    if projectile.vel.y * sign > 0.0 {
                        projectile.vel.y = -projectile.vel.y;
                    }
                    moved = true;
                }
                moved
            }
            ArenaBounds::Ring {
                hub_radius,
                outer_radius,
                gaps,
            } => {
                let (dist, theta) = cartesian_to_polar(projectile.pos);
                let outward = projectile.pos.normalize_or(Vec2::X);
                if dist < hub_radius + r {
                    projectile.pos = outward * (hub_radius + r);
                    if projectile.vel.dot(outward) < 0.0 {
                        projectile.vel = reflect(projectile.vel, outward);
                    }
                    return true;
                }
                let in_gap = gaps
                    .iter()
                    .any(|&(center, half)| shortest_delta(center, theta).abs() <= half);
                if !in_gap && dist > outer_radius - r {
                    projectile.pos = outward * (outer_radius - r);
                    if projectile.vel.dot(outward) > 0.0 {
                        projectile.vel = reflect(projectile.vel, outward);
                    }
                    return true;
                }
                false
            }
        }
    }
}

/// Move by velocity
#[inline]
pub fn integrate(projectile: &mut Projectile, dt: f32) {
    projectile.pos += projectile.vel * dt;
}

/// Cap speed at the top of the band
pub fn clamp_speed(projectile: &mut Projectile, physics: &PhysicsConfig) {
    let speed = projectile.speed();
    if speed > physics.max_speed {
        projectile.vel *= physics.max_speed / speed;
    }
}

/// Exponential speed decay; below the minimum speed the projectile stops
pub fn apply_friction(projectile: &mut Projectile, physics: &PhysicsConfig, dt: f32) {
    projectile.vel *= (-physics.friction * dt).exp();
    if projectile.speed() < physics.min_speed {
        projectile.vel = Vec2::ZERO;
    }
}

/// First goal (in goal order) whose mouth contains `pos`
pub fn check_goal(goals: &[Goal], pos: Vec2) -> Option<&Goal> {
    goals.iter().find(|goal| goal.contains(pos))
}
