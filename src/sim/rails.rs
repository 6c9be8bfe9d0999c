//! Rail topology for the ring-and-spoke arena
//!
//! Paddles glide on K concentric rings joined by M evenly spaced spokes.
//! A position is either (ring, angle) or (spoke, inner ring, progress), and
//! every position this module hands out is inside that domain: angles in
//! [0, 2π), ring and spoke indices in range, progress in [0, 1].
//!
//! The module also owns the static wall geometry (hub and outer wall with
//! goal gaps, or the four table walls) that projectiles bounce off.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::arc::ArcSegment;
use super::sdf::{closest_point_on_segment, sd_arc, sd_segment};
use crate::config::{RingConfig, TableConfig};
use crate::error::ConfigError;
use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian, shortest_delta};

/// Where a paddle sits on the rail graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RailPosition {
    /// Travelling along a ring
    Ring { ring: usize, angle: f32 },
    /// Travelling along a spoke between `inner_ring` and `inner_ring + 1`
    /// (progress 0 = inner ring, 1 = outer ring)
    Spoke {
        spoke: usize,
        inner_ring: usize,
        progress: f32,
    },
}

/// A ring/spoke crossing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub ring: usize,
    pub spoke: usize,
    pub point: Vec2,
}

/// A wall piece projectiles bounce off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RailElement {
    Segment { a: Vec2, b: Vec2, thickness: f32 },
    Arc(ArcSegment),
}

impl RailElement {
    /// Signed distance from `p` to the wall surface
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        match self {
            RailElement::Segment { a, b, thickness } => sd_segment(p, *a, *b, *thickness),
            RailElement::Arc(arc) => sd_arc(p, arc),
        }
    }

    /// Closest point on the wall centerline
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        match self {
            RailElement::Segment { a, b, .. } => closest_point_on_segment(p, *a, *b),
            RailElement::Arc(arc) => arc.closest_centerline_point(p),
        }
    }

    pub fn thickness(&self) -> f32 {
        match self {
            RailElement::Segment { thickness, .. } => *thickness,
            RailElement::Arc(arc) => arc.thickness,
        }
    }
}

/// Side walls and the two end walls split by their goal gaps
pub fn table_walls(table: &TableConfig) -> Vec<RailElement> {
    let hw = table.half_width();
    let hl = table.half_length();
    let gap = table.goal_width / 2.0;
    let t = table.wall_thickness;
    // Walls sit just outside the playing field
    let (x, y) = (hw + t / 2.0, hl + t / 2.0);
    let segment = |a: Vec2, b: Vec2| RailElement::Segment { a, b, thickness: t };

    vec![
        segment(Vec2::new(-x, -y), Vec2::new(-x, y)),
        segment(Vec2::new(x, -y), Vec2::new(x, y)),
        segment(Vec2::new(-x, y), Vec2::new(-gap, y)),
        segment(Vec2::new(gap, y), Vec2::new(x, y)),
        segment(Vec2::new(-x, -y), Vec2::new(-gap, -y)),
        segment(Vec2::new(gap, -y), Vec2::new(x, -y)),
    ]
}

/// Centre angle of goal sector `index`
pub fn goal_center(ring: &RingConfig, index: usize) -> f32 {
    normalize_angle(ring.goal_offset + index as f32 * TAU / ring.goal_count as f32)
}

/// The ring/spoke graph plus its walls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailTopology {
    rings: Vec<f32>,
    spoke_angles: Vec<f32>,
    hub_radius: f32,
    outer_radius: f32,
    junction_tolerance: f32,
    walls: Vec<RailElement>,
}

impl RailTopology {
    /// Build the graph, rejecting geometry it cannot represent
    pub fn new(config: &RingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let spoke_angles = (0..config.spoke_count)
            .map(|i| normalize_angle(config.spoke_offset + i as f32 * TAU / config.spoke_count as f32))
            .collect();

        // Hub is solid all round; outer wall is broken by every goal gap
        let thickness = config.wall_thickness;
        let mut walls = vec![RailElement::Arc(ArcSegment::full_circle(
            config.hub_radius - thickness / 2.0,
            thickness,
        ))];
        let wall_radius = config.outer_radius + thickness / 2.0;
        let step = TAU / config.goal_count as f32;
        for i in 0..config.goal_count {
            let start = goal_center(config, i) + config.goal_width / 2.0;
            let span = step - config.goal_width;
            walls.push(RailElement::Arc(ArcSegment::new(wall_radius, thickness, start, span)));
        }

        Ok(Self {
            rings: config.rings.clone(),
            spoke_angles,
            hub_radius: config.hub_radius,
            outer_radius: config.outer_radius,
            junction_tolerance: config.junction_tolerance,
            walls,
        })
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn spoke_count(&self) -> usize {
        self.spoke_angles.len()
    }

    pub fn ring_radius(&self, ring: usize) -> Option<f32> {
        self.rings.get(ring).copied()
    }

    pub fn spoke_angle(&self, spoke: usize) -> Option<f32> {
        self.spoke_angles.get(spoke).copied()
    }

    pub fn hub_radius(&self) -> f32 {
        self.hub_radius
    }

    pub fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    /// Static walls projectiles collide with
    pub fn walls(&self) -> &[RailElement] {
        &self.walls
    }

    /// Every ring/spoke crossing, ring-major
    pub fn junctions(&self) -> Vec<Junction> {
        self.rings
            .iter()
            .enumerate()
            .flat_map(|(ring, &radius)| {
                self.spoke_angles.iter().enumerate().map(move |(spoke, &angle)| Junction {
                    ring,
                    spoke,
                    point: polar_to_cartesian(radius, angle),
                })
            })
            .collect()
    }

    /// Junction closest to a world point (None when there are no spokes)
    pub fn nearest_junction(&self, point: Vec2) -> Option<Junction> {
        self.junctions().into_iter().min_by(|a, b| {
            a.point
                .distance_squared(point)
                .total_cmp(&b.point.distance_squared(point))
        })
    }

    /// World position of a rail position
    pub fn to_cartesian(&self, pos: RailPosition) -> Vec2 {
        let pos = self.clamp(pos);
        match pos {
            RailPosition::Ring { ring, angle } => polar_to_cartesian(self.rings[ring], angle),
            RailPosition::Spoke {
                spoke,
                inner_ring,
                progress,
            } => {
                let r0 = self.rings[inner_ring];
                let r1 = self.rings[inner_ring + 1];
                polar_to_cartesian(r0 + (r1 - r0) * progress, self.spoke_angles[spoke])
            }
        }
    }

    /// Unit direction of positive travel (counter-clockwise on rings, outward on spokes)
    pub fn travel_direction(&self, pos: RailPosition) -> Vec2 {
        match self.clamp(pos) {
            RailPosition::Ring { angle, .. } => Vec2::new(-angle.sin(), angle.cos()),
            RailPosition::Spoke { spoke, .. } => Vec2::from_angle(self.spoke_angles[spoke]),
        }
    }

    /// Whether `pos` lies inside the legal domain
    pub fn is_legal(&self, pos: RailPosition) -> bool {
        match pos {
            RailPosition::Ring { ring, angle } => {
                ring < self.rings.len() && (0.0..TAU).contains(&angle)
            }
            RailPosition::Spoke {
                spoke,
                inner_ring,
                progress,
            } => {
                spoke < self.spoke_angles.len()
                    && inner_ring + 1 < self.rings.len()
                    && (0.0..=1.0).contains(&progress)
            }
        }
    }

    /// Force any position into the legal domain
    pub fn clamp(&self, pos: RailPosition) -> RailPosition {
        let last_ring = self.rings.len().saturating_sub(1);
        match pos {
            RailPosition::Ring { ring, angle } => RailPosition::Ring {
                ring: ring.min(last_ring),
                angle: if angle.is_finite() { normalize_angle(angle) } else { 0.0 },
            },
            RailPosition::Spoke {
                spoke,
                inner_ring,
                progress,
            } => {
                if self.spoke_angles.is_empty() || self.rings.len() < 2 {
                    // No spoke can exist; fall back to the nearest ring
                    return RailPosition::Ring {
                        ring: inner_ring.min(last_ring),
                        angle: self.spoke_angle(spoke).unwrap_or(0.0),
                    };
                }
                RailPosition::Spoke {
                    spoke: spoke.min(self.spoke_angles.len() - 1),
                    inner_ring: inner_ring.min(self.rings.len() - 2),
                    progress: if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 },
                }
            }
        }
    }

    /// Spoke whose angle matches a ring position within tolerance
    pub fn junction_at(&self, pos: RailPosition) -> Option<usize> {
        let RailPosition::Ring { angle, .. } = pos else {
            return None;
        };
        self.spoke_angles
            .iter()
            .position(|&spoke| shortest_delta(angle, spoke).abs() <= self.junction_tolerance)
    }

    /// Move `distance` (arc length, signed) along the current rail
    ///
    /// Rings never change ring. Spokes turn back into ring positions when
    /// progress reaches either end; travel past the junction is dropped.
    pub fn advance(&self, pos: RailPosition, distance: f32) -> RailPosition {
        match self.clamp(pos) {
            RailPosition::Ring { ring, angle } => RailPosition::Ring {
                ring,
                angle: normalize_angle(angle + distance / self.rings[ring]),
            },
            RailPosition::Spoke {
                spoke,
                inner_ring,
                progress,
            } => {
                let length = self.rings[inner_ring + 1] - self.rings[inner_ring];
                let progress = progress + distance / length;
                let angle = self.spoke_angles[spoke];
                if progress >= 1.0 {
                    RailPosition::Ring {
                        ring: inner_ring + 1,
                        angle,
                    }
                } else if progress <= 0.0 {
                    RailPosition::Ring {
                        ring: inner_ring,
                        angle,
                    }
                } else {
                    RailPosition::Spoke {
                        spoke,
                        inner_ring,
                        progress,
                    }
                }
            }
        }
    }

    /// Leave a ring onto a spoke toward the next ring in or out
    ///
    /// Only legal at a junction; the position snaps onto the spoke line.
    pub fn switch_rail(&self, pos: RailPosition, inward: bool) -> Result<RailPosition, SwitchError> {
        let RailPosition::Ring { ring, .. } = self.clamp(pos) else {
            return Err(SwitchError::NotAtJunction);
        };
        let spoke = self.junction_at(self.clamp(pos)).ok_or(SwitchError::NotAtJunction)?;
        if inward {
            if ring == 0 {
                return Err(SwitchError::NoAdjacentRing);
            }
            Ok(RailPosition::Spoke {
                spoke,
                inner_ring: ring - 1,
                progress: 1.0,
            })
        } else {
            if ring + 1 >= self.rings.len() {
                return Err(SwitchError::NoAdjacentRing);
            }
            Ok(RailPosition::Spoke {
                spoke,
                inner_ring: ring,
                progress: 0.0,
            })
        }
    }

    /// Ring position on `ring` at the polar angle of `point`
    pub fn project_to_ring(&self, point: Vec2, ring: usize) -> RailPosition {
        let (_, angle) = cartesian_to_polar(point);
        self.clamp(RailPosition::Ring { ring, angle })
    }
}

/// Why a rail switch was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchError {
    NotAtJunction,
    NoAdjacentRing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn topology() -> RailTopology {
        RailTopology::new(&RingConfig::default()).unwrap()
    }

    #[test]
    fn test_junction_enumeration() {
        let topo = topology();
        let junctions = topo.junctions();
        assert_eq!(junctions.len(), topo.ring_count() * topo.spoke_count());
        let j = junctions[0];
        assert_eq!((j.ring, j.spoke), (0, 0));
        assert!((j.point - Vec2::new(160.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_nearest_junction() {
        let topo = topology();
        let j = topo.nearest_junction(polar_to_cartesian(245.0, PI / 3.0 + 0.02)).unwrap();
        assert_eq!((j.ring, j.spoke), (1, 1));
    }

    #[test]
    fn test_project_and_travel_direction() {
        let topo = topology();
        match topo.project_to_ring(Vec2::new(0.0, -50.0), 2) {
            RailPosition::Ring { ring, angle } => {
                assert_eq!(ring, 2);
                assert!((angle - 1.5 * PI).abs() < 1e-4);
            }
            other => panic!("unexpected {other:?}"),
        }
        let ccw = topo.travel_direction(RailPosition::Ring { ring: 0, angle: 0.0 });
        assert!((ccw - Vec2::Y).length() < 1e-5);
        let out = topo.travel_direction(RailPosition::Spoke { spoke: 0, inner_ring: 0, progress: 0.5 });
        assert!((out - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_ring_advance_wraps() {
        let topo = topology();
        let start = RailPosition::Ring { ring: 0, angle: TAU - 0.01 };
        match topo.advance(start, 160.0 * 0.02) {
            RailPosition::Ring { ring, angle } => {
                assert_eq!(ring, 0);
                assert!((angle - 0.01).abs() < 1e-4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ring_advance_never_changes_ring() {
        let topo = topology();
        let start = RailPosition::Ring { ring: 2, angle: 0.0 };
        // Passing straight over junctions stays on the ring
        let end = topo.advance(start, 340.0 * PI);
        assert!(matches!(end, RailPosition::Ring { ring: 2, .. }));
    }

    #[test]
    fn test_switch_requires_junction() {
        let topo = topology();
        let off = RailPosition::Ring { ring: 1, angle: 0.5 };
        assert_eq!(topo.switch_rail(off, true), Err(SwitchError::NotAtJunction));

        let at = RailPosition::Ring { ring: 1, angle: PI / 3.0 + 0.01 };
        let spoke = topo.switch_rail(at, true).unwrap();
        assert_eq!(
            spoke,
            RailPosition::Spoke { spoke: 1, inner_ring: 0, progress: 1.0 }
        );
    }

    #[test]
    fn test_switch_at_edge_rings() {
        let topo = topology();
        let innermost = RailPosition::Ring { ring: 0, angle: 0.0 };
        assert_eq!(topo.switch_rail(innermost, true), Err(SwitchError::NoAdjacentRing));
        let outermost = RailPosition::Ring { ring: 2, angle: 0.0 };
        assert_eq!(topo.switch_rail(outermost, false), Err(SwitchError::NoAdjacentRing));
    }

    #[test]
    fn test_spoke_travel_arrives_on_next_ring() {
        let topo = topology();
        let at = RailPosition::Ring { ring: 0, angle: 0.0 };
        let on_spoke = topo.switch_rail(at, false).unwrap();
        let halfway = topo.advance(on_spoke, 45.0);
        match halfway {
            RailPosition::Spoke { progress, .. } => assert!((progress - 0.5).abs() < 1e-4),
            other => panic!("unexpected {other:?}"),
        }
        assert!((topo.to_cartesian(halfway) - Vec2::new(205.0, 0.0)).length() < 1e-3);
        let arrived = topo.advance(halfway, 100.0);
        assert_eq!(arrived, RailPosition::Ring { ring: 1, angle: 0.0 });
        let back = topo.advance(halfway, -100.0);
        assert_eq!(back, RailPosition::Ring { ring: 0, angle: 0.0 });
    }

    #[test]
    fn test_rejects_unusable_geometry() {
        let empty = RingConfig { rings: Vec::new(), ..RingConfig::default() };
        assert!(matches!(RailTopology::new(&empty), Err(ConfigError::EmptyRings)));
        let unsorted = RingConfig { rings: vec![250.0, 160.0], ..RingConfig::default() };
        assert!(matches!(RailTopology::new(&unsorted), Err(ConfigError::UnsortedRings { .. })));
    }

    #[test]
    fn test_walls_leave_goal_gaps() {
        let config = RingConfig::default();
        let topo = RailTopology::new(&config).unwrap();
        assert_eq!(topo.walls().len(), 1 + config.goal_count);
        let mouth = polar_to_cartesian(config.outer_radius + 2.0, goal_center(&config, 0));
        // No outer wall piece covers the goal mouth
        for wall in &topo.walls()[1..] {
            assert!(wall.signed_distance(mouth) > 0.0);
        }
    }

    #[test]
    fn test_table_walls_gap() {
        let table = TableConfig::default();
        let walls = table_walls(&table);
        assert_eq!(walls.len(), 6);
        let mouth = Vec2::new(0.0, table.half_length() + 3.0);
        assert!(walls.iter().all(|w| w.signed_distance(mouth) > 0.0));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Move(f32),
        Switch(bool),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            (-800.0f32..800.0).prop_map(Step::Move),
            any::<bool>().prop_map(Step::Switch),
        ]
    }

    proptest! {
        /// Property: the movement operator never leaves the legal domain
        #[test]
        fn prop_rail_walk_stays_legal(
            ring in 0usize..3,
            angle in -20.0f32..20.0,
            steps in proptest::collection::vec(step_strategy(), 1..40)
        ) {
            let topo = topology();
            let mut pos = topo.clamp(RailPosition::Ring { ring, angle });
            prop_assert!(topo.is_legal(pos));
            for step in steps {
                pos = match step {
                    Step::Move(d) => topo.advance(pos, d),
                    Step::Switch(inward) => topo.switch_rail(pos, inward).unwrap_or(pos),
                };
                prop_assert!(topo.is_legal(pos), "illegal {:?}", pos);
                if let RailPosition::Ring { angle, .. } = pos {
                    prop_assert!((0.0..TAU).contains(&angle));
                }
            }
        }

        /// Property: clamping always yields a legal position
        #[test]
        fn prop_clamp_is_legal(
            ring in 0usize..10,
            spoke in 0usize..10,
            angle in -100.0f32..100.0,
            progress in -5.0f32..5.0,
            on_spoke in any::<bool>()
        ) {
            let topo = topology();
            let raw = if on_spoke {
                RailPosition::Spoke { spoke, inner_ring: ring, progress }
            } else {
                RailPosition::Ring { ring, angle }
            };
            prop_assert!(topo.is_legal(topo.clamp(raw)));
        }
    }
}
