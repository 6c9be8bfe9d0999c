//! Data-driven match configuration
//!
//! [`MatchConfig`] holds every numeric parameter of one match variant. It is
//! built once at setup, validated, and never mutated while the match runs.
//! All structs use `#[serde(default)]`, so a JSON document only needs to name
//! the values it overrides:
//!
//! ```json
//! { "physics": { "friction": 0.5 }, "timing": { "celebration": 2.0 } }
//! ```

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::error::ConfigError;

/// Foosball table geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Side wall to side wall
    pub width: f32,
    /// End wall to end wall
    pub length: f32,
    /// Gap in each end wall
    pub goal_width: f32,
    pub wall_thickness: f32,
    pub figure_half_width: f32,
    pub figure_half_depth: f32,
    /// How far a figure's foot reaches when swung through 90°
    pub leg_reach: f32,
    /// Rod lines as a fraction of the half length, measured from the table
    /// centre toward the Player goal: goalkeeper, defender, midfielder, attacker
    pub rod_lines: [f32; 4],
    /// Figure spacing on each rod, same order as `rod_lines`
    pub figure_spacing: [f32; 4],
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            width: 280.0,
            length: 450.0,
            goal_width: 90.0,
            wall_thickness: 6.0,
            figure_half_width: 7.0,
            figure_half_depth: 5.0,
            leg_reach: 14.0,
            rod_lines: [0.86, 0.62, 0.14, -0.38],
            figure_spacing: [0.0, 90.0, 52.0, 80.0],
        }
    }
}

impl TableConfig {
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn half_length(&self) -> f32 {
        self.length / 2.0
    }

    /// Figures per rod, same order as `rod_lines`
    pub const FIGURE_COUNTS: [usize; 4] = [1, 2, 5, 3];
}

/// Ring-and-spoke arena geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub outer_radius: f32,
    /// Inner wall around the centre
    pub hub_radius: f32,
    /// Rail ring radii, strictly increasing
    pub rings: Vec<f32>,
    pub spoke_count: usize,
    /// Angle of spoke 0 (radians)
    pub spoke_offset: f32,
    /// Goal sectors on the outer wall, alternately owned by each side
    pub goal_count: usize,
    /// Angular width of each goal sector (radians)
    pub goal_width: f32,
    /// Angle of the first goal's centre (radians)
    pub goal_offset: f32,
    pub wall_thickness: f32,
    pub paddle_half_length: f32,
    pub paddle_half_depth: f32,
    pub paddles_per_side: usize,
    pub puck_count: usize,
    /// How close to a spoke angle counts as being at a junction (radians)
    pub junction_tolerance: f32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            outer_radius: 400.0,
            hub_radius: 60.0,
            rings: vec![160.0, 250.0, 340.0],
            spoke_count: 6,
            spoke_offset: 0.0,
            goal_count: 4,
            goal_width: 0.6,
            goal_offset: TAU / 8.0,
            wall_thickness: 8.0,
            paddle_half_length: 28.0,
            paddle_half_depth: 6.0,
            paddles_per_side: 2,
            puck_count: 2,
            junction_tolerance: 0.05,
        }
    }
}

/// Arena variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum ArenaConfig {
    Table(TableConfig),
    Ring(RingConfig),
}

impl RingConfig {
    /// Check the geometry on its own; the rail graph relies on this
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ring.outer_radius", self.outer_radius)?;
        positive("ring.hub_radius", self.hub_radius)?;
        if self.hub_radius >= self.outer_radius {
            return Err(ConfigError::OutOfRange {
                field: "ring.hub_radius",
                value: self.hub_radius,
                range: "below ring.outer_radius",
            });
        }
        if self.rings.is_empty() {
            return Err(ConfigError::EmptyRings);
        }
        let mut previous = self.hub_radius;
        for &radius in &self.rings {
            positive("ring.rings", radius)?;
            if radius <= previous || radius >= self.outer_radius {
                return Err(ConfigError::UnsortedRings {
                    hub: self.hub_radius,
                    outer: self.outer_radius,
                });
            }
            previous = radius;
        }
        if self.goal_count == 0 {
            return Err(ConfigError::NonPositive { field: "ring.goal_count", value: 0.0 });
        }
        positive("ring.goal_width", self.goal_width)?;
        if self.goal_width * self.goal_count as f32 >= TAU {
            return Err(ConfigError::OverlappingGoals {
                count: self.goal_count,
                width: self.goal_width,
            });
        }
        positive("ring.wall_thickness", self.wall_thickness)?;
        positive("ring.paddle_half_length", self.paddle_half_length)?;
        positive("ring.paddle_half_depth", self.paddle_half_depth)?;
        if self.paddles_per_side == 0 {
            return Err(ConfigError::NonPositive { field: "ring.paddles_per_side", value: 0.0 });
        }
        if self.puck_count == 0 {
            return Err(ConfigError::NonPositive { field: "ring.puck_count", value: 0.0 });
        }
        positive("ring.junction_tolerance", self.junction_tolerance)?;
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig::Table(TableConfig::default())
    }
}

/// Projectile motion and contact response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub projectile_radius: f32,
    /// Below this speed a projectile comes to rest
    pub min_speed: f32,
    pub max_speed: f32,
    /// Exponential decay rate of speed (1/s)
    pub friction: f32,
    /// Speed kept after bouncing off a rail or wall
    pub wall_restitution: f32,
    /// Speed kept after bouncing off an idle actor
    pub bounce_restitution: f32,
    pub substeps: u32,
    /// Longer host deltas are clamped to this (seconds)
    pub max_tick_delta: f32,
    pub serve_speed: f32,
    /// Half-angle of the random serve cone (radians)
    pub serve_cone: f32,
    /// Same actor cannot hit the same projectile again within this window (s)
    pub debounce_window: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            projectile_radius: 8.0,
            min_speed: 20.0,
            max_speed: 900.0,
            friction: 0.35,
            wall_restitution: 0.85,
            bounce_restitution: 0.7,
            substeps: 4,
            max_tick_delta: 0.1,
            serve_speed: 160.0,
            serve_cone: 0.35,
            debounce_window: 0.1,
        }
    }
}

/// Kick/swing timing and strength
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub forward_duration: f32,
    pub power_duration: f32,
    pub cooldown: f32,
    /// Impulse speed at the start and end of an action
    pub min_power: f32,
    /// Impulse speed at the action midpoint
    pub max_power: f32,
    pub forward_multiplier: f32,
    pub power_multiplier: f32,
    /// Terminal angle of a forward action (radians)
    pub forward_sweep: f32,
    /// Depth of the power action's pull-back (radians)
    pub power_pullback: f32,
    /// Terminal angle of a power action, past rest (radians)
    pub power_overshoot: f32,
    /// Share of a power action spent pulling back
    pub power_windup: f32,
    /// Shot angle gained by striking with the very edge (radians)
    pub edge_deflection: f32,
    /// Half-width of the random shot jitter (radians)
    pub jitter: f32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            forward_duration: 0.15,
            power_duration: 0.3,
            cooldown: 0.25,
            min_power: 250.0,
            max_power: 700.0,
            forward_multiplier: 1.0,
            power_multiplier: 1.5,
            forward_sweep: 1.2,
            power_pullback: 0.6,
            power_overshoot: 1.6,
            power_windup: 0.35,
            edge_deflection: 0.6,
            jitter: 0.05,
        }
    }
}

/// Opponent AI tuning shared by every difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Extra reach beyond touching at which the AI considers striking
    pub action_range: f32,
    /// Wobble amplitude at accuracy 0.5 (world units)
    pub base_wobble: f32,
    /// Top rod slide speed (units/s)
    pub rod_speed: f32,
    /// Top paddle speed along a ring (units/s)
    pub rail_speed: f32,
    /// Look-ahead at full accuracy (seconds)
    pub prediction_horizon: f32,
    /// Patrol swing either side of the defended centre (radians)
    pub patrol_amplitude: f32,
    /// Patrol angular frequency (rad/s)
    pub patrol_frequency: f32,
    /// Scores below this are not treated as threats
    pub threat_threshold: f32,
    /// Chance an attacking actor picks the power action
    pub power_chance: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            action_range: 18.0,
            base_wobble: 10.0,
            rod_speed: 600.0,
            rail_speed: 520.0,
            prediction_horizon: 0.8,
            patrol_amplitude: 0.25,
            patrol_frequency: 1.3,
            threat_threshold: 0.15,
            power_chance: 0.35,
        }
    }
}

/// Phase durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub countdown_from: u8,
    /// Seconds per countdown number
    pub countdown_step: f32,
    /// Seconds the score event is held before the re-serve
    pub celebration: f32,
    /// Seconds a goal stays flagged as recently scored
    pub goal_flash: f32,
    /// Seconds every projectile may sit at rest before it is re-served
    pub stall_timeout: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            countdown_step: 1.0,
            celebration: 1.5,
            goal_flash: 1.0,
            stall_timeout: 4.0,
        }
    }
}

/// Complete immutable parameter set of one match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub arena: ArenaConfig,
    pub physics: PhysicsConfig,
    pub action: ActionConfig,
    pub ai: AiConfig,
    pub timing: TimingConfig,
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, range: "[0, inf)" })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, range: "(0, 1]" })
    }
}

impl MatchConfig {
    /// Classic table with four rods per side
    pub fn foosball() -> Self {
        Self::default()
    }

    /// Ring-and-spoke arena with goal sectors on the outer wall
    pub fn horde_defense() -> Self {
        Self {
            arena: ArenaConfig::Ring(RingConfig::default()),
            physics: PhysicsConfig {
                friction: 0.2,
                max_speed: 800.0,
                serve_speed: 140.0,
                ..PhysicsConfig::default()
            },
            action: ActionConfig {
                forward_sweep: 0.9,
                edge_deflection: 0.45,
                ..ActionConfig::default()
            },
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of independently assignable actor groups on the Player side
    pub fn control_groups(&self) -> usize {
        match &self.arena {
            ArenaConfig::Table(_) => 2,
            ArenaConfig::Ring(ring) => ring.paddles_per_side,
        }
    }

    /// Reject anything that would produce NaN or degenerate geometry
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.arena {
            ArenaConfig::Table(table) => self.validate_table(table)?,
            ArenaConfig::Ring(ring) => ring.validate()?,
        }

        let p = &self.physics;
        positive("physics.projectile_radius", p.projectile_radius)?;
        positive("physics.min_speed", p.min_speed)?;
        positive("physics.max_speed", p.max_speed)?;
        if p.min_speed >= p.max_speed {
            return Err(ConfigError::OutOfRange {
                field: "physics.min_speed",
                value: p.min_speed,
                range: "below physics.max_speed",
            });
        }
        positive("physics.friction", p.friction)?;
        unit_interval("physics.wall_restitution", p.wall_restitution)?;
        unit_interval("physics.bounce_restitution", p.bounce_restitution)?;
        if p.substeps == 0 {
            return Err(ConfigError::NonPositive { field: "physics.substeps", value: 0.0 });
        }
        positive("physics.max_tick_delta", p.max_tick_delta)?;
        if p.serve_speed < p.min_speed || p.serve_speed > p.max_speed {
            return Err(ConfigError::OutOfRange {
                field: "physics.serve_speed",
                value: p.serve_speed,
                range: "[physics.min_speed, physics.max_speed]",
            });
        }
        non_negative("physics.serve_cone", p.serve_cone)?;
        non_negative("physics.debounce_window", p.debounce_window)?;

        let a = &self.action;
        positive("action.forward_duration", a.forward_duration)?;
        positive("action.power_duration", a.power_duration)?;
        non_negative("action.cooldown", a.cooldown)?;
        non_negative("action.min_power", a.min_power)?;
        if a.max_power < a.min_power {
            return Err(ConfigError::OutOfRange {
                field: "action.max_power",
                value: a.max_power,
                range: "at least action.min_power",
            });
        }
        positive("action.forward_multiplier", a.forward_multiplier)?;
        positive("action.power_multiplier", a.power_multiplier)?;
        positive("action.forward_sweep", a.forward_sweep)?;
        non_negative("action.power_pullback", a.power_pullback)?;
        positive("action.power_overshoot", a.power_overshoot)?;
        if !(a.power_windup > 0.0 && a.power_windup < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "action.power_windup",
                value: a.power_windup,
                range: "(0, 1)",
            });
        }
        non_negative("action.edge_deflection", a.edge_deflection)?;
        non_negative("action.jitter", a.jitter)?;

        let ai = &self.ai;
        non_negative("ai.action_range", ai.action_range)?;
        non_negative("ai.base_wobble", ai.base_wobble)?;
        positive("ai.rod_speed", ai.rod_speed)?;
        positive("ai.rail_speed", ai.rail_speed)?;
        positive("ai.prediction_horizon", ai.prediction_horizon)?;
        non_negative("ai.patrol_amplitude", ai.patrol_amplitude)?;
        non_negative("ai.patrol_frequency", ai.patrol_frequency)?;
        non_negative("ai.threat_threshold", ai.threat_threshold)?;
        if !(0.0..=1.0).contains(&ai.power_chance) {
            return Err(ConfigError::OutOfRange {
                field: "ai.power_chance",
                value: ai.power_chance,
                range: "[0, 1]",
            });
        }

        let t = &self.timing;
        positive("timing.countdown_step", t.countdown_step)?;
        non_negative("timing.celebration", t.celebration)?;
        non_negative("timing.goal_flash", t.goal_flash)?;
        positive("timing.stall_timeout", t.stall_timeout)?;

        Ok(())
    }

    fn validate_table(&self, table: &TableConfig) -> Result<(), ConfigError> {
        positive("table.width", table.width)?;
        positive("table.length", table.length)?;
        positive("table.goal_width", table.goal_width)?;
        if table.goal_width >= table.width {
            return Err(ConfigError::OutOfRange {
                field: "table.goal_width",
                value: table.goal_width,
                range: "narrower than table.width",
            });
        }
        positive("table.wall_thickness", table.wall_thickness)?;
        positive("table.figure_half_width", table.figure_half_width)?;
        positive("table.figure_half_depth", table.figure_half_depth)?;
        non_negative("table.leg_reach", table.leg_reach)?;
        for &line in &table.rod_lines {
            if !(-1.0..1.0).contains(&line) || line == -1.0 {
                return Err(ConfigError::OutOfRange {
                    field: "table.rod_lines",
                    value: line,
                    range: "(-1, 1)",
                });
            }
        }
        for &spacing in &table.figure_spacing {
            non_negative("table.figure_spacing", spacing)?;
        }
        if self.physics.projectile_radius * 2.0 >= table.goal_width {
            return Err(ConfigError::OutOfRange {
                field: "physics.projectile_radius",
                value: self.physics.projectile_radius,
                range: "smaller than half of table.goal_width",
            });
        }
        Ok(())
    }
}
