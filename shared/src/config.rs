//! Tuning for the skater and the follow camera.
//!
//! Every gameplay number lives here so the controller logic has no magic constants.
//! The client can override the defaults with a RON file (see `load_skate_config_from_file`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rectangular playable area on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: -60.0,
            max_x: 60.0,
            min_z: -60.0,
            max_z: 60.0,
        }
    }
}

impl WorldBounds {
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// Third-person follow camera settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Distance behind the character along the smoothed heading.
    pub distance: f32,
    /// Height of the camera above the character origin.
    pub height: f32,
    /// Small sideways offset (positive = right of the character).
    pub lateral_offset: f32,
    /// Height of the aim point above the character origin.
    pub look_height: f32,
    /// Horizontal speed above which the heading follows velocity.
    pub heading_speed_threshold: f32,
    /// Heading smoothing rate (1/s).
    pub heading_smoothing: f32,
    /// Exponential stiffness of the camera position (1/s).
    pub position_stiffness: f32,
    /// Exponential stiffness of the aim point (1/s).
    pub aim_stiffness: f32,
    /// Maximum yaw nudge from the camera rotate intents (radians).
    pub nudge_max: f32,
    /// How fast the nudge eases toward its target (1/s).
    pub nudge_rate: f32,
    /// Distance kept between the camera and an obstruction.
    pub collision_padding: f32,
    /// The camera never gets closer than this to the pivot.
    pub min_distance: f32,
    /// Field of view at standstill (radians).
    pub base_fov: f32,
    /// Extra field of view per m/s of horizontal speed (radians).
    pub fov_per_speed: f32,
    /// Upper clamp for the field of view (radians).
    pub max_fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 6.0,
            height: 2.6,
            lateral_offset: 0.4,
            look_height: 1.1,
            heading_speed_threshold: 0.75,
            heading_smoothing: 4.0,
            position_stiffness: 6.0,
            aim_stiffness: 10.0,
            nudge_max: 0.6,
            nudge_rate: 3.0,
            collision_padding: 0.3,
            min_distance: 0.5,
            base_fov: 60.0_f32.to_radians(),
            fov_per_speed: 1.2_f32.to_radians(),
            max_fov: 80.0_f32.to_radians(),
        }
    }
}

/// All skater tuning values. Passed to the controller at construction and never mutated.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkateConfig {
    // --- Movement ---
    /// Horizontal speed cap in m/s.
    pub max_speed: f32,
    /// Forward/back acceleration along the heading in m/s^2.
    pub acceleration: f32,
    /// Extra acceleration from the push intent in m/s^2.
    pub push_acceleration: f32,
    /// Push only works below this fraction of `max_speed`.
    pub push_speed_fraction: f32,
    /// Rolling deceleration with no input in m/s^2.
    pub friction: f32,
    /// Turn rate at standstill in rad/s.
    pub turn_speed: f32,
    /// Turn authority floor at max speed.
    pub min_turn_authority: f32,
    /// Gravity magnitude in m/s^2 (applied downward).
    pub gravity: f32,
    /// Upward velocity of a jump or rail pop in m/s.
    pub jump_force: f32,
    /// Upward position nudge on jump so the same-frame ground check does not cancel it.
    pub jump_nudge: f32,

    // --- Body / ground probe ---
    pub character_height: f32,
    /// Extra probe length beyond the character height.
    pub probe_margin: f32,
    /// How far above the ground the feet may be and still snap.
    pub ground_snap_tolerance: f32,
    /// Scales the downhill pull on slopes.
    pub slope_factor: f32,

    // --- Grinding ---
    /// Minimum horizontal speed to catch a rail.
    pub min_grind_speed: f32,
    /// Max horizontal distance from the rail segment to catch it.
    pub capture_radius: f32,
    /// Max vertical offset from grind height to catch a rail.
    pub capture_height_tolerance: f32,
    /// Gap between the rail top and the board.
    pub grind_clearance: f32,
    /// Exponential speed decay while grinding (1/s).
    pub grind_friction: f32,
    /// Speed added along the rail when popping off.
    pub pop_boost: f32,
    /// Time after leaving a rail before another capture is allowed.
    pub regrind_cooldown: f32,

    // --- Tricks ---
    /// Spin yaw rate in rad/s.
    pub spin_rate: f32,
    /// Points per full spin rotation.
    pub spin_points: u32,
    /// Grab must be held this long (s) to score.
    pub grab_threshold: f32,
    pub grab_points: u32,
    /// Peak board tilt while grabbing (radians).
    pub grab_tilt: f32,
    /// Oscillation rate of the grab tilt (rad/s).
    pub grab_wobble_rate: f32,
    /// Rate at which tilts return to neutral (1/s).
    pub tilt_return_rate: f32,
    /// Duration of the kickflip sweep in seconds.
    pub flip_duration: f32,
    /// Peak board lift during a kickflip.
    pub flip_lift: f32,
    pub flip_points: u32,
    /// Shove-it spin rate while held (rad/s).
    pub shove_rate: f32,
    /// Rate at which the shove-it spin eases down after release (1/s).
    pub shove_ease: f32,

    // --- Crouch (cosmetic) ---
    pub crouch_idle: f32,
    pub crouch_moving: f32,
    pub crouch_rate_grounded: f32,
    pub crouch_rate_airborne: f32,

    pub bounds: WorldBounds,
    pub camera: CameraConfig,
}

impl Default for SkateConfig {
    fn default() -> Self {
        Self {
            max_speed: 12.0,
            acceleration: 9.0,
            push_acceleration: 8.0,
            push_speed_fraction: 0.6,
            friction: 3.0,
            turn_speed: 2.8,
            min_turn_authority: 0.3,
            gravity: 20.0,
            jump_force: 7.5,
            jump_nudge: 0.05,

            character_height: 1.8,
            probe_margin: 0.4,
            ground_snap_tolerance: 0.2,
            slope_factor: 1.5,

            min_grind_speed: 2.0,
            capture_radius: 0.6,
            capture_height_tolerance: 0.45,
            grind_clearance: 0.05,
            grind_friction: 0.15,
            pop_boost: 1.5,
            regrind_cooldown: 0.3,

            spin_rate: std::f32::consts::TAU,
            spin_points: 100,
            grab_threshold: 0.3,
            grab_points: 150,
            grab_tilt: 0.45,
            grab_wobble_rate: 9.0,
            tilt_return_rate: 10.0,
            flip_duration: 0.55,
            flip_lift: 0.25,
            flip_points: 200,
            shove_rate: 12.0,
            shove_ease: 4.0,

            crouch_idle: 0.15,
            crouch_moving: 0.45,
            crouch_rate_grounded: 8.0,
            crouch_rate_airborne: 4.0,

            bounds: WorldBounds::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl SkateConfig {
    /// Half of the character height; the ground probe starts this far above the feet.
    #[inline]
    pub fn probe_half_height(&self) -> f32 {
        self.character_height * 0.5
    }

    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("max_speed", self.max_speed),
            ("gravity", self.gravity),
            ("character_height", self.character_height),
            ("flip_duration", self.flip_duration),
            ("spin_rate", self.spin_rate),
            ("camera.distance", self.camera.distance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number (got {value})"));
            }
        }

        let non_negative = [
            ("acceleration", self.acceleration),
            ("push_acceleration", self.push_acceleration),
            ("friction", self.friction),
            ("turn_speed", self.turn_speed),
            ("jump_force", self.jump_force),
            ("ground_snap_tolerance", self.ground_snap_tolerance),
            ("capture_radius", self.capture_radius),
            ("grind_friction", self.grind_friction),
            ("grab_threshold", self.grab_threshold),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be zero or positive (got {value})"));
            }
        }

        if !(0.0..=1.0).contains(&self.push_speed_fraction) {
            return Err(format!(
                "push_speed_fraction must be within [0, 1] (got {})",
                self.push_speed_fraction
            ));
        }

        let b = &self.bounds;
        if !(b.min_x < b.max_x && b.min_z < b.max_z) {
            return Err(format!(
                "bounds rectangle is empty or inverted: x [{}, {}], z [{}, {}]",
                b.min_x, b.max_x, b.min_z, b.max_z
            ));
        }

        if self.camera.max_fov < self.camera.base_fov {
            return Err("camera.max_fov must not be smaller than camera.base_fov".to_string());
        }

        Ok(())
    }
}

/// Parse a config from RON text. Missing fields keep their defaults.
pub fn parse_skate_config(text: &str) -> Result<SkateConfig, String> {
    let config: SkateConfig =
        ron::from_str(text).map_err(|e| format!("RON parse failed: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// Load a config from a RON file on disk.
pub fn load_skate_config_from_file(path: impl AsRef<Path>) -> Result<SkateConfig, String> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
    parse_skate_config(&text).map_err(|e| format!("{path:?}: {e}"))
}
