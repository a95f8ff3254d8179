//! Air tricks: spin, grab, kickflip and shove-it.
//!
//! Tricks are cosmetic apart from scoring. Triggers only work while airborne; the pose
//! values are always computed so an optional rig can mirror them.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::config::SkateConfig;
use crate::input::SkateIntents;
use crate::math::smoothing_factor;

/// Slack for float accumulation when counting turns and finishing the flip sweep.
const TRICK_EPSILON: f32 = 1e-3;

/// Cosmetic pose of the board and body, in radians / meters / blend units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CosmeticPose {
    /// Grab tilt of the board around its long axis.
    pub board_tilt: f32,
    /// Kickflip roll of the board, one full turn per flip.
    pub flip_angle: f32,
    /// Kickflip lift of the board above the feet.
    pub flip_lift: f32,
    /// Shove-it spin of the board around the vertical axis.
    pub shove_angle: f32,
    /// Knee bend blend in [0, 1].
    pub crouch: f32,
}

/// Optional visual rig driven by the trick state. Physics never depends on it.
pub trait CosmeticRig {
    fn apply_pose(&mut self, pose: &CosmeticPose);
}

/// Air trick accumulators and flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrickTimers {
    /// Signed rotation spun this air period (radians). Cleared on landing only.
    pub spin_accum: f32,
    /// Time the current spin press has been held.
    pub spin_elapsed: f32,
    /// Time the current grab press has been held.
    pub grab_elapsed: f32,
    pub grab_achieved: bool,
    pub flip_elapsed: f32,
    pub flip_in_progress: bool,
    /// A kickflip finished this air period.
    pub flip_completed: bool,
    /// A kickflip was started this air period (one per air period).
    pub flip_used: bool,
    /// Flip intent on the previous frame, for edge detection.
    pub flip_was_held: bool,
    /// Current shove-it spin speed (rad/s).
    pub shove_speed: f32,
}

/// Scored result of one landing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandingScore {
    pub label: String,
    pub points: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrickState {
    pub timers: TrickTimers,
    pub pose: CosmeticPose,
}

impl TrickState {
    /// Whole turns spun this air period.
    pub fn spin_count(&self) -> u32 {
        (self.timers.spin_accum.abs() / TAU + TRICK_EPSILON).floor() as u32
    }

    /// Advance the trick state one frame. Returns the yaw change from spinning.
    pub fn update(
        &mut self,
        intents: &SkateIntents,
        airborne: bool,
        config: &SkateConfig,
        dt: f32,
    ) -> f32 {
        let mut yaw_delta = 0.0;
        let t = &mut self.timers;
        let pose = &mut self.pose;

        // --- Spin ---
        if airborne && intents.spin {
            yaw_delta = config.spin_rate * dt;
            t.spin_accum += yaw_delta;
            t.spin_elapsed += dt;
        } else {
            t.spin_elapsed = 0.0;
        }

        // --- Grab ---
        if airborne && intents.grab {
            t.grab_elapsed += dt;
            let wobble = (t.grab_elapsed * config.grab_wobble_rate).sin();
            pose.board_tilt = config.grab_tilt * (0.75 + 0.25 * wobble);
            if t.grab_elapsed >= config.grab_threshold {
                t.grab_achieved = true;
            }
        } else {
            t.grab_elapsed = 0.0;
            pose.board_tilt *= 1.0 - smoothing_factor(config.tilt_return_rate, dt);
        }

        // --- Kickflip (edge triggered, one per air period) ---
        let flip_pressed = intents.flip && !t.flip_was_held;
        t.flip_was_held = intents.flip;
        if airborne && flip_pressed && !t.flip_in_progress && !t.flip_used {
            t.flip_in_progress = true;
            t.flip_used = true;
            t.flip_elapsed = 0.0;
        }
        if t.flip_in_progress {
            t.flip_elapsed += dt;
            if t.flip_elapsed >= config.flip_duration - TRICK_EPSILON {
                t.flip_in_progress = false;
                t.flip_completed = true;
                pose.flip_angle = TAU;
                pose.flip_lift = 0.0;
            } else {
                let progress = t.flip_elapsed / config.flip_duration;
                pose.flip_angle = TAU * progress;
                pose.flip_lift = config.flip_lift * (PI * progress).sin();
            }
        }

        // --- Shove-it ---
        if airborne && intents.shove {
            t.shove_speed = config.shove_rate;
        } else {
            t.shove_speed *= 1.0 - smoothing_factor(config.shove_ease, dt);
        }
        pose.shove_angle = (pose.shove_angle + t.shove_speed * dt).rem_euclid(TAU);

        yaw_delta
    }

    /// Tally what the current air period would score if it landed now.
    pub fn tally(&self, config: &SkateConfig) -> Option<LandingScore> {
        let mut parts: Vec<String> = Vec::new();
        let mut points = 0u32;

        if self.timers.flip_completed {
            parts.push("Kickflip".to_string());
            points += config.flip_points;
        }
        let spins = self.spin_count();
        if spins > 0 {
            parts.push(format!("{spins}x Spin"));
            points += spins * config.spin_points;
        }
        if self.timers.grab_achieved {
            parts.push("Grab".to_string());
            points += config.grab_points;
        }

        (points > 0).then(|| LandingScore {
            label: parts.join(" + "),
            points,
        })
    }

    /// Back on the ground: clear air-only accumulators and snap rotations to neutral.
    /// The grab tilt keeps easing out on its own.
    pub fn land(&mut self) {
        let flip_was_held = self.timers.flip_was_held;
        self.timers = TrickTimers {
            flip_was_held,
            ..Default::default()
        };
        self.pose.flip_angle = 0.0;
        self.pose.flip_lift = 0.0;
        self.pose.shove_angle = 0.0;
    }
}
