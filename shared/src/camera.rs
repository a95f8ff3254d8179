//! Third-person follow camera for the skater.
//!
//! Runs after the skater update each frame. The camera trails behind a smoothed
//! heading rather than the skater's instantaneous facing, so spins and quick
//! steering do not whip it around.

use bevy::prelude::*;

use crate::{
    config::CameraConfig,
    math::{
        basis_from_yaw, horizontal, shortest_angle_diff, smoothing_factor, wrap_angle,
        yaw_from_direction,
    },
    spatial::{SpatialQuery, TagFilter},
};

/// What the camera follows, sampled after physics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowTarget {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Character facing, used as the initial heading.
    pub yaw: f32,
}

/// Camera output for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub aim_point: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
}

impl CameraPose {
    /// Level look-at rotation toward the aim point.
    pub fn rotation(&self) -> Quat {
        let dir = self.aim_point - self.position;
        if dir.length_squared() < 1e-8 {
            return Quat::IDENTITY;
        }
        Transform::from_translation(self.position)
            .looking_at(self.aim_point, Vec3::Y)
            .rotation
    }
}

#[derive(Clone, Debug)]
pub struct FollowCamera {
    config: CameraConfig,
    position: Vec3,
    aim_point: Vec3,
    heading: f32,
    /// Extra yaw offset from the rotate-left/right intents.
    nudge: f32,
    fov: f32,
    initialized: bool,
}

impl FollowCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            position: Vec3::ZERO,
            aim_point: Vec3::ZERO,
            heading: 0.0,
            nudge: 0.0,
            fov: config.base_fov,
            initialized: false,
        }
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn nudge(&self) -> f32 {
        self.nudge
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            aim_point: self.aim_point,
            fov: self.fov,
        }
    }

    /// Advance the camera one frame.
    ///
    /// `nudge_input` is -1, 0 or +1 from the camera rotate intents.
    pub fn update(
        &mut self,
        dt: f32,
        target: &FollowTarget,
        nudge_input: f32,
        world: &impl SpatialQuery,
    ) -> CameraPose {
        let cfg = self.config;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let first = !self.initialized;

        // --- Heading ---
        let flat = horizontal(target.velocity);
        let speed = flat.length();
        if first {
            self.heading = target.yaw;
        }
        if speed > cfg.heading_speed_threshold {
            let desired = yaw_from_direction(flat);
            if first {
                self.heading = desired;
            } else {
                let t = smoothing_factor(cfg.heading_smoothing, dt);
                let turn = shortest_angle_diff(desired, self.heading) * t;
                self.heading = wrap_angle(self.heading + turn);
            }
        }

        // --- Nudge ---
        let nudge_target = nudge_input.clamp(-1.0, 1.0) * cfg.nudge_max;
        self.nudge += (nudge_target - self.nudge) * smoothing_factor(cfg.nudge_rate, dt);

        // --- Desired pose ---
        let (forward, right) = basis_from_yaw(self.heading + self.nudge);
        let pivot = target.position + Vec3::Y * cfg.look_height;
        let mut desired = target.position - forward * cfg.distance
            + Vec3::Y * cfg.height
            + right * cfg.lateral_offset;

        // --- Line of sight ---
        let to_camera = desired - pivot;
        let full = to_camera.length();
        if full > 1e-4 {
            let dir = to_camera / full;
            if let Some(hit) = world.probe(pivot, dir, full, TagFilter::Solid) {
                let pulled = (hit.distance - cfg.collision_padding).max(cfg.min_distance).min(full);
                desired = pivot + dir * pulled;
            }
        }

        // --- Smooth ---
        if first {
            self.position = desired;
            self.aim_point = pivot;
            self.initialized = true;
        } else {
            let t = smoothing_factor(cfg.position_stiffness, dt);
            self.position = self.position.lerp(desired, t);
            self.aim_point = self.aim_point.lerp(pivot, smoothing_factor(cfg.aim_stiffness, dt));
        }

        self.fov = (cfg.base_fov + speed * cfg.fov_per_speed).min(cfg.max_fov);

        self.pose()
    }
}
