//! Small math helpers shared by the skater and the camera.

use bevy::prelude::*;

/// Get forward and right vectors from a yaw heading.
/// In Bevy: +X right, +Y up, -Z forward.
#[inline]
pub fn basis_from_yaw(yaw: f32) -> (Vec3, Vec3) {
    let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());
    (forward, right)
}

/// Yaw whose forward vector points along `dir` (XZ only).
#[inline]
pub fn yaw_from_direction(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}

/// Horizontal (XZ) part of a vector.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

pub fn shortest_angle_diff(target: f32, current: f32) -> f32 {
    let diff = target - current;
    (diff + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU) - std::f32::consts::PI
}

pub fn wrap_angle(a: f32) -> f32 {
    (a + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU) - std::f32::consts::PI
}

/// Frame-rate independent blend factor: `1 - e^(-rate * dt)`.
#[inline]
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_round_trips_through_forward() {
        for yaw in [0.0, 0.7, -2.1, 3.0] {
            let (forward, _) = basis_from_yaw(yaw);
            assert!(shortest_angle_diff(yaw_from_direction(forward), yaw).abs() < 1e-5);
        }
    }

    #[test]
    fn shortest_angle_wraps() {
        let d = shortest_angle_diff(-3.0, 3.0);
        assert!((d - (std::f32::consts::TAU - 6.0)).abs() < 1e-5);
    }
}
