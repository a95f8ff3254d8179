//! Grindable rails and the grind state carried by the skater.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Rails shorter than this are treated as degenerate and never captured.
pub const MIN_RAIL_LENGTH: f32 = 1e-3;

/// A grindable line segment in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rail {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Rail {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self { start, end, radius }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Unit direction from start to end, `None` for a degenerate segment.
    pub fn direction(&self) -> Option<Vec3> {
        let delta = self.end - self.start;
        let length = delta.length();
        (length > MIN_RAIL_LENGTH).then(|| delta / length)
    }

    /// Point on the rail centerline at normalized parameter `t`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start.lerp(self.end, t)
    }

    /// Height the board rides at for parameter `t`.
    pub fn grind_height_at(&self, t: f32, clearance: f32) -> f32 {
        self.point_at(t).y + self.radius + clearance
    }

    /// Closest point on the rail's XZ projection to `p`.
    /// Returns the clamped parameter and the horizontal distance.
    pub fn closest_point_horizontal(&self, p: Vec3) -> (f32, f32) {
        let a = Vec2::new(self.start.x, self.start.z);
        let b = Vec2::new(self.end.x, self.end.z);
        let p = Vec2::new(p.x, p.z);
        let ab = b - a;
        let len_sq = ab.length_squared();
        let t = if len_sq > MIN_RAIL_LENGTH * MIN_RAIL_LENGTH {
            ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (t, (a + ab * t).distance(p))
    }
}

/// Active grind: the skater is locked to a rail segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrindState {
    pub rail_start: Vec3,
    pub rail_end: Vec3,
    /// Unit direction from start to end.
    pub dir: Vec3,
    pub length: f32,
    /// Normalized position along the rail, kept within [0, 1] while grinding.
    pub param: f32,
    pub radius: f32,
}

impl GrindState {
    /// Start a grind on `rail` at `param`. `None` for degenerate rails.
    pub fn on_rail(rail: &Rail, param: f32) -> Option<Self> {
        let dir = rail.direction()?;
        Some(Self {
            rail_start: rail.start,
            rail_end: rail.end,
            dir,
            length: rail.length(),
            param: param.clamp(0.0, 1.0),
            radius: rail.radius,
        })
    }

    pub fn rail(&self) -> Rail {
        Rail::new(self.rail_start, self.rail_end, self.radius)
    }

    /// Board position for the current parameter.
    pub fn position(&self, clearance: f32) -> Vec3 {
        let rail = self.rail();
        let p = rail.point_at(self.param);
        Vec3::new(p.x, rail.grind_height_at(self.param, clearance), p.z)
    }
}
