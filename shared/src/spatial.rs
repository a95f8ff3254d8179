//! Ray probes against static, tagged scene geometry.
//!
//! The skater uses downward probes for ground contact and the camera uses line-of-sight
//! probes to avoid clipping through scenery. Geometry is a flat list of oriented boxes:
//! ramps are rotated boxes and rails get a thin box along their segment.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rail::Rail;

/// What a surface is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceTag {
    /// Walkable floor, ramps, ledges.
    Ground,
    /// Grindable rail (also walkable).
    Rail,
    /// Decorative or blocking geometry the skater never stands on.
    Obstacle,
}

/// Which tags a probe is interested in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagFilter {
    /// Ground and rails.
    Walkable,
    /// Everything.
    Solid,
    Only(SurfaceTag),
}

impl TagFilter {
    pub fn accepts(self, tag: SurfaceTag) -> bool {
        match self {
            TagFilter::Walkable => matches!(tag, SurfaceTag::Ground | SurfaceTag::Rail),
            TagFilter::Solid => true,
            TagFilter::Only(only) => only == tag,
        }
    }
}

/// Nearest surface hit along a probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub point: Vec3,
    /// Unit surface normal facing the probe origin.
    pub normal: Vec3,
    /// Distance from the probe origin along the (normalized) direction.
    pub distance: f32,
    pub tag: SurfaceTag,
}

/// Ray-cast oracle over static geometry.
pub trait SpatialQuery {
    /// Nearest accepted surface along `direction` within `max_distance`, or `None`.
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: TagFilter,
    ) -> Option<ProbeHit>;
}

/// A world that has nothing in it. Every probe misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyWorld;

impl SpatialQuery for EmptyWorld {
    fn probe(&self, _: Vec3, _: Vec3, _: f32, _: TagFilter) -> Option<ProbeHit> {
        None
    }
}

/// An oriented box in the static scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticSurface {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
    pub tag: SurfaceTag,
}

impl StaticSurface {
    pub fn cuboid(center: Vec3, half_extents: Vec3, tag: SurfaceTag) -> Self {
        Self {
            center,
            half_extents,
            rotation: Quat::IDENTITY,
            tag,
        }
    }

    /// Slab test in box-local space. Returns distance and world normal of the entry face.
    /// Rays starting inside the box do not hit it.
    fn raycast(&self, origin: Vec3, dir: Vec3) -> Option<(f32, Vec3)> {
        let inv = self.rotation.inverse();
        let local_origin = inv * (origin - self.center);
        let local_dir = inv * dir;

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut near_axis = 0usize;

        for axis in 0..3 {
            let o = local_origin[axis];
            let d = local_dir[axis];
            let h = self.half_extents[axis];
            if d.abs() < 1e-8 {
                if o.abs() > h {
                    return None;
                }
                continue;
            }
            let mut t1 = (-h - o) / d;
            let mut t2 = (h - o) / d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            if t1 > t_near {
                t_near = t1;
                near_axis = axis;
            }
            t_far = t_far.min(t2);
            if t_near > t_far {
                return None;
            }
        }

        if t_near < 0.0 || !t_near.is_finite() {
            return None;
        }

        let mut local_normal = Vec3::ZERO;
        local_normal[near_axis] = -local_dir[near_axis].signum();
        Some((t_near, self.rotation * local_normal))
    }
}

/// Static level geometry, built once and only read afterwards.
#[derive(Resource, Clone, Debug, Default)]
pub struct StaticScene {
    surfaces: Vec<StaticSurface>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, surface: StaticSurface) {
        self.surfaces.push(surface);
    }

    /// Add a thin rail-tagged box along the rail so the skater can land on it.
    /// Degenerate rails are skipped.
    pub fn add_rail(&mut self, rail: &Rail) {
        let Some(dir) = rail.direction() else {
            return;
        };
        let length = rail.length();
        self.insert(StaticSurface {
            center: (rail.start + rail.end) * 0.5,
            half_extents: Vec3::new(length * 0.5, rail.radius, rail.radius),
            rotation: Quat::from_rotation_arc(Vec3::X, dir),
            tag: SurfaceTag::Rail,
        });
    }

    pub fn surfaces(&self) -> &[StaticSurface] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl SpatialQuery for StaticScene {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: TagFilter,
    ) -> Option<ProbeHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || !(max_distance > 0.0) {
            return None;
        }

        let mut best: Option<ProbeHit> = None;
        for surface in self.surfaces.iter().filter(|s| filter.accepts(s.tag)) {
            let Some((distance, normal)) = surface.raycast(origin, dir) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            // Strictly closer, so the first surface wins ties.
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(ProbeHit {
                    point: origin + dir * distance,
                    normal,
                    distance,
                    tag: surface.tag,
                });
            }
        }
        best
    }
}
