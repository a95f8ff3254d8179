//! Skater locomotion: turning, rolling, jumping, slopes, rail grinds and air tricks.
//!
//! Goals:
//! - One `update(dt)` per rendered frame, single threaded, never blocks
//! - Ground contact comes from ray probes against static tagged geometry
//! - Degenerate geometry or missed probes degrade to "airborne", never to an error
//!
//! This is an ad-hoc velocity integration model, not a rigid-body solver. The stage
//! order inside `update` matters: each stage consumes what the previous one produced.

use bevy::prelude::*;

use crate::{
    config::SkateConfig,
    events::PresentationSink,
    input::SkateIntents,
    math::{basis_from_yaw, horizontal, smoothing_factor, yaw_from_direction},
    rail::{GrindState, Rail},
    spatial::{SpatialQuery, TagFilter},
    tricks::{CosmeticRig, TrickState},
};

/// Below this horizontal speed the skater counts as standing still (crouch blend).
const MOVING_SPEED: f32 = 0.5;

/// Surfaces steeper than this (normal.y below it) are never stood on.
const MIN_GROUND_NORMAL_Y: f32 = 0.5;

/// Everything the controller owns about the skater.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterState {
    /// World-space origin of the rig, at the feet.
    pub position: Vec3,
    pub yaw: f32,
    /// Always reset to zero every frame; the skater never pitches.
    pub pitch: f32,
    /// Always reset to zero every frame; the skater never rolls.
    pub roll: f32,
    /// Rig scale. The vertical component is kept positive.
    pub scale: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    /// Normal of the last ground contact.
    pub ground_normal: Vec3,
    /// Present only while grinding.
    pub grind: Option<GrindState>,
    pub tricks: TrickState,
    /// Cosmetic knee bend in [0, 1].
    pub crouch: f32,
}

impl CharacterState {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: 0.0,
            roll: 0.0,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            grounded: false,
            ground_normal: Vec3::Y,
            grind: None,
            tricks: TrickState::default(),
            crouch: 0.0,
        }
    }

    pub fn is_grinding(&self) -> bool {
        self.grind.is_some()
    }

    pub fn horizontal_speed(&self) -> f32 {
        horizontal(self.velocity).length()
    }

    /// Rig rotation: yaw only.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.roll)
    }
}

/// The skater's locomotion and trick controller.
#[derive(Component, Clone, Debug)]
pub struct SkaterController {
    config: SkateConfig,
    state: CharacterState,
    /// Blocks rail capture for a moment after leaving a rail.
    regrind_timer: f32,
}

impl SkaterController {
    pub fn new(config: SkateConfig, spawn: Vec3, yaw: f32) -> Self {
        Self {
            config,
            state: CharacterState::new(spawn, yaw),
            regrind_timer: 0.0,
        }
    }

    pub fn config(&self) -> &SkateConfig {
        &self.config
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    /// Mutable access for spawning and tests. Gameplay goes through `update`.
    pub fn state_mut(&mut self) -> &mut CharacterState {
        &mut self.state
    }

    /// Drop the skater onto whatever walkable surface is below the spawn point.
    /// Returns `false` (and leaves the skater airborne) when nothing is below.
    pub fn snap_to_ground(&mut self, world: &impl SpatialQuery) -> bool {
        let origin = self.state.position + Vec3::Y * self.config.probe_half_height();
        match world.probe(origin, Vec3::NEG_Y, 1000.0, TagFilter::Walkable) {
            Some(hit) => {
                self.state.position.y = hit.point.y;
                self.state.velocity.y = 0.0;
                self.state.grounded = true;
                self.state.ground_normal = hit.normal;
                true
            }
            None => {
                warn!("No ground below spawn {:?}; skater starts airborne", self.state.position);
                false
            }
        }
    }

    /// Advance the skater one frame.
    ///
    /// - `world` answers ground probes
    /// - `rails` is scanned in full for grind capture
    /// - `sink` receives landing scores
    /// - `rig`, when present, mirrors the cosmetic trick pose
    pub fn update(
        &mut self,
        dt: f32,
        input: &SkateIntents,
        world: &impl SpatialQuery,
        rails: &[Rail],
        sink: &mut impl PresentationSink,
        rig: Option<&mut dyn CosmeticRig>,
    ) {
        if !(dt > 0.0) || !dt.is_finite() {
            return;
        }

        let was_grounded = self.state.grounded;
        self.regrind_timer = (self.regrind_timer - dt).max(0.0);

        // --- Turning & horizontal acceleration (free skating only) ---
        if !self.state.is_grinding() {
            self.apply_turning(input, dt);
            self.apply_horizontal(input, dt);
        }

        // --- Vertical state machine ---
        let left_rail = self.apply_vertical(input, dt);

        // --- Integrate ---
        // While grinding the rail parameter owns the position.
        if !self.state.is_grinding() {
            self.state.position += self.state.velocity * dt;
        }

        self.sanitize_orientation();

        // --- Ground & slope ---
        // Skipped on the frame the skater runs off a rail so the drop is not cancelled.
        if !self.state.is_grinding() && !left_rail {
            self.resolve_ground(world, dt);
        }

        // --- Grind capture ---
        if self.state.grounded && !self.state.is_grinding() && self.regrind_timer <= 0.0 {
            self.try_capture_rail(rails);
        }

        // --- Tricks ---
        let airborne = !self.state.grounded;
        let spin = self.state.tricks.update(input, airborne, &self.config, dt);
        self.state.yaw += spin;

        self.clamp_to_bounds();

        // --- Crouch & landing ---
        self.update_crouch(dt);
        if !was_grounded && self.state.grounded {
            self.land(sink);
        }

        if let Some(rig) = rig {
            rig.apply_pose(&self.state.tricks.pose);
        }
    }

    fn apply_turning(&mut self, input: &SkateIntents, dt: f32) {
        let steer = input.steer();
        if steer == 0.0 {
            return;
        }
        let speed = self.state.horizontal_speed();
        let authority = (1.0 - speed / self.config.max_speed).max(self.config.min_turn_authority);
        self.state.yaw += steer * self.config.turn_speed * authority * dt;
    }

    fn apply_horizontal(&mut self, input: &SkateIntents, dt: f32) {
        let cfg = &self.config;
        let (forward, _) = basis_from_yaw(self.state.yaw);
        let mut horiz = horizontal(self.state.velocity);

        let throttle = input.throttle();
        if throttle != 0.0 {
            horiz += forward * throttle * cfg.acceleration * dt;
        }

        // Pushing only helps at low speed, so it cannot be stacked forever.
        if input.push
            && self.state.grounded
            && horiz.length() < cfg.max_speed * cfg.push_speed_fraction
        {
            horiz += forward * cfg.push_acceleration * dt;
        }

        if !input.forward && !input.back && !input.push {
            let speed = horiz.length();
            if speed > 0.0 {
                let slowed = (speed - cfg.friction * dt).max(0.0);
                horiz *= slowed / speed;
            }
        }

        horiz = horiz.clamp_length_max(cfg.max_speed);
        self.state.velocity.x = horiz.x;
        self.state.velocity.z = horiz.z;
    }

    /// Returns `true` when the skater ran off the end of a rail this frame.
    fn apply_vertical(&mut self, input: &SkateIntents, dt: f32) -> bool {
        let cfg = self.config;

        if let Some(grind) = self.state.grind {
            if input.jump {
                self.pop_off_rail(&grind);
                return false;
            }
            return self.update_grind(grind, input, dt);
        }

        if input.jump && self.state.grounded {
            self.state.velocity.y = cfg.jump_force;
            self.state.grounded = false;
            self.state.position.y += cfg.jump_nudge;
        }

        if !self.state.grounded {
            self.state.velocity.y -= cfg.gravity * dt;
        }
        false
    }

    fn pop_off_rail(&mut self, grind: &GrindState) {
        let cfg = &self.config;
        let travel = if self.state.velocity.dot(grind.dir) < 0.0 { -1.0 } else { 1.0 };
        self.state.velocity += grind.dir * travel * cfg.pop_boost;
        self.state.velocity.y = cfg.jump_force;
        self.state.position.y += cfg.jump_nudge;
        self.state.grind = None;
        self.state.grounded = false;
        self.regrind_timer = cfg.regrind_cooldown;
        debug!("Popped off rail at param {:.2}", grind.param);
    }

    /// Slide along the rail. Returns `true` if the skater left the rail.
    fn update_grind(&mut self, mut grind: GrindState, input: &SkateIntents, dt: f32) -> bool {
        let cfg = &self.config;

        let mut speed = self.state.velocity.dot(grind.dir);
        grind.param += speed * dt / grind.length;

        speed *= 1.0 - smoothing_factor(cfg.grind_friction, dt);
        speed += input.throttle() * cfg.acceleration * dt;
        speed = speed.clamp(-cfg.max_speed, cfg.max_speed);
        self.state.velocity = grind.dir * speed;

        if !(0.0..=1.0).contains(&grind.param) {
            self.state.grind = None;
            self.state.grounded = false;
            self.regrind_timer = cfg.regrind_cooldown;
            debug!("Ran off the end of the rail");
            return true;
        }

        self.state.position = grind.position(cfg.grind_clearance);
        self.state.grounded = true;
        self.state.grind = Some(grind);
        false
    }

    fn sanitize_orientation(&mut self) {
        self.state.pitch = 0.0;
        self.state.roll = 0.0;
        if self.state.scale.y < 0.0 {
            self.state.scale.y = -self.state.scale.y;
        } else if self.state.scale.y == 0.0 {
            self.state.scale.y = 1.0;
        }
    }

    fn resolve_ground(&mut self, world: &impl SpatialQuery, dt: f32) {
        let cfg = self.config;
        let half = cfg.probe_half_height();
        // Start from where the feet were before this frame's drop so fast falls cannot tunnel.
        let fall = (-self.state.velocity.y * dt).max(0.0);
        let origin = self.state.position + Vec3::Y * (half + fall);
        let max_distance = cfg.character_height + cfg.probe_margin + fall;

        // Rising skaters only keep contact while already on the surface (climbing a ramp).
        // A jump or rail pop clears `grounded` first, so those still leave the ground.
        let in_contact = self.state.grounded;
        let hit = world
            .probe(origin, Vec3::NEG_Y, max_distance, TagFilter::Walkable)
            .filter(|hit| hit.distance <= half + fall + cfg.ground_snap_tolerance)
            .filter(|hit| hit.normal.y >= MIN_GROUND_NORMAL_Y)
            .filter(|_| self.state.velocity.y <= 0.0 || in_contact);

        let Some(hit) = hit else {
            self.state.grounded = false;
            return;
        };

        self.state.position.y = hit.point.y;
        self.state.velocity.y = 0.0;
        self.state.grounded = true;
        self.state.ground_normal = hit.normal;

        let n = hit.normal;
        if n.y >= 1.0 {
            return;
        }

        // Follow the surface tangent: remove the normal component, keep the rolling speed.
        let horiz = horizontal(self.state.velocity);
        let speed = horiz.length();
        if speed > 0.0 {
            let tangent = horiz - n * horiz.dot(n);
            let tangent_horiz = horizontal(tangent).length();
            if tangent_horiz > 1e-6 {
                let along = tangent * (speed / tangent_horiz);
                // Climbing carries upward speed, so the skater launches off a lip.
                self.state.velocity = along;
            }
        }

        // Steeper slopes pull harder downhill.
        let downhill = horizontal(n).normalize_or_zero();
        let pull = (1.0 - n.y) * cfg.gravity * cfg.slope_factor;
        let mut horiz = horizontal(self.state.velocity) + downhill * pull * dt;
        horiz = horiz.clamp_length_max(cfg.max_speed);
        self.state.velocity.x = horiz.x;
        self.state.velocity.z = horiz.z;
    }

    fn try_capture_rail(&mut self, rails: &[Rail]) {
        let cfg = self.config;
        if self.state.horizontal_speed() <= cfg.min_grind_speed {
            return;
        }

        let position = self.state.position;
        let mut best: Option<(&Rail, f32, f32)> = None;
        for rail in rails {
            if rail.direction().is_none() {
                continue;
            }
            let (param, distance) = rail.closest_point_horizontal(position);
            if distance > cfg.capture_radius {
                continue;
            }
            let offset = position.y - rail.grind_height_at(param, cfg.grind_clearance);
            if offset.abs() > cfg.capture_height_tolerance {
                continue;
            }
            if best.map_or(true, |(_, _, d)| distance < d) {
                best = Some((rail, param, distance));
            }
        }

        let Some((rail, param, _)) = best else {
            return;
        };
        let Some(grind) = GrindState::on_rail(rail, param) else {
            return;
        };

        let along = self.state.velocity.dot(grind.dir);
        self.state.velocity = grind.dir * along;
        self.state.velocity.y = 0.0;
        self.state.position = grind.position(cfg.grind_clearance);
        self.state.grounded = true;
        // Faces +direction even when travelling toward the start (kept as observed).
        self.state.yaw = yaw_from_direction(grind.dir);
        self.state.grind = Some(grind);
        debug!("Caught rail at param {:.2}, speed {:.2}", param, along);
    }

    fn clamp_to_bounds(&mut self) {
        let b = self.config.bounds;
        let p = &mut self.state.position;
        let v = &mut self.state.velocity;

        if p.x < b.min_x {
            p.x = b.min_x;
            v.x = v.x.max(0.0);
        } else if p.x > b.max_x {
            p.x = b.max_x;
            v.x = v.x.min(0.0);
        }
        if p.z < b.min_z {
            p.z = b.min_z;
            v.z = v.z.max(0.0);
        } else if p.z > b.max_z {
            p.z = b.max_z;
            v.z = v.z.min(0.0);
        }
    }

    fn update_crouch(&mut self, dt: f32) {
        let cfg = &self.config;
        let (target, rate) = if !self.state.grounded {
            (0.0, cfg.crouch_rate_airborne)
        } else if self.state.horizontal_speed() > MOVING_SPEED {
            (cfg.crouch_moving, cfg.crouch_rate_grounded)
        } else {
            (cfg.crouch_idle, cfg.crouch_rate_grounded)
        };
        self.state.crouch += (target - self.state.crouch) * smoothing_factor(rate, dt);
        self.state.tricks.pose.crouch = self.state.crouch;
    }

    fn land(&mut self, sink: &mut impl PresentationSink) {
        if let Some(score) = self.state.tricks.tally(&self.config) {
            info!("Landed {} for {} points", score.label, score.points);
            sink.on_trick_landed(&score.label, score.points);
        }
        self.state.tricks.land();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PresentationEvent;
    use crate::spatial::{EmptyWorld, StaticScene, StaticSurface, SurfaceTag};
    use crate::tricks::CosmeticPose;
    use std::f32::consts::TAU;

    const DT: f32 = 1.0 / 60.0;

    fn flat_scene() -> StaticScene {
        let mut scene = StaticScene::new();
        scene.insert(StaticSurface::cuboid(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(100.0, 0.5, 100.0),
            SurfaceTag::Ground,
        ));
        scene
    }

    fn grounded_skater(config: SkateConfig, scene: &StaticScene) -> SkaterController {
        let mut skater = SkaterController::new(config, Vec3::new(0.0, 0.5, 0.0), 0.0);
        assert!(skater.snap_to_ground(scene));
        skater
    }

    fn step(
        skater: &mut SkaterController,
        input: SkateIntents,
        scene: &StaticScene,
        rails: &[Rail],
        events: &mut Vec<PresentationEvent>,
    ) {
        skater.update(DT, &input, scene, rails, events, None);
    }

    #[test]
    fn grounding_is_idempotent_on_flat_ground() {
        let scene = flat_scene();
        let mut skater = grounded_skater(SkateConfig::default(), &scene);
        let mut events = Vec::new();
        let rest_y = skater.state().position.y;
        assert!(rest_y.abs() < 1e-5);
        for _ in 0..120 {
            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
            assert!((skater.state().position.y - rest_y).abs() < 1e-5);
            assert!(skater.state().grounded);
            assert_eq!(skater.state().velocity.y, 0.0);
        }
    }

    #[test]
    fn falls_onto_the_ground_from_spawn() {
        let scene = flat_scene();
        let mut skater = SkaterController::new(SkateConfig::default(), Vec3::new(0.0, 0.1, 0.0), 0.0);
        let mut events = Vec::new();
        step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
        assert!(skater.state().grounded);
        assert!(skater.state().position.y.abs() < 1e-5);
    }

    #[test]
    fn speed_never_exceeds_max() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let mut events = Vec::new();
        for dt in [1.0 / 144.0, 1.0 / 60.0, 1.0 / 20.0, 0.25] {
            let mut skater = grounded_skater(config, &scene);
            let input = SkateIntents {
                forward: true,
                push: true,
                turn_left: true,
                ..Default::default()
            };
            for _ in 0..600 {
                skater.update(dt, &input, &scene, &[], &mut events, None);
                assert!(skater.state().horizontal_speed() <= config.max_speed + 1e-4);
            }
        }
    }

    #[test]
    fn friction_stops_exactly_at_zero() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let mut skater = grounded_skater(config, &scene);
        skater.state_mut().velocity = Vec3::new(3.0, 0.0, -4.0);
        let mut events = Vec::new();

        let bound = (5.0 / (config.friction * DT)).ceil() as usize + 1;
        let mut last = skater.state().horizontal_speed();
        for _ in 0..bound {
            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
            let speed = skater.state().horizontal_speed();
            assert!(speed <= last);
            last = speed;
        }
        assert_eq!(skater.state().velocity.x, 0.0);
        assert_eq!(skater.state().velocity.z, 0.0);
    }

    #[test]
    fn push_only_works_at_low_speed() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let mut skater = grounded_skater(config, &scene);
        let mut events = Vec::new();
        let push = SkateIntents {
            push: true,
            ..Default::default()
        };
        for _ in 0..120 {
            step(&mut skater, push, &scene, &[], &mut events);
        }
        let speed = skater.state().horizontal_speed();
        let cap = config.max_speed * config.push_speed_fraction;
        assert!(speed >= cap - 1e-3 && speed < cap + config.push_acceleration * DT + 1e-3);
    }

    #[test]
    fn turning_is_slower_at_speed() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let left = SkateIntents {
            turn_left: true,
            ..Default::default()
        };
        let mut events = Vec::new();

        let mut still = grounded_skater(config, &scene);
        step(&mut still, left, &scene, &[], &mut events);

        let mut fast = grounded_skater(config, &scene);
        fast.state_mut().velocity = Vec3::new(0.0, 0.0, -config.max_speed);
        step(&mut fast, left, &scene, &[], &mut events);

        let still_turn = still.state().yaw;
        let fast_turn = fast.state().yaw;
        assert!((still_turn - config.turn_speed * DT).abs() < 1e-5);
        assert!((fast_turn - config.turn_speed * config.min_turn_authority * DT).abs() < 1e-5);
    }

    #[test]
    fn jump_leaves_ground_and_lands() {
        let scene = flat_scene();
        let mut skater = grounded_skater(SkateConfig::default(), &scene);
        let mut events = Vec::new();
        step(
            &mut skater,
            SkateIntents {
                jump: true,
                ..Default::default()
            },
            &scene,
            &[],
            &mut events,
        );
        assert!(!skater.state().grounded);
        assert!(skater.state().position.y > 0.0);

        let mut frames = 0;
        while !skater.state().grounded && frames < 300 {
            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
            frames += 1;
        }
        assert!(skater.state().grounded);
        assert!(skater.state().position.y.abs() < 1e-5);
        assert!(events.is_empty(), "plain jump scores nothing");
    }

    #[test]
    fn missing_ground_means_falling() {
        let mut skater = SkaterController::new(SkateConfig::default(), Vec3::new(0.0, 10.0, 0.0), 0.0);
        let mut events = Vec::new();
        skater.update(DT, &SkateIntents::default(), &EmptyWorld, &[], &mut events, None);
        assert!(!skater.state().grounded);
        assert!(skater.state().velocity.y < 0.0);
    }

    #[test]
    fn one_spin_scores_once_on_landing() {
        let scene = flat_scene();
        let config = SkateConfig {
            spin_rate: TAU * 2.0,
            ..Default::default()
        };
        let mut skater = grounded_skater(config, &scene);
        let mut events = Vec::new();

        step(
            &mut skater,
            SkateIntents {
                jump: true,
                ..Default::default()
            },
            &scene,
            &[],
            &mut events,
        );
        let spin = SkateIntents {
            spin: true,
            ..Default::default()
        };
        for _ in 0..30 {
            step(&mut skater, spin, &scene, &[], &mut events);
            assert!(!skater.state().grounded, "still in the air while spinning");
        }
        for _ in 0..120 {
            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
        }

        assert!(skater.state().grounded);
        assert_eq!(events.len(), 1);
        let PresentationEvent::TrickLanded { label, points } = &events[0] else {
            panic!("expected a trick event, got {:?}", events[0]);
        };
        assert!(label.contains("1x Spin"));
        assert_eq!(*points, config.spin_points);
        assert_eq!(skater.state().tricks.timers.spin_accum, 0.0);
    }

    #[test]
    fn kickflip_scores_after_landing() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let mut skater = SkaterController::new(config, Vec3::new(0.0, 10.0, 0.0), 0.0);
        let mut events = Vec::new();

        let dt = 0.05;
        skater.update(
            dt,
            &SkateIntents {
                flip: true,
                ..Default::default()
            },
            &scene,
            &[],
            &mut events,
            None,
        );
        for _ in 0..10 {
            skater.update(dt, &SkateIntents::default(), &scene, &[], &mut events, None);
        }
        let timers = skater.state().tricks.timers;
        assert!(!timers.flip_in_progress);
        assert!(timers.flip_completed);
        assert_eq!(skater.state().tricks.pose.flip_angle, TAU);

        let mut frames = 0;
        while !skater.state().grounded && frames < 400 {
            skater.update(dt, &SkateIntents::default(), &scene, &[], &mut events, None);
            frames += 1;
        }
        assert_eq!(
            events,
            vec![PresentationEvent::TrickLanded {
                label: "Kickflip".to_string(),
                points: config.flip_points
            }]
        );
    }

    fn low_rail() -> Rail {
        Rail::new(Vec3::new(-5.0, 0.3, -2.0), Vec3::new(5.0, 0.3, -2.0), 0.05)
    }

    #[test]
    fn rail_capture_snaps_onto_the_segment() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let mut skater = SkaterController::new(config, Vec3::new(0.0, 0.5, -1.75), 0.0);
        skater.snap_to_ground(&scene);
        skater.state_mut().velocity = Vec3::new(4.0, 0.0, -1.0);
        let rails = [low_rail()];
        let mut events = Vec::new();

        step(&mut skater, SkateIntents::default(), &scene, &rails, &mut events);

        let state = skater.state();
        let grind = state.grind.expect("rail captured");
        assert!(state.grounded);
        assert!(state.velocity.x > 0.0);
        assert_eq!(state.velocity.y, 0.0);
        assert_eq!(state.velocity.z, 0.0);
        assert!((state.position.z - (-2.0)).abs() < 1e-5);
        assert!((state.position.y - (0.3 + 0.05 + config.grind_clearance)).abs() < 1e-5);
        assert!((0.0..=1.0).contains(&grind.param));
        assert!((state.yaw - yaw_from_direction(Vec3::X)).abs() < 1e-5);
    }

    #[test]
    fn slow_skaters_do_not_grind() {
        let scene = flat_scene();
        let mut skater = SkaterController::new(SkateConfig::default(), Vec3::new(0.0, 0.5, -1.8), 0.0);
        skater.snap_to_ground(&scene);
        skater.state_mut().velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut events = Vec::new();
        step(&mut skater, SkateIntents::default(), &scene, &[low_rail()], &mut events);
        assert!(skater.state().grind.is_none());
    }

    #[test]
    fn closest_rail_wins() {
        let scene = flat_scene();
        let mut skater = SkaterController::new(SkateConfig::default(), Vec3::new(0.0, 0.5, -1.75), 0.0);
        skater.snap_to_ground(&scene);
        skater.state_mut().velocity = Vec3::new(4.0, 0.0, 0.0);
        let far = Rail::new(Vec3::new(-5.0, 0.3, -1.3), Vec3::new(5.0, 0.3, -1.3), 0.05);
        let near = low_rail();
        let mut events = Vec::new();
        step(&mut skater, SkateIntents::default(), &scene, &[far, near], &mut events);
        let grind = skater.state().grind.expect("rail captured");
        assert_eq!(grind.rail_start, near.start);
    }

    #[test]
    fn degenerate_rail_is_never_captured() {
        let scene = flat_scene();
        let mut skater = SkaterController::new(SkateConfig::default(), Vec3::new(0.0, 0.5, 0.0), 0.0);
        skater.snap_to_ground(&scene);
        skater.state_mut().velocity = Vec3::new(4.0, 0.0, 0.0);
        let point = Rail::new(Vec3::new(0.05, 0.3, 0.0), Vec3::new(0.05, 0.3, 0.0), 0.05);
        let mut events = Vec::new();
        step(&mut skater, SkateIntents::default(), &scene, &[point], &mut events);
        assert!(skater.state().grind.is_none());
    }

    #[test]
    fn grind_param_stays_in_range_then_releases() {
        let config = SkateConfig::default();
        let rail = Rail::new(Vec3::new(-3.0, 5.0, 0.0), Vec3::new(3.0, 5.0, 0.0), 0.05);
        let mut skater = SkaterController::new(config, Vec3::new(1.0, 0.0, 0.0), 0.0);
        {
            let state = skater.state_mut();
            let grind = GrindState::on_rail(&rail, 2.0 / 3.0).unwrap();
            state.position = grind.position(config.grind_clearance);
            state.velocity = Vec3::new(6.0, 0.0, 0.0);
            state.grind = Some(grind);
            state.grounded = true;
        }
        let mut events = Vec::new();
        let mut released = false;
        for _ in 0..120 {
            skater.update(DT, &SkateIntents::default(), &EmptyWorld, &[rail], &mut events, None);
            match skater.state().grind {
                Some(grind) => {
                    assert!((0.0..=1.0).contains(&grind.param));
                    assert!(skater.state().grounded);
                    let rail_y = rail.grind_height_at(grind.param, config.grind_clearance);
                    assert!((skater.state().position.y - rail_y).abs() < 1e-5);
                }
                None => {
                    assert!(!skater.state().grounded);
                    released = true;
                    break;
                }
            }
        }
        assert!(released, "ran off the end of the rail");
    }

    #[test]
    fn grind_throttle_accelerates_and_clamps() {
        let config = SkateConfig::default();
        let rail = Rail::new(Vec3::new(-50.0, 5.0, 0.0), Vec3::new(50.0, 5.0, 0.0), 0.05);
        let mut skater = SkaterController::new(config, Vec3::ZERO, 0.0);
        {
            let state = skater.state_mut();
            let grind = GrindState::on_rail(&rail, 0.5).unwrap();
            state.position = grind.position(config.grind_clearance);
            state.velocity = Vec3::new(2.0, 0.0, 0.0);
            state.grind = Some(grind);
            state.grounded = true;
        }
        let forward = SkateIntents {
            forward: true,
            ..Default::default()
        };
        let mut events = Vec::new();

        let mut last = 2.0;
        for _ in 0..180 {
            skater.update(DT, &forward, &EmptyWorld, &[rail], &mut events, None);
            let grind = skater.state().grind.expect("still on the rail");
            let speed = skater.state().velocity.dot(grind.dir);
            assert!(speed >= last - 1e-5, "throttle keeps speeding up");
            assert!(speed <= config.max_speed + 1e-5);
            last = speed;
        }
        assert!((last - config.max_speed).abs() < 1e-5);
    }

    #[test]
    fn jump_pops_off_rail() {
        let config = SkateConfig::default();
        let rail = Rail::new(Vec3::new(-3.0, 5.0, 0.0), Vec3::new(3.0, 5.0, 0.0), 0.05);
        let mut skater = SkaterController::new(config, Vec3::ZERO, 0.0);
        {
            let state = skater.state_mut();
            let grind = GrindState::on_rail(&rail, 0.5).unwrap();
            state.position = grind.position(config.grind_clearance);
            state.velocity = Vec3::new(-4.0, 0.0, 0.0);
            state.grind = Some(grind);
            state.grounded = true;
        }
        let mut events = Vec::new();
        skater.update(
            DT,
            &SkateIntents {
                jump: true,
                ..Default::default()
            },
            &EmptyWorld,
            &[rail],
            &mut events,
            None,
        );
        let state = skater.state();
        assert!(state.grind.is_none());
        assert!(!state.grounded);
        assert!(state.velocity.x < -4.0, "boost follows the direction of travel");
        assert!(state.velocity.y > 0.0);
    }

    #[test]
    fn world_bounds_contain_the_skater() {
        let scene = flat_scene();
        let config = SkateConfig::default();
        let mut skater = grounded_skater(config, &scene);
        skater.state_mut().position =
            Vec3::new(config.bounds.max_x - 0.1, 0.0, config.bounds.min_z + 0.1);
        skater.state_mut().velocity = Vec3::new(10.0, 0.0, -10.0);
        let mut events = Vec::new();
        for _ in 0..30 {
            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
            let p = skater.state().position;
            assert!(config.bounds.contains(p.x, p.z));
        }
        assert_eq!(skater.state().velocity.x, 0.0);
        assert_eq!(skater.state().velocity.z, 0.0);
    }

    /// Wide slab whose top face descends toward +X at `angle` radians.
    fn downhill_scene(angle: f32) -> StaticScene {
        let mut scene = StaticScene::new();
        scene.insert(StaticSurface {
            center: Vec3::new(0.0, -0.5, 0.0),
            half_extents: Vec3::new(20.0, 0.5, 20.0),
            rotation: Quat::from_rotation_z(-angle),
            tag: SurfaceTag::Ground,
        });
        scene
    }

    #[test]
    fn slope_pulls_downhill() {
        let scene = downhill_scene(0.6);
        let mut skater =
            SkaterController::new(SkateConfig::default(), Vec3::new(0.0, 2.0, 0.0), 0.0);
        assert!(skater.snap_to_ground(&scene));
        let mut events = Vec::new();
        for _ in 0..30 {
            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
        }
        assert!(skater.state().grounded);
        assert!(skater.state().velocity.x > 0.0);
        assert!(skater.state().position.x > 0.0);
    }

    #[test]
    fn slope_pull_scales_with_steepness() {
        let config = SkateConfig::default();
        let mut events = Vec::new();
        for angle in [0.2_f32, 0.6] {
            let scene = downhill_scene(angle);
            let mut skater = SkaterController::new(config, Vec3::new(0.0, 2.0, 0.0), 0.0);
            assert!(skater.snap_to_ground(&scene));

            step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);

            let expected = (1.0 - angle.cos()) * config.gravity * config.slope_factor * DT;
            let state = skater.state();
            assert!(state.grounded);
            assert!(state.velocity.x > 0.0);
            assert!(state.velocity.z.abs() < 1e-6);
            assert!(
                (state.horizontal_speed() - expected).abs() < 1e-4,
                "angle {angle}: speed {} expected {expected}",
                state.horizontal_speed()
            );
        }
    }

    #[test]
    fn climbing_a_kicker_launches_off_the_lip() {
        let mut scene = StaticScene::new();
        // Top face rises toward -Z and ends in a lip with nothing beyond it.
        let ramp = StaticSurface {
            center: Vec3::ZERO,
            half_extents: Vec3::new(2.0, 0.5, 3.0),
            rotation: Quat::from_rotation_x(0.3),
            tag: SurfaceTag::Ground,
        };
        let lip = ramp.center + ramp.rotation * Vec3::new(0.0, 0.5, -3.0);
        scene.insert(ramp);

        let config = SkateConfig::default();
        let mut skater = SkaterController::new(config, Vec3::new(0.0, 2.0, 0.0), 0.0);
        assert!(skater.snap_to_ground(&scene));
        skater.state_mut().velocity = Vec3::new(0.0, 0.0, -config.max_speed);
        let forward = SkateIntents {
            forward: true,
            ..Default::default()
        };
        let mut events = Vec::new();

        let mut launch = None;
        for _ in 0..60 {
            step(&mut skater, forward, &scene, &[], &mut events);
            if !skater.state().grounded {
                launch = Some(*skater.state());
                break;
            }
            assert!(skater.state().velocity.y >= 0.0, "riding up the ramp");
        }
        let launch = launch.expect("left the ramp");
        assert!(launch.position.z < lip.z, "left past the lip");
        assert!(launch.velocity.y > 0.0);

        let mut peak = launch.position.y;
        for _ in 0..30 {
            step(&mut skater, forward, &scene, &[], &mut events);
            peak = peak.max(skater.state().position.y);
        }
        assert!(peak > lip.y + 0.15);
    }

    #[test]
    fn orientation_is_sanitized() {
        let scene = flat_scene();
        let mut skater = grounded_skater(SkateConfig::default(), &scene);
        skater.state_mut().pitch = 1.0;
        skater.state_mut().roll = -2.0;
        skater.state_mut().scale = Vec3::new(1.0, -1.0, 1.0);
        let mut events = Vec::new();
        step(&mut skater, SkateIntents::default(), &scene, &[], &mut events);
        assert_eq!(skater.state().pitch, 0.0);
        assert_eq!(skater.state().roll, 0.0);
        assert_eq!(skater.state().scale.y, 1.0);
    }

    #[test]
    fn invalid_dt_is_ignored() {
        let scene = flat_scene();
        let mut skater = grounded_skater(SkateConfig::default(), &scene);
        let before = *skater.state();
        let mut events = Vec::new();
        for dt in [0.0, -1.0, f32::NAN] {
            skater.update(dt, &SkateIntents::default(), &scene, &[], &mut events, None);
        }
        assert_eq!(*skater.state(), before);
    }

    #[derive(Default)]
    struct RecordingRig {
        poses: Vec<CosmeticPose>,
    }

    impl CosmeticRig for RecordingRig {
        fn apply_pose(&mut self, pose: &CosmeticPose) {
            self.poses.push(*pose);
        }
    }

    #[test]
    fn rig_is_optional() {
        let scene = flat_scene();
        let mut with_rig = grounded_skater(SkateConfig::default(), &scene);
        let mut without_rig = with_rig.clone();
        let mut rig = RecordingRig::default();
        let mut events = Vec::new();
        let input = SkateIntents {
            forward: true,
            ..Default::default()
        };
        for _ in 0..10 {
            let rig_ref = Some(&mut rig as &mut dyn CosmeticRig);
            with_rig.update(DT, &input, &scene, &[], &mut events, rig_ref);
            without_rig.update(DT, &input, &scene, &[], &mut events, None);
        }
        assert_eq!(rig.poses.len(), 10);
        assert_eq!(with_rig.state(), without_rig.state());
        assert!(rig.poses[9].crouch > 0.0);
    }
}
