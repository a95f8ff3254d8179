//! Skater entity: spawning, per-frame stepping, visuals and rig replacement
//!
//! The controller in `skate_shared` owns all gameplay state. This module feeds it input
//! and static geometry, mirrors its pose onto transforms and forwards its events as
//! Bevy messages.

use std::collections::HashSet;

use bevy::asset::LoadState;
use bevy::prelude::*;
use skate_shared::{
    collect_story_pickups, load_skate_config_from_file, CosmeticPose, CosmeticRig, DrivenBody,
    PresentationEvent, SkateConfig, SkaterController, StaticScene, CONFIG_PATH,
};

use crate::input::InputState;
use crate::level::Park;
use crate::persistence::SaveStore;

/// Path of the full skater model. A placeholder is driven until it finishes loading.
pub const SKATER_SCENE_PATH: &str = "models/skater.glb#Scene0";

/// Longest frame the simulation will take in one step (hitches, window drags).
const MAX_FRAME_DT: f32 = 0.1;

/// How far the rider sinks at full crouch.
const CROUCH_DROP: f32 = 0.35;

/// Board rest height above the feet.
const BOARD_HEIGHT: f32 = 0.06;

// =============================================================================
// COMPONENTS & RESOURCES
// =============================================================================

/// Marker for the skater root entity
#[derive(Component)]
pub struct Skater;

/// The presentational body the skater currently drives.
#[derive(Component)]
pub struct SkaterBody(pub DrivenBody<Entity>);

/// Board and rider entities of one body. Lives on the body root.
#[derive(Component, Clone, Copy)]
pub struct RigParts {
    pub board: Entity,
    pub rider: Entity,
    /// Rider height above the feet when standing straight.
    pub rider_rest: f32,
}

/// Marker for transforms the cosmetic rig is allowed to move
#[derive(Component)]
pub struct RigPart;

/// Shared meshes/materials for skater bodies
#[derive(Resource, Clone)]
pub struct SkaterAssets {
    pub board_mesh: Handle<Mesh>,
    pub board_material: Handle<StandardMaterial>,
    pub rider_mesh: Handle<Mesh>,
    pub rider_material: Handle<StandardMaterial>,
}

/// Full skater model still loading in the background.
#[derive(Resource)]
pub struct PendingRig {
    pub scene: Handle<Scene>,
}

/// Stories collected so far, this session and from the save.
#[derive(Resource, Default)]
pub struct CollectedStories(pub HashSet<u32>);

type RigPartQuery<'w, 's> = Query<'w, 's, &'static mut Transform, (With<RigPart>, Without<Skater>)>;

/// Cosmetic rig over the board and rider transforms of one body.
struct TransformRig<'a, 'w, 's> {
    parts: RigParts,
    transforms: &'a mut RigPartQuery<'w, 's>,
}

impl CosmeticRig for TransformRig<'_, '_, '_> {
    fn apply_pose(&mut self, pose: &CosmeticPose) {
        if let Ok(mut board) = self.transforms.get_mut(self.parts.board) {
            board.translation = Vec3::Y * (BOARD_HEIGHT + pose.flip_lift);
            // Board nose points down -Z, so its long axis is Z.
            board.rotation = Quat::from_rotation_y(pose.shove_angle)
                * Quat::from_rotation_z(pose.flip_angle + pose.board_tilt);
        }
        if let Ok(mut rider) = self.transforms.get_mut(self.parts.rider) {
            rider.translation.y = self.parts.rider_rest - pose.crouch * CROUCH_DROP;
            rider.scale.y = 1.0 - pose.crouch * 0.2;
        }
    }
}

/// Placeholder capsule origin is its center: radius 0.25, segment 1.2.
const CAPSULE_REST: f32 = BOARD_HEIGHT + 0.1 + 0.85;

/// The full model's origin is at its feet.
const MODEL_REST: f32 = BOARD_HEIGHT + 0.04;

// =============================================================================
// SETUP
// =============================================================================

/// Startup: load tuning from disk, falling back to defaults.
pub fn load_config(mut commands: Commands) {
    let config = match load_skate_config_from_file(CONFIG_PATH) {
        Ok(config) => {
            info!("Loaded skate config from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("{}; using default skate config", e);
            SkateConfig::default()
        }
    };
    commands.insert_resource(config);
}

/// Startup: seed collected stories from the save.
pub fn init_collected_stories(mut commands: Commands, store: Res<SaveStore>) {
    commands.insert_resource(CollectedStories(store.data.collected_set()));
}

/// Spawn a body root with board and rider children, parented to `skater`.
fn spawn_body(
    commands: &mut Commands,
    skater: Entity,
    board: impl Bundle,
    rider: impl Bundle,
    rider_rest: f32,
) -> Entity {
    let board = commands.spawn((RigPart, board)).id();
    let rider = commands.spawn((RigPart, rider)).id();
    let root = commands
        .spawn((
            RigParts { board, rider, rider_rest },
            Transform::default(),
            Visibility::Inherited,
        ))
        .add_children(&[board, rider])
        .id();
    commands.entity(skater).add_child(root);
    root
}

/// Startup: spawn the skater with a primitive placeholder body and start loading the model.
pub fn spawn_skater(
    mut commands: Commands,
    config: Res<SkateConfig>,
    scene: Res<StaticScene>,
    park: Res<Park>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut controller = SkaterController::new(*config, park.spawn, park.spawn_yaw);
    controller.snap_to_ground(scene.as_ref());
    let state = *controller.state();

    let assets = SkaterAssets {
        board_mesh: meshes.add(Cuboid::new(0.22, 0.04, 0.8)),
        board_material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.3, 0.2),
            ..default()
        }),
        rider_mesh: meshes.add(Capsule3d::new(0.25, 1.2)),
        rider_material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.35, 0.8),
            ..default()
        }),
    };

    let skater = commands
        .spawn((
            Skater,
            Transform::from_translation(state.position).with_rotation(state.rotation()),
            Visibility::default(),
        ))
        .id();

    let placeholder = spawn_body(
        &mut commands,
        skater,
        (
            Mesh3d(assets.board_mesh.clone()),
            MeshMaterial3d(assets.board_material.clone()),
            Transform::from_xyz(0.0, BOARD_HEIGHT, 0.0),
        ),
        (
            Mesh3d(assets.rider_mesh.clone()),
            MeshMaterial3d(assets.rider_material.clone()),
            Transform::from_xyz(0.0, CAPSULE_REST, 0.0),
        ),
        CAPSULE_REST,
    );

    commands
        .entity(skater)
        .insert((controller, SkaterBody(DrivenBody::new(placeholder))));
    commands.insert_resource(assets);
    commands.insert_resource(PendingRig {
        scene: asset_server.load(SKATER_SCENE_PATH),
    });

    info!("Skater spawned at {:?} (grounded: {})", state.position, state.grounded);
}

// =============================================================================
// RIG REPLACEMENT
// =============================================================================

/// Once the full model has loaded, build a body around it and drive that instead.
/// Physics state is untouched; only the driven body changes.
pub fn swap_in_loaded_rig(
    mut commands: Commands,
    pending: Option<Res<PendingRig>>,
    asset_server: Res<AssetServer>,
    assets: Option<Res<SkaterAssets>>,
    mut skaters: Query<(Entity, &mut SkaterBody), With<Skater>>,
) {
    let (Some(pending), Some(assets)) = (pending, assets) else {
        return;
    };

    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(&pending.scene) {
        warn!("Failed to load {}: {}; keeping placeholder skater", SKATER_SCENE_PATH, err);
        commands.remove_resource::<PendingRig>();
        return;
    }
    if !asset_server.is_loaded_with_dependencies(&pending.scene) {
        return;
    }

    let Ok((skater, mut body)) = skaters.single_mut() else {
        return;
    };

    let next = spawn_body(
        &mut commands,
        skater,
        (
            Mesh3d(assets.board_mesh.clone()),
            MeshMaterial3d(assets.board_material.clone()),
            Transform::from_xyz(0.0, BOARD_HEIGHT, 0.0),
        ),
        (
            SceneRoot(pending.scene.clone()),
            // glTF models face +Z; the skater faces -Z.
            Transform::from_xyz(0.0, MODEL_REST, 0.0)
                .with_rotation(Quat::from_rotation_y(std::f32::consts::PI)),
        ),
        MODEL_REST,
    );

    if let Some(previous) = body.0.replace(next) {
        commands.entity(previous).insert(Visibility::Hidden);
    }
    info!("Skater model loaded, now driving body generation {}", body.0.generation());
    commands.remove_resource::<PendingRig>();
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Advance the skater one frame and forward its events.
pub fn step_skater(
    time: Res<Time>,
    input: Res<InputState>,
    scene: Res<StaticScene>,
    park: Res<Park>,
    mut collected: ResMut<CollectedStories>,
    mut skaters: Query<(&mut SkaterController, &SkaterBody), With<Skater>>,
    bodies: Query<&RigParts>,
    mut parts: RigPartQuery,
    mut events: MessageWriter<PresentationEvent>,
) {
    let dt = time.delta_secs().min(MAX_FRAME_DT);
    let mut buffer: Vec<PresentationEvent> = Vec::new();

    for (mut controller, body) in skaters.iter_mut() {
        let mut rig = bodies
            .get(body.0.current())
            .ok()
            .copied()
            .map(|rig_parts| TransformRig {
                parts: rig_parts,
                transforms: &mut parts,
            });

        controller.update(
            dt,
            &input.intents,
            scene.as_ref(),
            &park.rails,
            &mut buffer,
            rig.as_mut().map(|r| r as &mut dyn CosmeticRig),
        );

        let position = controller.state().position;
        collect_story_pickups(position, &park.pickups, &mut collected.0, &mut buffer);
    }

    for event in buffer {
        events.write(event);
    }
}

/// Copy the simulated pose onto the skater transform.
pub fn sync_skater_transform(
    mut skaters: Query<(&SkaterController, &mut Transform), With<Skater>>,
) {
    for (controller, mut transform) in skaters.iter_mut() {
        let state = controller.state();
        transform.translation = state.position;
        transform.rotation = state.rotation();
        transform.scale = state.scale;
    }
}
