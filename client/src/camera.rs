//! Third-person follow camera
//!
//! Wraps the shared `FollowCamera` and applies its pose to the Bevy camera.

use bevy::prelude::*;
use skate_shared::{FollowCamera, FollowTarget, SkateConfig, SkaterController, StaticScene};

use crate::input::InputState;
use crate::skater::Skater;

/// Follow camera state, attached to the 3D camera entity
#[derive(Component)]
pub struct SkateCamera(pub FollowCamera);

/// Startup: spawn the camera. It snaps behind the skater on its first update.
pub fn spawn_camera(mut commands: Commands, config: Res<SkateConfig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.camera.base_fov,
            ..default()
        }),
        Transform::from_xyz(0.0, 4.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        SkateCamera(FollowCamera::new(config.camera)),
    ));
    info!("Follow camera spawned");
}

/// Update the camera from the skater's post-physics state.
/// Must run after the skater step in the same frame.
pub fn update_camera(
    time: Res<Time>,
    input: Res<InputState>,
    scene: Res<StaticScene>,
    skaters: Query<&SkaterController, With<Skater>>,
    mut cameras: Query<(&mut SkateCamera, &mut Transform, &mut Projection), Without<Skater>>,
) {
    let Some(controller) = skaters.iter().next() else {
        return;
    };
    let Ok((mut camera, mut transform, mut projection)) = cameras.single_mut() else {
        return;
    };

    let state = controller.state();
    let target = FollowTarget {
        position: state.position,
        velocity: state.velocity,
        yaw: state.yaw,
    };
    let pose = camera
        .0
        .update(time.delta_secs(), &target, input.intents.camera_nudge(), scene.as_ref());

    transform.translation = pose.position;
    transform.rotation = pose.rotation();

    if let Projection::Perspective(ref mut persp) = *projection {
        persp.fov = pose.fov;
    }
}
