//! Skatepark layout
//!
//! Builds the static collision scene, the rails and the story pickups, then spawns
//! matching meshes. Collision and visuals come from the same surface list so they
//! never drift apart.

use bevy::light::{light_consts::lux, CascadeShadowConfigBuilder};
use bevy::prelude::*;
use skate_shared::{Rail, StaticScene, StaticSurface, StoryPickup, SurfaceTag, WorldBounds};

/// Everything in the park the skater can interact with besides plain ground.
#[derive(Resource, Clone, Debug, Default)]
pub struct Park {
    pub rails: Vec<Rail>,
    pub pickups: Vec<StoryPickup>,
    pub spawn: Vec3,
    pub spawn_yaw: f32,
}

/// Marker for a story pickup visual
#[derive(Component)]
pub struct StoryMarker {
    pub id: u32,
}

/// Root entity for all park visuals
#[derive(Component)]
pub struct ParkRoot;

const WALL_HEIGHT: f32 = 3.0;
const WALL_THICKNESS: f32 = 0.5;
const LEDGE_HALF_WIDTH: f32 = 0.3;

/// Kicker ramp: a slab tilted around X so it rises toward -Z.
fn kicker(center: Vec3, width: f32, length: f32, angle: f32) -> StaticSurface {
    StaticSurface {
        center,
        half_extents: Vec3::new(width * 0.5, 0.15, length * 0.5),
        rotation: Quat::from_rotation_x(angle),
        tag: SurfaceTag::Ground,
    }
}

/// Ledge under a rail, reaching from the rail's underside down into the floor.
/// Landing on it puts the skater within catching range of the rail.
fn ledge_under(rail: &Rail) -> Option<StaticSurface> {
    let dir = rail.direction()?;
    let rotation = Quat::from_rotation_arc(Vec3::X, dir);
    let mid = (rail.start + rail.end) * 0.5;
    let height = (mid.y - rail.radius).max(0.1);
    Some(StaticSurface {
        center: mid - rotation * Vec3::Y * (rail.radius + height * 0.5),
        half_extents: Vec3::new(rail.length() * 0.5, height * 0.5, LEDGE_HALF_WIDTH),
        rotation,
        tag: SurfaceTag::Ground,
    })
}

/// Collision scene and park contents for the given bounds.
pub fn build_park(bounds: &WorldBounds) -> (StaticScene, Park) {
    let mut scene = StaticScene::new();

    let size_x = bounds.max_x - bounds.min_x;
    let size_z = bounds.max_z - bounds.min_z;
    let mid = Vec3::new(
        (bounds.min_x + bounds.max_x) * 0.5,
        0.0,
        (bounds.min_z + bounds.max_z) * 0.5,
    );

    // --- Floor ---
    // Top face at y = 0, slightly larger than the playable area.
    scene.insert(StaticSurface::cuboid(
        mid + Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(size_x * 0.5 + 5.0, 0.5, size_z * 0.5 + 5.0),
        SurfaceTag::Ground,
    ));

    // --- Perimeter walls ---
    let wall_y = WALL_HEIGHT * 0.5;
    for (center, half) in [
        (
            Vec3::new(mid.x, wall_y, bounds.min_z - WALL_THICKNESS),
            Vec3::new(size_x * 0.5 + 1.0, wall_y, WALL_THICKNESS * 0.5),
        ),
        (
            Vec3::new(mid.x, wall_y, bounds.max_z + WALL_THICKNESS),
            Vec3::new(size_x * 0.5 + 1.0, wall_y, WALL_THICKNESS * 0.5),
        ),
        (
            Vec3::new(bounds.min_x - WALL_THICKNESS, wall_y, mid.z),
            Vec3::new(WALL_THICKNESS * 0.5, wall_y, size_z * 0.5 + 1.0),
        ),
        (
            Vec3::new(bounds.max_x + WALL_THICKNESS, wall_y, mid.z),
            Vec3::new(WALL_THICKNESS * 0.5, wall_y, size_z * 0.5 + 1.0),
        ),
    ] {
        scene.insert(StaticSurface::cuboid(center, half, SurfaceTag::Obstacle));
    }

    // --- Ramps and ledges ---
    scene.insert(kicker(Vec3::new(0.0, 0.35, -14.0), 4.0, 4.0, 0.3));
    scene.insert(kicker(Vec3::new(-12.0, 0.35, -6.0), 3.0, 4.0, 0.35));
    scene.insert(kicker(Vec3::new(14.0, 0.6, 8.0), 5.0, 6.0, -0.4));
    // Manual pad
    scene.insert(StaticSurface::cuboid(
        Vec3::new(8.0, 0.25, -8.0),
        Vec3::new(2.0, 0.25, 5.0),
        SurfaceTag::Ground,
    ));
    // Pillars to dodge (and to test the camera against)
    for x in [-20.0, -6.0, 20.0] {
        scene.insert(StaticSurface::cuboid(
            Vec3::new(x, 2.0, 18.0),
            Vec3::new(0.6, 2.0, 0.6),
            SurfaceTag::Obstacle,
        ));
    }

    // --- Rails ---
    let rails = vec![
        Rail::new(Vec3::new(-5.0, 0.45, -4.0), Vec3::new(5.0, 0.45, -4.0), 0.05),
        Rail::new(Vec3::new(-18.0, 0.45, 4.0), Vec3::new(-18.0, 0.45, 16.0), 0.05),
        // Down rail
        Rail::new(Vec3::new(4.0, 1.0, 20.0), Vec3::new(14.0, 0.4, 20.0), 0.05),
    ];
    for rail in &rails {
        scene.add_rail(rail);
        if let Some(ledge) = ledge_under(rail) {
            scene.insert(ledge);
        }
    }

    // --- Stories ---
    let pickups = vec![
        StoryPickup {
            id: 1,
            title: "First Push".to_string(),
            position: Vec3::new(0.0, 1.0, -6.0),
            radius: 1.2,
        },
        StoryPickup {
            id: 2,
            title: "Over the Kicker".to_string(),
            position: Vec3::new(0.0, 2.4, -18.5),
            radius: 1.5,
        },
        StoryPickup {
            id: 3,
            title: "Rail Rat".to_string(),
            position: Vec3::new(-18.0, 1.3, 10.0),
            radius: 1.2,
        },
        StoryPickup {
            id: 4,
            title: "Long Way Down".to_string(),
            position: Vec3::new(12.0, 1.6, 20.0),
            radius: 1.2,
        },
    ];

    info!(
        "Park built: {} surfaces, {} rails, {} stories",
        scene.len(),
        rails.len(),
        pickups.len()
    );

    let park = Park {
        rails,
        pickups,
        spawn: Vec3::new(0.0, 1.0, 6.0),
        spawn_yaw: 0.0,
    };
    (scene, park)
}

/// Startup: build the park and insert it as resources.
pub fn setup_park(mut commands: Commands, config: Res<skate_shared::SkateConfig>) {
    let (scene, park) = build_park(&config.bounds);
    commands.insert_resource(scene);
    commands.insert_resource(park);
}

/// Startup: spawn meshes and lights for the park.
pub fn spawn_park_visuals(
    mut commands: Commands,
    scene: Res<StaticScene>,
    park: Res<Park>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ground_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.55, 0.58),
        perceptual_roughness: 0.9,
        ..default()
    });
    let obstacle_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.75, 0.45, 0.3),
        perceptual_roughness: 0.8,
        ..default()
    });
    let rail_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.85, 0.9),
        metallic: 0.9,
        perceptual_roughness: 0.3,
        ..default()
    });
    let story_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.85, 0.2),
        emissive: LinearRgba::rgb(2.0, 1.5, 0.3),
        ..default()
    });

    let root = commands
        .spawn((ParkRoot, Transform::default(), Visibility::default()))
        .id();

    // Rails get their own cylinder mesh below.
    for surface in scene.surfaces().iter().filter(|s| s.tag != SurfaceTag::Rail) {
        let material = match surface.tag {
            SurfaceTag::Obstacle => obstacle_mat.clone(),
            _ => ground_mat.clone(),
        };
        let child = commands
            .spawn((
                Mesh3d(meshes.add(Cuboid::from_size(surface.half_extents * 2.0))),
                MeshMaterial3d(material),
                Transform::from_translation(surface.center).with_rotation(surface.rotation),
            ))
            .id();
        commands.entity(root).add_child(child);
    }

    for rail in &park.rails {
        let Some(dir) = rail.direction() else {
            continue;
        };
        let mid = (rail.start + rail.end) * 0.5;
        let child = commands
            .spawn((
                Mesh3d(meshes.add(Cylinder::new(rail.radius, rail.length()))),
                MeshMaterial3d(rail_mat.clone()),
                Transform::from_translation(mid).with_rotation(Quat::from_rotation_arc(Vec3::Y, dir)),
            ))
            .id();
        commands.entity(root).add_child(child);
    }

    let story_mesh = meshes.add(Sphere::new(0.35));
    for pickup in &park.pickups {
        let child = commands
            .spawn((
                StoryMarker { id: pickup.id },
                Mesh3d(story_mesh.clone()),
                MeshMaterial3d(story_mat.clone()),
                Transform::from_translation(pickup.position),
            ))
            .id();
        commands.entity(root).add_child(child);
    }

    // --- Lights ---
    commands.spawn((
        DirectionalLight {
            illuminance: lux::AMBIENT_DAYLIGHT,
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            num_cascades: 2,
            maximum_distance: 80.0,
            first_cascade_far_bound: 15.0,
            ..default()
        }
        .build(),
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        ..default()
    });
}

/// Spin uncollected stories and hide collected ones.
pub fn animate_story_markers(
    time: Res<Time>,
    collected: Res<crate::skater::CollectedStories>,
    mut markers: Query<(&StoryMarker, &mut Transform, &mut Visibility)>,
) {
    for (marker, mut transform, mut visibility) in markers.iter_mut() {
        if collected.0.contains(&marker.id) {
            *visibility = Visibility::Hidden;
            continue;
        }
        transform.rotate_y(time.delta_secs() * 1.5);
    }
}
