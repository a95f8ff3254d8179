//! Skatepark client - renders the park, drives the skater and the follow camera

mod camera;
mod hud;
mod input;
mod level;
mod persistence;
mod skater;
mod states;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use skate_shared::PresentationEvent;
use states::GameState;

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> String {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    "assets".to_string()
}

fn main() {
    let asset_path = get_asset_path();

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Skatepark".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path,
                ..default()
            }),
    );

    app.init_state::<GameState>();
    app.add_message::<PresentationEvent>();

    app.init_resource::<input::KeyBindings>();
    app.init_resource::<input::InputState>();
    app.init_resource::<persistence::SaveStore>();
    app.init_resource::<hud::HudState>();

    // Config and save must exist before anything that reads them.
    app.add_systems(
        Startup,
        (
            (skater::load_config, persistence::load_save),
            (level::setup_park, skater::init_collected_stories),
            (
                level::spawn_park_visuals,
                skater::spawn_skater,
                camera::spawn_camera,
                hud::spawn_hud,
            ),
        )
            .chain(),
    );

    app.add_systems(
        OnEnter(GameState::Paused),
        (states::spawn_pause_overlay, input::clear_held_keys),
    );
    app.add_systems(OnExit(GameState::Paused), states::despawn_pause_overlay);

    app.add_systems(Update, states::handle_resume_key.run_if(in_state(GameState::Paused)));

    // ORDER MATTERS: input -> skater -> transforms -> camera, then presentation.
    app.add_systems(
        Update,
        (
            input::handle_keyboard_input,
            skater::step_skater,
            skater::sync_skater_transform,
            camera::update_camera,
            hud::update_hud_state,
            persistence::record_progress,
            persistence::flush_save,
            hud::update_hud_text,
        )
            .chain()
            .run_if(in_state(GameState::Playing)),
    );

    app.add_systems(
        Update,
        (
            states::handle_escape_key,
            skater::swap_in_loaded_rig,
            level::animate_story_markers,
        )
            .run_if(in_state(GameState::Playing)),
    );

    info!("Skatepark client starting");
    app.run();
}
