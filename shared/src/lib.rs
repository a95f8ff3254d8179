//! Skatepark simulation: skater locomotion, tricks, rail grinds and the follow camera.
//!
//! Nothing in here renders. The client crate feeds input, static geometry and
//! frame time in, and draws whatever comes out.

pub mod body;
pub mod camera;
pub mod config;
pub mod events;
pub mod input;
pub mod math;
pub mod physics;
pub mod pickups;
pub mod rail;
pub mod spatial;
pub mod tricks;

pub use body::DrivenBody;
pub use camera::{CameraPose, FollowCamera, FollowTarget};
pub use config::{
    load_skate_config_from_file, parse_skate_config, CameraConfig, SkateConfig, WorldBounds,
};
pub use events::{PresentationEvent, PresentationSink};
pub use input::{Intent, IntentTracker, SkateIntents};
pub use physics::{CharacterState, SkaterController};
pub use pickups::{collect_story_pickups, StoryPickup};
pub use rail::{GrindState, Rail};
pub use spatial::{
    EmptyWorld, ProbeHit, SpatialQuery, StaticScene, StaticSurface, SurfaceTag, TagFilter,
};
pub use tricks::{CosmeticPose, CosmeticRig, LandingScore, TrickState, TrickTimers};

/// Default location of the optional tuning file, relative to the working directory.
pub const CONFIG_PATH: &str = "skate_config.ron";
