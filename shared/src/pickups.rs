//! Story collectibles scattered around the park.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::events::PresentationSink;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryPickup {
    pub id: u32,
    pub title: String,
    pub position: Vec3,
    pub radius: f32,
}

impl StoryPickup {
    pub fn contains(&self, point: Vec3) -> bool {
        point.distance_squared(self.position) <= self.radius * self.radius
    }
}

/// Collect every pickup within reach of `position` that is not in `collected` yet.
/// Each newly collected id is recorded and reported to the sink exactly once.
pub fn collect_story_pickups(
    position: Vec3,
    pickups: &[StoryPickup],
    collected: &mut HashSet<u32>,
    sink: &mut impl PresentationSink,
) -> usize {
    let mut count = 0;
    for pickup in pickups {
        if collected.contains(&pickup.id) || !pickup.contains(position) {
            continue;
        }
        collected.insert(pickup.id);
        sink.on_story_pickup(pickup.id, &pickup.title);
        info!("Collected story '{}' (id {})", pickup.title, pickup.id);
        count += 1;
    }
    count
}
