//! Discrete gameplay events pushed out to the presentation layer (HUD, persistence).
//!
//! The simulation only ever writes to a sink; it never reads presentation state back.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Message, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationEvent {
    /// A landing that scored: joined trick label and summed points.
    TrickLanded { label: String, points: u32 },
    /// A story collectible was picked up for the first time.
    StoryPickup { id: u32, title: String },
}

/// Receiver of gameplay events.
pub trait PresentationSink {
    fn on_trick_landed(&mut self, label: &str, points: u32);

    fn on_story_pickup(&mut self, _id: u32, _title: &str) {}
}

impl PresentationSink for Vec<PresentationEvent> {
    fn on_trick_landed(&mut self, label: &str, points: u32) {
        self.push(PresentationEvent::TrickLanded {
            label: label.to_string(),
            points,
        });
    }

    fn on_story_pickup(&mut self, id: u32, title: &str) {
        self.push(PresentationEvent::StoryPickup {
            id,
            title: title.to_string(),
        });
    }
}
