//! Keyboard input handling
//!
//! Physical keys are folded into skater intents once per frame.

use bevy::input::keyboard::KeyboardInput;
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::window::WindowFocused;
use skate_shared::{Intent, IntentTracker, SkateIntents};

/// Default key layout. Several keys may drive the same intent.
pub const DEFAULT_BINDINGS: [(KeyCode, Intent); 18] = [
    (KeyCode::KeyW, Intent::MoveForward),
    (KeyCode::ArrowUp, Intent::MoveForward),
    (KeyCode::KeyS, Intent::MoveBack),
    (KeyCode::ArrowDown, Intent::MoveBack),
    (KeyCode::KeyA, Intent::TurnLeft),
    (KeyCode::ArrowLeft, Intent::TurnLeft),
    (KeyCode::KeyD, Intent::TurnRight),
    (KeyCode::ArrowRight, Intent::TurnRight),
    (KeyCode::Space, Intent::Jump),
    (KeyCode::ShiftLeft, Intent::Push),
    (KeyCode::KeyJ, Intent::TrickSpin),
    (KeyCode::KeyK, Intent::TrickGrab),
    (KeyCode::KeyL, Intent::TrickFlip),
    (KeyCode::KeyI, Intent::TrickShove),
    (KeyCode::KeyQ, Intent::CameraLeft),
    (KeyCode::KeyE, Intent::CameraRight),
    // Right-hand alternatives for the camera.
    (KeyCode::Comma, Intent::CameraLeft),
    (KeyCode::Period, Intent::CameraRight),
];

/// Key bindings plus the set of currently held keys
#[derive(Resource)]
pub struct KeyBindings {
    pub tracker: IntentTracker<KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            tracker: IntentTracker::new(DEFAULT_BINDINGS),
        }
    }
}

/// Client-side input state, snapshotted once per frame
#[derive(Resource, Default)]
pub struct InputState {
    pub intents: SkateIntents,
}

/// Fold key press/release messages into intents
pub fn handle_keyboard_input(
    mut key_events: MessageReader<KeyboardInput>,
    mut focus_events: MessageReader<WindowFocused>,
    mut bindings: ResMut<KeyBindings>,
    mut input_state: ResMut<InputState>,
) {
    for event in key_events.read() {
        match event.state {
            ButtonState::Pressed => bindings.tracker.press(event.key_code),
            ButtonState::Released => bindings.tracker.release(event.key_code),
        }
    }

    // Releases that happen while unfocused never arrive, so drop everything.
    if focus_events.read().any(|e| !e.focused) {
        debug!("Window lost focus, clearing held keys");
        bindings.tracker.clear();
    }

    input_state.intents = bindings.tracker.snapshot();
}

/// Forget held keys when leaving gameplay so nothing sticks after resume.
pub fn clear_held_keys(mut bindings: ResMut<KeyBindings>, mut input_state: ResMut<InputState>) {
    bindings.tracker.clear();
    input_state.intents = SkateIntents::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_has_aliases() {
        let mut bindings = KeyBindings::default();
        bindings.tracker.press(KeyCode::ArrowUp);
        assert!(bindings.tracker.snapshot().forward);
        bindings.tracker.press(KeyCode::KeyW);
        bindings.tracker.release(KeyCode::ArrowUp);
        assert!(bindings.tracker.snapshot().forward, "W still held");
        bindings.tracker.release(KeyCode::KeyW);
        assert!(!bindings.tracker.snapshot().forward);
    }

    #[test]
    fn every_intent_is_bound() {
        let bindings = KeyBindings::default();
        let mut tracker = bindings.tracker;
        for (key, _) in DEFAULT_BINDINGS {
            tracker.press(key);
        }
        for intent in Intent::ALL {
            assert!(tracker.is_active(intent), "{intent:?} has no key");
        }
    }
}
