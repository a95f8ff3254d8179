//! Skater input intents.
//!
//! Raw key press/release events are folded into a fixed set of level-triggered intents.
//! Several physical keys may map to one intent; the intent stays active while any of them is held.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Everything the player can ask the skater (or the camera) to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    MoveForward,
    MoveBack,
    TurnLeft,
    TurnRight,
    Jump,
    Push,
    TrickSpin,
    TrickGrab,
    TrickFlip,
    TrickShove,
    CameraLeft,
    CameraRight,
}

impl Intent {
    pub const ALL: [Intent; 12] = [
        Intent::MoveForward,
        Intent::MoveBack,
        Intent::TurnLeft,
        Intent::TurnRight,
        Intent::Jump,
        Intent::Push,
        Intent::TrickSpin,
        Intent::TrickGrab,
        Intent::TrickFlip,
        Intent::TrickShove,
        Intent::CameraLeft,
        Intent::CameraRight,
    ];
}

/// Per-frame snapshot of the active intents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkateIntents {
    pub forward: bool,
    pub back: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub jump: bool,
    pub push: bool,
    pub spin: bool,
    pub grab: bool,
    pub flip: bool,
    pub shove: bool,
    pub camera_left: bool,
    pub camera_right: bool,
}

impl SkateIntents {
    pub fn set(&mut self, intent: Intent, active: bool) {
        let slot = match intent {
            Intent::MoveForward => &mut self.forward,
            Intent::MoveBack => &mut self.back,
            Intent::TurnLeft => &mut self.turn_left,
            Intent::TurnRight => &mut self.turn_right,
            Intent::Jump => &mut self.jump,
            Intent::Push => &mut self.push,
            Intent::TrickSpin => &mut self.spin,
            Intent::TrickGrab => &mut self.grab,
            Intent::TrickFlip => &mut self.flip,
            Intent::TrickShove => &mut self.shove,
            Intent::CameraLeft => &mut self.camera_left,
            Intent::CameraRight => &mut self.camera_right,
        };
        *slot = active;
    }

    /// Signed forward/back axis: +1 forward, -1 back, 0 for none or both.
    pub fn throttle(&self) -> f32 {
        (self.forward as i32 - self.back as i32) as f32
    }

    /// Signed turn axis: +1 left (counter-clockwise yaw), -1 right.
    pub fn steer(&self) -> f32 {
        (self.turn_left as i32 - self.turn_right as i32) as f32
    }

    /// Signed camera nudge axis: +1 left, -1 right.
    pub fn camera_nudge(&self) -> f32 {
        (self.camera_left as i32 - self.camera_right as i32) as f32
    }
}

/// Tracks which physical keys are held and folds them into intents.
///
/// Pressing an already-held key or releasing a key that is not held changes nothing,
/// so repeated or out-of-order key events are harmless.
#[derive(Clone, Debug)]
pub struct IntentTracker<K: Eq + Hash + Copy> {
    bindings: HashMap<K, Intent>,
    held: HashMap<Intent, HashSet<K>>,
}

impl<K: Eq + Hash + Copy> Default for IntentTracker<K> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
            held: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy> IntentTracker<K> {
    pub fn new(bindings: impl IntoIterator<Item = (K, Intent)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
            held: HashMap::new(),
        }
    }

    /// Bind (or rebind) a key. A held key is released from its old intent first.
    pub fn bind(&mut self, key: K, intent: Intent) {
        self.release(key);
        self.bindings.insert(key, intent);
    }

    pub fn press(&mut self, key: K) {
        if let Some(intent) = self.bindings.get(&key).copied() {
            self.held.entry(intent).or_default().insert(key);
        }
    }

    pub fn release(&mut self, key: K) {
        if let Some(intent) = self.bindings.get(&key).copied() {
            if let Some(keys) = self.held.get_mut(&intent) {
                keys.remove(&key);
            }
        }
    }

    /// Drop every held key (e.g. when the window loses focus).
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_active(&self, intent: Intent) -> bool {
        self.held.get(&intent).is_some_and(|keys| !keys.is_empty())
    }

    pub fn snapshot(&self) -> SkateIntents {
        let mut intents = SkateIntents::default();
        for intent in Intent::ALL {
            intents.set(intent, self.is_active(intent));
        }
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> IntentTracker<char> {
        IntentTracker::new([
            ('w', Intent::MoveForward),
            ('^', Intent::MoveForward),
            (' ', Intent::Jump),
            ('j', Intent::TrickSpin),
        ])
    }

    #[test]
    fn two_keys_one_intent() {
        let mut t = tracker();
        t.press('w');
        t.press('^');
        t.release('w');
        assert!(t.snapshot().forward, "still held through the second key");
        t.release('^');
        assert!(!t.snapshot().forward);
    }

    #[test]
    fn repeated_events_are_idempotent() {
        let mut t = tracker();
        t.press(' ');
        t.press(' ');
        t.release(' ');
        assert!(!t.is_active(Intent::Jump));
        t.release(' ');
        assert!(!t.is_active(Intent::Jump));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut t = tracker();
        t.press('z');
        assert_eq!(t.snapshot(), SkateIntents::default());
    }

    #[test]
    fn clear_releases_everything() {
        let mut t = tracker();
        t.press('w');
        t.press('j');
        t.clear();
        assert_eq!(t.snapshot(), SkateIntents::default());
    }

    #[test]
    fn rebinding_a_held_key_releases_old_intent() {
        let mut t = tracker();
        t.press('j');
        t.bind('j', Intent::TrickGrab);
        assert!(!t.is_active(Intent::TrickSpin));
        assert!(!t.is_active(Intent::TrickGrab));
    }

    #[test]
    fn axes() {
        let intents = SkateIntents {
            forward: true,
            back: true,
            turn_right: true,
            ..Default::default()
        };
        assert_eq!(intents.throttle(), 0.0);
        assert_eq!(intents.steer(), -1.0);
    }
}
