//! Local save data - best score and collected stories
//!
//! Saved with bincode next to the executable's working directory.
//! Uses atomic writes (temp file + rename) to prevent corruption.

use std::collections::HashSet;
use std::path::PathBuf;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use skate_shared::PresentationEvent;

use crate::hud::HudState;

/// Bump when `SaveData` changes shape.
pub const SAVE_VERSION: u32 = 1;

const SAVE_DIR: &str = "save";
const SAVE_FILE: &str = "skate.bin";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub best_score: u32,
    pub best_trick_label: String,
    pub best_trick_points: u32,
    pub collected_stories: Vec<u32>,
}

impl SaveData {
    pub fn empty() -> Self {
        Self {
            version: SAVE_VERSION,
            ..Default::default()
        }
    }

    pub fn collected_set(&self) -> HashSet<u32> {
        self.collected_stories.iter().copied().collect()
    }
}

/// Resource owning the loaded save and where it lives on disk.
#[derive(Resource)]
pub struct SaveStore {
    pub data: SaveData,
    pub storage_dir: PathBuf,
    /// Set when `data` changed since the last write.
    pub dirty: bool,
}

impl SaveStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            data: SaveData::empty(),
            storage_dir,
            dirty: false,
        }
    }

    fn path(&self) -> PathBuf {
        self.storage_dir.join(SAVE_FILE)
    }

    /// Load the save file.
    ///
    /// Returns:
    /// - Ok(data) if the file exists and is valid
    /// - Err(message) if it is missing, corrupted or from another version
    pub fn load(&self) -> Result<SaveData, String> {
        let path = self.path();
        if !path.exists() {
            return Err(format!("No save file at {}", path.display()));
        }

        let bytes = std::fs::read(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        let data: SaveData = bincode::deserialize(&bytes)
            .map_err(|e| format!("Failed to deserialize {}: {}", path.display(), e))?;

        if data.version != SAVE_VERSION {
            let backup_path = self.storage_dir.join(format!("skate.v{}.backup", data.version));
            if let Err(e) = std::fs::copy(&path, &backup_path) {
                warn!("Failed to backup old save version: {}", e);
            }
            return Err(format!(
                "Save version mismatch: found v{}, expected v{}. Backed up to {:?}",
                data.version, SAVE_VERSION, backup_path
            ));
        }

        Ok(data)
    }

    /// Write the save atomically via a temp file.
    pub fn save(&self) -> Result<(), String> {
        std::fs::create_dir_all(&self.storage_dir)
            .map_err(|e| format!("Failed to create {}: {}", self.storage_dir.display(), e))?;

        let final_path = self.path();
        let temp_path = self.storage_dir.join("skate.tmp");

        let bytes = bincode::serialize(&self.data)
            .map_err(|e| format!("Serialize error: {}", e))?;

        std::fs::write(&temp_path, &bytes)
            .map_err(|e| format!("Write temp file error: {}", e))?;

        std::fs::rename(&temp_path, &final_path)
            .map_err(|e| format!("Rename error: {}", e))?;

        info!("Saved progress ({} bytes)", bytes.len());
        Ok(())
    }

    /// Fold one gameplay event into the save. `session_score` is the running total
    /// after the event. Returns true if anything changed.
    pub fn record(&mut self, event: &PresentationEvent, session_score: u32) -> bool {
        let mut changed = false;
        match event {
            PresentationEvent::TrickLanded { label, points } => {
                if session_score > self.data.best_score {
                    self.data.best_score = session_score;
                    changed = true;
                }
                if *points > self.data.best_trick_points {
                    self.data.best_trick_points = *points;
                    self.data.best_trick_label = label.clone();
                    changed = true;
                }
            }
            PresentationEvent::StoryPickup { id, .. } => {
                if !self.data.collected_stories.contains(id) {
                    self.data.collected_stories.push(*id);
                    changed = true;
                }
            }
        }
        self.dirty |= changed;
        changed
    }
}

impl Default for SaveStore {
    fn default() -> Self {
        Self::new(PathBuf::from(SAVE_DIR))
    }
}

/// Startup: read the save, falling back to an empty record.
pub fn load_save(mut store: ResMut<SaveStore>) {
    match store.load() {
        Ok(data) => {
            info!(
                "Loaded save: best score {}, {} stories collected",
                data.best_score,
                data.collected_stories.len()
            );
            store.data = data;
        }
        Err(e) => {
            warn!("{}; starting with empty progress", e);
            store.data = SaveData::empty();
        }
    }
}

/// Fold gameplay events into the save. Runs after the HUD has updated its totals.
pub fn record_progress(
    mut events: MessageReader<PresentationEvent>,
    hud: Res<HudState>,
    mut store: ResMut<SaveStore>,
) {
    for event in events.read() {
        if store.record(event, hud.score) {
            if let PresentationEvent::TrickLanded { .. } = event {
                info!("New best: {} points", store.data.best_score);
            }
        }
    }
}

/// Write the save whenever something changed this frame.
pub fn flush_save(mut store: ResMut<SaveStore>) {
    if !store.dirty {
        return;
    }
    store.dirty = false;
    if let Err(e) = store.save() {
        warn!("Failed to save progress: {}", e);
    }
}
