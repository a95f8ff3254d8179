//! HUD - score, last trick, session timer, stories and best score
//!
//! Driven entirely by `PresentationEvent` messages from the skater.

use bevy::prelude::*;
use skate_shared::PresentationEvent;

use crate::level::Park;
use crate::persistence::SaveStore;
use crate::skater::CollectedStories;

/// Seconds a landed trick stays fully visible before fading.
const TRICK_HOLD: f32 = 2.0;
/// Seconds the fade itself takes.
const TRICK_FADE: f32 = 1.0;

#[derive(Component)]
pub struct Hud;

#[derive(Component)]
pub struct ScoreText;

#[derive(Component)]
pub struct TrickText;

#[derive(Component)]
pub struct TimerText;

#[derive(Component)]
pub struct StoriesText;

#[derive(Component)]
pub struct BestText;

/// Session totals shown on the HUD
#[derive(Resource, Default)]
pub struct HudState {
    pub score: u32,
    pub last_trick: Option<(String, u32)>,
    /// Seconds since `last_trick` landed.
    pub trick_age: f32,
    pub elapsed: f32,
    /// Title of the most recent story, shown in place of a trick.
    pub last_story: Option<String>,
}

impl HudState {
    /// Fold one event in.
    pub fn apply(&mut self, event: &PresentationEvent) {
        match event {
            PresentationEvent::TrickLanded { label, points } => {
                self.score = self.score.saturating_add(*points);
                self.last_trick = Some((label.clone(), *points));
                self.last_story = None;
                self.trick_age = 0.0;
            }
            PresentationEvent::StoryPickup { title, .. } => {
                self.last_story = Some(title.clone());
                self.last_trick = None;
                self.trick_age = 0.0;
            }
        }
    }

    /// Opacity of the trick line: full for a while, then a linear fade.
    pub fn trick_alpha(&self) -> f32 {
        if self.last_trick.is_none() && self.last_story.is_none() {
            return 0.0;
        }
        (1.0 - (self.trick_age - TRICK_HOLD) / TRICK_FADE).clamp(0.0, 1.0)
    }
}

fn format_timer(seconds: f32) -> String {
    let total = seconds.max(0.0) as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn hud_text(text: &str, size: f32, color: Color) -> (Text, TextFont, TextColor) {
    (
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
    )
}

pub fn spawn_hud(mut commands: Commands) {
    // Top-left stats column
    commands
        .spawn((
            Hud,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(20.0),
                top: Val::Px(20.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(4.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((ScoreText, hud_text("Score 0", 32.0, Color::WHITE)));
            parent.spawn((TimerText, hud_text("00:00", 20.0, Color::srgba(1.0, 1.0, 1.0, 0.8))));
            parent.spawn((
                StoriesText,
                hud_text("Stories 0", 20.0, Color::srgba(1.0, 0.85, 0.2, 0.9)),
            ));
            parent.spawn((BestText, hud_text("Best 0", 16.0, Color::srgba(0.8, 0.8, 0.8, 0.7))));
        });

    // Trick callout, centered near the bottom
    commands
        .spawn((
            Hud,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                bottom: Val::Px(80.0),
                justify_content: JustifyContent::Center,
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((TrickText, hud_text("", 36.0, Color::srgba(1.0, 0.9, 0.6, 0.0))));
        });
}

/// Fold this frame's events into the HUD state and tick timers.
pub fn update_hud_state(
    time: Res<Time>,
    mut events: MessageReader<PresentationEvent>,
    mut hud: ResMut<HudState>,
) {
    let dt = time.delta_secs();
    hud.elapsed += dt;
    hud.trick_age += dt;
    for event in events.read() {
        hud.apply(event);
    }
}

pub fn update_hud_text(
    hud: Res<HudState>,
    store: Res<SaveStore>,
    collected: Res<CollectedStories>,
    park: Res<Park>,
    mut score: Query<
        &mut Text,
        (
            With<ScoreText>,
            Without<TrickText>,
            Without<TimerText>,
            Without<StoriesText>,
            Without<BestText>,
        ),
    >,
    mut trick: Query<
        (&mut Text, &mut TextColor),
        (
            With<TrickText>,
            Without<TimerText>,
            Without<StoriesText>,
            Without<BestText>,
        ),
    >,
    mut timer: Query<&mut Text, (With<TimerText>, Without<StoriesText>, Without<BestText>)>,
    mut stories: Query<&mut Text, (With<StoriesText>, Without<BestText>)>,
    mut best: Query<&mut Text, With<BestText>>,
) {
    if let Ok(mut text) = score.single_mut() {
        text.0 = format!("Score {}", hud.score);
    }
    if let Ok(mut text) = timer.single_mut() {
        text.0 = format_timer(hud.elapsed);
    }
    if let Ok(mut text) = stories.single_mut() {
        text.0 = format!("Stories {}/{}", collected.0.len(), park.pickups.len());
    }
    if let Ok(mut text) = best.single_mut() {
        let best_score = store.data.best_score.max(hud.score);
        text.0 = if store.data.best_trick_label.is_empty() {
            format!("Best {}", best_score)
        } else {
            format!(
                "Best {}  ({} {})",
                best_score, store.data.best_trick_label, store.data.best_trick_points
            )
        };
    }
    if let Ok((mut text, mut color)) = trick.single_mut() {
        text.0 = match (&hud.last_trick, &hud.last_story) {
            (Some((label, points)), _) => format!("{} +{}", label, points),
            (None, Some(title)) => format!("Story: {}", title),
            (None, None) => String::new(),
        };
        color.0 = color.0.with_alpha(hud.trick_alpha());
    }
}
