//! Shared fixtures: a small catalog and a player wired to recording fakes.

#![allow(dead_code)]

use std::time::Instant;

use cue_engine::{
    Catalog, EngagementSettings, ListenerRegistry, Player, PlayerAction, RecordingNavigator,
    RecordingSink, ScrollMetrics,
};
use serde_json::{Value, json};

pub type TestPlayer = Player<RecordingSink, RecordingNavigator, ListenerRegistry>;

fn truth(pre_post_state: bool) -> Value {
    json!({
        "lineage": { "people": ["Deb Dana"], "lens": "Polyvagal" },
        "targeting": { "pillar": "regulation", "also_helps": ["sleep", "focus"] },
        "state_fit": { "best_when": "wired or scattered", "not_when": "acute crisis" },
        "proof_hooks": {
            "pre_post_state": pre_post_state,
            "completion_log": true,
            "reflections": ["What shifted?"]
        }
    })
}

pub fn block_record() -> Value {
    json!({
        "id": "b-breath",
        "kind": "block",
        "pillar_id": "regulation",
        "title": "Why Slow Breathing Works",
        "truth_layer": truth(false),
        "body": "# Slow breathing\n\nA longer exhale tells the body it is safe.",
        "reading_time_minutes": 4,
        "embedded_practice": { "id": "p-box", "title": "Box Breathing", "duration_minutes": 2 },
        "next_steps": {
            "insights": [{ "id": "b-repair", "title": "Repair After Rupture" }],
            "practices": [{ "id": "p-box", "title": "Box Breathing" }]
        }
    })
}

pub fn video_record() -> Value {
    json!({
        "id": "v-downshift",
        "kind": "wellbeing_video",
        "pillar_id": "regulation",
        "title": "Five Minute Downshift",
        "truth_layer": truth(true),
        "video_url": "https://cdn.example/downshift.mp4",
        "thumbnail_url": "https://cdn.example/downshift.jpg",
        "duration_minutes": 5,
        "chapters": [
            { "timestamp": 0, "title": "Arrive", "phase": "arrival" },
            { "timestamp": 60, "title": "Settle", "phase": "safety" },
            { "timestamp": 240, "title": "Land", "phase": "landing" }
        ],
        "primary_purpose": "downshift",
        "embedded_practice": { "id": "p-box", "title": "Box Breathing", "duration_minutes": 2 }
    })
}

pub fn practice_record() -> Value {
    json!({
        "id": "p-box",
        "kind": "practice",
        "pillar_id": "regulation",
        "title": "Box Breathing",
        "truth_layer": truth(false),
        "steps": [
            { "instruction": "Breathe in for four", "duration_seconds": 4 },
            { "instruction": "Hold for four", "duration_seconds": 4 },
            { "instruction": "Breathe out for four", "duration_seconds": 4 },
            {
                "instruction": "Hold for four",
                "duration_seconds": 4,
                "voice_guidance": "Soften the jaw"
            }
        ]
    })
}

pub fn lesson_record() -> Value {
    let types = [
        "teaching",
        "teaching",
        "reflection",
        "practice_injection",
        "teaching",
        "state_check",
        "reflection",
    ];
    let scenes: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let mut scene = json!({ "label": format!("Scene {}", i + 1), "type": kind });
            if *kind == "practice_injection" {
                scene["practice"] =
                    json!({ "id": "p-box", "title": "Box Breathing", "duration_minutes": 2 });
            }
            scene
        })
        .collect();
    json!({
        "id": "l-window",
        "kind": "micro_lesson",
        "pillar_id": "connection",
        "title": "Your Window of Tolerance",
        "truth_layer": truth(false),
        "scenes": scenes
    })
}

pub fn catalog_json() -> String {
    json!([block_record(), video_record(), practice_record(), lesson_record()]).to_string()
}

pub fn player_with(settings: EngagementSettings) -> TestPlayer {
    let catalog = Catalog::from_json(&catalog_json()).expect("fixture catalog parses");
    assert!(catalog.rejected().is_empty(), "{:?}", catalog.rejected());
    Player::new(
        catalog,
        settings,
        RecordingSink::new(),
        RecordingNavigator::new(),
        ListenerRegistry::new(),
    )
}

pub fn player() -> TestPlayer {
    player_with(EngagementSettings::default())
}

pub fn scroll(top: f64, height: f64, client: f64) -> PlayerAction {
    PlayerAction::Scroll(ScrollMetrics::new(top, height, client))
}

pub fn media(current: f64, duration: f64) -> PlayerAction {
    PlayerAction::MediaTime { current, duration }
}

/// Start a video past its pre-check.
pub fn start_video(player: &mut TestPlayer, now: Instant) {
    player.select("v-downshift", now);
    player
        .dispatch(PlayerAction::DismissPreCheck, now)
        .expect("dismiss pre-check");
    player
        .dispatch(PlayerAction::StartPlayback, now)
        .expect("start playback");
}
