//! Playable content: the tagged union the player dispatches on.
//!
//! A [`ContentItem`] is validated once, when it is built. Fields are private so
//! the kind of an item can never change after construction.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::ContentId;
use crate::text::{NonEmptyString, present};
use crate::truth::TruthLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Block,
    Practice,
    WellbeingVideo,
    MicroLesson,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Block,
        ContentKind::Practice,
        ContentKind::WellbeingVideo,
        ContentKind::MicroLesson,
    ];

    /// Wire name, as used in the `kind` discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Practice => "practice",
            Self::WellbeingVideo => "wellbeing_video",
            Self::MicroLesson => "micro_lesson",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Block => "Article",
            Self::Practice => "Practice",
            Self::WellbeingVideo => "Video",
            Self::MicroLesson => "Lesson",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A titled link to another piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub id: ContentId,
    pub title: String,
}

/// Static follow-up suggestions attached to articles and videos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSteps {
    #[serde(default)]
    pub insights: Vec<LinkRef>,
    #[serde(default)]
    pub practices: Vec<LinkRef>,
    #[serde(default)]
    pub wellbeing: Vec<LinkRef>,
}

impl NextSteps {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty() && self.practices.is_empty() && self.wellbeing.is_empty()
    }
}

/// A short guided exercise offered from inside another piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedPractice {
    pub id: ContentId,
    pub title: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContent {
    /// Markdown source.
    pub body: String,
    pub reading_time_minutes: u32,
    #[serde(default)]
    pub embedded_practice: Option<EmbeddedPractice>,
    #[serde(default)]
    pub next_steps: NextSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterPhase {
    Arrival,
    Safety,
    Main,
    Landing,
    Receipt,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Offset from the start of the video, in seconds.
    pub timestamp: u32,
    pub title: String,
    pub phase: ChapterPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoPurpose {
    Downshift,
    Energize,
    Clarify,
    Connect,
    Meaning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContent {
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    pub primary_purpose: VideoPurpose,
    #[serde(default)]
    pub embedded_practice: Option<EmbeddedPractice>,
    #[serde(default)]
    pub next_steps: NextSteps,
}

impl VideoContent {
    /// Chapter playing at `seconds`: the greatest timestamp not after it.
    ///
    /// Chapters sharing a timestamp resolve to the one declared last.
    #[must_use]
    pub fn chapter_at(&self, seconds: f64) -> Option<&Chapter> {
        let mut active: Option<&Chapter> = None;
        for chapter in &self.chapters {
            if f64::from(chapter.timestamp) > seconds {
                continue;
            }
            if active.is_none_or(|best| chapter.timestamp >= best.timestamp) {
                active = Some(chapter);
            }
        }
        active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeStep {
    pub instruction: String,
    pub duration_seconds: u32,
    #[serde(default)]
    pub voice_guidance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeContent {
    pub steps: Vec<PracticeStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneType {
    Teaching,
    Reflection,
    PracticeInjection,
    StateCheck,
}

impl SceneType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teaching => "teaching",
            Self::Reflection => "reflection",
            Self::PracticeInjection => "practice_injection",
            Self::StateCheck => "state_check",
        }
    }
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonScene {
    pub label: String,
    #[serde(rename = "type")]
    pub scene_type: SceneType,
    /// Exercise offered by a practice-injection scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice: Option<EmbeddedPractice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub scenes: Vec<LessonScene>,
}

impl LessonContent {
    pub const SCENE_COUNT: usize = 7;

    pub const CANONICAL_ORDER: [SceneType; Self::SCENE_COUNT] = [
        SceneType::Teaching,
        SceneType::Teaching,
        SceneType::Reflection,
        SceneType::PracticeInjection,
        SceneType::Teaching,
        SceneType::StateCheck,
        SceneType::Reflection,
    ];
}

/// Kind-specific payload. The `kind` tag is flattened into the item object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPayload {
    Block(BlockContent),
    Practice(PracticeContent),
    WellbeingVideo(VideoContent),
    MicroLesson(LessonContent),
}

impl ContentPayload {
    #[must_use]
    pub const fn kind(&self) -> ContentKind {
        match self {
            Self::Block(_) => ContentKind::Block,
            Self::Practice(_) => ContentKind::Practice,
            Self::WellbeingVideo(_) => ContentKind::WellbeingVideo,
            Self::MicroLesson(_) => ContentKind::MicroLesson,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("content record is malformed: {0}")]
    Malformed(String),
    #[error("practice {id} has no steps")]
    EmptyPractice { id: ContentId },
    #[error("micro lesson {id} has {found} scenes, expected {expected}")]
    SceneCount {
        id: ContentId,
        found: usize,
        expected: usize,
    },
    #[error("micro lesson {id} scene {index} is {found}, expected {expected}")]
    SceneOrder {
        id: ContentId,
        index: usize,
        found: SceneType,
        expected: SceneType,
    },
}

/// One playable piece of content with its Truth Layer envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContentRecord")]
pub struct ContentItem {
    id: ContentId,
    pillar_id: String,
    title: NonEmptyString,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitle: Option<String>,
    truth_layer: TruthLayer,
    #[serde(flatten)]
    payload: ContentPayload,
}

/// Unvalidated wire shape of a [`ContentItem`].
#[derive(Debug, Deserialize)]
struct ContentRecord {
    id: ContentId,
    pillar_id: String,
    title: NonEmptyString,
    #[serde(default)]
    subtitle: Option<String>,
    truth_layer: TruthLayer,
    #[serde(flatten)]
    payload: ContentPayload,
}

impl TryFrom<ContentRecord> for ContentItem {
    type Error = ContentError;

    fn try_from(record: ContentRecord) -> Result<Self, Self::Error> {
        ContentItem::new(
            record.id,
            record.pillar_id,
            record.title,
            record.subtitle,
            record.truth_layer,
            record.payload,
        )
    }
}

impl ContentItem {
    pub fn new(
        id: ContentId,
        pillar_id: impl Into<String>,
        title: NonEmptyString,
        subtitle: Option<String>,
        truth_layer: TruthLayer,
        payload: ContentPayload,
    ) -> Result<Self, ContentError> {
        validate_payload(&id, &payload)?;
        Ok(Self {
            id,
            pillar_id: pillar_id.into(),
            title,
            subtitle,
            truth_layer,
            payload,
        })
    }

    /// Parse and validate one record.
    ///
    /// Structural problems (unknown kind, missing fields, blank id) and payload
    /// rule violations are both reported as [`ContentError`].
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let record: ContentRecord =
            serde_json::from_str(json).map_err(|e| ContentError::Malformed(e.to_string()))?;
        Self::try_from(record)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ContentError> {
        let record: ContentRecord =
            serde_json::from_value(value).map_err(|e| ContentError::Malformed(e.to_string()))?;
        Self::try_from(record)
    }

    #[must_use]
    pub fn id(&self) -> &ContentId {
        &self.id
    }

    #[must_use]
    pub fn pillar_id(&self) -> &str {
        &self.pillar_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        present(self.subtitle.as_deref())
    }

    #[must_use]
    pub fn truth_layer(&self) -> &TruthLayer {
        &self.truth_layer
    }

    #[must_use]
    pub fn payload(&self) -> &ContentPayload {
        &self.payload
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.payload.kind()
    }

    #[must_use]
    pub fn embedded_practice(&self) -> Option<&EmbeddedPractice> {
        match &self.payload {
            ContentPayload::Block(block) => block.embedded_practice.as_ref(),
            ContentPayload::WellbeingVideo(video) => video.embedded_practice.as_ref(),
            ContentPayload::Practice(_) | ContentPayload::MicroLesson(_) => None,
        }
    }

    #[must_use]
    pub fn next_steps(&self) -> Option<&NextSteps> {
        match &self.payload {
            ContentPayload::Block(block) => Some(&block.next_steps),
            ContentPayload::WellbeingVideo(video) => Some(&video.next_steps),
            ContentPayload::Practice(_) | ContentPayload::MicroLesson(_) => None,
        }
    }
}

fn validate_payload(id: &ContentId, payload: &ContentPayload) -> Result<(), ContentError> {
    match payload {
        ContentPayload::Practice(practice) if practice.steps.is_empty() => {
            Err(ContentError::EmptyPractice { id: id.clone() })
        }
        ContentPayload::MicroLesson(lesson) => {
            if lesson.scenes.len() != LessonContent::SCENE_COUNT {
                return Err(ContentError::SceneCount {
                    id: id.clone(),
                    found: lesson.scenes.len(),
                    expected: LessonContent::SCENE_COUNT,
                });
            }
            let mismatch = lesson
                .scenes
                .iter()
                .zip(LessonContent::CANONICAL_ORDER)
                .position(|(scene, expected)| scene.scene_type != expected);
            match mismatch {
                Some(index) => Err(ContentError::SceneOrder {
                    id: id.clone(),
                    index,
                    found: lesson.scenes[index].scene_type,
                    expected: LessonContent::CANONICAL_ORDER[index],
                }),
                None => Ok(()),
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn truth() -> serde_json::Value {
        json!({
            "lineage": { "people": ["Stephen Porges"] },
            "targeting": { "pillar": "regulation" },
            "state_fit": { "best_when": "wired", "not_when": "in crisis" },
            "proof_hooks": { "pre_post_state": true, "completion_log": true, "reflections": [] }
        })
    }

    fn lesson_scenes(order: &[&str]) -> serde_json::Value {
        let scenes: Vec<_> = order
            .iter()
            .enumerate()
            .map(|(i, t)| json!({ "label": format!("Scene {}", i + 1), "type": t }))
            .collect();
        json!(scenes)
    }

    const CANONICAL: [&str; 7] = [
        "teaching",
        "teaching",
        "reflection",
        "practice_injection",
        "teaching",
        "state_check",
        "reflection",
    ];

    #[test]
    fn parses_block_with_flattened_kind() {
        let value = json!({
            "id": "b-1",
            "kind": "block",
            "pillar_id": "regulation",
            "title": "Why breath works",
            "truth_layer": truth(),
            "body": "# Breath\n\nSlow exhale.",
            "reading_time_minutes": 4
        });
        let item = ContentItem::from_value(value).unwrap();
        assert_eq!(item.kind(), ContentKind::Block);
        assert_eq!(item.id(), &"b-1");
        assert!(item.embedded_practice().is_none());
        assert!(item.next_steps().is_some_and(NextSteps::is_empty));
    }

    #[test]
    fn unknown_kind_is_malformed() {
        let value = json!({
            "id": "x",
            "kind": "podcast",
            "pillar_id": "p",
            "title": "t",
            "truth_layer": truth()
        });
        assert!(matches!(
            ContentItem::from_value(value),
            Err(ContentError::Malformed(_))
        ));
    }

    #[test]
    fn blank_title_is_malformed() {
        let value = json!({
            "id": "x",
            "kind": "practice",
            "pillar_id": "p",
            "title": "   ",
            "truth_layer": truth(),
            "steps": [{ "instruction": "Breathe", "duration_seconds": 10 }]
        });
        assert!(ContentItem::from_value(value).is_err());
    }

    #[test]
    fn empty_practice_rejected() {
        let value = json!({
            "id": "p-1",
            "kind": "practice",
            "pillar_id": "p",
            "title": "Box breathing",
            "truth_layer": truth(),
            "steps": []
        });
        assert!(matches!(
            ContentItem::from_value(value),
            Err(ContentError::EmptyPractice { .. })
        ));
    }

    #[test]
    fn lesson_requires_seven_scenes() {
        let value = json!({
            "id": "l-1",
            "kind": "micro_lesson",
            "pillar_id": "p",
            "title": "Window of tolerance",
            "truth_layer": truth(),
            "scenes": lesson_scenes(&CANONICAL[..6])
        });
        assert!(matches!(
            ContentItem::from_value(value),
            Err(ContentError::SceneCount { found: 6, expected: 7, .. })
        ));
    }

    #[test]
    fn lesson_requires_canonical_order() {
        let mut order = CANONICAL;
        order.swap(0, 2);
        let value = json!({
            "id": "l-1",
            "kind": "micro_lesson",
            "pillar_id": "p",
            "title": "Window of tolerance",
            "truth_layer": truth(),
            "scenes": lesson_scenes(&order)
        });
        assert!(matches!(
            ContentItem::from_value(value),
            Err(ContentError::SceneOrder { index: 0, .. })
        ));
    }

    #[test]
    fn canonical_lesson_accepted() {
        let value = json!({
            "id": "l-1",
            "kind": "micro_lesson",
            "pillar_id": "p",
            "title": "Window of tolerance",
            "truth_layer": truth(),
            "scenes": lesson_scenes(&CANONICAL)
        });
        let item = ContentItem::from_value(value).unwrap();
        assert_eq!(item.kind(), ContentKind::MicroLesson);
    }

    #[test]
    fn blank_subtitle_reads_as_absent() {
        let value = json!({
            "id": "p-1",
            "kind": "practice",
            "pillar_id": "p",
            "title": "Box breathing",
            "subtitle": "  ",
            "truth_layer": truth(),
            "steps": [{ "instruction": "In for four", "duration_seconds": 4 }]
        });
        let item = ContentItem::from_value(value).unwrap();
        assert_eq!(item.subtitle(), None);
    }

    fn video_with(chapters: Vec<(u32, &str)>) -> VideoContent {
        VideoContent {
            video_url: "https://cdn.example/v.mp4".into(),
            thumbnail_url: "https://cdn.example/v.jpg".into(),
            duration_minutes: 5,
            chapters: chapters
                .into_iter()
                .map(|(timestamp, title)| Chapter {
                    timestamp,
                    title: title.into(),
                    phase: ChapterPhase::Main,
                })
                .collect(),
            primary_purpose: VideoPurpose::Downshift,
            embedded_practice: None,
            next_steps: NextSteps::default(),
        }
    }

    #[test]
    fn chapter_lookup_takes_greatest_timestamp_not_after() {
        let video = video_with(vec![(0, "Arrive"), (60, "Settle"), (180, "Land")]);
        assert_eq!(video.chapter_at(0.0).map(|c| c.title.as_str()), Some("Arrive"));
        assert_eq!(video.chapter_at(59.9).map(|c| c.title.as_str()), Some("Arrive"));
        assert_eq!(video.chapter_at(60.0).map(|c| c.title.as_str()), Some("Settle"));
        assert_eq!(video.chapter_at(400.0).map(|c| c.title.as_str()), Some("Land"));
    }

    #[test]
    fn chapter_lookup_before_first_is_none_and_ties_take_latest() {
        let video = video_with(vec![(30, "First"), (30, "Second"), (10, "Early")]);
        assert!(video.chapter_at(5.0).is_none());
        assert_eq!(video.chapter_at(12.0).map(|c| c.title.as_str()), Some("Early"));
        assert_eq!(video.chapter_at(31.0).map(|c| c.title.as_str()), Some("Second"));
    }
}
