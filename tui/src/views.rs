//! Line builders for each screen region.
//!
//! Everything here reads the [`App`] and returns owned lines so the caller
//! is free to mutate the app (article geometry) before rendering.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use cue_engine::machine::{PracticeOffer, PracticePhase, VideoPhase};
use cue_engine::{CheckInChoice, EngagementMachine, NextStepKind, Screen, Session, disclosure_view};
use cue_types::{
    ContentItem, ContentPayload, SceneType, StateDimension, StateSnapshot, sanitize_display_text,
};

use crate::app::{App, InputMode, next_step_links};
use crate::theme::{Glyphs, Palette, styles};

pub(crate) fn clean(text: &str) -> String {
    sanitize_display_text(text).into_owned()
}

/// `m:ss`, clamped at zero.
pub(crate) fn clock(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

pub(crate) fn meter(filled: usize, width: usize, glyphs: &Glyphs) -> String {
    let filled = filled.min(width);
    format!(
        "{}{}",
        glyphs.bar_full.repeat(filled),
        glyphs.bar_empty.repeat(width - filled)
    )
}

fn blank() -> Line<'static> {
    Line::default()
}

fn heading(text: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn text(text: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        clean(text),
        Style::default().fg(palette.text_primary),
    ))
}

fn muted(text: impl Into<String>, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(text.into(), styles::muted(palette)))
}

/// Title and metadata rows above a playing session.
pub(crate) fn session_header(session: &Session, palette: &Palette) -> Vec<Line<'static>> {
    let item = session.item();
    let kind = item.kind();
    let mut title = vec![
        Span::styled(
            format!(" {} ", kind.display_name()),
            Style::default()
                .fg(palette.bg_dark)
                .bg(palette.kind(kind))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(clean(item.title()), styles::title(palette)),
    ];
    if let Some(subtitle) = item.subtitle() {
        title.push(Span::styled(
            format!("  {}", clean(subtitle)),
            Style::default().fg(palette.text_secondary),
        ));
    }
    let meta = format!(
        "{} {} engaged",
        clean(item.pillar_id()),
        session.percent_engaged()
    );
    vec![Line::from(title), muted(meta, palette)]
}

fn offer_line(
    offer: &PracticeOffer,
    title: Option<&str>,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Option<Line<'static>> {
    let title = clean(title.unwrap_or("Guided practice"));
    let (marker, note, color) = match offer {
        PracticeOffer::Unavailable => return None,
        PracticeOffer::Offered(_) => (glyphs.pending, "l to open", palette.text_primary),
        PracticeOffer::Launched(_) => (glyphs.pending, "opened", palette.warning),
        PracticeOffer::Resolved {
            completed: true, ..
        } => (glyphs.done, "done", palette.success),
        PracticeOffer::Resolved {
            completed: false, ..
        } => (glyphs.pending, "l to try again", palette.text_secondary),
    };
    Some(Line::from(vec![
        Span::styled(format!("{marker} Practice: "), Style::default().fg(color)),
        Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  ({note})"), styles::muted(palette)),
    ]))
}

fn reflection_lines(answer: &str, palette: &Palette) -> Vec<Line<'static>> {
    if answer.trim().is_empty() {
        return vec![muted("  (press r to write)", palette)];
    }
    answer
        .lines()
        .map(|line| {
            Line::from(Span::styled(
                format!("  {}", clean(line)),
                Style::default()
                    .fg(palette.text_secondary)
                    .add_modifier(Modifier::ITALIC),
            ))
        })
        .collect()
}

fn next_step_lines(item: &ContentItem, palette: &Palette) -> Vec<Line<'static>> {
    let links = next_step_links(item);
    if links.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![blank(), heading("Next steps", palette)];
    for (i, (kind, link)) in links.iter().take(9).enumerate() {
        let label = match kind {
            NextStepKind::Insight => "Insight",
            NextStepKind::Practice => "Practice",
            NextStepKind::Wellbeing => "Wellbeing",
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", i + 1), styles::key_highlight(palette)),
            Span::styled(format!("{label}: "), styles::muted(palette)),
            Span::styled(clean(&link.title), Style::default().fg(palette.text_primary)),
        ]));
    }
    lines
}

/// What appears under an article once its end is reached.
pub(crate) fn block_extras(app: &App, palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let (Some(block), Some(session)) = (app.block(), app.session()) else {
        return Vec::new();
    };
    let Some(reflection) = block.reflection() else {
        return Vec::new();
    };
    let item = session.item();
    let mut lines = vec![heading("Reflection", palette)];
    lines.extend(reflection_lines(reflection, palette));
    let title = item.embedded_practice().map(|p| p.title.as_str());
    if let Some(line) = offer_line(block.practice(), title, palette, glyphs) {
        lines.push(blank());
        lines.push(line);
    }
    lines.extend(next_step_lines(item, palette));
    lines
}

fn slider_lines(
    values: StateSnapshot,
    focus: StateDimension,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Vec<Line<'static>> {
    StateDimension::ALL
        .iter()
        .map(|&dimension| {
            let value = values.get(dimension).value();
            let focused = dimension == focus;
            let marker = if focused { glyphs.selected } else { " " };
            let label_style = if focused {
                styles::selected(palette)
            } else {
                Style::default().fg(palette.text_secondary)
            };
            Line::from(vec![
                Span::styled(format!(" {marker} "), styles::key_highlight(palette)),
                Span::styled(format!("{:<10}", dimension.label()), label_style),
                Span::styled(
                    meter(usize::from(value), 10, glyphs),
                    Style::default().fg(palette.accent),
                ),
                Span::styled(format!(" {value:>2}/10"), styles::muted(palette)),
            ])
        })
        .collect()
}

pub(crate) fn video_body(app: &App, palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let (Some(video), Some(session)) = (app.video(), app.session()) else {
        return Vec::new();
    };
    let ContentPayload::WellbeingVideo(content) = session.item().payload() else {
        return Vec::new();
    };
    let media = app.media();
    let mut lines = Vec::new();
    match video.phase() {
        VideoPhase::PreCheck { dismissed: false } => {
            lines.push(heading("How are you arriving?", palette));
            lines.push(blank());
            if let Some(values) = video.slider_values() {
                lines.extend(slider_lines(values, app.dimension(), palette, glyphs));
            }
            lines.push(blank());
            lines.push(muted("Enter to continue", palette));
        }
        VideoPhase::PreCheck { dismissed: true } => {
            lines.push(heading("Ready when you are", palette));
            lines.push(muted(
                format!("{} min, {} chapters", content.duration_minutes, content.chapters.len()),
                palette,
            ));
            for chapter in &content.chapters {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {:>5}  ", clock(f64::from(chapter.timestamp))),
                        styles::muted(palette),
                    ),
                    Span::styled(clean(&chapter.title), Style::default().fg(palette.text_primary)),
                ]));
            }
            lines.push(blank());
            lines.push(muted("Enter to play", palette));
        }
        VideoPhase::Playing => {
            let state = if media.is_running() { "Playing" } else { "Paused" };
            lines.push(heading(state, palette));
            if let Some(chapter) = content.chapter_at(media.position()) {
                lines.push(text(&chapter.title, palette));
            }
            lines.push(blank());
            let ratio = if media.duration() > 0.0 {
                media.position() / media.duration()
            } else {
                0.0
            };
            let filled = (ratio.clamp(0.0, 1.0) * 30.0).round() as usize;
            lines.push(Line::from(vec![
                Span::styled(meter(filled, 30, glyphs), Style::default().fg(palette.peach)),
                Span::styled(
                    format!("  {} / {}", clock(media.position()), clock(media.duration())),
                    styles::muted(palette),
                ),
            ]));
        }
        VideoPhase::PostCheck => {
            if let Some(values) = video.slider_values() {
                lines.push(heading("How are you now?", palette));
                lines.push(blank());
                lines.extend(slider_lines(values, app.dimension(), palette, glyphs));
                lines.push(blank());
            }
            let answer = match video.helped() {
                Some(true) => "yes",
                Some(false) => "no",
                None => "y / n",
            };
            lines.push(Line::from(vec![
                Span::styled("Did this help?  ", Style::default().fg(palette.text_primary)),
                Span::styled(answer, styles::key_highlight(palette)),
            ]));
            lines.push(blank());
            lines.push(heading("Reflection", palette));
            lines.extend(reflection_lines(video.reflection(), palette));
            let title = session.item().embedded_practice().map(|p| p.title.as_str());
            if let Some(line) = offer_line(video.practice(), title, palette, glyphs) {
                lines.push(blank());
                lines.push(line);
            }
            lines.extend(next_step_lines(session.item(), palette));
        }
        VideoPhase::Completed => {
            lines.push(heading(&format!("{} Saved", glyphs.done), palette));
            lines.extend(next_step_lines(session.item(), palette));
        }
    }
    lines
}

pub(crate) fn practice_body(app: &App, palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let (Some(practice), Some(session)) = (app.practice(), app.session()) else {
        return Vec::new();
    };
    let ContentPayload::Practice(content) = session.item().payload() else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    match practice.phase() {
        PracticePhase::Stepping { index, elapsed, .. } => {
            let Some(step) = content.steps.get(index) else {
                return lines;
            };
            lines.push(muted(
                format!("Step {} of {}", index + 1, practice.step_count()),
                palette,
            ));
            lines.push(blank());
            lines.push(Line::from(Span::styled(
                clean(&step.instruction),
                styles::title(palette),
            )));
            if let Some(voice) = &step.voice_guidance {
                lines.push(blank());
                lines.push(Line::from(Span::styled(
                    clean(voice),
                    Style::default()
                        .fg(palette.text_secondary)
                        .add_modifier(Modifier::ITALIC),
                )));
            }
            lines.push(blank());
            let timing = if elapsed || step.duration_seconds == 0 {
                format!("{} {}", glyphs.done, clock(f64::from(step.duration_seconds)))
            } else {
                format!("{} {}", glyphs.pending, clock(f64::from(step.duration_seconds)))
            };
            lines.push(muted(timing, palette));
            let next = if practice.is_final_step() {
                "Enter to finish"
            } else {
                "Enter for the next step"
            };
            lines.push(muted(next, palette));
        }
        PracticePhase::Completed => {
            lines.push(heading(&format!("{} Practice complete", glyphs.done), palette));
            lines.extend(next_step_lines(session.item(), palette));
        }
    }
    lines
}

pub(crate) fn lesson_body(app: &App, palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let (Some(lesson), Some(session)) = (app.lesson(), app.session()) else {
        return Vec::new();
    };
    let mut progress = Vec::new();
    for i in 0..lesson.scene_count() {
        let glyph = if i <= lesson.furthest() || lesson.is_completed() {
            glyphs.done
        } else {
            glyphs.pending
        };
        let style = if lesson.current_scene() == Some(i) {
            styles::key_highlight(palette)
        } else {
            styles::muted(palette)
        };
        progress.push(Span::styled(format!("{glyph} "), style));
    }
    let mut lines = vec![Line::from(progress), blank()];

    let Some((index, scene)) = app.current_scene() else {
        lines.push(heading(&format!("{} Lesson complete", glyphs.done), palette));
        lines.extend(next_step_lines(session.item(), palette));
        return lines;
    };
    lines.push(muted(
        format!("Scene {} of {}", index + 1, lesson.scene_count()),
        palette,
    ));
    lines.push(Line::from(Span::styled(clean(&scene.label), styles::title(palette))));
    lines.push(blank());
    match scene.scene_type {
        SceneType::Teaching => {}
        SceneType::Reflection => {
            lines.push(heading("Your answer", palette));
            lines.extend(reflection_lines(
                lesson.reflection(index).unwrap_or_default(),
                palette,
            ));
        }
        SceneType::PracticeInjection => {
            let title = scene.practice.as_ref().map(|p| p.title.as_str());
            if let Some(line) = lesson
                .offer(index)
                .and_then(|offer| offer_line(offer, title, palette, glyphs))
            {
                lines.push(line);
            }
        }
        SceneType::StateCheck => {
            let picked = lesson.check_in(index);
            for (i, choice) in CheckInChoice::ALL.iter().enumerate() {
                let chosen = picked == Some(*choice);
                let style = if chosen {
                    styles::selected(palette)
                } else {
                    Style::default().fg(palette.text_secondary)
                };
                let marker = if chosen { glyphs.done } else { glyphs.pending };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {} ", i + 1), styles::key_highlight(palette)),
                    Span::styled(format!("{marker} {}", choice.label()), style),
                ]));
            }
        }
    }
    lines
}

/// Truth Layer accordion, or the locked hint before the reveal.
pub(crate) fn disclosure_lines(
    app: &App,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Vec<Line<'static>> {
    let Some(session) = app.session() else {
        return Vec::new();
    };
    if !session.truth_layer_visible() {
        return vec![muted(
            format!("{} Truth Layer opens when you reach the end", glyphs.locked),
            palette,
        )];
    }
    let mut lines = Vec::new();
    for section in disclosure_view(session.item().truth_layer(), session.disclosure()) {
        let focused = section.section == app.section_cursor();
        let marker = if section.expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        };
        let style = if focused {
            styles::selected(palette)
        } else {
            Style::default().fg(palette.text_secondary)
        };
        lines.push(Line::from(Span::styled(
            format!("{marker} {}", section.section.title()),
            style,
        )));
        if section.expanded {
            if section.rows.is_empty() {
                lines.push(muted("    nothing recorded", palette));
            }
            for row in section.rows {
                lines.push(Line::from(vec![
                    Span::styled(format!("    {}: ", row.label), styles::muted(palette)),
                    Span::styled(clean(&row.value), Style::default().fg(palette.text_primary)),
                ]));
            }
        }
    }
    lines
}

/// Key hints for the footer, as (key, action) pairs.
pub(crate) fn key_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.mode() {
        InputMode::Filter => return vec![("type", "search"), ("Enter", "done")],
        InputMode::Compose => return vec![("Enter", "save"), ("Esc", "cancel")],
        InputMode::ResolvePractice => return vec![("y", "finished"), ("n", "not finished")],
        InputMode::Normal => {}
    }
    let Some(session) = app.session() else {
        return match app.player().screen() {
            Screen::Unavailable { .. } => vec![("Esc", "back")],
            Screen::Failed { .. } => vec![("r", "retry"), ("Esc", "back")],
            _ => vec![
                ("↑↓", "move"),
                ("Enter", "open"),
                ("/", "search"),
                ("p", "pillar"),
                ("Tab", "kind"),
                ("x", "clear"),
                ("q", "quit"),
            ],
        };
    };
    let mut hints = match session.machine() {
        EngagementMachine::Block(_) => {
            vec![("↑↓", "scroll"), ("c", "complete"), ("r", "reflect")]
        }
        EngagementMachine::Video(video) => match video.phase() {
            VideoPhase::PreCheck { dismissed: false } => {
                vec![("↑↓", "slider"), ("←→", "adjust"), ("Enter", "continue")]
            }
            VideoPhase::PreCheck { dismissed: true } => vec![("Enter", "play")],
            VideoPhase::Playing => vec![("Space", "pause"), ("[ ]", "seek")],
            VideoPhase::PostCheck => vec![
                ("←→", "adjust"),
                ("y/n", "helped"),
                ("r", "reflect"),
                ("c", "complete"),
            ],
            VideoPhase::Completed => vec![],
        },
        EngagementMachine::Practice(_) => vec![("Enter", "next")],
        EngagementMachine::Lesson(_) => {
            vec![("←→", "scene"), ("1-4", "check in"), ("r", "reflect")]
        }
    };
    if session.truth_layer_visible() {
        hints.push(("Tab/t", "truth layer"));
    }
    hints.push(("Esc", "close"));
    hints
}
