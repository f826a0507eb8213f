//! TUI host for the Cue player using ratatui.

mod app;
mod input;
pub mod markdown;
mod media;
mod theme;
mod views;

pub use app::{App, ArticleView, CuePlayer, InputMode, SEEK_STEP_SECONDS, next_step_links};
pub use input::{InputPump, apply_event, handle_events, handle_key};
pub use media::{MediaClock, MediaSample};
pub use theme::{Glyphs, Palette, glyphs, palette, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Padding, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;

use cue_engine::{EngagementMachine, Screen};
use cue_types::ContentPayload;

pub use self::markdown::clear_render_cache;
use self::markdown::render_markdown;
use self::views::clean;

/// What the main region shows this frame.
enum View {
    Browser,
    Session,
    Message {
        title: &'static str,
        body: String,
        retry: bool,
    },
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let input_height = match app.mode() {
        InputMode::Normal => 0,
        InputMode::Filter | InputMode::Compose | InputMode::ResolvePractice => 3,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),               // Browser or session
            Constraint::Length(input_height), // Text entry and prompts
            Constraint::Length(1),            // Notice / status
            Constraint::Length(1),            // Key hints
        ])
        .split(frame.area());

    let view = match app.player().screen() {
        Screen::Idle | Screen::Closed => View::Browser,
        Screen::Playing(_) => View::Session,
        Screen::Unavailable { reason } => View::Message {
            title: "Content not available",
            body: clean(reason),
            retry: false,
        },
        Screen::Failed { message, .. } => View::Message {
            title: "Something went wrong",
            body: clean(message),
            retry: true,
        },
    };

    match view {
        View::Browser => draw_browser(frame, app, chunks[0], &palette, &glyphs),
        View::Session => draw_session(frame, app, chunks[0], &palette, &glyphs),
        View::Message { title, body, retry } => {
            draw_message_screen(frame, chunks[0], title, &body, retry, &palette);
        }
    }
    if input_height > 0 {
        draw_input(frame, app, chunks[1], &palette);
    }
    draw_status_bar(frame, app, chunks[2], &palette);
    draw_key_hints(frame, app, chunks[3], &palette);
}

fn draw_browser(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(1), // Filter chips
            Constraint::Length(1),
            Constraint::Min(1), // Items
        ])
        .split(area);

    let items = app.visible_items();
    let title = Line::from(vec![
        Span::styled(" Cue ", styles::title(palette)),
        Span::styled(
            format!("{} of {}", items.len(), app.player().catalog().len()),
            styles::muted(palette),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let filter = app.filter();
    let chip = |label: &'static str, value: Option<String>| {
        let active = value.is_some();
        vec![
            Span::styled(format!(" {label}: "), styles::muted(palette)),
            Span::styled(
                value.unwrap_or_else(|| "all".to_string()),
                if active {
                    styles::key_highlight(palette)
                } else {
                    Style::default().fg(palette.text_secondary)
                },
            ),
        ]
    };
    let mut chips = chip("Pillar", filter.pillar.as_deref().map(clean));
    chips.extend(chip(
        "Kind",
        filter.kind.map(|kind| kind.display_name().to_string()),
    ));
    chips.extend(chip("Search", filter.text_query.as_deref().map(clean)));
    frame.render_widget(Paragraph::new(Line::from(chips)), chunks[1]);

    let list_area = chunks[3];
    if items.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(
                "Nothing matches this filter.",
                Style::default().fg(palette.text_secondary),
            )),
            Line::from(Span::styled("Press x to clear it.", styles::muted(palette))),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(empty, list_area);
        return;
    }

    let rows = usize::from(list_area.height.max(1));
    let first = app.cursor().saturating_sub(rows - 1);
    let width = usize::from(list_area.width);
    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(i, item)| {
            let selected = i == app.cursor();
            let kind = item.kind();
            let marker = if selected { glyphs.selected } else { " " };
            let badge = format!("{:<9}", kind.display_name());
            let title = clean(item.title());
            let pillar = clean(item.pillar_id());
            let used = 3 + badge.width() + pillar.width() + 2;
            let title = truncate_with_ellipsis(&title, width.saturating_sub(used));
            let title_style = if selected {
                styles::selected(palette)
            } else {
                Style::default().fg(palette.text_primary)
            };
            Line::from(vec![
                Span::styled(format!(" {marker} "), styles::key_highlight(palette)),
                Span::styled(badge, Style::default().fg(palette.kind(kind))),
                Span::styled(title, title_style),
                Span::styled(format!("  {pillar}"), styles::muted(palette)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), list_area);
}

fn draw_session(frame: &mut Frame, app: &mut App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let Some(session) = app.session() else {
        return;
    };
    let header = views::session_header(session, palette);
    let kind_name = session.kind().display_name();
    let article = match session.item().payload() {
        ContentPayload::Block(block) => Some(render_markdown(
            &clean(&block.body),
            Style::default().fg(palette.text_primary),
            palette,
        )),
        _ => None,
    };
    let body = match session.machine() {
        EngagementMachine::Block(_) => views::block_extras(app, palette, glyphs),
        EngagementMachine::Video(_) => views::video_body(app, palette, glyphs),
        EngagementMachine::Practice(_) => views::practice_body(app, palette, glyphs),
        EngagementMachine::Lesson(_) => views::lesson_body(app, palette, glyphs),
    };
    let disclosure = views::disclosure_lines(app, palette, glyphs);

    let disclosure_height = (disclosure.len() as u16 + 2).min(area.height / 2).max(3);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(disclosure_height),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(header), chunks[0]);

    let frame_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette))
        .padding(Padding::horizontal(1))
        .title(Span::styled(format!(" {kind_name} "), styles::muted(palette)));
    let inner = frame_block.inner(chunks[1]);
    frame.render_widget(frame_block, chunks[1]);

    match article {
        Some(article) => draw_article(frame, app, inner, article, body, palette),
        None => {
            let paragraph = Paragraph::new(body).wrap(Wrap { trim: false });
            frame.render_widget(paragraph, inner);
        }
    }

    let truth = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette))
        .padding(Padding::horizontal(1))
        .title(Span::styled(" Truth Layer ", styles::muted(palette)));
    frame.render_widget(
        Paragraph::new(disclosure).block(truth).wrap(Wrap { trim: false }),
        chunks[2],
    );
}

/// Scrollable article with the post-reading panel underneath once revealed.
fn draw_article(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    article: Vec<Line<'static>>,
    extras: Vec<Line<'static>>,
    palette: &Palette,
) {
    let (article_area, extras_area) = if extras.is_empty() {
        (area, None)
    } else {
        let wanted = wrapped_line_count(&extras, area.width).saturating_add(1);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(wanted.min(area.height / 2)),
            ])
            .split(area);
        (chunks[0], Some(chunks[1]))
    };

    let paragraph = Paragraph::new(article).wrap(Wrap { trim: false });
    let content_height =
        u16::try_from(paragraph.line_count(article_area.width)).unwrap_or(u16::MAX);
    app.record_article_layout(content_height, article_area.height);
    let offset = app.article().offset();
    frame.render_widget(paragraph.scroll((offset, 0)), article_area);

    let max_offset = content_height.saturating_sub(article_area.height);
    if max_offset > 0 {
        let mut state = ScrollbarState::new(usize::from(max_offset)).position(usize::from(offset));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None)
                .thumb_style(Style::default().fg(palette.accent))
                .track_style(Style::default().fg(palette.bg_border)),
            article_area,
            &mut state,
        );
    }

    if let Some(extras_area) = extras_area {
        let panel = Block::default()
            .borders(Borders::TOP)
            .border_style(styles::border(palette));
        frame.render_widget(
            Paragraph::new(extras).block(panel).wrap(Wrap { trim: false }),
            extras_area,
        );
    }
}

fn draw_message_screen(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    body: &str,
    retry: bool,
    palette: &Palette,
) {
    let color = if retry { palette.error } else { palette.warning };
    let mut lines = vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            body.to_string(),
            Style::default().fg(palette.text_secondary),
        )),
        Line::default(),
    ];
    lines.push(Line::from(Span::styled(
        if retry {
            "Press r to try again or Esc to go back."
        } else {
            "Press Esc to go back."
        },
        styles::muted(palette),
    )));
    let top = area.height.saturating_sub(lines.len() as u16) / 3;
    let area = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let (label, text) = match app.mode() {
        InputMode::Filter => (" Search ", format!("{}▏", app.draft())),
        InputMode::Compose => (" Reflection ", format!("{}▏", app.draft())),
        InputMode::ResolvePractice => (
            " Practice ",
            "Did you finish the practice? y / n".to_string(),
        ),
        InputMode::Normal => return,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.accent))
        .title(Span::styled(label, styles::key_highlight(palette)));
    let inner_width = usize::from(area.width.saturating_sub(2));
    // Keep the caret in view on long drafts.
    let visible = tail_to_width(&text, inner_width);
    frame.render_widget(
        Paragraph::new(Span::styled(
            visible,
            Style::default().fg(palette.text_primary),
        ))
        .block(block),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let notice = app.session().and_then(|session| session.notice());
    let line = if let Some(notice) = notice {
        Line::from(Span::styled(
            format!(" {} ", notice.message()),
            styles::notice(palette),
        ))
    } else if let Some(status) = app.status() {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(clean(status), Style::default().fg(palette.text_secondary)),
        ])
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_key_hints(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, action)) in views::key_hints(app).into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", styles::key_hint(palette)));
        }
        spans.push(Span::styled(key, styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}"), styles::key_hint(palette)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: u16 = 0;

    for line in lines {
        let line_width = line.width();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(rows as u16);
    }

    total
}

fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let trimmed = raw.trim();
    if trimmed.width() <= max {
        return trimmed.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in trimmed.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max - 3 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// The rightmost part of `text` that fits in `max` columns.
fn tail_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut used = 0;
    let mut start = text.len();
    for (i, c) in text.char_indices().rev() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        start = i;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use cue_engine::PlayerAction;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::app::tests::{app, app_with};

    fn render(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn browser_lists_the_catalog() {
        let mut app = app();
        let screen = render(&mut app, 80, 20);
        assert!(screen.contains("4 of 4"));
        assert!(screen.contains("Why breath works"));
        assert!(screen.contains("Box breathing"));
        assert!(screen.contains("Pillar: all"));
        assert!(screen.contains("Enter open"));
    }

    #[test]
    fn empty_filter_explains_itself() {
        let mut app = app();
        app.begin_filter();
        for c in "zzz".chars() {
            app.push_char(c);
        }
        let screen = render(&mut app, 80, 20);
        assert!(screen.contains("Nothing matches this filter."));
        assert!(screen.contains("Search: zzz"));
    }

    #[test]
    fn short_article_is_revealed_after_the_first_frame() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        let screen = render(&mut app, 80, 30);
        assert!(screen.contains("Slow exhales calm the system."));
        assert!(screen.contains("Truth Layer opens"));

        // The first frame recorded the layout; the tick reports it.
        app.tick(now + Duration::from_millis(20));
        let screen = render(&mut app, 80, 30);
        assert!(screen.contains("Reflection"));
        assert!(screen.contains("Next steps"));
        assert!(screen.contains("Lineage"));
        assert!(screen.contains("100% engaged"));
    }

    #[test]
    fn expanded_section_shows_its_rows() {
        let now = Instant::now();
        let mut app = app();
        app.open("p-1", now);
        app.advance(now + Duration::from_secs(5));
        app.toggle_section(now + Duration::from_secs(6));
        let screen = render(&mut app, 80, 30);
        assert!(screen.contains("People: Deb Dana"));
    }

    #[test]
    fn practice_shows_the_current_step() {
        let mut app = app();
        app.open("p-1", Instant::now());
        let screen = render(&mut app, 80, 24);
        assert!(screen.contains("Step 1 of 2"));
        assert!(screen.contains("In for four"));
    }

    #[test]
    fn gate_refusal_shows_a_notice() {
        let now = Instant::now();
        let mut app = app();
        app.open("b-1", now);
        let _ = app.dispatch(PlayerAction::ToggleSection(app.section_cursor()), now);
        let notice = app
            .session()
            .and_then(|s| s.notice())
            .map(|n| n.message().to_string())
            .unwrap();
        let screen = render(&mut app, 120, 30);
        assert!(screen.contains(&notice));
    }

    #[test]
    fn lesson_state_check_lists_choices() {
        let now = Instant::now();
        let mut app = app();
        app.open("l-1", now);
        for _ in 0..3 {
            app.advance(now);
        }
        app.launch_practice(now);
        app.resolve_practice(true, now);
        app.advance(now);
        app.advance(now);
        let screen = render(&mut app, 80, 30);
        assert!(screen.contains("Scene 6 of 7"));
        assert!(screen.contains("Overwhelmed"));
    }

    #[test]
    fn pre_check_shows_sliders() {
        let mut app = app();
        app.open("v-1", Instant::now());
        let screen = render(&mut app, 80, 24);
        assert!(screen.contains("How are you arriving?"));
        assert!(screen.contains("Anchorage"));
        assert!(screen.contains("5/10"));
    }

    #[test]
    fn failure_offers_retry() {
        let mut app = app();
        app.open("b-1", Instant::now());
        app.fail("render failed");
        let screen = render(&mut app, 80, 20);
        assert!(screen.contains("Something went wrong"));
        assert!(screen.contains("render failed"));
        assert!(screen.contains("r retry"));
    }

    #[test]
    fn compose_box_shows_the_draft() {
        let mut app = app();
        app.open("b-1", Instant::now());
        let now = Instant::now();
        // Reveal first so a reflection can be written.
        render(&mut app, 80, 30);
        app.tick(now + Duration::from_millis(20));
        app.begin_compose(now);
        for c in "calmer".chars() {
            app.push_char(c);
        }
        let screen = render(&mut app, 80, 30);
        assert!(screen.contains("calmer"));
        assert!(screen.contains("Enter save"));
    }

    #[test]
    fn ascii_mode_draws_ascii_markers() {
        let mut app = app_with(cue_types::ui::UiOptions {
            ascii_only: true,
            high_contrast: false,
        });
        let screen = render(&mut app, 80, 20);
        assert!(screen.contains(" > "));
        assert!(!screen.contains('▸'));
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_with_ellipsis("breathing", 20), "breathing");
        assert_eq!(truncate_with_ellipsis("breathing slowly", 8), "breat...");
        assert_eq!(tail_to_width("abcdef", 3), "def");
    }
}
