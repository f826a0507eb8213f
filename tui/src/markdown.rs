//! Article markdown to ratatui lines.
//!
//! Block bodies are re-rendered every frame while scrolling, so rendered output
//! is cached per body and palette.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Palette;

const CACHE_MAX_ENTRIES: usize = 32;
const INDENT: &str = "  ";

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    content_hash: u64,
    style_hash: u64,
}

impl CacheKey {
    fn new(content: &str, base_style: Style, palette: &Palette) -> Self {
        let mut content_hasher = DefaultHasher::new();
        content.hash(&mut content_hasher);

        let mut style_hasher = DefaultHasher::new();
        // Style has no Hash impl.
        base_style.fg.hash(&mut style_hasher);
        base_style.bg.hash(&mut style_hasher);
        base_style.add_modifier.hash(&mut style_hasher);
        palette.accent.hash(&mut style_hasher);
        palette.text_muted.hash(&mut style_hasher);
        palette.peach.hash(&mut style_hasher);

        Self {
            content_hash: content_hasher.finish(),
            style_hash: style_hasher.finish(),
        }
    }
}

thread_local! {
    static RENDER_CACHE: RefCell<HashMap<CacheKey, Vec<Line<'static>>>> =
        RefCell::new(HashMap::new());
}

pub fn clear_render_cache() {
    RENDER_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Render an article body to lines, wrapping left to the caller.
#[must_use]
pub fn render_markdown(content: &str, base_style: Style, palette: &Palette) -> Vec<Line<'static>> {
    let key = CacheKey::new(content, base_style, palette);
    if let Some(lines) = RENDER_CACHE.with(|cache| cache.borrow().get(&key).cloned()) {
        return lines;
    }

    let lines = ArticleRenderer::new(base_style, palette).render(content);

    RENDER_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= CACHE_MAX_ENTRIES {
            cache.clear();
        }
        cache.insert(key, lines.clone());
    });
    lines
}

struct ArticleRenderer<'p> {
    base_style: Style,
    palette: &'p Palette,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,

    // Counters so nested emphasis unwinds correctly.
    bold: usize,
    italic: usize,
    strike: usize,
    heading: Option<HeadingLevel>,
    quote_depth: usize,

    in_code_block: bool,
    code_lines: Vec<String>,
    lists: Vec<Option<u64>>,
}

impl<'p> ArticleRenderer<'p> {
    fn new(base_style: Style, palette: &'p Palette) -> Self {
        Self {
            base_style,
            palette,
            lines: Vec::new(),
            spans: Vec::new(),
            bold: 0,
            italic: 0,
            strike: 0,
            heading: None,
            quote_depth: 0,
            in_code_block: false,
            code_lines: Vec::new(),
            lists: Vec::new(),
        }
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_SMART_PUNCTUATION;
        for event in Parser::new_ext(content, options) {
            self.handle_event(event);
        }
        self.flush_line();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let style = Style::default().fg(self.palette.peach);
                self.spans.push(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak => self.spans.push(Span::styled(" ", self.base_style)),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.blank_line();
                self.lines.push(Line::from(Span::styled(
                    format!("{INDENT}{}", "─".repeat(24)),
                    Style::default().fg(self.palette.text_muted),
                )));
                self.blank_line();
            }
            // Stray markup shows as text rather than vanishing.
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.blank_line();
                self.heading = Some(level);
            }
            Tag::Strong => self.bold += 1,
            Tag::Emphasis => self.italic += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.blank_line();
                self.in_code_block = true;
                self.code_lines.clear();
            }
            Tag::List(start) => {
                self.flush_line();
                self.lists.push(start);
            }
            Tag::Item => {
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{}{next}. ", "  ".repeat(depth));
                        *next += 1;
                        marker
                    }
                    _ => format!("{}• ", "  ".repeat(depth)),
                };
                self.spans.push(Span::styled(
                    marker,
                    Style::default().fg(self.palette.accent),
                ));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush_line();
                self.heading = None;
            }
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::Paragraph | TagEnd::Item => self.flush_line(),
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.code_block();
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            self.code_lines.extend(text.lines().map(str::to_string));
            return;
        }
        let style = self.current_style();
        self.spans.push(Span::styled(text.to_string(), style));
    }

    fn current_style(&self) -> Style {
        let mut style = self.base_style;
        if let Some(level) = self.heading {
            style = style.add_modifier(Modifier::BOLD);
            if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) {
                style = style.fg(self.palette.accent);
            }
        }
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 || self.quote_depth > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.strike > 0 {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        style
    }

    fn prefix(&self) -> Vec<Span<'static>> {
        let mut prefix = vec![Span::raw(INDENT)];
        if self.quote_depth > 0 {
            prefix.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(self.palette.text_muted),
            ));
        }
        prefix
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = self.prefix();
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    /// At most one blank line in a row, never at the top.
    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn code_block(&mut self) {
        let style = Style::default().fg(self.palette.text_muted);
        let width = self
            .code_lines
            .iter()
            .map(|line| line.width())
            .max()
            .unwrap_or(0);
        for line in std::mem::take(&mut self.code_lines) {
            let pad = width - line.width();
            self.lines.push(Line::from(vec![
                Span::raw(INDENT),
                Span::styled(format!("  {line}{}", " ".repeat(pad)), style),
            ]));
        }
    }
}
