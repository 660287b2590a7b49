use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use textwrap::{wrap, Options};
use unicode_width::UnicodeWidthStr;

use crate::markdown;
use crate::strings::{asking, PREFIX_ASSISTANT, PREFIX_NOTICE, PREFIX_USER};
use crate::theme::THEME;

use super::feed::{FeedEntry, FeedKind};
use super::App;

/// Rendered lines of one feed entry, stamped with what they were built from.
pub struct WrappedEntry {
    pub id: u64,
    pub kind: FeedKind,
    pub content_len: usize,
    pub lines: Vec<Line<'static>>,
}

impl WrappedEntry {
    fn matches(&self, e: &FeedEntry) -> bool {
        self.id == e.id && self.kind == e.kind && self.content_len == e.content.len()
    }
}

impl App {
    pub fn ensure_chat_wrapped(&mut self, width: u16) {
        let width = width.max(1);
        if self.chat_wrap_width != width {
            self.chat_cache.clear();
            self.chat_total_lines = 0;
            self.chat_wrap_width = width;
        }
        let entries = self.feed.entries();
        let mut changed = self.chat_cache.len() > entries.len();
        self.chat_cache.truncate(entries.len());
        for (i, e) in entries.iter().enumerate() {
            if self.chat_cache.get(i).is_some_and(|w| w.matches(e)) {
                continue;
            }
            let wrapped = wrap_entry(e, width);
            if i < self.chat_cache.len() {
                self.chat_cache[i] = wrapped;
            } else {
                self.chat_cache.push(wrapped);
            }
            changed = true;
        }
        if changed {
            self.chat_total_lines = self.chat_cache.iter().map(|w| w.lines.len()).sum();
        }
    }

    /// Returns (viewport, max_scroll, start_offset, total) and clamps `chat_scroll`.
    pub fn compute_chat_layout(&mut self, inner_height: u16) -> (usize, usize, usize, usize) {
        let viewport = inner_height as usize;
        let total = self.chat_total_lines;
        let max_scroll = total.saturating_sub(viewport);
        if self.stick_to_bottom {
            self.chat_scroll = 0;
        }
        if self.chat_scroll as usize > max_scroll {
            self.chat_scroll = max_scroll.min(u16::MAX as usize) as u16;
        }
        let start_offset = max_scroll - self.chat_scroll as usize;
        (viewport, max_scroll, start_offset, total)
    }

    /// Lines currently inside the chat viewport.
    pub fn visible_chat_lines(&self, start_offset: usize, viewport: usize) -> Vec<Line<'static>> {
        self.chat_cache
            .iter()
            .flat_map(|w| w.lines.iter())
            .skip(start_offset)
            .take(viewport)
            .cloned()
            .collect()
    }

    pub fn scroll_up(&mut self, step: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(step);
        self.stick_to_bottom = false;
    }

    pub fn scroll_down(&mut self, step: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(step);
        if self.chat_scroll == 0 {
            self.stick_to_bottom = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = u16::MAX;
        self.stick_to_bottom = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = 0;
        self.stick_to_bottom = true;
    }
}

fn bold(color: ratatui::style::Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn wrap_entry(e: &FeedEntry, width: u16) -> WrappedEntry {
    let mut lines = match &e.kind {
        FeedKind::User => markdown::render(&e.content, width, PREFIX_USER, bold(THEME.user)),
        FeedKind::Assistant => {
            markdown::render(&e.content, width, PREFIX_ASSISTANT, bold(THEME.assistant))
        }
        FeedKind::Pending { model } => {
            let pending = Style::default()
                .fg(THEME.pending)
                .add_modifier(Modifier::ITALIC);
            let mut out = vec![Line::from(vec![
                Span::styled(PREFIX_ASSISTANT, bold(THEME.assistant)),
                Span::styled(asking(model), pending),
            ])];
            if !e.content.is_empty() {
                let indent = " ".repeat(UnicodeWidthStr::width(PREFIX_ASSISTANT));
                out.extend(markdown::render(&e.content, width, &indent, Style::default()));
            }
            out
        }
        FeedKind::Notice(level) => wrap_notice(*level, &e.content, width),
    };
    lines.push(Line::default());
    WrappedEntry {
        id: e.id,
        kind: e.kind.clone(),
        content_len: e.content.len(),
        lines,
    }
}

fn wrap_notice(level: olla_core::diag::Level, text: &str, width: u16) -> Vec<Line<'static>> {
    let full = format!("{}[{}] {}", PREFIX_NOTICE, level.label(), text);
    let indent = " ".repeat(UnicodeWidthStr::width(PREFIX_NOTICE));
    let opts = Options::new(width as usize).subsequent_indent(&indent);
    let style = Style::default().fg(THEME.level(level));
    wrap(&full, opts)
        .into_iter()
        .map(|c| Line::from(Span::styled(c.into_owned(), style)))
        .collect()
}
