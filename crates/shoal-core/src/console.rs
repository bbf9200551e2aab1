use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::easing::Easing;
use crate::logging::LogEntry;
use crate::tween::{TweenEngine, TweenId};

/// Slide-in time for the overlay.
pub const SLIDE_DURATION: Duration = Duration::from_millis(300);

/// Drop-down console: log scrollback, an input line, and the slide
/// animation that reveals it over the aquarium.
pub struct Console {
    open: bool,
    fraction: f64,
    slide: TweenId,
    tweens: TweenEngine<f64>,
    log_lines: VecDeque<LogEntry>,
    pub input_buffer: String,
    pub cursor_pos: usize,
    scroll_offset: usize,
    max_lines: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Console {
    pub fn new(max_lines: usize) -> Self {
        let mut tweens = TweenEngine::new();
        let slide = tweens.get(SLIDE_DURATION, |fraction: &mut f64, t| *fraction = t, Easing::SineIn);
        Self {
            open: false,
            fraction: 0.0,
            slide,
            tweens,
            log_lines: VecDeque::with_capacity(max_lines),
            input_buffer: String::new(),
            cursor_pos: 0,
            scroll_offset: 0,
            max_lines,
        }
    }

    /// Open or close. Opening plays the slide forward, closing plays it
    /// in reverse from wherever it currently is.
    pub fn toggle(&mut self, now: Instant) {
        self.open = !self.open;
        let played = self.tweens.redirect(self.slide, now, !self.open);
        if let Err(err) = played {
            tracing::warn!(%err, "console slide unavailable");
            self.fraction = if self.open { 1.0 } else { 0.0 };
        }
    }

    pub fn close(&mut self, now: Instant) {
        if self.open {
            self.toggle(now);
        }
    }

    /// Advance the slide animation.
    pub fn update(&mut self, now: Instant) {
        self.tweens.tick(now, &mut self.fraction);
        // the sine curve lands a hair short of 1.0
        if !self.tweens.is_active(self.slide) {
            self.fraction = if self.open { 1.0 } else { 0.0 };
        }
    }

    /// How far the overlay has slid in, `0.0` hidden to `1.0` fully shown.
    pub fn overlay_fraction(&self) -> f64 {
        self.fraction
    }

    /// Open and fully slid in. Only then does it take keyboard input.
    pub fn is_open(&self) -> bool {
        self.open && self.fraction >= 1.0
    }

    /// Any part of the overlay is on screen.
    pub fn is_visible(&self) -> bool {
        self.open || self.fraction > 0.0
    }

    /// Wants input: open, even while still sliding.
    pub fn is_focused(&self) -> bool {
        self.open
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        if self.log_lines.len() >= self.max_lines {
            self.log_lines.pop_front();
            if self.scroll_offset > 0 {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
        }
        self.log_lines.push_back(entry);
    }

    pub fn log_lines(&self) -> &VecDeque<LogEntry> {
        &self.log_lines
    }

    pub fn clear_logs(&mut self) {
        self.log_lines.clear();
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, amount: usize) {
        let max_offset = self.log_lines.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + amount).min(max_offset);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn insert_char(&mut self, c: char) {
        self.input_buffer.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.input_buffer.remove(prev);
            self.cursor_pos = prev;
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor_pos = prev;
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(c) = self.input_buffer[self.cursor_pos..].chars().next() {
            self.cursor_pos += c.len_utf8();
        }
    }

    /// Take the input line, leaving it empty.
    pub fn submit_input(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input_buffer)
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.input_buffer[..self.cursor_pos]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }
}
