use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use shoal_core::console::Console;
use shoal_core::logging::LogLevel;

/// Rows the overlay occupies for a given slide fraction. Zero when hidden,
/// never fewer than the three bands while any part is showing.
pub fn overlay_height(area_height: u16, fraction: f64) -> u16 {
    if fraction <= 0.0 {
        return 0;
    }
    let max_height = area_height / 2;
    let height = ((max_height as f64) * fraction.min(1.0)).round() as u16;
    height.max(3).min(area_height)
}

/// Render the drop-down console over the top half of `area`.
///
/// Three bands: a title bar with the frame rate and close hint, the
/// colour-coded scrollback, and the input line. The cursor is placed only
/// once the slide has finished.
pub fn render_console(f: &mut Frame, area: Rect, console: &Console, fps: f64) {
    let height = overlay_height(area.height, console.overlay_fraction());
    if height < 3 {
        return;
    }
    let overlay = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height,
    };

    f.render_widget(Clear, overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Min(1),    // log area
            Constraint::Length(1), // input line
        ])
        .split(overlay);

    let title = Line::from(vec![
        Span::styled(
            " CONSOLE ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  FPS: {:.1}  ", fps)),
        Span::styled("` or Esc to close", Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(
        Paragraph::new(title).style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        chunks[0],
    );

    let log_lines = console.log_lines();
    let visible_height = chunks[1].height as usize;
    let total = log_lines.len();
    let scroll_offset = console.scroll_offset();

    let end = total.saturating_sub(scroll_offset);
    let start = end.saturating_sub(visible_height);

    let lines: Vec<Line> = log_lines
        .iter()
        .skip(start)
        .take(end - start)
        .map(|entry| {
            let level_color = match entry.level {
                LogLevel::Error => Color::Red,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Info => Color::Green,
                LogLevel::Debug => Color::Cyan,
                LogLevel::Trace => Color::DarkGray,
            };
            Line::from(vec![
                Span::styled(
                    format!(" {:5} ", entry.level),
                    Style::default().fg(level_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("[{}] ", entry.target), Style::default().fg(Color::DarkGray)),
                Span::raw(entry.message.as_str()),
            ])
        })
        .collect();

    let log_block = Block::default()
        .borders(Borders::LEFT | Borders::RIGHT)
        .style(Style::default().bg(Color::Black));

    f.render_widget(
        Paragraph::new(lines).block(log_block).wrap(Wrap { trim: false }),
        chunks[1],
    );

    let input_line = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(console.input_buffer.as_str()),
    ]);
    f.render_widget(
        Paragraph::new(input_line).style(Style::default().bg(Color::Black).fg(Color::White)),
        chunks[2],
    );

    if console.is_open() {
        let display_col = console.input_buffer[..console.cursor_pos].width() as u16;
        f.set_cursor_position((chunks[2].x + 2 + display_col, chunks[2].y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_overlay_has_no_height() {
        assert_eq!(overlay_height(40, 0.0), 0);
    }

    #[test]
    fn partial_slide_keeps_three_bands() {
        assert_eq!(overlay_height(40, 0.01), 3);
        assert_eq!(overlay_height(40, 0.5), 10);
        assert_eq!(overlay_height(40, 1.0), 20);
    }

    #[test]
    fn tiny_screens_clamp_to_area() {
        assert_eq!(overlay_height(2, 1.0), 2);
    }
}
