use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::layout::AquariumRects;

pub struct ShellView<'a> {
    pub title: &'a str,
    pub status_line: &'a str,
    pub hud_left: Vec<String>,
    pub hud_right: Vec<String>,
}

/// Draw the top bar and HUD around the tank. `tank` paints the middle band.
pub fn render_shell(
    f: &mut Frame,
    rects: AquariumRects,
    view: ShellView<'_>,
    tank: impl FnOnce(&mut Frame, Rect),
) {
    let top = Paragraph::new(Line::from(format!("SHOAL | {} | {}", view.title, view.status_line)))
        .style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(top, rects.top);

    tank(f, rects.tank);

    let left_text = Text::from(view.hud_left.into_iter().map(Line::from).collect::<Vec<_>>());
    let left = Paragraph::new(left_text).block(Block::default().borders(Borders::ALL).title("SCHOOL"));
    f.render_widget(left, rects.hud_left);

    let right_text = Text::from(view.hud_right.into_iter().map(Line::from).collect::<Vec<_>>());
    let right = Paragraph::new(right_text).block(Block::default().borders(Borders::ALL).title("TANK"));
    f.render_widget(right, rects.hud_right);
}
