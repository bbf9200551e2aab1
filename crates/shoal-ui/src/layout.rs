use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AquariumRects {
    pub top: Rect,
    pub tank: Rect,
    pub hud: Rect,
    pub hud_left: Rect,
    pub hud_right: Rect,
}

/// Split the screen into a one-row top bar, the tank, and a two-column HUD.
pub fn aquarium_layout(area: Rect, hud_height: u16) -> AquariumRects {
    let hud_height = hud_height.max(3).min(area.height.saturating_sub(2).max(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),          // top bar
            Constraint::Min(1),             // tank
            Constraint::Length(hud_height), // hud
        ])
        .split(area);

    let hud = chunks[2];
    let hud_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(hud);

    AquariumRects {
        top: chunks[0],
        tank: chunks[1],
        hud,
        hud_left: hud_cols[0],
        hud_right: hud_cols[1],
    }
}
