//! Paints world-space shapes into the tank with a ratatui [`Canvas`].
//!
//! World space is in pixels with y pointing down, the same space the fish
//! swim in. The canvas has y pointing up, so every coordinate is flipped on
//! the way out. Filled outlines are scan-converted at the marker's dot
//! resolution (2x4 per cell for braille) so bodies read as solid shapes.

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Line, Points},
    Frame,
};
use shoal_core::geometry::Vec2;

use crate::color::{blend, TANK_BACKGROUND};
use crate::container::WorldShape;
use crate::graphics::polygon_contains;
use crate::marker::dots_per_cell;

/// How many world pixels one terminal cell covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankScale {
    pub pixels_per_column: f64,
    pub pixels_per_row: f64,
}

impl TankScale {
    pub fn world_size(&self, area: Rect) -> Vec2 {
        Vec2::new(
            area.width as f64 * self.pixels_per_column,
            area.height as f64 * self.pixels_per_row,
        )
    }

    /// World position of the centre of the terminal cell at `(column, row)`,
    /// or `None` when the cell lies outside `area`.
    pub fn cell_to_world(&self, area: Rect, column: u16, row: u16) -> Option<Vec2> {
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| {
            Vec2::new(
                ((column - area.x) as f64 + 0.5) * self.pixels_per_column,
                ((row - area.y) as f64 + 0.5) * self.pixels_per_row,
            )
        })
    }
}

/// Centres of every dot inside `outline`, in world space. Only dots within
/// `world` are considered.
fn fill_dots(outline: &[Vec2], world: Vec2, dots: (u32, u32)) -> Vec<Vec2> {
    if outline.len() < 3 || dots.0 == 0 || dots.1 == 0 {
        return Vec::new();
    }
    let step = Vec2::new(world.x / dots.0 as f64, world.y / dots.1 as f64);
    let (min, max) = outline
        .iter()
        .fold((Vec2::splat(f64::INFINITY), Vec2::splat(f64::NEG_INFINITY)), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }

    let first = |v: f64, s: f64| ((v / s - 0.5).ceil().max(0.0)) as u32;
    let last = |v: f64, s: f64, n: u32| ((v / s - 0.5).floor().min(n as f64 - 1.0)).max(-1.0);
    let (x0, y0) = (first(min.x, step.x), first(min.y, step.y));
    let (x1, y1) = (last(max.x, step.x, dots.0), last(max.y, step.y, dots.1));
    if x1 < 0.0 || y1 < 0.0 {
        return Vec::new();
    }
    let (x1, y1) = (x1 as u32, y1 as u32);

    let mut out = Vec::new();
    for j in y0..=y1 {
        for i in x0..=x1 {
            let p = Vec2::new((i as f64 + 0.5) * step.x, (j as f64 + 0.5) * step.y);
            if polygon_contains(outline, p) {
                out.push(p);
            }
        }
    }
    out
}

struct PaintedShape {
    dots: Vec<(f64, f64)>,
    fill: Color,
    edges: Vec<(Vec2, Vec2)>,
    stroke: Color,
}

fn prepare(shapes: &[WorldShape], world: Vec2, dots: (u32, u32)) -> Vec<PaintedShape> {
    let flip = |p: Vec2| (p.x, world.y - p.y);
    shapes
        .iter()
        .map(|shape| {
            let (dots, fill) = match shape.fill {
                Some(fill) => (
                    fill_dots(&shape.outline, world, dots)
                        .into_iter()
                        .map(flip)
                        .collect(),
                    blend(fill.color, fill.alpha * shape.alpha, TANK_BACKGROUND),
                ),
                None => (Vec::new(), Color::Reset),
            };
            let (edges, stroke) = match shape.stroke {
                Some(stroke) if shape.outline.len() >= 2 => {
                    let n = shape.outline.len();
                    let count = if shape.closed { n } else { n - 1 };
                    let edges = (0..count)
                        .map(|i| (shape.outline[i], shape.outline[(i + 1) % n]))
                        .collect();
                    (edges, blend(stroke.color, stroke.alpha * shape.alpha, TANK_BACKGROUND))
                }
                _ => (Vec::new(), Color::Reset),
            };
            PaintedShape {
                dots,
                fill,
                edges,
                stroke,
            }
        })
        .collect()
}

/// Draw `shapes` into `area` at the given scale.
pub fn render_aquarium(f: &mut Frame, area: Rect, shapes: &[WorldShape], scale: TankScale, marker: Marker) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let world = scale.world_size(area);
    let (dx, dy) = dots_per_cell(marker);
    let dots = (area.width as u32 * dx as u32, area.height as u32 * dy as u32);
    let painted = prepare(shapes, world, dots);

    let [r, g, b] = crate::color::channels(TANK_BACKGROUND);
    let canvas = Canvas::default()
        .marker(marker)
        .background_color(Color::Rgb(r, g, b))
        .x_bounds([0.0, world.x])
        .y_bounds([0.0, world.y])
        .paint(move |ctx| {
            for shape in &painted {
                if !shape.dots.is_empty() {
                    ctx.draw(&Points {
                        coords: &shape.dots,
                        color: shape.fill,
                    });
                }
                for (a, b) in &shape.edges {
                    ctx.draw(&Line::new(a.x, world.y - a.y, b.x, world.y - b.y, shape.stroke));
                }
                // later shapes cover earlier ones
                ctx.layer();
            }
        });
    f.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Fill, Stroke};

    fn square(min: Vec2, size: f64) -> Vec<Vec2> {
        vec![
            min,
            min + Vec2::new(size, 0.0),
            min + Vec2::splat(size),
            min + Vec2::new(0.0, size),
        ]
    }

    #[test]
    fn world_size_scales_cells() {
        let scale = TankScale {
            pixels_per_column: 8.0,
            pixels_per_row: 16.0,
        };
        assert_eq!(scale.world_size(Rect::new(0, 0, 100, 30)), Vec2::new(800.0, 480.0));
    }

    #[test]
    fn cell_to_world_is_relative_to_area() {
        let scale = TankScale {
            pixels_per_column: 8.0,
            pixels_per_row: 16.0,
        };
        let area = Rect::new(2, 1, 10, 5);
        assert_eq!(scale.cell_to_world(area, 2, 1), Some(Vec2::new(4.0, 8.0)));
        assert_eq!(scale.cell_to_world(area, 11, 5), Some(Vec2::new(76.0, 72.0)));
        assert_eq!(scale.cell_to_world(area, 12, 1), None);
        assert_eq!(scale.cell_to_world(area, 1, 1), None);
    }

    #[test]
    fn fill_covers_dots_inside_outline() {
        // 10x10 dot grid over a 100x100 world: each dot is 10px
        let dots = fill_dots(&square(Vec2::ZERO, 50.0), Vec2::splat(100.0), (10, 10));
        assert_eq!(dots.len(), 25);
        assert!(dots.iter().all(|p| p.x < 50.0 && p.y < 50.0));
    }

    #[test]
    fn fill_clips_to_world() {
        let dots = fill_dots(&square(Vec2::splat(-40.0), 80.0), Vec2::splat(100.0), (10, 10));
        assert_eq!(dots.len(), 16);
        let off_screen = fill_dots(&square(Vec2::splat(-500.0), 80.0), Vec2::splat(100.0), (10, 10));
        assert!(off_screen.is_empty());
    }

    #[test]
    fn degenerate_outlines_fill_nothing() {
        assert!(fill_dots(&[Vec2::ZERO, Vec2::ONE], Vec2::splat(100.0), (10, 10)).is_empty());
        assert!(fill_dots(&square(Vec2::ZERO, 50.0), Vec2::splat(100.0), (0, 10)).is_empty());
    }

    #[test]
    fn prepare_flips_y_and_collects_edges() {
        let shape = WorldShape {
            outline: square(Vec2::ZERO, 20.0),
            closed: false,
            fill: Some(Fill {
                color: 0xffffff,
                alpha: 1.0,
            }),
            stroke: Some(Stroke {
                width: 1.0,
                color: 0xff0000,
                alpha: 1.0,
            }),
            alpha: 1.0,
        };
        let painted = prepare(&[shape], Vec2::splat(100.0), (10, 10));
        assert_eq!(painted[0].dots.len(), 4);
        assert!(painted[0].dots.iter().all(|&(_, y)| y > 80.0));
        assert_eq!(painted[0].fill, Color::Rgb(255, 255, 255));
        // open path: one edge fewer than points
        assert_eq!(painted[0].edges.len(), 3);
    }
}
