//! Retained vector drawing surface attached to a [`Container`](crate::container::Container).
//!
//! Drawing calls append primitives to a display list in the container's
//! local space. Every primitive can be reduced to an outline polygon, which
//! is what the terminal painter rasterizes and what pointer hit tests use.

use std::f64::consts::TAU;

use shoal_core::geometry::Vec2;
use thiserror::Error;

/// Segments used to approximate a circle.
const CIRCLE_SEGMENTS: usize = 24;
/// Segments used per quarter-circle rounded corner.
const CORNER_SEGMENTS: usize = 4;
/// Segments used to flatten one cubic Bézier.
const CURVE_SEGMENTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: u32,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: u32,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        origin: Vec2,
        size: Vec2,
        corner_radius: Option<f64>,
    },
    Circle {
        center: Vec2,
        radius: f64,
    },
    Path {
        points: Vec<Vec2>,
        closed: bool,
    },
}

impl Shape {
    /// Polygon approximating the shape, in local coordinates.
    pub fn outline(&self) -> Vec<Vec2> {
        match self {
            Shape::Rect {
                origin,
                size,
                corner_radius,
            } => rect_outline(*origin, *size, corner_radius.unwrap_or(0.0)),
            Shape::Circle { center, radius } => (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let angle = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
                    *center + Vec2::from_angle(angle) * *radius
                })
                .collect(),
            Shape::Path { points, .. } => points.clone(),
        }
    }

    /// Filled shapes are treated as closed, like SVG does.
    pub fn is_closed(&self) -> bool {
        match self {
            Shape::Path { closed, .. } => *closed,
            _ => true,
        }
    }
}

fn rect_outline(origin: Vec2, size: Vec2, radius: f64) -> Vec<Vec2> {
    let radius = radius.clamp(0.0, size.x.abs().min(size.y.abs()) * 0.5);
    if radius == 0.0 {
        return vec![
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ];
    }
    let corners = [
        (origin + Vec2::new(size.x - radius, radius), -0.25),
        (origin + size - Vec2::splat(radius), 0.0),
        (origin + Vec2::new(radius, size.y - radius), 0.25),
        (origin + Vec2::splat(radius), 0.5),
    ];
    corners
        .iter()
        .flat_map(|&(center, start_turn)| {
            (0..=CORNER_SEGMENTS).map(move |i| {
                let turn = start_turn + 0.25 * i as f64 / CORNER_SEGMENTS as f64;
                center + Vec2::from_angle(turn * TAU) * radius
            })
        })
        .collect()
}

/// One entry in the display list.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
}

impl Primitive {
    /// Even-odd containment against the filled outline. Unfilled shapes
    /// never contain anything.
    pub fn contains(&self, point: Vec2) -> bool {
        if self.fill.is_none() {
            return false;
        }
        match &self.shape {
            Shape::Circle { center, radius } => center.distance(point) <= *radius,
            shape => polygon_contains(&shape.outline(), point),
        }
    }
}

/// Even-odd rule point-in-polygon test. The polygon closes implicitly.
pub fn polygon_contains(points: &[Vec2], point: Vec2) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned extent of everything drawn, stroke width included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    fn around(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin.min(origin + size),
            max: origin.max(origin + size),
        }
    }

    fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Region of path space covered by a `d` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("unsupported path command '{0}'")]
    UnsupportedCommand(char),
    #[error("path command '{0}' is missing coordinates")]
    MissingCoordinates(char),
    #[error("path data must start with a move-to, found '{0}'")]
    NoMoveTo(char),
    #[error("invalid number {0:?} in path data")]
    BadNumber(String),
}

/// Open path being extended by `move_to`/`line_to`.
#[derive(Debug, Clone)]
struct Pen {
    start: Vec2,
    /// Display-list index once the first segment has been drawn.
    index: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Graphics {
    items: Vec<Primitive>,
    fill: Option<Fill>,
    stroke: Option<Stroke>,
    pen: Option<Pen>,
    bounds: Option<Bounds>,
}

impl Graphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fill(&mut self, color: u32, alpha: f64) -> &mut Self {
        self.fill = Some(Fill { color, alpha });
        self
    }

    pub fn end_fill(&mut self) -> &mut Self {
        self.fill = None;
        self
    }

    pub fn line_style(&mut self, width: f64, color: u32, alpha: f64) -> &mut Self {
        self.stroke = Some(Stroke {
            width,
            color,
            alpha,
        });
        self
    }

    pub fn draw_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        corner_radius: Option<f64>,
    ) -> &mut Self {
        let origin = Vec2::new(x, y);
        let size = Vec2::new(width, height);
        self.push(Shape::Rect {
            origin,
            size,
            corner_radius: corner_radius.filter(|r| *r > 0.0),
        });
        self.grow(Bounds::around(origin, size));
        self
    }

    pub fn draw_circle(&mut self, x: f64, y: f64, radius: f64) -> &mut Self {
        let center = Vec2::new(x, y);
        self.push(Shape::Circle { center, radius });
        self.grow(Bounds::around(center - Vec2::splat(radius), Vec2::splat(radius * 2.0)));
        self
    }

    /// Parse an SVG path `d` string (M, L, H, V, C, Z and their relative
    /// forms). Malformed data is logged and nothing is drawn.
    pub fn draw_path_from_string(&mut self, d: &str, view_box: ViewBox) -> &mut Self {
        let subpaths = match parse_path(d) {
            Ok(subpaths) => subpaths,
            Err(err) => {
                tracing::warn!(%err, "skipping malformed path data");
                return self;
            }
        };
        for (points, closed) in subpaths {
            self.push(Shape::Path { points, closed });
        }
        self.grow(Bounds::around(
            Vec2::new(view_box.x, view_box.y),
            Vec2::new(view_box.w, view_box.h),
        ));
        self
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.pen = Some(Pen {
            start: Vec2::new(x, y),
            index: None,
        });
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        let point = Vec2::new(x, y);
        let Some(pen) = self.pen.as_mut() else {
            tracing::warn!(x, y, "line_to called before move_to; segment skipped");
            return self;
        };
        let (fill, stroke) = (self.fill, self.stroke);
        match pen.index {
            Some(index) => {
                let item = &mut self.items[index];
                if let Shape::Path { points, .. } = &mut item.shape {
                    points.push(point);
                }
                item.fill = fill;
                item.stroke = stroke;
            }
            None => {
                let start = pen.start;
                pen.index = Some(self.items.len());
                self.push(Shape::Path {
                    points: vec![start, point],
                    closed: false,
                });
                self.grow(Bounds::around(start, Vec2::ZERO));
            }
        }
        self.grow(Bounds::around(point, Vec2::ZERO));
        self
    }

    pub fn close_path(&mut self) -> &mut Self {
        let Some(pen) = self.pen.take() else {
            return self;
        };
        match pen.index {
            Some(index) => {
                let (fill, stroke) = (self.fill, self.stroke);
                let item = &mut self.items[index];
                if let Shape::Path { closed, .. } = &mut item.shape {
                    *closed = true;
                }
                item.fill = fill;
                item.stroke = stroke;
            }
            None => {
                self.push(Shape::Path {
                    points: vec![pen.start],
                    closed: true,
                });
                self.grow(Bounds::around(pen.start, Vec2::ZERO));
            }
        }
        self
    }

    /// Drop every primitive and reset fill, stroke, pen and bounds.
    pub fn clear(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Whether any filled primitive covers `point` (local space).
    pub fn contains(&self, point: Vec2) -> bool {
        self.items.iter().any(|item| item.contains(point))
    }

    fn push(&mut self, shape: Shape) {
        self.items.push(Primitive {
            shape,
            fill: self.fill,
            stroke: self.stroke,
        });
    }

    fn grow(&mut self, bounds: Bounds) {
        let half = self.stroke.map_or(0.0, |s| s.width * 0.5);
        let bounds = Bounds {
            min: bounds.min - Vec2::splat(half),
            max: bounds.max + Vec2::splat(half),
        };
        self.bounds = Some(match self.bounds {
            Some(existing) => existing.union(bounds),
            None => bounds,
        });
    }
}

type Subpath = (Vec<Vec2>, bool);

struct PathTokens<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

impl<'a> PathTokens<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
        }
    }

    fn skip_separators(&mut self) {
        while self
            .chars
            .peek()
            .is_some_and(|&(_, c)| c.is_whitespace() || c == ',')
        {
            self.chars.next();
        }
    }

    fn next_command(&mut self) -> Result<char, PathError> {
        self.skip_separators();
        match self.chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() => Ok(c),
            Some((_, c)) => Err(PathError::UnsupportedCommand(c)),
            None => Err(PathError::UnsupportedCommand('?')),
        }
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        self.chars
            .peek()
            .is_some_and(|&(_, c)| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
    }

    fn number(&mut self, command: char) -> Result<f64, PathError> {
        if !self.at_number() {
            return Err(PathError::MissingCoordinates(command));
        }
        let Some(&(start, _)) = self.chars.peek() else {
            return Err(PathError::MissingCoordinates(command));
        };
        let mut end = start;
        let mut prev: Option<char> = None;
        let mut seen_dot = false;
        while let Some(&(i, c)) = self.chars.peek() {
            let sign_ok = i == start || matches!(prev, Some('e' | 'E'));
            let accept = c.is_ascii_digit()
                || ((c == '-' || c == '+') && sign_ok)
                || (c == '.' && !seen_dot)
                || matches!(c, 'e' | 'E');
            if !accept {
                break;
            }
            seen_dot |= c == '.';
            prev = Some(c);
            end = i + c.len_utf8();
            self.chars.next();
        }
        let raw = &self.src[start..end];
        raw.parse().map_err(|_| PathError::BadNumber(raw.to_string()))
    }

    fn pair(&mut self, command: char) -> Result<Vec2, PathError> {
        Ok(Vec2::new(self.number(command)?, self.number(command)?))
    }

    fn is_done(&mut self) -> bool {
        self.skip_separators();
        self.chars.peek().is_none()
    }
}

fn cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f64) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Parse path data into polylines. Curves are flattened.
pub fn parse_path(d: &str) -> Result<Vec<Subpath>, PathError> {
    let mut tokens = PathTokens::new(d);
    let mut subpaths: Vec<Subpath> = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();
    let mut cursor = Vec2::ZERO;
    let mut start = Vec2::ZERO;

    let flush = |current: &mut Vec<Vec2>, subpaths: &mut Vec<Subpath>, closed: bool| {
        if !current.is_empty() {
            subpaths.push((std::mem::take(current), closed));
        }
    };

    while !tokens.is_done() {
        let command = tokens.next_command()?;
        let relative = command.is_ascii_lowercase();
        let offset = |cursor: Vec2| if relative { cursor } else { Vec2::ZERO };

        if current.is_empty() && subpaths.is_empty() && !matches!(command, 'M' | 'm') {
            return Err(PathError::NoMoveTo(command));
        }

        match command.to_ascii_uppercase() {
            'M' => {
                flush(&mut current, &mut subpaths, false);
                cursor = tokens.pair(command)? + offset(cursor);
                start = cursor;
                current.push(cursor);
                // extra pairs are implicit line-tos
                while tokens.at_number() {
                    cursor = tokens.pair(command)? + offset(cursor);
                    current.push(cursor);
                }
            }
            'L' => loop {
                cursor = tokens.pair(command)? + offset(cursor);
                current.push(cursor);
                if !tokens.at_number() {
                    break;
                }
            },
            'H' => loop {
                let x = tokens.number(command)?;
                cursor.x = if relative { cursor.x + x } else { x };
                current.push(cursor);
                if !tokens.at_number() {
                    break;
                }
            },
            'V' => loop {
                let y = tokens.number(command)?;
                cursor.y = if relative { cursor.y + y } else { y };
                current.push(cursor);
                if !tokens.at_number() {
                    break;
                }
            },
            'C' => loop {
                let base = offset(cursor);
                let c1 = tokens.pair(command)? + base;
                let c2 = tokens.pair(command)? + base;
                let end = tokens.pair(command)? + base;
                let from = cursor;
                current.extend(
                    (1..=CURVE_SEGMENTS).map(|i| cubic(from, c1, c2, end, i as f64 / CURVE_SEGMENTS as f64)),
                );
                cursor = end;
                if !tokens.at_number() {
                    break;
                }
            },
            'Z' => {
                flush(&mut current, &mut subpaths, true);
                cursor = start;
            }
            _ => return Err(PathError::UnsupportedCommand(command)),
        }
    }
    flush(&mut current, &mut subpaths, false);
    Ok(subpaths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn line_to_without_move_to_is_skipped() {
        let mut g = Graphics::new();
        g.begin_fill(0xff0000, 1.0).line_to(10.0, 10.0);
        assert!(g.is_empty());
        assert!(g.bounds().is_none());
    }

    #[test]
    fn move_line_close_builds_one_filled_path() {
        let mut g = Graphics::new();
        g.begin_fill(0x00ff00, 0.5)
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .line_to(10.0, 10.0)
            .close_path();
        assert_eq!(g.primitives().len(), 1);
        let item = &g.primitives()[0];
        assert_eq!(item.fill, Some(Fill { color: 0x00ff00, alpha: 0.5 }));
        assert!(item.shape.is_closed());
        assert_eq!(item.shape.outline().len(), 3);
        let bounds = g.bounds().unwrap();
        assert_eq!(bounds.min, Vec2::ZERO);
        assert_eq!(bounds.max, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn line_to_after_close_needs_new_move_to() {
        let mut g = Graphics::new();
        g.move_to(0.0, 0.0).line_to(1.0, 1.0).close_path().line_to(5.0, 5.0);
        assert_eq!(g.primitives().len(), 1);
    }

    #[test]
    fn stroke_inflates_bounds() {
        let mut g = Graphics::new();
        g.line_style(2.0, 0xffffff, 1.0).draw_rect(0.0, 0.0, 10.0, 4.0, None);
        let bounds = g.bounds().unwrap();
        assert_eq!(bounds.min, Vec2::new(-1.0, -1.0));
        assert_eq!(bounds.size(), Vec2::new(12.0, 6.0));
    }

    #[test]
    fn clear_resets_everything() {
        let mut g = Graphics::new();
        g.begin_fill(1, 1.0).draw_circle(0.0, 0.0, 5.0).move_to(1.0, 1.0);
        g.clear();
        assert!(g.is_empty());
        assert!(g.bounds().is_none());
        g.line_to(2.0, 2.0);
        assert!(g.is_empty(), "pen was reset");
        g.draw_rect(0.0, 0.0, 1.0, 1.0, None);
        assert_eq!(g.primitives()[0].fill, None, "fill was reset");
    }

    #[test]
    fn contains_uses_filled_shapes_only() {
        let mut g = Graphics::new();
        g.draw_rect(0.0, 0.0, 10.0, 10.0, None);
        assert!(!g.contains(Vec2::new(5.0, 5.0)));
        g.begin_fill(0xffffff, 1.0).draw_circle(20.0, 0.0, 3.0);
        assert!(g.contains(Vec2::new(21.0, 1.0)));
        assert!(!g.contains(Vec2::new(24.0, 0.0)));
    }

    #[test]
    fn even_odd_containment() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(polygon_contains(&square, Vec2::new(2.0, 2.0)));
        assert!(!polygon_contains(&square, Vec2::new(5.0, 2.0)));
        assert!(!polygon_contains(&square[..2], Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn rounded_rect_stays_inside_its_box() {
        let outline = rect_outline(Vec2::ZERO, Vec2::new(20.0, 10.0), 3.0);
        assert_eq!(outline.len(), 4 * (CORNER_SEGMENTS + 1));
        for p in outline {
            assert!(p.x >= -1e-9 && p.x <= 20.0 + 1e-9);
            assert!(p.y >= -1e-9 && p.y <= 10.0 + 1e-9);
        }
    }

    #[test]
    fn parses_absolute_and_relative_lines() {
        let paths = parse_path("M10 10 l5,0 V20 h-5 z").unwrap();
        assert_eq!(paths.len(), 1);
        let (points, closed) = &paths[0];
        assert!(closed);
        assert_eq!(
            points,
            &vec![
                Vec2::new(10.0, 10.0),
                Vec2::new(15.0, 10.0),
                Vec2::new(15.0, 20.0),
                Vec2::new(10.0, 20.0),
            ]
        );
    }

    #[test]
    fn implicit_line_tos_after_move() {
        let paths = parse_path("m1 1 2 0 0 2").unwrap();
        assert_eq!(
            paths[0].0,
            vec![Vec2::new(1.0, 1.0), Vec2::new(3.0, 1.0), Vec2::new(3.0, 3.0)]
        );
    }

    #[test]
    fn compact_numbers_split_on_signs() {
        let paths = parse_path("M0-5L1.5-2.5e1").unwrap();
        assert_eq!(paths[0].0, vec![Vec2::new(0.0, -5.0), Vec2::new(1.5, -25.0)]);
    }

    #[test]
    fn cubic_is_flattened_to_its_endpoint() {
        let paths = parse_path("M0 0 C0 10 10 10 10 0").unwrap();
        let points = &paths[0].0;
        assert_eq!(points.len(), 1 + CURVE_SEGMENTS);
        assert!(approx(*points.last().unwrap(), Vec2::new(10.0, 0.0)));
        // midpoint of this symmetric curve
        assert!(approx(points[CURVE_SEGMENTS / 2], Vec2::new(5.0, 7.5)));
    }

    #[test]
    fn multiple_subpaths() {
        let paths = parse_path("M0 0 L1 0 Z M5 5 L6 5").unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].1);
        assert!(!paths[1].1);
    }

    #[test]
    fn malformed_paths_are_errors() {
        assert_eq!(parse_path("L1 1"), Err(PathError::NoMoveTo('L')));
        assert_eq!(parse_path("M0 0 Q1 1 2 2"), Err(PathError::UnsupportedCommand('Q')));
        assert_eq!(parse_path("M0"), Err(PathError::MissingCoordinates('M')));
    }

    #[test]
    fn malformed_path_draws_nothing() {
        let mut g = Graphics::new();
        let view_box = ViewBox { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
        g.draw_path_from_string("M0 0 X", view_box);
        assert!(g.is_empty());
        assert!(g.bounds().is_none());
        g.draw_path_from_string("M0 0 L10 10", view_box);
        assert_eq!(g.primitives().len(), 1);
        assert_eq!(g.bounds().unwrap().max, Vec2::new(10.0, 10.0));
    }
}
