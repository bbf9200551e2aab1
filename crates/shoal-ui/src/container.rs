//! Positionable, nestable drawables with pointer handlers.

use shoal_core::geometry::{rotate_around, Vec2};

use crate::graphics::{Fill, Graphics, Stroke};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// The pointer moved onto the container.
    Over,
    /// The pointer left the container.
    Out,
    /// A button was released over the container.
    Up,
}

/// Similarity transform: scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec2,
    /// Radians.
    pub rotation: f64,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec2::ZERO,
        rotation: 0.0,
        scale: 1.0,
    };

    pub fn apply(&self, point: Vec2) -> Vec2 {
        rotate_around(point * self.scale, Vec2::ZERO, self.rotation) + self.translation
    }

    /// `None` when the scale is zero and the transform cannot be undone.
    pub fn invert(&self, point: Vec2) -> Option<Vec2> {
        if self.scale == 0.0 {
            return None;
        }
        let unrotated = rotate_around(point - self.translation, Vec2::ZERO, -self.rotation);
        Some(unrotated / self.scale)
    }

    /// This transform applied after `inner`.
    pub fn compose(&self, inner: &Transform) -> Transform {
        Transform {
            translation: self.apply(inner.translation),
            rotation: self.rotation + inner.rotation,
            scale: self.scale * inner.scale,
        }
    }
}

/// A primitive resolved to world space, ready for the painter.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldShape {
    pub outline: Vec<Vec2>,
    pub closed: bool,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    /// Product of ancestor alphas.
    pub alpha: f64,
}

type Handler = Box<dyn FnMut()>;

pub struct Container {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Degrees, clockwise on screen.
    pub rotation: f64,
    pub alpha: f64,
    pub visible: bool,
    pub graphics: Graphics,
    children: Vec<Container>,
    handlers: Vec<(PointerEvent, Handler)>,
    hovered: bool,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("rotation", &self.rotation)
            .field("visible", &self.visible)
            .field("children", &self.children.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            visible: true,
            graphics: Graphics::new(),
            children: Vec::new(),
            handlers: Vec::new(),
            hovered: false,
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn add_child(&mut self, child: Container) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub fn children(&self) -> &[Container] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Container> {
        self.children.get_mut(index)
    }

    /// Register a pointer handler. Several handlers per event run in
    /// registration order.
    pub fn on(&mut self, event: PointerEvent, handler: impl FnMut() + 'static) {
        self.handlers.push((event, Box::new(handler)));
    }

    /// Local-to-parent transform.
    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.position(),
            rotation: self.rotation.to_radians(),
            scale: self.scale,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Whether `point`, in the parent's space, lands on this container's
    /// filled graphics or any child's.
    pub fn hit_test(&self, point: Vec2) -> bool {
        if !self.visible {
            return false;
        }
        let Some(local) = self.transform().invert(point) else {
            return false;
        };
        self.graphics.contains(local) || self.children.iter().any(|child| child.hit_test(local))
    }

    /// Track the pointer at `point` (parent space), firing `Over`/`Out` on
    /// transitions. Returns whether the pointer is over this container.
    pub fn pointer_move(&mut self, point: Vec2) -> bool {
        let local = if self.visible {
            self.transform().invert(point)
        } else {
            None
        };
        let mut over_child = false;
        for child in &mut self.children {
            // children with no local point still need their Out
            let child_point = local.unwrap_or(Vec2::splat(f64::NAN));
            over_child |= child.pointer_move(child_point);
        }
        let hit = local.is_some_and(|p| self.graphics.contains(p)) || over_child;
        if hit != self.hovered {
            self.hovered = hit;
            self.emit(if hit { PointerEvent::Over } else { PointerEvent::Out });
        }
        hit
    }

    /// A pointer release at `point` (parent space). Fires `Up` on every
    /// container hit, innermost first.
    pub fn pointer_up(&mut self, point: Vec2) -> bool {
        if !self.visible {
            return false;
        }
        let Some(local) = self.transform().invert(point) else {
            return false;
        };
        let mut hit = false;
        for child in &mut self.children {
            hit |= child.pointer_up(local);
        }
        hit |= self.graphics.contains(local);
        if hit {
            self.emit(PointerEvent::Up);
        }
        hit
    }

    /// Resolve the whole visible subtree to world-space shapes, parents
    /// before children.
    pub fn world_shapes(&self, parent: &Transform, parent_alpha: f64) -> Vec<WorldShape> {
        let mut out = Vec::new();
        self.collect_shapes(parent, parent_alpha, &mut out);
        out
    }

    fn collect_shapes(&self, parent: &Transform, parent_alpha: f64, out: &mut Vec<WorldShape>) {
        if !self.visible {
            return;
        }
        let world = parent.compose(&self.transform());
        let alpha = parent_alpha * self.alpha;
        out.extend(self.graphics.primitives().iter().map(|item| WorldShape {
            outline: item.shape.outline().into_iter().map(|p| world.apply(p)).collect(),
            closed: item.shape.is_closed(),
            fill: item.fill,
            stroke: item.stroke,
            alpha,
        }));
        for child in &self.children {
            child.collect_shapes(&world, alpha, out);
        }
    }

    fn emit(&mut self, event: PointerEvent) {
        for (kind, handler) in &mut self.handlers {
            if *kind == event {
                handler();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-9
    }

    fn square(x: f64, y: f64) -> Container {
        let mut c = Container::new();
        c.set_position(Vec2::new(x, y));
        c.graphics.begin_fill(0xffffff, 1.0).draw_rect(-5.0, -5.0, 10.0, 10.0, None);
        c
    }

    fn log_events(c: &mut Container) -> Rc<RefCell<Vec<PointerEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for event in [PointerEvent::Over, PointerEvent::Out, PointerEvent::Up] {
            let log = Rc::clone(&log);
            c.on(event, move || log.borrow_mut().push(event));
        }
        log
    }

    #[test]
    fn transform_round_trips() {
        let t = Transform {
            translation: Vec2::new(3.0, -2.0),
            rotation: 0.7,
            scale: 2.5,
        };
        let p = Vec2::new(1.25, 4.0);
        assert!(approx(t.invert(t.apply(p)).unwrap(), p));
    }

    #[test]
    fn zero_scale_cannot_invert() {
        let t = Transform {
            scale: 0.0,
            ..Transform::IDENTITY
        };
        assert_eq!(t.invert(Vec2::ONE), None);
    }

    #[test]
    fn rotation_is_clockwise_on_screen() {
        let mut c = Container::new();
        c.rotation = 90.0;
        // +x maps to +y (down) in y-down screen space
        assert!(approx(c.transform().apply(Vec2::X), Vec2::Y));
    }

    #[test]
    fn hit_test_respects_position_and_visibility() {
        let mut c = square(100.0, 50.0);
        assert!(c.hit_test(Vec2::new(102.0, 48.0)));
        assert!(!c.hit_test(Vec2::new(0.0, 0.0)));
        c.visible = false;
        assert!(!c.hit_test(Vec2::new(100.0, 50.0)));
    }

    #[test]
    fn hover_fires_over_then_out_once() {
        let mut c = square(0.0, 0.0);
        let log = log_events(&mut c);
        c.pointer_move(Vec2::new(1.0, 1.0));
        c.pointer_move(Vec2::new(2.0, 2.0));
        assert!(c.is_hovered());
        c.pointer_move(Vec2::new(50.0, 50.0));
        assert_eq!(*log.borrow(), vec![PointerEvent::Over, PointerEvent::Out]);
    }

    #[test]
    fn up_fires_only_on_hit() {
        let mut c = square(0.0, 0.0);
        let log = log_events(&mut c);
        assert!(!c.pointer_up(Vec2::new(20.0, 0.0)));
        assert!(c.pointer_up(Vec2::new(0.0, 0.0)));
        assert_eq!(*log.borrow(), vec![PointerEvent::Up]);
    }

    #[test]
    fn nested_children_inherit_transform() {
        let mut parent = Container::new();
        parent.set_position(Vec2::new(10.0, 0.0));
        parent.rotation = 90.0;
        parent.add_child(square(20.0, 0.0));
        // child centre sits at parent + rotate((20, 0), 90deg) = (10, 20)
        assert!(parent.hit_test(Vec2::new(10.0, 20.0)));
        assert!(!parent.hit_test(Vec2::new(30.0, 0.0)));

        let shapes = parent.world_shapes(&Transform::IDENTITY, 1.0);
        assert_eq!(shapes.len(), 1);
        let centre = shapes[0].outline.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / 4.0;
        assert!(approx(centre, Vec2::new(10.0, 20.0)));
    }

    #[test]
    fn hovering_a_child_hovers_the_parent() {
        let mut parent = Container::new();
        let log = log_events(&mut parent);
        parent.add_child(square(30.0, 30.0));
        parent.pointer_move(Vec2::new(30.0, 30.0));
        assert!(parent.is_hovered());
        assert!(parent.children()[0].is_hovered());
        parent.pointer_move(Vec2::new(-30.0, 30.0));
        assert!(!parent.children()[0].is_hovered());
        assert_eq!(*log.borrow(), vec![PointerEvent::Over, PointerEvent::Out]);
    }

    #[test]
    fn hiding_a_hovered_container_fires_out() {
        let mut c = square(0.0, 0.0);
        let log = log_events(&mut c);
        c.pointer_move(Vec2::ZERO);
        c.visible = false;
        c.pointer_move(Vec2::ZERO);
        assert_eq!(*log.borrow(), vec![PointerEvent::Over, PointerEvent::Out]);
    }

    #[test]
    fn world_shapes_multiply_alpha_and_skip_hidden() {
        let mut parent = square(0.0, 0.0);
        parent.alpha = 0.5;
        let mut child = square(0.0, 0.0);
        child.alpha = 0.5;
        parent.add_child(child);
        let mut hidden = square(0.0, 0.0);
        hidden.visible = false;
        parent.add_child(hidden);

        let shapes = parent.world_shapes(&Transform::IDENTITY, 1.0);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].alpha, 0.5);
        assert_eq!(shapes[1].alpha, 0.25);
    }
}
