use crate::config::*;
use bevy::math::Vec2;

/// Axis-aligned bounding box used to reject points before the exact test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        points.into_iter().fold(
            Bounds {
                min: Vec2::splat(f32::INFINITY),
                max: Vec2::splat(f32::NEG_INFINITY),
            },
            |acc, p| Bounds {
                min: acc.min.min(p),
                max: acc.max.max(p),
            },
        )
    }

    fn union(self, other: Bounds) -> Self {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Obstacle shapes answering "does this point lie inside me"
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Closed polygon through `points` in order
    Polygon { points: Vec<Vec2>, bounds: Bounds },
    /// Axis-aligned ellipse
    Ellipse { center: Vec2, radii: Vec2 },
    /// Union of several shapes
    Group { shapes: Vec<Shape>, bounds: Bounds },
}

impl Shape {
    pub fn polygon(points: Vec<Vec2>) -> Self {
        let bounds = Bounds::from_points(points.iter().copied());
        Shape::Polygon { points, bounds }
    }

    /// Rectangle from a corner and a (possibly negative) extent
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        Shape::polygon(vec![
            Vec2::new(x, y),
            Vec2::new(x + w, y),
            Vec2::new(x + w, y + h),
            Vec2::new(x, y + h),
        ])
    }

    /// Ellipse centred on `(x, y)` with full width `w` and height `h`
    pub fn ellipse(x: f32, y: f32, w: f32, h: f32) -> Self {
        Shape::Ellipse {
            center: Vec2::new(x, y),
            radii: Vec2::new(w.abs() / 2.0, h.abs() / 2.0),
        }
    }

    pub fn group(shapes: Vec<Shape>) -> Self {
        let bounds = shapes.iter().map(Shape::bounds).fold(
            Bounds {
                min: Vec2::splat(f32::INFINITY),
                max: Vec2::splat(f32::NEG_INFINITY),
            },
            Bounds::union,
        );
        Shape::Group { shapes, bounds }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Polygon { bounds, .. } | Shape::Group { bounds, .. } => *bounds,
            Shape::Ellipse { center, radii } => Bounds {
                min: *center - *radii,
                max: *center + *radii,
            },
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        if !self.bounds().contains(point) {
            return false;
        }
        match self {
            Shape::Polygon { points, .. } => polygon_contains(points, point),
            Shape::Ellipse { center, radii } => {
                if radii.x == 0.0 || radii.y == 0.0 {
                    // Degenerate ellipse: the bounding box is a segment or a point
                    return true;
                }
                let d = (point - *center) / *radii;
                d.length_squared() <= 1.0
            }
            Shape::Group { shapes, .. } => shapes.iter().any(|s| s.contains(point)),
        }
    }
}

/// Even-odd ray cast; points on an axis-aligned edge count as inside
fn polygon_contains(points: &[Vec2], point: Vec2) -> bool {
    if points.len() < 3 {
        return points.iter().any(|p| *p == point);
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if on_segment(a, b, point) {
            return true;
        }
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    let cross = (b - a).perp_dot(p - a);
    cross.abs() <= f32::EPSILON * (b - a).length().max(1.0)
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// The fixed world an individual moves through: start, target, field extent
/// and obstacles. Read-only while a run is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub target: Vec2,
    pub start: Vec2,
    /// Field width and height; valid positions lie in `[0, width] x [0, height]`
    pub size: Vec2,
    pub obstacles: Vec<Shape>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::with_default_obstacle(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

impl Environment {
    /// Empty field with the start in the lower-left corner and the target in
    /// the upper-right corner (y grows downwards)
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            target: Vec2::new(width - CORNER_INSET, CORNER_INSET),
            start: Vec2::new(CORNER_INSET, height - CORNER_INSET),
            size: Vec2::new(width, height),
            obstacles: Vec::new(),
        }
    }

    /// Field with a single vertical bar across the middle
    pub fn with_default_obstacle(width: f32, height: f32) -> Self {
        let (cx, cy) = (width / 2.0, height / 2.0);
        let (half_w, half_h) = (30.0, height / 4.0);
        Self::new(width, height).with_obstacle(Shape::rect(cx - half_w, cy - half_h, half_w * 2.0, half_h * 2.0))
    }

    pub fn with_obstacle(mut self, shape: Shape) -> Self {
        self.obstacles.push(shape);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.size.is_finite() || self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Err(ConfigError::InvalidBounds {
                width: self.size.x,
                height: self.size.y,
            });
        }
        Ok(())
    }

    pub fn in_bounds(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.size.x && point.y >= 0.0 && point.y <= self.size.y
    }

    /// True when `point` is off the field or inside any obstacle
    pub fn is_blocked(&self, point: Vec2) -> bool {
        !self.in_bounds(point) || self.obstacles.iter().any(|o| o.contains(point))
    }
}
