//! Arrow geometry for pointer variables
//!
//! Coordinates are graph units (one unit is one terminal cell), with `y` growing
//! downward. Geometry is derived data: it is always recomputed from the source
//! anchor and the target box by [`ArrowGeometry::compute`] and never edited in place.

use std::f64::consts::PI;

/// Length of the arrowhead sides
pub const ARROW_SIZE: f64 = 1.5;

/// Length of the stub drawn for a dangling pointer
pub const STUB_LENGTH: f64 = 4.0;

/// How far a self-loop swings out from its struct box
pub const LOOP_OFFSET: f64 = 2.0;

/// Padding around the arrow's bounding box for pen width
const PEN_MARGIN: f64 = 0.5;

/// Anything shorter than this is treated as a degenerate arrow
const MIN_LENGTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Point on the border where the segment from the center towards `from` leaves the box
    pub fn clip_towards(&self, from: Point) -> Point {
        let c = self.center();
        let (dx, dy) = (from.x - c.x, from.y - c.y);
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return Point::new(c.x, self.y);
        }
        let tx = if dx.abs() > f64::EPSILON {
            (self.width / 2.0) / dx.abs()
        } else {
            f64::INFINITY
        };
        let ty = if dy.abs() > f64::EPSILON {
            (self.height / 2.0) / dy.abs()
        } else {
            f64::INFINITY
        };
        let t = tx.min(ty);
        Point::new(c.x + dx * t, c.y + dy * t)
    }
}

/// What an arrow is drawn to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    /// Another struct's box
    Struct(Rect),
    /// The owner's own box
    SelfLoop(Rect),
    /// Nothing live: NULL, uninitialized or freed target
    Dangling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowStyle {
    Solid,
    SelfLoop,
    /// Short stub with an open arrowhead
    Dangling,
}

/// Rendered shape of one pointer arrow
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowGeometry {
    /// Polyline from the source anchor to the tip, at least two points
    pub path: Vec<Point>,
    /// Arrowhead triangle, tip first
    pub head: [Point; 3],
    pub style: ArrowStyle,
}

impl ArrowGeometry {
    /// Compute the arrow leaving `source` and ending at `end`
    pub fn compute(source: Point, end: Endpoint) -> Self {
        match end {
            Endpoint::Struct(rect) => {
                let tip = rect.clip_towards(source);
                if source.distance(tip) < MIN_LENGTH || rect.contains(source) {
                    // Overlapping boxes would collapse the line, route around instead
                    return Self::self_loop(source, rect);
                }
                let path = vec![source, tip];
                let head = arrow_head(source, tip);
                ArrowGeometry {
                    path,
                    head,
                    style: ArrowStyle::Solid,
                }
            }
            Endpoint::SelfLoop(rect) => Self::self_loop(source, rect),
            Endpoint::Dangling => {
                let tip = source.offset(STUB_LENGTH, 0.0);
                ArrowGeometry {
                    path: vec![source, tip],
                    head: arrow_head(source, tip),
                    style: ArrowStyle::Dangling,
                }
            }
        }
    }

    fn self_loop(source: Point, rect: Rect) -> Self {
        let out_x = rect.right().max(source.x) + LOOP_OFFSET;
        let over_y = rect.y - LOOP_OFFSET;
        let entry_x = rect.center().x;
        let tip = Point::new(entry_x, rect.y);
        let bend = Point::new(entry_x, over_y);
        let path = vec![
            source,
            Point::new(out_x, source.y),
            Point::new(out_x, over_y),
            bend,
            tip,
        ];
        ArrowGeometry {
            path,
            head: arrow_head(bend, tip),
            style: ArrowStyle::SelfLoop,
        }
    }

    pub fn tip(&self) -> Point {
        self.head[0]
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.path.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }

    /// Box enclosing the line, the arrowhead and the pen width
    pub fn bounding_rect(&self) -> Rect {
        Rect::enclosing(self.path.iter().chain(self.head.iter()).copied())
            .unwrap_or_default()
            .expand(PEN_MARGIN)
    }

    /// Whether `p` lies on the arrow, within `tolerance` of the line or inside the head
    pub fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        if !self.bounding_rect().expand(tolerance).contains(p) {
            return false;
        }
        self.segments()
            .any(|(a, b)| distance_to_segment(p, a, b) <= tolerance)
            || triangle_contains(&self.head, p)
    }
}

fn arrow_head(from: Point, tip: Point) -> [Point; 3] {
    let angle = (tip.y - from.y).atan2(tip.x - from.x);
    let left = Point::new(
        tip.x - ARROW_SIZE * (angle - PI / 6.0).cos(),
        tip.y - ARROW_SIZE * (angle - PI / 6.0).sin(),
    );
    let right = Point::new(
        tip.x - ARROW_SIZE * (angle + PI / 6.0).cos(),
        tip.y - ARROW_SIZE * (angle + PI / 6.0).sin(),
    );
    [tip, left, right]
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

fn triangle_contains(tri: &[Point; 3], p: Point) -> bool {
    let sign = |a: Point, b: Point, c: Point| (a.x - c.x) * (b.y - c.y) - (b.x - c.x) * (a.y - c.y);
    let d1 = sign(p, tri[0], tri[1]);
    let d2 = sign(p, tri[1], tri[2]);
    let d3 = sign(p, tri[2], tri[0]);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
