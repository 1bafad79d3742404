//! Geometry primitives shared by layout, hit testing and export
//!
//! Node sizes are derived from label text, and flow endpoints are clipped to
//! the rectangular boundary of the nodes they connect.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Horizontal space reserved per label column
pub const CHAR_WIDTH: f64 = 10.0;

/// Horizontal padding added around a label
pub const LABEL_PADDING: f64 = 60.0;

/// A point in scene (or screen) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Shortest distance from this point to the segment `a..b`
    pub fn distance_to_segment(self, a: Point, b: Point) -> f64 {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.distance_to(a);
        }
        let t = (((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        self.distance_to(Point::new(a.x + t * dx, a.y + t * dy))
    }
}

/// Width and height of a rendered shape
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A node footprint: an axis-aligned rectangle described by its center
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Point,
    pub size: Size,
}

impl OrientedBox {
    pub const fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    pub fn half_width(&self) -> f64 {
        self.size.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.size.height / 2.0
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.center.x - self.half_width(),
            min_y: self.center.y - self.half_height(),
            max_x: self.center.x + self.half_width(),
            max_y: self.center.y + self.half_height(),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Degenerate bounds covering a single point
    pub fn at(point: Point) -> Self {
        Self {
            min_x: point.x,
            min_y: point.y,
            max_x: point.x,
            max_y: point.y,
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty input
    pub fn around(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points
            .into_iter()
            .map(Bounds::at)
            .reduce(|acc, next| acc.union(&next))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn inflate(&self, amount: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

/// Display columns occupied by a label (wide glyphs count double)
pub fn label_columns(label: &str) -> usize {
    label.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Width of a node whose label is `label`, never narrower than `min_width`
///
/// # Example
/// ```
/// use dfdraw::core::measure_width;
///
/// assert_eq!(measure_width("Bank", 160.0), 160.0);
/// assert_eq!(measure_width("Payment Gateway Service", 160.0), 290.0);
/// ```
pub fn measure_width(label: &str, min_width: f64) -> f64 {
    let estimated = label_columns(label) as f64 * CHAR_WIDTH + LABEL_PADDING;
    estimated.max(min_width)
}

/// Point where the ray from `origin` toward `target.center` crosses the
/// boundary of `target`
///
/// Shallow rays (`|dy/dx| <= hh/hw`) leave through the left or right edge,
/// steep rays through the top or bottom edge. An origin at the target center
/// yields the center itself.
///
/// # Example
/// ```
/// use dfdraw::core::{boundary_intersection, OrientedBox, Point, Size};
///
/// let target = OrientedBox::new(Point::new(100.0, 0.0), Size::new(40.0, 20.0));
/// let hit = boundary_intersection(Point::new(0.0, 0.0), &target);
/// assert_eq!(hit, Point::new(80.0, 0.0));
/// ```
pub fn boundary_intersection(origin: Point, target: &OrientedBox) -> Point {
    let center = target.center;
    let dx = center.x - origin.x;
    let dy = center.y - origin.y;

    if dx == 0.0 && dy == 0.0 {
        return center;
    }

    let hw = target.half_width();
    let hh = target.half_height();

    // Cross-multiplied slope comparison keeps vertical rays out of this branch.
    if dx != 0.0 && dy.abs() * hw <= dx.abs() * hh {
        let edge = if dx > 0.0 { hw } else { -hw };
        Point::new(center.x - edge, center.y - edge * (dy / dx))
    } else {
        let edge = if dy > 0.0 { hh } else { -hh };
        Point::new(center.x - edge * (dx / dy), center.y - edge)
    }
}
