//! Zoom/pan transform
//!
//! A single translate + uniform scale applied to the whole scene:
//! `screen = scene * k + (x, y)`.

use serde::Serialize;

use crate::core::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    /// Scene point to screen point
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    /// Screen point to scene point
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> ZoomTransform {
        ZoomTransform {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Scale by `factor` keeping the scene point under `anchor` (screen
    /// coordinates) fixed, with the resulting scale clamped to `[min, max]`
    pub fn zoom_about(&self, anchor: Point, factor: f64, min: f64, max: f64) -> ZoomTransform {
        let k = (self.k * factor).clamp(min, max);
        let focus = self.invert(anchor);
        ZoomTransform {
            k,
            x: anchor.x - focus.x * k,
            y: anchor.y - focus.y * k,
        }
    }

    /// Scale as a rounded percentage
    pub fn percent(&self) -> i64 {
        (self.k * 100.0).round() as i64
    }

    /// `transform` attribute value
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_invert() {
        let t = ZoomTransform {
            k: 2.0,
            x: 10.0,
            y: -5.0,
        };
        let p = Point::new(3.0, 4.0);
        assert_eq!(t.apply(p), Point::new(16.0, 3.0));
        assert_eq!(t.invert(t.apply(p)), p);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let t = ZoomTransform::IDENTITY.translate(40.0, 20.0);
        let anchor = Point::new(200.0, 100.0);
        let before = t.invert(anchor);
        let zoomed = t.zoom_about(anchor, 1.5, 0.1, 4.0);
        assert_eq!(zoomed.k, 1.5);
        let after = zoomed.invert(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let t = ZoomTransform::IDENTITY;
        assert_eq!(t.zoom_about(Point::default(), 100.0, 0.1, 4.0).k, 4.0);
        assert_eq!(t.zoom_about(Point::default(), 0.001, 0.1, 4.0).k, 0.1);
    }

    #[test]
    fn test_percent() {
        let t = ZoomTransform {
            k: 1.4,
            ..ZoomTransform::IDENTITY
        };
        assert_eq!(t.percent(), 140);
    }
}
