//! Plan geometry primitives: lines, rectangles and vector helpers.
//!
//! Everything in the routing core lives in one world frame with Z pointing
//! up. Floor-plan reasoning happens in the XY plane; heights are applied to
//! finished points with [`with_z`].
//!
//! # Example
//!
//! ```
//! use drip_types::{Line, Rectangle};
//! use nalgebra::{Point3, Vector3};
//!
//! let rect = Rectangle::new(Point3::new(-5.0, -3.0, 0.0), Point3::new(5.0, 3.0, 0.0));
//! assert!(rect.contains_xy(&Point3::new(3.0, 2.0, 7.0)));
//!
//! let line = Line::unbound(Point3::origin(), Vector3::x()).unwrap();
//! assert!((line.distance_to(&Point3::new(4.0, 2.0, 0.0)) - 2.0).abs() < 1e-12);
//! ```

use nalgebra::{Point2, Point3, Vector3};

/// Lengths below this are treated as zero when building lines.
pub const DEGENERATE_LENGTH: f64 = 1e-12;

/// Returns `p` with its Z coordinate replaced by `z`.
#[must_use]
pub fn with_z(p: &Point3<f64>, z: f64) -> Point3<f64> {
    Point3::new(p.x, p.y, z)
}

/// Drops the vertical component of a vector.
#[must_use]
pub fn flatten(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.y, 0.0)
}

/// Multiplies two vectors term by term.
///
/// Used to scale an axis-snapped unit vector onto a rectangle's extents:
/// `mask((0, -1, 0), (10, 6, 0)) == (0, -6, 0)`.
#[must_use]
pub fn mask(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.component_mul(b)
}

/// Rounds every component to the nearest integer.
///
/// Applied to a horizontal unit vector this snaps it onto the closest
/// cardinal axis. Components at |0.5| or above round away from zero, so a
/// 45° diagonal snaps to `(±1, ±1)`; callers that need a single axis must
/// break that tie themselves.
#[must_use]
pub fn snap_to_axis(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x.round(), v.y.round(), v.z.round())
}

/// Normalizes a vector, returning `None` for (near) zero vectors.
#[must_use]
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(DEGENERATE_LENGTH)
}

/// Returns `true` if every coordinate of the point is finite.
#[must_use]
pub fn is_finite_point(p: &Point3<f64>) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// A straight line, either bounded (a segment) or unbounded.
///
/// The direction is always stored normalized. A bounded line runs from
/// [`Line::origin`] over `length` along the direction.
///
/// Distance queries respect the bounds; [`Line::project`] always uses the
/// infinite carrier line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    origin: Point3<f64>,
    direction: Vector3<f64>,
    length: Option<f64>,
}

impl Line {
    /// Creates a bounded line between two points.
    ///
    /// Returns `None` if the points coincide.
    ///
    /// # Example
    ///
    /// ```
    /// use drip_types::Line;
    /// use nalgebra::Point3;
    ///
    /// let line = Line::bound(Point3::origin(), Point3::new(0.0, 3.0, 4.0)).unwrap();
    /// assert_eq!(line.length(), Some(5.0));
    /// assert!(Line::bound(Point3::origin(), Point3::origin()).is_none());
    /// ```
    #[must_use]
    pub fn bound(start: Point3<f64>, end: Point3<f64>) -> Option<Self> {
        let delta = end - start;
        let length = delta.norm();
        if !length.is_finite() || length < DEGENERATE_LENGTH {
            return None;
        }
        Some(Self {
            origin: start,
            direction: delta / length,
            length: Some(length),
        })
    }

    /// Creates an unbounded line through `origin` along `direction`.
    ///
    /// Returns `None` if the direction is (near) zero.
    #[must_use]
    pub fn unbound(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let direction = try_normalize(&direction)?;
        Some(Self {
            origin,
            direction,
            length: None,
        })
    }

    /// Returns the origin (start point for bounded lines).
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Returns the unit direction.
    #[must_use]
    pub const fn direction(&self) -> Vector3<f64> {
        self.direction
    }

    /// Returns the length of a bounded line, `None` when unbounded.
    #[must_use]
    pub const fn length(&self) -> Option<f64> {
        self.length
    }

    /// Returns `true` if the line has finite extent.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.length.is_some()
    }

    /// Returns the end point of a bounded line.
    #[must_use]
    pub fn end(&self) -> Option<Point3<f64>> {
        self.length.map(|l| self.origin + self.direction * l)
    }

    /// Returns the same line without bounds.
    #[must_use]
    pub const fn unbounded(&self) -> Self {
        Self {
            origin: self.origin,
            direction: self.direction,
            length: None,
        }
    }

    /// Signed parameter of the orthogonal projection of `p` onto the carrier.
    #[must_use]
    pub fn parameter_of(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    /// Point on the carrier at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Projects a point onto the infinite carrier line, ignoring bounds.
    #[must_use]
    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        self.point_at(self.parameter_of(p))
    }

    /// Closest point on the line, clamped to the bounds if bounded.
    #[must_use]
    pub fn closest_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.point_at(self.clamp(self.parameter_of(p)))
    }

    /// Distance from a point to the line (to the segment if bounded).
    #[must_use]
    pub fn distance_to(&self, p: &Point3<f64>) -> f64 {
        (p - self.closest_point(p)).norm()
    }

    /// Returns the line moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        Self {
            origin: self.origin + offset,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Point on `self` closest to `other`, honouring both lines' bounds.
    ///
    /// For intersecting lines this is the intersection point; otherwise it
    /// is the nearest-approach point on `self`. Parallel lines resolve to the
    /// projection of `other`'s origin.
    ///
    /// # Example
    ///
    /// ```
    /// use drip_types::Line;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let axis = Line::unbound(Point3::origin(), Vector3::y()).unwrap();
    /// let pipe = Line::bound(Point3::new(-6.0, -1.0, 0.0), Point3::new(6.0, -1.0, 0.0)).unwrap();
    /// let hit = axis.closest_approach(&pipe);
    /// assert!((hit - Point3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
    /// ```
    #[must_use]
    pub fn closest_approach(&self, other: &Self) -> Point3<f64> {
        let u = self.direction;
        let v = other.direction;
        let w = self.origin - other.origin;
        let b = u.dot(&v);
        let d = u.dot(&w);
        let e = v.dot(&w);
        let denom = 1.0 - b * b;

        if denom < DEGENERATE_LENGTH {
            let t = other.clamp(0.0);
            let s = self.clamp(b * t - d);
            return self.point_at(s);
        }

        let mut t = other.clamp((e - b * d) / denom);
        let s = self.clamp(b * t - d);
        t = other.clamp(b * s + e);
        self.point_at(self.clamp(b * t - d))
    }

    fn clamp(&self, t: f64) -> f64 {
        match self.length {
            Some(l) => t.clamp(0.0, l),
            None => t,
        }
    }
}

/// An axis-aligned rectangle in the XY plane.
///
/// Zone footprints are reduced to their bounding rectangle; heights are
/// ignored by every query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rectangle {
    /// Minimum corner.
    pub min: Point2<f64>,
    /// Maximum corner.
    pub max: Point2<f64>,
}

impl Rectangle {
    /// Creates a rectangle spanning two points; the corners are ordered.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Bounding rectangle of a set of points, `None` for an empty set.
    #[must_use]
    pub fn bounding<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |rect, p| Self {
            min: Point2::new(rect.min.x.min(p.x), rect.min.y.min(p.y)),
            max: Point2::new(rect.max.x.max(p.x), rect.max.y.max(p.y)),
        }))
    }

    /// A 1×1 rectangle centered on `center`.
    #[must_use]
    pub fn unit_at(center: &Point3<f64>) -> Self {
        Self {
            min: Point2::new(center.x - 0.5, center.y - 0.5),
            max: Point2::new(center.x + 0.5, center.y + 0.5),
        }
    }

    /// Extent along X.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along Y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// `(width, height, 0)`, the vector used to scale snapped axes.
    #[must_use]
    pub fn extent(&self) -> Vector3<f64> {
        Vector3::new(self.width(), self.height(), 0.0)
    }

    /// Center at floor level (z = 0).
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            0.0,
        )
    }

    /// Returns `true` when either extent is below `epsilon`.
    #[must_use]
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.width() < epsilon || self.height() < epsilon
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Checks whether the plan position of `p` lies inside (inclusive).
    #[must_use]
    pub fn contains_xy(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bound_line_rejects_zero_length() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(Line::bound(p, p).is_none());
        assert!(Line::unbound(p, Vector3::zeros()).is_none());
    }

    #[test]
    fn test_bounded_distance_clamps_to_segment() {
        let line = Line::bound(Point3::origin(), Point3::new(0.0, -1.0, 0.0)).unwrap();
        // Beyond the start: distance to the endpoint, not to the carrier.
        assert_relative_eq!(
            line.distance_to(&Point3::new(3.0, 2.0, 0.0)),
            13.0_f64.sqrt(),
            epsilon = 1e-12
        );
        // Projection ignores the bounds.
        let projected = line.project(&Point3::new(3.0, 2.0, 0.0));
        assert_relative_eq!(projected.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(projected.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_translated_keeps_extent() {
        let line = Line::bound(Point3::origin(), Point3::new(2.0, 0.0, 0.0)).unwrap();
        let moved = line.translated(&Vector3::new(0.0, 1.5, 0.0));
        assert_eq!(moved.length(), Some(2.0));
        assert_relative_eq!(moved.distance_to(&Point3::new(1.0, 0.0, 0.0)), 1.5);
    }

    #[test]
    fn test_closest_approach_skew_lines() {
        let a = Line::unbound(Point3::new(0.0, 0.0, 0.0), Vector3::x()).unwrap();
        let b = Line::unbound(Point3::new(2.0, 0.0, 1.0), Vector3::y()).unwrap();
        let p = a.closest_approach(&b);
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_closest_approach_respects_other_bounds() {
        let axis = Line::unbound(Point3::origin(), Vector3::y()).unwrap();
        // Segment that stops short of the axis.
        let pipe = Line::bound(Point3::new(2.0, -1.0, 0.0), Point3::new(8.0, -1.0, 0.0)).unwrap();
        let p = axis.closest_approach(&pipe);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_closest_approach_parallel() {
        let a = Line::unbound(Point3::origin(), Vector3::x()).unwrap();
        let b = Line::bound(Point3::new(3.0, 2.0, 0.0), Point3::new(5.0, 2.0, 0.0)).unwrap();
        let p = a.closest_approach(&b);
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rectangle_bounding_and_center() {
        let pts = [
            Point3::new(-5.0, -3.0, 0.0),
            Point3::new(5.0, -3.0, 0.0),
            Point3::new(5.0, 3.0, 0.0),
            Point3::new(-5.0, 3.0, 0.0),
        ];
        let rect = Rectangle::bounding(&pts).unwrap();
        assert_relative_eq!(rect.width(), 10.0);
        assert_relative_eq!(rect.height(), 6.0);
        assert_eq!(rect.center(), Point3::origin());
        assert!(!rect.is_degenerate(1e-9));
        assert!(Rectangle::bounding(&[]).is_none());
    }

    #[test]
    fn test_rectangle_expanded_contains() {
        let rect = Rectangle::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0));
        let p = Point3::new(1.2, 0.5, 9.0);
        assert!(!rect.contains_xy(&p));
        assert!(rect.expanded(0.3).contains_xy(&p));
    }

    #[test]
    fn test_vector_helpers() {
        let snapped = snap_to_axis(&Vector3::new(0.2, -0.98, 0.0));
        assert_eq!(snapped, Vector3::new(0.0, -1.0, 0.0));
        let scaled = mask(&snapped, &Vector3::new(10.0, 6.0, 0.0));
        assert_eq!(scaled, Vector3::new(0.0, -6.0, 0.0));
        assert_eq!(flatten(&Vector3::new(1.0, 2.0, 3.0)), Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(with_z(&Point3::new(1.0, 2.0, 3.0), -0.4).z, -0.4);
    }
}
