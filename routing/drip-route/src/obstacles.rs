//! Obstacle points (columns) relevant to one zone.

use drip_types::geometry::is_finite_point;
use drip_types::{Line, Rectangle};
use nalgebra::Point3;

/// The obstacle points lying inside a zone, in input order.
///
/// # Example
///
/// ```
/// use drip_route::obstacles::ObstacleIndex;
/// use drip_types::Rectangle;
/// use nalgebra::Point3;
///
/// let rect = Rectangle::new(Point3::new(-5.0, -3.0, 0.0), Point3::new(5.0, 3.0, 0.0));
/// let index = ObstacleIndex::filter(
///     &rect,
///     &[Point3::new(3.0, 2.0, 0.0), Point3::new(5.2, 0.0, 0.0), Point3::new(9.0, 0.0, 0.0)],
///     0.3048,
/// );
/// assert_eq!(index.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleIndex {
    points: Vec<Point3<f64>>,
}

impl ObstacleIndex {
    /// Keeps the points whose plan position falls inside `rectangle` grown
    /// by `margin`. Non-finite points are dropped.
    #[must_use]
    pub fn filter(rectangle: &Rectangle, points: &[Point3<f64>], margin: f64) -> Self {
        let area = rectangle.expanded(margin);
        Self {
            points: points
                .iter()
                .filter(|p| is_finite_point(p) && area.contains_xy(p))
                .copied()
                .collect(),
        }
    }

    /// Wraps points that were already filtered.
    #[must_use]
    pub const fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    /// Returns the points.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the zone has no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest distance from any obstacle to `line`.
    #[must_use]
    pub fn nearest_distance(&self, line: &Line) -> Option<f64> {
        self.points
            .iter()
            .map(|p| line.distance_to(p))
            .min_by(f64::total_cmp)
    }

    /// The obstacles jointly closest to `line`: every point within
    /// `tolerance` of the nearest distance.
    #[must_use]
    pub fn closest_group(&self, line: &Line, tolerance: f64) -> Vec<Point3<f64>> {
        let Some(nearest) = self.nearest_distance(line) else {
            return Vec::new();
        };
        self.points
            .iter()
            .filter(|p| line.distance_to(p) <= nearest + tolerance)
            .copied()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect() -> Rectangle {
        Rectangle::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 0.0))
    }

    #[test]
    fn test_filter_uses_plan_position_and_margin() {
        let points = [
            Point3::new(2.0, 2.0, 10.0),
            Point3::new(-0.3, 2.0, 0.0),
            Point3::new(-0.4, 2.0, 0.0),
            Point3::new(f64::NAN, 1.0, 0.0),
        ];
        let index = ObstacleIndex::filter(&rect(), &points, 0.3048);
        assert_eq!(index.points(), &points[..2]);
    }

    #[test]
    fn test_empty_index() {
        let index = ObstacleIndex::filter(&rect(), &[], 0.3);
        assert!(index.is_empty());
        let line = Line::bound(Point3::origin(), Point3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(index.nearest_distance(&line).is_none());
        assert!(index.closest_group(&line, 0.001).is_empty());
    }

    #[test]
    fn test_closest_group_collects_ties() {
        let index = ObstacleIndex::from_points(vec![
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.0, -1.0, 0.0),
            Point3::new(2.0, 1.0005, 0.0),
            Point3::new(2.0, 3.0, 0.0),
        ]);
        let line = Line::bound(Point3::origin(), Point3::new(4.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(index.nearest_distance(&line).unwrap(), 1.0);

        let group = index.closest_group(&line, 0.001);
        assert_eq!(group.len(), 3);
        assert!(!group.contains(&Point3::new(2.0, 3.0, 0.0)));
    }
}
