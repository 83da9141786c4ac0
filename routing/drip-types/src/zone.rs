//! Zone and source-line descriptors handed over by the host.
//!
//! These are the abstract inputs of a routing call. The host extracts them
//! from its document; the core never sees host objects.

use std::fmt;

use nalgebra::{Point3, Vector3};

use crate::geometry::{Line, Rectangle, is_finite_point};

/// Host identifier of a floor zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(pub u64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone #{}", self.0)
    }
}

/// Host identifier of a source (main) pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source #{}", self.0)
    }
}

/// A floor zone serviced by one drip branch.
///
/// # Example
///
/// ```
/// use drip_types::{ZoneDescriptor, ZoneId};
/// use nalgebra::Point3;
///
/// let zone = ZoneDescriptor::rectangle(
///     ZoneId(1),
///     Point3::new(-5.0, -3.0, 0.0),
///     Point3::new(5.0, 3.0, 0.0),
/// )
/// .with_obstacle_points(vec![Point3::new(3.0, 2.0, 0.0)]);
///
/// assert_eq!(zone.boundary().len(), 4);
/// assert!(zone.anchor_override().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneDescriptor {
    id: ZoneId,
    boundary: Vec<Point3<f64>>,
    obstacle_points: Vec<Point3<f64>>,
    anchor_override: Option<Point3<f64>>,
}

impl ZoneDescriptor {
    /// Creates a zone from its ordered boundary polygon.
    #[must_use]
    pub fn new(id: ZoneId, boundary: Vec<Point3<f64>>) -> Self {
        Self {
            id,
            boundary,
            obstacle_points: Vec::new(),
            anchor_override: None,
        }
    }

    /// Creates an axis-aligned rectangular zone from two opposite corners.
    #[must_use]
    pub fn rectangle(id: ZoneId, a: Point3<f64>, b: Point3<f64>) -> Self {
        Self::new(
            id,
            vec![
                Point3::new(a.x, a.y, a.z),
                Point3::new(b.x, a.y, a.z),
                Point3::new(b.x, b.y, a.z),
                Point3::new(a.x, b.y, a.z),
            ],
        )
    }

    /// Sets the obstacle points (column locations) near this zone.
    ///
    /// The list may include points outside the zone; the obstacle filter
    /// discards them.
    #[must_use]
    pub fn with_obstacle_points(mut self, points: Vec<Point3<f64>>) -> Self {
        self.obstacle_points = points;
        self
    }

    /// Pins the valve anchor to a manually chosen point.
    #[must_use]
    pub const fn with_anchor_override(mut self, point: Point3<f64>) -> Self {
        self.anchor_override = Some(point);
        self
    }

    /// Returns the zone id.
    #[must_use]
    pub const fn id(&self) -> ZoneId {
        self.id
    }

    /// Returns the boundary polygon.
    #[must_use]
    pub fn boundary(&self) -> &[Point3<f64>] {
        &self.boundary
    }

    /// Returns the obstacle points handed in with the zone.
    #[must_use]
    pub fn obstacle_points(&self) -> &[Point3<f64>] {
        &self.obstacle_points
    }

    /// Returns the manual valve anchor, if any.
    #[must_use]
    pub const fn anchor_override(&self) -> Option<Point3<f64>> {
        self.anchor_override
    }

    /// Bounding rectangle of the boundary, `None` if the boundary is empty.
    #[must_use]
    pub fn bounding_rectangle(&self) -> Option<Rectangle> {
        Rectangle::bounding(&self.boundary)
    }
}

/// The main pipe a branch taps from.
///
/// # Example
///
/// ```
/// use drip_types::{SourceId, SourceLine};
/// use nalgebra::{Point3, Vector3};
///
/// let source = SourceLine::new(
///     SourceId(7),
///     Point3::new(-6.0, -1.0, 0.0),
///     Vector3::x(),
///     12.0,
/// );
/// let line = source.line().unwrap();
/// assert_eq!(line.length(), Some(12.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLine {
    id: SourceId,
    origin: Point3<f64>,
    direction: Vector3<f64>,
    extent: f64,
    classification: Option<String>,
}

impl SourceLine {
    /// Creates a source line running `extent` from `origin` along `direction`.
    #[must_use]
    pub const fn new(id: SourceId, origin: Point3<f64>, direction: Vector3<f64>, extent: f64) -> Self {
        Self {
            id,
            origin,
            direction,
            extent,
            classification: None,
        }
    }

    /// Creates a source line between two end points.
    #[must_use]
    pub fn between(id: SourceId, start: Point3<f64>, end: Point3<f64>) -> Self {
        let delta = end - start;
        Self::new(id, start, delta, delta.norm())
    }

    /// Sets the piping-system classification of the source pipe.
    #[must_use]
    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    /// Returns the source id.
    #[must_use]
    pub const fn id(&self) -> SourceId {
        self.id
    }

    /// Returns the origin.
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Returns the direction as given (not necessarily normalized).
    #[must_use]
    pub const fn direction(&self) -> Vector3<f64> {
        self.direction
    }

    /// Returns the extent along the direction.
    #[must_use]
    pub const fn extent(&self) -> f64 {
        self.extent
    }

    /// Returns the system classification, if known.
    #[must_use]
    pub fn classification(&self) -> Option<&str> {
        self.classification.as_deref()
    }

    /// Bounded geometric line of the pipe.
    ///
    /// Returns `None` for a zero direction, a non-positive extent or
    /// non-finite input.
    #[must_use]
    pub fn line(&self) -> Option<Line> {
        if !is_finite_point(&self.origin) || !self.extent.is_finite() || self.extent <= 0.0 {
            return None;
        }
        let unit = self.direction.try_normalize(crate::geometry::DEGENERATE_LENGTH)?;
        Line::bound(self.origin, self.origin + unit * self.extent)
    }
}

/// Where a zone's valve anchor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnchorSource {
    /// Manual per-zone override.
    Override,
    /// Selected from the zone's obstacle points.
    Obstacle,
    /// Zone center, used when the zone has no obstacles and the fallback allows it.
    ZoneCenter,
}

/// The point used to position a zone's shutoff valve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValveAnchor {
    /// Anchor location.
    pub point: Point3<f64>,
    /// How the anchor was chosen.
    pub source: AnchorSource,
}

impl ValveAnchor {
    /// Creates an anchor.
    #[must_use]
    pub const fn new(point: Point3<f64>, source: AnchorSource) -> Self {
        Self { point, source }
    }

    /// Returns `true` if the anchor is a manual override.
    #[must_use]
    pub const fn is_override(&self) -> bool {
        matches!(self.source, AnchorSource::Override)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_zone_boundary() {
        let zone = ZoneDescriptor::rectangle(
            ZoneId(3),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 2.0, 0.0),
        );
        let rect = zone.bounding_rectangle().unwrap();
        assert!((rect.width() - 4.0).abs() < 1e-12);
        assert!((rect.height() - 2.0).abs() < 1e-12);
        assert_eq!(zone.id().to_string(), "zone #3");
    }

    #[test]
    fn test_empty_boundary_has_no_rectangle() {
        let zone = ZoneDescriptor::new(ZoneId(1), Vec::new());
        assert!(zone.bounding_rectangle().is_none());
    }

    #[test]
    fn test_source_line_normalizes_direction() {
        let source = SourceLine::new(SourceId(1), Point3::origin(), Vector3::new(0.0, 5.0, 0.0), 3.0);
        let line = source.line().unwrap();
        assert_eq!(line.end(), Some(Point3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_source_line_rejects_degenerate() {
        let zero_dir = SourceLine::new(SourceId(1), Point3::origin(), Vector3::zeros(), 3.0);
        assert!(zero_dir.line().is_none());
        let zero_len = SourceLine::new(SourceId(1), Point3::origin(), Vector3::x(), 0.0);
        assert!(zero_len.line().is_none());
    }

    #[test]
    fn test_between_and_classification() {
        let source = SourceLine::between(
            SourceId(9),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 5.0, 0.0),
        )
        .with_classification("Irrigation");
        assert!((source.extent() - 4.0).abs() < 1e-12);
        assert_eq!(source.classification(), Some("Irrigation"));
    }

    #[test]
    fn test_anchor_override_flag() {
        let anchor = ValveAnchor::new(Point3::origin(), AnchorSource::Override);
        assert!(anchor.is_override());
        assert!(!ValveAnchor::new(Point3::origin(), AnchorSource::Obstacle).is_override());
    }
}
