//! Valve anchor selection.
//!
//! The shutoff valve is hung off a column. The chosen column is the one
//! closest to where the zone's center axis meets the source pipe, preferring
//! columns far along the inward axis and close to it laterally.

use std::cmp::Ordering;

use drip_types::geometry::mask;
use drip_types::{
    AnchorFallback, AnchorSource, Diagnostic, DiagnosticKind, Diagnostics, Line, RoutingError, RoutingResult,
    Severity, Tolerances, ValveAnchor, ZoneId,
};
use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::debug;

use crate::axes::ZoneGeometry;
use crate::obstacles::ObstacleIndex;

/// Picks the obstacle point a zone's valve is positioned from.
///
/// # Example
///
/// ```
/// use drip_route::anchor::ValveAnchorSelector;
/// use drip_route::axes::ZoneGeometry;
/// use drip_route::obstacles::ObstacleIndex;
/// use drip_types::{AnchorFallback, Diagnostics, Line, Tolerances, ZoneDescriptor, ZoneId};
/// use nalgebra::{Point3, Vector3};
///
/// let zone = ZoneDescriptor::rectangle(ZoneId(1), Point3::new(-5.0, -3.0, 0.0), Point3::new(5.0, 3.0, 0.0));
/// let source = Line::bound(Point3::new(-6.0, -1.0, 0.0), Point3::new(6.0, -1.0, 0.0)).unwrap();
/// let tol = Tolerances::default();
/// let mut diagnostics = Diagnostics::new();
/// let axes = ZoneGeometry::toward_zone(&zone, &source, &tol, &mut diagnostics).unwrap();
/// let obstacles = ObstacleIndex::from_points(vec![Point3::new(3.0, 2.0, 0.0), Point3::new(-4.0, 2.5, 0.0)]);
///
/// let anchor = ValveAnchorSelector::new(&axes, &source, &tol, AnchorFallback::Reject)
///     .select(zone.id(), None, &obstacles, &mut diagnostics)
///     .unwrap();
/// assert_eq!(anchor.point, Point3::new(3.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ValveAnchorSelector<'a> {
    geometry: &'a ZoneGeometry,
    source: &'a Line,
    tolerances: &'a Tolerances,
    fallback: AnchorFallback,
    fallback_offset: f64,
}

impl<'a> ValveAnchorSelector<'a> {
    /// Creates a selector for one zone.
    #[must_use]
    pub const fn new(
        geometry: &'a ZoneGeometry,
        source: &'a Line,
        tolerances: &'a Tolerances,
        fallback: AnchorFallback,
    ) -> Self {
        Self {
            geometry,
            source,
            tolerances,
            fallback,
            fallback_offset: 0.0,
        }
    }

    /// Sideways distance of a zone-center anchor from the center.
    ///
    /// The valve outlet must stay at least this far from the preferred
    /// transport line, which runs through the center.
    #[must_use]
    pub const fn with_fallback_offset(mut self, offset: f64) -> Self {
        self.fallback_offset = offset;
        self
    }

    /// Point where the zone's center axis meets the source line.
    ///
    /// For a source line that stops short of the axis this is the nearest
    /// point on the axis instead.
    #[must_use]
    pub fn axis_target(&self) -> Option<Point3<f64>> {
        let center = self.geometry.center();
        let axis = Line::unbound(center, self.geometry.root())?;
        Some(axis.closest_approach(self.source))
    }

    /// Selects the anchor.
    ///
    /// A manual override is returned as is. Otherwise candidates are grouped
    /// by their distance to [`axis_target`](Self::axis_target), quantized to
    /// the anchor bucket width; within the nearest group the candidate with
    /// the largest extent along the root vector wins, ties going to the
    /// smallest extent along the perpendicular vector, then to input order.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NoValveAnchor`] when the zone has no
    /// obstacles and the fallback is [`AnchorFallback::Reject`].
    pub fn select(
        &self,
        zone: ZoneId,
        anchor_override: Option<Point3<f64>>,
        obstacles: &ObstacleIndex,
        diagnostics: &mut Diagnostics,
    ) -> RoutingResult<ValveAnchor> {
        if let Some(point) = anchor_override {
            debug!(%zone, ?point, "using manual valve anchor");
            return Ok(ValveAnchor::new(point, AnchorSource::Override));
        }

        if obstacles.is_empty() {
            return self.fall_back(zone, diagnostics);
        }

        let target = self
            .axis_target()
            .ok_or(RoutingError::NoValveAnchor { zone })?;

        let bucket = self.tolerances.anchor_bucket();
        let mut groups: HashMap<i64, Vec<Point3<f64>>> = HashMap::new();
        for point in obstacles.points() {
            #[allow(clippy::cast_possible_truncation)]
            let key = ((point - target).norm() / bucket).round() as i64;
            groups.entry(key).or_default().push(*point);
        }

        let nearest = groups
            .iter()
            .min_by_key(|(key, _)| **key)
            .map(|(_, points)| points)
            .ok_or(RoutingError::NoValveAnchor { zone })?;

        let root = self.geometry.root();
        let perpendicular = self.geometry.perpendicular();
        let best = nearest
            .iter()
            .min_by(|a, b| {
                let depth = mask(&b.coords, &root).norm().total_cmp(&mask(&a.coords, &root).norm());
                if depth == Ordering::Equal {
                    mask(&a.coords, &perpendicular)
                        .norm()
                        .total_cmp(&mask(&b.coords, &perpendicular).norm())
                } else {
                    depth
                }
            })
            .copied()
            .ok_or(RoutingError::NoValveAnchor { zone })?;

        debug!(%zone, ?best, candidates = nearest.len(), "selected valve anchor");
        Ok(ValveAnchor::new(best, AnchorSource::Obstacle))
    }

    fn fall_back(&self, zone: ZoneId, diagnostics: &mut Diagnostics) -> RoutingResult<ValveAnchor> {
        match self.fallback {
            AnchorFallback::Reject => Err(RoutingError::NoValveAnchor { zone }),
            AnchorFallback::ZoneCenter => {
                diagnostics.push(
                    Diagnostic::unique(
                        DiagnosticKind::ValveAnchorFallback,
                        Severity::Info,
                        format!("{zone} has no columns; the valve is anchored beside the zone center"),
                    )
                    .with_zone(zone),
                );
                let point = self.geometry.center() + self.geometry.lateral() * self.fallback_offset;
                Ok(ValveAnchor::new(point, AnchorSource::ZoneCenter))
            }
        }
    }
}
