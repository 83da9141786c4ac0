//! Routing axes of a zone.
//!
//! A zone is reduced to its axis-aligned bounding rectangle. The direction
//! pointing from the source pipe into the zone is snapped onto the closest
//! cardinal axis and scaled onto the rectangle, giving the root vector
//! (across the zone, away from the source) and the perpendicular vector
//! (along the zone's width as seen from the source).
//!
//! # Example
//!
//! ```
//! use drip_route::axes::ZoneGeometry;
//! use drip_types::{Diagnostics, Tolerances, ZoneDescriptor, ZoneId};
//! use nalgebra::{Point3, Vector3};
//!
//! let zone = ZoneDescriptor::rectangle(
//!     ZoneId(1),
//!     Point3::new(-5.0, -3.0, 0.0),
//!     Point3::new(5.0, 3.0, 0.0),
//! );
//! let mut diagnostics = Diagnostics::new();
//! let axes = ZoneGeometry::derive(&zone, &Vector3::new(0.1, 0.9, 0.0), &Tolerances::default(), &mut diagnostics)
//!     .unwrap();
//!
//! assert_eq!(axes.root(), Vector3::new(0.0, 6.0, 0.0));
//! assert_eq!(axes.perpendicular(), Vector3::new(10.0, 0.0, 0.0));
//! ```

use drip_types::geometry::{flatten, is_finite_point, mask, snap_to_axis, try_normalize};
use drip_types::{Diagnostic, DiagnosticKind, Diagnostics, Line, Rectangle, RoutingError, RoutingResult, Tolerances, ZoneDescriptor};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Axis-snapped routing frame of one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneGeometry {
    rectangle: Rectangle,
    inward: Vector3<f64>,
    root: Vector3<f64>,
    perpendicular: Vector3<f64>,
    degenerate: bool,
}

impl ZoneGeometry {
    /// Derives the routing axes from a zone and a preferred inward direction.
    ///
    /// A degenerate boundary (fewer than two distinct vertices, or zero
    /// width or height) is replaced by a unit square around its center and
    /// reported as a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidInput`] for an empty boundary,
    /// non-finite coordinates, or a zero or vertical preferred direction.
    pub fn derive(
        zone: &ZoneDescriptor,
        preferred: &Vector3<f64>,
        tolerances: &Tolerances,
        diagnostics: &mut Diagnostics,
    ) -> RoutingResult<Self> {
        let boundary = zone.boundary();
        if boundary.iter().any(|p| !is_finite_point(p)) {
            return Err(RoutingError::invalid_input(format!(
                "{} boundary has non-finite coordinates",
                zone.id()
            )));
        }
        let bounds = zone
            .bounding_rectangle()
            .ok_or_else(|| RoutingError::invalid_input(format!("{} boundary is empty", zone.id())))?;

        if !preferred.iter().all(|c| c.is_finite()) {
            return Err(RoutingError::invalid_input("preferred direction is not finite"));
        }
        let unit = try_normalize(&flatten(preferred))
            .ok_or_else(|| RoutingError::invalid_input("preferred direction is zero or vertical"))?;

        let degenerate = bounds.is_degenerate(tolerances.geometry_epsilon());
        let rectangle = if degenerate {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::InvalidZoneGeometry,
                    format!("{} has a degenerate boundary; a unit rectangle is used", zone.id()),
                )
                .with_zone(zone.id()),
            );
            Rectangle::unit_at(&bounds.center())
        } else {
            bounds
        };

        let inward = dominant_axis(&unit);
        let lateral = inward.cross(&Vector3::z());
        let extent = rectangle.extent();

        let geometry = Self {
            rectangle,
            inward,
            root: mask(&inward, &extent),
            perpendicular: mask(&lateral, &extent),
            degenerate,
        };
        debug!(
            zone = %zone.id(),
            root = ?geometry.root,
            perpendicular = ?geometry.perpendicular,
            "derived zone axes"
        );
        Ok(geometry)
    }

    /// Derives the axes with the inward direction pointing from the source
    /// line towards the zone center.
    ///
    /// # Errors
    ///
    /// Same as [`derive`](Self::derive); a zone centered on the source line
    /// has no inward direction and is rejected.
    pub fn toward_zone(
        zone: &ZoneDescriptor,
        source: &Line,
        tolerances: &Tolerances,
        diagnostics: &mut Diagnostics,
    ) -> RoutingResult<Self> {
        let center = zone
            .bounding_rectangle()
            .map(|r| r.center())
            .ok_or_else(|| RoutingError::invalid_input(format!("{} boundary is empty", zone.id())))?;
        let preferred = center - source.closest_point(&center);
        Self::derive(zone, &preferred, tolerances, diagnostics)
    }

    /// The rectangle routing works in.
    #[must_use]
    pub const fn rectangle(&self) -> &Rectangle {
        &self.rectangle
    }

    /// Zone center at floor level.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        self.rectangle.center()
    }

    /// Snapped unit vector pointing into the zone.
    #[must_use]
    pub const fn inward(&self) -> Vector3<f64> {
        self.inward
    }

    /// Snapped unit vector along the zone's width.
    #[must_use]
    pub fn lateral(&self) -> Vector3<f64> {
        self.inward.cross(&Vector3::z())
    }

    /// Inward axis scaled to the zone's depth.
    #[must_use]
    pub const fn root(&self) -> Vector3<f64> {
        self.root
    }

    /// Lateral axis scaled to the zone's width.
    #[must_use]
    pub const fn perpendicular(&self) -> Vector3<f64> {
        self.perpendicular
    }

    /// Returns `true` if the boundary had to be replaced by a unit square.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}

/// Snaps a horizontal unit vector onto one cardinal axis.
///
/// Rounding alone maps directions near 45° onto `(±1, ±1)`; those resolve to
/// the larger component, and to X on an exact tie.
fn dominant_axis(unit: &Vector3<f64>) -> Vector3<f64> {
    let snapped = snap_to_axis(unit);
    if snapped.x != 0.0 && snapped.y != 0.0 {
        if unit.x.abs() >= unit.y.abs() {
            Vector3::new(snapped.x, 0.0, 0.0)
        } else {
            Vector3::new(0.0, snapped.y, 0.0)
        }
    } else {
        Vector3::new(snapped.x, snapped.y, 0.0)
    }
}
