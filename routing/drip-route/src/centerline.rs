//! Transport centerline search.
//!
//! The long transport line ideally runs from the zone center straight
//! towards the source pipe. Columns near that line, or near the valve
//! outlet, push it sideways: each round the line is translated away from
//! the valve outlet by the clearance plus a small epsilon until the columns
//! closest to it keep their distance.
//!
//! # Example
//!
//! ```
//! use drip_route::centerline::CenterlineSearch;
//! use drip_route::obstacles::ObstacleIndex;
//! use drip_types::{Line, RoutingParameters};
//! use nalgebra::Point3;
//!
//! let params = RoutingParameters::default();
//! let obstacles = ObstacleIndex::from_points(vec![Point3::new(0.2, -0.5, 0.0)]);
//! let preferred = Line::bound(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, -1.0, 0.0)).unwrap();
//!
//! let found = CenterlineSearch::new(&obstacles, &params)
//!     .search(&Point3::new(3.0, 1.3, 0.0), &preferred)
//!     .unwrap();
//! assert_eq!(found.displacements, 1);
//! assert!(found.line.origin().x < -0.5);
//! ```

use drip_types::geometry::{flatten, try_normalize};
use drip_types::{Line, RoutingError, RoutingParameters, RoutingResult};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::obstacles::ObstacleIndex;

/// An accepted transport centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centerline {
    /// The accepted line.
    pub line: Line,
    /// How often the preferred line was moved.
    pub displacements: usize,
}

/// Iterative search for an obstacle-clear transport centerline.
#[derive(Debug, Clone, Copy)]
pub struct CenterlineSearch<'a> {
    obstacles: &'a ObstacleIndex,
    clearance: f64,
    group_tolerance: f64,
    step_epsilon: f64,
    on_line_tolerance: f64,
    max_iterations: usize,
}

impl<'a> CenterlineSearch<'a> {
    /// Creates a search over the zone's obstacles using the clearance and
    /// tolerances of `params`.
    #[must_use]
    pub fn new(obstacles: &'a ObstacleIndex, params: &RoutingParameters) -> Self {
        let tol = params.tolerances();
        Self {
            obstacles,
            clearance: params.clearance(),
            group_tolerance: tol.closest_group(),
            step_epsilon: tol.displacement_epsilon(),
            on_line_tolerance: tol.closest_group(),
            max_iterations: params.max_centerline_iterations(),
        }
    }

    /// Overrides the clearance.
    #[must_use]
    pub const fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = clearance;
        self
    }

    /// Overrides the displacement budget.
    #[must_use]
    pub const fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Returns the clearance the line must keep.
    #[must_use]
    pub const fn clearance(&self) -> f64 {
        self.clearance
    }

    /// Checks whether `line` keeps its distance from the obstacles closest
    /// to it and those obstacles keep their distance from the valve outlet.
    #[must_use]
    pub fn is_clear(&self, outlet: &Point3<f64>, line: &Line) -> bool {
        self.obstacles
            .closest_group(line, self.group_tolerance)
            .iter()
            .all(|p| line.distance_to(p) >= self.clearance && (outlet - p).norm() >= self.clearance)
    }

    /// Runs the search from `preferred`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NoClearLine`] when the line is still blocked
    /// after the displacement budget is used up.
    pub fn search(&self, outlet: &Point3<f64>, preferred: &Line) -> RoutingResult<Centerline> {
        let mut line = *preferred;
        for displacements in 0..=self.max_iterations {
            if self.is_clear(outlet, &line) {
                debug!(displacements, origin = ?line.origin(), "transport centerline accepted");
                return Ok(Centerline { line, displacements });
            }
            if displacements == self.max_iterations {
                break;
            }
            let step = self.step_direction(outlet, &line) * (self.clearance + self.step_epsilon);
            debug!(iteration = displacements + 1, ?step, "displacing transport centerline");
            line = line.translated(&step);
        }
        Err(RoutingError::NoClearLine {
            iterations: self.max_iterations,
        })
    }

    /// Horizontal unit vector from the outlet towards its foot on the
    /// line's carrier; the line's own normal if the outlet lies on it.
    fn step_direction(&self, outlet: &Point3<f64>, line: &Line) -> Vector3<f64> {
        let away = flatten(&(line.project(outlet) - outlet));
        if away.norm() > self.on_line_tolerance {
            if let Some(unit) = try_normalize(&away) {
                return unit;
            }
        }
        let normal = line.direction().cross(&Vector3::z());
        try_normalize(&normal).unwrap_or_else(Vector3::x)
    }
}
