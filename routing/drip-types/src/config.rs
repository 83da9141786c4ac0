//! Routing parameters.
//!
//! A [`RoutingParameters`] value is built once per generation request (the
//! host typically restores it from its last-used settings) and passed by
//! reference into every routing call. The core never mutates it.
//!
//! All lengths share one unit. The defaults assume meters.
//!
//! # Example
//!
//! ```
//! use drip_types::RoutingParameters;
//!
//! let params = RoutingParameters::default()
//!     .with_transport_height(-0.4)
//!     .with_distribution_height(0.0)
//!     .with_diameters(0.110, 0.075);
//!
//! assert!(params.validate().is_empty());
//! assert!((params.minimum_segment_length() - 0.33).abs() < 1e-12);
//! ```

use crate::error::{RoutingError, RoutingResult};

/// What to do when a zone contains no obstacle point to anchor the valve on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnchorFallback {
    /// Abort the zone with a fatal "no valve anchor" diagnostic.
    #[default]
    Reject,
    /// Anchor the valve beside the zone center and report it as info.
    ZoneCenter,
}

/// Numeric tolerances of the routing algorithms.
///
/// # Example
///
/// ```
/// use drip_types::Tolerances;
///
/// let tol = Tolerances::default().with_obstacle_margin(0.5);
/// assert!((tol.obstacle_margin() - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    /// Margin added around a zone rectangle when collecting its obstacles.
    obstacle_margin: f64,
    /// Width of the distance buckets used to group anchor candidates.
    anchor_bucket: f64,
    /// Two obstacles are "jointly closest" to a line within this distance.
    closest_group: f64,
    /// Extra distance added to every centerline displacement.
    displacement_epsilon: f64,
    /// Length of a dummy valve connector stub.
    dummy_stub: f64,
    /// Distances below this are zero.
    geometry_epsilon: f64,
}

impl Tolerances {
    /// Creates the default tolerances (meters).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            obstacle_margin: 0.3048,
            anchor_bucket: 0.01,
            closest_group: 0.001,
            displacement_epsilon: 0.0005,
            dummy_stub: 0.2,
            geometry_epsilon: 1e-9,
        }
    }

    /// Sets the obstacle margin.
    #[must_use]
    pub const fn with_obstacle_margin(mut self, margin: f64) -> Self {
        self.obstacle_margin = margin;
        self
    }

    /// Sets the anchor bucket width.
    #[must_use]
    pub const fn with_anchor_bucket(mut self, width: f64) -> Self {
        self.anchor_bucket = width;
        self
    }

    /// Sets the jointly-closest grouping tolerance.
    #[must_use]
    pub const fn with_closest_group(mut self, tolerance: f64) -> Self {
        self.closest_group = tolerance;
        self
    }

    /// Sets the displacement epsilon.
    #[must_use]
    pub const fn with_displacement_epsilon(mut self, epsilon: f64) -> Self {
        self.displacement_epsilon = epsilon;
        self
    }

    /// Sets the dummy connector stub length.
    #[must_use]
    pub const fn with_dummy_stub(mut self, length: f64) -> Self {
        self.dummy_stub = length;
        self
    }

    /// Sets the geometric zero.
    #[must_use]
    pub const fn with_geometry_epsilon(mut self, epsilon: f64) -> Self {
        self.geometry_epsilon = epsilon;
        self
    }

    /// Returns the obstacle margin.
    #[must_use]
    pub const fn obstacle_margin(&self) -> f64 {
        self.obstacle_margin
    }

    /// Returns the anchor bucket width.
    #[must_use]
    pub const fn anchor_bucket(&self) -> f64 {
        self.anchor_bucket
    }

    /// Returns the jointly-closest grouping tolerance.
    #[must_use]
    pub const fn closest_group(&self) -> f64 {
        self.closest_group
    }

    /// Returns the displacement epsilon.
    #[must_use]
    pub const fn displacement_epsilon(&self) -> f64 {
        self.displacement_epsilon
    }

    /// Returns the dummy connector stub length.
    #[must_use]
    pub const fn dummy_stub(&self) -> f64 {
        self.dummy_stub
    }

    /// Returns the geometric zero.
    #[must_use]
    pub const fn geometry_epsilon(&self) -> f64 {
        self.geometry_epsilon
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of one generation request.
///
/// Defaults (meters):
/// - valve 0.5 and pipes 0.5 away from columns
/// - tee 1.0 in front of the back wall
/// - lateral inset (spacing) 1.0
/// - transport line at -0.4, distribution line and valve at 0.0
/// - transport Ø 0.110, distribution Ø 0.075
/// - placeholders converted to real pipes by the host
/// - obstacle-free zones rejected
/// - at most 64 centerline displacements
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingParameters {
    /// Distance between the anchor column and the valve.
    valve_to_column_offset: f64,
    /// Minimum distance between a pipe and a column.
    pipe_to_column_offset: f64,
    /// Distance of the tee from the zone's back wall.
    backwall_offset: f64,
    /// Inset of the lateral from the zone's side walls (half on each side).
    lateral_spacing: f64,
    /// Height of the transport network.
    transport_height: f64,
    /// Height of the distribution lateral.
    distribution_height: f64,
    /// Height at which the valve is placed.
    valve_height: f64,
    /// Diameter of transport pipes.
    transport_diameter: f64,
    /// Diameter of distribution pipes.
    distribution_diameter: f64,
    /// Whether the host converts placeholders into real pipes.
    convert_placeholders: bool,
    /// Behaviour for zones without obstacles.
    anchor_fallback: AnchorFallback,
    /// Budget of the centerline search.
    max_centerline_iterations: usize,
    /// Numeric tolerances.
    tolerances: Tolerances,
}

impl RoutingParameters {
    /// Creates parameters with the default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            valve_to_column_offset: 0.5,
            pipe_to_column_offset: 0.5,
            backwall_offset: 1.0,
            lateral_spacing: 1.0,
            transport_height: -0.4,
            distribution_height: 0.0,
            valve_height: 0.0,
            transport_diameter: 0.110,
            distribution_diameter: 0.075,
            convert_placeholders: true,
            anchor_fallback: AnchorFallback::Reject,
            max_centerline_iterations: 64,
            tolerances: Tolerances::new(),
        }
    }

    /// Sets the valve-to-column offset.
    #[must_use]
    pub const fn with_valve_to_column_offset(mut self, offset: f64) -> Self {
        self.valve_to_column_offset = offset;
        self
    }

    /// Sets the pipe-to-column offset.
    #[must_use]
    pub const fn with_pipe_to_column_offset(mut self, offset: f64) -> Self {
        self.pipe_to_column_offset = offset;
        self
    }

    /// Sets the back-wall offset of the tee.
    #[must_use]
    pub const fn with_backwall_offset(mut self, offset: f64) -> Self {
        self.backwall_offset = offset;
        self
    }

    /// Sets the lateral spacing.
    #[must_use]
    pub const fn with_lateral_spacing(mut self, spacing: f64) -> Self {
        self.lateral_spacing = spacing;
        self
    }

    /// Sets the transport height.
    #[must_use]
    pub const fn with_transport_height(mut self, height: f64) -> Self {
        self.transport_height = height;
        self
    }

    /// Sets the distribution height.
    #[must_use]
    pub const fn with_distribution_height(mut self, height: f64) -> Self {
        self.distribution_height = height;
        self
    }

    /// Sets the valve height.
    #[must_use]
    pub const fn with_valve_height(mut self, height: f64) -> Self {
        self.valve_height = height;
        self
    }

    /// Sets both pipe diameters.
    #[must_use]
    pub const fn with_diameters(mut self, transport: f64, distribution: f64) -> Self {
        self.transport_diameter = transport;
        self.distribution_diameter = distribution;
        self
    }

    /// Sets whether the host should convert placeholders.
    #[must_use]
    pub const fn with_convert_placeholders(mut self, convert: bool) -> Self {
        self.convert_placeholders = convert;
        self
    }

    /// Sets the fallback for zones without obstacles.
    #[must_use]
    pub const fn with_anchor_fallback(mut self, fallback: AnchorFallback) -> Self {
        self.anchor_fallback = fallback;
        self
    }

    /// Sets the centerline search budget.
    #[must_use]
    pub const fn with_max_centerline_iterations(mut self, iterations: usize) -> Self {
        self.max_centerline_iterations = iterations;
        self
    }

    /// Sets the numeric tolerances.
    #[must_use]
    pub const fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Returns the valve-to-column offset.
    #[must_use]
    pub const fn valve_to_column_offset(&self) -> f64 {
        self.valve_to_column_offset
    }

    /// Returns the pipe-to-column offset.
    #[must_use]
    pub const fn pipe_to_column_offset(&self) -> f64 {
        self.pipe_to_column_offset
    }

    /// Returns the back-wall offset.
    #[must_use]
    pub const fn backwall_offset(&self) -> f64 {
        self.backwall_offset
    }

    /// Returns the lateral spacing.
    #[must_use]
    pub const fn lateral_spacing(&self) -> f64 {
        self.lateral_spacing
    }

    /// Returns the transport height.
    #[must_use]
    pub const fn transport_height(&self) -> f64 {
        self.transport_height
    }

    /// Returns the distribution height.
    #[must_use]
    pub const fn distribution_height(&self) -> f64 {
        self.distribution_height
    }

    /// Returns the valve height.
    #[must_use]
    pub const fn valve_height(&self) -> f64 {
        self.valve_height
    }

    /// Returns the transport diameter.
    #[must_use]
    pub const fn transport_diameter(&self) -> f64 {
        self.transport_diameter
    }

    /// Returns the distribution diameter.
    #[must_use]
    pub const fn distribution_diameter(&self) -> f64 {
        self.distribution_diameter
    }

    /// Returns whether the host should convert placeholders.
    #[must_use]
    pub const fn convert_placeholders(&self) -> bool {
        self.convert_placeholders
    }

    /// Returns the anchor fallback.
    #[must_use]
    pub const fn anchor_fallback(&self) -> AnchorFallback {
        self.anchor_fallback
    }

    /// Returns the centerline search budget.
    #[must_use]
    pub const fn max_centerline_iterations(&self) -> usize {
        self.max_centerline_iterations
    }

    /// Returns the numeric tolerances.
    #[must_use]
    pub const fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Shortest pipe that can carry fittings: three times the larger diameter.
    #[must_use]
    pub fn minimum_segment_length(&self) -> f64 {
        3.0 * self.transport_diameter.max(self.distribution_diameter)
    }

    /// Minimum distance the transport line keeps from columns and the valve outlet.
    #[must_use]
    pub fn clearance(&self) -> f64 {
        self.pipe_to_column_offset.max(self.minimum_segment_length())
    }

    /// Validates the parameters and returns any issues.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let lengths = [
            ("valve_to_column_offset", self.valve_to_column_offset),
            ("pipe_to_column_offset", self.pipe_to_column_offset),
            ("backwall_offset", self.backwall_offset),
            ("lateral_spacing", self.lateral_spacing),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                issues.push(format!("{name} must be a non-negative length, got {value}"));
            }
        }

        let heights = [
            ("transport_height", self.transport_height),
            ("distribution_height", self.distribution_height),
            ("valve_height", self.valve_height),
        ];
        for (name, value) in heights {
            if !value.is_finite() {
                issues.push(format!("{name} must be finite, got {value}"));
            }
        }

        let diameters = [
            ("transport_diameter", self.transport_diameter),
            ("distribution_diameter", self.distribution_diameter),
        ];
        for (name, value) in diameters {
            if !value.is_finite() || value <= 0.0 {
                issues.push(format!("{name} must be positive, got {value}"));
            }
        }

        if self.max_centerline_iterations == 0 {
            issues.push("max_centerline_iterations must be at least 1".to_string());
        }

        let tol = &self.tolerances;
        let tolerances = [
            ("obstacle_margin", tol.obstacle_margin),
            ("anchor_bucket", tol.anchor_bucket),
            ("closest_group", tol.closest_group),
            ("displacement_epsilon", tol.displacement_epsilon),
            ("dummy_stub", tol.dummy_stub),
            ("geometry_epsilon", tol.geometry_epsilon),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                issues.push(format!("tolerance {name} must be non-negative, got {value}"));
            }
        }
        if tol.anchor_bucket <= 0.0 {
            issues.push("tolerance anchor_bucket must be positive".to_string());
        }
        if tol.dummy_stub <= 0.0 {
            issues.push("tolerance dummy_stub must be positive".to_string());
        }

        issues
    }

    /// Returns the parameters if they pass [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidConfig`] listing every issue found.
    pub fn validated(self) -> RoutingResult<Self> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(self)
        } else {
            Err(RoutingError::invalid_config(issues.join("; ")))
        }
    }
}

impl Default for RoutingParameters {
    fn default() -> Self {
        Self::new()
    }
}
