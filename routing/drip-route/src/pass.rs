//! Routing many zones in one generation pass.
//!
//! A pass owns the source lines, the parameters and the user's selection.
//! Each zone is routed independently; one failing zone never stops the
//! others. Findings of every zone are collected into one pass-wide sink so
//! repeated messages show up once.

use drip_types::{
    Diagnostics, MaterializationPlan, Rectangle, RouteResult, RoutingError, RoutingParameters, RoutingResult, Segment,
    SourceId, SourceLine, SystemSelection, ZoneDescriptor, ZoneId,
};
use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::connector::ValveFitter;
use crate::validation::{validate_inputs, validate_selection};
use crate::{compute_for_materialization, compute_preview};

/// One generation pass over a set of zones.
///
/// # Example
///
/// ```
/// use drip_route::GenerationPass;
/// use drip_types::{RoutingParameters, SourceId, SourceLine, ZoneDescriptor, ZoneId};
/// use nalgebra::{Point3, Vector3};
///
/// let params = RoutingParameters::default();
/// let sources = [SourceLine::new(SourceId(1), Point3::new(-6.0, -1.0, 0.0), Vector3::x(), 12.0)];
/// let zones = [ZoneDescriptor::rectangle(ZoneId(1), Point3::new(-5.0, -3.0, 0.0), Point3::new(5.0, 3.0, 0.0))
///     .with_obstacle_points(vec![Point3::new(3.0, 2.0, 0.0)])];
///
/// let outcome = GenerationPass::new(&params, &sources).preview(&zones);
/// assert_eq!(outcome.results().len(), 1);
/// assert!(outcome.failures().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct GenerationPass<'a> {
    params: &'a RoutingParameters,
    sources: &'a [SourceLine],
    assignments: HashMap<ZoneId, SourceId>,
    selection: Option<SystemSelection>,
}

impl<'a> GenerationPass<'a> {
    /// Creates a pass over the given source lines.
    #[must_use]
    pub fn new(params: &'a RoutingParameters, sources: &'a [SourceLine]) -> Self {
        Self {
            params,
            sources,
            assignments: HashMap::new(),
            selection: None,
        }
    }

    /// Feeds `zone` from `source` instead of the closest source line.
    #[must_use]
    pub fn with_assignment(mut self, zone: ZoneId, source: SourceId) -> Self {
        self.assignments.insert(zone, source);
        self
    }

    /// Sets the pipe, system and valve selection checked before
    /// materialization.
    #[must_use]
    pub fn with_selection(mut self, selection: SystemSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Source line feeding `zone`: the assigned one, otherwise the one
    /// closest to the zone center. Ties go to the earlier source.
    #[must_use]
    pub fn source_for(&self, zone: &ZoneDescriptor) -> Option<&'a SourceLine> {
        if let Some(id) = self.assignments.get(&zone.id()) {
            return self.sources.iter().find(|s| s.id() == *id);
        }
        let center = zone.bounding_rectangle()?.center();
        self.sources
            .iter()
            .filter_map(|s| s.line().map(|line| (s, line.distance_to(&center))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(source, _)| source)
    }

    /// Computes previews for every zone.
    ///
    /// Only the parameters are checked up front; missing inputs show up as
    /// per-zone failures.
    #[must_use]
    pub fn preview(&self, zones: &[ZoneDescriptor]) -> PassOutcome {
        let mut outcome = PassOutcome::default();
        self.check_parameters(&mut outcome.diagnostics);
        if outcome.diagnostics.has_fatal() {
            return outcome;
        }
        for zone in zones {
            let routed = self
                .require_source(zone)
                .and_then(|source| compute_preview(zone, source, self.params));
            outcome.record(zone.id(), routed);
        }
        outcome.finish("preview")
    }

    /// Computes every zone for insertion, placing valves through `fitter`.
    ///
    /// Nothing is routed when the inputs or the selection raise a fatal
    /// finding.
    pub fn materialize(&self, zones: &[ZoneDescriptor], fitter: &mut impl ValveFitter) -> PassOutcome {
        let mut outcome = PassOutcome::default();
        self.check_inputs(zones, &mut outcome.diagnostics);
        let selection = self.selection.clone().unwrap_or_default();
        validate_selection(&selection, self.sources, &mut outcome.diagnostics);
        if outcome.diagnostics.has_fatal() {
            warn!(summary = %outcome.diagnostics.summary(), "generation pass refused");
            return outcome;
        }
        for zone in zones {
            let routed = self
                .require_source(zone)
                .and_then(|source| compute_for_materialization(zone, source, self.params, fitter));
            outcome.record(zone.id(), routed);
        }
        outcome.finish("materialize")
    }

    fn check_parameters(&self, diagnostics: &mut Diagnostics) {
        if let Err(error) = self.params.clone().validated() {
            if error.is_fatal_for_pass() {
                diagnostics.push(error.to_diagnostic());
            }
        }
    }

    fn check_inputs(&self, zones: &[ZoneDescriptor], diagnostics: &mut Diagnostics) {
        self.check_parameters(diagnostics);
        validate_inputs(zones, self.sources, self.params.anchor_fallback(), diagnostics);
    }

    fn require_source(&self, zone: &ZoneDescriptor) -> RoutingResult<&'a SourceLine> {
        self.source_for(zone)
            .ok_or_else(|| RoutingError::invalid_input(format!("no source line for {}", zone.id())))
    }
}

/// Everything a pass produced.
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    results: Vec<RouteResult>,
    failures: Vec<(ZoneId, RoutingError)>,
    diagnostics: Diagnostics,
    preview: PreviewBuffer,
    sources: Vec<SourceId>,
}

impl PassOutcome {
    fn record(&mut self, zone: ZoneId, routed: RoutingResult<RouteResult>) {
        match routed {
            Ok(result) => {
                for diagnostic in result.diagnostics() {
                    self.diagnostics.push(diagnostic.clone());
                }
                self.preview.extend_from(&result);
                if !self.sources.contains(&result.source()) {
                    self.sources.push(result.source());
                }
                self.results.push(result);
            }
            Err(error) => {
                self.diagnostics.push(error.to_diagnostic().with_zone(zone));
                self.failures.push((zone, error));
            }
        }
    }

    fn finish(self, mode: &str) -> Self {
        info!(
            mode,
            routed = self.results.len(),
            failed = self.failures.len(),
            summary = %self.diagnostics.summary(),
            "generation pass finished"
        );
        self
    }

    /// Zones that were routed, in input order.
    #[must_use]
    pub fn results(&self) -> &[RouteResult] {
        &self.results
    }

    /// Zones that were abandoned and why.
    #[must_use]
    pub fn failures(&self) -> &[(ZoneId, RoutingError)] {
        &self.failures
    }

    /// Pass-wide findings.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Geometry collected for display.
    #[must_use]
    pub const fn preview(&self) -> &PreviewBuffer {
        &self.preview
    }

    /// Source lines that feed at least one routed zone, in first-use order.
    #[must_use]
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Returns `true` if the pass raised no pass-wide fatal finding and at
    /// least one zone can be inserted. Abandoned zones do not block the rest.
    #[must_use]
    pub fn can_materialize(&self) -> bool {
        let refused = self
            .diagnostics
            .iter()
            .any(|d| d.severity().is_fatal() && d.zone().is_none());
        !refused && self.results.iter().any(|r| !r.preview_only())
    }

    /// Insertion plans for every zone that is not preview only.
    ///
    /// # Errors
    ///
    /// Returns the first error a plan could not be built for.
    pub fn plans(&self) -> RoutingResult<Vec<MaterializationPlan>> {
        self.results
            .iter()
            .filter(|r| !r.preview_only())
            .map(RouteResult::materialization_plan)
            .collect()
    }
}

/// Segment and valve geometry of routed zones, kept for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewBuffer {
    segments: Vec<(ZoneId, Segment)>,
    valves: Vec<(ZoneId, Point3<f64>)>,
}

impl PreviewBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the segments and valve of a routed zone.
    pub fn extend_from(&mut self, result: &RouteResult) {
        let zone = result.zone();
        self.segments.extend(result.segments().map(|s| (zone, *s)));
        self.valves.push((zone, result.valve().position));
        debug!(%zone, segments = self.segments.len(), "preview buffer extended");
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.valves.clear();
    }

    /// Number of buffered segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.valves.is_empty()
    }

    /// Iterates over buffered segments with their zone.
    pub fn segments(&self) -> impl Iterator<Item = &(ZoneId, Segment)> {
        self.segments.iter()
    }

    /// Iterates over valve positions with their zone.
    pub fn valves(&self) -> impl Iterator<Item = &(ZoneId, Point3<f64>)> {
        self.valves.iter()
    }

    /// Segments of one zone.
    pub fn zone_segments(&self, zone: ZoneId) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |(z, _)| *z == zone).map(|(_, s)| s)
    }

    /// Plan bounds of everything buffered.
    #[must_use]
    pub fn bounds(&self) -> Option<Rectangle> {
        let points: Vec<Point3<f64>> = self
            .segments
            .iter()
            .flat_map(|(_, s)| [s.start(), s.end()])
            .chain(self.valves.iter().map(|(_, p)| *p))
            .collect();
        Rectangle::bounding(points.iter())
    }
}
