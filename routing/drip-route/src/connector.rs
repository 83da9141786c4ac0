//! Valve placement and connector resolution.
//!
//! The router never creates a valve itself. During materialization a
//! [`ValveFitter`] supplied by the host places one at the computed position
//! and reports where its connectors ended up. A connector that faces away
//! from the transport line is useless; it is replaced by a stand-in stub and
//! reported as a warning.

use drip_types::geometry::with_z;
use drip_types::{
    ConnectorPoint, Diagnostic, DiagnosticKind, Diagnostics, RoutingParameters, Severity, ValveAnchor,
    ValvePlacement, ZoneId,
};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// A physical valve connector reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValveConnector {
    /// Connector location.
    pub origin: Point3<f64>,
    /// Outward direction of the connector.
    pub normal: Vector3<f64>,
}

impl ValveConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { origin, normal }
    }

    /// Returns `true` if a pipe coming from `height` can attach.
    ///
    /// The connector must not point away from the horizontal plane at that
    /// height.
    #[must_use]
    pub fn faces_height(&self, height: f64) -> bool {
        self.normal.dot(&Vector3::new(0.0, 0.0, height - self.origin.z)) >= 0.0
    }
}

/// Inlet and outlet of a placed valve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPair {
    /// Source-side connector.
    pub inlet: ValveConnector,
    /// Zone-side connector.
    pub outlet: ValveConnector,
}

/// Host seam that places a valve and reports its connectors.
///
/// `direction` points from the inlet to the outlet. Returning `None` means
/// no valve could be placed; stand-in stubs are used instead.
///
/// Closures implement the trait, which keeps tests short:
///
/// ```
/// use drip_route::connector::{ConnectorPair, ValveConnector, ValveFitter};
/// use nalgebra::{Point3, Vector3};
///
/// let mut fitter = |at: &Point3<f64>, dir: &Vector3<f64>| {
///     Some(ConnectorPair {
///         inlet: ValveConnector::new(at - dir * 0.1, -Vector3::z()),
///         outlet: ValveConnector::new(at + dir * 0.1, -Vector3::z()),
///     })
/// };
/// assert!(fitter.fit(&Point3::origin(), &Vector3::x()).is_some());
/// ```
pub trait ValveFitter {
    /// Places a valve at `position` facing `direction`.
    fn fit(&mut self, position: &Point3<f64>, direction: &Vector3<f64>) -> Option<ConnectorPair>;
}

impl<F> ValveFitter for F
where
    F: FnMut(&Point3<f64>, &Vector3<f64>) -> Option<ConnectorPair>,
{
    fn fit(&mut self, position: &Point3<f64>, direction: &Vector3<f64>) -> Option<ConnectorPair> {
        self(position, direction)
    }
}

/// Fitter that never places a valve; every connector becomes a stub.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubFitter;

impl ValveFitter for StubFitter {
    fn fit(&mut self, _position: &Point3<f64>, _direction: &Vector3<f64>) -> Option<ConnectorPair> {
        None
    }
}

/// Valve insertion point: pulled back from the anchor towards the source by
/// the valve-to-column offset, at valve height.
#[must_use]
pub fn valve_position(anchor: &ValveAnchor, inward: &Vector3<f64>, params: &RoutingParameters) -> Point3<f64> {
    let pulled = anchor.point - inward * params.valve_to_column_offset();
    with_z(&pulled, params.valve_height())
}

/// Resolves the valve connectors for a placement.
///
/// Without fitted connectors both ends are stubs placed one stub length
/// either side of the valve along `inward` (inlet on the `+inward` side).
/// Fitted connectors are checked one by one against the transport height.
pub fn place_valve(
    zone: ZoneId,
    anchor: ValveAnchor,
    inward: Vector3<f64>,
    params: &RoutingParameters,
    fitted: Option<ConnectorPair>,
    diagnostics: &mut Diagnostics,
) -> ValvePlacement {
    let position = valve_position(&anchor, &inward, params);
    let stub = inward * params.tolerances().dummy_stub();
    let inlet_stub = ConnectorPoint::dummy(position + stub);
    let outlet_stub = ConnectorPoint::dummy(position - stub);

    let (inlet, outlet) = match fitted {
        None => (inlet_stub, outlet_stub),
        Some(pair) => {
            let height = params.transport_height();
            let mut check = |connector: &ValveConnector, stub: ConnectorPoint, side: &str| {
                if connector.faces_height(height) {
                    ConnectorPoint::physical(connector.origin)
                } else {
                    diagnostics.push(
                        Diagnostic::unique(
                            DiagnosticKind::ValveConnectorUnusable,
                            Severity::Warning,
                            format!("Pipe cannot be connected to the {side} connector of the valve; a dummy connection is used"),
                        )
                        .with_zone(zone),
                    );
                    stub
                }
            };
            (
                check(&pair.inlet, inlet_stub, "inlet"),
                check(&pair.outlet, outlet_stub, "outlet"),
            )
        }
    };

    debug!(%zone, ?position, inlet_dummy = inlet.dummy, outlet_dummy = outlet.dummy, "placed valve");
    ValvePlacement {
        position,
        inward,
        inlet,
        outlet,
        anchor,
    }
}
