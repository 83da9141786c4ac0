//! Pipe, system and valve choices made once for a whole generation pass.

/// What the user picked in the generation dialog.
///
/// Every field is optional because the host may hand over an incomplete
/// selection; validation decides which gaps are fatal.
///
/// # Example
///
/// ```
/// use drip_types::SystemSelection;
///
/// let selection = SystemSelection::new()
///     .with_pipe_type("PE 110")
///     .with_systems("Irrigation", "Irrigation")
///     .with_valve_family("Ball valve");
/// assert!(selection.is_complete());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemSelection {
    pipe_type: Option<String>,
    transport_system: Option<String>,
    distribution_system: Option<String>,
    valve_family: Option<String>,
}

impl SystemSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipe type.
    #[must_use]
    pub fn with_pipe_type(mut self, pipe_type: impl Into<String>) -> Self {
        self.pipe_type = Some(pipe_type.into());
        self
    }

    /// Sets the transport and distribution system classifications.
    #[must_use]
    pub fn with_systems(mut self, transport: impl Into<String>, distribution: impl Into<String>) -> Self {
        self.transport_system = Some(transport.into());
        self.distribution_system = Some(distribution.into());
        self
    }

    /// Sets the valve family.
    #[must_use]
    pub fn with_valve_family(mut self, family: impl Into<String>) -> Self {
        self.valve_family = Some(family.into());
        self
    }

    /// Returns the pipe type.
    #[must_use]
    pub fn pipe_type(&self) -> Option<&str> {
        self.pipe_type.as_deref()
    }

    /// Returns the transport system classification.
    #[must_use]
    pub fn transport_system(&self) -> Option<&str> {
        self.transport_system.as_deref()
    }

    /// Returns the distribution system classification.
    #[must_use]
    pub fn distribution_system(&self) -> Option<&str> {
        self.distribution_system.as_deref()
    }

    /// Returns the valve family.
    #[must_use]
    pub fn valve_family(&self) -> Option<&str> {
        self.valve_family.as_deref()
    }

    /// Returns `true` if every choice was made.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.pipe_type.is_some()
            && self.transport_system.is_some()
            && self.distribution_system.is_some()
            && self.valve_family.is_some()
    }
}
