//! Execution requests: runtime argument bindings against a validated model.

use crate::memory::MemoryPool;
use crate::operand::DataLocation;

/// One input or output binding of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgument {
    /// The argument is an absent optional value. Location and dimensions must
    /// then be empty.
    pub has_no_value: bool,
    /// Where the argument's data lives among the request's pools.
    pub location: DataLocation,
    /// Dimension overrides for operands the model left unspecified. Empty
    /// means "as declared by the model".
    pub dimensions: Vec<u32>,
}

impl RequestArgument {
    /// An absent optional argument.
    pub fn no_value() -> Self {
        Self { has_no_value: true, ..Self::default() }
    }

    /// An argument bound to a pool location, with dimensions as declared.
    pub fn bound(location: DataLocation) -> Self {
        Self { has_no_value: false, location, dimensions: Vec::new() }
    }
}

/// Runtime bindings for one execution of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub inputs: Vec<RequestArgument>,
    pub outputs: Vec<RequestArgument>,
    pub pools: Vec<MemoryPool>,
}

/// Client hint for the power/latency trade-off of an execution. Validated
/// here, interpreted by the device layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPreference {
    LowPower,
    FastSingleAnswer,
    SustainedSpeed,
}

/// Relative importance of a client's work on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}
