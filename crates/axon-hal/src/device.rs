//! The accelerator device seam.
//!
//! Device discovery and transport live outside this workspace; the planner
//! and runtime only see these traits. Preparation and execution are opaque
//! synchronous calls whose latency is the caller's concern.

use std::sync::Arc;

use crate::model::Model;
use crate::request::Request;
use crate::Result;

/// One accelerator device capable of preparing and running sub-models.
pub trait Device: Send + Sync {
    /// Human-readable device name, for diagnostics.
    fn name(&self) -> &str;

    /// Compile a (sub-)model into a device-side artifact.
    fn prepare_model(&self, model: &Model) -> Result<Arc<dyn PreparedModel>>;
}

/// Opaque device-side compilation artifact of a sub-model.
pub trait PreparedModel: Send + Sync {
    /// Run the prepared model against one set of request bindings.
    fn execute(&self, request: &Request) -> Result<()>;
}
