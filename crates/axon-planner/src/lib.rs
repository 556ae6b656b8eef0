//! Execution planning for Axon models.
//!
//! A validated model is partitioned into an ordered sequence of steps, each
//! a freshly built sub-model assigned to one accelerator device. Temporaries
//! flowing between steps are tracked so the runtime can ferry them from the
//! producing step's outputs to the consuming steps' inputs.
//!
//! The usual entry point is [`partition_model`], which consumes a
//! per-operation device assignment and produces a finished [`ExecutionPlan`].
//! Plans degenerate to a single-device "simple" shape whenever one device
//! covers the whole model.

pub mod partition;
pub mod plan;
pub mod scheduler;
pub mod step;

pub use partition::partition_model;
pub use plan::{CompoundBody, ExecutionPlan, PlanBody, SimpleBody, TemporaryDefs};
pub use step::{ExecutionStep, OperandKind};

use axon_hal::HalError;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised while building or finishing an execution plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("cannot plan an empty model")]
    EmptyModel,

    #[error("plan is already finished")]
    AlreadyFinished,

    #[error("plan already has a body")]
    NotEmpty,

    #[error("plan is not compound")]
    NotCompound,

    #[error("step index {0} out of range")]
    BadStepIndex(usize),

    #[error("operation index {0} out of range")]
    BadOperationIndex(usize),

    #[error("operand index {0} out of range")]
    BadOperandIndex(u32),

    #[error("model input operand {0} written by an operation")]
    ModelInputWritten(u32),

    #[error("model output operand {0} consumed as an operation input")]
    ModelOutputRead(u32),

    #[error("temporary operand {0} has no defining step")]
    MissingTemporaryDef(u32),

    #[error("temporary operand {0} defined by more than one step")]
    DuplicateTemporaryDef(u32),

    #[error("device assignment covers {actual} operations, model has {expected}")]
    AssignmentLength { expected: usize, actual: usize },

    #[error("device index {0} out of range")]
    BadDeviceIndex(usize),

    #[error("operation dependency graph contains a cycle")]
    CyclicGraph,

    #[error(transparent)]
    Hal(#[from] HalError),
}
