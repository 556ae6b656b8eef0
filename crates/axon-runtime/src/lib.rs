//! Stepwise execution of planned Axon models.
//!
//! A finished [`ExecutionPlan`](axon_planner::ExecutionPlan) is driven in
//! steps: the caller makes a [`Controller`] for one run, then repeatedly
//! advances it to obtain each step's [`StepExecutor`] until exhaustion. The
//! caller runs each executor and, between steps, ferries the sub-model
//! outputs of earlier steps into the sub-model inputs of later ones.
//!
//! A plan is immutable once finished and may be shared by any number of
//! concurrent controllers; a single controller is never advanced from more
//! than one thread. Dropping a controller cancels the run; there is nothing
//! to tear down beyond releasing its references.

pub mod builder;
pub mod controller;
pub mod executor;

pub use builder::ExecutionBuilder;
pub use controller::Controller;
pub use executor::StepExecutor;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised while driving a plan.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The plan was never finished; there is nothing to execute.
    #[error("plan is not finished")]
    UnfinishedPlan,

    /// The plan has no body.
    #[error("plan is empty")]
    EmptyPlan,

    /// A previous advance failed; the controller cannot continue.
    #[error("controller is in a failed state")]
    BadState,

    /// A step is missing its device-side artifact.
    #[error("step has no prepared model")]
    MissingPreparedModel,

    /// The device rejected an execution.
    #[error(transparent)]
    Hal(#[from] axon_hal::HalError),
}
