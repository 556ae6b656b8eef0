//! Shared data model for the Axon neural-network hardware abstraction layer.
//!
//! This crate provides the foundational types that the validation, planning,
//! and runtime crates all depend on:
//! - Versioned type registry ([`HalVersion`], [`OperandType`], [`OperationType`])
//! - Graph building blocks ([`Operand`], [`Operation`], [`Subgraph`], [`Model`])
//! - Memory pools and execution requests ([`Memory`], [`MemoryPool`], [`Request`])
//! - The opaque accelerator seam ([`Device`], [`PreparedModel`])

pub mod device;
pub mod memory;
pub mod model;
pub mod operand;
pub mod operation;
pub mod request;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use device::{Device, PreparedModel};
pub use memory::{kinds, Memory, MemoryHandle, MemoryPool};
pub use model::{Model, Subgraph};
pub use operand::{DataLocation, ExtraParams, Operand, OperandLifetime};
pub use operation::{Operation, OperationType, EXTENSION_OPERATION_BASE};
pub use request::{ExecutionPreference, Priority, Request, RequestArgument};
pub use types::{OperandType, EXTENSION_TYPE_BASE};
pub use version::HalVersion;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, HalError>;

/// Error type for data-model and device-seam operations.
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    #[error("cannot downgrade a model from HAL {from} to HAL {to}")]
    Downgrade { from: HalVersion, to: HalVersion },

    #[error("device error: {0}")]
    Device(String),
}
