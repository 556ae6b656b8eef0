//! Structural validation of Axon models and execution requests.
//!
//! A model is checked exhaustively before any device-side work: operand
//! types, scales, zero points and locations; operation signatures and the
//! write-once and reachability rules of the graph; input/output index lists;
//! memory pools; and, at HAL 1.3, referenced subgraphs and the acyclicity of
//! their reference graph. Requests are later checked against the validated
//! model they execute.
//!
//! Every entry point fails closed with a single boolean verdict. The first
//! error in a scope is emitted to the diagnostic log and the scope aborts;
//! inputs are never mutated. Operation signature checks report numeric
//! operator-library status codes (see [`operation::status`]).

pub mod memory;
pub mod model;
pub mod operation;
pub mod registry;
pub mod request;

mod operand;

pub use memory::MemoryAccessVerifier;
pub use model::{
    check_no_reference_cycles, validate_execution_preference, validate_memory, validate_model,
    validate_priority,
};
pub use operation::{status, OperationContext, OperationValidator};
pub use registry::{OperationSignature, SignatureRegistry};
pub use request::validate_request;
