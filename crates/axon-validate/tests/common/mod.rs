//! Shared model builders for the validation integration tests.
#![allow(dead_code)] // Not every test binary uses every builder.

use axon_hal::{
    HalVersion, Model, Operand, OperandLifetime, OperandType, Operation, OperationType, Subgraph,
};
use axon_validate::{status, OperationContext, OperationValidator};

/// Operator-library stub that accepts every operation, so tests can exercise
/// the graph-level validation rules in isolation.
pub struct PermissiveOps;

impl OperationValidator for PermissiveOps {
    fn validate_operation(&self, _ctx: &OperationContext<'_>) -> i32 {
        status::NO_ERROR
    }
}

pub fn float_tensor(dimensions: Vec<u32>, lifetime: OperandLifetime) -> Operand {
    Operand::new(OperandType::TensorFloat32, dimensions, lifetime)
}

/// The minimal valid model: two FLOAT32 `[2, 2]` inputs feeding one ADD that
/// produces a `[2, 2]` output. No pools, no inline values.
pub fn minimal_add_model() -> Model {
    let mut model = Model::new(HalVersion::V1_0);
    model.main.operands = vec![
        float_tensor(vec![2, 2], OperandLifetime::SubgraphInput),
        float_tensor(vec![2, 2], OperandLifetime::SubgraphInput),
        float_tensor(vec![2, 2], OperandLifetime::SubgraphOutput),
    ];
    model.main.operations = vec![Operation::new(OperationType::Add, vec![0, 1], vec![2])];
    model.main.input_indexes = vec![0, 1];
    model.main.output_indexes = vec![2];
    model
}

/// A subgraph shaped like the main graph of [`minimal_add_model`], for use as
/// a referenced subgraph in control-flow models.
pub fn add_subgraph() -> Subgraph {
    minimal_add_model().main
}
