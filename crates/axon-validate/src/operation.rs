//! Per-operation checks and the operator-library seam.
//!
//! The signature of each operation (arity, operand types, shape coupling) is
//! the operator library's business and is consumed through
//! [`OperationValidator`]. Independently of the library, this module enforces
//! the graph-level rules: outputs must be temporaries or subgraph outputs,
//! each operand is written at most once, and every temporary and subgraph
//! output is written by some operation.

use axon_hal::{HalVersion, Operand, OperandLifetime, OperandType, Operation, OperationType, Subgraph};
use tracing::error;

/// Numeric status codes returned by operation signature checks.
pub mod status {
    /// The operation is well-formed.
    pub const NO_ERROR: i32 = 0;
    /// The operation's operands or attributes are malformed.
    pub const BAD_DATA: i32 = 4;
    /// The signature check itself could not run.
    pub const OP_FAILED: i32 = 5;
}

/// Everything a signature check may inspect about one operation.
///
/// The subgraph helpers let control-flow operations validate the graphs they
/// reference without reaching into the model directly.
pub struct OperationContext<'a> {
    operation_type: OperationType,
    inputs: &'a [u32],
    outputs: &'a [u32],
    operands: &'a [Operand],
    version: HalVersion,
    referenced: &'a [Subgraph],
}

impl<'a> OperationContext<'a> {
    pub(crate) fn new(
        operation: &'a Operation,
        operands: &'a [Operand],
        version: HalVersion,
        referenced: &'a [Subgraph],
    ) -> Self {
        Self {
            operation_type: operation.operation_type,
            inputs: &operation.inputs,
            outputs: &operation.outputs,
            operands,
            version,
            referenced,
        }
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn inputs(&self) -> &[u32] {
        self.inputs
    }

    pub fn outputs(&self) -> &[u32] {
        self.outputs
    }

    pub fn operands(&self) -> &[Operand] {
        self.operands
    }

    /// The HAL version the enclosing model was declared against.
    pub fn version(&self) -> HalVersion {
        self.version
    }

    /// The operand bound to input slot `i`.
    pub fn input_operand(&self, i: usize) -> Option<&Operand> {
        self.operands.get(*self.inputs.get(i)? as usize)
    }

    /// The operand bound to output slot `i`.
    pub fn output_operand(&self, i: usize) -> Option<&Operand> {
        self.operands.get(*self.outputs.get(i)? as usize)
    }

    /// Whether `operand` is a SUBGRAPH operand whose reference is in range.
    pub fn is_valid_subgraph_reference(&self, operand: &Operand) -> bool {
        if operand.operand_type != OperandType::Subgraph {
            error!("Unexpected operand type: {:?}", operand.operand_type);
            return false;
        }
        if operand.location.offset as usize >= self.referenced.len() {
            error!("Invalid subgraph reference");
            return false;
        }
        true
    }

    fn referenced_subgraph(&self, operand: &Operand) -> Option<&Subgraph> {
        self.referenced.get(operand.location.offset as usize)
    }

    /// Number of inputs of the subgraph referenced by `operand`.
    pub fn subgraph_input_count(&self, operand: &Operand) -> Option<usize> {
        Some(self.referenced_subgraph(operand)?.input_indexes.len())
    }

    /// Number of outputs of the subgraph referenced by `operand`.
    pub fn subgraph_output_count(&self, operand: &Operand) -> Option<usize> {
        Some(self.referenced_subgraph(operand)?.output_indexes.len())
    }

    /// The `i`-th input operand of the subgraph referenced by `operand`.
    pub fn subgraph_input_operand(&self, operand: &Operand, i: usize) -> Option<&Operand> {
        let subgraph = self.referenced_subgraph(operand)?;
        subgraph.operand(*subgraph.input_indexes.get(i)?)
    }

    /// The `i`-th output operand of the subgraph referenced by `operand`.
    pub fn subgraph_output_operand(&self, operand: &Operand, i: usize) -> Option<&Operand> {
        let subgraph = self.referenced_subgraph(operand)?;
        subgraph.operand(*subgraph.output_indexes.get(i)?)
    }
}

/// The operator library seam: dispatches one operation to its signature
/// check and reports a numeric status, [`status::NO_ERROR`] on success.
pub trait OperationValidator {
    fn validate_operation(&self, ctx: &OperationContext<'_>) -> i32;
}

/// Validate every operation of a subgraph and the graph-level write rules.
pub(crate) fn validate_operations(
    operations: &[Operation],
    operands: &[Operand],
    referenced: &[Subgraph],
    version: HalVersion,
    ops: &dyn OperationValidator,
) -> bool {
    // Tracks whether some operation writes to each operand, to prove that
    // temporaries and subgraph outputs are produced exactly once.
    let mut written_to = vec![false; operands.len()];
    for operation in operations {
        let ctx = OperationContext::new(operation, operands, version, referenced);
        let error = ops.validate_operation(&ctx);
        if error != status::NO_ERROR {
            error!("Invalid operation {:?} (status {error})", operation.operation_type);
            return false;
        }

        for &i in &operation.outputs {
            let Some(operand) = operands.get(i as usize) else {
                error!("Operation output index {i} out of range ({} operands)", operands.len());
                return false;
            };
            if !matches!(
                operand.lifetime,
                OperandLifetime::TemporaryVariable | OperandLifetime::SubgraphOutput
            ) {
                error!("Writing to an operand with incompatible lifetime {:?}", operand.lifetime);
                return false;
            }
            if written_to[i as usize] {
                error!("Operand {i} written a second time");
                return false;
            }
            written_to[i as usize] = true;
        }
    }
    for (i, operand) in operands.iter().enumerate() {
        if !written_to[i]
            && matches!(
                operand.lifetime,
                OperandLifetime::TemporaryVariable | OperandLifetime::SubgraphOutput
            )
        {
            error!("Operand {i} with lifetime {:?} is not being written to", operand.lifetime);
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_hal::Operand;

    /// Accepts every operation, so only the graph-level rules are in play.
    struct AcceptAll;

    impl OperationValidator for AcceptAll {
        fn validate_operation(&self, _ctx: &OperationContext<'_>) -> i32 {
            status::NO_ERROR
        }
    }

    struct RejectAll;

    impl OperationValidator for RejectAll {
        fn validate_operation(&self, _ctx: &OperationContext<'_>) -> i32 {
            status::BAD_DATA
        }
    }

    fn float_operand(lifetime: OperandLifetime) -> Operand {
        Operand::new(OperandType::TensorFloat32, vec![2], lifetime)
    }

    #[test]
    fn test_graph_level_rules() {
        let operands = vec![
            float_operand(OperandLifetime::SubgraphInput),
            float_operand(OperandLifetime::SubgraphOutput),
        ];
        let operations = vec![Operation::new(OperationType::Relu, vec![0], vec![1])];
        assert!(validate_operations(&operations, &operands, &[], HalVersion::V1_0, &AcceptAll));

        // The operator library's verdict is final.
        assert!(!validate_operations(&operations, &operands, &[], HalVersion::V1_0, &RejectAll));
    }

    #[test]
    fn test_write_to_input_rejected() {
        let operands = vec![
            float_operand(OperandLifetime::SubgraphInput),
            float_operand(OperandLifetime::SubgraphInput),
        ];
        let operations = vec![Operation::new(OperationType::Relu, vec![0], vec![1])];
        assert!(!validate_operations(&operations, &operands, &[], HalVersion::V1_0, &AcceptAll));
    }

    #[test]
    fn test_write_once() {
        let operands = vec![
            float_operand(OperandLifetime::SubgraphInput),
            float_operand(OperandLifetime::SubgraphOutput),
        ];
        let operations = vec![
            Operation::new(OperationType::Relu, vec![0], vec![1]),
            Operation::new(OperationType::Tanh, vec![0], vec![1]),
        ];
        assert!(!validate_operations(&operations, &operands, &[], HalVersion::V1_0, &AcceptAll));
    }

    #[test]
    fn test_unwritten_temporary_rejected() {
        let operands = vec![
            float_operand(OperandLifetime::SubgraphInput),
            float_operand(OperandLifetime::SubgraphOutput),
            float_operand(OperandLifetime::TemporaryVariable),
        ];
        let operations = vec![Operation::new(OperationType::Relu, vec![0], vec![1])];
        assert!(!validate_operations(&operations, &operands, &[], HalVersion::V1_0, &AcceptAll));
    }

    #[test]
    fn test_output_index_out_of_range() {
        let operands = vec![float_operand(OperandLifetime::SubgraphInput)];
        let operations = vec![Operation::new(OperationType::Relu, vec![0], vec![9])];
        assert!(!validate_operations(&operations, &operands, &[], HalVersion::V1_0, &AcceptAll));
    }

    #[test]
    fn test_subgraph_helpers() {
        let mut inner = Subgraph::new();
        inner.operands.push(float_operand(OperandLifetime::SubgraphInput));
        inner.operands.push(float_operand(OperandLifetime::SubgraphOutput));
        inner.input_indexes = vec![0];
        inner.output_indexes = vec![1];
        let referenced = vec![inner];

        let mut reference = Operand::new(OperandType::Subgraph, vec![], OperandLifetime::Subgraph);
        reference.location.offset = 0;
        let operands = vec![reference];
        let operation = Operation::new(OperationType::If, vec![0], vec![]);
        let ctx = OperationContext::new(&operation, &operands, HalVersion::V1_3, &referenced);

        assert!(ctx.is_valid_subgraph_reference(&operands[0]));
        assert_eq!(ctx.subgraph_input_count(&operands[0]), Some(1));
        assert_eq!(ctx.subgraph_output_count(&operands[0]), Some(1));
        assert_eq!(
            ctx.subgraph_input_operand(&operands[0], 0).map(|o| o.lifetime),
            Some(OperandLifetime::SubgraphInput)
        );
        assert_eq!(
            ctx.subgraph_output_operand(&operands[0], 0).map(|o| o.lifetime),
            Some(OperandLifetime::SubgraphOutput)
        );

        // Out-of-range reference.
        let mut dangling = operands[0].clone();
        dangling.location.offset = 3;
        assert!(!ctx.is_valid_subgraph_reference(&dangling));

        // Wrong operand type.
        let plain = float_operand(OperandLifetime::TemporaryVariable);
        assert!(!ctx.is_valid_subgraph_reference(&plain));
    }
}
