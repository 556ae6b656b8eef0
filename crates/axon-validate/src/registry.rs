//! Built-in operation signature registry.
//!
//! The real operator kernel library ships its own [`OperationValidator`];
//! this registry is a lightweight stand-in that checks arity, operand types,
//! and subgraph-reference shape for the common operations, so models can be
//! validated without any device-side code present.

use std::collections::HashMap;

use axon_hal::{OperandType, OperationType};

use crate::operation::{status, OperationContext, OperationValidator};

/// Signature check for a single operation type.
pub trait OperationSignature: Send + Sync {
    /// The operation this signature describes.
    fn operation_type(&self) -> OperationType;

    /// Check one concrete operation against this signature.
    fn check(&self, ctx: &OperationContext<'_>) -> i32;
}

/// Registry mapping operation codes to their signature checks.
///
/// Implements [`OperationValidator`], performing the checks every operation
/// needs (operand indices in range, operation known, version gate) before
/// dispatching to the registered signature.
pub struct SignatureRegistry {
    signatures: HashMap<i32, Box<dyn OperationSignature>>,
}

impl SignatureRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self { signatures: HashMap::new() }
    }

    /// Registry pre-populated with the core operation signatures.
    pub fn with_core_ops() -> Self {
        let mut registry = Self::new();

        // Binary elementwise operations with a fused activation input.
        registry.register(BinaryElementwiseSig::new(OperationType::Add));
        registry.register(BinaryElementwiseSig::new(OperationType::Mul));
        registry.register(BinaryElementwiseSig::new(OperationType::Sub));
        registry.register(BinaryElementwiseSig::new(OperationType::Div));

        // Unary operations.
        registry.register(UnarySig::new(OperationType::Relu));
        registry.register(UnarySig::new(OperationType::Relu1));
        registry.register(UnarySig::new(OperationType::Relu6));
        registry.register(UnarySig::new(OperationType::Logistic));
        registry.register(UnarySig::new(OperationType::Tanh));
        registry.register(UnarySig::new(OperationType::Floor));
        registry.register(UnarySig::new(OperationType::Abs));
        registry.register(UnarySig::new(OperationType::Neg));
        registry.register(UnarySig::new(OperationType::Sqrt));
        registry.register(UnarySig::new(OperationType::HardSwish));

        // Type conversion keeps arity but may change element type.
        registry.register(CastSig);

        registry.register(SoftmaxSig);
        registry.register(ReshapeSig);
        registry.register(ConcatenationSig);
        registry.register(PairwiseSig::new(OperationType::Maximum));
        registry.register(PairwiseSig::new(OperationType::Minimum));

        // Control flow over referenced subgraphs.
        registry.register(IfSig);
        registry.register(WhileSig);

        registry
    }

    /// Register a signature, replacing any previous one for the same code.
    pub fn register<S>(&mut self, signature: S) -> &mut Self
    where
        S: OperationSignature + 'static,
    {
        self.signatures.insert(signature.operation_type().code(), Box::new(signature));
        self
    }

    /// Look up the signature for an operation type.
    pub fn get(&self, operation_type: OperationType) -> Option<&dyn OperationSignature> {
        self.signatures.get(&operation_type.code()).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationValidator for SignatureRegistry {
    fn validate_operation(&self, ctx: &OperationContext<'_>) -> i32 {
        let operand_count = ctx.operands().len();
        for &index in ctx.inputs().iter().chain(ctx.outputs()) {
            if index as usize >= operand_count {
                return status::BAD_DATA;
            }
        }
        if ctx.operation_type().min_version() > ctx.version() {
            return status::BAD_DATA;
        }
        match self.get(ctx.operation_type()) {
            Some(signature) => signature.check(ctx),
            None => status::BAD_DATA,
        }
    }
}

fn is_int32_scalar(ctx: &OperationContext<'_>, input: usize) -> bool {
    ctx.input_operand(input)
        .is_some_and(|operand| operand.operand_type == OperandType::Int32)
}

/// `out = op(a, b)` with a trailing fused-activation scalar.
struct BinaryElementwiseSig {
    operation_type: OperationType,
}

impl BinaryElementwiseSig {
    fn new(operation_type: OperationType) -> Self {
        Self { operation_type }
    }
}

impl OperationSignature for BinaryElementwiseSig {
    fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() != 3 || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let (Some(a), Some(b), Some(out)) =
            (ctx.input_operand(0), ctx.input_operand(1), ctx.output_operand(0))
        else {
            return status::BAD_DATA;
        };
        if !a.operand_type.is_tensor()
            || b.operand_type != a.operand_type
            || out.operand_type != a.operand_type
        {
            return status::BAD_DATA;
        }
        if !is_int32_scalar(ctx, 2) {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

/// `out = op(in)` preserving the element type.
struct UnarySig {
    operation_type: OperationType,
}

impl UnarySig {
    fn new(operation_type: OperationType) -> Self {
        Self { operation_type }
    }
}

impl OperationSignature for UnarySig {
    fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() != 1 || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let (Some(input), Some(output)) = (ctx.input_operand(0), ctx.output_operand(0)) else {
            return status::BAD_DATA;
        };
        if !input.operand_type.is_tensor() || output.operand_type != input.operand_type {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

/// `out = cast(in)`: tensor to tensor, element types free.
struct CastSig;

impl OperationSignature for CastSig {
    fn operation_type(&self) -> OperationType {
        OperationType::Cast
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() != 1 || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let (Some(input), Some(output)) = (ctx.input_operand(0), ctx.output_operand(0)) else {
            return status::BAD_DATA;
        };
        if !input.operand_type.is_tensor() || !output.operand_type.is_tensor() {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

struct SoftmaxSig;

impl OperationSignature for SoftmaxSig {
    fn operation_type(&self) -> OperationType {
        OperationType::Softmax
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        // input, beta, and an optional axis.
        if !(2..=3).contains(&ctx.inputs().len()) || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let (Some(input), Some(beta), Some(output)) =
            (ctx.input_operand(0), ctx.input_operand(1), ctx.output_operand(0))
        else {
            return status::BAD_DATA;
        };
        if !input.operand_type.is_tensor() || output.operand_type != input.operand_type {
            return status::BAD_DATA;
        }
        if !matches!(beta.operand_type, OperandType::Float32 | OperandType::Float16) {
            return status::BAD_DATA;
        }
        if ctx.inputs().len() == 3 && !is_int32_scalar(ctx, 2) {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

struct ReshapeSig;

impl OperationSignature for ReshapeSig {
    fn operation_type(&self) -> OperationType {
        OperationType::Reshape
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() != 2 || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let (Some(input), Some(shape), Some(output)) =
            (ctx.input_operand(0), ctx.input_operand(1), ctx.output_operand(0))
        else {
            return status::BAD_DATA;
        };
        if !input.operand_type.is_tensor()
            || shape.operand_type != OperandType::TensorInt32
            || output.operand_type != input.operand_type
        {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

/// `out = concat(t0, .., tn, axis)`.
struct ConcatenationSig;

impl OperationSignature for ConcatenationSig {
    fn operation_type(&self) -> OperationType {
        OperationType::Concatenation
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() < 2 || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let tensor_count = ctx.inputs().len() - 1;
        let Some(first) = ctx.input_operand(0) else {
            return status::BAD_DATA;
        };
        if !first.operand_type.is_tensor() {
            return status::BAD_DATA;
        }
        for i in 1..tensor_count {
            let Some(operand) = ctx.input_operand(i) else {
                return status::BAD_DATA;
            };
            if operand.operand_type != first.operand_type {
                return status::BAD_DATA;
            }
        }
        if !is_int32_scalar(ctx, tensor_count) {
            return status::BAD_DATA;
        }
        let Some(output) = ctx.output_operand(0) else {
            return status::BAD_DATA;
        };
        if output.operand_type != first.operand_type {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

/// `out = op(a, b)` without a fused activation.
struct PairwiseSig {
    operation_type: OperationType,
}

impl PairwiseSig {
    fn new(operation_type: OperationType) -> Self {
        Self { operation_type }
    }
}

impl OperationSignature for PairwiseSig {
    fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() != 2 || ctx.outputs().len() != 1 {
            return status::BAD_DATA;
        }
        let (Some(a), Some(b), Some(out)) =
            (ctx.input_operand(0), ctx.input_operand(1), ctx.output_operand(0))
        else {
            return status::BAD_DATA;
        };
        if !a.operand_type.is_tensor()
            || b.operand_type != a.operand_type
            || out.operand_type != a.operand_type
        {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}

/// `IF(cond, then_graph, else_graph, args..) -> outs..`
struct IfSig;

impl OperationSignature for IfSig {
    fn operation_type(&self) -> OperationType {
        OperationType::If
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() < 3 || ctx.outputs().is_empty() {
            return status::BAD_DATA;
        }
        let Some(condition) = ctx.input_operand(0) else {
            return status::BAD_DATA;
        };
        if condition.operand_type != OperandType::Bool
            && condition.operand_type != OperandType::TensorBool8
        {
            return status::BAD_DATA;
        }
        let branch_input_count = ctx.inputs().len() - 3;
        for slot in [1, 2] {
            let Some(branch) = ctx.input_operand(slot) else {
                return status::BAD_DATA;
            };
            if !ctx.is_valid_subgraph_reference(branch) {
                return status::BAD_DATA;
            }
            if ctx.subgraph_input_count(branch) != Some(branch_input_count)
                || ctx.subgraph_output_count(branch) != Some(ctx.outputs().len())
            {
                return status::BAD_DATA;
            }
        }
        status::NO_ERROR
    }
}

/// `WHILE(cond_graph, body_graph, state..) -> state..`
struct WhileSig;

impl OperationSignature for WhileSig {
    fn operation_type(&self) -> OperationType {
        OperationType::While
    }

    fn check(&self, ctx: &OperationContext<'_>) -> i32 {
        if ctx.inputs().len() < 3 || ctx.outputs().is_empty() {
            return status::BAD_DATA;
        }
        let state_count = ctx.inputs().len() - 2;
        let (Some(condition), Some(body)) = (ctx.input_operand(0), ctx.input_operand(1)) else {
            return status::BAD_DATA;
        };
        for graph in [condition, body] {
            if !ctx.is_valid_subgraph_reference(graph)
                || ctx.subgraph_input_count(graph) != Some(state_count)
            {
                return status::BAD_DATA;
            }
        }
        // The condition produces a single boolean verdict per iteration.
        if ctx.subgraph_output_count(condition) != Some(1) {
            return status::BAD_DATA;
        }
        if ctx.outputs().len() > state_count {
            return status::BAD_DATA;
        }
        status::NO_ERROR
    }
}
