//! Whole-model validation.
//!
//! The pipeline runs per subgraph: operands, then operations, then the
//! input/output index lists, then (per model) pools and, at HAL 1.3, every
//! referenced subgraph plus the reference-cycle check. The first failure in
//! any stage aborts the whole validation.

use axon_hal::{
    kinds, ExecutionPreference, HalVersion, Memory, Model, Operand, OperandLifetime, Priority,
    Subgraph,
};
use tracing::error;

use crate::operand::validate_operands;
use crate::operation::{validate_operations, OperationValidator};

/// Validate one shared-memory pool description at a HAL version.
pub fn validate_memory(memory: &Memory, version: HalVersion) -> bool {
    let kind = memory.kind.as_str();
    let known_at_version = match kind {
        kinds::ASHMEM | kinds::MMAP_FD => true,
        kinds::HARDWARE_BUFFER_BLOB | kinds::HARDWARE_BUFFER => version >= HalVersion::V1_2,
        _ => false,
    };
    if !known_at_version {
        error!("Unsupported memory type {kind}");
        return false;
    }
    if memory.handle.is_none() {
        error!("Memory of type {kind} is null");
        return false;
    }
    true
}

fn validate_pools(pools: &[Memory], version: HalVersion) -> bool {
    pools.iter().all(|pool| validate_memory(pool, version))
}

fn validate_subgraph_io(
    indexes: &[u32],
    operands: &[Operand],
    lifetime: OperandLifetime,
) -> bool {
    let operand_count = operands.len();
    for &i in indexes {
        if i as usize >= operand_count {
            error!("Model input or output index out of range: {i}/{operand_count}");
            return false;
        }
        let operand = &operands[i as usize];
        if operand.lifetime != lifetime {
            error!(
                "Model input or output has lifetime of {:?} instead of the expected {:?}",
                operand.lifetime, lifetime
            );
            return false;
        }
    }

    let mut sorted = indexes.to_vec();
    sorted.sort_unstable();
    if let Some(window) = sorted.windows(2).find(|w| w[0] == w[1]) {
        error!("Model input or output occurs multiple times: {}", window[0]);
        return false;
    }
    true
}

/// One position in the subgraph-reference graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubgraphRef {
    Main,
    Referenced(usize),
}

fn subgraph<'a>(model: &'a Model, node: SubgraphRef) -> &'a Subgraph {
    match node {
        SubgraphRef::Main => &model.main,
        SubgraphRef::Referenced(i) => &model.referenced[i],
    }
}

fn check_reference_cycles_from(
    model: &Model,
    node: SubgraphRef,
    path: &mut Vec<SubgraphRef>,
) -> bool {
    if path.contains(&node) {
        error!("Model contains a circular subgraph reference");
        return false;
    }
    path.push(node);
    for operand in &subgraph(model, node).operands {
        if operand.lifetime == OperandLifetime::Subgraph {
            let index = operand.location.offset as usize;
            // Bounds-check before recursing; operand validation may not have run.
            if index >= model.referenced.len() {
                error!("Subgraph index out of range: {index} >= {}", model.referenced.len());
                return false;
            }
            if !check_reference_cycles_from(model, SubgraphRef::Referenced(index), path) {
                return false;
            }
        }
    }
    path.pop();
    true
}

/// Whether the subgraph-reference graph rooted at `main` is acyclic.
///
/// Depth-first walk keeping the set of subgraphs on the recursion stack;
/// re-entering one is a cycle. Recursion depth is bounded by the referenced
/// subgraph count.
pub fn check_no_reference_cycles(model: &Model) -> bool {
    let mut path = Vec::new();
    check_reference_cycles_from(model, SubgraphRef::Main, &mut path)
}

fn validate_subgraph(
    subgraph: &Subgraph,
    model: &Model,
    allow_unspecified_rank: bool,
    ops: &dyn OperationValidator,
) -> bool {
    validate_operands(
        &subgraph.operands,
        &model.operand_values,
        &model.pools,
        &model.referenced,
        model.version,
        allow_unspecified_rank,
    ) && validate_operations(
        &subgraph.operations,
        &subgraph.operands,
        &model.referenced,
        model.version,
        ops,
    ) && validate_subgraph_io(
        &subgraph.input_indexes,
        &subgraph.operands,
        OperandLifetime::SubgraphInput,
    ) && validate_subgraph_io(
        &subgraph.output_indexes,
        &subgraph.operands,
        OperandLifetime::SubgraphOutput,
    )
}

/// Validate a model against its declared HAL version.
///
/// Returns `true` iff the model is structurally legal: no partial verdicts,
/// no mutation of the input. Operation signatures are checked through `ops`.
pub fn validate_model(model: &Model, ops: &dyn OperationValidator) -> bool {
    if model.main.operations.is_empty() || model.main.operands.is_empty() {
        error!("Invalid empty model");
        return false;
    }
    if model.version >= HalVersion::V1_3 {
        return validate_subgraph(&model.main, model, true, ops)
            && model
                .referenced
                .iter()
                .all(|subgraph| validate_subgraph(subgraph, model, true, ops))
            && validate_pools(&model.pools, model.version)
            && check_no_reference_cycles(model);
    }
    if !model.referenced.is_empty() {
        error!("Referenced subgraphs require HAL 1.3, model declares {}", model.version);
        return false;
    }
    validate_subgraph(&model.main, model, model.version.allows_unspecified_rank(), ops)
        && validate_pools(&model.pools, model.version)
}

/// Validate a client's execution preference.
pub fn validate_execution_preference(preference: ExecutionPreference) -> bool {
    matches!(
        preference,
        ExecutionPreference::LowPower
            | ExecutionPreference::FastSingleAnswer
            | ExecutionPreference::SustainedSpeed
    )
}

/// Validate a client's execution priority.
pub fn validate_priority(priority: Priority) -> bool {
    matches!(priority, Priority::Low | Priority::Medium | Priority::High)
}
