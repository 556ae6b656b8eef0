//! Request validation against a previously validated model.

use axon_hal::{HalVersion, MemoryPool, Model, Operand, Request, RequestArgument};
use tracing::error;

use crate::memory::MemoryAccessVerifier;
use crate::model::validate_memory;

fn validate_request_pools(pools: &[MemoryPool], version: HalVersion) -> bool {
    pools.iter().all(|pool| match pool {
        MemoryPool::Shared(memory) => validate_memory(memory, version),
        MemoryPool::Token(token) => {
            if version < HalVersion::V1_3 {
                error!("Token memory pools require HAL 1.3");
                return false;
            }
            if *token <= 0 {
                error!("Invalid memory pool token {token}");
                return false;
            }
            true
        }
    })
}

/// Check one side of a request (inputs or outputs) against the model's
/// corresponding operand index list. `kind` is used only for diagnostics.
fn validate_request_arguments(
    arguments: &[RequestArgument],
    operand_indexes: &[u32],
    operands: &[Operand],
    pool_verifier: &MemoryAccessVerifier,
    allow_unspecified: bool,
    kind: &str,
) -> bool {
    // The request must bind exactly as many arguments as the model declares.
    if arguments.len() != operand_indexes.len() {
        error!(
            "Request specifies {} {kind}s but the model has {}",
            arguments.len(),
            operand_indexes.len()
        );
        return false;
    }
    for (argument_index, argument) in arguments.iter().enumerate() {
        // The model is assumed validated, so the index is in range.
        let operand = &operands[operand_indexes[argument_index] as usize];
        if argument.has_no_value {
            if !argument.location.is_empty() || !argument.dimensions.is_empty() {
                error!("Request {kind} {argument_index} has no value yet has details");
                return false;
            }
            continue;
        }
        if !pool_verifier.validate(&argument.location) {
            return false;
        }
        let rank = argument.dimensions.len();
        if rank == 0 {
            if !allow_unspecified {
                // The model itself must then pin down every dimension.
                for (i, &dim) in operand.dimensions.iter().enumerate() {
                    if dim == 0 {
                        error!(
                            "Model has dimension {i} set to 0 but the request does not specify \
                             the dimension"
                        );
                        return false;
                    }
                }
            }
            continue;
        }
        if rank != operand.dimensions.len() {
            error!(
                "Request {kind} {argument_index} has number of dimensions ({rank}) different \
                 than the model's ({})",
                operand.dimensions.len()
            );
            return false;
        }
        for (i, &dim) in argument.dimensions.iter().enumerate() {
            if dim != operand.dimensions[i] && operand.dimensions[i] != 0 {
                error!(
                    "Request {kind} {argument_index} has dimension {i} of {dim} different than \
                     the model's {}",
                    operand.dimensions[i]
                );
                return false;
            }
            if dim == 0 && !allow_unspecified {
                error!("Request {kind} {argument_index} has dimension {i} of zero");
                return false;
            }
        }
    }
    true
}

/// Validate the argument bindings of a request against a validated model.
///
/// Unspecified output dimensions are allowed from HAL 1.2 on; unspecified
/// inputs are never allowed.
pub fn validate_request(request: &Request, model: &Model) -> bool {
    let pool_verifier = MemoryAccessVerifier::from_pools(&request.pools);
    validate_request_arguments(
        &request.inputs,
        &model.main.input_indexes,
        &model.main.operands,
        &pool_verifier,
        false,
        "input",
    ) && validate_request_arguments(
        &request.outputs,
        &model.main.output_indexes,
        &model.main.operands,
        &pool_verifier,
        model.version.allows_unspecified_output(),
        "output",
    ) && validate_request_pools(&request.pools, model.version)
}
