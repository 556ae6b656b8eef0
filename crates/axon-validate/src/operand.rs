//! Per-operand structural checks.
//!
//! For each operand the checks run in a fixed order: type validity at the
//! model's HAL version, dimension rank, scale, zero point, extra parameters,
//! lifetime/location, the SUBGRAPH type/lifetime coupling, and declared
//! length for constants. The scope aborts at the first failure.

use axon_hal::{
    ExtraParams, HalVersion, Memory, Operand, OperandLifetime, OperandType, Subgraph,
};
use tracing::error;

use crate::memory::MemoryAccessVerifier;

fn validate_operand_rank(operand: &Operand, index: usize, allow_unspecified_rank: bool) -> bool {
    let rank = operand.rank();
    if operand.operand_type.is_scalar() {
        if rank != 0 {
            error!("Operand {index}: scalar data has dimensions of rank {rank}");
            return false;
        }
        return true;
    }
    if operand.operand_type.is_tensor() {
        let is_constant = matches!(
            operand.lifetime,
            OperandLifetime::ConstantCopy | OperandLifetime::ConstantReference
        );
        if (!allow_unspecified_rank || is_constant) && rank == 0 {
            error!("Operand {index}: tensor has dimensions of rank 0");
            return false;
        }
        return true;
    }
    // Extension types carry no rank constraint.
    true
}

fn validate_operand_scale(operand: &Operand, index: usize) -> bool {
    let ty = operand.operand_type;
    match ty {
        OperandType::Float16
        | OperandType::Float32
        | OperandType::Int32
        | OperandType::Uint32
        | OperandType::Bool
        | OperandType::Subgraph
        | OperandType::TensorFloat16
        | OperandType::TensorFloat32
        | OperandType::TensorBool8
        | OperandType::TensorQuant8SymmPerChannel => {
            if operand.scale != 0.0 {
                error!("Operand {index}: operand of type {ty:?} with a non-zero scale ({})", operand.scale);
                return false;
            }
        }
        OperandType::TensorInt32 => {
            // TENSOR_INT32 may be used with or without scale, depending on the operation.
            if operand.scale < 0.0 {
                error!("Operand {index}: operand of type {ty:?} with a negative scale");
                return false;
            }
        }
        OperandType::TensorQuant8Asymm
        | OperandType::TensorQuant8AsymmSigned
        | OperandType::TensorQuant8Symm
        | OperandType::TensorQuant16Asymm
        | OperandType::TensorQuant16Symm => {
            if operand.scale <= 0.0 {
                error!("Operand {index}: operand of type {ty:?} with a non-positive scale");
                return false;
            }
        }
        OperandType::Extension(_) => {
            if operand.scale != 0.0 {
                error!("Operand {index}: extension operand with a non-zero scale ({})", operand.scale);
                return false;
            }
        }
        // No scale validation for OEM types.
        OperandType::Oem | OperandType::TensorOemByte => {}
    }
    true
}

fn validate_operand_zero_point(operand: &Operand, index: usize) -> bool {
    let ty = operand.operand_type;
    let zero_point = operand.zero_point;
    match ty {
        OperandType::Float16
        | OperandType::Float32
        | OperandType::Int32
        | OperandType::Uint32
        | OperandType::Bool
        | OperandType::Subgraph
        | OperandType::TensorFloat16
        | OperandType::TensorFloat32
        | OperandType::TensorInt32
        | OperandType::TensorBool8
        | OperandType::TensorQuant8Symm
        | OperandType::TensorQuant8SymmPerChannel
        | OperandType::TensorQuant16Symm => {
            if zero_point != 0 {
                error!("Operand {index}: operand of type {ty:?} with a non-zero zero point {zero_point}");
                return false;
            }
        }
        OperandType::TensorQuant8Asymm => {
            if !(0..=255).contains(&zero_point) {
                error!("Operand {index}: zero point {zero_point} outside [0, 255]");
                return false;
            }
        }
        OperandType::TensorQuant8AsymmSigned => {
            if !(-128..=127).contains(&zero_point) {
                error!("Operand {index}: zero point {zero_point} outside [-128, 127]");
                return false;
            }
        }
        OperandType::TensorQuant16Asymm => {
            if !(0..=65535).contains(&zero_point) {
                error!("Operand {index}: zero point {zero_point} outside [0, 65535]");
                return false;
            }
        }
        OperandType::Extension(_) => {
            if zero_point != 0 {
                error!("Operand {index}: extension operand with a non-zero zero point {zero_point}");
                return false;
            }
        }
        // No zero-point validation for OEM types.
        OperandType::Oem | OperandType::TensorOemByte => {}
    }
    true
}

fn validate_operand_extra_params(operand: &Operand, index: usize) -> bool {
    match operand.operand_type {
        OperandType::TensorQuant8SymmPerChannel => {
            let ExtraParams::ChannelQuant { channel_dim, scales } = &operand.extra_params else {
                error!("Operand {index}: per-channel operand without channel quantization params");
                return false;
            };
            let rank = operand.rank() as u32;
            if *channel_dim >= rank {
                error!(
                    "Operand {index}: channel dimension {channel_dim} must be a valid dimension \
                     index in [0, {rank})"
                );
                return false;
            }
            let expected = operand.dimensions[*channel_dim as usize];
            if scales.len() != expected as usize {
                error!(
                    "Operand {index}: wrong-sized channel scales, expected {expected} was {}",
                    scales.len()
                );
                return false;
            }
            if expected == 0 {
                error!("Operand {index}: channel dimension {channel_dim} is underspecified");
                return false;
            }
            for (i, &scale) in scales.iter().enumerate() {
                if scale <= 0.0 {
                    error!("Operand {index}: non-positive value in channel scales[{i}]={scale}");
                    return false;
                }
            }
        }
        OperandType::Extension(_) => {
            // Extension operands may carry extension data or nothing.
            if matches!(operand.extra_params, ExtraParams::ChannelQuant { .. }) {
                error!("Operand {index}: extension operand has channel quantization params");
                return false;
            }
        }
        // No validation for OEM types.
        OperandType::Oem | OperandType::TensorOemByte => {}
        _ => {
            if !matches!(operand.extra_params, ExtraParams::None) {
                error!(
                    "Operand {index}: operand of type {:?} has unexpected extra params",
                    operand.operand_type
                );
                return false;
            }
        }
    }
    true
}

fn validate_operand_location(
    operand: &Operand,
    index: usize,
    operand_values: &[u8],
    pool_verifier: &MemoryAccessVerifier,
    referenced: &[Subgraph],
) -> bool {
    let location = &operand.location;
    match operand.lifetime {
        OperandLifetime::ConstantCopy => {
            if location.pool_index != 0 {
                error!("Operand {index}: CONSTANT_COPY with a non-zero pool index {}", location.pool_index);
                return false;
            }
            // Widen before adding so offset + length cannot wrap.
            if u64::from(location.offset) + u64::from(location.length)
                > operand_values.len() as u64
            {
                error!(
                    "Operand {index}: value location out of range, starts at {} length {} max {}",
                    location.offset,
                    location.length,
                    operand_values.len()
                );
                return false;
            }
        }
        OperandLifetime::ConstantReference => {
            if !pool_verifier.validate(location) {
                return false;
            }
        }
        OperandLifetime::TemporaryVariable
        | OperandLifetime::SubgraphInput
        | OperandLifetime::SubgraphOutput
        | OperandLifetime::NoValue => {
            if !location.is_empty() {
                error!(
                    "Operand {index}: unexpected pool index {}, offset {}, or length {} for \
                     operand of lifetime {:?}",
                    location.pool_index, location.offset, location.length, operand.lifetime
                );
                return false;
            }
        }
        OperandLifetime::Subgraph => {
            if location.pool_index != 0 {
                error!("Operand {index}: SUBGRAPH with a non-zero pool index {}", location.pool_index);
                return false;
            }
            if location.offset as usize >= referenced.len() {
                error!(
                    "Subgraph index out of range: {} >= {}",
                    location.offset,
                    referenced.len()
                );
                return false;
            }
            if location.length != 0 {
                error!("Operand {index}: SUBGRAPH with a non-zero length {}", location.length);
                return false;
            }
        }
    }
    true
}

fn validate_constant_length(operand: &Operand, index: usize) -> bool {
    if !matches!(
        operand.lifetime,
        OperandLifetime::ConstantCopy | OperandLifetime::ConstantReference
    ) {
        return true;
    }
    // OEM and extension payloads have no computable size.
    let Some(expected) = operand.operand_type.size_of_data(&operand.dimensions) else {
        return true;
    };
    if u64::from(operand.location.length) != expected {
        error!(
            "Operand {index}: expected a size of {expected} but got {}",
            operand.location.length
        );
        return false;
    }
    true
}

/// Validate every operand of a subgraph.
///
/// `allow_unspecified_rank` is true for top-level subgraphs at HAL >= 1.2 and
/// for all referenced subgraphs.
pub(crate) fn validate_operands(
    operands: &[Operand],
    operand_values: &[u8],
    pools: &[Memory],
    referenced: &[Subgraph],
    version: HalVersion,
    allow_unspecified_rank: bool,
) -> bool {
    let pool_verifier = MemoryAccessVerifier::from_memories(pools);
    for (index, operand) in operands.iter().enumerate() {
        if !operand.operand_type.is_valid_at(version) {
            error!(
                "Operand {index}: type {:?} is not supported by HAL {version}",
                operand.operand_type
            );
            return false;
        }
        if !validate_operand_rank(operand, index, allow_unspecified_rank)
            || !validate_operand_scale(operand, index)
            || !validate_operand_zero_point(operand, index)
            || !validate_operand_extra_params(operand, index)
            || !validate_operand_location(operand, index, operand_values, &pool_verifier, referenced)
        {
            return false;
        }
        // SUBGRAPH operand type and lifetime always go together.
        if (operand.operand_type == OperandType::Subgraph)
            != (operand.lifetime == OperandLifetime::Subgraph)
        {
            error!(
                "Operand {index}: operand of type {:?} cannot have lifetime {:?}",
                operand.operand_type, operand.lifetime
            );
            return false;
        }
        if !validate_constant_length(operand, index) {
            return false;
        }
    }
    true
}
