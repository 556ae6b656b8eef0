//! Subgraphs and versioned models.

use crate::memory::Memory;
use crate::operand::Operand;
use crate::operation::Operation;
use crate::version::HalVersion;
use crate::{HalError, Result};

/// A self-contained collection of operands and operations with its own
/// input/output index lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    pub operands: Vec<Operand>,
    pub operations: Vec<Operation>,
    /// Indices of operands with lifetime `SubgraphInput`, in caller order.
    pub input_indexes: Vec<u32>,
    /// Indices of operands with lifetime `SubgraphOutput`, in caller order.
    pub output_indexes: Vec<u32>,
}

impl Subgraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an operand by index.
    pub fn operand(&self, index: u32) -> Option<&Operand> {
        self.operands.get(index as usize)
    }
}

/// A computation graph submitted by a client, tagged with the HAL version it
/// was authored against.
///
/// The structure always has the latest-version shape; the `version` tag gates
/// which types, operations, and features are legal. Models below 1.3 must
/// keep `referenced` empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub version: HalVersion,
    pub main: Subgraph,
    pub referenced: Vec<Subgraph>,
    /// Byte blob holding `ConstantCopy` operand values.
    pub operand_values: Vec<u8>,
    /// Memory pools holding `ConstantReference` operand values.
    pub pools: Vec<Memory>,
    /// Permission to compute FLOAT32 operations with FLOAT16 precision.
    pub relaxed_computation_float32_to_float16: bool,
}

impl Model {
    /// An empty model at the given version.
    pub fn new(version: HalVersion) -> Self {
        Self {
            version,
            main: Subgraph::new(),
            referenced: Vec::new(),
            operand_values: Vec::new(),
            pools: Vec::new(),
            relaxed_computation_float32_to_float16: false,
        }
    }

    /// Re-tag this model at a later HAL version. The structure is unchanged;
    /// only the gating tag moves. Downgrades are rejected.
    pub fn upgraded_to(&self, version: HalVersion) -> Result<Model> {
        if version < self.version {
            return Err(HalError::Downgrade { from: self.version, to: version });
        }
        let mut model = self.clone();
        model.version = version;
        Ok(model)
    }

    /// Look up a referenced subgraph by index.
    pub fn referenced_subgraph(&self, index: u32) -> Option<&Subgraph> {
        self.referenced.get(index as usize)
    }
}
