//! One device-assigned slice of a partitioned model.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use axon_hal::{Device, Model, OperandLifetime, Operation, PreparedModel};

use crate::plan::TemporaryDefs;
use crate::{PlanError, Result};

/// Whether an operand reaches a step as an operation input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Input,
    Output,
}

/// A contiguous run of main-model operations assigned to one device.
///
/// The step owns a freshly built sub-model and four remap tables of
/// `(main model index, sub-model index)` pairs describing how the sub-model's
/// boundary relates to the main model. The step refers to its plan by index
/// only; callers pass the plan's state in explicitly.
pub struct ExecutionStep {
    step_index: u32,
    device: Arc<dyn Device>,
    sub_model: Model,
    prepared_sub_model: Option<Arc<dyn PreparedModel>>,

    /// Inputs of the main model that this step consumes.
    model_inputs: Vec<(u32, u32)>,
    /// Outputs of the main model that this step produces.
    model_outputs: Vec<(u32, u32)>,
    /// Temporaries produced by an earlier step that this step consumes.
    sub_model_inputs: Vec<(u32, u32)>,
    /// Temporaries this step produces that a later step reads.
    sub_model_outputs: BTreeSet<(u32, u32)>,
    /// Converts operand indexes from the main model to the sub-model.
    operand_map: HashMap<u32, u32>,
}

impl ExecutionStep {
    pub(crate) fn new(step_index: u32, device: Arc<dyn Device>, from: &Model) -> Self {
        // The sub-model shares the source model's constant storage so that
        // cloned constant operands keep their locations meaningful.
        let mut sub_model = Model::new(from.version);
        sub_model.operand_values = from.operand_values.clone();
        sub_model.pools = from.pools.clone();
        sub_model.referenced = from.referenced.clone();
        sub_model.relaxed_computation_float32_to_float16 =
            from.relaxed_computation_float32_to_float16;
        Self {
            step_index,
            device,
            sub_model,
            prepared_sub_model: None,
            model_inputs: Vec::new(),
            model_outputs: Vec::new(),
            sub_model_inputs: Vec::new(),
            sub_model_outputs: BTreeSet::new(),
            operand_map: HashMap::new(),
        }
    }

    /// Clone a main-model operand into the sub-model, or return its existing
    /// sub-model index if the step already carries it.
    ///
    /// The clone keeps the operand's type and shape but takes the lifetime
    /// appropriate to its role in this step: constants stay constants, main
    /// model inputs become sub-model inputs, temporaries defined by earlier
    /// steps become sub-model inputs, and temporaries defined here are
    /// recorded with the plan as this step's definitions.
    pub fn add_operand(
        &mut self,
        from_index: u32,
        from: &Model,
        kind: OperandKind,
        temporaries: &mut TemporaryDefs,
    ) -> Result<u32> {
        if let Some(&existing) = self.operand_map.get(&from_index) {
            return Ok(existing);
        }
        let operand =
            from.main.operand(from_index).ok_or(PlanError::BadOperandIndex(from_index))?;
        let to_index = self.sub_model.main.operands.len() as u32;
        let mut cloned = operand.clone();
        match operand.lifetime {
            // Constants and subgraph references carry over unchanged.
            OperandLifetime::ConstantCopy
            | OperandLifetime::ConstantReference
            | OperandLifetime::NoValue
            | OperandLifetime::Subgraph => {}
            OperandLifetime::TemporaryVariable => match kind {
                OperandKind::Input => {
                    // Produced by an earlier step; enters this sub-model at
                    // its boundary.
                    cloned.lifetime = OperandLifetime::SubgraphInput;
                    self.sub_model_inputs.push((from_index, to_index));
                }
                OperandKind::Output => {
                    temporaries.record_def(from_index, self.step_index)?;
                }
            },
            OperandLifetime::SubgraphInput => {
                if kind != OperandKind::Input {
                    return Err(PlanError::ModelInputWritten(from_index));
                }
                self.model_inputs.push((from_index, to_index));
            }
            OperandLifetime::SubgraphOutput => {
                if kind != OperandKind::Output {
                    return Err(PlanError::ModelOutputRead(from_index));
                }
                self.model_outputs.push((from_index, to_index));
            }
        }
        self.sub_model.main.operands.push(cloned);
        self.operand_map.insert(from_index, to_index);
        Ok(to_index)
    }

    /// Append one main-model operation to this step, cloning any operands it
    /// touches and re-indexing it against the sub-model.
    pub fn add_operation(
        &mut self,
        operation_index: usize,
        from: &Model,
        temporaries: &mut TemporaryDefs,
    ) -> Result<()> {
        let operation = from
            .main
            .operations
            .get(operation_index)
            .ok_or(PlanError::BadOperationIndex(operation_index))?;
        let inputs = operation
            .inputs
            .iter()
            .map(|&i| self.add_operand(i, from, OperandKind::Input, temporaries))
            .collect::<Result<Vec<_>>>()?;
        let outputs = operation
            .outputs
            .iter()
            .map(|&i| self.add_operand(i, from, OperandKind::Output, temporaries))
            .collect::<Result<Vec<_>>>()?;
        self.sub_model
            .main
            .operations
            .push(Operation::new(operation.operation_type, inputs, outputs));
        Ok(())
    }

    /// Mark the temporary `from_index` as read by a later step, so the
    /// sub-model must surface it as an output.
    pub(crate) fn record_sub_model_output(&mut self, from_index: u32) -> Result<()> {
        let &to_index = self
            .operand_map
            .get(&from_index)
            .ok_or(PlanError::MissingTemporaryDef(from_index))?;
        self.sub_model_outputs.insert((from_index, to_index));
        Ok(())
    }

    /// Freeze the sub-model's boundary: fill in its input/output index lists
    /// and convert cross-step temporaries into sub-model outputs.
    ///
    /// Returns whether any produced output has an unknown shape.
    pub(crate) fn finish_sub_model(&mut self) -> Result<bool> {
        self.sub_model.main.input_indexes = self
            .model_inputs
            .iter()
            .chain(self.sub_model_inputs.iter())
            .map(|&(_, to_index)| to_index)
            .collect();

        for &(_, to_index) in &self.sub_model_outputs {
            self.sub_model.main.operands[to_index as usize].lifetime =
                OperandLifetime::SubgraphOutput;
        }
        self.sub_model.main.output_indexes = self
            .model_outputs
            .iter()
            .map(|&(_, to_index)| to_index)
            .chain(self.sub_model_outputs.iter().map(|&(_, to_index)| to_index))
            .collect();

        let has_output_of_unknown_size = self
            .sub_model
            .main
            .output_indexes
            .iter()
            .any(|&i| !self.sub_model.main.operands[i as usize].has_fully_specified_dimensions());
        Ok(has_output_of_unknown_size)
    }

    pub(crate) fn prepare(&mut self) -> Result<()> {
        self.prepared_sub_model = Some(self.device.prepare_model(&self.sub_model)?);
        Ok(())
    }

    /// Index of this step within its plan.
    pub fn step_index(&self) -> u32 {
        self.step_index
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn sub_model(&self) -> &Model {
        &self.sub_model
    }

    /// The device-side artifact, available once the plan is finished.
    pub fn prepared_sub_model(&self) -> Option<&Arc<dyn PreparedModel>> {
        self.prepared_sub_model.as_ref()
    }

    /// Main-model inputs consumed by this step, as `(main, sub)` pairs.
    pub fn model_inputs(&self) -> &[(u32, u32)] {
        &self.model_inputs
    }

    /// Main-model outputs produced by this step, as `(main, sub)` pairs.
    pub fn model_outputs(&self) -> &[(u32, u32)] {
        &self.model_outputs
    }

    /// Cross-step temporaries consumed by this step, as `(main, sub)` pairs.
    pub fn sub_model_inputs(&self) -> &[(u32, u32)] {
        &self.sub_model_inputs
    }

    /// Cross-step temporaries produced by this step, as `(main, sub)` pairs.
    pub fn sub_model_outputs(&self) -> &BTreeSet<(u32, u32)> {
        &self.sub_model_outputs
    }

    pub fn count_sub_model_outputs(&self) -> usize {
        self.sub_model_outputs.len()
    }

    /// Sub-model index of a main-model operand, if this step carries it.
    pub fn to_sub_model_index(&self, from_index: u32) -> Option<u32> {
        self.operand_map.get(&from_index).copied()
    }
}

impl fmt::Debug for ExecutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionStep")
            .field("step_index", &self.step_index)
            .field("device", &self.device.name())
            .field("model_inputs", &self.model_inputs)
            .field("model_outputs", &self.model_outputs)
            .field("sub_model_inputs", &self.sub_model_inputs)
            .field("sub_model_outputs", &self.sub_model_outputs)
            .finish_non_exhaustive()
    }
}
