//! The execution plan and its simple/compound bodies.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use axon_hal::{Device, Model, PreparedModel};
use tracing::debug;

use crate::step::ExecutionStep;
use crate::{PlanError, Result};

/// Map from main-model operand index to the step that defines it.
///
/// While a plan is being built this records every temporary definition, which
/// is what enforces the exclusive-producer rule. Finishing the plan prunes it
/// down to the temporaries that actually cross a step boundary.
#[derive(Debug, Default)]
pub struct TemporaryDefs {
    defining_step: HashMap<u32, u32>,
}

impl TemporaryDefs {
    /// Record that `step_index` defines main-model operand `from_index`.
    /// A second definition of the same operand is an error.
    pub fn record_def(&mut self, from_index: u32, step_index: u32) -> Result<()> {
        if self.defining_step.insert(from_index, step_index).is_some() {
            return Err(PlanError::DuplicateTemporaryDef(from_index));
        }
        Ok(())
    }

    /// The step that defines `from_index`, if any.
    pub fn defining_step(&self, from_index: u32) -> Option<u32> {
        self.defining_step.get(&from_index).copied()
    }

    pub fn len(&self) -> usize {
        self.defining_step.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defining_step.is_empty()
    }

    fn retain_cross_step(&mut self, crossing: &HashSet<u32>) {
        self.defining_step.retain(|from_index, _| crossing.contains(from_index));
    }
}

/// A whole model handled by a single device.
pub struct SimpleBody {
    device: Arc<dyn Device>,
    model: Model,
    prepared_model: Option<Arc<dyn PreparedModel>>,
}

impl SimpleBody {
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn prepared_model(&self) -> Option<&Arc<dyn PreparedModel>> {
        self.prepared_model.as_ref()
    }

    fn finish(&mut self) -> Result<()> {
        self.prepared_model = Some(self.device.prepare_model(&self.model)?);
        Ok(())
    }
}

/// A model split across several device-assigned steps.
pub struct CompoundBody {
    steps: Vec<ExecutionStep>,
    temporary_to_defining_step: TemporaryDefs,
    sub_model_output_count: usize,
    has_sub_model_output_of_unknown_size: bool,
}

impl CompoundBody {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            temporary_to_defining_step: TemporaryDefs::default(),
            sub_model_output_count: 0,
            has_sub_model_output_of_unknown_size: false,
        }
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    /// The step that defines a cross-step temporary, by main-model index.
    pub fn defining_step(&self, from_index: u32) -> Option<u32> {
        self.temporary_to_defining_step.defining_step(from_index)
    }

    /// Total number of cross-step temporaries across all steps.
    pub fn sub_model_output_count(&self) -> usize {
        self.sub_model_output_count
    }

    /// Whether any step produces a sub-model output of unknown shape.
    pub fn has_sub_model_output_of_unknown_size(&self) -> bool {
        self.has_sub_model_output_of_unknown_size
    }

    /// Tell each defining step which of its temporaries later steps consume.
    fn find_sub_model_outputs(&mut self) -> Result<()> {
        let consumed: Vec<u32> = self
            .steps
            .iter()
            .flat_map(|step| step.sub_model_inputs().iter().map(|&(from_index, _)| from_index))
            .collect();
        for from_index in consumed {
            let defining = self
                .temporary_to_defining_step
                .defining_step(from_index)
                .ok_or(PlanError::MissingTemporaryDef(from_index))?;
            self.steps[defining as usize].record_sub_model_output(from_index)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.find_sub_model_outputs()?;
        let mut has_unknown = false;
        for step in &mut self.steps {
            has_unknown |= step.finish_sub_model()?;
            step.prepare()?;
        }
        self.has_sub_model_output_of_unknown_size = has_unknown;
        self.sub_model_output_count =
            self.steps.iter().map(ExecutionStep::count_sub_model_outputs).sum();

        // Only boundary-crossing temporaries stay in the map.
        let crossing: HashSet<u32> = self
            .steps
            .iter()
            .flat_map(|step| step.sub_model_outputs().iter().map(|&(from_index, _)| from_index))
            .collect();
        self.temporary_to_defining_step.retain_cross_step(&crossing);
        Ok(())
    }
}

/// The three shapes a plan can take.
pub enum PlanBody {
    /// No partitioning decision yet.
    Empty,
    /// One device runs the whole model.
    Simple(SimpleBody),
    /// An ordered sequence of device-assigned steps.
    Compound(CompoundBody),
}

/// How to execute a model across one or more devices.
///
/// A plan is built by the partitioner, then finished, after which it is
/// immutable and may be shared read-only by any number of controllers.
pub struct ExecutionPlan {
    body: PlanBody,
    finished: bool,
}

impl std::fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ExecutionPlan {
    pub fn new() -> Self {
        Self { body: PlanBody::Empty, finished: false }
    }

    pub fn body(&self) -> &PlanBody {
        &self.body
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A simple plan is executable as a single unit.
    pub fn is_simple(&self) -> bool {
        matches!(self.body, PlanBody::Simple(_))
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.body, PlanBody::Compound(_))
    }

    /// Number of executor steps a controller will yield for this plan.
    pub fn step_count(&self) -> usize {
        match &self.body {
            PlanBody::Empty => 0,
            PlanBody::Simple(_) => 1,
            PlanBody::Compound(compound) => compound.steps().len(),
        }
    }

    /// Adopt the single-device shape for the whole model.
    pub fn become_single_step(&mut self, device: Arc<dyn Device>, model: &Model) -> Result<()> {
        if self.finished {
            return Err(PlanError::AlreadyFinished);
        }
        if !matches!(self.body, PlanBody::Empty) {
            return Err(PlanError::NotEmpty);
        }
        debug!(device = device.name(), "plan becomes single-step");
        self.body = PlanBody::Simple(SimpleBody {
            device,
            model: model.clone(),
            prepared_model: None,
        });
        Ok(())
    }

    /// Append a new empty step for `device` and return its index. An empty
    /// plan becomes compound on the first call.
    pub fn create_new_step(&mut self, device: Arc<dyn Device>, from: &Model) -> Result<usize> {
        if self.finished {
            return Err(PlanError::AlreadyFinished);
        }
        if matches!(self.body, PlanBody::Empty) {
            self.body = PlanBody::Compound(CompoundBody::new());
        }
        let PlanBody::Compound(compound) = &mut self.body else {
            return Err(PlanError::NotCompound);
        };
        let step_index = compound.steps.len();
        debug!(step_index, device = device.name(), "plan creates new step");
        compound.steps.push(ExecutionStep::new(step_index as u32, device, from));
        Ok(step_index)
    }

    /// Add one main-model operation to the given step.
    pub fn add_operation(
        &mut self,
        step_index: usize,
        operation_index: usize,
        from: &Model,
    ) -> Result<()> {
        if self.finished {
            return Err(PlanError::AlreadyFinished);
        }
        let PlanBody::Compound(compound) = &mut self.body else {
            return Err(PlanError::NotCompound);
        };
        let CompoundBody { steps, temporary_to_defining_step, .. } = compound;
        let step = steps.get_mut(step_index).ok_or(PlanError::BadStepIndex(step_index))?;
        step.add_operation(operation_index, from, temporary_to_defining_step)
    }

    /// Record that `step_index` defines the main-model temporary
    /// `from_index`. Steps do this through their plan while operations are
    /// added; the same index cannot be recorded twice.
    pub fn record_temporary_def(&mut self, from_index: u32, step_index: u32) -> Result<()> {
        let PlanBody::Compound(compound) = &mut self.body else {
            return Err(PlanError::NotCompound);
        };
        compound.temporary_to_defining_step.record_def(from_index, step_index)
    }

    /// Freeze the plan: resolve cross-step temporaries, finalize every
    /// sub-model, and prepare each on its device.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Err(PlanError::AlreadyFinished);
        }
        match &mut self.body {
            PlanBody::Empty => return Err(PlanError::EmptyModel),
            PlanBody::Simple(simple) => simple.finish()?,
            PlanBody::Compound(compound) => compound.finish()?,
        }
        self.finished = true;
        Ok(())
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            PlanBody::Empty => writeln!(f, "EMPTY plan"),
            PlanBody::Simple(simple) => {
                writeln!(f, "SIMPLE plan on device {}", simple.device.name())
            }
            PlanBody::Compound(compound) => {
                writeln!(f, "COMPOUND plan with {} steps", compound.steps.len())?;
                for step in &compound.steps {
                    writeln!(
                        f,
                        "  step {} on {}: model inputs {:?}, model outputs {:?}, \
                         sub-model inputs {:?}, sub-model outputs {:?}",
                        step.step_index(),
                        step.device().name(),
                        step.model_inputs(),
                        step.model_outputs(),
                        step.sub_model_inputs(),
                        step.sub_model_outputs(),
                    )?;
                }
                Ok(())
            }
        }
    }
}
