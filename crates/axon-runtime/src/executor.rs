//! Per-step execution driver.

use std::sync::Arc;

use axon_hal::{PreparedModel, Request};
use axon_planner::{ExecutionPlan, ExecutionStep, PlanBody};

use crate::builder::ExecutionBuilder;
use crate::Result;

/// Drives one step of a plan.
///
/// The executor shares the plan and the run's bindings by reference and
/// carries the step's prepared model. The caller runs it and, for compound
/// plans, ferries sub-model outputs of earlier steps into this step's
/// sub-model inputs first; [`StepExecutor::inputs_to_ferry`] spells out what
/// must come from where.
pub struct StepExecutor {
    plan: Arc<ExecutionPlan>,
    builder: Arc<ExecutionBuilder>,
    /// `None` for the single step of a simple plan.
    step_index: Option<usize>,
    prepared_model: Arc<dyn PreparedModel>,
}

impl StepExecutor {
    pub(crate) fn for_whole_model(
        plan: Arc<ExecutionPlan>,
        builder: Arc<ExecutionBuilder>,
        prepared_model: Arc<dyn PreparedModel>,
    ) -> Self {
        Self { plan, builder, step_index: None, prepared_model }
    }

    pub(crate) fn for_step(
        plan: Arc<ExecutionPlan>,
        builder: Arc<ExecutionBuilder>,
        step_index: usize,
        prepared_model: Arc<dyn PreparedModel>,
    ) -> Self {
        Self { plan, builder, step_index: Some(step_index), prepared_model }
    }

    /// Index of this step within the plan; `None` when the executor covers a
    /// whole simple plan.
    pub fn step_index(&self) -> Option<usize> {
        self.step_index
    }

    /// Whether this executor runs the whole model as one unit.
    pub fn is_whole_model(&self) -> bool {
        self.step_index.is_none()
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn builder(&self) -> &ExecutionBuilder {
        &self.builder
    }

    pub fn prepared_model(&self) -> &Arc<dyn PreparedModel> {
        &self.prepared_model
    }

    /// The plan step this executor drives, for compound plans.
    pub fn step(&self) -> Option<&ExecutionStep> {
        match (self.plan.body(), self.step_index) {
            (PlanBody::Compound(compound), Some(index)) => compound.steps().get(index),
            _ => None,
        }
    }

    /// The step that defines a cross-step temporary, by main-model index.
    pub fn defining_step_for(&self, from_index: u32) -> Option<usize> {
        match self.plan.body() {
            PlanBody::Compound(compound) => {
                compound.defining_step(from_index).map(|step| step as usize)
            }
            _ => None,
        }
    }

    /// Everything the caller must ferry into this step before running it:
    /// `(main model index, sub-model input index, defining step index)` per
    /// cross-step temporary this step consumes.
    pub fn inputs_to_ferry(&self) -> Vec<(u32, u32, usize)> {
        let Some(step) = self.step() else {
            return Vec::new();
        };
        step.sub_model_inputs()
            .iter()
            .filter_map(|&(from_index, to_index)| {
                self.defining_step_for(from_index)
                    .map(|defining| (from_index, to_index, defining))
            })
            .collect()
    }

    /// Run the step's prepared model against per-step bindings the caller
    /// assembled. For a whole-model executor the run's own request (from
    /// [`StepExecutor::builder`]) is the right argument.
    pub fn execute(&self, request: &Request) -> Result<()> {
        self.prepared_model.execute(request)?;
        Ok(())
    }
}
