//! Driving a plan one step at a time.

use std::sync::Arc;

use axon_planner::{ExecutionPlan, PlanBody};

use crate::builder::ExecutionBuilder;
use crate::executor::StepExecutor;
use crate::{Result, RuntimeError};

/// Sentinel marking a controller whose previous advance failed.
const BAD_STEP_INDEX: usize = usize::MAX;

/// Iterates the steps of one execution of a plan.
///
/// Usage pattern: make a controller, then call [`Controller::next`] until it
/// yields `None`. Each `Some(executor)` is one step, in plan order; a simple
/// plan yields exactly one executor covering the whole model. Advancing
/// takes `&mut self`, so a single controller cannot be driven from two
/// threads at once; independent runs get independent controllers over the
/// same shared plan.
pub struct Controller {
    plan: Arc<ExecutionPlan>,
    builder: Arc<ExecutionBuilder>,
    next_step_index: usize,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("next_step_index", &self.next_step_index)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Make a controller for one run of `plan` with the given bindings.
    pub fn new(plan: Arc<ExecutionPlan>, builder: ExecutionBuilder) -> Result<Self> {
        if !plan.is_finished() {
            return Err(RuntimeError::UnfinishedPlan);
        }
        if matches!(plan.body(), PlanBody::Empty) {
            return Err(RuntimeError::EmptyPlan);
        }
        Ok(Self { plan, builder: Arc::new(builder), next_step_index: 0 })
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn builder(&self) -> &ExecutionBuilder {
        &self.builder
    }

    /// Index of the step the next call to [`Controller::next`] would yield.
    pub fn next_step_index(&self) -> usize {
        self.next_step_index
    }

    /// Yield the executor for the next step, or `None` after the last one.
    ///
    /// On error the controller is poisoned and every later call fails with
    /// [`RuntimeError::BadState`].
    pub fn next(&mut self) -> Result<Option<StepExecutor>> {
        if self.next_step_index == BAD_STEP_INDEX {
            return Err(RuntimeError::BadState);
        }
        match self.advance() {
            Ok(executor) => Ok(executor),
            Err(error) => {
                self.next_step_index = BAD_STEP_INDEX;
                Err(error)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<StepExecutor>> {
        match self.plan.body() {
            PlanBody::Empty => Err(RuntimeError::EmptyPlan),
            PlanBody::Simple(simple) => {
                if self.next_step_index > 0 {
                    return Ok(None);
                }
                let prepared = simple
                    .prepared_model()
                    .cloned()
                    .ok_or(RuntimeError::MissingPreparedModel)?;
                self.next_step_index = 1;
                Ok(Some(StepExecutor::for_whole_model(
                    self.plan.clone(),
                    self.builder.clone(),
                    prepared,
                )))
            }
            PlanBody::Compound(compound) => {
                let step_index = self.next_step_index;
                let Some(step) = compound.steps().get(step_index) else {
                    return Ok(None);
                };
                let prepared = step
                    .prepared_sub_model()
                    .cloned()
                    .ok_or(RuntimeError::MissingPreparedModel)?;
                self.next_step_index = step_index + 1;
                Ok(Some(StepExecutor::for_step(
                    self.plan.clone(),
                    self.builder.clone(),
                    step_index,
                    prepared,
                )))
            }
        }
    }
}
