//! Partitioning a model into a finished execution plan.

use std::sync::Arc;

use axon_hal::{Device, Model};
use tracing::debug;

use crate::plan::ExecutionPlan;
use crate::scheduler::sort_operations;
use crate::{PlanError, Result};

/// Partition `model` across `devices` according to a per-operation
/// assignment, producing a finished plan.
///
/// `assignment[i]` names the device (an index into `devices`) that runs main
/// operation `i`. Which device *should* run each operation is the device
/// discovery layer's decision; this function only materializes the split:
/// operations are walked in dependency order and maximal runs on the same
/// device become steps. If a single device covers the whole model the plan
/// degenerates to the simple shape.
pub fn partition_model(
    model: &Model,
    assignment: &[usize],
    devices: &[Arc<dyn Device>],
) -> Result<ExecutionPlan> {
    if model.main.operations.is_empty() {
        return Err(PlanError::EmptyModel);
    }
    if assignment.len() != model.main.operations.len() {
        return Err(PlanError::AssignmentLength {
            expected: model.main.operations.len(),
            actual: assignment.len(),
        });
    }
    if let Some(&bad) = assignment.iter().find(|&&device| device >= devices.len()) {
        return Err(PlanError::BadDeviceIndex(bad));
    }

    let order = sort_operations(&model.main)?;
    let mut plan = ExecutionPlan::new();

    if assignment.iter().all(|&device| device == assignment[0]) {
        debug!(device = devices[assignment[0]].name(), "whole model fits one device");
        plan.become_single_step(devices[assignment[0]].clone(), model)?;
        plan.finish()?;
        return Ok(plan);
    }

    let mut current: Option<(usize, usize)> = None; // (device, step index)
    for &operation_index in &order {
        let device = assignment[operation_index];
        let step_index = match current {
            Some((current_device, step_index)) if current_device == device => step_index,
            _ => {
                let step_index = plan.create_new_step(devices[device].clone(), model)?;
                current = Some((device, step_index));
                step_index
            }
        };
        plan.add_operation(step_index, operation_index, model)?;
    }
    plan.finish()?;
    debug!(steps = plan.step_count(), "partitioned model");
    Ok(plan)
}
