//! Partitioning a model end to end.

mod common;

use axon_hal::OperandLifetime;
use axon_planner::{partition_model, ExecutionPlan, PlanBody, PlanError};
use axon_validate::{status, validate_model, OperationContext, OperationValidator};
use common::{chain_model, MockDevice};

struct PermissiveOps;

impl OperationValidator for PermissiveOps {
    fn validate_operation(&self, _ctx: &OperationContext<'_>) -> i32 {
        status::NO_ERROR
    }
}

#[test]
fn single_device_yields_simple_plan() {
    let model = chain_model();
    let device = MockDevice::new("npu0");
    let plan = partition_model(&model, &[0, 0, 0], &[device]).unwrap();

    assert!(plan.is_simple());
    assert!(plan.is_finished());
    assert_eq!(plan.step_count(), 1);

    let PlanBody::Simple(simple) = plan.body() else {
        panic!("expected a simple plan");
    };
    assert_eq!(simple.device().name(), "npu0");
    assert!(simple.prepared_model().is_some());
    assert_eq!(simple.model(), &model);
}

#[test]
fn two_devices_yield_compound_plan() {
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let plan = partition_model(&model, &[0, 1, 1], &devices).unwrap();

    assert!(plan.is_compound());
    assert_eq!(plan.step_count(), 2);

    let PlanBody::Compound(compound) = plan.body() else {
        panic!("expected a compound plan");
    };
    let steps = compound.steps();

    // Step 0 runs Relu on npu0: consumes the model input, defines t1.
    assert_eq!(steps[0].device().name(), "npu0");
    assert_eq!(steps[0].model_inputs(), &[(0, 0)]);
    assert_eq!(steps[0].model_outputs(), &[]);
    assert_eq!(steps[0].sub_model_inputs(), &[]);
    assert!(steps[0].sub_model_outputs().contains(&(1, 1)));
    assert_eq!(steps[0].count_sub_model_outputs(), 1);

    // Step 1 runs Logistic and Tanh on dsp0: consumes t1 across the step
    // boundary, produces the model output.
    assert_eq!(steps[1].device().name(), "dsp0");
    assert_eq!(steps[1].model_inputs(), &[]);
    assert_eq!(steps[1].sub_model_inputs(), &[(1, 0)]);
    assert_eq!(steps[1].model_outputs().len(), 1);
    assert_eq!(steps[1].count_sub_model_outputs(), 0);

    // Exactly one temporary crosses the boundary, defined by step 0.
    assert_eq!(compound.sub_model_output_count(), 1);
    assert_eq!(compound.defining_step(1), Some(0));
    // t2 stays inside step 1 and is pruned from the map.
    assert_eq!(compound.defining_step(2), None);

    assert!(!compound.has_sub_model_output_of_unknown_size());

    // Every step carries a prepared artifact once the plan is finished.
    for step in steps {
        assert!(step.prepared_sub_model().is_some());
    }
}

#[test]
fn sub_models_are_themselves_valid_models() {
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let plan = partition_model(&model, &[0, 1, 1], &devices).unwrap();

    let PlanBody::Compound(compound) = plan.body() else {
        panic!("expected a compound plan");
    };
    for step in compound.steps() {
        assert!(
            validate_model(step.sub_model(), &PermissiveOps),
            "sub-model of step {} fails validation",
            step.step_index()
        );
    }
}

#[test]
fn cross_step_temporary_becomes_sub_model_output() {
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let plan = partition_model(&model, &[0, 1, 1], &devices).unwrap();

    let PlanBody::Compound(compound) = plan.body() else {
        panic!("expected a compound plan");
    };
    let first = compound.steps()[0].sub_model();
    // t1 was cloned as a temporary and converted on finish.
    assert_eq!(first.main.operands[1].lifetime, OperandLifetime::SubgraphOutput);
    assert_eq!(first.main.output_indexes, vec![1]);
    assert_eq!(first.main.input_indexes, vec![0]);

    let second = compound.steps()[1].sub_model();
    // t1 enters the second sub-model at its boundary.
    assert_eq!(second.main.operands[0].lifetime, OperandLifetime::SubgraphInput);
    assert_eq!(second.main.input_indexes, vec![0]);
    assert_eq!(second.main.output_indexes.len(), 1);
}

#[test]
fn alternating_assignment_makes_three_steps() {
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let plan = partition_model(&model, &[0, 1, 0], &devices).unwrap();
    assert_eq!(plan.step_count(), 3);

    let PlanBody::Compound(compound) = plan.body() else {
        panic!("expected a compound plan");
    };
    // Both temporaries now cross step boundaries.
    assert_eq!(compound.sub_model_output_count(), 2);
    assert_eq!(compound.defining_step(1), Some(0));
    assert_eq!(compound.defining_step(2), Some(1));
}

#[test]
fn unknown_output_shape_is_reported() {
    let mut model = chain_model();
    model.main.operands[3].dimensions = vec![2, 0];
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let plan = partition_model(&model, &[0, 1, 1], &devices).unwrap();

    let PlanBody::Compound(compound) = plan.body() else {
        panic!("expected a compound plan");
    };
    assert!(compound.has_sub_model_output_of_unknown_size());
}

#[test]
fn assignment_length_mismatch_is_rejected() {
    let model = chain_model();
    let device = MockDevice::new("npu0");
    let err = partition_model(&model, &[0, 0], &[device]).unwrap_err();
    assert!(matches!(err, PlanError::AssignmentLength { expected: 3, actual: 2 }));
}

#[test]
fn unknown_device_index_is_rejected() {
    let model = chain_model();
    let device = MockDevice::new("npu0");
    let err = partition_model(&model, &[0, 0, 7], &[device]).unwrap_err();
    assert!(matches!(err, PlanError::BadDeviceIndex(7)));
}

#[test]
fn finished_plan_rejects_further_mutation() {
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let mut plan = partition_model(&model, &[0, 1, 1], &devices).unwrap();
    assert!(matches!(plan.finish(), Err(PlanError::AlreadyFinished)));
    assert!(matches!(
        plan.add_operation(0, 0, &model),
        Err(PlanError::AlreadyFinished)
    ));
}

#[test]
fn exclusive_producer_is_enforced() {
    // Two steps both claiming to define main temporary 1.
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let mut plan = ExecutionPlan::new();
    let first = plan.create_new_step(devices[0].clone(), &model).unwrap();
    plan.add_operation(first, 0, &model).unwrap();
    let second = plan.create_new_step(devices[1].clone(), &model).unwrap();
    let err = plan.add_operation(second, 0, &model).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateTemporaryDef(1)));
}

#[test]
fn empty_plan_cannot_finish() {
    let mut plan = ExecutionPlan::new();
    assert!(matches!(plan.finish(), Err(PlanError::EmptyModel)));
}

#[test]
fn plan_dump_names_steps() {
    let model = chain_model();
    let devices = [MockDevice::new("npu0"), MockDevice::new("dsp0")];
    let plan = partition_model(&model, &[0, 1, 1], &devices).unwrap();
    let dump = plan.to_string();
    assert!(dump.contains("COMPOUND plan with 2 steps"));
    assert!(dump.contains("npu0"));
    assert!(dump.contains("dsp0"));
}
