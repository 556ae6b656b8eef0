//! Mock device and model builders for the planner integration tests.

use std::sync::Arc;

use axon_hal::{
    Device, HalVersion, Model, Operand, OperandLifetime, OperandType, Operation, OperationType,
    PreparedModel, Request,
};

pub struct MockPreparedModel;

impl PreparedModel for MockPreparedModel {
    fn execute(&self, _request: &Request) -> axon_hal::Result<()> {
        Ok(())
    }
}

pub struct MockDevice {
    name: String,
}

impl MockDevice {
    pub fn new(name: &str) -> Arc<dyn Device> {
        Arc::new(Self { name: name.to_string() })
    }
}

impl Device for MockDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare_model(&self, _model: &Model) -> axon_hal::Result<Arc<dyn PreparedModel>> {
        Ok(Arc::new(MockPreparedModel))
    }
}

pub fn float_tensor(lifetime: OperandLifetime) -> Operand {
    Operand::new(OperandType::TensorFloat32, vec![2, 2], lifetime)
}

/// `input -> Relu -> t1 -> Logistic -> t2 -> Tanh -> output`, a three-stage
/// chain with two temporaries.
pub fn chain_model() -> Model {
    let mut model = Model::new(HalVersion::V1_0);
    model.main.operands = vec![
        float_tensor(OperandLifetime::SubgraphInput),
        float_tensor(OperandLifetime::TemporaryVariable),
        float_tensor(OperandLifetime::TemporaryVariable),
        float_tensor(OperandLifetime::SubgraphOutput),
    ];
    model.main.operations = vec![
        Operation::new(OperationType::Relu, vec![0], vec![1]),
        Operation::new(OperationType::Logistic, vec![1], vec![2]),
        Operation::new(OperationType::Tanh, vec![2], vec![3]),
    ];
    model.main.input_indexes = vec![0];
    model.main.output_indexes = vec![3];
    model
}
