//! Counting mock device and model builders for the runtime tests.
#![allow(dead_code)] // Not every test binary uses every helper.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axon_hal::{
    Device, HalVersion, Model, Operand, OperandLifetime, OperandType, Operation, OperationType,
    PreparedModel, Request,
};

/// Prepared model that counts how often it executes.
pub struct CountingPreparedModel {
    executions: AtomicUsize,
}

impl CountingPreparedModel {
    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

impl PreparedModel for CountingPreparedModel {
    fn execute(&self, _request: &Request) -> axon_hal::Result<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock device that hands out one shared counting artifact for every
/// preparation, so tests can observe executions from the outside.
pub struct MockDevice {
    name: String,
    prepared: Arc<CountingPreparedModel>,
}

impl MockDevice {
    pub fn new(name: &str) -> Arc<dyn Device> {
        Self::with_counter(name).0
    }

    pub fn with_counter(name: &str) -> (Arc<dyn Device>, Arc<CountingPreparedModel>) {
        let prepared = Arc::new(CountingPreparedModel { executions: AtomicUsize::new(0) });
        let device = Arc::new(Self { name: name.to_string(), prepared: prepared.clone() });
        (device, prepared)
    }
}

impl Device for MockDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare_model(&self, _model: &Model) -> axon_hal::Result<Arc<dyn PreparedModel>> {
        Ok(self.prepared.clone())
    }
}

fn float_tensor(lifetime: OperandLifetime) -> Operand {
    Operand::new(OperandType::TensorFloat32, vec![2, 2], lifetime)
}

/// `input -> Relu -> t1 -> Logistic -> t2 -> Tanh -> output`.
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
