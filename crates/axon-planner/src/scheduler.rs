//! Dependency ordering of a subgraph's operations.

use std::collections::HashMap;

use axon_hal::Subgraph;
use petgraph::graph::DiGraph;
use petgraph::visit::Topo;

use crate::{PlanError, Result};

/// Order a subgraph's operations so every operand is produced before it is
/// consumed.
///
/// Builds a dependency graph with one node per operation and an edge from
/// each producer to each consumer, then walks it topologically. A cyclic
/// value flow cannot be scheduled and is rejected here.
pub fn sort_operations(subgraph: &Subgraph) -> Result<Vec<usize>> {
    let mut graph = DiGraph::<usize, ()>::new();
    let node_indices: Vec<_> =
        (0..subgraph.operations.len()).map(|i| graph.add_node(i)).collect();

    // Map each operand to the operation producing it.
    let mut producers: HashMap<u32, usize> = HashMap::new();
    for (operation_index, operation) in subgraph.operations.iter().enumerate() {
        for &output in &operation.outputs {
            producers.insert(output, operation_index);
        }
    }

    for (consumer_index, operation) in subgraph.operations.iter().enumerate() {
        for &input in &operation.inputs {
            if let Some(&producer_index) = producers.get(&input)
                && producer_index != consumer_index
            {
                graph.add_edge(node_indices[producer_index], node_indices[consumer_index], ());
            }
        }
    }

    let mut topo = Topo::new(&graph);
    let mut sorted = Vec::with_capacity(subgraph.operations.len());
    while let Some(node) = topo.next(&graph) {
        sorted.push(graph[node]);
    }
    if sorted.len() != subgraph.operations.len() {
        return Err(PlanError::CyclicGraph);
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_hal::{Operand, OperandLifetime, OperandType, Operation, OperationType};

    fn tensor(lifetime: OperandLifetime) -> Operand {
        Operand::new(OperandType::TensorFloat32, vec![2], lifetime)
    }

    #[test]
    fn test_chain_order() {
        let mut subgraph = Subgraph::new();
        subgraph.operands = vec![
            tensor(OperandLifetime::SubgraphInput),
            tensor(OperandLifetime::TemporaryVariable),
            tensor(OperandLifetime::TemporaryVariable),
            tensor(OperandLifetime::SubgraphOutput),
        ];
        // Deliberately listed out of dependency order.
        subgraph.operations = vec![
            Operation::new(OperationType::Tanh, vec![2], vec![3]),
            Operation::new(OperationType::Relu, vec![0], vec![1]),
            Operation::new(OperationType::Logistic, vec![1], vec![2]),
        ];

        let order = sort_operations(&subgraph).unwrap();
        let position =
            |op: usize| order.iter().position(|&o| o == op).unwrap();
        assert!(position(1) < position(2));
        assert!(position(2) < position(0));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut subgraph = Subgraph::new();
        subgraph.operands = vec![
            tensor(OperandLifetime::TemporaryVariable),
            tensor(OperandLifetime::TemporaryVariable),
        ];
        subgraph.operations = vec![
            Operation::new(OperationType::Relu, vec![0], vec![1]),
            Operation::new(OperationType::Relu, vec![1], vec![0]),
        ];
        assert!(matches!(sort_operations(&subgraph), Err(PlanError::CyclicGraph)));
    }

    #[test]
    fn test_operand_reused_by_its_own_operation() {
        // An operation consuming what it also produces is not a scheduling
        // cycle between operations.
        let mut subgraph = Subgraph::new();
        subgraph.operands = vec![tensor(OperandLifetime::TemporaryVariable)];
        subgraph.operations = vec![Operation::new(OperationType::Relu, vec![0], vec![0])];
        assert_eq!(sort_operations(&subgraph).unwrap(), vec![0]);
    }
}
