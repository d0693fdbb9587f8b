//! Execution scheduler - orders steps by their dependencies

use crate::core::Step;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Malformed dependency graph. Fatal for the whole run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("unknown dependency: step '{step}' depends on '{dependency}', which does not exist")]
    UnknownDependency { step: String, dependency: String },

    #[error("cycle detected among steps: {}", steps.join(", "))]
    CycleDetected { steps: Vec<String> },

    #[error("duplicate step name: '{0}'")]
    DuplicateStep(String),
}

/// Order steps so each one follows everything it depends on
///
/// Kahn's algorithm. Among steps that become ready together, definition
/// order wins. Returns indices into `steps`.
pub fn topological_order(steps: &[Step]) -> Result<Vec<usize>, TopologyError> {
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        if index_of.insert(step.name.as_str(), index).is_some() {
            return Err(TopologyError::DuplicateStep(step.name.clone()));
        }
    }

    let mut in_degree = vec![0usize; steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];

    for (index, step) in steps.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in &step.depends_on {
            let dep_index = *index_of.get(dep.as_str()).ok_or_else(|| {
                TopologyError::UnknownDependency {
                    step: step.name.clone(),
                    dependency: dep.clone(),
                }
            })?;
            if seen.insert(dep_index) {
                in_degree[index] += 1;
                dependents[dep_index].push(index);
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..steps.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(steps.len());

    while let Some(index) = queue.pop_front() {
        order.push(index);
        // dependents[index] is already in definition order
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() < steps.len() {
        let ordered: HashSet<usize> = order.iter().copied().collect();
        let remaining = (0..steps.len())
            .filter(|i| !ordered.contains(i))
            .map(|i| steps[i].name.clone())
            .collect();
        return Err(TopologyError::CycleDetected { steps: remaining });
    }

    Ok(order)
}

/// Same as [`topological_order`], but yields step names
pub fn execution_order(steps: &[Step]) -> Result<Vec<String>, TopologyError> {
    Ok(topological_order(steps)?
        .into_iter()
        .map(|i| steps[i].name.clone())
        .collect())
}
