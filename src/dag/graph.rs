// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{PipelineError, Result};
use crate::tasks::{Task, TaskName};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must succeed before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Task dependency graph keyed by task name.
///
/// Edges come from two places:
/// - explicit `task_deps`,
/// - implicit file edges: a task that lists another task's target as a file
///   dependency depends on that task.
///
/// Construction rejects duplicate names, targets claimed by two tasks,
/// unknown `task_deps` and cycles.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, DagNode>,
    /// Which task produces each target.
    owners: HashMap<PathBuf, TaskName>,
}

impl TaskGraph {
    pub fn build(tasks: &[Task]) -> Result<Self> {
        let mut nodes: BTreeMap<TaskName, DagNode> = BTreeMap::new();
        let mut owners: HashMap<PathBuf, TaskName> = HashMap::new();

        for task in tasks {
            if nodes.insert(task.name.clone(), DagNode::default()).is_some() {
                return Err(PipelineError::DuplicateTask(task.name.clone()));
            }
            for target in &task.targets {
                if let Some(first) = owners.get(target) {
                    if first != &task.name {
                        return Err(PipelineError::DuplicateTarget {
                            target: target.clone(),
                            first: first.clone(),
                            second: task.name.clone(),
                        });
                    }
                }
                owners.insert(target.clone(), task.name.clone());
            }
        }

        for task in tasks {
            let mut deps: Vec<TaskName> = Vec::new();
            let mut seen: HashSet<&str> = HashSet::new();

            for dep in &task.task_deps {
                if !nodes.contains_key(dep) {
                    return Err(PipelineError::TaskNotFound(format!(
                        "'{}' (listed as task dependency of '{}')",
                        dep, task.name
                    )));
                }
                if seen.insert(dep.as_str()) {
                    deps.push(dep.clone());
                }
            }

            for file in &task.file_deps {
                if let Some(owner) = owners.get(file) {
                    if owner != &task.name && seen.insert(owner.as_str()) {
                        deps.push(owner.clone());
                    }
                }
            }

            if let Some(node) = nodes.get_mut(&task.name) {
                node.deps = deps;
            }
        }

        // Second pass: populate dependents based on deps.
        let edges: Vec<(TaskName, TaskName)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |d| (d.clone(), name.clone())))
            .collect();
        for (dep, name) in edges {
            if let Some(dep_node) = nodes.get_mut(&dep) {
                dep_node.dependents.push(name);
            }
        }

        let graph = Self { nodes, owners };
        graph.topological_order()?;
        Ok(graph)
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// The task that declares `path` as a target, if any.
    pub fn owner_of(&self, path: &std::path::Path) -> Option<&str> {
        self.owners.get(path).map(|s| s.as_str())
    }

    /// Task names with every task after all of its dependencies.
    pub fn topological_order(&self) -> Result<Vec<TaskName>> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        // A topological sort will fail if there is a cycle.
        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|s| s.to_string()).collect()),
            Err(cycle) => {
                let node = cycle.node_id();
                Err(PipelineError::DagCycle(format!(
                    "cycle detected in task graph involving task '{}'",
                    node
                )))
            }
        }
    }
}
