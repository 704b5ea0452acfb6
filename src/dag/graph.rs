// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::errors::{Result, SchedulerError};
use crate::types::{Edge, JobId};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: jobs that must finish before this one can start.
    deps: Vec<JobId>,
    /// Direct dependents: jobs that wait on this one.
    dependents: Vec<JobId>,
}

/// Validated, immutable job graph keyed by [`JobId`].
///
/// Built once by [`DagGraph::build`], which rejects duplicate ids, edges
/// that reference unknown jobs, self-dependencies and cycles. After that the
/// adjacency is read-only and may be shared freely between worker threads;
/// the mutable per-run counters live in
/// [`DependencyState`](crate::dag::DependencyState).
#[derive(Debug, Clone)]
pub struct DagGraph {
    /// Job ids in the order they were supplied.
    order: Vec<JobId>,
    /// One valid execution order, as computed during validation.
    topo: Vec<JobId>,
    nodes: HashMap<JobId, DagNode>,
    edge_count: usize,
}

impl DagGraph {
    /// Build and validate the graph for the given jobs and edges.
    pub fn build<'a, I>(job_ids: I, edges: &[Edge]) -> Result<Self>
    where
        I: IntoIterator<Item = &'a JobId>,
    {
        let mut order = Vec::new();
        let mut nodes: HashMap<JobId, DagNode> = HashMap::new();

        for id in job_ids {
            if nodes.insert(id.clone(), DagNode::default()).is_some() {
                return Err(SchedulerError::DuplicateJob(id.clone()));
            }
            order.push(id.clone());
        }

        let mut seen: HashSet<(&JobId, &JobId)> = HashSet::new();
        let mut edge_count = 0;

        for edge in edges {
            for endpoint in [&edge.from, &edge.to] {
                if !nodes.contains_key(endpoint) {
                    return Err(SchedulerError::UnknownJob {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            if edge.from == edge.to {
                return Err(SchedulerError::SelfDependency(edge.from.clone()));
            }
            if !seen.insert((&edge.from, &edge.to)) {
                warn!(from = %edge.from, to = %edge.to, "duplicate edge; ignoring");
                continue;
            }

            if let Some(node) = nodes.get_mut(&edge.to) {
                node.deps.push(edge.from.clone());
            }
            if let Some(node) = nodes.get_mut(&edge.from) {
                node.dependents.push(edge.to.clone());
            }
            edge_count += 1;
        }

        let topo = topological_order(&order, &nodes)?;

        debug!(jobs = order.len(), edges = edge_count, "job graph validated");

        Ok(Self {
            order,
            topo,
            nodes,
            edge_count,
        })
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct precedence edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All job ids, in the order they were supplied.
    pub fn job_ids(&self) -> &[JobId] {
        &self.order
    }

    /// One valid execution order of all jobs.
    pub fn topological_order(&self) -> &[JobId] {
        &self.topo
    }

    /// Immediate dependencies of a job.
    pub fn dependencies_of(&self, id: &str) -> &[JobId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a job.
    pub fn dependents_of(&self, id: &str) -> &[JobId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Initial indegree: how many jobs must finish before `id` may start.
    pub fn indegree_of(&self, id: &str) -> usize {
        self.dependencies_of(id).len()
    }

    /// Jobs with no dependencies, in the order they were supplied.
    pub fn roots(&self) -> Vec<JobId> {
        self.order
            .iter()
            .filter(|id| self.indegree_of(id.as_str()) == 0)
            .cloned()
            .collect()
    }

    /// All transitive dependents of `id` (not including `id` itself).
    pub fn downstream_of(&self, id: &str) -> BTreeSet<JobId> {
        let mut stack: Vec<&JobId> = self.dependents_of(id).iter().collect();
        let mut visited = BTreeSet::new();

        while let Some(name) = stack.pop() {
            if visited.insert(name.clone()) {
                stack.extend(self.dependents_of(name.as_str()));
            }
        }

        visited
    }
}

/// Run a topological sort over the graph, failing on the first cycle found.
///
/// Edge direction: dependency -> dependent.
fn topological_order(order: &[JobId], nodes: &HashMap<JobId, DagNode>) -> Result<Vec<JobId>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in order {
        graph.add_node(id.as_str());
    }

    for id in order {
        if let Some(node) = nodes.get(id) {
            for dependent in &node.dependents {
                graph.add_edge(id.as_str(), dependent.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(sorted) => Ok(sorted.into_iter().map(JobId::from).collect()),
        Err(cycle) => Err(SchedulerError::DagCycle(format!(
            "cycle detected in job DAG involving job '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<JobId> {
        names.iter().map(|n| JobId::from(*n)).collect()
    }

    fn diamond() -> DagGraph {
        let jobs = ids(&["1", "2", "3", "4"]);
        let edges = vec![
            Edge::new("1", "2"),
            Edge::new("1", "3"),
            Edge::new("2", "4"),
            Edge::new("3", "4"),
        ];
        DagGraph::build(&jobs, &edges).unwrap()
    }

    #[test]
    fn diamond_adjacency_and_indegree() {
        let g = diamond();

        assert_eq!(g.len(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.roots(), ids(&["1"]));
        assert_eq!(g.dependents_of("1"), ids(&["2", "3"]).as_slice());
        assert_eq!(g.indegree_of("4"), 2);
        assert_eq!(g.indegree_of("1"), 0);
    }

    #[test]
    fn topological_order_respects_edges() {
        let g = diamond();
        let topo = g.topological_order();
        let pos = |id: &str| topo.iter().position(|j| j.as_str() == id).unwrap();

        assert_eq!(topo.len(), 4);
        assert!(pos("1") < pos("2"));
        assert!(pos("1") < pos("3"));
        assert!(pos("2") < pos("4"));
        assert!(pos("3") < pos("4"));
    }

    #[test]
    fn downstream_is_transitive() {
        let g = diamond();

        let down: Vec<_> = g.downstream_of("1").into_iter().collect();
        assert_eq!(down, ids(&["2", "3", "4"]));
        assert_eq!(g.downstream_of("3").into_iter().collect::<Vec<_>>(), ids(&["4"]));
        assert!(g.downstream_of("4").is_empty());
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let jobs = ids(&["a"]);
        let err = DagGraph::build(&jobs, &[Edge::new("a", "ghost")]).unwrap_err();

        match err {
            SchedulerError::UnknownJob { missing, .. } => assert_eq!(missing.as_str(), "ghost"),
            other => panic!("expected UnknownJob, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_job_is_rejected() {
        let jobs = ids(&["a", "b", "a"]);
        let err = DagGraph::build(&jobs, &[]).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJob(id) if id.as_str() == "a"));
    }

    #[test]
    fn self_edge_is_rejected() {
        let jobs = ids(&["a"]);
        let err = DagGraph::build(&jobs, &[Edge::new("a", "a")]).unwrap_err();
        assert!(matches!(err, SchedulerError::SelfDependency(_)));
    }

    #[test]
    fn cycle_is_rejected() {
        let jobs = ids(&["a", "b", "c"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")];
        let err = DagGraph::build(&jobs, &edges).unwrap_err();

        match err {
            SchedulerError::DagCycle(msg) => assert!(msg.contains("cycle detected")),
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_edges_collapse() {
        let jobs = ids(&["a", "b"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("a", "b")];
        let g = DagGraph::build(&jobs, &edges).unwrap();

        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.indegree_of("b"), 1);
    }

    #[test]
    fn empty_graph_is_valid() {
        let g = DagGraph::build(&Vec::<JobId>::new(), &[]).unwrap();
        assert!(g.is_empty());
        assert!(g.roots().is_empty());
    }
}
