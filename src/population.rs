// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Population
//
// The set of graphs making up the world. Owns the per-step break/reform cycle
// and keeps the graphs equal to the connected components of the live bonds:
// disconnected graphs are split, graphs joined by a reforming bond are merged.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EngineError, EngineResult};
use crate::graph::Graph;
use crate::model::BreakProbabilityModel;
use crate::types::{Bond, BondRecord, Node, SharedAttributes};

// ─── Step report ─────────────────────────────────────────────────────────────

/// Counts of what one step did to the population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Live bonds broken and turned into reform candidates.
    pub removed: usize,
    /// Reform candidates promoted inside the graph that drew them.
    pub reformed_in_place: usize,
    /// Reform candidates that spanned two graphs at merge time.
    pub reformed_across: usize,
    /// Graph merges performed (at most `reformed_across`).
    pub merges: usize,
    /// Extra graphs produced by the split pass.
    pub splits: usize,
    /// Graph count after the step.
    pub graph_count: usize,
}

// ─── Population ──────────────────────────────────────────────────────────────

/// Collection of graphs with pairwise disjoint node sets.
#[derive(Debug, Default)]
pub struct Population {
    graphs: Vec<Graph>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing graphs. Fails if any node appears in two of them.
    pub fn from_graphs(graphs: Vec<Graph>) -> EngineResult<Self> {
        let mut seen = BTreeSet::new();
        for node in graphs.iter().flat_map(Graph::nodes) {
            if !seen.insert(node) {
                return Err(EngineError::DuplicateNode { node: node.clone() });
            }
        }
        Ok(Self { graphs })
    }

    /// Load initial bonds in order, then break the loaded structure into one
    /// graph per connected component.
    pub fn from_records(records: &[BondRecord]) -> EngineResult<Self> {
        let mut graph = Graph::new();
        for record in records {
            let src = Node::from(record.source.as_str());
            let dest = Node::from(record.destination.as_str());
            for node in [&src, &dest] {
                if !graph.contains(node) {
                    graph.add_node(node.clone())?;
                }
            }
            graph.add_bond(&src, &dest, SharedAttributes::new(record.attributes()))?;
        }

        let mut population = Self { graphs: vec![graph] };
        population.split_pass()?;
        population.graphs.retain(|g| !g.is_empty());
        Ok(population)
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn node_count(&self) -> usize {
        self.graphs.iter().map(Graph::node_count).sum()
    }

    /// Node count of every graph, in population order.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.graphs.iter().map(Graph::node_count).collect()
    }

    /// Index of the graph owning `node`.
    pub fn graph_of(&self, node: &Node) -> Option<usize> {
        self.graphs.iter().position(|g| g.contains(node))
    }

    /// Union of all node sets.
    pub fn node_universe(&self) -> BTreeSet<Node> {
        self.graphs.iter().flat_map(Graph::nodes).cloned().collect()
    }

    /// Register a reform candidate between two nodes of the population,
    /// writing the entry on the owner of each endpoint. Validates everything
    /// before touching either graph.
    pub fn add_potential_reform_bond(
        &mut self,
        src: &Node,
        dest: &Node,
        attributes: SharedAttributes,
    ) -> EngineResult<()> {
        if src == dest {
            return Err(EngineError::SelfBond { node: src.clone() });
        }
        let src_index = self
            .graph_of(src)
            .ok_or_else(|| EngineError::GraphNotFound { node: src.clone() })?;
        let dest_index = self
            .graph_of(dest)
            .ok_or_else(|| EngineError::GraphNotFound { node: dest.clone() })?;

        if src_index == dest_index {
            return self.graphs[src_index].add_potential_reform_bond(src, dest, attributes);
        }
        if self.graphs[src_index].has_potential_bond(src, dest) || self.graphs[dest_index].has_potential_bond(dest, src) {
            return Err(EngineError::DuplicatePotentialBond { src: src.clone(), dest: dest.clone() });
        }
        self.graphs[src_index].add_ghost_half(src, dest, attributes.clone())?;
        self.graphs[dest_index].add_ghost_half(dest, src, attributes)?;
        Ok(())
    }

    /// Advance the population by one step.
    ///
    /// All random draws for every graph happen before any structure changes,
    /// so the draw order depends only on the population at step start.
    pub fn step<R, M>(&mut self, rng: &mut R, model: &M, update_break_probabilities: bool) -> EngineResult<StepReport>
    where
        R: Rng,
        M: BreakProbabilityModel + ?Sized,
    {
        let mut report = StepReport::default();

        // 1. Draw removal and reform events per graph.
        let mut events = Vec::with_capacity(self.graphs.len());
        for graph in &mut self.graphs {
            if update_break_probabilities {
                graph.refresh_break_probabilities(model);
            }
            let removals = graph.draw_removal_events(rng);
            let reforms = graph.draw_reform_events(rng);
            events.push((removals, reforms));
        }

        // 2. Apply every removal before any reform.
        for (graph, (removals, _)) in self.graphs.iter_mut().zip(&events) {
            for bond in removals {
                let attributes = graph.remove_bond(&bond.source, &bond.destination)?;
                graph.add_potential_reform_bond(&bond.source, &bond.destination, attributes)?;
                report.removed += 1;
            }
        }

        // 3. Promote local reforms, defer the rest.
        let mut deferred = Vec::new();
        for (graph, (_, reforms)) in self.graphs.iter_mut().zip(events) {
            for bond in reforms {
                if graph.contains(&bond.source) && graph.contains(&bond.destination) {
                    promote(graph, &bond)?;
                    report.reformed_in_place += 1;
                } else {
                    deferred.push(bond);
                }
            }
        }

        // 4. Split disconnected graphs.
        report.splits = self.split_pass()?;

        // 5. Merge graphs joined by deferred reforms.
        report.reformed_across = deferred.len();
        report.merges = self.merge_pass(deferred)?;

        report.graph_count = self.graphs.len();
        Ok(report)
    }

    /// Replace every disconnected graph by its connected components.
    /// Returns how many graphs were added.
    fn split_pass(&mut self) -> EngineResult<usize> {
        let before = self.graphs.len();
        let mut pieces = Vec::with_capacity(before);

        for mut graph in self.graphs.drain(..) {
            while !graph.is_fully_connected() {
                let Some(start) = graph.nodes().next().cloned() else { break };
                let component = graph.connected_component_from(&start)?;
                let piece = graph.split_off(&component);
                trace!(size = piece.node_count(), remaining = graph.node_count(), "split off component");
                pieces.push(piece);
            }
            pieces.push(graph);
        }

        self.graphs = pieces;
        Ok(self.graphs.len() - before)
    }

    /// Apply reforms that span graphs, merging their owners first.
    /// Returns how many merges happened.
    fn merge_pass(&mut self, deferred: Vec<Bond>) -> EngineResult<usize> {
        let mut merges = 0;
        for bond in deferred {
            let src_index = self
                .graph_of(&bond.source)
                .ok_or_else(|| EngineError::GraphNotFound { node: bond.source.clone() })?;
            let dest_index = self
                .graph_of(&bond.destination)
                .ok_or_else(|| EngineError::GraphNotFound { node: bond.destination.clone() })?;

            if src_index != dest_index {
                let (high, low) = if src_index > dest_index {
                    (src_index, dest_index)
                } else {
                    (dest_index, src_index)
                };
                let high_graph = self.graphs.remove(high);
                let mut merged = self.graphs.remove(low);
                trace!(
                    left = merged.node_count(),
                    right = high_graph.node_count(),
                    bond = %bond,
                    "merging graphs"
                );
                merged.absorb(high_graph)?;
                self.graphs.push(merged);
                merges += 1;
            }

            let owner = self
                .graph_of(&bond.source)
                .ok_or_else(|| EngineError::GraphNotFound { node: bond.source.clone() })?;
            promote(&mut self.graphs[owner], &bond)?;
        }
        Ok(merges)
    }
}

/// Turn a reform candidate back into a live bond on `graph`, reusing its
/// attributes cell.
fn promote(graph: &mut Graph, bond: &Bond) -> EngineResult<()> {
    graph.add_bond(&bond.source, &bond.destination, bond.attributes.clone())?;
    graph.remove_potential_reform_bond(&bond.source, &bond.destination)?;
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LeavingGroupModel;
    use crate::types::BondAttributes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn n(key: &str) -> Node {
        Node::from(key)
    }

    fn records(bonds: &[(&str, &str, f64, f64)]) -> Vec<BondRecord> {
        bonds.iter().map(|&b| BondRecord::from(b)).collect()
    }

    fn sorted_sizes(population: &Population) -> Vec<usize> {
        let mut sizes = population.cluster_sizes();
        sizes.sort_unstable();
        sizes
    }

    #[test]
    fn test_from_records_builds_one_graph_per_component() {
        let population = Population::from_records(&records(&[
            ("a", "b", 0.5, 0.2),
            ("c", "d", 0.5, 0.2),
            ("d", "e", 0.5, 0.2),
        ]))
        .unwrap();

        assert_eq!(population.graph_count(), 2);
        assert_eq!(sorted_sizes(&population), vec![2, 3]);
        assert!(population.graphs().iter().all(Graph::is_fully_connected));
    }

    #[test]
    fn test_from_records_rejects_duplicate_bond() {
        let err = Population::from_records(&records(&[("a", "b", 0.5, 0.2), ("b", "a", 0.1, 0.1)])).unwrap_err();
        assert_eq!(err, EngineError::DuplicateBond { src: n("b"), dest: n("a") });
    }

    #[test]
    fn test_from_graphs_rejects_overlap() {
        let mut left = Graph::new();
        left.add_node(n("a")).unwrap();
        let mut right = Graph::new();
        right.add_node(n("a")).unwrap();
        assert_eq!(
            Population::from_graphs(vec![left, right]).unwrap_err(),
            EngineError::DuplicateNode { node: n("a") }
        );
    }

    #[test]
    fn test_chain_splits_on_certain_break() {
        let mut population = Population::from_records(&records(&[("A", "B", 0.0, 0.0), ("B", "C", 1.0, 0.0)])).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let report = population
            .step(&mut rng, &LeavingGroupModel::default(), false)
            .unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.splits, 1);
        assert_eq!(report.graph_count, 2);

        let ab = &population.graphs()[population.graph_of(&n("A")).unwrap()];
        let c = &population.graphs()[population.graph_of(&n("C")).unwrap()];
        assert_eq!(ab.node_count(), 2);
        assert!(ab.has_bond(&n("A"), &n("B")));
        assert_eq!(c.node_count(), 1);
        // The broken bond stays behind as a ghost on both sides.
        assert!(ab.has_potential_bond(&n("B"), &n("C")));
        assert!(c.has_potential_bond(&n("C"), &n("B")));
    }

    #[test]
    fn test_cross_graph_reform_merges() {
        let mut left = Graph::new();
        let mut right = Graph::new();
        for key in ["A", "B"] {
            left.add_node(n(key)).unwrap();
        }
        for key in ["C", "D"] {
            right.add_node(n(key)).unwrap();
        }
        left.add_bond(&n("A"), &n("B"), BondAttributes::new(0.0, 0.0).into()).unwrap();
        right.add_bond(&n("C"), &n("D"), BondAttributes::new(0.0, 0.0).into()).unwrap();

        let mut population = Population::from_graphs(vec![left, right]).unwrap();
        population
            .add_potential_reform_bond(&n("A"), &n("C"), BondAttributes::new(0.0, 1.0).into())
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let report = population
            .step(&mut rng, &LeavingGroupModel::default(), false)
            .unwrap();

        assert_eq!(report.reformed_across, 1);
        assert_eq!(report.merges, 1);
        assert_eq!(population.graph_count(), 1);

        let merged = &population.graphs()[0];
        assert_eq!(merged.node_count(), 4);
        assert!(merged.has_bond(&n("A"), &n("C")));
        assert!(!merged.has_potential_bond(&n("A"), &n("C")));
        assert_eq!(merged.potential_bond_count(), 0);
        assert!(merged.is_fully_connected());
    }

    fn two_pairs(left_keys: [&str; 2], right_keys: [&str; 2]) -> Population {
        let mut graphs = Vec::new();
        for [a, b] in [left_keys, right_keys] {
            let mut graph = Graph::new();
            graph.add_node(n(a)).unwrap();
            graph.add_node(n(b)).unwrap();
            graph.add_bond(&n(a), &n(b), BondAttributes::new(0.0, 0.0).into()).unwrap();
            graphs.push(graph);
        }
        Population::from_graphs(graphs).unwrap()
    }

    #[test]
    fn test_cross_graph_candidate_written_on_both_owners() {
        let mut population = two_pairs(["A", "B"], ["C", "D"]);
        let ghost: SharedAttributes = BondAttributes::new(0.0, 0.7).into();
        population.add_potential_reform_bond(&n("C"), &n("A"), ghost.clone()).unwrap();

        let left = &population.graphs()[0];
        let right = &population.graphs()[1];
        assert!(left.ghost_links(&n("A")).unwrap()[0].attributes.same_cell(&ghost));
        assert!(right.ghost_links(&n("C")).unwrap()[0].attributes.same_cell(&ghost));

        assert_eq!(
            population.add_potential_reform_bond(&n("A"), &n("C"), ghost.clone()),
            Err(EngineError::DuplicatePotentialBond { src: n("A"), dest: n("C") })
        );
        assert_eq!(
            population.add_potential_reform_bond(&n("A"), &n("nowhere"), ghost),
            Err(EngineError::GraphNotFound { node: n("nowhere") })
        );
        assert_eq!(population.graphs()[0].ghost_links(&n("A")).unwrap().len(), 1);
    }

    #[test]
    fn test_cross_graph_candidate_reforms_whichever_side_is_smaller() {
        // Smaller endpoint in the first graph, then in the second.
        for (left, right) in [(["A", "B"], ["C", "D"]), (["C", "D"], ["A", "B"])] {
            let mut population = two_pairs(left, right);
            population
                .add_potential_reform_bond(&n("A"), &n("C"), BondAttributes::new(0.0, 1.0).into())
                .unwrap();

            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let report = population
                .step(&mut rng, &LeavingGroupModel::default(), false)
                .unwrap();

            assert_eq!(report.merges, 1);
            assert_eq!(population.cluster_sizes(), vec![4]);
            assert!(population.graphs()[0].has_bond(&n("A"), &n("C")));
            assert_eq!(population.graphs()[0].potential_bond_count(), 0);
        }
    }

    #[test]
    fn test_local_reform_promotes_in_place() {
        let mut population = Population::from_records(&records(&[
            ("a", "b", 0.0, 0.0),
            ("b", "c", 0.0, 0.0),
            ("c", "a", 0.0, 1.0),
        ]))
        .unwrap();
        {
            let graph = &mut population.graphs[0];
            let attributes = graph.remove_bond(&n("c"), &n("a")).unwrap();
            graph.add_potential_reform_bond(&n("c"), &n("a"), attributes).unwrap();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let report = population
            .step(&mut rng, &LeavingGroupModel::default(), false)
            .unwrap();

        assert_eq!(report.reformed_in_place, 1);
        assert_eq!(report.merges, 0);
        let graph = &population.graphs()[0];
        assert!(graph.has_bond(&n("a"), &n("c")));
        assert_eq!(graph.potential_bond_count(), 0);
    }

    #[test]
    fn test_break_and_reform_same_bond_not_in_one_step() {
        // Certain break and certain reform: the bond breaks this step and
        // only becomes a candidate from the next one.
        let mut population = Population::from_records(&records(&[("a", "b", 1.0, 1.0)])).unwrap();
        let model = LeavingGroupModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let first = population.step(&mut rng, &model, false).unwrap();
        assert_eq!(first.removed, 1);
        assert_eq!(first.reformed_across + first.reformed_in_place, 0);
        assert_eq!(sorted_sizes(&population), vec![1, 1]);

        let second = population.step(&mut rng, &model, false).unwrap();
        assert_eq!(second.reformed_across, 1);
        assert_eq!(second.merges, 1);
        assert_eq!(sorted_sizes(&population), vec![2]);
    }

    #[test]
    fn test_merge_pass_reports_missing_owner() {
        let mut population = Population::from_records(&records(&[("a", "b", 0.0, 0.0)])).unwrap();
        let stray = Bond {
            source: n("a"),
            destination: n("zz"),
            attributes: BondAttributes::new(0.0, 1.0).into(),
        };
        assert_eq!(
            population.merge_pass(vec![stray]).unwrap_err(),
            EngineError::GraphNotFound { node: n("zz") }
        );
    }

    #[test]
    fn test_split_pass_handles_many_pieces() {
        let mut graph = Graph::new();
        for key in ["a", "b", "c", "d", "e"] {
            graph.add_node(n(key)).unwrap();
        }
        graph.add_bond(&n("a"), &n("e"), BondAttributes::new(0.5, 0.2).into()).unwrap();

        let mut population = Population::from_graphs(vec![graph]).unwrap();
        assert_eq!(population.split_pass().unwrap(), 3);
        assert_eq!(sorted_sizes(&population), vec![1, 1, 1, 2]);
        assert_eq!(population.node_count(), 5);
    }

    #[test]
    fn test_node_universe_preserved_over_steps() {
        let mut population = Population::from_records(&records(&[
            ("1", "2", 0.5, 0.2),
            ("1", "3", 0.5, 0.2),
            ("2", "4", 0.5, 0.2),
            ("3", "5", 0.5, 0.2),
            ("4", "5", 0.5, 0.2),
            ("5", "6", 0.5, 0.2),
        ]))
        .unwrap();
        let universe = population.node_universe();
        let model = LeavingGroupModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        for _ in 0..50 {
            population.step(&mut rng, &model, true).unwrap();
            assert_eq!(population.node_universe(), universe);
            assert_eq!(population.node_count(), universe.len());
            assert!(population.graphs().iter().all(Graph::is_fully_connected));
        }
    }
}
