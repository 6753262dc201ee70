// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Graph
//
// One intended-connected group of clusters. Holds live bonds and the ghosts of
// broken bonds that may reform. A graph can become disconnected after bonds
// are removed; detecting and repairing that is the population's job.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::Rng;

use crate::error::{EngineError, EngineResult};
use crate::model::BreakProbabilityModel;
use crate::types::{Bond, GhostLink, LiveLink, Node, SharedAttributes};

// ─── Graph ───────────────────────────────────────────────────────────────────

/// Weighted cluster graph.
///
/// Both link tables are keyed by exactly the node set and kept symmetric: if
/// `b` appears among `a`'s links then `a` appears among `b`'s, and the two
/// entries share one attributes cell. Ghost links are the exception at graph
/// boundaries: a ghost whose other endpoint lives in a different graph is
/// stored only on this graph's side.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: BTreeSet<Node>,
    adjacency: BTreeMap<Node, Vec<LiveLink>>,
    potential_reform: BTreeMap<Node, Vec<GhostLink>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Number of live undirected bonds.
    pub fn bond_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Number of ghost entries held on this graph's side, counting each
    /// unordered pair once when both endpoints are local.
    pub fn potential_bond_count(&self) -> usize {
        self.potential_reform
            .iter()
            .flat_map(|(node, ghosts)| ghosts.iter().map(move |g| (node, &g.neighbor)))
            .filter(|(node, neighbor)| *node < *neighbor || !self.nodes.contains(*neighbor))
            .count()
    }

    pub fn live_links(&self, node: &Node) -> EngineResult<&[LiveLink]> {
        self.adjacency
            .get(node)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownNode { node: node.clone() })
    }

    pub fn ghost_links(&self, node: &Node) -> EngineResult<&[GhostLink]> {
        self.potential_reform
            .get(node)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownNode { node: node.clone() })
    }

    pub fn has_bond(&self, src: &Node, dest: &Node) -> bool {
        self.adjacency
            .get(src)
            .map_or(false, |links| links.iter().any(|l| &l.neighbor == dest))
    }

    pub fn has_potential_bond(&self, src: &Node, dest: &Node) -> bool {
        self.holds_ghost(src, dest) || self.holds_ghost(dest, src)
    }

    /// Live bonds as canonical `(low, high)` key pairs, ascending.
    pub fn live_pairs(&self) -> Vec<(Node, Node)> {
        let mut pairs: Vec<(Node, Node)> = self
            .canonical_live_bonds()
            .into_iter()
            .map(|b| (b.source, b.destination))
            .collect();
        pairs.sort();
        pairs
    }

    /// Ghost bonds as canonical `(low, high)` key pairs, ascending.
    pub fn potential_pairs(&self) -> Vec<(Node, Node)> {
        let mut pairs: Vec<(Node, Node)> = self
            .potential_reform
            .iter()
            .flat_map(|(node, ghosts)| ghosts.iter().map(move |g| (node, &g.neighbor)))
            .filter(|(node, neighbor)| *node < *neighbor || !self.nodes.contains(*neighbor))
            .map(|(node, neighbor)| {
                if node < neighbor {
                    (node.clone(), neighbor.clone())
                } else {
                    (neighbor.clone(), node.clone())
                }
            })
            .collect();
        pairs.sort();
        pairs
    }

    // ─── Structural mutation ─────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> EngineResult<()> {
        if self.nodes.contains(&node) {
            return Err(EngineError::DuplicateNode { node });
        }
        self.adjacency.insert(node.clone(), Vec::new());
        self.potential_reform.insert(node.clone(), Vec::new());
        self.nodes.insert(node);
        Ok(())
    }

    /// Insert a live bond. Both halves share `attributes`.
    pub fn add_bond(&mut self, src: &Node, dest: &Node, attributes: SharedAttributes) -> EngineResult<()> {
        if src == dest {
            return Err(EngineError::SelfBond { node: src.clone() });
        }
        self.require_node(src)?;
        self.require_node(dest)?;
        if self.has_bond(src, dest) || self.has_bond(dest, src) {
            return Err(EngineError::DuplicateBond { src: src.clone(), dest: dest.clone() });
        }

        self.push_live(src, dest, attributes.clone());
        self.push_live(dest, src, attributes);
        Ok(())
    }

    /// Remove a live bond and hand back its attributes. The bond is not
    /// registered as a reform candidate; that is the caller's call.
    pub fn remove_bond(&mut self, src: &Node, dest: &Node) -> EngineResult<SharedAttributes> {
        self.require_node(src)?;
        self.require_node(dest)?;
        let not_found = || EngineError::BondNotFound { src: src.clone(), dest: dest.clone() };

        let forward = take_link(self.adjacency.get_mut(src), dest, |l| &l.neighbor).ok_or_else(not_found)?;
        take_link(self.adjacency.get_mut(dest), src, |l| &l.neighbor).ok_or_else(not_found)?;
        Ok(forward.attributes)
    }

    /// Register a broken bond as a reform candidate. Both endpoints must be
    /// in this graph; candidates spanning two graphs go through
    /// `Population::add_potential_reform_bond`.
    pub fn add_potential_reform_bond(
        &mut self,
        src: &Node,
        dest: &Node,
        attributes: SharedAttributes,
    ) -> EngineResult<()> {
        if src == dest {
            return Err(EngineError::SelfBond { node: src.clone() });
        }
        self.require_node(src)?;
        self.require_node(dest)?;
        if self.has_potential_bond(src, dest) {
            return Err(EngineError::DuplicatePotentialBond { src: src.clone(), dest: dest.clone() });
        }

        self.push_ghost(src, dest, attributes.clone());
        self.push_ghost(dest, src, attributes);
        Ok(())
    }

    /// Drop a reform candidate from every local endpoint.
    ///
    /// Tolerates one endpoint having moved to another graph. Every local
    /// endpoint must hold the entry; nothing is removed unless all of them do.
    pub fn remove_potential_reform_bond(&mut self, src: &Node, dest: &Node) -> EngineResult<SharedAttributes> {
        let (src_in, dest_in) = self.locate_endpoints(src, dest)?;
        let not_found = || EngineError::PotentialBondNotFound { src: src.clone(), dest: dest.clone() };
        if (src_in && !self.holds_ghost(src, dest)) || (dest_in && !self.holds_ghost(dest, src)) {
            return Err(not_found());
        }

        let mut removed = None;
        if src_in {
            removed = take_link(self.potential_reform.get_mut(src), dest, |g| &g.neighbor);
        }
        if dest_in {
            let other = take_link(self.potential_reform.get_mut(dest), src, |g| &g.neighbor);
            removed = removed.or(other);
        }
        removed.map(|ghost| ghost.attributes).ok_or_else(not_found)
    }

    /// Write the local half of a candidate whose other endpoint lives in
    /// another graph. The caller writes the matching half there.
    pub(crate) fn add_ghost_half(
        &mut self,
        local: &Node,
        foreign: &Node,
        attributes: SharedAttributes,
    ) -> EngineResult<()> {
        self.require_node(local)?;
        if self.holds_ghost(local, foreign) {
            return Err(EngineError::DuplicatePotentialBond { src: local.clone(), dest: foreign.clone() });
        }
        self.push_ghost(local, foreign, attributes);
        Ok(())
    }

    /// Move `component` (nodes with all their live and ghost links) into a
    /// new graph.
    ///
    /// Live links never cross a connected component, so the two results stay
    /// internally consistent. Nodes not present here are skipped.
    pub fn split_off(&mut self, component: &BTreeSet<Node>) -> Graph {
        let mut piece = Graph::new();
        for node in component {
            if !self.nodes.remove(node) {
                continue;
            }
            let live = self.adjacency.remove(node).unwrap_or_default();
            let ghosts = self.potential_reform.remove(node).unwrap_or_default();
            piece.adjacency.insert(node.clone(), live);
            piece.potential_reform.insert(node.clone(), ghosts);
            piece.nodes.insert(node.clone());
        }
        piece
    }

    /// Disjoint union with `other`. Fails without modifying `self` if any
    /// node is shared.
    pub fn absorb(&mut self, other: Graph) -> EngineResult<()> {
        if let Some(shared) = other.nodes.iter().find(|n| self.nodes.contains(*n)) {
            return Err(EngineError::DuplicateNode { node: shared.clone() });
        }
        self.nodes.extend(other.nodes);
        self.adjacency.extend(other.adjacency);
        self.potential_reform.extend(other.potential_reform);
        Ok(())
    }

    // ─── Connectivity ────────────────────────────────────────────────────────

    /// Every node reachable from `start` over live bonds, `start` included.
    pub fn connected_component_from(&self, start: &Node) -> EngineResult<BTreeSet<Node>> {
        self.require_node(start)?;
        Ok(self.reachable(start, None))
    }

    /// Like [`Graph::connected_component_from`] but walks as if the bond
    /// `start`-`excluded_neighbor` did not exist.
    pub fn component_excluding(&self, start: &Node, excluded_neighbor: &Node) -> EngineResult<BTreeSet<Node>> {
        self.require_node(start)?;
        Ok(self.reachable(start, Some((start, excluded_neighbor))))
    }

    /// An empty graph counts as connected.
    pub fn is_fully_connected(&self) -> bool {
        match self.nodes.first() {
            Some(start) => self.reachable(start, None).len() == self.nodes.len(),
            None => true,
        }
    }

    fn reachable(&self, start: &Node, excluded: Option<(&Node, &Node)>) -> BTreeSet<Node> {
        let is_excluded = |from: &Node, to: &Node| match excluded {
            Some((a, b)) => (from == a && to == b) || (from == b && to == a),
            None => false,
        };

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let Some(links) = self.adjacency.get(current) else { continue };
            for link in links {
                if is_excluded(current, &link.neighbor) || visited.contains(&link.neighbor) {
                    continue;
                }
                visited.insert(link.neighbor.clone());
                queue.push_back(&link.neighbor);
            }
        }
        visited
    }

    // ─── Probabilistic events ────────────────────────────────────────────────

    /// Recompute every live bond's break probability from the size of the
    /// smaller side that would remain if it broke.
    ///
    /// A bond whose removal leaves the graph connected reports the whole
    /// node count on both sides, and that count goes to the model as-is.
    /// Returns the number of bonds refreshed.
    pub fn refresh_break_probabilities<M>(&mut self, model: &M) -> usize
    where
        M: BreakProbabilityModel + ?Sized,
    {
        let bonds = self.canonical_live_bonds();
        for bond in &bonds {
            let src_side = self.reachable(&bond.source, Some((&bond.source, &bond.destination))).len();
            let dest_side = self.reachable(&bond.destination, Some((&bond.source, &bond.destination))).len();
            let leaving_group_size = src_side.min(dest_side);
            bond.attributes
                .set_break_probability(model.break_probability(leaving_group_size));
        }
        bonds.len()
    }

    /// One uniform draw per live bond in canonical order; bonds whose draw
    /// falls below their break probability are returned. Nothing is removed.
    pub fn draw_removal_events<R: Rng>(&self, rng: &mut R) -> Vec<Bond> {
        self.canonical_live_bonds()
            .into_iter()
            .filter(|bond| rng.gen::<f64>() < bond.attributes.break_probability())
            .collect()
    }

    /// Same draw discipline over ghost bonds using reform probabilities.
    /// Nothing is promoted.
    pub fn draw_reform_events<R: Rng>(&self, rng: &mut R) -> Vec<Bond> {
        self.canonical_ghost_bonds()
            .into_iter()
            .filter(|bond| rng.gen::<f64>() < bond.attributes.reform_probability())
            .collect()
    }

    /// Live bonds with `source < destination`: nodes ascending, each node's
    /// links in insertion order.
    fn canonical_live_bonds(&self) -> Vec<Bond> {
        let mut bonds = Vec::new();
        for (node, links) in &self.adjacency {
            for link in links.iter().filter(|l| node < &l.neighbor) {
                bonds.push(Bond {
                    source: node.clone(),
                    destination: link.neighbor.clone(),
                    attributes: link.attributes.clone(),
                });
            }
        }
        bonds
    }

    /// Ghost bonds visited from their smaller endpoint only. A ghost whose
    /// smaller endpoint is in another graph is drawn by that graph.
    fn canonical_ghost_bonds(&self) -> Vec<Bond> {
        let mut bonds = Vec::new();
        for (node, ghosts) in &self.potential_reform {
            for ghost in ghosts.iter().filter(|g| node < &g.neighbor) {
                bonds.push(Bond {
                    source: node.clone(),
                    destination: ghost.neighbor.clone(),
                    attributes: ghost.attributes.clone(),
                });
            }
        }
        bonds
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn require_node(&self, node: &Node) -> EngineResult<()> {
        if self.nodes.contains(node) {
            Ok(())
        } else {
            Err(EngineError::UnknownNode { node: node.clone() })
        }
    }

    fn locate_endpoints(&self, src: &Node, dest: &Node) -> EngineResult<(bool, bool)> {
        let src_in = self.nodes.contains(src);
        let dest_in = self.nodes.contains(dest);
        if !src_in && !dest_in {
            return Err(EngineError::UnknownNode { node: src.clone() });
        }
        Ok((src_in, dest_in))
    }

    fn holds_ghost(&self, from: &Node, to: &Node) -> bool {
        self.potential_reform
            .get(from)
            .map_or(false, |ghosts| ghosts.iter().any(|g| &g.neighbor == to))
    }

    fn push_live(&mut self, from: &Node, to: &Node, attributes: SharedAttributes) {
        if let Some(links) = self.adjacency.get_mut(from) {
            links.push(LiveLink { neighbor: to.clone(), attributes });
        }
    }

    fn push_ghost(&mut self, from: &Node, to: &Node, attributes: SharedAttributes) {
        if let Some(ghosts) = self.potential_reform.get_mut(from) {
            ghosts.push(GhostLink { neighbor: to.clone(), attributes });
        }
    }
}

/// Remove and return the first link in `links` pointing at `target`,
/// preserving the order of the rest.
fn take_link<L>(links: Option<&mut Vec<L>>, target: &Node, neighbor: impl Fn(&L) -> &Node) -> Option<L> {
    let links = links?;
    let index = links.iter().position(|l| neighbor(l) == target)?;
    Some(links.remove(index))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
