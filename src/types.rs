// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Type Definitions

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

// ─── Node ────────────────────────────────────────────────────────────────────

/// A cluster identity. Equality, hashing and ordering are by key only.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node(pub String);

impl Node {
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self { Node(s) }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self { Node(s.to_string()) }
}

// ─── Bond Attributes ─────────────────────────────────────────────────────────

/// Break/reform probability pair carried by one undirected bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondAttributes {
    pub break_probability: f64,
    pub reform_probability: f64,
}

impl BondAttributes {
    pub fn new(break_probability: f64, reform_probability: f64) -> Self {
        Self { break_probability, reform_probability }
    }
}

/// Attributes cell shared by both directed halves of a bond.
///
/// Cloning the handle aliases the same cell, so a write through one endpoint's
/// link is observed by the other. Live and ghost links of the same bond keep
/// pointing at one cell across break/reform cycles.
#[derive(Debug, Clone)]
pub struct SharedAttributes(Rc<Cell<BondAttributes>>);

impl SharedAttributes {
    pub fn new(attributes: BondAttributes) -> Self {
        Self(Rc::new(Cell::new(attributes)))
    }

    pub fn get(&self) -> BondAttributes {
        self.0.get()
    }

    pub fn break_probability(&self) -> f64 {
        self.0.get().break_probability
    }

    pub fn reform_probability(&self) -> f64 {
        self.0.get().reform_probability
    }

    pub fn set_break_probability(&self, probability: f64) {
        let mut attributes = self.0.get();
        attributes.break_probability = probability;
        self.0.set(attributes);
    }

    /// Whether both handles alias the same cell.
    pub fn same_cell(&self, other: &SharedAttributes) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<BondAttributes> for SharedAttributes {
    fn from(attributes: BondAttributes) -> Self {
        Self::new(attributes)
    }
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// One endpoint's view of a live bond.
#[derive(Debug, Clone)]
pub struct LiveLink {
    pub neighbor: Node,
    pub attributes: SharedAttributes,
}

/// One endpoint's view of a broken bond that may reform.
#[derive(Debug, Clone)]
pub struct GhostLink {
    pub neighbor: Node,
    pub attributes: SharedAttributes,
}

// ─── Bond (event view) ───────────────────────────────────────────────────────

/// Directed view of an undirected bond, produced by event draws.
#[derive(Debug, Clone)]
pub struct Bond {
    pub source: Node,
    pub destination: Node,
    pub attributes: SharedAttributes,
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes = self.attributes.get();
        write!(
            f,
            "{}->{} ({}, {})",
            self.source, self.destination,
            attributes.break_probability, attributes.reform_probability
        )
    }
}

// ─── Bond Record (structure input) ───────────────────────────────────────────

/// One initial bond as supplied by a structure source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    pub source: String,
    pub destination: String,
    pub break_probability: f64,
    pub reform_probability: f64,
}

impl BondRecord {
    pub fn attributes(&self) -> BondAttributes {
        BondAttributes::new(self.break_probability, self.reform_probability)
    }
}

impl From<(String, String, f64, f64)> for BondRecord {
    fn from((source, destination, break_probability, reform_probability): (String, String, f64, f64)) -> Self {
        Self { source, destination, break_probability, reform_probability }
    }
}

impl From<(&str, &str, f64, f64)> for BondRecord {
    fn from((source, destination, break_probability, reform_probability): (&str, &str, f64, f64)) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            break_probability,
            reform_probability,
        }
    }
}
