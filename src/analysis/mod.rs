/*!
Graph-structural analysis of a discovered topology.

This module defines:
- `graph`: `GraphAnalyzer`, owning the algorithms - connected components
           (BFS), betweenness centrality (Brandes), articulation points
           (Tarjan low-link), and edge-disjoint path counts between core
           devices (unit-capacity max-flow).
- the report types the analyzer assembles into one `AnalysisReport`.

Articulation points are only defined on a connected graph; asking for them on
a disconnected one is answered with an explicit error, and the combined
report carries an explicit "undefined" marker instead of a fabricated list.
*/

pub mod graph;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use graph::GraphAnalyzer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("articulation points are undefined on a disconnected graph")]
    Disconnected,
}

/// Headline counts for the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_nodes: usize,
    pub total_links: usize,
    pub connected_components: usize,
    pub is_connected: bool,
}

/// A node ranked by betweenness centrality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalNode {
    pub node: String,
    pub ip: String,
    pub centrality: f64,
}

/// Single-point-of-failure analysis. `Undefined` is the explicit signal that
/// the precondition (a connected graph) does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpofAnalysis {
    Computed { nodes: Vec<String> },
    Undefined { reason: String },
}

/// Edge-disjoint path count between one unordered pair of core devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorePathPair {
    pub source: String,
    pub target: String,
    pub path_count: usize,
    pub has_redundancy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedundancyReport {
    pub has_redundancy: bool,
    pub pairs: Vec<CorePathPair>,
}

/// The combined analysis document, keyed by metric name when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub node_distribution: BTreeMap<String, usize>,
    pub link_distribution: BTreeMap<String, usize>,
    pub critical_nodes: Vec<CriticalNode>,
    pub single_points_of_failure: SpofAnalysis,
    pub redundancy: RedundancyReport,
    pub vlan_distribution: BTreeMap<u16, usize>,
}
