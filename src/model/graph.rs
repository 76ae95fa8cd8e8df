use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::link::NetworkLink;
use crate::model::node::NetworkNode;

/// The accumulated result of one discovery run: a node map keyed by IP plus a
/// deduplicated link list. Iteration order is deterministic, which makes two
/// runs against an unchanged network comparable set-for-set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub nodes: BTreeMap<String, NetworkNode>,
    pub links: Vec<NetworkLink>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Inserts a node, replacing any previous entry with the same id.
    pub fn upsert_node(&mut self, node: NetworkNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.get(id)
    }

    /// Appends a link unless one with the same unordered endpoint pair is
    /// already stored or either endpoint is missing from the node map.
    /// Returns whether the link was added.
    pub fn add_link(&mut self, link: NetworkLink) -> bool {
        if !self.nodes.contains_key(&link.source_id) || !self.nodes.contains_key(&link.target_id) {
            return false;
        }
        if self.links.iter().any(|existing| existing.same_endpoints(&link)) {
            return false;
        }
        self.links.push(link);
        true
    }

    /// Derived adjacency index over node ids. Neighbor lists are sorted, so
    /// traversals over the index are deterministic.
    pub fn adjacency(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for id in self.nodes.keys() {
            adjacency.insert(id.as_str(), Vec::new());
        }
        for link in &self.links {
            if let Some(neighbors) = adjacency.get_mut(link.source_id.as_str()) {
                neighbors.push(link.target_id.as_str());
            }
            if let Some(neighbors) = adjacency.get_mut(link.target_id.as_str()) {
                neighbors.push(link.source_id.as_str());
            }
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable();
        }
        adjacency
    }
}
