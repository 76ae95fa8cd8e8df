use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::analysis::{
    AnalysisError, AnalysisReport, CorePathPair, CriticalNode, RedundancyReport, SpofAnalysis,
    Summary,
};
use crate::model::{DeviceRole, TopologyGraph};

/// Analyzer over one finished `TopologyGraph`. Node ids are mapped onto
/// dense indices once at construction; every algorithm walks the same
/// adjacency-index representation, so results are deterministic.
pub struct GraphAnalyzer<'a> {
    graph: &'a TopologyGraph,
    ids: Vec<&'a str>,
    neighbor_indices: Vec<Vec<usize>>,
}

impl<'a> GraphAnalyzer<'a> {
    pub fn new(graph: &'a TopologyGraph) -> Self {
        let adjacency = graph.adjacency();
        let ids: Vec<&str> = adjacency.keys().copied().collect();
        let index_of: HashMap<&str, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let neighbor_indices = ids
            .iter()
            .map(|id| adjacency[id].iter().map(|n| index_of[n]).collect())
            .collect();
        Self {
            graph,
            ids,
            neighbor_indices,
        }
    }

    /// Connected components as sorted id lists, in order of their smallest
    /// member.
    pub fn connected_components(&self) -> Vec<Vec<String>> {
        let n = self.ids.len();
        let mut visited = vec![false; n];
        let mut components = Vec::new();

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(v) = queue.pop_front() {
                component.push(self.ids[v].to_string());
                for &w in &self.neighbor_indices[v] {
                    if !visited[w] {
                        visited[w] = true;
                        queue.push_back(w);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// An empty graph has zero components and counts as not connected.
    pub fn is_connected(&self) -> bool {
        self.connected_components().len() == 1
    }

    /// Brandes' betweenness centrality for unweighted graphs, normalized by
    /// 2/((n-1)(n-2)) for n > 2.
    pub fn betweenness_centrality(&self) -> BTreeMap<String, f64> {
        let scores = self.betweenness();
        self.ids
            .iter()
            .zip(scores)
            .map(|(id, score)| (id.to_string(), score))
            .collect()
    }

    fn betweenness(&self) -> Vec<f64> {
        let n = self.ids.len();
        let mut centrality = vec![0.0f64; n];

        for s in 0..n {
            // forward BFS phase: shortest-path counts and predecessor lists
            let mut order = Vec::with_capacity(n);
            let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut sigma = vec![0.0f64; n];
            let mut dist = vec![-1i64; n];
            sigma[s] = 1.0;
            dist[s] = 0;
            let mut queue = VecDeque::from([s]);
            while let Some(v) = queue.pop_front() {
                order.push(v);
                for &w in &self.neighbor_indices[v] {
                    if dist[w] < 0 {
                        dist[w] = dist[v] + 1;
                        queue.push_back(w);
                    }
                    if dist[w] == dist[v] + 1 {
                        sigma[w] += sigma[v];
                        preds[w].push(v);
                    }
                }
            }

            // backward accumulation phase
            let mut delta = vec![0.0f64; n];
            while let Some(w) = order.pop() {
                for &v in &preds[w] {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
                if w != s {
                    centrality[w] += delta[w];
                }
            }
        }

        // each unordered pair was counted from both endpoints
        for score in centrality.iter_mut() {
            *score /= 2.0;
        }
        if n > 2 {
            let scale = 2.0 / ((n - 1) as f64 * (n - 2) as f64);
            for score in centrality.iter_mut() {
                *score *= scale;
            }
        }
        centrality
    }

    /// Top-N nodes by centrality, ties broken by id for stable output.
    pub fn critical_nodes(&self, top_n: usize) -> Vec<CriticalNode> {
        let scores = self.betweenness();
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|(a_idx, a), (b_idx, b)| {
            b.partial_cmp(a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.ids[*a_idx].cmp(self.ids[*b_idx]))
        });
        ranked
            .into_iter()
            .take(top_n)
            .map(|(idx, score)| {
                let id = self.ids[idx];
                CriticalNode {
                    node: self
                        .graph
                        .node(id)
                        .map(|node| node.hostname.clone())
                        .unwrap_or_else(|| id.to_string()),
                    ip: id.to_string(),
                    centrality: score,
                }
            })
            .collect()
    }

    /// Articulation points via Tarjan's low-link DFS (iterative). Defined
    /// only on a connected graph; a disconnected graph is an explicit error,
    /// never an answer.
    pub fn articulation_points(&self) -> Result<Vec<String>, AnalysisError> {
        if !self.is_connected() {
            return Err(AnalysisError::Disconnected);
        }

        let n = self.ids.len();
        let mut visited = vec![false; n];
        let mut disc = vec![0usize; n];
        let mut low = vec![0usize; n];
        let mut cut = vec![false; n];
        let mut timer = 0usize;

        let root = 0;
        let mut root_children = 0usize;
        // frames: (vertex, parent, next neighbor cursor)
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, usize::MAX, 0)];
        visited[root] = true;
        timer += 1;
        disc[root] = timer;
        low[root] = timer;

        while let Some(&(v, parent, cursor)) = stack.last() {
            if cursor < self.neighbor_indices[v].len() {
                stack.last_mut().expect("frame exists").2 += 1;
                let w = self.neighbor_indices[v][cursor];
                if w == parent {
                    continue;
                }
                if visited[w] {
                    low[v] = low[v].min(disc[w]);
                } else {
                    visited[w] = true;
                    timer += 1;
                    disc[w] = timer;
                    low[w] = timer;
                    if v == root {
                        root_children += 1;
                    }
                    stack.push((w, v, 0));
                }
            } else {
                stack.pop();
                if let Some(&(u, _, _)) = stack.last() {
                    low[u] = low[u].min(low[v]);
                    if u != root && low[v] >= disc[u] {
                        cut[u] = true;
                    }
                }
            }
        }
        if root_children > 1 {
            cut[root] = true;
        }

        Ok((0..n)
            .filter(|idx| cut[*idx])
            .map(|idx| self.ids[idx].to_string())
            .collect())
    }

    /// Count of edge-disjoint paths between two nodes: unit-capacity
    /// max-flow with BFS augmentation (Menger's theorem).
    pub fn edge_disjoint_paths(&self, source: &str, target: &str) -> usize {
        let index_of = |id: &str| self.ids.iter().position(|candidate| *candidate == id);
        let (Some(s), Some(t)) = (index_of(source), index_of(target)) else {
            return 0;
        };
        if s == t {
            return 0;
        }

        let n = self.ids.len();
        let mut capacity: HashMap<(usize, usize), i32> = HashMap::new();
        for (v, neighbors) in self.neighbor_indices.iter().enumerate() {
            for &w in neighbors {
                capacity.insert((v, w), 1);
            }
        }

        let mut flow = 0;
        loop {
            let mut parent = vec![usize::MAX; n];
            parent[s] = s;
            let mut queue = VecDeque::from([s]);
            while let Some(v) = queue.pop_front() {
                if v == t {
                    break;
                }
                for &w in &self.neighbor_indices[v] {
                    if parent[w] == usize::MAX && capacity.get(&(v, w)).copied().unwrap_or(0) > 0 {
                        parent[w] = v;
                        queue.push_back(w);
                    }
                }
            }
            if parent[t] == usize::MAX {
                break;
            }

            let mut w = t;
            while w != s {
                let v = parent[w];
                *capacity.entry((v, w)).or_insert(0) -= 1;
                *capacity.entry((w, v)).or_insert(0) += 1;
                w = v;
            }
            flow += 1;
        }
        flow
    }

    /// Edge-disjoint path counts between every unordered pair of core-role
    /// devices; a pair counts as redundant when more than one path exists.
    pub fn redundancy(&self) -> RedundancyReport {
        let core_ids: Vec<&str> = self
            .graph
            .nodes
            .values()
            .filter(|node| node.role == DeviceRole::Core)
            .map(|node| node.id.as_str())
            .collect();

        let mut pairs = Vec::new();
        for (i, source) in core_ids.iter().enumerate() {
            for target in &core_ids[i + 1..] {
                let path_count = self.edge_disjoint_paths(source, target);
                pairs.push(CorePathPair {
                    source: source.to_string(),
                    target: target.to_string(),
                    path_count,
                    has_redundancy: path_count > 1,
                });
            }
        }
        RedundancyReport {
            has_redundancy: pairs.iter().any(|pair| pair.has_redundancy),
            pairs,
        }
    }

    /// How many nodes carry each VLAN id.
    pub fn vlan_distribution(&self) -> BTreeMap<u16, usize> {
        let mut distribution = BTreeMap::new();
        for node in self.graph.nodes.values() {
            for vlan in &node.vlans {
                *distribution.entry(*vlan).or_insert(0) += 1;
            }
        }
        distribution
    }

    fn node_distribution(&self) -> BTreeMap<String, usize> {
        let mut distribution = BTreeMap::new();
        for node in self.graph.nodes.values() {
            *distribution
                .entry(node.role.as_str().to_string())
                .or_insert(0) += 1;
        }
        distribution
    }

    fn link_distribution(&self) -> BTreeMap<String, usize> {
        let mut distribution = BTreeMap::new();
        for link in &self.graph.links {
            *distribution
                .entry(link.link_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        distribution
    }

    /// Assembles the combined report.
    pub fn analyze(&self, top_n: usize) -> AnalysisReport {
        let components = self.connected_components();
        let is_connected = components.len() == 1;

        let single_points_of_failure = match self.articulation_points() {
            Ok(nodes) => SpofAnalysis::Computed { nodes },
            Err(AnalysisError::Disconnected) => SpofAnalysis::Undefined {
                reason: "undefined: graph is disconnected".to_string(),
            },
        };

        AnalysisReport {
            summary: Summary {
                total_nodes: self.graph.node_count(),
                total_links: self.graph.link_count(),
                connected_components: components.len(),
                is_connected,
            },
            node_distribution: self.node_distribution(),
            link_distribution: self.link_distribution(),
            critical_nodes: self.critical_nodes(top_n),
            single_points_of_failure,
            redundancy: self.redundancy(),
            vlan_distribution: self.vlan_distribution(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::model::{NetworkLink, NetworkNode};

    fn graph_with(nodes: &[u8], edges: &[(u8, u8)]) -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        for octet in nodes {
            graph.upsert_node(NetworkNode::new(Ipv4Addr::new(10, 0, 0, *octet)));
        }
        for (a, b) in edges {
            graph.add_link(NetworkLink::new(
                format!("10.0.0.{a}"),
                format!("10.0.0.{b}"),
            ));
        }
        graph
    }

    #[test]
    fn components_and_connectivity() {
        let connected = graph_with(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let analyzer = GraphAnalyzer::new(&connected);
        assert_eq!(analyzer.connected_components().len(), 1);
        assert!(analyzer.is_connected());

        let split = graph_with(&[1, 2, 3, 4], &[(1, 2), (3, 4)]);
        let analyzer = GraphAnalyzer::new(&split);
        assert_eq!(analyzer.connected_components().len(), 2);
        assert!(!analyzer.is_connected());

        let empty = TopologyGraph::new();
        let analyzer = GraphAnalyzer::new(&empty);
        assert!(analyzer.connected_components().is_empty());
        assert!(!analyzer.is_connected());
    }

    #[test]
    fn path_graph_centrality_peaks_in_the_middle() {
        let graph = graph_with(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let analyzer = GraphAnalyzer::new(&graph);
        let centrality = analyzer.betweenness_centrality();
        assert!((centrality["10.0.0.2"] - 1.0).abs() < 1e-9);
        assert!(centrality["10.0.0.1"].abs() < 1e-9);
        assert!(centrality["10.0.0.3"].abs() < 1e-9);
    }

    #[test]
    fn star_center_has_normalized_centrality_one() {
        let graph = graph_with(&[1, 2, 3, 4], &[(1, 2), (1, 3), (1, 4)]);
        let analyzer = GraphAnalyzer::new(&graph);
        let centrality = analyzer.betweenness_centrality();
        assert!((centrality["10.0.0.1"] - 1.0).abs() < 1e-9);
        assert!(centrality["10.0.0.2"].abs() < 1e-9);
    }

    #[test]
    fn critical_nodes_rank_descending_with_stable_ties() {
        let graph = graph_with(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4)]);
        let analyzer = GraphAnalyzer::new(&graph);
        let ranked = analyzer.critical_nodes(2);
        assert_eq!(ranked.len(), 2);
        // the two middle nodes tie; the smaller id comes first
        assert_eq!(ranked[0].ip, "10.0.0.2");
        assert_eq!(ranked[1].ip, "10.0.0.3");
        assert!(ranked[0].centrality >= ranked[1].centrality);
    }

    #[test]
    fn articulation_point_in_a_path() {
        let graph = graph_with(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let analyzer = GraphAnalyzer::new(&graph);
        assert_eq!(
            analyzer.articulation_points().unwrap(),
            vec!["10.0.0.2".to_string()]
        );
    }

    #[test]
    fn cycle_has_no_articulation_points() {
        let graph = graph_with(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (4, 1)]);
        let analyzer = GraphAnalyzer::new(&graph);
        assert!(analyzer.articulation_points().unwrap().is_empty());
    }

    #[test]
    fn bridge_between_cycles_is_detected() {
        // two triangles joined through node 3-4 bridge
        let graph = graph_with(
            &[1, 2, 3, 4, 5, 6],
            &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5), (5, 6), (6, 4)],
        );
        let analyzer = GraphAnalyzer::new(&graph);
        assert_eq!(
            analyzer.articulation_points().unwrap(),
            vec!["10.0.0.3".to_string(), "10.0.0.4".to_string()]
        );
    }

    #[test]
    fn spof_on_disconnected_graph_is_an_explicit_error() {
        let graph = graph_with(&[1, 2, 3], &[(1, 2)]);
        let analyzer = GraphAnalyzer::new(&graph);
        assert_eq!(
            analyzer.articulation_points(),
            Err(AnalysisError::Disconnected)
        );

        let report = analyzer.analyze(5);
        assert!(matches!(
            report.single_points_of_failure,
            SpofAnalysis::Undefined { .. }
        ));
    }

    #[test]
    fn edge_disjoint_paths_on_a_cycle() {
        let graph = graph_with(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (4, 1)]);
        let analyzer = GraphAnalyzer::new(&graph);
        assert_eq!(analyzer.edge_disjoint_paths("10.0.0.1", "10.0.0.3"), 2);

        let path = graph_with(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let analyzer = GraphAnalyzer::new(&path);
        assert_eq!(analyzer.edge_disjoint_paths("10.0.0.1", "10.0.0.3"), 1);
        assert_eq!(analyzer.edge_disjoint_paths("10.0.0.1", "10.0.0.9"), 0);
    }

    #[test]
    fn core_pair_on_a_ring_is_redundant() {
        let mut graph = graph_with(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (4, 1)]);
        for id in ["10.0.0.1", "10.0.0.3"] {
            graph.nodes.get_mut(id).unwrap().role = DeviceRole::Core;
        }
        let analyzer = GraphAnalyzer::new(&graph);
        let redundancy = analyzer.redundancy();
        assert!(redundancy.has_redundancy);
        assert_eq!(redundancy.pairs.len(), 1);
        let pair = &redundancy.pairs[0];
        assert_eq!(pair.path_count, 2);
        assert!(pair.has_redundancy);
    }

    #[test]
    fn vlan_distribution_counts_nodes_per_vlan() {
        let mut graph = graph_with(&[1, 2], &[(1, 2)]);
        graph.nodes.get_mut("10.0.0.1").unwrap().add_vlan(10);
        graph.nodes.get_mut("10.0.0.1").unwrap().add_vlan(20);
        graph.nodes.get_mut("10.0.0.2").unwrap().add_vlan(10);

        let analyzer = GraphAnalyzer::new(&graph);
        let distribution = analyzer.vlan_distribution();
        assert_eq!(distribution[&10], 2);
        assert_eq!(distribution[&20], 1);
    }

    #[test]
    fn report_summary_matches_graph_shape() {
        let graph = graph_with(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let analyzer = GraphAnalyzer::new(&graph);
        let report = analyzer.analyze(5);
        assert_eq!(report.summary.total_nodes, 3);
        assert_eq!(report.summary.total_links, 2);
        assert_eq!(report.summary.connected_components, 1);
        assert!(report.summary.is_connected);
        assert_eq!(report.node_distribution["access"], 3);
        assert_eq!(report.link_distribution["access"], 2);
        assert_eq!(
            report.single_points_of_failure,
            SpofAnalysis::Computed {
                nodes: vec!["10.0.0.2".to_string()]
            }
        );
    }
}
