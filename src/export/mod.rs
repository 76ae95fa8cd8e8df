/*!
Topology export.

Serializes a discovered graph plus its analysis report into one of three
text formats:
- `json` - the canonical document: nodes array, links array, embedded
  analysis report;
- `graphml` - XML graph interchange for visualization tools;
- `dot` - Graphviz text.

This direction is write-only; there is no importer. An unknown format name
is a hard `Unsupported` error.
*/

use std::fmt::Write as _;

use serde::Serialize;

use crate::analysis::AnalysisReport;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::model::{NetworkLink, NetworkNode, TopologyGraph};

#[derive(Serialize)]
struct TopologyDocument<'a> {
    nodes: Vec<&'a NetworkNode>,
    links: &'a [NetworkLink],
    analysis: &'a AnalysisReport,
}

/// Renders `graph` and `analysis` in the named format.
pub fn export(
    graph: &TopologyGraph,
    analysis: &AnalysisReport,
    format: &str,
) -> DiscoveryResult<String> {
    match format {
        "json" => Ok(to_json(graph, analysis)),
        "graphml" => Ok(to_graphml(graph)),
        "dot" => Ok(to_dot(graph)),
        other => Err(DiscoveryError::Unsupported(other.to_string())),
    }
}

fn to_json(graph: &TopologyGraph, analysis: &AnalysisReport) -> String {
    let document = TopologyDocument {
        nodes: graph.nodes.values().collect(),
        links: &graph.links,
        analysis,
    };
    serde_json::to_string_pretty(&document).expect("topology document serializes")
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn to_graphml(graph: &TopologyGraph) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
    for (key, name) in [
        ("d0", "hostname"),
        ("d1", "device_type"),
        ("d2", "role"),
        ("d3", "vendor"),
    ] {
        let _ = writeln!(
            out,
            "  <key id=\"{key}\" for=\"node\" attr.name=\"{name}\" attr.type=\"string\"/>"
        );
    }
    for (key, name, kind) in [
        ("d4", "link_type", "string"),
        ("d5", "source_interface", "string"),
        ("d6", "target_interface", "string"),
        ("d7", "speed_bps", "long"),
    ] {
        let _ = writeln!(
            out,
            "  <key id=\"{key}\" for=\"edge\" attr.name=\"{name}\" attr.type=\"{kind}\"/>"
        );
    }
    out.push_str("  <graph id=\"topology\" edgedefault=\"undirected\">\n");

    for node in graph.nodes.values() {
        let _ = writeln!(out, "    <node id=\"{}\">", xml_escape(&node.id));
        let _ = writeln!(
            out,
            "      <data key=\"d0\">{}</data>",
            xml_escape(&node.hostname)
        );
        let _ = writeln!(
            out,
            "      <data key=\"d1\">{}</data>",
            node.device_type.as_str()
        );
        let _ = writeln!(out, "      <data key=\"d2\">{}</data>", node.role.as_str());
        let _ = writeln!(
            out,
            "      <data key=\"d3\">{}</data>",
            xml_escape(&node.vendor)
        );
        out.push_str("    </node>\n");
    }

    for link in &graph.links {
        let _ = writeln!(
            out,
            "    <edge source=\"{}\" target=\"{}\">",
            xml_escape(&link.source_id),
            xml_escape(&link.target_id)
        );
        let _ = writeln!(
            out,
            "      <data key=\"d4\">{}</data>",
            link.link_type.as_str()
        );
        let _ = writeln!(
            out,
            "      <data key=\"d5\">{}</data>",
            xml_escape(&link.source_interface)
        );
        let _ = writeln!(
            out,
            "      <data key=\"d6\">{}</data>",
            xml_escape(&link.target_interface)
        );
        if let Some(speed) = link.speed_bps {
            let _ = writeln!(out, "      <data key=\"d7\">{speed}</data>");
        }
        out.push_str("    </edge>\n");
    }

    out.push_str("  </graph>\n</graphml>\n");
    out
}

fn dot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn to_dot(graph: &TopologyGraph) -> String {
    let mut out = String::from("graph topology {\n");
    for node in graph.nodes.values() {
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\\n{}\"];",
            dot_escape(&node.id),
            dot_escape(&node.hostname),
            dot_escape(&node.ip_address)
        );
    }
    for link in &graph.links {
        let _ = writeln!(
            out,
            "    \"{}\" -- \"{}\" [label=\"{}\"];",
            dot_escape(&link.source_id),
            dot_escape(&link.target_id),
            link.link_type.as_str()
        );
    }
    out.push_str("}\n");
    out
}
