/*!
netmapper: network device and topology discovery engine.

The engine finds live hosts in an address range, identifies devices over
SNMP, walks their neighbor tables to build a deduplicated node/link graph,
and derives structural health metrics (connectivity, centrality,
single points of failure, redundancy) from the result.

Structure:
- `scan`: liveness scanning (ARP sweep with a parallel TCP connect fallback).
- `probe`: the SNMP GET/WALK abstraction every higher layer talks through.
- `classify`: sysDescr/hostname rule tables for device type, vendor and role.
- `topology`: the breadth-first crawler and its neighbor fallback chain.
- `analysis`: graph algorithms over the finished topology.
- `export`: JSON / GraphML / DOT serialization.

A discovery run is one engine instance with its own config; nothing persists
between runs, and a run always returns the best partial graph it could build.
Only malformed caller input is a hard failure.
*/

pub mod analysis;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod probe;
pub mod scan;
pub mod topology;

pub use analysis::{AnalysisReport, GraphAnalyzer};
pub use config::DiscoveryConfig;
pub use error::{DiscoveryError, DiscoveryResult};
pub use export::export;
pub use model::{NetworkLink, NetworkNode, TopologyGraph};
pub use probe::SnmpProbe;
pub use scan::{LiveHost, NetworkScanner};
pub use topology::{CancelHandle, TopologyBuilder, discover_range};
