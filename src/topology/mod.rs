/*!
Topology construction.

This module defines:
- `neighbors`: the per-device neighbor-discovery fallback chain
               (vendor cache → standard table → ARP-derived candidates).
- `builder`: `TopologyBuilder`, the breadth-first crawler that turns seed
             addresses into a `TopologyGraph`, plus `CancelHandle`.

`discover_range` composes the liveness scanner with the builder: scan a CIDR
range, then crawl from every live host with its MAC and open-port
observations carried along as enrichment hints.
*/

pub mod builder;
pub mod neighbors;

pub use builder::{CancelHandle, TopologyBuilder};
pub use neighbors::{NeighborEntry, NeighborSource};

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryResult;
use crate::model::TopologyGraph;
use crate::probe::SnmpProbe;
use crate::scan::NetworkScanner;

/// Scans a CIDR range and crawls the topology from every live host found.
pub async fn discover_range(
    config: &DiscoveryConfig,
    range: &str,
) -> DiscoveryResult<TopologyGraph> {
    let scanner = NetworkScanner::new(config.clone());
    let hosts = scanner.scan(range).await?;
    let builder = TopologyBuilder::new(SnmpProbe::new(config), config.clone());
    builder.discover_hosts(&hosts).await
}
