use std::collections::{HashMap, HashSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::classify;
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::model::{
    DeviceType, InterfaceInfo, InterfaceKind, LinkType, NetworkLink, NetworkNode, TopologyGraph,
};
use crate::probe::oids;
use crate::probe::source::DeviceProbe;
use crate::scan::LiveHost;
use crate::topology::neighbors::{self, NeighborEntry};

/// Cooperative cancellation for an in-flight run. Cancelling stops the crawl
/// before the next device probe; calls already dispatched finish or hit their
/// own timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Breadth-first topology crawler. One instance serves one discovery run;
/// community string, timeouts and bounds all arrive through the config, and
/// no state survives the run.
pub struct TopologyBuilder<P> {
    probe: P,
    config: DiscoveryConfig,
    cancel: CancelHandle,
}

impl<P: DeviceProbe> TopologyBuilder<P> {
    pub fn new(probe: P, config: DiscoveryConfig) -> Self {
        Self {
            probe,
            config,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle for cancelling this run from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Crawls outward from the given seed addresses. Malformed seeds reject
    /// the whole call before any probe is issued.
    pub async fn discover(&self, seeds: &[String]) -> DiscoveryResult<TopologyGraph> {
        let mut parsed = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let ip: Ipv4Addr = seed.trim().parse().map_err(|_| {
                DiscoveryError::InvalidInput(format!("malformed seed address {seed:?}"))
            })?;
            parsed.push(ip);
        }
        self.run(parsed, HashMap::new(), HashMap::new()).await
    }

    /// Crawls from hosts found by the liveness scanner, keeping their MAC
    /// addresses and open-port observations as enrichment hints.
    pub async fn discover_hosts(&self, hosts: &[LiveHost]) -> DiscoveryResult<TopologyGraph> {
        let seeds: Vec<Ipv4Addr> = hosts.iter().map(|host| host.ip).collect();
        let macs: HashMap<Ipv4Addr, String> = hosts
            .iter()
            .filter_map(|host| host.mac.clone().map(|mac| (host.ip, mac)))
            .collect();
        let ports: HashMap<Ipv4Addr, Vec<u16>> = hosts
            .iter()
            .filter(|host| !host.open_ports.is_empty())
            .map(|host| (host.ip, host.open_ports.clone()))
            .collect();
        self.run(seeds, macs, ports).await
    }

    async fn run(
        &self,
        seeds: Vec<Ipv4Addr>,
        mac_hints: HashMap<Ipv4Addr, String>,
        port_hints: HashMap<Ipv4Addr, Vec<u16>>,
    ) -> DiscoveryResult<TopologyGraph> {
        info!(seeds = seeds.len(), "starting topology discovery");

        let mut graph = TopologyGraph::new();
        let mut discovered: HashSet<Ipv4Addr> = HashSet::new();
        let mut frontier: VecDeque<Ipv4Addr> = seeds.into_iter().collect();

        while let Some(current) = frontier.pop_front() {
            if discovered.contains(&current) {
                continue;
            }
            if self.cancel.is_cancelled() {
                info!(
                    pending = frontier.len(),
                    "discovery cancelled; issuing no further probes"
                );
                break;
            }
            discovered.insert(current);

            let Some(mut node) = self.probe_device(current).await else {
                debug!(ip = %current, "no identification response, host omitted");
                continue;
            };
            if let Some(mac) = mac_hints.get(&current) {
                node.mac_address = Some(mac.clone());
            }
            if node.device_type == DeviceType::Unknown {
                if let Some(open_ports) = port_hints.get(&current) {
                    node.device_type = classify::classify_by_services(open_ports);
                    node.role = classify::determine_role(&node.hostname, node.device_type);
                }
            }
            debug!(ip = %current, hostname = %node.hostname, "discovered node");
            graph.upsert_node(node);

            let (entries, source) = neighbors::discover(
                &self.probe,
                current,
                self.config.max_address_table_neighbors,
            )
            .await;
            if let Some(source) = source {
                debug!(ip = %current, count = entries.len(), ?source, "neighbors resolved");
            }

            for entry in &entries {
                if !discovered.contains(&entry.ip) {
                    frontier.push_back(entry.ip);
                }
            }
            for entry in &entries {
                if let Some(link) = self.resolve_link(&graph, current, entry) {
                    graph.add_link(link);
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            "topology discovery finished"
        );
        Ok(graph)
    }

    /// Builds a link toward a neighbor that already has a node in the graph.
    fn resolve_link(
        &self,
        graph: &TopologyGraph,
        current: Ipv4Addr,
        entry: &NeighborEntry,
    ) -> Option<NetworkLink> {
        let source_id = current.to_string();
        let target_id = entry.ip.to_string();
        let source_node = graph.node(&source_id)?;
        let target_node = graph.node(&target_id)?;

        let (source_interface, speed_bps) = match entry.local_if_index {
            Some(index) => match source_node
                .interfaces
                .iter()
                .find(|(_, info)| info.index == index)
            {
                Some((name, info)) => (name.clone(), info.speed_bps),
                None => (format!("if-{index}"), None),
            },
            None => (String::new(), None),
        };
        let target_interface = entry.remote_port.clone().unwrap_or_default();
        let link_type = LinkType::infer(&source_interface, &target_interface);

        // VLANs carried by the link: what both endpoints agree on.
        let vlans: Vec<u16> = source_node
            .vlans
            .iter()
            .filter(|vlan| target_node.vlans.contains(vlan))
            .copied()
            .collect();

        let mut link = NetworkLink::new(source_id, target_id);
        link.source_interface = source_interface;
        link.target_interface = target_interface;
        link.link_type = link_type;
        link.speed_bps = speed_bps;
        link.vlans = vlans;
        Some(link)
    }

    /// Identifies and enriches one device. Returns `None` when the device
    /// answered none of the identification probes.
    async fn probe_device(&self, ip: Ipv4Addr) -> Option<NetworkNode> {
        let sys_descr = self
            .probe
            .get(ip, oids::SYS_DESCR)
            .await
            .value()
            .and_then(|v| v.as_text());
        let sys_name = self
            .probe
            .get(ip, oids::SYS_NAME)
            .await
            .value()
            .and_then(|v| v.as_text());
        if sys_descr.is_none() && sys_name.is_none() {
            return None;
        }

        let mut node = NetworkNode::new(ip);

        let description = sys_descr.unwrap_or_default();
        let (device_type, vendor) = classify::classify(&description);
        node.device_type = device_type;
        node.vendor = vendor;

        if let Some(name) = sys_name {
            node.hostname = name;
        } else if let Some(name) = reverse_dns(ip, self.config.probe_timeout).await {
            node.hostname = name;
        }
        node.role = classify::determine_role(&node.hostname, node.device_type);

        node.location = self
            .probe
            .get(ip, oids::SYS_LOCATION)
            .await
            .value()
            .and_then(|v| v.as_text());
        node.sys_object_id = self
            .probe
            .get(ip, oids::SYS_OBJECT_ID)
            .await
            .value()
            .and_then(|v| v.as_text());
        node.uptime_ticks = self
            .probe
            .get(ip, oids::SYS_UPTIME)
            .await
            .value()
            .and_then(|v| v.as_u64())
            .and_then(|ticks| u32::try_from(ticks).ok());

        self.enrich_vlans(ip, &mut node).await;
        self.enrich_interfaces(ip, &mut node).await;
        Some(node)
    }

    /// VLAN membership from the vendor VLAN table; the id is the last suffix
    /// component and out-of-range ids are dropped at insertion.
    async fn enrich_vlans(&self, ip: Ipv4Addr, node: &mut NetworkNode) {
        let rows = self
            .probe
            .walk(ip, oids::VLAN_STATE)
            .await
            .value()
            .unwrap_or_default();
        for row in rows {
            let Some(last) = row.suffix.last() else { continue };
            if let Ok(vlan_id) = u16::try_from(*last) {
                node.add_vlan(vlan_id);
            }
        }
    }

    /// Interface table: names first, then operational status and speed joined
    /// by ifIndex.
    async fn enrich_interfaces(&self, ip: Ipv4Addr, node: &mut NetworkNode) {
        let names = self
            .probe
            .walk(ip, oids::IF_DESCR)
            .await
            .value()
            .unwrap_or_default();
        if names.is_empty() {
            return;
        }

        for row in names {
            let Some(index) = row.suffix.last().copied() else { continue };
            let Some(name) = row.value.as_text() else { continue };
            node.interfaces.insert(
                name.clone(),
                InterfaceInfo {
                    index,
                    kind: InterfaceKind::from_name(&name),
                    status: "unknown".to_string(),
                    speed_bps: None,
                },
            );
        }

        let statuses = self
            .probe
            .walk(ip, oids::IF_OPER_STATUS)
            .await
            .value()
            .unwrap_or_default();
        let status_by_index: HashMap<u64, &'static str> = statuses
            .iter()
            .filter_map(|row| {
                let index = *row.suffix.last()?;
                let status = match row.value.as_u64()? {
                    1 => "up",
                    2 => "down",
                    _ => "unknown",
                };
                Some((index, status))
            })
            .collect();

        let speeds = self
            .probe
            .walk(ip, oids::IF_SPEED)
            .await
            .value()
            .unwrap_or_default();
        let speed_by_index: HashMap<u64, u64> = speeds
            .iter()
            .filter_map(|row| Some((*row.suffix.last()?, row.value.as_u64()?)))
            .collect();

        for info in node.interfaces.values_mut() {
            if let Some(status) = status_by_index.get(&info.index) {
                info.status = (*status).to_string();
            }
            if let Some(speed) = speed_by_index.get(&info.index) {
                info.speed_bps = Some(*speed);
            }
        }
    }
}

/// Reverse DNS as a hostname fallback. `lookup_addr` is synchronous, so it
/// runs on the blocking pool under the probe timeout.
async fn reverse_dns(ip: Ipv4Addr, timeout: Duration) -> Option<String> {
    let lookup =
        tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&IpAddr::V4(ip)).ok());
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(hostname)) => hostname,
        _ => None,
    }
}
