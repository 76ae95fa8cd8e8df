/*!
Liveness scanning.

This module defines:
- `arp`: the primary sweep - a link-layer broadcast ARP probe per candidate
         address, with one retry pass (pnet datalink).
- `tcp`: the fallback - parallel TCP connect probing of a fixed port set
         under a bounded worker pool.
- `NetworkScanner`: parses the CIDR range, runs the sweep and degrades to
  the TCP fallback when no datalink channel can be opened.

Per-host failures never surface: a host that answers nothing is simply
absent from the result set. Only a malformed range is an error, raised
before any probe is sent.
*/

pub mod arp;
pub mod tcp;

use std::net::Ipv4Addr;

use ipnetwork::IpNetwork;
use tracing::{info, warn};

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, DiscoveryResult};

/// A host that answered liveness probing. The MAC is known only when the ARP
/// sweep found the host; `open_ports` is populated only by the TCP fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveHost {
    pub ip: Ipv4Addr,
    pub mac: Option<String>,
    pub open_ports: Vec<u16>,
}

/// Expands a CIDR range into candidate host addresses. Network and broadcast
/// addresses are excluded below /31.
pub(crate) fn expand_range(range: &str) -> DiscoveryResult<Vec<Ipv4Addr>> {
    let network: IpNetwork = range
        .trim()
        .parse()
        .map_err(|e| DiscoveryError::InvalidInput(format!("invalid network range {range:?}: {e}")))?;
    let IpNetwork::V4(network) = network else {
        return Err(DiscoveryError::InvalidInput(format!(
            "only IPv4 ranges can be scanned, got {range:?}"
        )));
    };

    let network_address = network.network();
    let broadcast = network.broadcast();
    Ok(network
        .iter()
        .filter(|ip| network.prefix() >= 31 || (*ip != network_address && *ip != broadcast))
        .collect())
}

/// Per-run liveness scanner. Constructed with the run's config; holds no
/// state between scans.
pub struct NetworkScanner {
    config: DiscoveryConfig,
}

impl NetworkScanner {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Finds live hosts in `range`. ARP sweep first; TCP connect probing when
    /// the sweep cannot run at all.
    pub async fn scan(&self, range: &str) -> DiscoveryResult<Vec<LiveHost>> {
        let targets = expand_range(range)?;
        info!(range, candidates = targets.len(), "liveness scan started");
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let interface = self.config.scan_interface.clone();
        let listen = self.config.arp_timeout;
        let sweep_targets = targets.clone();
        let swept = tokio::task::spawn_blocking(move || {
            arp::sweep(&sweep_targets, interface.as_deref(), listen)
        })
        .await;

        match swept {
            Ok(Ok(hosts)) => {
                info!(live = hosts.len(), "arp sweep complete");
                Ok(hosts
                    .into_iter()
                    .map(|(ip, mac)| LiveHost {
                        ip,
                        mac: Some(mac.to_string()),
                        open_ports: Vec::new(),
                    })
                    .collect())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "arp sweep unavailable, falling back to tcp probing");
                self.tcp_fallback(targets).await
            }
            Err(e) => {
                warn!(error = %e, "arp sweep task failed, falling back to tcp probing");
                self.tcp_fallback(targets).await
            }
        }
    }

    async fn tcp_fallback(&self, targets: Vec<Ipv4Addr>) -> DiscoveryResult<Vec<LiveHost>> {
        let live = tcp::probe_hosts(
            targets,
            self.config.connect_timeout,
            self.config.scan_concurrency,
        )
        .await;
        info!(live = live.len(), "tcp fallback complete");
        Ok(live
            .into_iter()
            .map(|(ip, open_ports)| LiveHost {
                ip,
                mac: None,
                open_ports,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_octet_range_is_rejected_without_scanning() {
        let result = expand_range("300.1.1.0/24");
        assert!(matches!(result, Err(DiscoveryError::InvalidInput(_))));
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        assert!(matches!(
            expand_range("10.0.0.0/33"),
            Err(DiscoveryError::InvalidInput(_))
        ));
        assert!(matches!(
            expand_range("not-a-range"),
            Err(DiscoveryError::InvalidInput(_))
        ));
    }

    #[test]
    fn ipv6_ranges_are_rejected() {
        assert!(matches!(
            expand_range("2001:db8::/64"),
            Err(DiscoveryError::InvalidInput(_))
        ));
    }

    #[test]
    fn range_expansion_excludes_network_and_broadcast() {
        let hosts = expand_range("192.168.1.0/30").unwrap();
        assert_eq!(
            hosts,
            vec![
                Ipv4Addr::new(192, 168, 1, 1),
                Ipv4Addr::new(192, 168, 1, 2)
            ]
        );
    }

    #[test]
    fn tiny_prefixes_keep_all_addresses() {
        assert_eq!(expand_range("10.0.0.8/31").unwrap().len(), 2);
        assert_eq!(
            expand_range("10.0.0.8/32").unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 8)]
        );
    }
}
