use std::time::Duration;

/// Per-run tunables for scanning and probing.
///
/// An engine instance is constructed with one of these per discovery run;
/// there is no shared mutable state between runs.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// SNMP community string (v2c).
    pub community: String,
    /// UDP port for SNMP agents.
    pub snmp_port: u16,
    /// Per-call SNMP timeout.
    pub probe_timeout: Duration,
    /// Additional attempts after a failed SNMP call.
    pub probe_retries: u32,
    /// Per-port timeout for TCP connect liveness probing.
    pub connect_timeout: Duration,
    /// Worker bound for the parallel TCP fallback scan.
    pub scan_concurrency: usize,
    /// How long the ARP sweep listens for replies per pass.
    pub arp_timeout: Duration,
    /// Name of the interface to sweep from; auto-selected when unset.
    pub scan_interface: Option<String>,
    /// Upper bound on neighbor candidates taken from a device's ARP table.
    pub max_address_table_neighbors: usize,
    /// How many critical nodes the centrality ranking returns.
    pub top_n: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
            snmp_port: 161,
            probe_timeout: Duration::from_secs(2),
            probe_retries: 1,
            connect_timeout: Duration::from_millis(500),
            scan_concurrency: 50,
            arp_timeout: Duration::from_secs(2),
            scan_interface: None,
            max_address_table_neighbors: 10,
            top_n: 5,
        }
    }
}
