//! In-memory `DeviceProbe` used by unit tests: a mock network described as
//! per-host scalar and table maps, with optional unreachable hosts.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::probe::oids;
use crate::probe::source::{DeviceProbe, ProbeOutcome, ProbeValue, WalkRow};

#[derive(Default)]
pub struct MockProbe {
    scalars: HashMap<(Ipv4Addr, String), ProbeValue>,
    tables: HashMap<(Ipv4Addr, String), Vec<WalkRow>>,
    pub unreachable: HashSet<Ipv4Addr>,
}

fn ip(text: &str) -> Ipv4Addr {
    text.parse().expect("test address")
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(&mut self, host: &str, oid: &str, value: ProbeValue) {
        self.scalars.insert((ip(host), oid.to_string()), value);
    }

    pub fn text(&mut self, host: &str, oid: &str, text: &str) {
        self.scalar(host, oid, ProbeValue::OctetBytes(text.as_bytes().to_vec()));
    }

    pub fn table(&mut self, host: &str, base_oid: &str, rows: Vec<WalkRow>) {
        self.tables.insert((ip(host), base_oid.to_string()), rows);
    }

    /// Registers a host that answers identification probing.
    pub fn device(&mut self, host: &str, sys_name: &str, sys_descr: &str) {
        self.text(host, oids::SYS_NAME, sys_name);
        self.text(host, oids::SYS_DESCR, sys_descr);
    }

    /// Fills the host's CDP cache with the given neighbor addresses.
    pub fn cdp_neighbors(&mut self, host: &str, neighbors: &[&str]) {
        let rows = neighbors
            .iter()
            .enumerate()
            .map(|(i, neighbor)| {
                WalkRow::new(
                    vec![i as u64 + 1, 1],
                    ProbeValue::OctetBytes(ip(neighbor).octets().to_vec()),
                )
            })
            .collect();
        self.table(host, oids::CDP_CACHE_ADDRESS, rows);
    }

    /// Fills the host's LLDP management-address column with dotted strings.
    pub fn lldp_neighbors(&mut self, host: &str, neighbors: &[&str]) {
        let rows = neighbors
            .iter()
            .enumerate()
            .map(|(i, neighbor)| {
                WalkRow::new(
                    vec![0, i as u64 + 1, 1],
                    ProbeValue::OctetBytes(neighbor.as_bytes().to_vec()),
                )
            })
            .collect();
        self.table(host, oids::LLDP_REM_MGMT_ADDR, rows);
    }

    /// Fills the host's ARP cache with the given addresses.
    pub fn arp_neighbors(&mut self, host: &str, neighbors: &[&str]) {
        let rows = neighbors
            .iter()
            .map(|neighbor| {
                let octets = ip(neighbor).octets();
                let mut suffix = vec![1u64];
                suffix.extend(octets.iter().map(|o| u64::from(*o)));
                WalkRow::new(suffix, ProbeValue::OctetBytes(vec![0, 1, 2, 3, 4, 5]))
            })
            .collect();
        self.table(host, oids::ARP_PHYS_ADDRESS, rows);
    }

    pub fn vlans(&mut self, host: &str, vlan_ids: &[u64]) {
        let rows = vlan_ids
            .iter()
            .map(|id| WalkRow::new(vec![1, *id], ProbeValue::Integer(1)))
            .collect();
        self.table(host, oids::VLAN_STATE, rows);
    }

    pub fn interfaces(&mut self, host: &str, names: &[&str]) {
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                WalkRow::new(
                    vec![i as u64 + 1],
                    ProbeValue::OctetBytes(name.as_bytes().to_vec()),
                )
            })
            .collect();
        self.table(host, oids::IF_DESCR, rows);
    }
}

#[async_trait]
impl DeviceProbe for MockProbe {
    async fn get(&self, ip: Ipv4Addr, oid: &str) -> ProbeOutcome<ProbeValue> {
        if self.unreachable.contains(&ip) {
            return ProbeOutcome::Timeout;
        }
        match self.scalars.get(&(ip, oid.to_string())) {
            Some(value) => ProbeOutcome::Value(value.clone()),
            None => ProbeOutcome::Absent,
        }
    }

    async fn walk(&self, ip: Ipv4Addr, base_oid: &str) -> ProbeOutcome<Vec<WalkRow>> {
        if self.unreachable.contains(&ip) {
            return ProbeOutcome::Timeout;
        }
        ProbeOutcome::Value(
            self.tables
                .get(&(ip, base_oid.to_string()))
                .cloned()
                .unwrap_or_default(),
        )
    }
}
