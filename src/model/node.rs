use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Device category derived from the system description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Switch,
    Router,
    Firewall,
    AccessPoint,
    NetworkDevice,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Switch => "switch",
            DeviceType::Router => "router",
            DeviceType::Firewall => "firewall",
            DeviceType::AccessPoint => "access_point",
            DeviceType::NetworkDevice => "network_device",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Structural role a device plays in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    Core,
    Distribution,
    Access,
    Edge,
    Server,
    Endpoint,
}

impl DeviceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceRole::Core => "core",
            DeviceRole::Distribution => "distribution",
            DeviceRole::Access => "access",
            DeviceRole::Edge => "edge",
            DeviceRole::Server => "server",
            DeviceRole::Endpoint => "endpoint",
        }
    }
}

/// Coarse interface category derived from the interface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    Ethernet,
    FastEthernet,
    TenGigabit,
    Vlan,
    Loopback,
    Unknown,
}

impl InterfaceKind {
    /// First-match classification on the lowercased interface name. Prefix
    /// matching, not substring: "FastEthernet" must not hit the plain
    /// ethernet rule.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| lower.starts_with(p));
        if starts(&["te", "tengig"]) {
            InterfaceKind::TenGigabit
        } else if starts(&["fa", "fast"]) {
            InterfaceKind::FastEthernet
        } else if starts(&["gi", "gig", "eth"]) {
            InterfaceKind::Ethernet
        } else if starts(&["vlan"]) {
            InterfaceKind::Vlan
        } else if starts(&["lo"]) {
            InterfaceKind::Loopback
        } else {
            InterfaceKind::Unknown
        }
    }
}

/// Per-interface attributes read from the interface table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub index: u64,
    pub kind: InterfaceKind,
    pub status: String,
    pub speed_bps: Option<u64>,
}

/// A discovered device. Identity is the IP address string; a node is created
/// once per run when the device first answers identification probing and may
/// be enriched afterwards, but never created twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub ip_address: String,
    pub hostname: String,
    pub device_type: DeviceType,
    pub role: DeviceRole,
    pub vendor: String,
    pub mac_address: Option<String>,
    pub location: Option<String>,
    pub sys_object_id: Option<String>,
    pub uptime_ticks: Option<u32>,
    pub vlans: Vec<u16>,
    pub interfaces: BTreeMap<String, InterfaceInfo>,
}

impl NetworkNode {
    pub fn new(ip: Ipv4Addr) -> Self {
        let ip_string = ip.to_string();
        Self {
            id: ip_string.clone(),
            hostname: format!("device-{ip_string}"),
            ip_address: ip_string,
            device_type: DeviceType::Unknown,
            role: DeviceRole::Access,
            vendor: "unknown".to_string(),
            mac_address: None,
            location: None,
            sys_object_id: None,
            uptime_ticks: None,
            vlans: Vec::new(),
            interfaces: BTreeMap::new(),
        }
    }

    /// Records a VLAN membership. Ids outside 1..=4094 are rejected, as are
    /// duplicates; the list stays sorted.
    pub fn add_vlan(&mut self, vlan_id: u16) -> bool {
        if !(1..=4094).contains(&vlan_id) {
            return false;
        }
        match self.vlans.binary_search(&vlan_id) {
            Ok(_) => false,
            Err(pos) => {
                self.vlans.insert(pos, vlan_id);
                true
            }
        }
    }
}
