use serde::{Deserialize, Serialize};

/// Kind of a discovered link, inferred from interface naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Trunk,
    Access,
    Aggregate,
    Uplink,
    Crossconnect,
    Wireless,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Trunk => "trunk",
            LinkType::Access => "access",
            LinkType::Aggregate => "aggregate",
            LinkType::Uplink => "uplink",
            LinkType::Crossconnect => "crossconnect",
            LinkType::Wireless => "wireless",
        }
    }

    /// First-match-wins inference from the two interface names.
    pub fn infer(local_interface: &str, remote_interface: &str) -> Self {
        let local = local_interface.to_lowercase();
        let remote = remote_interface.to_lowercase();
        if local.contains("trunk") || remote.contains("trunk") {
            return LinkType::Trunk;
        }
        if ["gi0/0", "te", "fo", "uplink"].iter().any(|p| local.contains(p)) {
            return LinkType::Uplink;
        }
        if local.contains("po") || local.contains("port-channel") {
            return LinkType::Aggregate;
        }
        LinkType::Access
    }
}

/// A link between two discovered nodes. The endpoint pair is unordered:
/// (A, B) and (B, A) identify the same link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source_id: String,
    pub target_id: String,
    pub source_interface: String,
    pub target_interface: String,
    pub link_type: LinkType,
    pub speed_bps: Option<u64>,
    pub vlans: Vec<u16>,
    pub status: String,
}

impl NetworkLink {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            source_interface: String::new(),
            target_interface: String::new(),
            link_type: LinkType::Access,
            speed_bps: None,
            vlans: Vec::new(),
            status: "up".to_string(),
        }
    }

    /// Whether this link joins the same unordered endpoint pair as `other`.
    pub fn same_endpoints(&self, other: &NetworkLink) -> bool {
        (self.source_id == other.source_id && self.target_id == other.target_id)
            || (self.source_id == other.target_id && self.target_id == other.source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_identity_is_unordered() {
        let ab = NetworkLink::new("10.0.0.1", "10.0.0.2");
        let ba = NetworkLink::new("10.0.0.2", "10.0.0.1");
        let ac = NetworkLink::new("10.0.0.1", "10.0.0.3");
        assert!(ab.same_endpoints(&ba));
        assert!(ab.same_endpoints(&ab));
        assert!(!ab.same_endpoints(&ac));
    }

    #[test]
    fn link_type_inference_is_first_match_wins() {
        assert_eq!(LinkType::infer("Gi1/0/1-trunk", ""), LinkType::Trunk);
        assert_eq!(LinkType::infer("Gi1/0/1", "trunk-port"), LinkType::Trunk);
        assert_eq!(LinkType::infer("Te1/0/1", ""), LinkType::Uplink);
        assert_eq!(LinkType::infer("uplink-to-core", ""), LinkType::Uplink);
        assert_eq!(LinkType::infer("Po1", ""), LinkType::Aggregate);
        assert_eq!(LinkType::infer("Gi1/0/12", ""), LinkType::Access);
        // trunk outranks the uplink pattern on the same name
        assert_eq!(LinkType::infer("Te1/1-trunk", ""), LinkType::Trunk);
    }
}
