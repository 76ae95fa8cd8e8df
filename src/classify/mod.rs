/*!
Device classification.

Maps a raw system description to (device type, vendor), and a hostname plus
device type to a topology role. Classification is an ordered list of keyword
rules evaluated top-down with case-insensitive substring matching - the first
match wins, which keeps the outcome deterministic and lets each rule be
tested on its own.
*/

use once_cell::sync::Lazy;

use crate::model::{DeviceRole, DeviceType};

struct VendorRule {
    vendor: &'static str,
    keywords: &'static [&'static str],
}

/// Vendor rules in evaluation order.
static VENDOR_RULES: Lazy<Vec<VendorRule>> = Lazy::new(|| {
    vec![
        VendorRule { vendor: "Cisco", keywords: &["cisco", "ios", "catalyst"] },
        VendorRule { vendor: "Juniper", keywords: &["juniper", "junos"] },
        VendorRule { vendor: "Arista", keywords: &["arista", "eos"] },
        VendorRule { vendor: "HP", keywords: &["hp", "procurve", "aruba"] },
        VendorRule { vendor: "Dell", keywords: &["dell", "force10"] },
        VendorRule { vendor: "MikroTik", keywords: &["mikrotik", "routeros"] },
    ]
});

/// Device-type rules in priority order: switch > router > firewall >
/// access point > generic network device.
static TYPE_RULES: Lazy<Vec<(DeviceType, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (DeviceType::Switch, &["switch", "catalyst"] as &[&str]),
        (DeviceType::Router, &["router", "ios xr", "routeros"]),
        (DeviceType::Firewall, &["firewall", "asa", "pix", "srx"]),
        (DeviceType::AccessPoint, &["access point", "wireless"]),
    ]
});

fn match_type(description: &str) -> Option<DeviceType> {
    TYPE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| description.contains(k)))
        .map(|(device_type, _)| *device_type)
}

/// Classifies a system description into (device type, vendor). An unmatched
/// description yields (unknown, "unknown").
pub fn classify(sys_descr: &str) -> (DeviceType, String) {
    let description = sys_descr.to_lowercase();

    for rule in VENDOR_RULES.iter() {
        if rule.keywords.iter().any(|k| description.contains(k)) {
            let device_type = match_type(&description).unwrap_or(DeviceType::NetworkDevice);
            return (device_type, rule.vendor.to_string());
        }
    }

    // No vendor matched; generic type keywords still count.
    match match_type(&description) {
        Some(device_type) => (device_type, "unknown".to_string()),
        None => (DeviceType::Unknown, "unknown".to_string()),
    }
}

/// Resolves the topology role from hostname markers, falling back to a
/// per-device-type default and finally to access.
pub fn determine_role(hostname: &str, device_type: DeviceType) -> DeviceRole {
    let hostname = hostname.to_lowercase();

    let hostname_rules: [(&[&str], DeviceRole); 4] = [
        (&["core", "backbone"], DeviceRole::Core),
        (&["dist"], DeviceRole::Distribution),
        (&["access", "acc"], DeviceRole::Access),
        (&["edge", "dmz", "internet"], DeviceRole::Edge),
    ];
    for (keywords, role) in hostname_rules {
        if keywords.iter().any(|k| hostname.contains(k)) {
            return role;
        }
    }

    match device_type {
        DeviceType::Router | DeviceType::Firewall => DeviceRole::Edge,
        _ => DeviceRole::Access,
    }
}

/// Coarse fallback used when a host never answered SNMP identification:
/// infers a device type from the service ports seen open during scanning.
pub fn classify_by_services(open_ports: &[u16]) -> DeviceType {
    if open_ports.contains(&161) {
        // An SNMP agent that refused our community is still network gear.
        return DeviceType::NetworkDevice;
    }
    if open_ports.contains(&22) || open_ports.contains(&23) {
        return DeviceType::NetworkDevice;
    }
    DeviceType::Unknown
}
