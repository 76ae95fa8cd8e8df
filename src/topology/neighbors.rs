/*!
Neighbor-relationship discovery.

Three sources are tried in a fixed fallback order and the first one that
yields anything wins - sources are never merged:

1. the vendor neighbor cache (CDP),
2. the standard neighbor table (LLDP management addresses),
3. candidates derived from the device's ARP cache, capped to a small count
   so one chatty access switch cannot explode the crawl frontier.

Entries carry whatever link context the source had: the local interface index
and, for the vendor cache, the remote port name. The ARP-derived fallback
knows neither remote interface nor that the candidate is really adjacent -
it is a last resort.
*/

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use tracing::debug;

use crate::probe::oids;
use crate::probe::source::DeviceProbe;

/// One neighbor candidate with the link context its source provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub ip: Ipv4Addr,
    pub local_if_index: Option<u64>,
    pub remote_port: Option<String>,
}

/// Which source of the fallback chain produced the neighbor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborSource {
    VendorCache,
    StandardTable,
    AddressTable,
}

/// Addresses that can never be a crawlable neighbor.
fn usable(candidate: Ipv4Addr, device: Ipv4Addr) -> bool {
    candidate != device
        && !candidate.is_unspecified()
        && !candidate.is_loopback()
        && !candidate.is_multicast()
        && !candidate.is_broadcast()
}

fn push_unique(entries: &mut Vec<NeighborEntry>, entry: NeighborEntry) {
    if !entries.iter().any(|existing| existing.ip == entry.ip) {
        entries.push(entry);
    }
}

/// Runs the fallback chain for one device.
pub async fn discover<P: DeviceProbe + ?Sized>(
    probe: &P,
    device: Ipv4Addr,
    address_table_cap: usize,
) -> (Vec<NeighborEntry>, Option<NeighborSource>) {
    let vendor = vendor_cache(probe, device).await;
    if !vendor.is_empty() {
        return (vendor, Some(NeighborSource::VendorCache));
    }

    let standard = standard_table(probe, device).await;
    if !standard.is_empty() {
        return (standard, Some(NeighborSource::StandardTable));
    }

    let derived = address_table(probe, device, address_table_cap).await;
    if derived.is_empty() {
        debug!(ip = %device, "no neighbor source yielded candidates");
        (Vec::new(), None)
    } else {
        (derived, Some(NeighborSource::AddressTable))
    }
}

/// CDP cache. The address column stores the neighbor management address as a
/// raw octet payload; entries whose payload is not exactly four bytes are
/// skipped rather than truncated.
async fn vendor_cache<P: DeviceProbe + ?Sized>(probe: &P, device: Ipv4Addr) -> Vec<NeighborEntry> {
    let rows = probe
        .walk(device, oids::CDP_CACHE_ADDRESS)
        .await
        .value()
        .unwrap_or_default();

    let mut addresses: Vec<(Vec<u64>, Ipv4Addr)> = Vec::new();
    for row in rows {
        if let Some(ip) = row.value.as_ipv4() {
            if usable(ip, device) {
                addresses.push((row.suffix, ip));
            }
        }
    }
    if addresses.is_empty() {
        return Vec::new();
    }

    // Remote port names live in a second column keyed by the same suffix;
    // only read it once we know the cache has addresses at all.
    let ports: BTreeMap<Vec<u64>, String> = probe
        .walk(device, oids::CDP_CACHE_DEVICE_PORT)
        .await
        .value()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|row| row.value.as_text().map(|text| (row.suffix, text)))
        .collect();

    let mut entries = Vec::new();
    for (suffix, ip) in addresses {
        push_unique(
            &mut entries,
            NeighborEntry {
                ip,
                local_if_index: suffix.first().copied(),
                remote_port: ports.get(&suffix).cloned(),
            },
        );
    }
    entries.sort_by_key(|entry| entry.ip);
    entries
}

/// LLDP remote management addresses. Agents return these either as dotted
/// strings or as raw 4-octet payloads; both are accepted, anything else is
/// ignored.
async fn standard_table<P: DeviceProbe + ?Sized>(
    probe: &P,
    device: Ipv4Addr,
) -> Vec<NeighborEntry> {
    let rows = probe
        .walk(device, oids::LLDP_REM_MGMT_ADDR)
        .await
        .value()
        .unwrap_or_default();

    let mut entries = Vec::new();
    for row in rows {
        let candidate = row
            .value
            .as_text()
            .and_then(|text| text.parse::<Ipv4Addr>().ok())
            .or_else(|| row.value.as_ipv4());
        let Some(ip) = candidate else { continue };
        if !usable(ip, device) {
            continue;
        }
        push_unique(
            &mut entries,
            NeighborEntry {
                ip,
                // lldpRemEntry index is (timeMark, localPortNum, remIndex)
                local_if_index: row.suffix.get(1).copied(),
                remote_port: None,
            },
        );
    }
    entries.sort_by_key(|entry| entry.ip);
    entries
}

/// ARP-cache fallback: the entry index embeds ifIndex plus the four octets
/// of the neighbor address.
async fn address_table<P: DeviceProbe + ?Sized>(
    probe: &P,
    device: Ipv4Addr,
    cap: usize,
) -> Vec<NeighborEntry> {
    let rows = probe
        .walk(device, oids::ARP_PHYS_ADDRESS)
        .await
        .value()
        .unwrap_or_default();

    let mut entries = Vec::new();
    for row in rows {
        if row.suffix.len() < 5 {
            continue;
        }
        let octets = &row.suffix[row.suffix.len() - 4..];
        if octets.iter().any(|component| *component > 255) {
            continue;
        }
        let ip = Ipv4Addr::new(
            octets[0] as u8,
            octets[1] as u8,
            octets[2] as u8,
            octets[3] as u8,
        );
        if !usable(ip, device) {
            continue;
        }
        push_unique(
            &mut entries,
            NeighborEntry {
                ip,
                local_if_index: row.suffix.first().copied(),
                remote_port: None,
            },
        );
    }
    entries.sort_by_key(|entry| entry.ip);
    entries.truncate(cap);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeValue;
    use crate::probe::mock::MockProbe;
    use crate::probe::source::WalkRow;

    fn addr(text: &str) -> Ipv4Addr {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn vendor_cache_wins_over_other_sources() {
        let mut probe = MockProbe::new();
        probe.cdp_neighbors("10.0.0.1", &["10.0.0.2"]);
        probe.lldp_neighbors("10.0.0.1", &["10.0.0.3"]);
        probe.arp_neighbors("10.0.0.1", &["10.0.0.4"]);

        let (entries, source) = discover(&probe, addr("10.0.0.1"), 10).await;
        assert_eq!(source, Some(NeighborSource::VendorCache));
        assert_eq!(
            entries.iter().map(|e| e.ip).collect::<Vec<_>>(),
            vec![addr("10.0.0.2")]
        );
    }

    #[tokio::test]
    async fn standard_table_is_used_when_vendor_cache_is_empty() {
        let mut probe = MockProbe::new();
        probe.lldp_neighbors("10.0.0.1", &["10.0.0.3", "10.0.0.2"]);
        probe.arp_neighbors("10.0.0.1", &["10.0.0.4"]);

        let (entries, source) = discover(&probe, addr("10.0.0.1"), 10).await;
        assert_eq!(source, Some(NeighborSource::StandardTable));
        assert_eq!(
            entries.iter().map(|e| e.ip).collect::<Vec<_>>(),
            vec![addr("10.0.0.2"), addr("10.0.0.3")]
        );
    }

    #[tokio::test]
    async fn address_table_fallback_is_capped() {
        let mut probe = MockProbe::new();
        let many: Vec<String> = (1..=15).map(|i| format!("172.16.0.{i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        probe.arp_neighbors("10.0.0.1", &refs);

        let (entries, source) = discover(&probe, addr("10.0.0.1"), 10).await;
        assert_eq!(source, Some(NeighborSource::AddressTable));
        assert_eq!(entries.len(), 10);
    }

    #[tokio::test]
    async fn short_vendor_address_payloads_are_skipped() {
        let mut probe = MockProbe::new();
        probe.table(
            "10.0.0.1",
            oids::CDP_CACHE_ADDRESS,
            vec![
                // three bytes: incomplete address, must not be truncated-parsed
                WalkRow::new(vec![1, 1], ProbeValue::OctetBytes(vec![10, 0, 0])),
                WalkRow::new(vec![2, 1], ProbeValue::OctetBytes(vec![10, 0, 0, 9])),
            ],
        );

        let (entries, _) = discover(&probe, addr("10.0.0.1"), 10).await;
        assert_eq!(
            entries.iter().map(|e| e.ip).collect::<Vec<_>>(),
            vec![addr("10.0.0.9")]
        );
    }

    #[tokio::test]
    async fn self_and_special_addresses_are_rejected() {
        let mut probe = MockProbe::new();
        probe.cdp_neighbors("10.0.0.1", &["10.0.0.1", "127.0.0.1", "0.0.0.0", "10.0.0.5"]);

        let (entries, _) = discover(&probe, addr("10.0.0.1"), 10).await;
        assert_eq!(
            entries.iter().map(|e| e.ip).collect::<Vec<_>>(),
            vec![addr("10.0.0.5")]
        );
    }

    #[tokio::test]
    async fn remote_port_names_are_joined_by_suffix() {
        let mut probe = MockProbe::new();
        probe.cdp_neighbors("10.0.0.1", &["10.0.0.2"]);
        probe.table(
            "10.0.0.1",
            oids::CDP_CACHE_DEVICE_PORT,
            vec![WalkRow::new(
                vec![1, 1],
                ProbeValue::OctetBytes(b"GigabitEthernet0/24".to_vec()),
            )],
        );

        let (entries, _) = discover(&probe, addr("10.0.0.1"), 10).await;
        assert_eq!(
            entries[0].remote_port.as_deref(),
            Some("GigabitEthernet0/24")
        );
        assert_eq!(entries[0].local_if_index, Some(1));
    }
}
