use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use pnet::datalink::{self, Channel, Config, MacAddr, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use tracing::debug;

const ETH_HDR_LEN: usize = 14;
const ARP_LEN: usize = 28;
const FRAME_LEN: usize = ETH_HDR_LEN + ARP_LEN;

/// How long one blocking read on the channel may stall before we re-check
/// the listen deadline.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

fn select_interface(preferred: Option<&str>) -> anyhow::Result<NetworkInterface> {
    let interfaces = datalink::interfaces();
    match preferred {
        Some(name) => interfaces
            .into_iter()
            .find(|iface| iface.name == name)
            .with_context(|| format!("interface {name} not found")),
        None => interfaces
            .into_iter()
            .find(|iface| {
                iface.is_up()
                    && !iface.is_loopback()
                    && iface.mac.is_some()
                    && iface.ips.iter().any(|ip| ip.is_ipv4())
            })
            .context("no usable IPv4 interface for the sweep"),
    }
}

fn interface_ipv4(interface: &NetworkInterface) -> anyhow::Result<Ipv4Addr> {
    interface
        .ips
        .iter()
        .find_map(|net| match net {
            IpNetwork::V4(v4) => Some(v4.ip()),
            _ => None,
        })
        .with_context(|| format!("interface {} has no IPv4 address", interface.name))
}

fn build_request(src_mac: MacAddr, src_ip: Ipv4Addr, target: Ipv4Addr) -> anyhow::Result<Vec<u8>> {
    let mut buffer = [0u8; FRAME_LEN];
    {
        let mut ethernet = MutableEthernetPacket::new(&mut buffer[..ETH_HDR_LEN])
            .context("failed to create ethernet header")?;
        ethernet.set_destination(MacAddr::broadcast());
        ethernet.set_source(src_mac);
        ethernet.set_ethertype(EtherTypes::Arp);
    }
    let mut arp = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..])
        .context("failed to create mutable ARP packet")?;
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(ArpOperations::Request);
    arp.set_sender_hw_addr(src_mac);
    arp.set_sender_proto_addr(src_ip);
    arp.set_target_hw_addr(MacAddr::zero());
    arp.set_target_proto_addr(target);
    Ok(buffer.to_vec())
}

fn parse_reply(frame: &[u8]) -> Option<(Ipv4Addr, MacAddr)> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(ethernet.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }
    Some((arp.get_sender_proto_addr(), arp.get_sender_hw_addr()))
}

/// Broadcasts an ARP request for every target and collects the replies.
/// Unanswered addresses get one retry pass. Fails only when no channel can
/// be opened at all (e.g. missing raw-socket privilege) - the caller then
/// drops to TCP connect probing.
pub fn sweep(
    targets: &[Ipv4Addr],
    preferred_interface: Option<&str>,
    listen: Duration,
) -> anyhow::Result<Vec<(Ipv4Addr, MacAddr)>> {
    let interface = select_interface(preferred_interface)?;
    let src_ip = interface_ipv4(&interface)?;
    let src_mac = interface.mac.context("interface has no MAC address")?;

    let config = Config {
        read_timeout: Some(READ_TIMEOUT),
        ..Config::default()
    };
    let (mut tx, mut rx) = match datalink::channel(&interface, config)
        .with_context(|| format!("opening datalink channel on {}", interface.name))?
    {
        Channel::Ethernet(tx, rx) => (tx, rx),
        _ => bail!("unsupported datalink channel type"),
    };
    debug!(interface = %interface.name, targets = targets.len(), "arp sweep started");

    let wanted: HashSet<Ipv4Addr> = targets.iter().copied().collect();
    let mut answered: BTreeMap<Ipv4Addr, MacAddr> = BTreeMap::new();

    for _pass in 0..2 {
        let pending: Vec<Ipv4Addr> = targets
            .iter()
            .copied()
            .filter(|target| !answered.contains_key(target))
            .collect();
        if pending.is_empty() {
            break;
        }
        for target in &pending {
            let frame = build_request(src_mac, src_ip, *target)?;
            tx.send_to(&frame, None);
        }

        let deadline = Instant::now() + listen;
        while Instant::now() < deadline {
            match rx.next() {
                Ok(frame) => {
                    if let Some((ip, mac)) = parse_reply(frame) {
                        if wanted.contains(&ip) {
                            answered.insert(ip, mac);
                        }
                    }
                }
                // read timeout; keep listening until the pass deadline
                Err(_) => {}
            }
        }
    }

    debug!(live = answered.len(), "arp sweep finished");
    Ok(answered.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frame_is_a_broadcast_arp_request() {
        let src_mac = MacAddr::new(0x01, 0x02, 0x03, 0x04, 0x05, 0x06);
        let src_ip = Ipv4Addr::new(192, 168, 1, 10);
        let target = Ipv4Addr::new(192, 168, 1, 77);

        let frame = build_request(src_mac, src_ip, target).expect("frame");
        let ethernet = EthernetPacket::new(&frame).expect("ethernet");
        assert_eq!(ethernet.get_destination(), MacAddr::broadcast());
        assert_eq!(ethernet.get_ethertype(), EtherTypes::Arp);

        let arp = ArpPacket::new(ethernet.payload()).expect("arp");
        assert_eq!(arp.get_operation(), ArpOperations::Request);
        assert_eq!(arp.get_sender_proto_addr(), src_ip);
        assert_eq!(arp.get_target_proto_addr(), target);
    }

    #[test]
    fn replies_are_parsed_and_requests_ignored() {
        let mac = MacAddr::new(0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22);
        let ip = Ipv4Addr::new(10, 1, 2, 3);

        let mut frame = build_request(mac, ip, Ipv4Addr::new(10, 1, 2, 4)).unwrap();
        // a request must not count as a live host
        assert_eq!(parse_reply(&frame), None);

        {
            let mut arp = MutableArpPacket::new(&mut frame[ETH_HDR_LEN..]).unwrap();
            arp.set_operation(ArpOperations::Reply);
        }
        assert_eq!(parse_reply(&frame), Some((ip, mac)));
    }

    #[test]
    fn non_arp_frames_are_ignored() {
        let mut frame = build_request(
            MacAddr::new(1, 2, 3, 4, 5, 6),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        )
        .unwrap();
        {
            let mut ethernet = MutableEthernetPacket::new(&mut frame).unwrap();
            ethernet.set_ethertype(EtherTypes::Ipv4);
        }
        assert_eq!(parse_reply(&frame), None);
    }
}
