//! OIDs read during discovery. Scalars carry the trailing `.0`; the rest are
//! table columns reached by WALK.

pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";
pub const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";
pub const SYS_UPTIME: &str = "1.3.6.1.2.1.1.3.0";
pub const SYS_NAME: &str = "1.3.6.1.2.1.1.5.0";
pub const SYS_LOCATION: &str = "1.3.6.1.2.1.1.6.0";

/// ifDescr / ifSpeed / ifOperStatus columns of the interface table.
pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
pub const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
pub const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";

/// Cisco CDP cache columns: neighbor address, device id, remote port.
/// Suffix is (ifIndex, cacheEntryIndex).
pub const CDP_CACHE_ADDRESS: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.4";
pub const CDP_CACHE_DEVICE_PORT: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.7";

/// LLDP remote-systems management address column.
pub const LLDP_REM_MGMT_ADDR: &str = "1.0.8802.1.1.2.1.4.1.1.8";

/// ipNetToMediaPhysAddress: the ARP cache. Suffix is ifIndex followed by the
/// four octets of the neighbor address.
pub const ARP_PHYS_ADDRESS: &str = "1.3.6.1.2.1.4.22.1.2";

/// Cisco vtpVlanState: suffix ends in the VLAN id.
pub const VLAN_STATE: &str = "1.3.6.1.4.1.9.9.46.1.3.1.1.2";
