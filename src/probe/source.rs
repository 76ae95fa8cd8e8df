/*!
Transport-neutral probing interface.

This module defines:
- `ProbeValue`: an owned replacement for `snmp2::Value`, kept free of
  transport lifetimes so results can travel through the engine.
- `ProbeOutcome`: the result of one probe call. Timeout, protocol error and
  absent data stay distinguishable at the type level, but all three collapse
  to "no data" through `value()` - by policy a misbehaving device degrades a
  run, it never aborts it.
- `DeviceProbe`: a tiny async trait over GET and WALK. The topology builder
  only ever talks to this trait, so tests drive it with an in-memory mock.
*/

use std::net::Ipv4Addr;

use async_trait::async_trait;

/// Owned scalar read from a device agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeValue {
    Integer(i64),
    OctetBytes(Vec<u8>),
    ObjectId(String),
    IpAddress(Ipv4Addr),
    Counter(u32),
    BigCounter(u64),
    Unsigned(u32),
    Timeticks(u32),
    Boolean(bool),
    Unknown,
}

impl ProbeValue {
    /// String rendering of textual and address values.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ProbeValue::OctetBytes(bytes) => {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                if text.is_empty() { None } else { Some(text) }
            }
            ProbeValue::ObjectId(oid) => Some(oid.clone()),
            ProbeValue::IpAddress(ip) => Some(ip.to_string()),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ProbeValue::Integer(i) if *i >= 0 => Some(*i as u64),
            ProbeValue::Counter(c) => Some(u64::from(*c)),
            ProbeValue::BigCounter(c) => Some(*c),
            ProbeValue::Unsigned(u) => Some(u64::from(*u)),
            ProbeValue::Timeticks(t) => Some(u64::from(*t)),
            _ => None,
        }
    }

    /// Interprets the value as an IPv4 address. Octet payloads are accepted
    /// only at exactly four bytes; short or long entries yield `None` rather
    /// than a truncated parse.
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            ProbeValue::IpAddress(ip) => Some(*ip),
            ProbeValue::OctetBytes(bytes) => {
                let octets: [u8; 4] = bytes.as_slice().try_into().ok()?;
                Some(Ipv4Addr::from(octets))
            }
            _ => None,
        }
    }
}

/// One row of a WALK: the OID components below the walked base, plus the
/// value stored there.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkRow {
    pub suffix: Vec<u64>,
    pub value: ProbeValue,
}

impl WalkRow {
    pub fn new(suffix: Vec<u64>, value: ProbeValue) -> Self {
        Self { suffix, value }
    }
}

/// Result of a single probe call. Callers cannot learn *why* data is missing
/// beyond the coarse kind - a documented limitation of the probe layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Value(T),
    /// The agent answered but has nothing at this OID.
    Absent,
    /// The call exceeded its timeout (after retries).
    Timeout,
    /// Transport failure or a malformed/unexpected response.
    ProtocolError,
}

impl<T> ProbeOutcome<T> {
    /// Collapses the three no-data outcomes to `None`.
    pub fn value(self) -> Option<T> {
        match self {
            ProbeOutcome::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, ProbeOutcome::Value(_))
    }
}

/// Async probing seam. `get` reads one scalar; `walk` enumerates a subtree in
/// order and stops at its first error indication, returning the rows read so
/// far (a failure before the first row reports the failure kind instead).
#[async_trait]
pub trait DeviceProbe: Send + Sync {
    async fn get(&self, ip: Ipv4Addr, oid: &str) -> ProbeOutcome<ProbeValue>;
    async fn walk(&self, ip: Ipv4Addr, base_oid: &str) -> ProbeOutcome<Vec<WalkRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_collapses_to_absent_data() {
        assert_eq!(ProbeOutcome::Value(1).value(), Some(1));
        assert_eq!(ProbeOutcome::<i32>::Absent.value(), None);
        assert_eq!(ProbeOutcome::<i32>::Timeout.value(), None);
        assert_eq!(ProbeOutcome::<i32>::ProtocolError.value(), None);
    }

    #[test]
    fn ipv4_decoding_validates_length() {
        let exact = ProbeValue::OctetBytes(vec![10, 0, 0, 7]);
        assert_eq!(exact.as_ipv4(), Some(Ipv4Addr::new(10, 0, 0, 7)));

        // short and long payloads are rejected, never truncated
        assert_eq!(ProbeValue::OctetBytes(vec![10, 0, 0]).as_ipv4(), None);
        assert_eq!(ProbeValue::OctetBytes(vec![10, 0, 0, 7, 9]).as_ipv4(), None);
        assert_eq!(ProbeValue::Integer(7).as_ipv4(), None);
    }

    #[test]
    fn text_rendering_trims_and_drops_empty() {
        assert_eq!(
            ProbeValue::OctetBytes(b" core-sw1 ".to_vec()).as_text(),
            Some("core-sw1".to_string())
        );
        assert_eq!(ProbeValue::OctetBytes(Vec::new()).as_text(), None);
        assert_eq!(ProbeValue::Integer(3).as_text(), None);
    }
}
