use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::probe::source::{DeviceProbe, ProbeOutcome, ProbeValue, WalkRow};

/// Upper bound on rows read per WALK, for agents that answer GETNEXT forever
/// without ever leaving the subtree.
const MAX_WALK_ROWS: usize = 4096;

impl From<&Value<'_>> for ProbeValue {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(i) => ProbeValue::Integer(*i),
            Value::OctetString(bytes) => ProbeValue::OctetBytes(bytes.to_vec()),
            Value::ObjectIdentifier(oid) => ProbeValue::ObjectId(oid.to_string()),
            Value::IpAddress(octets) => ProbeValue::IpAddress(Ipv4Addr::from(*octets)),
            Value::Counter32(c) => ProbeValue::Counter(*c),
            Value::Counter64(c) => ProbeValue::BigCounter(*c),
            Value::Unsigned32(u) => ProbeValue::Unsigned(*u),
            Value::Timeticks(t) => ProbeValue::Timeticks(*t),
            Value::Boolean(b) => ProbeValue::Boolean(*b),
            _ => ProbeValue::Unknown,
        }
    }
}

fn is_exception(value: &Value<'_>) -> bool {
    matches!(
        value,
        Value::EndOfMibView | Value::NoSuchObject | Value::NoSuchInstance
    )
}

/// Outcome of one GETNEXT step inside a walk.
enum NextStep {
    Row(Vec<u64>, ProbeValue),
    End,
    Timeout,
    Error,
}

/// SNMP v2c probe. Sessions are opened lazily, one per target host, and kept
/// for the lifetime of the probe (one discovery run).
pub struct SnmpProbe {
    community: String,
    port: u16,
    timeout: Duration,
    retries: u32,
    sessions: Mutex<HashMap<Ipv4Addr, Arc<Mutex<AsyncSession>>>>,
}

impl SnmpProbe {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            community: config.community.clone(),
            port: config.snmp_port,
            timeout: config.probe_timeout,
            retries: config.probe_retries,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn session(&self, ip: Ipv4Addr) -> Option<Arc<Mutex<AsyncSession>>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&ip) {
            return Some(session.clone());
        }
        let address = SocketAddr::new(IpAddr::V4(ip), self.port);
        match AsyncSession::new_v2c(address, self.community.as_bytes(), 0).await {
            Ok(session) => {
                let session = Arc::new(Mutex::new(session));
                sessions.insert(ip, session.clone());
                Some(session)
            }
            Err(e) => {
                debug!(%ip, error = %e, "failed to open snmp session");
                None
            }
        }
    }

    async fn next_step(&self, session: &Arc<Mutex<AsyncSession>>, oid: &Oid<'_>) -> NextStep {
        let mut last = NextStep::Timeout;
        for _ in 0..=self.retries {
            let mut guard = session.lock().await;
            match tokio::time::timeout(self.timeout, guard.getnext(oid)).await {
                Err(_) => last = NextStep::Timeout,
                Ok(Err(_)) => last = NextStep::Error,
                Ok(Ok(pdu)) => {
                    return match pdu.varbinds.into_iter().next() {
                        None => NextStep::End,
                        Some((_, value)) if is_exception(&value) => NextStep::End,
                        Some((oid, value)) => match oid.iter() {
                            Some(components) => {
                                NextStep::Row(components.collect(), ProbeValue::from(&value))
                            }
                            None => NextStep::End,
                        },
                    };
                }
            }
        }
        last
    }
}

#[async_trait]
impl DeviceProbe for SnmpProbe {
    async fn get(&self, ip: Ipv4Addr, oid: &str) -> ProbeOutcome<ProbeValue> {
        let oid = match Oid::from_str(oid) {
            Ok(oid) => oid,
            Err(_) => return ProbeOutcome::ProtocolError,
        };
        let Some(session) = self.session(ip).await else {
            return ProbeOutcome::ProtocolError;
        };

        let mut last = ProbeOutcome::Timeout;
        for _ in 0..=self.retries {
            let mut guard = session.lock().await;
            match tokio::time::timeout(self.timeout, guard.get(&oid)).await {
                Err(_) => last = ProbeOutcome::Timeout,
                Ok(Err(e)) => {
                    debug!(%ip, error = ?e, "snmp get failed");
                    last = ProbeOutcome::ProtocolError;
                }
                Ok(Ok(pdu)) => {
                    return match pdu.varbinds.into_iter().next() {
                        Some((_, value)) if is_exception(&value) => ProbeOutcome::Absent,
                        Some((_, value)) => ProbeOutcome::Value(ProbeValue::from(&value)),
                        None => ProbeOutcome::Absent,
                    };
                }
            }
        }
        last
    }

    async fn walk(&self, ip: Ipv4Addr, base_oid: &str) -> ProbeOutcome<Vec<WalkRow>> {
        let base = match Oid::from_str(base_oid) {
            Ok(oid) => oid,
            Err(_) => return ProbeOutcome::ProtocolError,
        };
        let Some(base_components) = base.iter().map(|c| c.collect::<Vec<u64>>()) else {
            return ProbeOutcome::ProtocolError;
        };
        let Some(session) = self.session(ip).await else {
            return ProbeOutcome::ProtocolError;
        };

        let mut rows: Vec<WalkRow> = Vec::new();
        let mut current = base;
        let mut current_components = base_components.clone();

        loop {
            let (components, value) = match self.next_step(&session, &current).await {
                NextStep::Row(components, value) => (components, value),
                NextStep::End => break,
                NextStep::Timeout => {
                    if rows.is_empty() {
                        return ProbeOutcome::Timeout;
                    }
                    debug!(%ip, oid = base_oid, "walk timed out mid-table");
                    break;
                }
                NextStep::Error => {
                    if rows.is_empty() {
                        return ProbeOutcome::ProtocolError;
                    }
                    debug!(%ip, oid = base_oid, "walk aborted mid-table");
                    break;
                }
            };

            // Stop on leaving the base subtree, and on non-increasing OIDs so
            // a broken agent cannot loop us or walk us into unrelated tables.
            if components.len() <= base_components.len()
                || components[..base_components.len()] != base_components[..]
            {
                break;
            }
            if components <= current_components {
                break;
            }

            rows.push(WalkRow::new(
                components[base_components.len()..].to_vec(),
                value,
            ));
            if rows.len() >= MAX_WALK_ROWS {
                break;
            }
            current = match Oid::from(&components) {
                Ok(oid) => oid,
                Err(_) => break,
            };
            current_components = components;
        }

        ProbeOutcome::Value(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversion_keeps_raw_octets() {
        let value = Value::OctetString(&[192, 168, 0, 1]);
        assert_eq!(
            ProbeValue::from(&value),
            ProbeValue::OctetBytes(vec![192, 168, 0, 1])
        );
    }

    #[test]
    fn exception_values_are_detected() {
        assert!(is_exception(&Value::EndOfMibView));
        assert!(is_exception(&Value::NoSuchObject));
        assert!(is_exception(&Value::NoSuchInstance));
        assert!(!is_exception(&Value::Integer(0)));
    }
}
