/*!
Narrow SNMP probing layer used by every higher component.

This module defines:
- `source`: `DeviceProbe`, a small async trait exposing GET and WALK without
            leaking transport types, plus the `ProbeOutcome`/`ProbeValue`
            types the rest of the engine consumes.
- `snmp`: `SnmpProbe`, the real SNMP v2c implementation over `snmp2`
          async sessions, with per-call timeout and retry handling.
- `oids`: the registry of OIDs the engine reads.

All per-call timeout/retry/error policy lives here; callers see either a
value or one of the "no data" outcomes and never an exception.
*/

#[cfg(test)]
pub mod mock;
pub mod oids;
pub mod snmp;
pub mod source;

pub use snmp::SnmpProbe;
pub use source::{DeviceProbe, ProbeOutcome, ProbeValue, WalkRow};
