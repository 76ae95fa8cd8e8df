/*!
Data model for discovered topologies.

This module defines:
- `node`: `NetworkNode` and the device type / role / interface enums.
- `link`: `NetworkLink` and `LinkType`, with unordered-pair identity.
- `graph`: `TopologyGraph` owning the node map, the link list and the
           derived adjacency index used by the analyzer.

A `TopologyGraph` is owned by exactly one discovery run and rebuilt from
nothing on every run; nothing in here persists between invocations.
*/

pub mod graph;
pub mod link;
pub mod node;

pub use graph::TopologyGraph;
pub use link::{LinkType, NetworkLink};
pub use node::{DeviceRole, DeviceType, InterfaceInfo, InterfaceKind, NetworkNode};
