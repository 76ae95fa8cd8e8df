use thiserror::Error;

/// Hard failures surfaced to the caller.
///
/// Everything else that can go wrong during a run (unreachable hosts, SNMP
/// timeouts, malformed responses) is recovered locally and never aborts the
/// discovery - the run returns the best partial graph it could build.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// Malformed caller input (seed address, CIDR range). Rejected before any
    /// probe is sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown export format name.
    #[error("unsupported export format: {0}")]
    Unsupported(String),
}

/// Convenience result alias for engine operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
