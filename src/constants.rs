/// Decimal places applied to formula results when no constraint overrides it.
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;

/// Snapshot generations kept per asset class during cleanup, in addition to
/// the active one.
pub const SNAPSHOT_RETENTION: usize = 2;

/// Timeout for provider HTTP calls, in seconds.
pub const PROVIDER_TIMEOUT_SECS: u64 = 10;
