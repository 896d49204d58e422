/// Constants used throughout the tether codebase
// Observability event names
pub const EVENT_CIRCUIT_STATE_CHANGED: &str = "circuit_breaker.state_changed";
pub const EVENT_CIRCUIT_REJECTED: &str = "circuit_breaker.rejected";
pub const EVENT_RETRY_ATTEMPT: &str = "retry.attempt";
pub const EVENT_RETRY_EXHAUSTED: &str = "retry.exhausted";
pub const EVENT_RACE_RESOLVED: &str = "race.resolved";
pub const EVENT_CACHE_HIT: &str = "cache.hit";
pub const EVENT_CACHE_MISS: &str = "cache.miss";
pub const EVENT_CACHE_STALE_FALLBACK: &str = "cache.stale_fallback";
pub const EVENT_CACHE_WRITE_FAILED: &str = "cache.write_failed";

// Environment variable names
pub const TETHER_CACHE_TTL_MS_VAR: &str = "TETHER_CACHE_TTL_MS";
pub const TETHER_RETRY_MAX_ATTEMPTS_VAR: &str = "TETHER_RETRY_MAX_ATTEMPTS";
pub const TETHER_RETRY_INITIAL_DELAY_MS_VAR: &str = "TETHER_RETRY_INITIAL_DELAY_MS";
pub const TETHER_BREAKER_FAILURE_THRESHOLD_VAR: &str = "TETHER_BREAKER_FAILURE_THRESHOLD";
pub const TETHER_BREAKER_RECOVERY_TIMEOUT_MS_VAR: &str = "TETHER_BREAKER_RECOVERY_TIMEOUT_MS";
pub const TETHER_LOG_VAR: &str = "TETHER_LOG";
