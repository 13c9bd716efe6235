//! Shared constants for the integration tests.

// ============================================================================
// Store
// ============================================================================

/// Environment variable holding a PostgreSQL connection string. The
/// PostgreSQL suite is skipped when it is unset.
pub const POSTGRES_ENV_VAR: &str = "ALBUM_STORE_TEST_POSTGRES";

/// Number of threads racing to insert the same album.
pub const CONCURRENT_WRITERS: usize = 8;

/// Title and artist of the album the original walkthrough inserts.
pub const DEMO_TITLE: &str = "The Modern Sound of Betty Carter";
pub const DEMO_ARTIST: &str = "Betty Carter";
pub const DEMO_PRICE: &str = "49.99";

// ============================================================================
// HTTP front
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout for individual HTTP requests in tests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
