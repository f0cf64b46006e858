//! Shared constants for end-to-end tests
//!
//! Timing knobs for the mock SpinWish server and the endpoints it exposes
//! only for failure-injection tests.

// ============================================================================
// Server lifecycle
// ============================================================================

/// Maximum time to wait for the mock server to accept requests
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

// ============================================================================
// Harness settings
// ============================================================================

/// Request timeout used by the harness client in tests
pub const CLIENT_TIMEOUT_SEC: u64 = 5;

/// Password given to every generated identity
pub const TEST_PASSWORD: &str = "password123";

/// Email domain of generated identities
pub const TEST_EMAIL_DOMAIN: &str = "spinwish.com";

// ============================================================================
// Failure injection
// ============================================================================

/// Answers only after `SLOW_RESPONSE_MS`
pub const SLOW_PATH: &str = "/api/v1/slow";

/// Answers 200 with an HTML body
pub const GARBLED_PATH: &str = "/api/v1/garbled";

/// How long `SLOW_PATH` takes to answer
pub const SLOW_RESPONSE_MS: u64 = 3000;
