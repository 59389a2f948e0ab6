//! Shared constants for end-to-end tests
//!
//! When test data changes (keys, limits, payloads), update only this file.

#![allow(dead_code)]

// ============================================================================
// Authentication
// ============================================================================

/// API key every test server is configured with unless a test opts out
pub const TEST_API_KEY: &str = "e2e-test-key";

// ============================================================================
// Upload limits and payloads
// ============================================================================

/// Upload cap configured on test servers (64 KiB)
pub const TEST_MAX_UPLOAD_BYTES: u64 = 64 * 1024;

/// Size of the fake MP3 payload produced by the fixtures
pub const FAKE_MP3_SIZE_BYTES: usize = 4096;

// ============================================================================
// Test Timeouts
// ============================================================================

/// Maximum time to wait for test server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Default timeout for HTTP requests in tests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
