//! Test constants shared by the fake hosts and the tests

/// API key every fake host accepts
pub const TEST_API_KEY: &str = "dGVzdDprZXk=";

/// A key no fake host accepts
pub const WRONG_API_KEY: &str = "d3Jvbmc6a2V5";

pub const TEST_INDEX: &str = "incidents-test";

pub const TEST_CLUSTER_NAME: &str = "fake-cluster";

// Timeouts
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;
