#![allow(dead_code)]

//! Common test infrastructure
//!
//! Fake search cluster and agent host running in-process on random ports,
//! plus data builders. Tests should only import from this module.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeElastic, TEST_API_KEY};
//!
//! #[tokio::test]
//! async fn test_ingest() {
//!     let cluster = FakeElastic::spawn().await;
//!     // point an ElasticClient at cluster.base_url ...
//! }
//! ```

mod constants;
mod fake_agent;
mod fake_elastic;
mod fixtures;

pub use constants::*;
pub use fake_agent::FakeAgentHost;
pub use fake_elastic::FakeElastic;
#[allow(unused_imports)]
pub use fixtures::*;

use std::time::Duration;

/// Poll `base_url` until the server answers anything at all.
pub(crate) async fn wait_for_ready(base_url: &str) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .expect("Failed to build reqwest client");

    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

    loop {
        if start.elapsed() > timeout {
            panic!(
                "Server did not become ready within {}ms",
                SERVER_READY_TIMEOUT_MS
            );
        }

        match client.get(format!("{}/", base_url)).send().await {
            Ok(_) => return,
            Err(_) => {
                tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
            }
        }
    }
}
