#![allow(dead_code)]

use std::time::Duration;

use quill_common::resilience::{FixedJitter, MockClock};
use quill_infra::{ApiClient, ClientConfig, ClientConfigBuilder};
use wiremock::MockServer;

/// Config pointed at `server` with short delays so retry tests stay fast.
pub fn config_for(server: &MockServer) -> ClientConfigBuilder {
    ClientConfig::builder()
        .base_url(server.uri())
        .base_delay(Duration::from_millis(10))
        .total_timeout(Duration::from_secs(5))
}

/// Real reqwest transport, un-jittered backoff, breaker cooldown driven by
/// `clock`.
pub fn client_with_clock(config: ClientConfig, clock: &MockClock) -> ApiClient<MockClock> {
    ApiClient::builder()
        .config(config)
        .jitter(FixedJitter::none())
        .clock(clock.clone())
        .build()
        .expect("client should build")
}

/// Real reqwest transport and system clock.
pub fn client(config: ClientConfig) -> ApiClient {
    ApiClient::builder()
        .config(config)
        .jitter(FixedJitter::none())
        .build()
        .expect("client should build")
}
