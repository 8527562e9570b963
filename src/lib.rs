pub mod cache;
pub mod config;
pub mod geometry;
pub mod metrics;
pub mod replacement;
pub mod simulation;
pub mod trace;

pub use cache::{CacheLine, CacheSet, CacheStore};
pub use config::{ConfigError, SimConfig};
pub use geometry::{AddressDecoder, AddressLayout, CacheGeometry, DecodedAddress, Organization};
pub use metrics::{Params, Summary, summarize};
pub use replacement::ReplacementPolicy;
pub use simulation::{AccessRecord, CacheHit, RunningStats, Simulator};

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

/// Runs `trace` against the default configuration and returns the
/// per-access log followed by the summary.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen]
pub fn run_simulation(trace: &str) -> String {
    let config = SimConfig::default();
    let mut simulator = Simulator::seeded(config, 0);

    let mut result = vec![config.geometry().format_info()];
    result.extend(
        simulator
            .run(trace::parse_addresses(trace))
            .iter()
            .map(AccessRecord::to_string),
    );
    result.push(simulator.summary().format());

    result.join("\n")
}
