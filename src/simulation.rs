use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::{CacheLine, CacheStore};
use crate::config::SimConfig;
use crate::geometry::{AddressDecoder, CacheGeometry};
use crate::metrics::{Summary, summarize};
use crate::replacement::ReplacementPolicy;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheHit {
    Hit,
    /// `evicted` is the line that was overwritten, `None` if a free way was used
    Miss { evicted: Option<CacheLine> },
}

impl CacheHit {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheHit::Hit)
    }
}

impl std::fmt::Display for CacheHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheHit::Hit => f.write_str("Hit"),
            CacheHit::Miss { evicted } => match evicted.and_then(|line| line.tag) {
                Some(prev) => f.write_fmt(format_args!("Miss evicted tag={prev:#X}")),
                None => f.write_str("Miss"),
            },
        }
    }
}

/// What happened to a single address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub address: usize,
    pub tag: usize,
    pub set_index: usize,
    /// way that was hit or written
    pub way: usize,
    pub outcome: CacheHit,
}

impl AccessRecord {
    pub fn evicted(&self) -> Option<CacheLine> {
        match self.outcome {
            CacheHit::Hit => None,
            CacheHit::Miss { evicted } => evicted,
        }
    }
}

impl std::fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{:#X} -> S{} / W{} tag={:#X} ({})",
            self.address, self.set_index, self.way, self.tag, self.outcome
        ))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RunningStats {
    pub hits: u64,
    pub misses: u64,
    /// one tick per access, source of the line timestamps
    pub logical_clock: u64,
}

impl RunningStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Simulates one access against `store`, updating `stats` in place.
pub fn step<R: Rng>(
    address: usize,
    decoder: &AddressDecoder,
    store: &mut CacheStore,
    stats: &mut RunningStats,
    policy: ReplacementPolicy,
    rng: &mut R,
) -> AccessRecord {
    stats.logical_clock += 1;
    let clock = stats.logical_clock;

    let decoded = decoder.decode(address);
    let set_index = decoded.set_index;
    let tag = decoded.tag;

    let (way, outcome) = match store.lookup(set_index, tag) {
        // Cache-Hit: set cache-line as the most recently used
        Some(way) => {
            stats.hits += 1;
            store.touch_line(set_index, way, clock);
            (way, CacheHit::Hit)
        }
        // Cache-Miss: use a free way if there is one, otherwise evict
        None => {
            stats.misses += 1;
            let (way, evicted) = match store.find_free_way(set_index) {
                Some(way) => (way, None),
                None => {
                    let lines = store.set(set_index).lines();
                    let victim = policy.select_victim(lines, rng);
                    let evicted = lines[victim];
                    log::debug!(
                        "evict S{set_index} / W{victim} tag={:?} for tag={tag:#X} ({policy})",
                        evicted.tag
                    );
                    (victim, Some(evicted))
                }
            };
            store.install_line(set_index, way, tag, clock);
            (way, CacheHit::Miss { evicted })
        }
    };

    AccessRecord {
        address,
        tag,
        set_index,
        way,
        outcome,
    }
}

/// Owns the cache state for one configuration.
///
/// Every call to [`Simulator::step`] leaves store and stats consistent, so a
/// driver can stop between any two steps.
#[derive(Debug)]
pub struct Simulator<R = StdRng> {
    config: SimConfig,
    decoder: AddressDecoder,
    store: CacheStore,
    stats: RunningStats,
    rng: R,
}

impl Simulator<StdRng> {
    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    pub fn new(config: SimConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn seeded(config: SimConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulator<R> {
    pub fn with_rng(config: SimConfig, rng: R) -> Self {
        let geometry = config.geometry();
        Self {
            config,
            decoder: AddressDecoder::new(&geometry),
            store: CacheStore::build(&geometry),
            stats: RunningStats::default(),
            rng,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn geometry(&self) -> CacheGeometry {
        self.config.geometry()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn stats(&self) -> RunningStats {
        self.stats
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.stats, self.config.params())
    }

    pub fn step(&mut self, address: usize) -> AccessRecord {
        step(
            address,
            &self.decoder,
            &mut self.store,
            &mut self.stats,
            self.config.replacement_policy,
            &mut self.rng,
        )
    }

    pub fn run(&mut self, addresses: impl IntoIterator<Item = usize>) -> Vec<AccessRecord> {
        addresses
            .into_iter()
            .map(|address| self.step(address))
            .collect()
    }

    /// Empties the cache and zeroes the stats, keeping the configuration.
    pub fn reset(&mut self) {
        let geometry = self.config.geometry();
        (self.store, self.stats) = (CacheStore::build(&geometry), RunningStats::default());
    }

    /// Switches to a new configuration. Store and stats are replaced together.
    pub fn reconfigure(&mut self, config: SimConfig) {
        let geometry = config.geometry();
        log::debug!("rebuilding cache: {geometry:?}");

        self.decoder = AddressDecoder::new(&geometry);
        (self.store, self.stats) = (CacheStore::build(&geometry), RunningStats::default());
        self.config = config;
    }
}
