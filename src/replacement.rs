use rand::Rng;

use crate::cache::CacheLine;

/// Victim selection used when a miss hits a full set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    #[default]
    Lru,
    Fifo,
    Random,
}

impl ReplacementPolicy {
    /// Case-insensitive lookup. Unknown names fall back to LRU.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "lru" => ReplacementPolicy::Lru,
            "fifo" => ReplacementPolicy::Fifo,
            "random" => ReplacementPolicy::Random,
            _ => {
                log::warn!("unknown replacement policy '{name}', using LRU");
                ReplacementPolicy::Lru
            }
        }
    }

    /// Way to evict from a full set.
    ///
    /// LRU picks the smallest `last_used`, FIFO the smallest `inserted_at`.
    /// Ties go to the lowest way. Random draws from `rng`, so it is only
    /// reproducible with a seeded generator.
    pub fn select_victim<R: Rng>(&self, lines: &[CacheLine], rng: &mut R) -> usize {
        if lines.len() <= 1 {
            return 0;
        }

        // `min_by_key` returns the first of several equal minimums
        match self {
            ReplacementPolicy::Lru => lines
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| line.last_used)
                .map_or(0, |(way, _)| way),
            ReplacementPolicy::Fifo => lines
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| line.inserted_at)
                .map_or(0, |(way, _)| way),
            ReplacementPolicy::Random => rng.random_range(0..lines.len()),
        }
    }
}

impl std::fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplacementPolicy::Lru => f.write_str("LRU"),
            ReplacementPolicy::Fifo => f.write_str("FIFO"),
            ReplacementPolicy::Random => f.write_str("Random"),
        }
    }
}
