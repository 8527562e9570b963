use crate::geometry::CacheGeometry;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: Option<usize>,
    /// logical clock of the last hit or install
    pub last_used: u64,
    /// logical clock of the install
    pub inserted_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSet {
    lines: Vec<CacheLine>,
}

impl CacheSet {
    fn new(ways: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); ways],
        }
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn lookup(&self, tag: usize) -> Option<usize> {
        // linear search for a valid cache-line with tag
        self.lines
            .iter()
            .position(|line| line.valid && line.tag == Some(tag))
    }

    pub fn find_free_way(&self) -> Option<usize> {
        self.lines.iter().position(|line| !line.valid)
    }
}

/// Fixed shape array of cache-lines, grouped into sets.
///
/// A fully-associative cache is a single set spanning every line, a
/// direct-mapped cache is one single-line set per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    sets: Vec<CacheSet>,
}

impl CacheStore {
    pub fn build(geometry: &CacheGeometry) -> Self {
        let ways = geometry.ways();
        Self {
            sets: (0..geometry.num_sets()).map(|_| CacheSet::new(ways)).collect(),
        }
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// ## Panics
    /// if `set_index` is out of range for the geometry the store was built from
    pub fn set(&self, set_index: usize) -> &CacheSet {
        &self.sets[set_index]
    }

    pub fn total_lines(&self) -> usize {
        self.sets.iter().map(|set| set.lines.len()).sum()
    }

    pub fn lookup(&self, set_index: usize, tag: usize) -> Option<usize> {
        self.set(set_index).lookup(tag)
    }

    pub fn find_free_way(&self, set_index: usize) -> Option<usize> {
        self.set(set_index).find_free_way()
    }

    pub fn install_line(&mut self, set_index: usize, way: usize, tag: usize, clock: u64) {
        self.sets[set_index].lines[way] = CacheLine {
            valid: true,
            tag: Some(tag),
            last_used: clock,
            inserted_at: clock,
        };
    }

    pub fn touch_line(&mut self, set_index: usize, way: usize, clock: u64) {
        self.sets[set_index].lines[way].last_used = clock;
    }

    /// One row per way: `S{set} / W{way}` followed by the line state.
    pub fn format_snapshot(&self) -> String {
        let mut result = Vec::with_capacity(self.total_lines());
        for (set_index, set) in self.sets.iter().enumerate() {
            for (way, line) in set.lines.iter().enumerate() {
                let state = match line.tag {
                    Some(tag) if line.valid => format!(
                        "tag={tag:#X} used={} in={}",
                        line.last_used, line.inserted_at
                    ),
                    _ => String::from("empty"),
                };
                result.push(format!("S{set_index} / W{way}: {state}"));
            }
        }

        result.join("\n")
    }
}
