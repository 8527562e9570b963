use crate::config::SimConfig;
use crate::simulation::RunningStats;

/// Latencies in cycles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Params {
    pub hit_time: u32,
    pub miss_penalty: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Summary {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    /// average memory access time in cycles
    pub amat: f64,
}

pub fn summarize(stats: &RunningStats, params: Params) -> Summary {
    let total = stats.total();
    let hit_rate = if total > 0 {
        stats.hits as f64 / total as f64
    } else {
        0.0
    };
    let miss_rate = 1.0 - hit_rate;

    Summary {
        hits: stats.hits,
        misses: stats.misses,
        hit_rate,
        miss_rate,
        amat: f64::from(params.hit_time) + miss_rate * f64::from(params.miss_penalty),
    }
}

impl Summary {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn format(&self) -> String {
        [
            format!("Number of Accesses: {}", self.total()),
            format!("Hits: {}, Misses: {}", self.hits, self.misses),
            format!("Percent Hits: {:.1}%", 100.0 * self.hit_rate),
            format!("Percent Misses: {:.1}%", 100.0 * self.miss_rate),
            format!("AMAT: {:.2} cycles", self.amat),
        ]
        .join("\n")
    }

    /// `Parameter,Value` rows for the configuration followed by the counters.
    pub fn write_csv<W: std::io::Write>(&self, config: &SimConfig, out: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(out);

        writer.write_record(["Parameter", "Value"])?;
        let rows = [
            ("CacheLines", config.total_lines.to_string()),
            ("BlockSize", config.block_size.to_string()),
            ("Assoc", config.associativity.to_string()),
            ("Type", config.organization.to_string()),
            ("Repl", config.replacement_policy.to_string()),
            ("HitTime", config.hit_time.to_string()),
            ("MissPenalty", config.miss_penalty.to_string()),
            ("Total", self.total().to_string()),
            ("Hits", self.hits.to_string()),
            ("Misses", self.misses.to_string()),
            ("HitRate", format!("{:.4}", self.hit_rate)),
            ("MissRate", format!("{:.4}", self.miss_rate)),
            ("AMAT", format!("{:.4}", self.amat)),
        ];
        for (parameter, value) in rows {
            writer.write_record([parameter, value.as_str()])?;
        }

        writer.flush()?;
        Ok(())
    }
}
