use std::fs::File;
use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use cache_sim::config::{non_negative, positive};
use cache_sim::trace::{self, DEFAULT_TRACE};
use cache_sim::{AddressLayout, Organization, ReplacementPolicy, SimConfig, Simulator};

/// Replays an address trace against a direct-mapped, set-associative or
/// fully-associative cache and reports hits, misses and AMAT.
#[derive(Parser, Debug)]
#[command(name = "cache_sim", version)]
struct Args {
    /// Addresses separated by spaces or commas (`0x` hex allowed)
    trace: Option<String>,

    /// Read the addresses from a file instead
    #[arg(long, conflicts_with = "trace")]
    trace_file: Option<PathBuf>,

    /// Generate this many random addresses instead
    #[arg(long, conflicts_with_all = ["trace", "trace_file"])]
    random: Option<usize>,

    /// Largest generated address
    #[arg(long, default_value_t = 127)]
    max_address: usize,

    /// Seed for random traces and the random replacement policy
    #[arg(long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total number of cache lines
    #[arg(long, allow_negative_numbers = true)]
    lines: Option<i64>,

    /// Block size in bytes
    #[arg(long, allow_negative_numbers = true)]
    block_size: Option<i64>,

    /// Associativity (ways per set)
    #[arg(long, allow_negative_numbers = true)]
    assoc: Option<i64>,

    /// Cache organization
    #[arg(long, value_enum)]
    organization: Option<OrganizationCli>,

    /// LRU, FIFO or Random (anything else means LRU)
    #[arg(long)]
    policy: Option<String>,

    /// Hit time in cycles
    #[arg(long, allow_negative_numbers = true)]
    hit_time: Option<i64>,

    /// Miss penalty in cycles
    #[arg(long, allow_negative_numbers = true)]
    miss_penalty: Option<i64>,

    /// Write the summary as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Only print the summary
    #[arg(short, long)]
    quiet: bool,

    /// Print the final cache contents
    #[arg(long)]
    show_cache: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrganizationCli {
    Direct,
    Set,
    Fully,
}

impl From<OrganizationCli> for Organization {
    fn from(value: OrganizationCli) -> Self {
        match value {
            OrganizationCli::Direct => Organization::Direct,
            OrganizationCli::Set => Organization::SetAssociative,
            OrganizationCli::Fully => Organization::FullyAssociative,
        }
    }
}

impl Args {
    fn sim_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SimConfig::default(),
        };

        if let Some(lines) = self.lines {
            config.total_lines = positive(lines);
        }
        if let Some(block_size) = self.block_size {
            config.block_size = positive(block_size);
        }
        if let Some(assoc) = self.assoc {
            config.associativity = positive(assoc);
        }
        if let Some(organization) = self.organization {
            config.organization = organization.into();
        }
        if let Some(policy) = &self.policy {
            config.replacement_policy = ReplacementPolicy::from_name(policy);
        }
        if let Some(hit_time) = self.hit_time {
            config.hit_time = non_negative(hit_time);
        }
        if let Some(miss_penalty) = self.miss_penalty {
            config.miss_penalty = non_negative(miss_penalty);
        }

        Ok(config)
    }

    fn addresses(&self, rng: &mut StdRng) -> Result<Vec<usize>> {
        if let Some(len) = self.random {
            return Ok(trace::random_addresses(len, self.max_address, rng));
        }

        if let Some(path) = &self.trace_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read trace {}", path.display()))?;
            return Ok(trace::parse_addresses(&content));
        }

        Ok(trace::parse_addresses(
            self.trace.as_deref().unwrap_or(DEFAULT_TRACE),
        ))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.sim_config()?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let addresses = args.addresses(&mut rng)?;
    log::info!("trace: {}", trace::format_addresses(&addresses));

    let geometry = config.geometry();
    let max_address = addresses.iter().copied().max().unwrap_or(0);
    let layout = AddressLayout::for_geometry(&geometry, max_address);
    let mut simulator = Simulator::with_rng(config, rng);

    let mut stdout = stdout().lock();
    writeln!(stdout, "{}", geometry.format_info())?;
    writeln!(
        stdout,
        "\tReplacement: {}, Hit: {} cycles, Miss penalty: {} cycles\n",
        config.replacement_policy, config.hit_time, config.miss_penalty
    )?;

    let mut history = String::with_capacity(addresses.len());
    for (step, address) in addresses.into_iter().enumerate() {
        let record = simulator.step(address);
        history.push(if record.outcome.is_hit() { 'H' } else { 'M' });

        if !args.quiet {
            writeln!(
                stdout,
                "{:>4}: {} [{}]",
                step + 1,
                record,
                layout.format(record.address)
            )?;
        }
    }

    if args.show_cache {
        writeln!(stdout, "\n{}", simulator.store().format_snapshot())?;
    }

    let summary = simulator.summary();
    writeln!(stdout, "\nHistory: {history}")?;
    writeln!(stdout, "{}", summary.format())?;

    if let Some(path) = &args.csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        summary
            .write_csv(simulator.config(), file)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote summary to {}", path.display());
    }

    Ok(())
}
