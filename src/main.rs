//! This program answers popularity questions about baby names, based on the
//! per-state birth records published by the US Social Security
//! Administration at <https://www.ssa.gov/oact/babynames/limits.html>.
//!
//! Each data file lists, for one state, how many babies of each gender were
//! given each name on each year.

mod aggregate;
mod config;
mod filter;
mod flip;
mod ingest;
mod output;
mod popularity;
mod progress;
mod rank;
mod regions;
mod store;
mod top;

use crate::{
    aggregate::GroupField,
    config::Config,
    filter::{Dimension, FilterResolver, Selectors},
    output::Output,
    progress::ProgressReport,
    store::{snapshot, RecordStore},
};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroUsize, path::PathBuf, sync::Arc};
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

/// Answer popularity questions about baby names
///
/// Selectors (region, year, gender) that are omitted or do not match any
/// value of the dataset are treated as "everything", so a misspelled region
/// silently selects all regions. Check the logs if a result looks too broad.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Directory containing one `<REGION>.TXT` data file per region
    #[arg(short, long, global = true, default_value = "namesbystate")]
    data_dir: PathBuf,

    /// Comma-separated list of region codes to be loaded, e.g. "WA,OR"
    ///
    /// By default, every known region is loaded.
    #[arg(short = 'R', long, global = true, value_delimiter = ',')]
    regions: Vec<Box<str>>,

    /// Location of the dataset snapshot
    ///
    /// Parsing the data files is slow, so the parsed dataset is saved to a
    /// compressed snapshot that later runs reload instead. By default, the
    /// snapshot lives in the user's cache directory.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Neither read nor write the dataset snapshot
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    /// Emit results as JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Question to be answered
    #[command(subcommand)]
    command: Command,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        // Decode CLI arguments
        let args = Args::parse();

        // Check CLI arguments for basic sanity
        if let Command::ShareSeries {
            from: Some(from),
            to: Some(to),
            ..
        } = &args.command
        {
            anyhow::ensure!(
                from <= to,
                "requested share series starts after it ends ({from} > {to})"
            );
        }
        Ok(args)
    }
}

/// Supported questions
#[derive(Subcommand, Debug)]
enum Command {
    /// Total number of births
    Count {
        #[command(flatten)]
        selectors: SelectorArgs,
    },

    /// Most popular names of each gender
    Top {
        #[command(flatten)]
        selectors: SelectorArgs,

        /// Number of names to be displayed for each gender
        #[arg(short, default_value = "10")]
        k: NonZeroUsize,
    },

    /// Most popular names within each region, year or gender
    TopPerGroup {
        #[command(flatten)]
        selectors: SelectorArgs,

        /// Dimension whose values are ranked separately
        #[arg(long, value_enum)]
        group: Dimension,

        /// Extra field that ranked entries are distinguished by, besides
        /// name and year
        #[arg(long, value_enum)]
        secondary: Option<GroupField>,

        /// Number of ranked entries within each group
        #[arg(short, default_value = "5")]
        k: NonZeroUsize,
    },

    /// Names whose share of births changed the most between two years
    PopularityChange {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Initial year (defaults to the earliest year of the dataset)
        #[arg(long)]
        from: Option<Year>,

        /// Final year (defaults to the latest year of the dataset)
        #[arg(long)]
        to: Option<Year>,

        /// Number of gaining and declining names to be displayed
        #[arg(short, long, default_value = "10")]
        top: NonZeroUsize,
    },

    /// Names whose gender association changed the most between two years
    NameFlip {
        /// Initial year (defaults to the earliest year of the dataset)
        #[arg(long)]
        from: Option<Year>,

        /// Final year (defaults to the latest year of the dataset)
        #[arg(long)]
        to: Option<Year>,

        /// Number of names to be displayed
        #[arg(short, default_value = "10")]
        n: NonZeroUsize,
    },

    /// Male/female split of every name that is given to both genders
    GenderSplit {
        #[command(flatten)]
        selectors: SelectorArgs,
    },

    /// Yearly share of births carrying a given name
    ShareSeries {
        /// Name of interest (case-insensitive)
        name: Box<str>,

        #[command(flatten)]
        scope: ScopeArgs,

        /// First year of the series (defaults to the earliest dataset year)
        #[arg(long)]
        from: Option<Year>,

        /// Last year of the series (defaults to the latest dataset year)
        #[arg(long)]
        to: Option<Year>,
    },
}

/// Observation selectors
#[derive(clap::Args, Clone, Debug, Default)]
struct SelectorArgs {
    /// Two-letter region code, e.g. "WA"
    #[arg(short, long)]
    region: Option<Box<str>>,

    /// Year of birth
    #[arg(short, long)]
    year: Option<Year>,

    /// Gender, either "M" or "F"
    #[arg(short, long)]
    gender: Option<Box<str>>,
}
//
impl From<SelectorArgs> for Selectors {
    fn from(args: SelectorArgs) -> Self {
        let SelectorArgs {
            region,
            year,
            gender,
        } = args;
        Selectors {
            region,
            year,
            gender,
        }
    }
}

/// Observation selectors for questions that pick years on their own
#[derive(clap::Args, Clone, Debug, Default)]
struct ScopeArgs {
    /// Two-letter region code, e.g. "WA"
    #[arg(short, long)]
    region: Option<Box<str>>,

    /// Gender, either "M" or "F"
    #[arg(short, long)]
    gender: Option<Box<str>>,
}
//
impl From<ScopeArgs> for Selectors {
    fn from(args: ScopeArgs) -> Self {
        Selectors {
            region: args.region,
            year: None,
            gender: args.gender,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments and digest them into a configuration
    let args = Args::parse_and_check()?;
    let config = Config::new(&args)?;

    // Bring the dataset into memory
    let report = ProgressReport::new();
    let store = load_store(&config, &report).await?;

    // Answer the user's question
    let output = Output::new(config.json);
    match args.command {
        Command::Count { selectors } => {
            let filter = FilterResolver::new(&store).resolve(&selectors.into());
            output.emit(&aggregate::count(&store, &filter)).await?;
        }
        Command::Top { selectors, k } => {
            let filter = FilterResolver::new(&store).resolve(&selectors.into());
            output
                .emit(&top::top_k_by_gender(&store, &filter, k.get()))
                .await?;
        }
        Command::TopPerGroup {
            selectors,
            group,
            secondary,
            k,
        } => {
            let filter = FilterResolver::new(&store).resolve(&selectors.into());
            output
                .emit(&top::top_k_per_group(
                    &store,
                    &filter,
                    group,
                    k.get(),
                    secondary,
                ))
                .await?;
        }
        Command::PopularityChange {
            scope,
            from,
            to,
            top,
        } => {
            let change =
                popularity::change_of_popularity(&store, &scope.into(), from, to, top.get());
            output.emit(&change).await?;
        }
        Command::NameFlip { from, to, n } => {
            output
                .emit(&flip::name_flip(&store, n.get(), from, to))
                .await?;
        }
        Command::GenderSplit { selectors } => {
            let filter = FilterResolver::new(&store).resolve(&selectors.into());
            output
                .emit(&flip::gender_proportions(&store, &filter))
                .await?;
        }
        Command::ShareSeries {
            name,
            scope,
            from,
            to,
        } => {
            let series = popularity::share_series(&store, &name, from, to, &scope.into());
            output.emit(&series).await?;
        }
    }
    Ok(())
}

/// Reload the dataset from its snapshot if possible, otherwise parse the
/// data files and refresh the snapshot
async fn load_store(config: &Arc<Config>, report: &ProgressReport) -> Result<RecordStore> {
    if let Some(path) = &config.snapshot {
        match snapshot::load(path, &config.input).await {
            Ok(Some(store)) => return Ok(store),
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring unusable snapshot {}: {e:#}", path.display()),
        }
    }
    let store = ingest::read_all(config.clone(), report).await?;
    if let Some(path) = &config.snapshot {
        if let Err(e) = snapshot::save(path, &config.input, &store).await {
            log::warn!("Failed to save snapshot {}: {e:#}", path.display());
        }
    }
    Ok(store)
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Two-letter region code, in upper case
pub type Region = Box<str>;

/// First name given at birth
pub type Name = Box<str>;

/// Year of Gregorian Calendar
pub type Year = i16;

/// Number of births
///
/// A single observation fits in a u32, but sums over every region and year
/// reach hundreds of millions, so sums are computed in u64 throughout.
pub type Count = u64;

/// Gender recorded at birth
///
/// Variants are declared in the order of their single-letter codes, so that
/// sorted gender sets match the order of the source data.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Gender {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}
//
impl Gender {
    /// Decode the single-letter code used by data files
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F" => Some(Self::Female),
            "M" => Some(Self::Male),
            _ => None,
        }
    }

    /// Single-letter code used by data files
    pub fn code(self) -> &'static str {
        match self {
            Self::Female => "F",
            Self::Male => "M",
        }
    }
}
//
impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}

/// Use jemalloc for improved multi-thread performance
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;
