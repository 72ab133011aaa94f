//! xmltv-synth - synthetic XMLTV EPG generator
//! Builds randomized, multi-language programme guides for IPTV middleware testing

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

mod catalog;
mod config;
mod epg;
mod error;
mod logging;
mod models;
mod output;

use catalog::ShowCatalog;
use config::GeneratorConfig;
use epg::{GuideInspector, ScheduleBuilder};
use error::Result;
use output::{write_guide, OutputTarget};

#[derive(Debug, Parser)]
#[command(version, about = "XMLTV EPG generator with multiple languages support")]
struct Cli {
    /// Log every draw and placement
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a guide from a show data file
    Generate(GenerateArgs),
    /// Read a generated guide back and check its timelines
    Check {
        /// Guide file, plain or gzip-compressed
        guide: PathBuf,
        /// Expected timezone offset on every timestamp
        #[arg(short, long)]
        timezone: Option<String>,
    },
    /// Write the default configuration file
    InitConfig {
        /// Where to write it (defaults to the user config directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    /// `;`-separated show data file
    #[arg(short, long)]
    data: PathBuf,
    /// EPG start date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(short, long)]
    start: String,
    /// EPG end date, exclusive
    #[arg(short, long)]
    end: String,
    /// Output languages, the first one drives duplicate detection
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    langs: Vec<String>,
    /// Timezone offset appended to timestamps, e.g. +0330
    #[arg(short, long, allow_hyphen_values = true)]
    timezone: Option<String>,
    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: PathBuf,
    /// Gzip the output file
    #[arg(short, long)]
    archive: bool,
    /// Emit programme icons
    #[arg(short, long)]
    images: bool,
    /// Seed for reproducible guides
    #[arg(long)]
    seed: Option<u64>,
    /// Configuration file with channels and vocabulary
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Command::Generate(args) => generate(args),
        Command::Check { guide, timezone } => check(&guide, timezone.as_deref()),
        Command::InitConfig { path } => init_config(path),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn generate(args: GenerateArgs) -> Result<ExitCode> {
    let config = GeneratorConfig::load(args.config.as_deref())?;
    let catalog = ShowCatalog::load(&args.data, config.vocabulary.clone())?;

    let languages = if args.langs.is_empty() {
        config.languages.clone()
    } else {
        args.langs
    };
    let timezone = args.timezone.unwrap_or_else(|| config.timezone.clone());

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!(
        languages = ?languages,
        start = %args.start,
        end = %args.end,
        channels = config.channels.len(),
        "generating guide"
    );

    let guide = ScheduleBuilder::new(
        languages,
        &args.start,
        &args.end,
        config.channels.clone(),
        &catalog,
        Some(&timezone),
        rng,
    )?
    .with_options(config.schedule_options(args.images))
    .build()?;

    info!(
        channels = guide.channels().len(),
        programmes = guide.programmes().len(),
        "guide built"
    );

    write_guide(&guide, &OutputTarget::new(&args.output, args.archive))?;
    Ok(ExitCode::SUCCESS)
}

fn check(path: &Path, timezone: Option<&str>) -> Result<ExitCode> {
    if let Some(offset) = timezone {
        epg::validate_timezone(offset)?;
    }

    let report = GuideInspector::inspect_file(path)?;
    let violations = report.violations(timezone);

    println!("Channels:   {}", report.channels.len());
    println!("Programmes: {}", report.program_count());

    if violations.is_empty() {
        println!("No timeline problems found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} problem(s):", violations.len());
    for violation in &violations {
        println!("  - {violation}");
    }
    Ok(ExitCode::FAILURE)
}

fn init_config(path: Option<PathBuf>) -> Result<ExitCode> {
    let path = path.unwrap_or_else(GeneratorConfig::default_path);
    if path.exists() {
        warn!(path = %path.display(), "overwriting existing config");
    }
    GeneratorConfig::default().save(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(ExitCode::SUCCESS)
}
