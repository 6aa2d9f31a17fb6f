use std::path::PathBuf;
use std::process::exit;
use clap::Parser;
use log::{info, warn};
use specs_xps::{io, DataSet, GroupPolicy, LoaderConfig, MismatchPolicy, XpsError};

#[derive(Parser, Debug)]
/// Write one region of a SPECS Prodigy export as a tab-separated table: the energy axis
/// followed by one intensity column per sweep
struct Args {

    /// export file to read
    input: PathBuf,

    /// group holding the region
    #[clap(short, long)]
    group: String,

    /// region to write
    #[clap(short, long)]
    region: String,

    /// output table. Written gzip or bzip2 compressed if it ends in `.gz` or `.bz2`
    #[clap(short, long)]
    output: PathBuf,

    /// add a comment row with the sweep offsets in seconds
    #[clap(long)]
    offsets: bool,

    /// TOML file with loader settings
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// handling of sweeps that do not fit the energy axis: `skip`, `repair` or `fail`
    #[clap(long)]
    on_mismatch: Option<MismatchPolicy>,

    /// more logging, repeat for debug output
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {

    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("region '{}' not found in group '{}'", args.region, args.group);
            exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    }

}

/// returns false when the region does not exist
fn run(args: &Args) -> Result<bool, XpsError> {

    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    // merged groups, so the region is found no matter how often its group was reopened
    config = config.with_groups(GroupPolicy::Merge);
    if let Some(policy) = args.on_mismatch {
        config = config.with_mismatch(policy);
    }

    let ds = DataSet::open(&[&args.input], config)?;

    let Some(region) = ds.group(&args.group).and_then(|g| g.region(&args.region)) else {
        return Ok(false);
    };

    if !region.is_aligned() {
        warn!("region {} has {} timestamps for {} sweeps", region.name, region.time.len(), region.n_sweeps());
    }

    let offsets = if args.offsets { Some(region.offset_axis()?) } else { None };

    let mut table = Vec::new();
    region.write_table(&mut table, offsets.as_deref())
        .map_err(|source| XpsError::Io { path: args.output.clone(), source })?;
    let text = String::from_utf8_lossy(&table);
    io::write_text(&args.output, &text)?;

    info!("wrote {} sweeps of {} to {}", region.n_sweeps(), region.name, args.output.display());
    Ok(true)
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}
