use std::path::PathBuf;
use std::process::exit;
use clap::Parser;
use log::info;
use specs_xps::{DataSet, GroupPolicy, LoaderConfig, MismatchPolicy, Region, XpsError};

#[derive(Parser, Debug)]
/// Summarize SPECS Prodigy XPS exports
struct Args {

    /// export files to load, in order. `.gz` and `.bz2` files are decompressed
    #[clap(required = true)]
    files: Vec<PathBuf>,

    /// TOML file with loader settings
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// handling of repeated group names: `merge` or `always-create`
    #[clap(long)]
    groups: Option<GroupPolicy>,

    /// handling of sweeps that do not fit the energy axis: `skip`, `repair` or `fail`
    #[clap(long)]
    on_mismatch: Option<MismatchPolicy>,

    /// print the header and sweep times of the regions in this group
    #[clap(short, long)]
    group: Option<String>,

    /// only show this region of the selected group
    #[clap(short, long, requires = "group")]
    region: Option<String>,

    /// print the whole data set as JSON
    #[clap(long)]
    json: bool,

    /// more logging, repeat for debug output
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {

    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        exit(1);
    }

}

fn run(args: &Args) -> Result<(), XpsError> {

    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(groups) = args.groups {
        config = config.with_groups(groups);
    }
    if let Some(policy) = args.on_mismatch {
        config = config.with_mismatch(policy);
    }

    let mut ds = DataSet::new(config)?;
    for file in &args.files {
        let report = ds.load_file(file)?;
        info!("{report}");
    }

    if args.json {
        match serde_json::to_string_pretty(&ds) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("failed to serialize data set: {e}"),
        }
        return Ok(());
    }

    let Some(group_name) = &args.group else {
        print!("{ds}");
        for report in ds.reports.iter().filter(|r| !r.is_clean()) {
            println!("warning: {report}");
        }
        return Ok(());
    };

    let regions: Vec<&Region> = ds.groups_named(group_name)
        .flat_map(|g| g.regions.iter())
        .filter(|r| args.region.as_ref().is_none_or(|name| &r.name == name))
        .collect();

    if regions.is_empty() {
        eprintln!("no matching region in group '{group_name}'");
        exit(1);
    }

    for region in regions {
        print_region(region)?;
    }

    Ok(())
}

fn print_region(region: &Region) -> Result<(), XpsError> {
    print!("{region}");
    println!("points:\t{}", region.n_points());
    println!("sweeps:\t{}", region.n_sweeps());
    if !region.is_aligned() {
        println!("warning: {} timestamps for {} sweeps", region.time.len(), region.n_sweeps());
    }
    let offsets = region.offset_axis()?;
    for (time, offset) in region.time.iter().zip(offsets) {
        println!("{time}\t{offset} s");
    }
    println!();
    Ok(())
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}
