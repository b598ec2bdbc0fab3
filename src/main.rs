use std::env;
use std::path::PathBuf;

use clap::Parser;
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use log::error;

use kubernetriks_capacity::config::{load_config, SimulationConfig};
use kubernetriks_capacity::error::CapacityError;
use kubernetriks_capacity::runner::{run_capacity_review, RunSettings};

const LOG_FILE_MAX_BYTES: usize = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 5;

/// Estimates how many more instances of the given pods a cluster can take.
#[derive(Parser)]
struct Args {
    /// YAML file with nodes, namespaces and running pods of the cluster
    #[clap(long)]
    cluster_snapshot: Option<PathBuf>,
    /// Pod template to simulate, repeat the flag for several templates
    #[clap(long = "podspec", required = true)]
    podspecs: Vec<PathBuf>,
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Maximum number of pods to simulate, 0 means no limit
    #[clap(long)]
    max_limit: Option<u32>,
    #[clap(long)]
    verbose: bool,
    /// Output format, one of: pretty, json, yaml
    #[clap(short, long)]
    output: Option<String>,
}

fn init_logger(logs_filepath: Option<&str>) {
    // log level INFO by default
    let mut env_logger_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        env_logger_builder.filter_level(log::LevelFilter::Info);
    }
    if let Some(logs_filepath) = logs_filepath {
        let log_file = FileRotate::new(
            logs_filepath,
            AppendCount::new(LOG_FILES_KEPT),
            ContentLimit::Bytes(LOG_FILE_MAX_BYTES),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        env_logger_builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    env_logger_builder.init();
}

fn main() {
    let args = Args::parse();

    let config = match args.config.as_deref().map(load_config).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    init_logger(config.logs_filepath.as_deref());

    if let Err(err) = run(&config, args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(config: &SimulationConfig, args: Args) -> Result<(), CapacityError> {
    let settings = RunSettings::resolve(
        config,
        args.cluster_snapshot,
        args.podspecs,
        args.max_limit,
        args.output.as_deref(),
        args.verbose,
    )?;
    let stdout = std::io::stdout();
    run_capacity_review(config, &settings, &mut stdout.lock())
}
