//! lloyd CLI
//!
//! Clusters a delimited numeric file with k-means and writes a text report.
//!
//! ```text
//! lloyd -i iris.csv -o out.txt -k 3 --max-fields 4
//! ```
//!
//! Exit codes: 0 on success (including an unwritable report, which is only
//! reported), 1 on unreadable input or an impossible `k`, 2 on bad arguments.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser};
use lloyd::cluster::{DEFAULT_MAX_ITER, DEFAULT_TOL};
use lloyd::{Kmeans, LoadOptions, Loaded, State};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Lloyd's k-means clustering over delimited numeric records
#[derive(Parser, Debug)]
#[command(name = "lloyd")]
#[command(version)]
#[command(about = "Lloyd's k-means clustering over delimited numeric records")]
#[command(after_help = "Examples:\n  lloyd -i points.csv -o out.txt -k 3\n  \
    lloyd -i iris.csv -o out.txt -k 3 --max-fields 4   # skip a trailing label column")]
struct Cli {
    /// Input file (delimited text, first line is a header)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Report output path
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Number of clusters
    #[arg(short = 'k', value_parser = clap::value_parser!(u32).range(1..))]
    k: u32,

    /// Seed for centroid sampling (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Iteration cap
    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    max_iter: usize,

    /// Per-centroid squared-displacement tolerance
    #[arg(long, default_value_t = DEFAULT_TOL)]
    tol: f64,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Only read the first N fields of each line
    #[arg(long)]
    max_fields: Option<usize>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        let options = LoadOptions::default().with_delimiter(self.delimiter);
        match self.max_fields {
            Some(n) => options.with_max_fields(n),
            None => options,
        }
    }

    fn kmeans(&self) -> Kmeans {
        let kmeans = Kmeans::new(self.k as usize)
            .with_max_iter(self.max_iter)
            .with_tol(self.tol);
        match self.seed {
            Some(seed) => kmeans.with_seed(seed),
            None => kmeans,
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load, cluster, report. Only load and clustering errors are returned.
fn run(cli: &Cli) -> lloyd::Result<State> {
    let Loaded { store, dropped } = lloyd::load(&cli.input, &cli.load_options())?;
    println!("Loaded points: {}", store.len());
    println!("Detected dimensions: {}", store.dimension());
    if dropped > 0 {
        println!("Dropped lines: {dropped}");
    }

    let fit = cli.kmeans().fit(store)?;
    match fit.state {
        State::Converged { iterations } => println!("Converged after {iterations} iterations"),
        state => println!(
            "Stopped after {} iterations without converging",
            state.iterations()
        ),
    }

    if let Err(e) = lloyd::save(&cli.output, &fit.store, &fit.centroids) {
        warn!(error = %e, "report not written");
        eprintln!("Cannot open output file: {e}");
    }
    Ok(fit.state)
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
