// SPDX-License-Identifier: AGPL-3.0-only

//! Run a linear-scaling transport calculation from a JSON configuration.
//!
//! ```text
//! lsqt run.json --output results/ --threads 8
//! RUST_LOG=lsqt=debug lsqt run.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lsqt::config::RunConfig;
use lsqt::run::{run, write_results};

#[derive(Parser)]
#[command(name = "lsqt", version, about = "Chebyshev-recursion DOS, VAC, MSD and spin polarization")]
struct Cli {
    /// Run configuration (JSON)
    config: PathBuf,

    /// Directory for dos.json / vac.json / msd.json / spin.json
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Worker threads (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

fn execute(cli: &Cli) -> lsqt::Result<()> {
    let config = RunConfig::from_path(&cli.config)?;
    let output = run(&config)?;
    for path in write_results(&output, &cli.output)? {
        println!("  Results saved to: {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            tracing::warn!(error = %e, "could not size the thread pool; using default");
        }
    }

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
