//! hostbridge-gen: generate native and managed bindings.
//!
//! ```text
//! hostbridge-gen generate --config bindings.toml --snapshot host.json --out generated
//! hostbridge-gen generate --config bindings.toml --snapshot host.json --out generated --check
//! ```
//!
//! Log output is controlled with `RUST_LOG` (e.g. `RUST_LOG=hostbridge=debug`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hostbridge::codegen::{ErrorPolicy, GeneratorOptions};
use hostbridge::{Pipeline, PipelineError, PipelineOutcome};

#[derive(Parser)]
#[command(name = "hostbridge-gen")]
#[command(about = "Binding generator for native code and a managed host", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the exposure configuration and write both artifacts
    Generate {
        /// Exposure configuration (TOML)
        #[arg(long)]
        config: PathBuf,
        /// Host reflection snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Output directory
        #[arg(long, default_value = "generated")]
        out: PathBuf,
        /// Only report whether the artifacts on disk are up to date
        #[arg(long)]
        check: bool,
        /// Generate stubs that unwind on failure instead of returning results
        #[arg(long)]
        raise: bool,
        /// Namespace of the managed artifact
        #[arg(long)]
        namespace: Option<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            config,
            snapshot,
            out,
            check,
            raise,
            namespace,
        } => {
            let mut options = GeneratorOptions::default();
            if raise {
                options = options.with_error_policy(ErrorPolicy::Raise);
            }
            if let Some(namespace) = namespace {
                options = options.with_managed_namespace(namespace);
            }
            let pipeline = Pipeline::new(config, snapshot, out).with_options(options);
            let outcome = if check { pipeline.check() } else { pipeline.run() };

            match outcome {
                Ok(PipelineOutcome::Written(report)) => {
                    for path in &report.written {
                        println!("wrote {}", path.display());
                    }
                    for path in &report.unchanged {
                        println!("unchanged {}", path.display());
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Ok(PipelineOutcome::UpToDate(_)) => {
                    println!("artifacts are up to date");
                    Ok(ExitCode::SUCCESS)
                }
                Err(PipelineError::Stale(paths)) => {
                    for path in &paths {
                        eprintln!("out of date: {}", path.display());
                    }
                    Ok(ExitCode::FAILURE)
                }
                Err(error) => Err(error).context("binding generation failed"),
            }
        }
    }
}
