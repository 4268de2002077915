//! protogen CLI - protobuf schemas and gRPC glue from scanned Rust packages
//!
//! Commands:
//! - `protogen proto` - Write `generated.proto` per package
//! - `protogen rpc` - Write `service.rs` per package
//! - `protogen all` - Write both

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod generate;

use generate::{Options, Targets};

#[derive(Parser)]
#[command(name = "protogen")]
#[command(author, version, about = "Generate protobuf schemas and gRPC glue from scanned Rust packages", long_about = None)]
struct Cli {
    /// Print info diagnostics and progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proto3 schema files
    Proto(GenerateArgs),

    /// Generate service glue
    Rpc(GenerateArgs),

    /// Generate schema files and service glue
    All(GenerateArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Scanned package IR as JSON (repeatable, one package per file)
    #[arg(short, long = "ir", required = true)]
    ir: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// Path to protogen.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl GenerateArgs {
    fn into_options(self, targets: Targets, verbose: bool) -> Options {
        Options {
            inputs: self.ir,
            out: self.out,
            config: self.config,
            targets,
            verbose,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.parse()?)
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = match cli.command {
        Commands::Proto(args) => args.into_options(Targets::PROTO, cli.verbose),
        Commands::Rpc(args) => args.into_options(Targets::RPC, cli.verbose),
        Commands::All(args) => args.into_options(Targets::ALL, cli.verbose),
    };

    generate::run(&options)
}
