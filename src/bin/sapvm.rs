//! sapvm - runs a bytecode program produced by `sapc`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sapling::{Executable, VmConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run sapling VM bytecode
#[derive(Parser, Debug)]
#[command(name = "sapvm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program in the text format (or postcard with --binary)
    program: PathBuf,

    /// Read the postcard encoding instead of the text format
    #[arg(long)]
    binary: bool,

    /// Memory size in cells
    #[arg(long, default_value_t = VmConfig::default().memory_size)]
    memory_size: usize,

    /// First heap cell; the stack lives below it
    #[arg(long, default_value_t = VmConfig::default().heap_base)]
    heap_base: usize,

    /// Abort after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> sapling::Result<()> {
    let read_error = |e| sapling::Error::Io {
        path: cli.program.clone(),
        source: e,
    };
    let exe = if cli.binary {
        let bytes = std::fs::read(&cli.program).map_err(read_error)?;
        Executable::from_bytes(&bytes)?
    } else {
        let text = std::fs::read_to_string(&cli.program).map_err(read_error)?;
        Executable::from_text(&text)?
    };

    let config = VmConfig {
        memory_size: cli.memory_size,
        heap_base: cli.heap_base,
        max_steps: cli.max_steps,
    };
    sapling::execute(&exe, config, std::io::stdout().lock())?;
    Ok(())
}
