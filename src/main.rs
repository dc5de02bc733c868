//! sapc - compiles a sapling source file and prints its bytecode.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compile a sapling program to VM bytecode
#[derive(Parser, Debug)]
#[command(name = "sapc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source file; `use` imports resolve relative to it
    source: PathBuf,

    /// Print the postcard encoding instead of the text format
    #[arg(long)]
    binary: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match compile(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn compile(cli: &Cli) -> sapling::Result<()> {
    let exe = sapling::compile_file(&cli.source)?;

    let mut stdout = std::io::stdout().lock();
    let written = if cli.binary {
        stdout.write_all(&exe.to_bytes()?)
    } else {
        stdout.write_all(exe.to_text().as_bytes())
    };
    written.map_err(|e| sapling::Error::Io {
        path: PathBuf::from("<stdout>"),
        source: e,
    })
}
