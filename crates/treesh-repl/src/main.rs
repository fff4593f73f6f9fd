//! treesh REPL entry point.
//!
//! Launch the interactive shell:
//! ```bash
//! cargo run -p treesh-repl
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use treesh_repl::Cli;

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("treesh=info".parse()?))
        .init();

    treesh_repl::run(Cli::parse())
}
