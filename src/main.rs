//! csrflash - Command/status register flash programmer
//!
//! Programs single cells of a flash part that speaks the Intel/AMD-style
//! command/status register protocol.
//!
//! # Architecture
//!
//! - `csrflash-core` owns the protocol and knows nothing about hardware
//! - Backends (`csrflash-dummy`, `csrflash-mmio`) implement `RegisterIo`
//! - This binary picks a backend by name and runs one command against it

mod backends;
mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Verbosity picks the default filter; RUST_LOG still wins when set
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Program {
            backend,
            address,
            data,
            poll_delay_us,
        } => {
            let io = backends::open_backend(&backend)?;
            commands::run_program(io, address, data, poll_delay_us)
        }
        Commands::Status { backend } => {
            let io = backends::open_backend(&backend)?;
            commands::run_status(io)
        }
        Commands::ClearStatus { backend } => {
            let io = backends::open_backend(&backend)?;
            commands::run_clear_status(io)
        }
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
    }
}
