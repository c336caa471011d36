//! CLI argument parsing

use clap::{Parser, Subcommand};

/// Parse a string as a hex or decimal u64
pub fn parse_number(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a register address (hex or decimal, 32 bits)
fn parse_address(s: &str) -> Result<u32, String> {
    let value = parse_number(s)?;
    u32::try_from(value).map_err(|_| format!("Address {:#x} does not fit in 32 bits", value))
}

/// Parse a register datum (hex or decimal, 16 bits)
fn parse_datum(s: &str) -> Result<u16, String> {
    let value = parse_number(s)?;
    u16::try_from(value).map_err(|_| format!("Value {:#x} does not fit in 16 bits", value))
}

const BACKEND_HELP: &str = "Register backend, e.g. \"dummy\" or \
    \"mmio:base=0xff800000,size=0x800000,width=16\" (see list-backends)";

#[derive(Parser)]
#[command(name = "csrflash")]
#[command(author, version, about = "Command/status register flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Program a single flash cell
    Program {
        #[arg(short, long, help = BACKEND_HELP)]
        backend: String,

        /// Cell address (hex, e.g., 0x1000)
        #[arg(short, long, value_parser = parse_address)]
        address: u32,

        /// Value to program (hex or decimal)
        #[arg(short, long, value_parser = parse_datum)]
        data: u16,

        /// Sleep between status polls, in microseconds (default: busy-wait)
        #[arg(long)]
        poll_delay_us: Option<u64>,
    },

    /// Read and decode the status register
    Status {
        #[arg(short, long, help = BACKEND_HELP)]
        backend: String,
    },

    /// Reset the device, clearing latched error bits
    ClearStatus {
        #[arg(short, long, help = BACKEND_HELP)]
        backend: String,
    },

    /// List available register backends
    ListBackends,
}
