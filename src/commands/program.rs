//! Program command implementation

use crate::error::CliError;
use csrflash_core::flash::CsrFlash;
use csrflash_core::wait::Backoff;
use csrflash_core::{Outcome, RegisterAddress, RegisterDatum, RegisterIo};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create the spinner shown while the device is busy
fn create_poll_spinner() -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} status poll(s) {msg}")?,
    );
    pb.set_message("waiting for ready");
    Ok(pb)
}

/// Program one cell and report the outcome
///
/// Polling never gives up; with `poll_delay_us` the thread sleeps between
/// status reads instead of spinning.
pub fn run_program(
    io: Box<dyn RegisterIo>,
    address: RegisterAddress,
    datum: RegisterDatum,
    poll_delay_us: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = create_poll_spinner()?;
    let delay = poll_delay_us
        .filter(|&us| us > 0)
        .map(Duration::from_micros);

    let wait = Backoff::new(|polls| {
        pb.set_position(u64::from(polls));
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    });

    let mut flash = CsrFlash::with_wait(io, wait);
    let outcome = flash.program(address, datum);
    pb.finish_and_clear();

    report(address, datum, outcome)
}

fn report(
    address: RegisterAddress,
    datum: RegisterDatum,
    outcome: Outcome,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Program 0x{:04X} at 0x{:08X}: {}", datum, address, outcome);
    if let Err(e) = outcome.into_result() {
        println!("Device status was cleared after the failure");
        return Err(CliError::Program(e).into());
    }
    Ok(())
}
