//! Status register commands

use csrflash_core::{protocol, RegisterIo, Status};

/// Describe the bits of a status snapshot
fn describe(status: Status) -> String {
    let mut parts = Vec::new();
    parts.push(if status.is_ready() { "ready" } else { "busy" });
    if status.contains(Status::VPP_ERROR) {
        parts.push("vpp-error");
    }
    if status.contains(Status::PROGRAM_ERROR) {
        parts.push("program-error");
    }
    if status.contains(Status::PROTECTED_BLOCK) {
        parts.push("protected-block");
    }
    if status.contains(Status::INVALID_STATUS) {
        parts.push("invalid-status");
    }
    parts.join(", ")
}

/// Read the status register once and print it
pub fn run_status(mut io: Box<dyn RegisterIo>) -> Result<(), Box<dyn std::error::Error>> {
    let status = protocol::read_status(&mut io);

    println!("Status: 0x{:02X} ({})", status.bits(), describe(status));
    if status.is_ready() {
        println!("Outcome if read after a program cycle: {}", status.outcome());
    }
    Ok(())
}

/// Reset the device, clearing latched error bits
pub fn run_clear_status(mut io: Box<dyn RegisterIo>) -> Result<(), Box<dyn std::error::Error>> {
    protocol::clear_status(&mut io);
    println!("Status cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(describe(Status::empty()), "busy");
        assert_eq!(describe(Status::READY), "ready");
        assert_eq!(
            describe(Status::READY | Status::VPP_ERROR | Status::INVALID_STATUS),
            "ready, vpp-error, invalid-status"
        );
    }
}
