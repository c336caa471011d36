//! CLI command implementations
//!
//! Every command works on a `Box<dyn RegisterIo>` opened by the backend
//! registry, so they behave the same on the emulator and on real hardware.

mod list;
mod program;
mod status;

pub use list::list_backends;
pub use program::run_program;
pub use status::{run_clear_status, run_status};
