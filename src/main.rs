//! # aid CLI
//!
//! Aggregate image data from the command line.
//!
//! ## Usage
//! ```bash
//! aid ~/Pictures/whitney.jpg
//! aid ~/Pictures --ext jpg
//! aid ~/Pictures --ext dng --model leica
//! aid /raw --ext 'cr?' --mode lenses --sort count
//! aid ~/Music --mode embedded --create
//! ```

mod cli;

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn main() -> ExitCode {
    image_data_aggregator::init_tracing();

    match panic::catch_unwind(AssertUnwindSafe(cli::run)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
        Err(payload) => {
            eprintln!("caught an unexpected fault: {}", panic_message(payload.as_ref()));
            ExitCode::FAILURE
        }
    }
}
