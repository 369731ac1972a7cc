//! # Voxel World Entry Point
//!
//! Builds the world and runs it headless. An optional JSON configuration file
//! may be passed as the only argument.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

use std::process::ExitCode;

use log::error;

fn main() -> ExitCode {
    match voxel_world::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("voxel-world: {}", err);
            ExitCode::FAILURE
        }
    }
}
